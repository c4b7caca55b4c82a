//! Application entry point for the spider-web viewer.
//!
//! This binary installs the tracing subscriber, sets up eframe/egui and
//! delegates all interactive logic and rendering to [`Viewer`] from the
//! `viewer` module.

mod viewer;

use tracing_subscriber::EnvFilter;
use viewer::Viewer;

/// Starts the native eframe application.
///
/// Log verbosity follows `RUST_LOG`, defaulting to `info`. The window is
/// sized to the default web viewport so the initial build fills it.
fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1024.0, 768.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Spider Web",
        options,
        Box::new(|_cc| Ok(Box::new(Viewer::new()))),
    )
}
