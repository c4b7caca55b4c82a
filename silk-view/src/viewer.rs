//! Interactive spider-web viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the simulation state
//! (web graph, integrator, step clock, tunables) and implements
//! [`eframe::App`] to render and control the simulation through an
//! egui UI.
//!
//! The per-frame update is:
//! 1. Handle UI interactions / input.
//! 2. If `running`, feed real elapsed time into the fixed-step clock and
//!    advance the integrator by however many whole steps it pays out.
//! 3. Render the current position snapshot and the unique edge list.

use eframe::App;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use silk_core::config::{PointerForce, StepParams, WebOptions};
use silk_core::physics::{FixedStep, PhysicsIntegrator};
use silk_core::web::WebGraph;

/// Main application state for the interactive viewer.
///
/// Glues together the core pieces — [`WebGraph`], [`PhysicsIntegrator`],
/// [`FixedStep`], [`WebOptions`], [`StepParams`] — with camera state and
/// the egui panels that expose every live tunable.
pub struct Viewer {
    options: WebOptions,
    params: StepParams,
    graph: WebGraph,
    integrator: PhysicsIntegrator,
    clock: FixedStep,

    /// Seed of the current build; editable for reproducing a web.
    seed: u64,
    /// Whether regeneration also shuffles anchor count and ray spacing.
    shuffle_shape: bool,
    rng: rand::rngs::ThreadRng,

    pointer_strength: f32,
    running: bool,
    zoom: f32,
    pan: egui::Vec2,
    last_time: f64,
}

impl Viewer {
    /// Creates a viewer with a freshly generated web and default tunables.
    pub fn new() -> Self {
        let mut rng = rand::rng();
        let seed = rng.random();

        let mut viewer = Self {
            options: WebOptions::default(),
            params: StepParams::default(),
            graph: WebGraph::new(WebOptions::default()),
            integrator: PhysicsIntegrator::new(),
            clock: FixedStep::new(),
            seed,
            shuffle_shape: true,
            rng,
            pointer_strength: 120.0,
            running: true,
            zoom: 1.0,
            pan: egui::vec2(0.0, 0.0),
            last_time: 0.0,
        };
        viewer.regenerate();
        viewer
    }

    /// Rebuilds the web from `seed` and re-initializes the physics.
    ///
    /// With `shuffle_shape` on, anchor count and ray spacing are
    /// re-rolled first, mirroring the classic "randomize web" button.
    fn regenerate(&mut self) {
        if self.shuffle_shape {
            self.options.anchor_count = self.rng.random_range(3..8);
            self.options.ray_spacing = self.rng.random_range(80.0..150.0);
        }

        self.integrator.reset();
        self.clock.reset();
        self.graph = WebGraph::new(self.options);

        let mut rng = StdRng::seed_from_u64(self.seed);
        if let Err(err) = self.graph.make(&mut rng) {
            tracing::error!(%err, "web build failed");
            return;
        }
        if let Err(err) = self.integrator.initialize(&self.graph) {
            tracing::error!(%err, "integrator initialization failed");
        }
    }

    /// Feeds elapsed wall time into the step clock and runs the steps it
    /// pays out. Stops the run on an integrator error.
    fn drive(&mut self, elapsed: f32) {
        let steps = self.clock.advance(elapsed, self.params.dt);
        for _ in 0..steps {
            if let Err(err) = self.integrator.step(&self.params) {
                tracing::error!(%err, "physics step failed");
                self.running = false;
                break;
            }
        }
    }

    /// Converts a world-space position to screen-space.
    ///
    /// The web viewport is centered in `rect`, scaled by `zoom` and
    /// offset by `pan`. Web coordinates already grow downward, so no
    /// axis flip is needed.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        let vc = self.options.viewport * 0.5;
        egui::pos2(
            center.x + (p.x - vc.x) * self.zoom + self.pan.x,
            center.y + (p.y - vc.y) * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Viewer::world_to_screen`] up to floating point
    /// rounding.
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let vc = self.options.viewport * 0.5;
        Vec2::new(
            (p.x - center.x - self.pan.x) / self.zoom + vc.x,
            (p.y - center.y - self.pan.y) / self.zoom + vc.y,
        )
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, regeneration, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Step").clicked() {
                    self.drive(self.params.dt);
                }

                ui.separator();

                if ui.button("Randomize Web").clicked() {
                    self.seed = self.rng.random();
                    self.regenerate();
                }
                if ui.button("Rebuild").clicked() {
                    self.regenerate();
                }

                ui.label("seed:");
                ui.add(egui::DragValue::new(&mut self.seed).speed(1.0));
                ui.checkbox(&mut self.shuffle_shape, "shuffle shape");

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=10.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (graph and simulation counters).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!(
                    "kinetic energy = {:.2}",
                    self.integrator.kinetic_energy(self.params.dt)
                ));
                ui.separator();
                ui.label(format!("nodes = {}", self.graph.nodes().len()));
                ui.label(format!("unique edges = {}", self.graph.unique_edges().len()));
                ui.label(format!("strands = {}", self.graph.strands().len()));
                ui.label(format!("avg radius = {:.0}", self.graph.avg_radius()));
            });
        });
    }

    /// Builds the right-hand configuration panel for all tunables.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Web");
                ui.label("(takes effect on rebuild)");
                Self::labeled_drag_usize(ui, "anchors:", &mut self.options.anchor_count, 3..=12, 1.0);
                Self::labeled_drag_f32(
                    ui,
                    "radius base:",
                    &mut self.options.radius_base,
                    50.0..=600.0,
                    1.0,
                );
                Self::labeled_drag_usize(
                    ui,
                    "ray points:",
                    &mut self.options.ray_point_count,
                    4..=30,
                    1.0,
                );
                Self::labeled_drag_f32(
                    ui,
                    "ray spacing:",
                    &mut self.options.ray_spacing,
                    20.0..=200.0,
                    1.0,
                );
                Self::labeled_drag_f32(ui, "gutter:", &mut self.options.gutter, 0.0..=100.0, 0.5);

                ui.separator();
                ui.heading("Physics");
                Self::labeled_drag_f32(
                    ui,
                    "spring constant:",
                    &mut self.params.spring_constant,
                    0.1..=20.5,
                    0.25,
                );
                Self::labeled_drag_f32(ui, "damping:", &mut self.params.damping, 0.01..=0.99, 0.01);
                Self::labeled_drag_f32(ui, "tension:", &mut self.params.tension, 0.1..=2.0, 0.1);
                Self::labeled_drag_f32(ui, "timestep:", &mut self.params.dt, 0.01..=0.5, 0.01);
                Self::labeled_drag_f32(ui, "gravity x:", &mut self.params.gravity.x, -0.5..=0.5, 0.01);
                Self::labeled_drag_f32(ui, "gravity y:", &mut self.params.gravity.y, -0.5..=0.5, 0.01);
                Self::labeled_drag_f32(
                    ui,
                    "pointer pull:",
                    &mut self.pointer_strength,
                    0.0..=500.0,
                    5.0,
                );

                ui.separator();
                if ui.button("Reset params to default").clicked() {
                    self.params = StepParams::default();
                }
            });
    }

    /// Builds the central canvas: draws the web, applies the pointer
    /// force on primary drag, pans on secondary drag, zooms on scroll.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            if response.dragged_by(egui::PointerButton::Secondary) {
                self.pan += response.drag_delta();
            }

            // pull the web toward the cursor while the primary button is down
            let primary_down = ui.ctx().input(|i| i.pointer.primary_down());
            if primary_down && let Some(pos) = response.hover_pos() {
                self.params.pointer = Some(PointerForce {
                    position: self.screen_to_world(pos, rect),
                    strength: self.pointer_strength,
                });
            } else {
                self.params.pointer = None;
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.1, 10.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            // Draw the unique edges at their current physics positions.
            let silk = egui::Stroke::new(1.0, egui::Color32::from_rgba_unmultiplied(255, 255, 255, 160));
            for &(a, b) in self.integrator.edges() {
                if let (Some(pa), Some(pb)) = (self.integrator.position(a), self.integrator.position(b))
                {
                    painter.line_segment(
                        [self.world_to_screen(pa, rect), self.world_to_screen(pb, rect)],
                        silk,
                    );
                }
            }

            // Nodes, with the anchors called out.
            for pos in self.integrator.positions() {
                painter.circle_filled(
                    self.world_to_screen(pos, rect),
                    1.5,
                    egui::Color32::from_gray(200),
                );
            }
            for &a in self.graph.anchors() {
                if let Some(pos) = self.integrator.position(a) {
                    painter.circle_filled(
                        self.world_to_screen(pos, rect),
                        3.0,
                        egui::Color32::LIGHT_BLUE,
                    );
                }
            }

            // Pointer force hint.
            if let Some(pointer) = self.params.pointer {
                painter.circle_stroke(
                    self.world_to_screen(pointer.position, rect),
                    6.0,
                    egui::Stroke::new(1.5, egui::Color32::YELLOW),
                );
            }

            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = (now - self.last_time) as f32;
                self.last_time = now;
                self.drive(elapsed);
                ctx.request_repaint();
            } else {
                self.last_time = ctx.input(|i| i.time);
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
