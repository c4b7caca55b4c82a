use glam::Vec2;

/// Parameters controlling web construction.
#[derive(Clone, Copy, Debug)]
pub struct WebOptions {
    /// Number of primary anchor strands.
    pub anchor_count: usize,
    /// Base radius the anchor circle is randomized around.
    pub radius_base: f32,
    /// Number of candidate points per radial strand.
    pub ray_point_count: usize,
    /// Minimum spacing between neighboring strand roots.
    pub ray_spacing: f32,
    /// Size of the area the web is built into.
    pub viewport: Vec2,
    /// Margin kept clear along every viewport edge.
    pub gutter: f32,
}

impl Default for WebOptions {
    fn default() -> Self {
        Self {
            anchor_count: 5,
            radius_base: 200.0,
            ray_point_count: 10,
            ray_spacing: 40.0,
            viewport: Vec2::new(1024.0, 768.0),
            gutter: 10.0,
        }
    }
}

/// An attracting force applied from an externally supplied point,
/// falling off with the inverse of the distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerForce {
    pub position: Vec2,
    pub strength: f32,
}

/// Per-step physics tunables, all settable live between steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepParams {
    pub spring_constant: f32,
    /// Fraction of velocity removed per step, in `(0, 1)`.
    pub damping: f32,
    pub tension: f32,
    pub gravity: Vec2,
    pub pointer: Option<PointerForce>,
    pub dt: f32,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            spring_constant: 8.0,
            damping: 0.2,
            tension: 1.0,
            gravity: Vec2::new(0.0, 0.08),
            pointer: None,
            dt: 0.07,
        }
    }
}
