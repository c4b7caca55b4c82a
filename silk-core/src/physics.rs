//! Double-buffered damped-Verlet integration over a built web.
//!
//! The integrator snapshots the graph once at
//! [`PhysicsIntegrator::initialize`] and then advances in fixed `dt`
//! increments. Each step reads only the current buffer and writes only the
//! next one, one slot per node; the buffers swap after the last node, so a
//! reader only ever observes a fully consistent snapshot. No node writes
//! another node's slot, which keeps the step trivially data-parallel — a
//! plain loop is used here, the contract is what matters.

use crate::config::StepParams;
use crate::error::WebError;
use crate::types::NodeId;
use crate::web::WebGraph;
use glam::Vec2;

/// Springs retained per node. Extra adjacency is dropped, not rejected.
pub const MAX_SPRINGS: usize = 4;

/// Spring lengths at or below this contribute no force.
const MIN_SPRING_LEN: f32 = 1e-6;

/// The pointer pull saturates inside this distance instead of blowing up.
const MIN_POINTER_DIST: f32 = 1.0;

/// Accumulated frame time beyond this is discarded to avoid a runaway
/// catch-up spiral after a long stall.
pub const MAX_FRAME_ACCUM: f32 = 0.1;

#[derive(Clone, Copy, Debug)]
struct PointState {
    position: Vec2,
    previous: Vec2,
    inv_mass: f32,
    /// Neighbor id and rest length, captured once at initialization and
    /// never recomputed.
    springs: [Option<(NodeId, f32)>; MAX_SPRINGS],
}

/// Advances a mass-spring network with position-based Verlet integration.
#[derive(Debug, Default)]
pub struct PhysicsIntegrator {
    current: Vec<PointState>,
    next: Vec<PointState>,
    edges: Vec<(NodeId, NodeId)>,
}

impl PhysicsIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the built graph as the simulation's starting state.
    ///
    /// Every node starts at rest: `previous` equals `position`, and each
    /// of its first [`MAX_SPRINGS`] neighbors becomes a spring whose rest
    /// length is the node distance measured right now.
    ///
    /// ### Errors
    /// [`WebError::EmptyGraph`] if the graph has no nodes.
    pub fn initialize(&mut self, graph: &WebGraph) -> Result<(), WebError> {
        let nodes = graph.nodes();
        if nodes.is_empty() {
            return Err(WebError::EmptyGraph);
        }

        self.current = nodes
            .iter()
            .map(|node| {
                let mut springs = [None; MAX_SPRINGS];
                for (slot, &nbr) in springs.iter_mut().zip(node.neighbors.iter()) {
                    let rest = node.position.distance(nodes[nbr].position);
                    *slot = Some((nbr, rest));
                }
                PointState {
                    position: node.position,
                    previous: node.position,
                    inv_mass: 1.0,
                    springs,
                }
            })
            .collect();
        self.next = self.current.clone();
        self.edges = graph.unique_edges().to_vec();

        tracing::debug!(nodes = self.current.len(), "integrator initialized");
        Ok(())
    }

    /// Advances the simulation by one fixed step.
    ///
    /// Per node: accumulate spring forces toward each neighbor (scaled by
    /// strain and tension, with zero contribution from numerically
    /// zero-length springs), add gravity and the optional pointer pull,
    /// then integrate:
    ///
    /// `next = pos + (pos - prev) * (1 - damping) + force * inv_mass * dt²`
    ///
    /// ### Errors
    /// [`WebError::NotInitialized`] if called before [`Self::initialize`].
    pub fn step(&mut self, params: &StepParams) -> Result<(), WebError> {
        if self.current.is_empty() {
            return Err(WebError::NotInitialized);
        }

        let dt2 = params.dt * params.dt;
        for i in 0..self.current.len() {
            let point = self.current[i];
            let mut force = params.gravity;

            for &(nbr, rest) in point.springs.iter().flatten() {
                let delta = self.current[nbr].position - point.position;
                let len = delta.length();
                if len > MIN_SPRING_LEN {
                    force += delta * (params.spring_constant * ((len - rest) / len) * params.tension);
                }
            }

            if let Some(pointer) = params.pointer {
                let delta = pointer.position - point.position;
                let dist = delta.length();
                if dist > MIN_SPRING_LEN {
                    force += delta / dist * (pointer.strength / dist.max(MIN_POINTER_DIST));
                }
            }

            let next_pos = point.position
                + (point.position - point.previous) * (1.0 - params.damping)
                + force * point.inv_mass * dt2;

            self.next[i] = PointState {
                position: next_pos,
                previous: point.position,
                ..point
            };
        }

        std::mem::swap(&mut self.current, &mut self.next);
        Ok(())
    }

    /// Discards both buffers; the next use requires [`Self::initialize`].
    pub fn reset(&mut self) {
        self.current.clear();
        self.next.clear();
        self.edges.clear();
    }

    pub fn is_initialized(&self) -> bool {
        !self.current.is_empty()
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Current position of `id`, if the node exists.
    pub fn position(&self, id: NodeId) -> Option<Vec2> {
        self.current.get(id).map(|p| p.position)
    }

    /// Current snapshot positions in node-id order.
    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.current.iter().map(|p| p.position)
    }

    /// The edge list captured at initialization, for rendering.
    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    /// Total kinetic energy of the current snapshot, with velocities
    /// derived from the position pair.
    pub fn kinetic_energy(&self, dt: f32) -> f32 {
        if dt <= 0.0 {
            return 0.0;
        }
        self.current
            .iter()
            .filter(|p| p.inv_mass > 0.0)
            .map(|p| 0.5 / p.inv_mass * ((p.position - p.previous) / dt).length_squared())
            .sum()
    }
}

/// Fixed-timestep accumulator for the driving loop.
///
/// Real elapsed time is banked and paid out in whole `dt` steps; the
/// remainder carries to the next frame. Banked time is capped at
/// [`MAX_FRAME_ACCUM`] so a stalled frame cannot trigger a burst of
/// catch-up steps.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Banks `elapsed` seconds and returns the number of whole `dt`
    /// steps to run now.
    pub fn advance(&mut self, elapsed: f32, dt: f32) -> u32 {
        if dt <= 0.0 {
            return 0;
        }
        self.accumulator = (self.accumulator + elapsed.max(0.0)).min(MAX_FRAME_ACCUM);

        let mut steps = 0;
        while self.accumulator >= dt {
            self.accumulator -= dt;
            steps += 1;
        }
        steps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PointerForce, WebOptions};

    /// Two registered nodes `gap` apart, linked both ways.
    fn line_graph(gap: f32) -> WebGraph {
        let mut graph = WebGraph::new(WebOptions::default());
        let a = graph.insert_point(Vec2::ZERO);
        let b = graph.insert_point(Vec2::new(gap, 0.0));
        graph.register(a);
        graph.register(b);
        graph.connect(a, b);
        graph.connect(b, a);
        graph.assemble();
        graph
    }

    fn quiet_params() -> StepParams {
        StepParams {
            gravity: Vec2::ZERO,
            ..StepParams::default()
        }
    }

    #[test]
    fn initialize_on_an_empty_graph_is_an_error() {
        let graph = WebGraph::new(WebOptions::default());
        let mut integrator = PhysicsIntegrator::new();
        assert!(matches!(
            integrator.initialize(&graph),
            Err(WebError::EmptyGraph)
        ));
    }

    #[test]
    fn step_before_initialize_is_an_error() {
        let mut integrator = PhysicsIntegrator::new();
        assert!(matches!(
            integrator.step(&StepParams::default()),
            Err(WebError::NotInitialized)
        ));
    }

    #[test]
    fn rest_lengths_are_captured_at_initialization() {
        let graph = line_graph(10.0);
        let mut integrator = PhysicsIntegrator::new();
        integrator.initialize(&graph).unwrap();

        let (nbr, rest) = integrator.current[0].springs[0].unwrap();
        assert_eq!(nbr, 1);
        assert_eq!(rest, 10.0);
        assert!(integrator.current[0].springs[1].is_none());
    }

    #[test]
    fn at_most_four_springs_are_retained() {
        let mut graph = WebGraph::new(WebOptions::default());
        let hub = graph.insert_point(Vec2::ZERO);
        graph.register(hub);
        for i in 0..6 {
            let spoke = graph.insert_point(Vec2::new(1.0 + i as f32, 0.0));
            graph.register(spoke);
            graph.connect(hub, spoke);
        }
        graph.assemble();
        assert_eq!(graph.nodes()[hub].neighbors.len(), 6);

        let mut integrator = PhysicsIntegrator::new();
        integrator.initialize(&graph).unwrap();
        let springs = integrator.current[hub].springs.iter().flatten().count();
        assert_eq!(springs, MAX_SPRINGS);
    }

    #[test]
    fn equilibrium_at_rest_length_does_not_move() {
        let graph = line_graph(10.0);
        let mut integrator = PhysicsIntegrator::new();
        integrator.initialize(&graph).unwrap();

        let params = quiet_params();
        for _ in 0..10 {
            integrator.step(&params).unwrap();
        }
        assert_eq!(integrator.position(0), Some(Vec2::ZERO));
        assert_eq!(integrator.position(1), Some(Vec2::new(10.0, 0.0)));
    }

    #[test]
    fn kinetic_energy_decays_under_damping_without_forces() {
        let graph = line_graph(10.0);
        let mut integrator = PhysicsIntegrator::new();
        integrator.initialize(&graph).unwrap();

        // give both nodes the same initial velocity: a rigid drift keeps
        // every spring at rest length, so damping is the only influence
        let kick = Vec2::new(0.5, 0.2);
        integrator.current[0].previous -= kick;
        integrator.current[1].previous -= kick;

        let params = StepParams {
            damping: 0.3,
            ..quiet_params()
        };
        let mut last = integrator.kinetic_energy(params.dt);
        assert!(last > 0.0);
        for _ in 0..50 {
            integrator.step(&params).unwrap();
            let ke = integrator.kinetic_energy(params.dt);
            assert!(ke <= last, "kinetic energy rose: {ke} > {last}");
            last = ke;
        }
    }

    #[test]
    fn stretched_spring_relaxes_toward_rest_length() {
        let graph = line_graph(10.0);
        let mut integrator = PhysicsIntegrator::new();
        integrator.initialize(&graph).unwrap();

        // stretch the pair after rest lengths were captured
        integrator.current[1].position = Vec2::new(14.0, 0.0);
        integrator.current[1].previous = Vec2::new(14.0, 0.0);

        let params = quiet_params();
        for _ in 0..400 {
            integrator.step(&params).unwrap();
        }
        let gap = integrator
            .position(1)
            .unwrap()
            .distance(integrator.position(0).unwrap());
        assert!((gap - 10.0).abs() < 0.5, "gap {gap} did not relax");
    }

    #[test]
    fn gravity_moves_an_unconnected_node_by_dt_squared() {
        let mut graph = WebGraph::new(WebOptions::default());
        let a = graph.insert_point(Vec2::ZERO);
        graph.register(a);
        graph.assemble();

        let mut integrator = PhysicsIntegrator::new();
        integrator.initialize(&graph).unwrap();

        let params = StepParams {
            gravity: Vec2::new(0.0, 2.0),
            ..StepParams::default()
        };
        integrator.step(&params).unwrap();
        let expected = params.gravity * params.dt * params.dt;
        assert_eq!(integrator.position(0), Some(expected));
    }

    #[test]
    fn pointer_force_falls_off_with_inverse_distance() {
        let mut graph = WebGraph::new(WebOptions::default());
        let a = graph.insert_point(Vec2::ZERO);
        graph.register(a);
        graph.assemble();

        let mut integrator = PhysicsIntegrator::new();
        integrator.initialize(&graph).unwrap();

        let params = StepParams {
            pointer: Some(PointerForce {
                position: Vec2::new(10.0, 0.0),
                strength: 5.0,
            }),
            ..quiet_params()
        };
        integrator.step(&params).unwrap();

        // unit direction times strength / distance
        let expected = Vec2::new(0.5, 0.0) * params.dt * params.dt;
        let pos = integrator.position(0).unwrap();
        assert!((pos - expected).length() < 1e-6);
    }

    #[test]
    fn step_swaps_a_consistent_snapshot() {
        let graph = line_graph(10.0);
        let mut integrator = PhysicsIntegrator::new();
        integrator.initialize(&graph).unwrap();

        let before: Vec<Vec2> = integrator.positions().collect();
        let params = StepParams::default();
        integrator.step(&params).unwrap();

        for (i, &old) in before.iter().enumerate() {
            assert_eq!(integrator.current[i].previous, old);
        }
    }

    #[test]
    fn reset_discards_all_state() {
        let graph = line_graph(10.0);
        let mut integrator = PhysicsIntegrator::new();
        integrator.initialize(&graph).unwrap();
        integrator.reset();

        assert!(!integrator.is_initialized());
        assert!(integrator.edges().is_empty());
        assert!(matches!(
            integrator.step(&StepParams::default()),
            Err(WebError::NotInitialized)
        ));
    }

    #[test]
    fn fixed_step_pays_out_whole_steps_and_carries_the_rest() {
        let mut clock = FixedStep::new();
        assert_eq!(clock.advance(0.05, 0.07), 0);
        assert_eq!(clock.advance(0.05, 0.07), 1); // banked 0.10, one step, 0.03 carried
        assert_eq!(clock.advance(0.05, 0.07), 1); // 0.08 banked, 0.01 carried
    }

    #[test]
    fn fixed_step_caps_banked_time() {
        let mut clock = FixedStep::new();
        // a long stall banks at most MAX_FRAME_ACCUM
        let steps = clock.advance(5.0, 0.07);
        assert_eq!(steps, 1);
        // remainder is 0.03, nowhere near another step
        assert_eq!(clock.advance(0.0, 0.07), 0);
    }

    #[test]
    fn fixed_step_ignores_nonpositive_dt() {
        let mut clock = FixedStep::new();
        assert_eq!(clock.advance(1.0, 0.0), 0);
        assert_eq!(clock.advance(1.0, -0.1), 0);
    }
}
