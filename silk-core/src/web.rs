//! The web graph: node arena, build pipeline, and final assembly.
//!
//! A [`WebGraph`] starts empty, is populated wholesale by [`WebGraph::make`]
//! and returns to empty through [`WebGraph::reset`]. Nothing outside the
//! graph ever holds a node reference, only [`NodeId`]s into its table.

use crate::config::WebOptions;
use crate::error::WebError;
use crate::geom;
use crate::strand::{self, RadialStrand};
use crate::types::NodeId;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// A point in the web with its adjacency.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub position: Vec2,
    /// Ordered, duplicate-free. Physics keeps at most the first 4.
    pub neighbors: Vec<NodeId>,
}

impl Node {
    fn new(id: NodeId, position: Vec2) -> Self {
        Self {
            id,
            position,
            neighbors: Vec::with_capacity(4),
        }
    }

    /// Links this node to `other`, ignoring repeat requests.
    fn connect_to(&mut self, other: NodeId) {
        if self.neighbors.contains(&other) {
            return;
        }
        self.neighbors.push(other);
    }
}

/// Procedurally generated spider-web topology.
#[derive(Debug)]
pub struct WebGraph {
    options: WebOptions,

    /// Every point fabricated during the build, id = index.
    pub(crate) arena: Vec<Node>,
    /// Graph-level points in first-registered order: anchors, center,
    /// edge connectors, sub-anchors.
    registered: Vec<NodeId>,

    anchors: Vec<NodeId>,
    sub_anchors: Vec<NodeId>,
    edge_points: Vec<NodeId>,
    pub(crate) strands: Vec<RadialStrand>,
    web_center: Option<NodeId>,
    avg_radius: f32,

    /// Dense node table, valid once built.
    nodes: Vec<Node>,
    /// Every directed neighbor link; multiple connection passes may
    /// produce duplicates.
    edges: Vec<(NodeId, NodeId)>,
    /// Undirected pairs with duplicates removed.
    unique_edges: Vec<(NodeId, NodeId)>,

    built: bool,
}

impl WebGraph {
    pub fn new(options: WebOptions) -> Self {
        Self {
            options,
            arena: Vec::new(),
            registered: Vec::new(),
            anchors: Vec::new(),
            sub_anchors: Vec::new(),
            edge_points: Vec::new(),
            strands: Vec::new(),
            web_center: None,
            avg_radius: 0.0,
            nodes: Vec::new(),
            edges: Vec::new(),
            unique_edges: Vec::new(),
            built: false,
        }
    }

    /// Builds the whole web in one pass.
    ///
    /// The five sub-stages run strictly in order: anchor placement,
    /// sub-anchor interpolation, strand point seeding, cross-linking,
    /// spoke connection, then final assembly into the dense node table.
    /// `rng` is the sole source of randomness; the same seed and options
    /// reproduce the graph bit-for-bit.
    pub fn make(&mut self, rng: &mut impl Rng) -> Result<(), WebError> {
        if self.built {
            return Err(WebError::AlreadyBuilt);
        }

        let center = self.generate_anchors(rng);
        self.generate_sub_anchors(center, rng);

        for idx in 0..self.strands.len() {
            strand::build_points(self, idx, center);
        }
        for idx in 0..self.strands.len() {
            strand::cross_link(self, idx, center, rng);
        }
        for idx in 0..self.strands.len() {
            strand::link_spoke(self, idx, center);
        }

        self.assemble();
        self.built = true;

        tracing::info!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            unique_edges = self.unique_edges.len(),
            strands = self.strands.len(),
            "web built"
        );
        Ok(())
    }

    /// Clears every container back to the empty state.
    pub fn reset(&mut self) {
        self.arena.clear();
        self.registered.clear();
        self.anchors.clear();
        self.sub_anchors.clear();
        self.edge_points.clear();
        self.strands.clear();
        self.web_center = None;
        self.avg_radius = 0.0;
        self.nodes.clear();
        self.edges.clear();
        self.unique_edges.clear();
        self.built = false;
    }

    /// Places the primary anchors on a randomized circle, records the
    /// synthetic web center, and ties each anchor off where its ray from
    /// the center leaves the viewport.
    fn generate_anchors(&mut self, rng: &mut impl Rng) -> NodeId {
        let WebOptions {
            anchor_count,
            radius_base,
            viewport,
            gutter,
            ..
        } = self.options;

        let lo = Vec2::splat(gutter);
        let hi = viewport - gutter;
        let view_center = viewport * 0.5;

        let mut radius_sum = 0.0;
        if anchor_count > 0 {
            let angle_step = TAU / anchor_count as f32;
            for i in 0..anchor_count {
                let angle = i as f32 * angle_step + rng.random_range(-0.5..0.5);
                let radius = radius_base * (rng.random::<f32>() + 0.5);
                radius_sum += radius;

                let pos = (view_center + geom::polar(angle, radius)).clamp(lo, hi);
                let id = self.insert_point(pos);
                self.anchors.push(id);
                self.register(id);
            }
            self.avg_radius = radius_sum / anchor_count as f32;
        }

        let center = self.insert_point(lo + (hi - lo) * 0.5);
        self.web_center = Some(center);
        self.register(center);

        for i in 0..self.anchors.len() {
            let anchor = self.anchors[i];
            let anchor_pos = self.arena[anchor].position;
            let center_pos = self.arena[center].position;
            let Some(exit) = self.find_edge_point(anchor_pos, center_pos) else {
                tracing::debug!(anchor, "center ray missed every viewport edge, connector skipped");
                continue;
            };
            let edge = self.insert_point(exit);
            self.edge_points.push(edge);
            self.register(edge);
            self.arena[anchor].connect_to(edge);
        }

        tracing::debug!(
            anchors = self.anchors.len(),
            connectors = self.edge_points.len(),
            avg_radius = self.avg_radius,
            "anchors placed"
        );
        center
    }

    /// First point where the ray from `center` through `anchor` crosses
    /// the viewport boundary, testing top, right, bottom then left.
    ///
    /// Returns `None` when the ray is degenerate (anchor on the center)
    /// or misses every segment; the caller skips the connector rather
    /// than storing a non-finite position.
    fn find_edge_point(&self, anchor: Vec2, center: Vec2) -> Option<Vec2> {
        let dir = (anchor - center).normalize_or_zero();
        if dir == Vec2::ZERO {
            return None;
        }
        let Vec2 { x: w, y: h } = self.options.viewport;
        let far = center + dir * (w + h);

        let ul = Vec2::ZERO;
        let ur = Vec2::new(w, 0.0);
        let lr = Vec2::new(w, h);
        let ll = Vec2::new(0.0, h);

        [(ul, ur), (ur, lr), (ll, lr), (ul, ll)]
            .into_iter()
            .find_map(|(a, b)| geom::segment_intersection(center, far, a, b))
    }

    /// Seeds additional strands between each consecutive anchor pair.
    ///
    /// The pair is bridged with a cubic Bézier warped by a random angle
    /// and control length, sampled every `ray_spacing` along the chord.
    /// Each sample becomes a sub-anchor with its own strand back to the
    /// center, and the samples are chained anchor to anchor to form the
    /// outer rim. One strand per raw anchor is created as well.
    fn generate_sub_anchors(&mut self, center: NodeId, rng: &mut impl Rng) {
        let spacing = self.options.ray_spacing;
        // one shared starting cursor; each strand then advances its own
        let noise_start = rng.random_range(0.0..10.0);
        let anchor_count = self.anchors.len();

        for i in 0..anchor_count {
            let start = self.anchors[i];
            let end = self.anchors[(i + 1) % anchor_count];
            let start_pos = self.arena[start].position;
            let end_pos = self.arena[end].position;

            let diff = end_pos - start_pos;
            let dist = diff.length();
            let angle = diff.y.atan2(diff.x);
            let interior = if spacing > 0.0 {
                (dist / spacing).floor() as usize
            } else {
                0
            };

            let warp = rng.random_range(0.05..0.3);
            let bend = PI * warp;
            let ctrl_len = dist * warp;
            let c1 = start_pos + geom::polar(angle + bend, ctrl_len);
            let c2 = end_pos - geom::polar(angle - bend, ctrl_len);

            let order = self.strands.len();
            self.strands
                .push(RadialStrand::new(order, start, center, noise_start));

            let mut chain = Vec::with_capacity(interior.saturating_sub(1));
            for j in 1..interior {
                let t = j as f32 / interior as f32;
                let pos = geom::cubic_bezier(start_pos, c1, c2, end_pos, t);
                let id = self.insert_point(pos);
                self.sub_anchors.push(id);
                self.register(id);
                chain.push(id);

                let order = self.strands.len();
                self.strands
                    .push(RadialStrand::new(order, id, center, noise_start));
            }

            for j in 0..interior.saturating_sub(1) {
                let (a, b) = if j == 0 {
                    (start, chain[0])
                } else {
                    (chain[j - 1], chain[j])
                };
                self.arena[a].connect_to(b);
            }
            if interior == 1 {
                self.arena[start].connect_to(end);
            } else if let Some(&last) = chain.last() {
                self.arena[last].connect_to(end);
            }
        }

        tracing::debug!(
            sub_anchors = self.sub_anchors.len(),
            strands = self.strands.len(),
            "sub-anchors placed"
        );
    }

    /// Flattens everything registered during the build into the dense
    /// node table and derives the edge lists.
    ///
    /// Ids are assigned in first-seen order: graph-level registrations
    /// first, then each strand's points in strand order. Neighbor links
    /// to points that never got registered are dropped, so every edge
    /// references a live node.
    pub(crate) fn assemble(&mut self) {
        let mut order = Vec::with_capacity(self.arena.len());
        let mut seen = vec![false; self.arena.len()];
        for &id in &self.registered {
            if !seen[id] {
                seen[id] = true;
                order.push(id);
            }
        }
        for strand in &self.strands {
            for &id in &strand.all_points {
                if !seen[id] {
                    seen[id] = true;
                    order.push(id);
                }
            }
        }

        let mut remap = vec![usize::MAX; self.arena.len()];
        for (new_id, &old) in order.iter().enumerate() {
            remap[old] = new_id;
        }

        self.nodes = order
            .iter()
            .enumerate()
            .map(|(new_id, &old)| {
                let src = &self.arena[old];
                let neighbors = src
                    .neighbors
                    .iter()
                    .filter(|&&n| remap[n] != usize::MAX)
                    .map(|&n| remap[n])
                    .collect();
                Node {
                    id: new_id,
                    position: src.position,
                    neighbors,
                }
            })
            .collect();

        // rewrite the build-time views onto the dense table
        for id in self
            .anchors
            .iter_mut()
            .chain(self.sub_anchors.iter_mut())
            .chain(self.edge_points.iter_mut())
        {
            *id = remap[*id];
        }
        if let Some(center) = self.web_center.as_mut() {
            *center = remap[*center];
        }
        for strand in &mut self.strands {
            strand.start = remap[strand.start];
            strand.end = remap[strand.end];
            for id in strand.points.iter_mut().chain(strand.all_points.iter_mut()) {
                *id = remap[*id];
            }
            strand.seeds.clear();
        }

        for node in &self.nodes {
            for &nbr in &node.neighbors {
                let pair = (node.id, nbr);
                let dup = self
                    .unique_edges
                    .iter()
                    .rev()
                    .any(|&(a, b)| (a, b) == pair || (b, a) == pair);
                self.edges.push(pair);
                if !dup {
                    self.unique_edges.push(pair);
                }
            }
        }
    }

    pub(crate) fn insert_point(&mut self, position: Vec2) -> NodeId {
        debug_assert!(position.is_finite());
        let id = self.arena.len();
        self.arena.push(Node::new(id, position));
        id
    }

    pub(crate) fn register(&mut self, id: NodeId) {
        if !self.registered.contains(&id) {
            self.registered.push(id);
        }
    }

    pub(crate) fn connect(&mut self, from: NodeId, to: NodeId) {
        self.arena[from].connect_to(to);
    }

    pub(crate) fn position(&self, id: NodeId) -> Vec2 {
        self.arena[id].position
    }

    pub fn options(&self) -> &WebOptions {
        &self.options
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    pub fn unique_edges(&self) -> &[(NodeId, NodeId)] {
        &self.unique_edges
    }

    pub fn anchors(&self) -> &[NodeId] {
        &self.anchors
    }

    pub fn sub_anchors(&self) -> &[NodeId] {
        &self.sub_anchors
    }

    /// Points where anchor rays meet the viewport boundary.
    pub fn edge_points(&self) -> &[NodeId] {
        &self.edge_points
    }

    pub fn strands(&self) -> &[RadialStrand] {
        &self.strands
    }

    pub fn web_center(&self) -> Option<NodeId> {
        self.web_center
    }

    /// Average anchor radius of the last build.
    pub fn avg_radius(&self) -> f32 {
        self.avg_radius
    }

    pub fn is_built(&self) -> bool {
        self.built
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn build(seed: u64, options: WebOptions) -> WebGraph {
        let mut graph = WebGraph::new(options);
        let mut rng = StdRng::seed_from_u64(seed);
        graph.make(&mut rng).unwrap();
        graph
    }

    #[test]
    fn node_ids_are_dense_and_unique() {
        let graph = build(1, WebOptions::default());
        assert!(!graph.nodes().is_empty());
        for (i, node) in graph.nodes().iter().enumerate() {
            assert_eq!(node.id, i);
        }
    }

    #[test]
    fn edges_reference_live_nodes() {
        let graph = build(2, WebOptions::default());
        let len = graph.nodes().len();
        for &(a, b) in graph.edges() {
            assert!(a < len && b < len);
        }
        for &(a, b) in graph.unique_edges() {
            assert!(a < len && b < len);
        }
        for node in graph.nodes() {
            for &n in &node.neighbors {
                assert!(n < len);
            }
        }
    }

    #[test]
    fn strands_reference_live_nodes() {
        let graph = build(3, WebOptions::default());
        let len = graph.nodes().len();
        for strand in graph.strands() {
            assert!(strand.start < len && strand.end < len);
            for &id in strand.points.iter().chain(strand.all_points.iter()) {
                assert!(id < len);
            }
        }
    }

    #[test]
    fn unique_edges_have_no_duplicate_pairs() {
        let graph = build(4, WebOptions::default());
        let mut seen = HashSet::new();
        for &(a, b) in graph.unique_edges() {
            assert!(seen.insert((a.min(b), a.max(b))), "duplicate pair ({a}, {b})");
        }
        assert!(graph.unique_edges().len() <= graph.edges().len());
    }

    #[test]
    fn neighbors_contain_no_duplicates() {
        let graph = build(5, WebOptions::default());
        for node in graph.nodes() {
            let set: HashSet<_> = node.neighbors.iter().collect();
            assert_eq!(set.len(), node.neighbors.len());
        }
    }

    #[test]
    fn anchors_respect_the_gutter() {
        let options = WebOptions::default();
        for seed in 0..10 {
            let graph = build(seed, options);
            for &a in graph.anchors() {
                let p = graph.nodes()[a].position;
                assert!(p.x >= options.gutter && p.x <= options.viewport.x - options.gutter);
                assert!(p.y >= options.gutter && p.y <= options.viewport.y - options.gutter);
            }
        }
    }

    #[test]
    fn same_seed_reproduces_the_same_web() {
        let a = build(42, WebOptions::default());
        let b = build(42, WebOptions::default());

        assert_eq!(a.nodes().len(), b.nodes().len());
        for (na, nb) in a.nodes().iter().zip(b.nodes()) {
            assert_eq!(na.id, nb.id);
            assert_eq!(na.position, nb.position);
            assert_eq!(na.neighbors, nb.neighbors);
        }
        assert_eq!(a.edges(), b.edges());
        assert_eq!(a.unique_edges(), b.unique_edges());
    }

    #[test]
    fn different_seeds_produce_different_webs() {
        let a = build(7, WebOptions::default());
        let b = build(8, WebOptions::default());
        let differs = a.nodes().len() != b.nodes().len()
            || a.nodes()
                .iter()
                .zip(b.nodes())
                .any(|(na, nb)| na.position != nb.position);
        assert!(differs);
    }

    #[test]
    fn example_parameter_set_yields_expected_anchor_counts() {
        let options = WebOptions {
            anchor_count: 5,
            radius_base: 200.0,
            ray_point_count: 10,
            ray_spacing: 40.0,
            ..WebOptions::default()
        };
        let graph = build(99, options);
        assert_eq!(graph.anchors().len(), 5);
        assert_eq!(graph.edge_points().len(), 5);
        assert!(graph.nodes().len() > 5);
        assert!(!graph.unique_edges().is_empty());

        // counts are stable across runs of the same seed
        let again = build(99, options);
        assert_eq!(graph.nodes().len(), again.nodes().len());
        assert_eq!(graph.unique_edges().len(), again.unique_edges().len());
    }

    #[test]
    fn make_on_a_built_graph_is_an_error() {
        let mut graph = build(6, WebOptions::default());
        let mut rng = StdRng::seed_from_u64(6);
        assert!(matches!(graph.make(&mut rng), Err(WebError::AlreadyBuilt)));
    }

    #[test]
    fn reset_leaves_no_residue() {
        let mut graph = build(11, WebOptions::default());
        graph.reset();

        assert!(!graph.is_built());
        assert!(graph.nodes().is_empty());
        assert!(graph.edges().is_empty());
        assert!(graph.unique_edges().is_empty());
        assert!(graph.anchors().is_empty());
        assert!(graph.sub_anchors().is_empty());
        assert!(graph.edge_points().is_empty());
        assert!(graph.strands().is_empty());
        assert!(graph.web_center().is_none());

        // a rebuild with the same seed matches a fresh build exactly
        let mut rng = StdRng::seed_from_u64(11);
        graph.make(&mut rng).unwrap();
        let fresh = build(11, WebOptions::default());
        assert_eq!(graph.nodes().len(), fresh.nodes().len());
        assert_eq!(graph.unique_edges(), fresh.unique_edges());
    }

    #[test]
    fn spokes_run_center_outward() {
        let graph = build(13, WebOptions::default());
        let center = graph.web_center().unwrap();
        let center_pos = graph.nodes()[center].position;
        for strand in graph.strands() {
            let dists: Vec<f32> = strand
                .points
                .iter()
                .map(|&id| graph.nodes()[id].position.distance(center_pos))
                .collect();
            for pair in dists.windows(2) {
                assert!(pair[0] <= pair[1], "spoke points out of order: {dists:?}");
            }
        }
    }

    #[test]
    fn every_spoke_reaches_both_anchors() {
        let graph = build(14, WebOptions::default());
        for strand in graph.strands() {
            assert!(strand.points.contains(&strand.start));
            assert!(strand.points.contains(&strand.end));
        }
    }

    #[test]
    fn web_center_sits_at_the_viewport_middle() {
        let options = WebOptions::default();
        let graph = build(15, options);
        let center = graph.web_center().unwrap();
        let pos = graph.nodes()[center].position;
        assert_eq!(pos, options.viewport * 0.5);
    }
}
