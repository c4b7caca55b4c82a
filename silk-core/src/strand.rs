//! Radial strands and the randomized cross-linking between them.
//!
//! A strand is the chain of points running from the web center out to one
//! anchor or sub-anchor. Strand construction happens in three passes over
//! the whole strand set, driven by [`crate::web::WebGraph::make`]:
//!
//! 1. [`build_points`] — lay a ladder of candidate seed positions along
//!    the strand direction, spaced with a smooth noise wobble.
//! 2. [`cross_link`] — walk the seeds and connect to the angularly-next
//!    strand with a randomly drawn [`LinkShape`], approximating the
//!    spiral silk.
//! 3. [`link_spoke`] — sort everything that was registered on the strand
//!    by distance from the center and connect consecutive pairs, forming
//!    the radial spoke itself.

use crate::geom;
use crate::noise;
use crate::types::NodeId;
use crate::web::WebGraph;
use glam::Vec2;
use rand::Rng;

/// Noise cursor step between consecutive seed points.
const NOISE_STEP: f32 = 0.2;

/// Connectors shorter than this are dropped instead of registered.
const MIN_LINK_LEN: f32 = 0.1;

/// One radial strand from the web center to an anchor or sub-anchor.
#[derive(Debug)]
pub struct RadialStrand {
    /// Angular position among sibling strands; cross-linking targets
    /// `order + 1` with wraparound.
    pub order: usize,
    /// Outer anchor node.
    pub start: NodeId,
    /// Inner anchor node (the web center).
    pub end: NodeId,
    /// Direction from center toward the outer anchor.
    pub angle: f32,
    /// Distance between the two anchors.
    pub strand_length: f32,
    /// Registered spoke points, sorted center-outward by [`link_spoke`].
    pub points: Vec<NodeId>,
    /// Every node this strand introduced, including bifurcation
    /// midpoints that are not part of the spoke.
    pub all_points: Vec<NodeId>,
    /// Candidate ladder from [`build_points`]; scaffolding only, cleared
    /// when the graph is assembled.
    pub(crate) seeds: Vec<NodeId>,
    pub(crate) noise_cursor: f32,
    pub(crate) seed_count: usize,
}

impl RadialStrand {
    pub(crate) fn new(order: usize, start: NodeId, end: NodeId, noise_cursor: f32) -> Self {
        Self {
            order,
            start,
            end,
            angle: 0.0,
            strand_length: 0.0,
            points: Vec::new(),
            all_points: Vec::new(),
            seeds: Vec::new(),
            noise_cursor,
            seed_count: 0,
        }
    }

    /// Registers a point on this strand's spoke, rejecting duplicates.
    pub(crate) fn add_point(&mut self, id: NodeId) {
        if self.points.contains(&id) {
            return;
        }
        self.all_points.push(id);
        self.points.push(id);
    }
}

/// Shape of one cross-link between a strand and its angular neighbor.
///
/// Drawn from a 20-sided roll per interior seed:
///
/// | shape       | odds  |
/// |-------------|-------|
/// | `Skip`      | 3/20  |
/// | `Direct`    | 14/20 |
/// | `Bifurcate` | 1/20  |
/// | `Extra`     | 1/20  |
/// | `LongSkip`  | 1/20  |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkShape {
    /// No cross-link at this seed.
    Skip,
    /// A single connector edge to the next strand.
    Direct,
    /// An irregular three-way junction around a blended midpoint.
    Bifurcate,
    /// The direct edge plus a second connector drawn farther out.
    Extra,
    /// The direct edge plus a long connector skipping well ahead.
    LongSkip,
}

impl LinkShape {
    pub(crate) fn draw(rng: &mut impl Rng) -> Self {
        Self::from_roll(rng.random_range(0..20))
    }

    fn from_roll(roll: u32) -> Self {
        match roll {
            0 | 18 | 19 => Self::Skip,
            1 => Self::Bifurcate,
            2 => Self::Extra,
            3 => Self::LongSkip,
            _ => Self::Direct,
        }
    }
}

/// Distance from the center for a connector endpoint: the seed's own
/// distance perturbed by `uniform(-range, range)`, capped at `max_dist`.
/// `range` may be negative; the perturbation is symmetric either way.
fn random_reach(from_center: Vec2, range: f32, max_dist: f32, rng: &mut impl Rng) -> f32 {
    let dist = from_center.length() + (rng.random::<f32>() * range * 2.0 - range);
    dist.min(max_dist)
}

/// Lays the strand's candidate seed ladder.
///
/// Seeds sit at `center + dir(angle) * (i * spacing * wobble)` where the
/// wobble is smooth noise mapped into `[0.75, 1.25]`, advanced by a fixed
/// cursor step per seed. Seed `0` coincides with the center; the ladder
/// deliberately stops one short of the outer anchor.
pub(crate) fn build_points(web: &mut WebGraph, idx: usize, center: NodeId) {
    let point_count = web.options().ray_point_count;
    let (start, end) = {
        let s = &web.strands[idx];
        (s.start, s.end)
    };
    let start_pos = web.position(start);
    let end_pos = web.position(end);

    let diff = start_pos - end_pos;
    let angle = diff.y.atan2(diff.x);
    let length = start_pos.distance(end_pos);

    {
        let s = &mut web.strands[idx];
        s.angle = angle;
        s.strand_length = length;
        s.seed_count = point_count;
    }
    if point_count == 0 {
        return;
    }

    // Shrink the usable span a touch so seeds keep clear of the anchors.
    let spacing = ((length - 5.0) * 0.99) / point_count as f32;
    let center_pos = web.position(center);

    let mut cursor = web.strands[idx].noise_cursor;
    for i in 0..point_count - 1 {
        let wobble = noise::remap(noise::sample(cursor), -1.0, 1.0, 0.75, 1.25);
        let pos = center_pos + geom::polar(angle, i as f32 * spacing * wobble);
        let id = web.insert_point(pos);
        web.strands[idx].seeds.push(id);
        cursor += NOISE_STEP;
    }
    web.strands[idx].noise_cursor = cursor;
}

/// Cross-links this strand to the angularly-next one (wrapping to the
/// first strand after the last).
///
/// The strand's own anchors are always registered first so the spoke
/// connects end to end even if every roll lands on [`LinkShape::Skip`].
/// For each interior seed a [`LinkShape`] is drawn; the connector's
/// source sits on this strand at the seed's perturbed distance, and its
/// destination distance either snaps to the next strand's seed or (one
/// roll in four) jitters around it. Perturbation ranges grow with the
/// seed index, so links farther from the center wander more.
pub(crate) fn cross_link(web: &mut WebGraph, idx: usize, center: NodeId, rng: &mut impl Rng) {
    let (order, start, end, this_angle, this_len, seed_count) = {
        let s = &web.strands[idx];
        (s.order, s.start, s.end, s.angle, s.strand_length, s.seed_count)
    };
    let center_pos = web.position(center);
    let ray_count = web.strands.len();

    web.strands[idx].add_point(start);
    web.strands[idx].add_point(end);

    for i in 1..seed_count.saturating_sub(1) {
        let fi = i as f32;

        let shape = LinkShape::draw(rng);
        if shape == LinkShape::Skip {
            continue;
        }

        let next_idx = if order < ray_count - 1 { order + 1 } else { 0 };
        let next_angle = web.strands[next_idx].angle;
        let next_len = web.strands[next_idx].strand_length;

        let seed = web.strands[idx].seeds[i];
        let from_center = web.position(seed) - center_pos;

        let source_dist = random_reach(from_center, fi * 0.2, this_len, rng);
        let source = web.insert_point(center_pos + geom::polar(this_angle, source_dist));

        let next_seed = web.strands[next_idx].seeds[i];
        let next_seed_dist = web.position(next_seed).distance(center_pos);
        let dest_dist = if rng.random_range(0..4) == 0 {
            // jitter around the neighboring seed instead of snapping to it
            (next_seed_dist + rng.random_range(-1.2 * fi..1.2 * fi)).min(next_len)
        } else {
            next_seed_dist
        };

        if shape == LinkShape::Bifurcate {
            bifurcate(
                web, idx, next_idx, source, next_seed, this_angle, next_angle, dest_dist,
                center_pos, rng,
            );
        } else {
            link(web, idx, next_idx, source, next_angle, dest_dist, center_pos);
        }

        match shape {
            LinkShape::Extra => {
                let dist = random_reach(from_center, fi * 0.8, next_len, rng);
                link(web, idx, next_idx, source, next_angle, dist, center_pos);
            }
            LinkShape::LongSkip => {
                let spread = if rng.random::<bool>() {
                    fi * rng.random::<f32>() * 4.0 + 6.0
                } else {
                    fi * rng.random::<f32>() * -4.0 - 6.0
                };
                let dist = random_reach(from_center, spread, next_len, rng);
                link(web, idx, next_idx, source, next_angle, dist, center_pos);
            }
            _ => {}
        }
    }
}

/// Adds a single connector from `source` to a fresh point on the next
/// strand's angle at `dist` from the center. Near-zero-length connectors
/// are dropped so the node table never gains a degenerate spring.
fn link(
    web: &mut WebGraph,
    idx: usize,
    next_idx: usize,
    source: NodeId,
    next_angle: f32,
    dist: f32,
    center_pos: Vec2,
) {
    let target_pos = center_pos + geom::polar(next_angle, dist);
    if web.position(source).distance(target_pos) <= MIN_LINK_LEN {
        return;
    }
    let target = web.insert_point(target_pos);
    web.strands[idx].add_point(source);
    web.strands[next_idx].add_point(target);
    web.connect(source, target);
    web.connect(target, source);
}

/// Builds a three-way silk junction instead of a straight connector.
///
/// A midpoint is dropped at a random blend between the source and the
/// neighboring seed, then joined to a trunk point on one side and to two
/// fork points straddling the trunk distance on the other side's angle.
/// A fair coin decides which side hosts the trunk.
#[allow(clippy::too_many_arguments)]
fn bifurcate(
    web: &mut WebGraph,
    idx: usize,
    next_idx: usize,
    source: NodeId,
    next_seed: NodeId,
    this_angle: f32,
    next_angle: f32,
    dest_dist: f32,
    center_pos: Vec2,
    rng: &mut impl Rng,
) {
    let source_pos = web.position(source);
    let next_pos = web.position(next_seed);
    let source_dist = source_pos.distance(center_pos);
    let next_dist = next_pos.distance(center_pos);

    let blend = rng.random_range(0.2..0.8);
    let midpoint = web.insert_point(source_pos + (next_pos - source_pos) * blend);
    // joins the node table through all_points without joining either spoke
    web.strands[idx].all_points.push(midpoint);

    let deviation = rng.random_range(2.0..8.0);

    let (fork_angle, fork_dist, trunk, trunk_on_next) = if rng.random::<bool>() {
        (next_angle, next_dist, source, false)
    } else {
        let trunk = web.insert_point(center_pos + geom::polar(next_angle, dest_dist));
        (this_angle, source_dist, trunk, true)
    };

    let fork_a = web.insert_point(center_pos + geom::polar(fork_angle, fork_dist - deviation));
    let fork_b = web.insert_point(center_pos + geom::polar(fork_angle, fork_dist + deviation));

    if trunk_on_next {
        web.strands[next_idx].add_point(trunk);
        web.strands[idx].add_point(fork_a);
        web.strands[idx].add_point(fork_b);
    } else {
        web.strands[idx].add_point(trunk);
        web.strands[next_idx].add_point(fork_a);
        web.strands[next_idx].add_point(fork_b);
    }

    web.connect(trunk, midpoint);
    web.connect(fork_a, midpoint);
    web.connect(fork_b, midpoint);
    web.connect(midpoint, trunk);
    web.connect(midpoint, fork_a);
    web.connect(midpoint, fork_b);
}

/// Sorts the strand's registered points by distance from the center and
/// connects each consecutive pair, forming the radial spoke.
pub(crate) fn link_spoke(web: &mut WebGraph, idx: usize, center: NodeId) {
    let center_pos = web.position(center);

    let mut points = std::mem::take(&mut web.strands[idx].points);
    points.sort_by(|&a, &b| {
        let da = web.position(a).distance(center_pos);
        let db = web.position(b).distance(center_pos);
        da.total_cmp(&db)
    });

    for pair in points.windows(2) {
        web.connect(pair[0], pair[1]);
        web.connect(pair[1], pair[0]);
    }
    web.strands[idx].points = points;
}
