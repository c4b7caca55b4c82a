use glam::Vec2;

/// Unit direction for `angle` scaled by `dist`.
#[inline]
pub fn polar(angle: f32, dist: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin()) * dist
}

/// Intersection point of the segments `a0..a1` and `b0..b1`.
///
/// Returns `None` for parallel or non-overlapping segments, so a
/// degenerate pair can never produce a non-finite coordinate.
pub fn segment_intersection(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> Option<Vec2> {
    let d1 = a1 - a0;
    let d2 = b1 - b0;

    let denom = -d2.x * d1.y + d1.x * d2.y;
    if denom.abs() <= f32::EPSILON {
        return None;
    }

    let s = (-d1.y * (a0.x - b0.x) + d1.x * (a0.y - b0.y)) / denom;
    let t = (d2.x * (a0.y - b0.y) - d2.y * (a0.x - b0.x)) / denom;

    if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
        Some(a0 + d1 * t)
    } else {
        None
    }
}

/// Point on the cubic Bézier `p0 p1 p2 p3` at parameter `t`.
pub fn cubic_bezier(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}
