//! Planar ring predicates evaluated in the XY plane.
//!
//! Rings are implicitly closed: the edge from the last vertex back to the
//! first is always part of the boundary.

use super::{Point3, TOLERANCE};

/// Iterates the edges of an implicitly closed ring.
fn edges(ring: &[Point3]) -> impl Iterator<Item = (&Point3, &Point3)> {
    ring.iter().zip(ring.iter().cycle().skip(1))
}

/// Computes the signed area of a polygon in the XY plane (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point3]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    edges(points).map(|(a, b)| a.x * b.y - b.x * a.y).sum::<f64>() * 0.5
}

/// Unsigned area of a ring in the XY plane.
#[must_use]
pub fn ring_area(points: &[Point3]) -> f64 {
    signed_area_2d(points).abs()
}

/// Point-in-ring test using the winding number in the XY plane.
///
/// Returns `true` if the point is strictly inside; points on the boundary
/// may fall on either side.
#[must_use]
pub fn point_in_ring(point: &Point3, ring: &[Point3]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let winding: i32 = edges(ring)
        .map(|(a, b)| {
            let side = orientation(a, b, point);
            if a.y <= point.y && b.y > point.y && side > 0.0 {
                1
            } else if a.y > point.y && b.y <= point.y && side < 0.0 {
                -1
            } else {
                0
            }
        })
        .sum();
    winding != 0
}

/// Twice the signed area of triangle `a b c` in the XY plane; positive when
/// `c` is left of `a -> b`.
fn orientation(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// `c`, known to be collinear with `a b`, lies within their bounding box.
fn within_span(a: &Point3, b: &Point3, c: &Point3) -> bool {
    c.x >= a.x.min(b.x) - TOLERANCE
        && c.x <= a.x.max(b.x) + TOLERANCE
        && c.y >= a.y.min(b.y) - TOLERANCE
        && c.y <= a.y.max(b.y) + TOLERANCE
}

/// Segments `a0 a1` and `b0 b1` share at least one point in the XY plane.
fn segments_touch(a0: &Point3, a1: &Point3, b0: &Point3, b1: &Point3) -> bool {
    let d1 = orientation(b0, b1, a0);
    let d2 = orientation(b0, b1, a1);
    let d3 = orientation(a0, a1, b0);
    let d4 = orientation(a0, a1, b1);

    if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
        return true;
    }
    (d1.abs() < TOLERANCE && within_span(b0, b1, a0))
        || (d2.abs() < TOLERANCE && within_span(b0, b1, a1))
        || (d3.abs() < TOLERANCE && within_span(a0, a1, b0))
        || (d4.abs() < TOLERANCE && within_span(a0, a1, b1))
}

/// Returns `true` if any edge of ring `a` touches or crosses any edge of ring `b`.
#[must_use]
pub fn rings_cross(a: &[Point3], b: &[Point3]) -> bool {
    if a.len() < 2 || b.len() < 2 {
        return false;
    }
    edges(a).any(|(a0, a1)| edges(b).any(|(b0, b1)| segments_touch(a0, a1, b0, b1)))
}

/// Returns `true` if `outer` strictly contains `inner`: every vertex of
/// `inner` is inside `outer` and no pair of edges touches.
#[must_use]
pub fn ring_contains_ring(outer: &[Point3], inner: &[Point3]) -> bool {
    if outer.len() < 3 || inner.len() < 3 {
        return false;
    }
    inner.iter().all(|p| point_in_ring(p, outer)) && !rings_cross(outer, inner)
}

/// Returns `true` if the interiors of two rings overlap or their edges touch.
#[must_use]
pub fn rings_overlap(a: &[Point3], b: &[Point3]) -> bool {
    rings_cross(a, b)
        || a.iter().any(|p| point_in_ring(p, b))
        || b.iter().any(|p| point_in_ring(p, a))
}
