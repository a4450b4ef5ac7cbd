use super::Point3;

/// Coarse on-segment test used when inserting vertices on click.
///
/// `c` counts as lying on `a..b` when the floored sum of its distances to
/// both endpoints equals the floored segment length. The flooring makes the
/// test forgiving for clicks a little off the edge on long segments and
/// strict on segments shorter than one unit.
#[must_use]
pub fn lies_on_segment(a: &Point3, b: &Point3, c: &Point3) -> bool {
    let via_c = (a - c).norm() + (b - c).norm();
    let direct = (b - a).norm();
    via_c.floor() == direct.floor()
}

/// Finds the vertex of `points` nearest to `target`.
///
/// Returns `(index, distance)`, or `None` for an empty slice.
#[must_use]
pub fn nearest_vertex(points: &[Point3], target: &Point3) -> Option<(usize, f64)> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, (p - target).norm()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn midpoint_lies_on_segment() {
        assert!(lies_on_segment(&p(0.0, 0.0, 0.0), &p(10.0, 0.0, 0.0), &p(5.0, 0.0, 0.0)));
    }

    #[test]
    fn far_point_does_not_lie_on_segment() {
        assert!(!lies_on_segment(&p(0.0, 0.0, 0.0), &p(10.0, 0.0, 0.0), &p(5.0, 4.0, 0.0)));
        assert!(!lies_on_segment(&p(0.0, 0.0, 0.0), &p(10.0, 0.0, 0.0), &p(12.0, 0.0, 0.0)));
    }

    #[test]
    fn slightly_off_segment_is_accepted() {
        assert!(lies_on_segment(&p(0.0, 0.0, 0.0), &p(10.0, 0.0, 0.0), &p(5.0, 0.05, 0.0)));
    }

    #[test]
    fn nearest_vertex_picks_closest() {
        let pts = [p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0), p(10.0, 0.0, 0.0)];
        let (i, d) = nearest_vertex(&pts, &p(4.5, 0.0, 0.0)).unwrap();
        assert_eq!(i, 1);
        assert!((d - 0.5).abs() < crate::math::TOLERANCE);
        assert!(nearest_vertex(&[], &p(0.0, 0.0, 0.0)).is_none());
    }
}
