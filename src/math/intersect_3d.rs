use super::{Point3, Ray, Vector3, TOLERANCE};

/// Relationship of a line with a plane.
#[derive(Debug)]
pub enum LinePlaneRelation {
    /// Line intersects the plane at a single point.
    Point { point: Point3, t: f64 },
    /// Line is parallel to the plane (does not intersect).
    Parallel,
    /// Line lies entirely on the plane.
    OnPlane,
}

/// Computes the intersection of a line `origin + t * dir` with the plane
/// through `plane_origin` with unit normal `normal`.
///
/// `t` may be negative: the whole line is considered, not only the ray.
#[must_use]
pub fn line_plane_intersect(
    origin: &Point3,
    dir: &Vector3,
    plane_origin: &Point3,
    normal: &Vector3,
) -> LinePlaneRelation {
    let denom = normal.dot(dir);

    let diff = plane_origin - origin;
    let numer = normal.dot(&diff);

    if denom.abs() < TOLERANCE {
        if numer.abs() < TOLERANCE {
            LinePlaneRelation::OnPlane
        } else {
            LinePlaneRelation::Parallel
        }
    } else {
        let t = numer / denom;
        let point = origin + dir * t;
        LinePlaneRelation::Point { point, t }
    }
}

/// Intersects the line carrying `ray` with the horizontal plane `z = height`.
///
/// Returns `None` when the ray runs parallel to the plane.
#[must_use]
pub fn ray_horizontal_plane(ray: &Ray, height: f64) -> Option<Point3> {
    let plane_origin = Point3::new(0.0, 0.0, height);
    match line_plane_intersect(ray.origin(), ray.direction(), &plane_origin, &Vector3::z()) {
        LinePlaneRelation::Point { point, .. } => Some(Point3::new(point.x, point.y, height)),
        LinePlaneRelation::Parallel | LinePlaneRelation::OnPlane => None,
    }
}

/// Double-sided ray/triangle intersection (Möller–Trumbore).
///
/// Returns the ray parameter of the hit.
#[must_use]
pub fn ray_triangle_intersect(ray: &Ray, a: &Point3, b: &Point3, c: &Point3) -> Option<f64> {
    let edge1 = b - a;
    let edge2 = c - a;
    let pvec = ray.direction().cross(&edge2);
    let det = edge1.dot(&pvec);
    if det.abs() < TOLERANCE {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = ray.origin() - a;
    let u = tvec.dot(&pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(&edge1);
    let v = ray.direction().dot(&qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(&qvec) * inv_det;
    (t >= 0.0).then_some(t)
}

/// Result of testing a ray against a single point with a pick threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayPointHit {
    /// Point on the ray closest to the tested point.
    pub point: Point3,
    /// Distance from the ray origin to `point`.
    pub distance: f64,
    /// Distance between the tested point and `point`.
    pub distance_to_ray: f64,
}

/// Tests `target` against `ray`, accepting it when it lies within `threshold`
/// of the ray.
#[must_use]
pub fn ray_point_query(ray: &Ray, target: &Point3, threshold: f64) -> Option<RayPointHit> {
    let t = ray.closest_parameter(target);
    let point = ray.at(t);
    let distance_to_ray = (point - target).norm();
    (distance_to_ray < threshold).then_some(RayPointHit {
        point,
        distance: t,
        distance_to_ray,
    })
}

/// Result of testing a ray against a line segment with a pick threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySegmentHit {
    /// Closest point on the segment.
    pub point: Point3,
    /// Distance from the ray origin to the closest point on the ray.
    pub distance: f64,
    /// Gap between the ray and the segment at their closest approach.
    pub gap: f64,
    /// Segment parameter of `point` in `[0, 1]`.
    pub t: f64,
}

/// Tests the segment `a..b` against `ray`, accepting it when the closest
/// approach between the two is below `threshold`.
#[must_use]
pub fn ray_segment_query(ray: &Ray, a: &Point3, b: &Point3, threshold: f64) -> Option<RaySegmentHit> {
    let seg = b - a;
    let seg_len = seg.norm();
    if seg_len < TOLERANCE {
        return ray_point_query(ray, a, threshold).map(|hit| RaySegmentHit {
            point: *a,
            distance: hit.distance,
            gap: hit.distance_to_ray,
            t: 0.0,
        });
    }
    let seg_dir = seg / seg_len;
    let dir = ray.direction();
    let w0 = ray.origin() - a;

    // Closest points between the carrying lines, then clamp onto the
    // segment and the ray in turn.
    let b_dot = dir.dot(&seg_dir);
    let d = dir.dot(&w0);
    let e = seg_dir.dot(&w0);
    let denom = 1.0 - b_dot * b_dot;

    let mut s_seg = if denom > TOLERANCE {
        (e - b_dot * d) / denom
    } else {
        e
    };
    s_seg = s_seg.clamp(0.0, seg_len);

    let mut s_ray = (a + seg_dir * s_seg - ray.origin()).dot(dir);
    if s_ray < 0.0 {
        s_ray = 0.0;
        s_seg = e.clamp(0.0, seg_len);
    }

    let on_segment = a + seg_dir * s_seg;
    let on_ray = ray.at(s_ray);
    let gap = (on_segment - on_ray).norm();

    (gap < threshold).then_some(RaySegmentHit {
        point: on_segment,
        distance: s_ray,
        gap,
        t: s_seg / seg_len,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    fn down_ray(x: f64, y: f64) -> Ray {
        Ray::new(p(x, y, 10.0), v(0.0, 0.0, -1.0)).unwrap()
    }

    // ── line_plane_intersect ──

    #[test]
    fn line_hits_plane() {
        let result = line_plane_intersect(
            &p(0.0, 0.0, 0.0),
            &v(0.0, 0.0, 1.0),
            &p(0.0, 0.0, 5.0),
            &v(0.0, 0.0, 1.0),
        );
        match result {
            LinePlaneRelation::Point { point, t } => {
                assert!((t - 5.0).abs() < TOLERANCE);
                assert!((point.z - 5.0).abs() < TOLERANCE);
            }
            other => panic!("expected Point, got {other:?}"),
        }
    }

    #[test]
    fn line_parallel_to_plane() {
        let result = line_plane_intersect(
            &p(0.0, 0.0, 0.0),
            &v(1.0, 0.0, 0.0),
            &p(0.0, 0.0, 5.0),
            &v(0.0, 0.0, 1.0),
        );
        assert!(matches!(result, LinePlaneRelation::Parallel));
    }

    #[test]
    fn line_on_plane() {
        let result = line_plane_intersect(
            &p(1.0, 2.0, 0.0),
            &v(1.0, 0.0, 0.0),
            &p(0.0, 0.0, 0.0),
            &v(0.0, 0.0, 1.0),
        );
        assert!(matches!(result, LinePlaneRelation::OnPlane));
    }

    #[test]
    fn horizontal_plane_keeps_height() {
        let ray = Ray::new(p(0.0, 0.0, 10.0), v(1.0, 0.0, -1.0)).unwrap();
        let hit = ray_horizontal_plane(&ray, 4.0).unwrap();
        assert!((hit.x - 6.0).abs() < 1e-9);
        assert!((hit.z - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn horizontal_plane_parallel_ray() {
        let ray = Ray::new(p(0.0, 0.0, 10.0), v(1.0, 0.0, 0.0)).unwrap();
        assert!(ray_horizontal_plane(&ray, 0.0).is_none());
    }

    // ── ray_triangle_intersect ──

    #[test]
    fn ray_hits_triangle_from_both_sides() {
        let (a, b, c) = (p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(0.0, 4.0, 0.0));
        let t = ray_triangle_intersect(&down_ray(1.0, 1.0), &a, &b, &c).unwrap();
        assert!((t - 10.0).abs() < TOLERANCE);

        let up = Ray::new(p(1.0, 1.0, -3.0), v(0.0, 0.0, 1.0)).unwrap();
        let t = ray_triangle_intersect(&up, &a, &b, &c).unwrap();
        assert!((t - 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn ray_misses_triangle() {
        let (a, b, c) = (p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(0.0, 4.0, 0.0));
        assert!(ray_triangle_intersect(&down_ray(3.0, 3.0), &a, &b, &c).is_none());
    }

    // ── ray_point_query ──

    #[test]
    fn point_within_threshold() {
        let hit = ray_point_query(&down_ray(0.2, 0.0), &p(0.0, 0.0, 0.0), 0.3).unwrap();
        assert!((hit.distance_to_ray - 0.2).abs() < 1e-12);
        assert!((hit.distance - 10.0).abs() < 1e-12);
    }

    #[test]
    fn point_outside_threshold() {
        assert!(ray_point_query(&down_ray(0.5, 0.0), &p(0.0, 0.0, 0.0), 0.3).is_none());
    }

    // ── ray_segment_query ──

    #[test]
    fn segment_below_ray() {
        let hit = ray_segment_query(
            &down_ray(5.0, 0.05),
            &p(0.0, 0.0, 0.0),
            &p(10.0, 0.0, 0.0),
            0.1,
        )
        .unwrap();
        assert!((hit.point.x - 5.0).abs() < 1e-9);
        assert!(hit.point.y.abs() < 1e-9);
        assert!((hit.gap - 0.05).abs() < 1e-9);
        assert!((hit.t - 0.5).abs() < 1e-9);
    }

    #[test]
    fn segment_clamped_to_endpoint() {
        let hit = ray_segment_query(
            &down_ray(10.05, 0.0),
            &p(0.0, 0.0, 0.0),
            &p(10.0, 0.0, 0.0),
            0.1,
        )
        .unwrap();
        assert!((hit.point.x - 10.0).abs() < 1e-9);
        assert!((hit.t - 1.0).abs() < 1e-9);
    }

    #[test]
    fn segment_out_of_range() {
        assert!(ray_segment_query(
            &down_ray(5.0, 1.0),
            &p(0.0, 0.0, 0.0),
            &p(10.0, 0.0, 0.0),
            0.1,
        )
        .is_none());
    }

    #[test]
    fn segment_parallel_to_ray() {
        let ray = Ray::new(p(0.0, 0.05, 0.0), v(1.0, 0.0, 0.0)).unwrap();
        let hit = ray_segment_query(&ray, &p(2.0, 0.0, 0.0), &p(6.0, 0.0, 0.0), 0.1).unwrap();
        assert!((hit.gap - 0.05).abs() < 1e-9);
    }
}
