mod local_points;
mod triangulate_rings;

pub use local_points::{LocalPoints, PointHit};
pub use triangulate_rings::triangulate_rings;

use crate::math::intersect_3d::{ray_segment_query, ray_triangle_intersect, RaySegmentHit};
use crate::math::{Point3, Ray, Vector3};

/// A polyline approximation of a line or ring, localized to `origin`.
///
/// Points are stored relative to `origin` to keep precision when the
/// geometry sits far from the world origin.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPolyline {
    /// World position the local coordinates are relative to.
    pub origin: Point3,
    /// The ordered vertices of the polyline, relative to `origin`.
    pub points: Vec<Vector3>,
}

impl Default for LocalPolyline {
    fn default() -> Self {
        Self {
            origin: Point3::origin(),
            points: Vec::new(),
        }
    }
}

impl LocalPolyline {
    /// Builds a polyline localized to the first of `points`.
    ///
    /// With `closed`, the first vertex is repeated at the end.
    #[must_use]
    pub fn from_world(points: &[Point3], closed: bool) -> Self {
        let Some(&origin) = points.first() else {
            return Self::default();
        };
        let mut local: Vec<Vector3> = points.iter().map(|p| p - origin).collect();
        if closed && points.len() > 1 {
            local.push(Vector3::zeros());
        }
        Self {
            origin,
            points: local,
        }
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Iterates the polyline vertices in world coordinates.
    pub fn world_points(&self) -> impl Iterator<Item = Point3> + '_ {
        self.points.iter().map(move |v| self.origin + v)
    }

    /// Cumulative distance from the first vertex to every vertex.
    ///
    /// The first entry is always `0.0`; consumers use these for dashing and
    /// measurement labels.
    #[must_use]
    pub fn line_distances(&self) -> Vec<f64> {
        let mut distances = Vec::with_capacity(self.points.len());
        let mut total = 0.0;
        for (i, point) in self.points.iter().enumerate() {
            if i > 0 {
                total += (point - self.points[i - 1]).norm();
            }
            distances.push(total);
        }
        distances
    }

    /// Nearest segment hit within `threshold` of `ray`, in world coordinates.
    #[must_use]
    pub fn raycast(&self, ray: &Ray, threshold: f64) -> Option<RaySegmentHit> {
        let local_ray = ray.localized(&self.origin);
        let mut best: Option<RaySegmentHit> = None;
        for pair in self.points.windows(2) {
            let a = Point3::from(pair[0]);
            let b = Point3::from(pair[1]);
            if let Some(hit) = ray_segment_query(&local_ray, &a, &b, threshold) {
                if best.is_none_or(|current| hit.distance < current.distance) {
                    best = Some(hit);
                }
            }
        }
        best.map(|hit| RaySegmentHit {
            point: self.origin + hit.point.coords,
            ..hit
        })
    }
}

/// A triangle mesh localized to `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMesh {
    /// World position the local coordinates are relative to.
    pub origin: Point3,
    /// Vertex positions, relative to `origin`.
    pub vertices: Vec<Vector3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

impl Default for LocalMesh {
    fn default() -> Self {
        Self {
            origin: Point3::origin(),
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }
}

impl LocalMesh {
    /// Returns the number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Returns the world-space corners of triangle `i`.
    #[must_use]
    pub fn world_triangle(&self, i: usize) -> Option<[Point3; 3]> {
        let tri = self.indices.get(i)?;
        let corner = |k: usize| {
            self.vertices
                .get(tri[k] as usize)
                .map(|v| self.origin + v)
        };
        Some([corner(0)?, corner(1)?, corner(2)?])
    }

    /// Local corners of `tri`, or `None` if an index is out of range.
    fn local_triangle(&self, tri: &[u32; 3]) -> Option<[Vector3; 3]> {
        let corner = |k: usize| self.vertices.get(tri[k] as usize).copied();
        Some([corner(0)?, corner(1)?, corner(2)?])
    }

    /// Sum of the triangle areas. Triangles with out-of-range indices are
    /// skipped.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.indices
            .iter()
            .filter_map(|tri| self.local_triangle(tri))
            .map(|[v0, v1, v2]| (v1 - v0).cross(&(v2 - v0)).norm() * 0.5)
            .sum()
    }

    /// Nearest triangle hit along `ray`.
    ///
    /// Returns `(world_point, distance)`.
    #[must_use]
    pub fn raycast(&self, ray: &Ray) -> Option<(Point3, f64)> {
        let local_ray = ray.localized(&self.origin);
        let mut best: Option<f64> = None;
        for [a, b, c] in self.indices.iter().filter_map(|tri| self.local_triangle(tri)) {
            let (a, b, c) = (Point3::from(a), Point3::from(b), Point3::from(c));
            if let Some(t) = ray_triangle_intersect(&local_ray, &a, &b, &c) {
                if best.is_none_or(|current| t < current) {
                    best = Some(t);
                }
            }
        }
        best.map(|t| (ray.at(t), t))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::TOLERANCE;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn polyline_is_localized_to_first_vertex() {
        let line = LocalPolyline::from_world(&[p(1000.0, 500.0, 10.0), p(1003.0, 504.0, 10.0)], false);
        assert_eq!(line.origin, p(1000.0, 500.0, 10.0));
        assert_eq!(line.points[0], Vector3::zeros());
        assert_eq!(line.points[1], Vector3::new(3.0, 4.0, 0.0));
        assert_eq!(line.segment_count(), 1);
    }

    #[test]
    fn closed_polyline_repeats_first_vertex() {
        let ring = LocalPolyline::from_world(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)], true);
        assert_eq!(ring.points.len(), 4);
        assert_eq!(ring.segment_count(), 3);
        let world: Vec<_> = ring.world_points().collect();
        assert_eq!(world[3], p(0.0, 0.0, 0.0));
    }

    #[test]
    fn cumulative_line_distances() {
        let line = LocalPolyline::from_world(
            &[p(0.0, 0.0, 0.0), p(3.0, 4.0, 0.0), p(3.0, 4.0, 2.0)],
            false,
        );
        let d = line.line_distances();
        assert_eq!(d.len(), 3);
        assert!(d[0].abs() < TOLERANCE);
        assert!((d[1] - 5.0).abs() < TOLERANCE);
        assert!((d[2] - 7.0).abs() < TOLERANCE);
    }

    #[test]
    fn empty_polyline() {
        let line = LocalPolyline::from_world(&[], true);
        assert!(line.points.is_empty());
        assert_eq!(line.segment_count(), 0);
        assert!(line.line_distances().is_empty());
    }

    #[test]
    fn polyline_raycast_returns_world_point() {
        let line = LocalPolyline::from_world(&[p(100.0, 0.0, 0.0), p(110.0, 0.0, 0.0)], false);
        let ray = Ray::new(p(104.0, 0.05, 20.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        let hit = line.raycast(&ray, 0.1).unwrap();
        assert!((hit.point.x - 104.0).abs() < 1e-9);
        assert!((hit.distance - 20.0).abs() < 1e-9);
        assert!(line.raycast(&ray, 0.01).is_none());
    }

    #[test]
    fn mesh_raycast_and_area() {
        let mesh = LocalMesh {
            origin: p(50.0, 50.0, 1.0),
            vertices: vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(2.0, 0.0, 0.0),
                Vector3::new(0.0, 2.0, 0.0),
            ],
            indices: vec![[0, 1, 2]],
        };
        assert!((mesh.area() - 2.0).abs() < TOLERANCE);
        let ray = Ray::new(p(50.5, 50.5, 11.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        let (point, distance) = mesh.raycast(&ray).unwrap();
        assert!((distance - 10.0).abs() < 1e-9);
        assert!((point.z - 1.0).abs() < 1e-9);
        assert_eq!(mesh.world_triangle(0).unwrap()[1], p(52.0, 50.0, 1.0));
        assert!(mesh.world_triangle(1).is_none());
    }

    #[test]
    fn out_of_range_triangles_are_skipped() {
        let mesh = LocalMesh {
            origin: p(0.0, 0.0, 0.0),
            vertices: vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(2.0, 0.0, 0.0),
                Vector3::new(0.0, 2.0, 0.0),
            ],
            indices: vec![[0, 1, 2], [0, 1, 7]],
        };
        assert!((mesh.area() - 2.0).abs() < TOLERANCE);
        let ray = Ray::new(p(1.5, 1.5, 5.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        assert!(mesh.raycast(&ray).is_none());
        assert!(mesh.world_triangle(1).is_none());
    }
}
