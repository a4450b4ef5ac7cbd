use crate::error::{GeometryError, Result};

use super::{Point3, Vector3, TOLERANCE};

/// A half-line `origin + t * direction` with `t >= 0` and a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    origin: Point3,
    direction: Vector3,
}

impl Ray {
    /// Creates a new ray, normalizing `direction`.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vector is zero-length.
    pub fn new(origin: Point3, direction: Vector3) -> Result<Self> {
        let len = direction.norm();
        if len < TOLERANCE || !len.is_finite() {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            direction: direction / len,
        })
    }

    /// Returns the ray origin.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit direction.
    #[must_use]
    pub fn direction(&self) -> &Vector3 {
        &self.direction
    }

    /// Evaluates the ray at parameter `t`.
    #[must_use]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Returns the same ray expressed relative to `root`.
    ///
    /// Used to test against localized coordinate buffers without losing
    /// precision far from the world origin.
    #[must_use]
    pub fn localized(&self, root: &Point3) -> Self {
        Self {
            origin: Point3::from(self.origin - root),
            direction: self.direction,
        }
    }

    /// Parameter of the point on the ray closest to `point`, clamped to `t >= 0`.
    #[must_use]
    pub fn closest_parameter(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.direction).max(0.0)
    }

    /// Distance from `point` to the closest point on the ray.
    #[must_use]
    pub fn distance_to_point(&self, point: &Point3) -> f64 {
        let t = self.closest_parameter(point);
        (self.at(t) - point).norm()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn direction_is_normalized() {
        let ray = Ray::new(p(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -5.0)).unwrap();
        assert!((ray.direction().z + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn zero_direction_rejected() {
        assert!(Ray::new(p(1.0, 1.0, 1.0), Vector3::zeros()).is_err());
    }

    #[test]
    fn distance_to_point_ahead_and_behind() {
        let ray = Ray::new(p(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        assert!((ray.distance_to_point(&p(0.3, 0.4, 0.0)) - 0.5).abs() < TOLERANCE);
        // Behind the origin the distance is measured to the origin itself.
        assert!((ray.distance_to_point(&p(0.0, 0.0, 12.0)) - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn localized_keeps_direction() {
        let ray = Ray::new(p(1000.0, 2000.0, 10.0), Vector3::new(1.0, 0.0, 0.0)).unwrap();
        let local = ray.localized(&p(1000.0, 2000.0, 0.0));
        assert_eq!(*local.origin(), p(0.0, 0.0, 10.0));
        assert_eq!(local.direction(), ray.direction());
    }
}
