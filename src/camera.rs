use crate::error::{ResolveError, Result};
use crate::math::{Matrix4, Point2, Point3, Ray, Vector3, TOLERANCE};

/// Converts a pixel position inside a `width` x `height` viewport to
/// normalized device coordinates (`x` left to right, `y` bottom to top,
/// both in `[-1, 1]`).
#[must_use]
pub fn pixel_to_ndc(x: f64, y: f64, width: f64, height: f64) -> Point2 {
    Point2::new((x / width) * 2.0 - 1.0, -(y / height) * 2.0 + 1.0)
}

/// A view-projection camera producing world-space pick rays.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    eye: Point3,
    view_projection: Matrix4,
    inverse: Matrix4,
}

impl Camera {
    /// Creates a camera at `eye` with the given view-projection matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::SingularProjection`] if the matrix has no
    /// inverse.
    pub fn new(eye: Point3, view_projection: Matrix4) -> Result<Self> {
        let inverse = view_projection
            .try_inverse()
            .ok_or(ResolveError::SingularProjection)?;
        Ok(Self {
            eye,
            view_projection,
            inverse,
        })
    }

    /// Creates a perspective camera looking from `eye` at `target`.
    ///
    /// `fovy` is the vertical field of view in radians.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::SingularProjection`] if `eye == target`, `up`
    /// is parallel to the view direction, `aspect` is not positive, `fovy`
    /// is outside `(0, pi)` or `near == far`.
    pub fn perspective(
        eye: Point3,
        target: Point3,
        up: Vector3,
        fovy: f64,
        aspect: f64,
        near: f64,
        far: f64,
    ) -> Result<Self> {
        let forward = target - eye;
        let frustum_ok = aspect.is_finite()
            && aspect > 0.0
            && fovy.is_finite()
            && fovy > 0.0
            && fovy < std::f64::consts::PI
            && near.is_finite()
            && far.is_finite()
            && (far - near).abs() > TOLERANCE;
        let view_ok = forward.norm() > TOLERANCE && forward.cross(&up).norm() > TOLERANCE * forward.norm();
        if !frustum_ok || !view_ok {
            return Err(ResolveError::SingularProjection.into());
        }
        let view = Matrix4::look_at_rh(&eye, &target, &up);
        let projection = Matrix4::new_perspective(aspect, fovy, near, far);
        Self::new(eye, projection * view)
    }

    #[must_use]
    pub fn eye(&self) -> &Point3 {
        &self.eye
    }

    #[must_use]
    pub fn view_projection(&self) -> &Matrix4 {
        &self.view_projection
    }

    /// World-space ray from the eye through `ndc`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidRay`] if the unprojected point is not
    /// finite or coincides with the eye.
    pub fn ray(&self, ndc: &Point2) -> Result<Ray> {
        let on_view = self.inverse.transform_point(&Point3::new(ndc.x, ndc.y, 0.5));
        let direction = on_view - self.eye;
        if !direction.iter().all(|c| c.is_finite()) {
            return Err(ResolveError::InvalidRay.into());
        }
        Ray::new(self.eye, direction).map_err(|_| ResolveError::InvalidRay.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    fn top_down(x: f64, y: f64) -> Camera {
        Camera::perspective(
            Point3::new(x, y, 100.0),
            Point3::new(x, y, 0.0),
            Vector3::y(),
            FRAC_PI_4,
            1.0,
            0.1,
            1000.0,
        )
        .unwrap()
    }

    #[test]
    fn center_ray_points_at_target() {
        let camera = top_down(3.0, 4.0);
        let ray = camera.ray(&Point2::new(0.0, 0.0)).unwrap();
        assert_relative_eq!(ray.origin().x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(ray.direction().z, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn right_of_center_ray_leans_right() {
        let camera = top_down(0.0, 0.0);
        let ray = camera.ray(&Point2::new(0.5, 0.0)).unwrap();
        assert!(ray.direction().x > 0.0);
        assert_relative_eq!(ray.direction().y, 0.0, epsilon = 1e-9);
        let up = camera.ray(&Point2::new(0.0, 0.5)).unwrap();
        assert!(up.direction().y > 0.0);
    }

    #[test]
    fn singular_matrix_is_rejected() {
        assert!(Camera::new(Point3::origin(), Matrix4::zeros()).is_err());
    }

    fn perspective(eye: Point3, target: Point3, up: Vector3, aspect: f64, near: f64, far: f64) -> Result<Camera> {
        Camera::perspective(eye, target, up, FRAC_PI_4, aspect, near, far)
    }

    #[test]
    fn zero_height_viewport_is_rejected() {
        let eye = Point3::new(0.0, 0.0, 10.0);
        let camera = perspective(eye, Point3::origin(), Vector3::y(), 0.0, 0.1, 100.0);
        assert!(matches!(
            camera,
            Err(crate::GeoeditError::Resolve(ResolveError::SingularProjection))
        ));
        assert!(perspective(eye, Point3::origin(), Vector3::y(), f64::INFINITY, 0.1, 100.0).is_err());
    }

    #[test]
    fn degenerate_views_are_rejected() {
        let eye = Point3::new(0.0, 0.0, 10.0);
        assert!(perspective(eye, Point3::origin(), Vector3::y(), 1.0, 5.0, 5.0).is_err());
        assert!(perspective(eye, eye, Vector3::y(), 1.0, 0.1, 100.0).is_err());
        assert!(perspective(eye, Point3::origin(), Vector3::z(), 1.0, 0.1, 100.0).is_err());
        assert!(Camera::perspective(eye, Point3::origin(), Vector3::y(), 0.0, 1.0, 0.1, 100.0).is_err());
        assert!(Camera::perspective(eye, Point3::origin(), Vector3::y(), f64::NAN, 1.0, 0.1, 100.0).is_err());
    }

    #[test]
    fn pixels_to_ndc() {
        let ndc = pixel_to_ndc(0.0, 0.0, 800.0, 600.0);
        assert_relative_eq!(ndc.x, -1.0);
        assert_relative_eq!(ndc.y, 1.0);
        let ndc = pixel_to_ndc(400.0, 450.0, 800.0, 600.0);
        assert_relative_eq!(ndc.x, 0.0);
        assert_relative_eq!(ndc.y, -0.5);
    }
}
