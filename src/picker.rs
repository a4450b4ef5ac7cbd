use crate::error::ResolveError;
use crate::layer::LayerId;
use crate::math::{Point2, Point3, Ray};

/// Ray queries against scene data the session does not own.
///
/// Implemented by the renderer that holds the point clouds and meshes of
/// [`Layer::PointCloud`](crate::layer::Layer::PointCloud) and
/// [`Layer::Model`](crate::layer::Layer::Model) layers.
pub trait ScenePicker {
    /// Nearest hit against the dense surfaces of `layers`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Scene`] if the query cannot be answered.
    fn intersect_surfaces(&self, ray: &Ray, layers: &[LayerId]) -> Result<Option<Point3>, ResolveError>;

    /// Nearest hit against every mesh and point cloud of the scene.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Scene`] if the query cannot be answered.
    fn intersect_scene(&self, ray: &Ray) -> Result<Option<Point3>, ResolveError>;

    /// Color under `ndc` in the color-pick pass, if anything was drawn there.
    fn pick_color(&self, ndc: &Point2) -> Option<[u8; 3]>;
}

/// A scene with no external data.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScene;

impl ScenePicker for EmptyScene {
    fn intersect_surfaces(&self, _ray: &Ray, _layers: &[LayerId]) -> Result<Option<Point3>, ResolveError> {
        Ok(None)
    }

    fn intersect_scene(&self, _ray: &Ray) -> Result<Option<Point3>, ResolveError> {
        Ok(None)
    }

    fn pick_color(&self, _ndc: &Point2) -> Option<[u8; 3]> {
        None
    }
}
