mod geometry_layer;
mod point_batch;

pub use geometry_layer::{GeometryLayer, LayerHit};
pub use point_batch::{decode_pick_color, encode_pick_color, PointBatch};

use std::fmt;

use crate::error::LayerError;
use crate::math::Aabb;

slotmap::new_key_type! {
    /// Unique identifier for a layer in an editing session.
    pub struct LayerId;
}

slotmap::new_key_type! {
    /// Unique identifier for a geometry inside its layer.
    pub struct GeometryId;
}

/// Fully qualified reference to a geometry: its layer and its ID there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryRef {
    pub layer: LayerId,
    pub geometry: GeometryId,
}

impl GeometryRef {
    #[must_use]
    pub fn new(layer: LayerId, geometry: GeometryId) -> Self {
        Self { layer, geometry }
    }
}

/// The kinds of layer a session can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Geometry,
    PointCloud,
    Model,
}

impl LayerKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Geometry => "geometry layer",
            Self::PointCloud => "point cloud layer",
            Self::Model => "model layer",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle to scene data owned by the renderer (point clouds, meshes).
///
/// The session never inspects the data itself; it forwards ray queries for
/// these layers to the [`ScenePicker`](crate::picker::ScenePicker).
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalLayer {
    name: String,
    visible: bool,
    bbox: Option<Aabb>,
}

impl ExternalLayer {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            bbox: None,
        }
    }

    /// Records the extent of the external data, as reported by its loader.
    #[must_use]
    pub fn with_bbox(mut self, bbox: Aabb) -> Self {
        self.bbox = Some(bbox);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A layer of an editing session.
#[derive(Debug, Clone)]
pub enum Layer {
    Geometry(GeometryLayer),
    PointCloud(ExternalLayer),
    Model(ExternalLayer),
}

impl Layer {
    #[must_use]
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Geometry(_) => LayerKind::Geometry,
            Self::PointCloud(_) => LayerKind::PointCloud,
            Self::Model(_) => LayerKind::Model,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Geometry(layer) => layer.name(),
            Self::PointCloud(layer) | Self::Model(layer) => layer.name(),
        }
    }

    #[must_use]
    pub fn visible(&self) -> bool {
        match self {
            Self::Geometry(layer) => layer.visible(),
            Self::PointCloud(layer) | Self::Model(layer) => layer.visible,
        }
    }

    pub fn show(&mut self) {
        match self {
            Self::Geometry(layer) => layer.show(),
            Self::PointCloud(layer) | Self::Model(layer) => layer.visible = true,
        }
    }

    pub fn hide(&mut self) {
        match self {
            Self::Geometry(layer) => layer.hide(),
            Self::PointCloud(layer) | Self::Model(layer) => layer.visible = false,
        }
    }

    #[must_use]
    pub fn bbox(&self) -> Option<Aabb> {
        match self {
            Self::Geometry(layer) => layer.bbox(),
            Self::PointCloud(layer) | Self::Model(layer) => layer.bbox,
        }
    }

    #[must_use]
    pub fn as_geometry(&self) -> Option<&GeometryLayer> {
        match self {
            Self::Geometry(layer) => Some(layer),
            Self::PointCloud(_) | Self::Model(_) => None,
        }
    }

    pub fn as_geometry_mut(&mut self) -> Option<&mut GeometryLayer> {
        match self {
            Self::Geometry(layer) => Some(layer),
            Self::PointCloud(_) | Self::Model(_) => None,
        }
    }

    /// Returns the geometry layer, or an error naming the actual kind.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::NotAGeometryLayer`] for external layers.
    pub fn geometry_layer_mut(&mut self) -> Result<&mut GeometryLayer, LayerError> {
        let (name, kind) = (self.name().to_string(), self.kind().name());
        self.as_geometry_mut()
            .ok_or(LayerError::NotAGeometryLayer { name, kind })
    }
}

impl From<GeometryLayer> for Layer {
    fn from(value: GeometryLayer) -> Self {
        Self::Geometry(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point3;

    #[test]
    fn external_layers_are_not_geometry_layers() {
        let mut layer = Layer::PointCloud(ExternalLayer::new("scan"));
        assert!(layer.as_geometry().is_none());
        assert_eq!(layer.kind().to_string(), "point cloud layer");
        layer.hide();
        assert!(!layer.visible());
        assert_eq!(layer.name(), "scan");
        assert!(matches!(
            layer.geometry_layer_mut(),
            Err(LayerError::NotAGeometryLayer { kind: "point cloud layer", .. })
        ));
    }

    #[test]
    fn external_bbox_is_reported() {
        let bbox = Aabb::from_point(Point3::new(1.0, 2.0, 3.0));
        let layer = Layer::Model(ExternalLayer::new("building").with_bbox(bbox));
        assert_eq!(layer.bbox(), Some(bbox));
    }
}
