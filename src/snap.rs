//! Snap candidates derived from watched layers.
//!
//! A [`SnapIndex`] flattens the geometries of its sources into point and
//! boundary-line candidates. It is rebuilt from scratch whenever a watched
//! layer reports an added, removed or modify-end event.

use slotmap::SlotMap;
use tracing::debug;

use crate::event::LayerEvent;
use crate::geometry::Geometry;
use crate::layer::{GeometryRef, Layer, LayerId};
use crate::math::Point3;
use crate::tessellation::{LocalPoints, LocalPolyline};

slotmap::new_key_type! {
    /// Unique identifier for a snap index in an editing session.
    pub struct SnapId;
}

/// A vertex the cursor may lock onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapPoint {
    pub coordinates: Point3,
    pub refers_to: GeometryRef,
}

/// A boundary line (line contour or closed polygon ring) the cursor may
/// lock onto.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapLine {
    pub polyline: LocalPolyline,
    pub refers_to: GeometryRef,
}

/// A dense surface source, probed through the scene picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapPointCloud {
    pub layer: LayerId,
}

/// Snap candidates for one set of sources.
#[derive(Debug, Clone)]
pub struct SnapIndex {
    sources: Vec<LayerId>,
    target: Option<GeometryRef>,
    active: bool,
    points: Vec<SnapPoint>,
    cloud: LocalPoints,
    lines: Vec<SnapLine>,
    surfaces: Vec<SnapPointCloud>,
}

impl SnapIndex {
    /// Snaps to every geometry of the given layers. Point cloud and model
    /// layers contribute their surfaces.
    #[must_use]
    pub fn from_sources(sources: Vec<LayerId>) -> Self {
        Self {
            sources,
            target: None,
            active: true,
            points: Vec::new(),
            cloud: LocalPoints::default(),
            lines: Vec::new(),
            surfaces: Vec::new(),
        }
    }

    /// Snaps to a single geometry only.
    #[must_use]
    pub fn for_target(target: GeometryRef) -> Self {
        Self {
            target: Some(target),
            ..Self::from_sources(vec![target.layer])
        }
    }

    #[must_use]
    pub fn sources(&self) -> &[LayerId] {
        &self.sources
    }

    #[must_use]
    pub fn target(&self) -> Option<GeometryRef> {
        self.target
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Activates or deactivates the index. Activation rebuilds the
    /// candidates; deactivation drops them.
    pub fn set_active(&mut self, active: bool, layers: &SlotMap<LayerId, Layer>) {
        self.active = active;
        if active {
            self.rebuild(layers);
        } else {
            self.clear();
        }
    }

    /// Returns `true` if `event` comes from a watched layer.
    #[must_use]
    pub fn handles_event(&self, event: &LayerEvent) -> bool {
        self.sources.contains(&event.layer())
    }

    /// Point candidates, in generation order.
    #[must_use]
    pub fn points(&self) -> &[SnapPoint] {
        &self.points
    }

    /// Point candidates localized to the first candidate, parallel to
    /// [`SnapIndex::points`].
    #[must_use]
    pub fn point_cloud(&self) -> &LocalPoints {
        &self.cloud
    }

    #[must_use]
    pub fn lines(&self) -> &[SnapLine] {
        &self.lines
    }

    #[must_use]
    pub fn surfaces(&self) -> &[SnapPointCloud] {
        &self.surfaces
    }

    fn clear(&mut self) {
        self.points.clear();
        self.cloud = LocalPoints::default();
        self.lines.clear();
        self.surfaces.clear();
    }

    /// Regenerates every candidate from the current layer contents.
    ///
    /// Per geometry: a point yields one snap point; a line yields its
    /// contour then its vertices; a polygon yields its outer vertices, then
    /// per hole a closed hole line followed by the hole vertices, and
    /// finally its closed outer line.
    pub fn rebuild(&mut self, layers: &SlotMap<LayerId, Layer>) {
        self.clear();
        if !self.active {
            return;
        }

        if let Some(target) = self.target {
            let geometry = layers
                .get(target.layer)
                .and_then(Layer::as_geometry)
                .and_then(|layer| layer.get(target.geometry));
            if let Some(geometry) = geometry {
                self.add_geometry(target, geometry);
            }
        } else {
            for layer_id in self.sources.clone() {
                match layers.get(layer_id) {
                    Some(Layer::Geometry(layer)) => {
                        for (id, geometry) in layer.iter() {
                            self.add_geometry(GeometryRef::new(layer_id, id), geometry);
                        }
                    }
                    Some(Layer::PointCloud(_) | Layer::Model(_)) => {
                        self.surfaces.push(SnapPointCloud { layer: layer_id });
                    }
                    None => {}
                }
            }
        }

        let coordinates: Vec<Point3> = self.points.iter().map(|p| p.coordinates).collect();
        self.cloud = LocalPoints::from_world(&coordinates);
        debug!(
            points = self.points.len(),
            lines = self.lines.len(),
            surfaces = self.surfaces.len(),
            "snap index rebuilt"
        );
    }

    fn add_geometry(&mut self, refers_to: GeometryRef, geometry: &Geometry) {
        match geometry {
            Geometry::Point(point) => self.add_point(point.position(), refers_to),
            Geometry::Line(line) => {
                self.add_line(line.vectors(), false, refers_to);
                for &v in line.vectors() {
                    self.add_point(v, refers_to);
                }
            }
            Geometry::Polygon(polygon) => {
                for &v in polygon.vectors() {
                    self.add_point(v, refers_to);
                }
                for hole in polygon.holes() {
                    self.add_line(hole, true, refers_to);
                    for &v in hole {
                        self.add_point(v, refers_to);
                    }
                }
                self.add_line(polygon.vectors(), true, refers_to);
            }
        }
    }

    fn add_point(&mut self, coordinates: Point3, refers_to: GeometryRef) {
        self.points.push(SnapPoint {
            coordinates,
            refers_to,
        });
    }

    fn add_line(&mut self, vertices: &[Point3], closed: bool, refers_to: GeometryRef) {
        if vertices.len() < 2 {
            return;
        }
        self.lines.push(SnapLine {
            polyline: LocalPolyline::from_world(vertices, closed),
            refers_to,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{Line, Point, Polygon, Properties};
    use crate::layer::{ExternalLayer, GeometryLayer};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn square(min: f64, max: f64) -> Vec<Point3> {
        vec![p(min, min), p(max, min), p(max, max), p(min, max)]
    }

    fn layers() -> (SlotMap<LayerId, Layer>, LayerId, LayerId) {
        let mut layer = GeometryLayer::new("edits");
        layer.add(Point::new(p(50.0, 50.0), Properties::new()).into());
        layer.add(
            Line::new(vec![p(0.0, 20.0), p(10.0, 20.0), p(10.0, 30.0)], Properties::new())
                .unwrap()
                .into(),
        );
        layer.add(
            Polygon::new(vec![square(0.0, 10.0), square(2.0, 4.0)], Properties::new())
                .unwrap()
                .into(),
        );
        let mut layers = SlotMap::with_key();
        let edits = layers.insert(Layer::Geometry(layer));
        let scan = layers.insert(Layer::PointCloud(ExternalLayer::new("scan")));
        (layers, edits, scan)
    }

    #[test]
    fn generation_order() {
        let (layers, edits, scan) = layers();
        let mut index = SnapIndex::from_sources(vec![edits, scan]);
        index.rebuild(&layers);

        // 1 point + 3 line vertices + 4 outer + 4 hole vertices.
        assert_eq!(index.points().len(), 12);
        assert_eq!(index.points()[0].coordinates, p(50.0, 50.0));
        assert_eq!(index.points()[1].coordinates, p(0.0, 20.0));
        assert_eq!(index.points()[4].coordinates, p(0.0, 0.0));
        assert_eq!(index.points()[8].coordinates, p(2.0, 2.0));

        // Line contour, hole ring, outer ring.
        assert_eq!(index.lines().len(), 3);
        assert_eq!(index.lines()[0].polyline.points.len(), 3);
        assert_eq!(index.lines()[1].polyline.origin, p(2.0, 2.0));
        assert_eq!(index.lines()[2].polyline.points.len(), 5);

        assert_eq!(index.surfaces(), &[SnapPointCloud { layer: scan }]);
        assert_eq!(index.point_cloud().len(), 12);
        assert_eq!(index.point_cloud().root, p(50.0, 50.0));
    }

    #[test]
    fn target_index_only_covers_its_geometry() {
        let (layers, edits, _) = layers();
        let line = layers[edits].as_geometry().unwrap().ids()[1];
        let mut index = SnapIndex::for_target(GeometryRef::new(edits, line));
        index.rebuild(&layers);
        assert_eq!(index.points().len(), 3);
        assert_eq!(index.lines().len(), 1);
        assert!(index.surfaces().is_empty());
    }

    #[test]
    fn inactive_index_is_empty() {
        let (layers, edits, _) = layers();
        let mut index = SnapIndex::from_sources(vec![edits]);
        index.rebuild(&layers);
        assert!(!index.points().is_empty());
        index.set_active(false, &layers);
        assert!(index.points().is_empty());
        assert!(index.lines().is_empty());
        index.rebuild(&layers);
        assert!(index.points().is_empty());
        index.set_active(true, &layers);
        assert_eq!(index.points().len(), 12);
    }

    #[test]
    fn handles_events_of_watched_layers_only() {
        let (layers, edits, scan) = layers();
        let line = layers[edits].as_geometry().unwrap().ids()[1];
        let index = SnapIndex::from_sources(vec![edits]);
        assert!(index.handles_event(&LayerEvent::Added(GeometryRef::new(edits, line))));
        assert!(!index.handles_event(&LayerEvent::Added(GeometryRef::new(scan, line))));
    }
}
