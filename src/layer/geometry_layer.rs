use slotmap::SlotMap;
use tracing::debug;

use crate::error::LayerError;
use crate::geometry::{Geometry, GeometryKind};
use crate::math::{Aabb, Point3, Ray};

use super::{GeometryId, PointBatch};

/// A hit of a pick ray against a geometry of a layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerHit {
    pub geometry: GeometryId,
    pub point: Point3,
    pub distance: f64,
}

/// An editable collection of vector geometries.
///
/// Geometries keep their insertion order; Point geometries are additionally
/// batched into a single localized point buffer.
#[derive(Debug, Clone, Default)]
pub struct GeometryLayer {
    name: String,
    visible: bool,
    geometries: SlotMap<GeometryId, Geometry>,
    order: Vec<GeometryId>,
    points: PointBatch,
}

impl GeometryLayer {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            ..Self::default()
        }
    }

    /// Creates a layer holding `geometries`.
    #[must_use]
    pub fn with_geometries(name: impl Into<String>, geometries: impl IntoIterator<Item = Geometry>) -> Self {
        let mut layer = Self::new(name);
        for geometry in geometries {
            layer.add(geometry);
        }
        layer
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts a geometry and returns its ID.
    pub fn add(&mut self, geometry: Geometry) -> GeometryId {
        let is_point = geometry.kind() == GeometryKind::Point;
        let id = self.geometries.insert(geometry);
        self.order.push(id);
        if is_point {
            self.update_points();
        }
        id
    }

    /// Removes a geometry, returning it if it was present.
    pub fn remove(&mut self, id: GeometryId) -> Option<Geometry> {
        let geometry = self.geometries.remove(id)?;
        self.order.retain(|&g| g != id);
        if geometry.kind() == GeometryKind::Point {
            self.update_points();
        }
        Some(geometry)
    }

    #[must_use]
    pub fn contains(&self, id: GeometryId) -> bool {
        self.geometries.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id)
    }

    pub fn get_mut(&mut self, id: GeometryId) -> Option<&mut Geometry> {
        self.geometries.get_mut(id)
    }

    /// Returns the geometry, or an error if it is not in this layer.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::GeometryNotFound`] for unknown IDs.
    pub fn geometry(&self, id: GeometryId) -> Result<&Geometry, LayerError> {
        self.geometries.get(id).ok_or(LayerError::GeometryNotFound)
    }

    /// Returns the geometry mutably, or an error if it is not in this layer.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::GeometryNotFound`] for unknown IDs.
    pub fn geometry_mut(&mut self, id: GeometryId) -> Result<&mut Geometry, LayerError> {
        self.geometries.get_mut(id).ok_or(LayerError::GeometryNotFound)
    }

    /// Iterates geometries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (GeometryId, &Geometry)> {
        self.order
            .iter()
            .filter_map(|&id| self.geometries.get(id).map(|g| (id, g)))
    }

    /// Geometry IDs in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[GeometryId] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Flags a geometry as highlighted. Returns `false` for unknown IDs.
    pub fn highlight(&mut self, id: GeometryId) -> bool {
        self.set_highlight(id, true)
    }

    /// Clears the highlight of a geometry. Returns `false` for unknown IDs.
    pub fn remove_highlight(&mut self, id: GeometryId) -> bool {
        self.set_highlight(id, false)
    }

    fn set_highlight(&mut self, id: GeometryId, highlighted: bool) -> bool {
        match self.geometries.get_mut(id) {
            Some(geometry) => {
                geometry.flags_mut().highlighted = highlighted;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Bounding box over every vertex of every geometry.
    #[must_use]
    pub fn bbox(&self) -> Option<Aabb> {
        self.iter()
            .filter_map(|(_, g)| g.bbox())
            .reduce(|acc, b| acc.union(&b))
    }

    /// Rebuilds the point batch from the current Point geometries.
    pub fn update_points(&mut self) {
        self.points = PointBatch::from_points(self.iter().filter_map(|(id, g)| match g {
            Geometry::Point(point) => Some((id, point.position())),
            Geometry::Line(_) | Geometry::Polygon(_) => None,
        }));
        debug!(layer = %self.name, points = self.points.len(), "point batch rebuilt");
    }

    /// The batched Point geometries.
    #[must_use]
    pub fn point_batch(&self) -> &PointBatch {
        &self.points
    }

    /// Nearest hit of `ray` against the layer's renderables.
    ///
    /// Lines and polygons are tested on their renderable form, points
    /// through the point batch; `threshold` is the pick distance for points
    /// and lines. Geometries rejected by `include` are skipped. A hidden
    /// layer is never hit.
    pub fn raycast(
        &self,
        ray: &Ray,
        threshold: f64,
        include: impl Fn(GeometryId, &Geometry) -> bool,
    ) -> Option<LayerHit> {
        if !self.visible {
            return None;
        }

        let model_hits = self.iter().filter_map(|(id, g)| {
            if matches!(g, Geometry::Point(_)) || !include(id, g) {
                return None;
            }
            g.raycast(ray, threshold).map(|hit| LayerHit {
                geometry: id,
                point: hit.point,
                distance: hit.distance,
            })
        });

        let point_hits = self
            .points
            .raycast(ray, threshold)
            .into_iter()
            .filter(|(id, _)| self.geometries.get(*id).is_some_and(|g| include(*id, g)))
            .map(|(id, hit)| LayerHit {
                geometry: id,
                point: ray.at(hit.distance),
                distance: hit.distance,
            });

        model_hits
            .chain(point_hits)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{Line, Point, Polygon, Properties};
    use crate::math::Vector3;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn point(x: f64, y: f64) -> Geometry {
        Point::new(p(x, y, 0.0), Properties::new()).into()
    }

    fn down(x: f64, y: f64) -> Ray {
        Ray::new(p(x, y, 50.0), Vector3::new(0.0, 0.0, -1.0)).unwrap()
    }

    fn sample_layer() -> (GeometryLayer, GeometryId, GeometryId, GeometryId) {
        let mut layer = GeometryLayer::new("edits");
        let pt = layer.add(point(20.0, 20.0));
        let line = layer.add(
            Line::new(vec![p(0.0, -5.0, 0.0), p(10.0, -5.0, 0.0)], Properties::new())
                .unwrap()
                .into(),
        );
        let poly = layer.add(
            Polygon::new(
                vec![vec![p(0.0, 0.0, 1.0), p(10.0, 0.0, 1.0), p(10.0, 10.0, 1.0), p(0.0, 10.0, 1.0)]],
                Properties::new(),
            )
            .unwrap()
            .into(),
        );
        (layer, pt, line, poly)
    }

    #[test]
    fn insertion_order_is_kept() {
        let (layer, pt, line, poly) = sample_layer();
        let ids: Vec<_> = layer.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![pt, line, poly]);
        assert_eq!(layer.point_batch().len(), 1);
    }

    #[test]
    fn removing_a_point_refreshes_the_batch() {
        let (mut layer, pt, line, _) = sample_layer();
        assert!(layer.remove(pt).is_some());
        assert!(layer.point_batch().is_empty());
        assert!(layer.remove(pt).is_none());
        assert!(layer.remove(line).is_some());
        assert_eq!(layer.len(), 1);
        assert!(matches!(layer.geometry(line), Err(LayerError::GeometryNotFound)));
    }

    #[test]
    fn raycast_hits_each_kind() {
        let (layer, pt, line, poly) = sample_layer();
        let all = |_: GeometryId, _: &Geometry| true;
        assert_eq!(layer.raycast(&down(20.05, 20.0), 0.3, all).unwrap().geometry, pt);
        assert_eq!(layer.raycast(&down(5.0, -5.05), 0.1, all).unwrap().geometry, line);
        let hit = layer.raycast(&down(5.0, 5.0), 0.1, all).unwrap();
        assert_eq!(hit.geometry, poly);
        assert!((hit.point.z - 1.0).abs() < 1e-9);
        assert!(layer.raycast(&down(50.0, 50.0), 0.1, all).is_none());
    }

    #[test]
    fn raycast_respects_filter_and_visibility() {
        let (mut layer, _, _, poly) = sample_layer();
        assert!(layer.raycast(&down(5.0, 5.0), 0.1, |id, _| id != poly).is_none());
        layer.hide();
        assert!(layer.raycast(&down(5.0, 5.0), 0.1, |_, _| true).is_none());
        layer.show();
        assert!(layer.visible());
    }

    #[test]
    fn highlight_flags() {
        let (mut layer, _, line, _) = sample_layer();
        assert!(layer.highlight(line));
        assert!(layer.get(line).unwrap().flags().highlighted);
        assert!(layer.remove_highlight(line));
        assert!(!layer.get(line).unwrap().flags().highlighted);
    }

    #[test]
    fn bbox_spans_all_geometries() {
        let (layer, ..) = sample_layer();
        let bbox = layer.bbox().unwrap();
        assert_eq!(bbox.min, p(0.0, -5.0, 0.0));
        assert_eq!(bbox.max, p(20.0, 20.0, 1.0));
        assert!(GeometryLayer::new("empty").bbox().is_none());
    }
}
