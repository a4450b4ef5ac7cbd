use slotmap::SlotMap;
use tracing::{debug, info, warn};

use crate::config::ModifyConfig;
use crate::event::{EditEvent, EditedVertex, LayerEvent, Outbox, RenderChange};
use crate::geometry::{Geometry, GeometryKind, VertexRef};
use crate::layer::{GeometryId, GeometryLayer, GeometryRef, Layer, LayerId};
use crate::math::Point3;

use super::{Button, InteractionContext, InteractionId, PointerEvent, PointerKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ModifyOptions {
    pub button: Button,
    /// Maximum cursor distance for grabbing an existing vertex.
    pub click_range: f64,
    /// Restricts editing to one geometry of the layer.
    pub target: Option<GeometryId>,
}

impl From<&ModifyConfig> for ModifyOptions {
    fn from(config: &ModifyConfig) -> Self {
        Self {
            button: config.button,
            click_range: config.click_range,
            target: None,
        }
    }
}

impl Default for ModifyOptions {
    fn default() -> Self {
        Self::from(&ModifyConfig::default())
    }
}

/// Drags, inserts and removes vertices of existing geometries.
///
/// A click on a geometry grabs the nearest vertex within the click range,
/// or inserts a vertex when the click lands on an edge. While a vertex is
/// grabbed the geometry is locked to this interaction and the vertex
/// follows the cursor; the next click releases it.
#[derive(Debug, Clone)]
pub struct Modify {
    layer: LayerId,
    options: ModifyOptions,
    active: bool,
    selected_object: Option<GeometryId>,
    selected_vertex: Option<VertexRef>,
}

fn geometry_layer(layers: &mut SlotMap<LayerId, Layer>, id: LayerId) -> Option<&mut GeometryLayer> {
    layers.get_mut(id).and_then(Layer::as_geometry_mut)
}

impl Modify {
    #[must_use]
    pub fn new(layer: LayerId, options: ModifyOptions) -> Self {
        Self {
            layer,
            options,
            active: true,
            selected_object: None,
            selected_vertex: None,
        }
    }

    #[must_use]
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    #[must_use]
    pub fn options(&self) -> &ModifyOptions {
        &self.options
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The geometry resolved by the last click, if any.
    #[must_use]
    pub fn selected_object(&self) -> Option<GeometryId> {
        self.selected_object
    }

    /// The grabbed vertex. Only valid until the next edit of its ring.
    #[must_use]
    pub fn selected_vertex(&self) -> Option<VertexRef> {
        self.selected_vertex
    }

    pub(super) fn set_active(&mut self, active: bool, id: InteractionId, layers: &mut SlotMap<LayerId, Layer>) {
        self.active = active;
        if !active {
            self.release(id, layers);
        }
    }

    pub(super) fn handle_pointer(&mut self, event: &PointerEvent, ctx: &mut InteractionContext<'_>) {
        match event.kind {
            PointerKind::Move => self.drag(ctx),
            PointerKind::Up if ctx.is_click(event, self.options.button) => self.click(ctx),
            PointerKind::Up | PointerKind::Down => {}
        }
    }

    /// Moves the grabbed vertex to the cursor.
    fn drag(&mut self, ctx: &mut InteractionContext<'_>) {
        let (Some(object), Some(at)) = (self.selected_object, self.selected_vertex) else {
            return;
        };
        let position = ctx.cursor.position;
        let Some(layer) = geometry_layer(ctx.layers, self.layer) else {
            return;
        };
        let Some(geometry) = layer.get_mut(object) else {
            debug!("grabbed geometry was removed");
            self.selected_object = None;
            self.selected_vertex = None;
            return;
        };
        if !geometry.set_vertex(at, position) {
            return;
        }
        refresh(layer, object);
        ctx.outbox.render(RenderChange::Update(GeometryRef::new(self.layer, object)));
    }

    fn click(&mut self, ctx: &mut InteractionContext<'_>) {
        self.drag(ctx);
        if self.selected_vertex.is_some() {
            self.commit(ctx.id, ctx.layers, ctx.outbox, None);
            return;
        }

        self.release(ctx.id, ctx.layers);
        let Some((object, intersect)) = self.resolve_target(ctx) else {
            return;
        };
        let cursor = ctx.cursor;
        let object_ref = GeometryRef::new(self.layer, object);
        let Some(layer) = geometry_layer(ctx.layers, self.layer) else {
            return;
        };
        let Some(geometry) = layer.get_mut(object) else {
            return;
        };
        if !geometry.flags_mut().lock(ctx.id) {
            debug!("geometry is being modified by another interaction");
            return;
        }

        let mut vertex = geometry
            .nearest_vertex(&cursor.position)
            .filter(|&(_, distance)| distance <= self.options.click_range)
            .map(|(at, _)| at);
        let mut inserted = false;
        if vertex.is_none() && (intersect.is_some() || cursor.snapped_object == Some(object_ref)) {
            let point = intersect.unwrap_or(cursor.mouse_position);
            vertex = geometry
                .edge_insertion(&point)
                .and_then(|at| geometry.insert_vertex(at, point));
            inserted = vertex.is_some();
        }

        let edited = vertex.and_then(|at| {
            geometry
                .vertex(at)
                .map(|coordinates| EditedVertex { at, coordinates })
        });
        if vertex.is_none() {
            geometry.flags_mut().unlock(ctx.id);
        }
        if inserted {
            refresh(layer, object);
            ctx.outbox.render(RenderChange::Update(object_ref));
        }

        self.selected_object = Some(object);
        self.selected_vertex = vertex;
        debug!(?vertex, inserted, "modify started");
        ctx.outbox.emit(EditEvent::ModifyStart {
            interaction: ctx.id,
            object: object_ref,
            edited,
        });
    }

    /// Picks the geometry a click refers to: the fixed target, the cursor's
    /// snap target, or the nearest geometry under the pick ray. Also returns
    /// the point where the pick ray hits that geometry, if it does.
    fn resolve_target(&self, ctx: &InteractionContext<'_>) -> Option<(GeometryId, Option<Point3>)> {
        let layer = ctx.layers.get(self.layer)?.as_geometry()?;
        let threshold = self.options.click_range;
        let intersect = |id: GeometryId| {
            ctx.ray
                .and_then(|ray| layer.raycast(ray, threshold, |g, _| g == id))
                .map(|hit| hit.point)
        };

        if let Some(target) = self.options.target {
            return layer.contains(target).then(|| (target, intersect(target)));
        }

        if let Some(snapped) = ctx.cursor.snapped_object {
            if snapped.layer == self.layer && layer.contains(snapped.geometry) {
                return Some((snapped.geometry, intersect(snapped.geometry)));
            }
        }

        let hit = layer.raycast(ctx.ray?, threshold, |_, g: &Geometry| {
            g.flags().modified_by.is_none_or(|holder| holder == ctx.id)
        })?;
        Some((hit.geometry, Some(hit.point)))
    }

    /// Ends the edit: emits modify-end, releases the lock and clears the
    /// selection.
    fn commit(
        &mut self,
        id: InteractionId,
        layers: &mut SlotMap<LayerId, Layer>,
        outbox: &mut Outbox,
        removed: Option<EditedVertex>,
    ) {
        let Some(object) = self.selected_object.take() else {
            return;
        };
        let at = self.selected_vertex.take();
        let mut edited = removed;
        if let Some(geometry) = geometry_layer(layers, self.layer).and_then(|layer| layer.get_mut(object)) {
            geometry.flags_mut().unlock(id);
            if edited.is_none() {
                edited = at.and_then(|at| {
                    geometry
                        .vertex(at)
                        .map(|coordinates| EditedVertex { at, coordinates })
                });
            }
        }

        let object = GeometryRef::new(self.layer, object);
        info!(?edited, "modify committed");
        outbox.emit(EditEvent::ModifyEnd {
            interaction: id,
            object,
            edited,
        });
        outbox.layer(LayerEvent::ModifyEnd(object));
    }

    /// Drops the selection without emitting anything.
    fn release(&mut self, id: InteractionId, layers: &mut SlotMap<LayerId, Layer>) {
        if let Some(object) = self.selected_object.take() {
            if let Some(geometry) = geometry_layer(layers, self.layer).and_then(|layer| layer.get_mut(object)) {
                geometry.flags_mut().unlock(id);
            }
        }
        self.selected_vertex = None;
    }

    /// Deletes the grabbed vertex and ends the edit.
    ///
    /// Refused, keeping the selection, when the ring would drop below its
    /// minimum size (2 for a line, 3 for a polygon ring) or the geometry is
    /// a point. Returns `true` if the vertex was removed.
    pub fn remove_selected_vertex(
        &mut self,
        id: InteractionId,
        layers: &mut SlotMap<LayerId, Layer>,
        outbox: &mut Outbox,
    ) -> bool {
        let (Some(object), Some(at)) = (self.selected_object, self.selected_vertex) else {
            return false;
        };
        let Some(layer) = geometry_layer(layers, self.layer) else {
            return false;
        };
        let Some(geometry) = layer.get_mut(object) else {
            return false;
        };
        let Some(coordinates) = geometry.vertex(at) else {
            return false;
        };
        if !geometry.remove_vertex(at) {
            debug!(?at, kind = %geometry.kind(), "vertex removal refused");
            return false;
        }
        refresh(layer, object);
        outbox.render(RenderChange::Update(GeometryRef::new(self.layer, object)));
        self.commit(id, layers, outbox, Some(EditedVertex { at, coordinates }));
        true
    }
}

/// Rebuilds the renderable form of an edited geometry.
fn refresh(layer: &mut GeometryLayer, object: GeometryId) {
    let Some(geometry) = layer.get_mut(object) else {
        return;
    };
    if let Err(err) = geometry.update() {
        warn!(%err, "geometry not rebuilt after edit");
    }
    if geometry.kind() == GeometryKind::Point {
        layer.update_points();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{Line, Point, Polygon, Properties};
    use crate::interaction::test_support::Harness;
    use crate::interaction::Interaction;
    use crate::math::{Point2, Ray, Vector3};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn line(points: Vec<Point3>) -> Geometry {
        Line::new(points, Properties::new()).unwrap().into()
    }

    fn square(min: f64, max: f64) -> Vec<Point3> {
        vec![p(min, min), p(max, min), p(max, max), p(min, max)]
    }

    fn modify(h: &Harness) -> Interaction {
        Modify::new(h.layer, ModifyOptions::default()).into()
    }

    fn first(h: &Harness) -> GeometryId {
        h.geometry_layer().ids()[0]
    }

    fn snap_cursor(h: &mut Harness, position: Point3) {
        let object = GeometryRef::new(h.layer, first(h));
        h.cursor.position = position;
        h.cursor.mouse_position = position;
        h.cursor.snapped = true;
        h.cursor.snapped_object = Some(object);
    }

    fn move_to(h: &mut Harness, interaction: &mut Interaction, position: Point3) {
        h.cursor.position = position;
        h.cursor.moved_mouse = true;
        h.send(interaction, &PointerEvent::moved(Point2::origin()));
    }

    #[test]
    fn click_on_edge_inserts_vertex() {
        let mut h = Harness::new(vec![line(vec![p(0.0, 0.0), p(10.0, 0.0)])]);
        let mut modify = modify(&h);
        snap_cursor(&mut h, p(5.0, 0.0));
        h.click(&mut modify, Button::Primary);

        let id = first(&h);
        let geometry = h.geometry_layer().geometry(id).unwrap();
        assert_eq!(geometry.vectors(), &[p(0.0, 0.0), p(5.0, 0.0), p(10.0, 0.0)]);
        assert_eq!(modify.as_modify().unwrap().selected_vertex(), Some(VertexRef::outer(1)));
        assert_eq!(geometry.flags().modified_by, Some(h.id));

        let events = h.outbox.drain_events();
        assert_eq!(
            events,
            vec![EditEvent::ModifyStart {
                interaction: h.id,
                object: GeometryRef::new(h.layer, id),
                edited: Some(EditedVertex {
                    at: VertexRef::outer(1),
                    coordinates: p(5.0, 0.0)
                }),
            }]
        );
    }

    #[test]
    fn drag_then_commit() {
        let mut h = Harness::new(vec![line(vec![p(0.0, 0.0), p(10.0, 0.0)])]);
        let mut modify = modify(&h);
        snap_cursor(&mut h, p(10.2, 0.0));
        h.click(&mut modify, Button::Primary);
        assert_eq!(modify.as_modify().unwrap().selected_vertex(), Some(VertexRef::outer(1)));

        h.cursor.snapped = false;
        h.cursor.snapped_object = None;
        move_to(&mut h, &mut modify, p(12.0, 3.0));
        let id = first(&h);
        assert_eq!(h.geometry_layer().geometry(id).unwrap().vectors()[1], p(12.0, 3.0));

        h.outbox.drain_events();
        h.click(&mut modify, Button::Primary);
        let events = h.outbox.drain_events();
        assert!(matches!(
            events.as_slice(),
            [EditEvent::ModifyEnd { edited: Some(EditedVertex { coordinates, .. }), .. }] if *coordinates == p(12.0, 3.0)
        ));
        assert_eq!(h.outbox.take_layer_events(), vec![LayerEvent::ModifyEnd(GeometryRef::new(h.layer, id))]);
        assert!(!h.geometry_layer().geometry(id).unwrap().flags().is_being_modified());
        assert!(modify.as_modify().unwrap().selected_object().is_none());
    }

    #[test]
    fn dragging_a_point_refreshes_the_batch() {
        let mut h = Harness::new(vec![Point::new(p(1.0, 1.0), Properties::new()).into()]);
        let mut modify = modify(&h);
        snap_cursor(&mut h, p(1.0, 1.0));
        h.click(&mut modify, Button::Primary);
        move_to(&mut h, &mut modify, p(4.0, 4.0));
        assert_eq!(h.geometry_layer().point_batch().points().world_point(0), Some(p(4.0, 4.0)));
    }

    #[test]
    fn click_off_geometry_clears_selection() {
        let mut h = Harness::new(vec![line(vec![p(0.0, 0.0), p(10.0, 0.0)])]);
        let mut modify = modify(&h);
        h.cursor.position = p(50.0, 50.0);
        h.ray = Some(Ray::new(Point3::new(50.0, 50.0, 10.0), Vector3::new(0.0, 0.0, -1.0)).unwrap());
        h.click(&mut modify, Button::Primary);
        assert!(modify.as_modify().unwrap().selected_object().is_none());
        assert!(h.outbox.drain_events().is_empty());
    }

    #[test]
    fn hole_vertices_are_grabbed() {
        let polygon = Polygon::new(vec![square(0.0, 100.0), square(40.0, 60.0)], Properties::new()).unwrap();
        let mut h = Harness::new(vec![polygon.into()]);
        let mut modify = modify(&h);
        snap_cursor(&mut h, p(60.1, 40.0));
        h.click(&mut modify, Button::Primary);
        assert_eq!(modify.as_modify().unwrap().selected_vertex(), Some(VertexRef::hole(0, 1)));
    }

    #[test]
    fn ray_hit_selects_and_inserts_on_polygon_edge() {
        let polygon = Polygon::new(vec![square(0.0, 100.0)], Properties::new()).unwrap();
        let mut h = Harness::new(vec![polygon.into()]);
        let mut modify = modify(&h);
        h.cursor.position = p(50.0, 0.2);
        h.ray = Some(Ray::new(Point3::new(50.0, 0.2, 10.0), Vector3::new(0.0, 0.0, -1.0)).unwrap());
        h.click(&mut modify, Button::Primary);
        let id = first(&h);
        assert_eq!(h.geometry_layer().geometry(id).unwrap().vectors().len(), 5);
        assert_eq!(modify.as_modify().unwrap().selected_vertex(), Some(VertexRef::outer(1)));
    }

    #[test]
    fn vertex_removal_respects_minimum() {
        let mut h = Harness::new(vec![line(vec![p(0.0, 0.0), p(10.0, 0.0)])]);
        let mut modify = modify(&h);
        snap_cursor(&mut h, p(0.0, 0.0));
        h.click(&mut modify, Button::Primary);
        let id = h.id;
        let inner = modify.as_modify_mut().unwrap();
        assert!(!inner.remove_selected_vertex(id, &mut h.layers, &mut h.outbox));
        assert_eq!(inner.selected_vertex(), Some(VertexRef::outer(0)));
    }

    #[test]
    fn removing_a_vertex_ends_the_edit() {
        let mut h = Harness::new(vec![line(vec![p(0.0, 0.0), p(5.0, 0.0), p(10.0, 0.0)])]);
        let mut modify = modify(&h);
        snap_cursor(&mut h, p(5.0, 0.0));
        h.click(&mut modify, Button::Primary);
        h.outbox.drain_events();

        let id = h.id;
        let inner = modify.as_modify_mut().unwrap();
        assert!(inner.remove_selected_vertex(id, &mut h.layers, &mut h.outbox));
        assert!(inner.selected_vertex().is_none());
        let geometry = h.geometry_layer().geometry(first(&h)).unwrap();
        assert_eq!(geometry.vectors(), &[p(0.0, 0.0), p(10.0, 0.0)]);
        assert!(!geometry.flags().is_being_modified());
        let events = h.outbox.drain_events();
        assert!(matches!(
            events.as_slice(),
            [EditEvent::ModifyEnd { edited: Some(EditedVertex { at, .. }), .. }] if *at == VertexRef::outer(1)
        ));
    }

    #[test]
    fn locked_geometry_is_not_taken_over() {
        let mut h = Harness::new(vec![line(vec![p(0.0, 0.0), p(10.0, 0.0)])]);
        let mut ids: SlotMap<InteractionId, ()> = SlotMap::with_key();
        ids.insert(());
        let other = ids.insert(());
        let id = first(&h);
        let layer = h.layer;
        h.layers[layer]
            .as_geometry_mut()
            .unwrap()
            .get_mut(id)
            .unwrap()
            .flags_mut()
            .lock(other);

        let mut modify = modify(&h);
        snap_cursor(&mut h, p(0.0, 0.0));
        h.click(&mut modify, Button::Primary);
        assert!(modify.as_modify().unwrap().selected_object().is_none());
        assert!(h.outbox.drain_events().is_empty());
    }

    #[test]
    fn deactivation_releases_the_lock() {
        let mut h = Harness::new(vec![line(vec![p(0.0, 0.0), p(10.0, 0.0)])]);
        let mut modify = modify(&h);
        snap_cursor(&mut h, p(0.0, 0.0));
        h.click(&mut modify, Button::Primary);
        modify.set_active(false, h.id, &mut h.layers, &mut h.outbox);
        assert!(!h.geometry_layer().geometry(first(&h)).unwrap().flags().is_being_modified());
        assert!(modify.as_modify().unwrap().selected_vertex().is_none());
    }
}
