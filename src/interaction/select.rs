use slotmap::SlotMap;
use tracing::debug;

use crate::config::SelectConfig;
use crate::event::{EditEvent, Outbox, RenderChange};
use crate::layer::{decode_pick_color, GeometryId, GeometryRef, Layer, LayerId};
use crate::math::Point3;

use super::{Button, InteractionContext, PointerEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOptions {
    pub button: Button,
    /// Whether the selected geometry is highlighted in its layer.
    pub highlight: bool,
    /// Pick distance for points and lines.
    pub pick_threshold: f64,
}

impl From<&SelectConfig> for SelectOptions {
    fn from(config: &SelectConfig) -> Self {
        Self {
            button: config.button,
            highlight: config.highlight,
            pick_threshold: config.pick_threshold,
        }
    }
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self::from(&SelectConfig::default())
    }
}

/// Picks one geometry of a layer per click.
#[derive(Debug, Clone)]
pub struct Select {
    layer: LayerId,
    options: SelectOptions,
    active: bool,
    selected: Option<GeometryId>,
}

impl Select {
    #[must_use]
    pub fn new(layer: LayerId, options: SelectOptions) -> Self {
        Self {
            layer,
            options,
            active: true,
            selected: None,
        }
    }

    #[must_use]
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn selected(&self) -> Option<GeometryId> {
        self.selected
    }

    pub(super) fn set_active(&mut self, active: bool, layers: &mut SlotMap<LayerId, Layer>, outbox: &mut Outbox) {
        self.active = active;
        if !active {
            self.clear(layers, outbox);
        }
    }

    pub(super) fn handle_pointer(&mut self, event: &PointerEvent, ctx: &mut InteractionContext<'_>) {
        if !ctx.is_click(event, self.options.button) {
            return;
        }
        self.clear(ctx.layers, ctx.outbox);

        let Some((geometry, click_position)) = self.pick(ctx) else {
            debug!("nothing selected");
            return;
        };
        let object = GeometryRef::new(self.layer, geometry);
        if self.options.highlight {
            if let Some(layer) = ctx.layers.get_mut(self.layer).and_then(Layer::as_geometry_mut) {
                layer.highlight(geometry);
                ctx.outbox.render(RenderChange::Update(object));
            }
        }
        self.selected = Some(geometry);
        debug!(?click_position, "geometry selected");
        ctx.outbox.emit(EditEvent::Selected {
            interaction: ctx.id,
            geometry: object,
            click_position,
        });
    }

    /// Resolves the clicked geometry, trying in order: the pick ray against
    /// the layer, the cursor's snap target, and the color-pick pass over the
    /// layer's point batch.
    fn pick(&self, ctx: &InteractionContext<'_>) -> Option<(GeometryId, Point3)> {
        let layer = ctx.layers.get(self.layer)?.as_geometry()?;

        if let Some(hit) = ctx
            .ray
            .and_then(|ray| layer.raycast(ray, self.options.pick_threshold, |_, _| true))
        {
            return Some((hit.geometry, hit.point));
        }

        if let Some(snapped) = ctx.cursor.snapped_object {
            if snapped.layer == self.layer && layer.contains(snapped.geometry) {
                return Some((snapped.geometry, ctx.cursor.position));
            }
        }

        let pick_id = decode_pick_color(ctx.picker.pick_color(&ctx.ndc)?);
        let geometry = layer.point_batch().geometry_for_pick(pick_id)?;
        let position = layer.get(geometry)?.vectors().first().copied()?;
        Some((geometry, position))
    }

    fn clear(&mut self, layers: &mut SlotMap<LayerId, Layer>, outbox: &mut Outbox) {
        let Some(geometry) = self.selected.take() else {
            return;
        };
        if let Some(layer) = layers.get_mut(self.layer).and_then(Layer::as_geometry_mut) {
            if layer.remove_highlight(geometry) {
                outbox.render(RenderChange::Update(GeometryRef::new(self.layer, geometry)));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, Point, Polygon, Properties};
    use crate::interaction::test_support::Harness;
    use crate::interaction::Interaction;
    use crate::layer::{encode_pick_color, PointBatch};
    use crate::math::{Ray, Vector3};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn point(x: f64, y: f64) -> Geometry {
        Point::new(p(x, y), Properties::new()).into()
    }

    fn select(h: &Harness) -> Interaction {
        Select::new(h.layer, SelectOptions::default()).into()
    }

    fn selected_events(h: &mut Harness) -> Vec<(GeometryId, Point3)> {
        h.outbox
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                EditEvent::Selected {
                    geometry,
                    click_position,
                    ..
                } => Some((geometry.geometry, click_position)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn ray_pick_selects_and_highlights() {
        let polygon = Polygon::new(vec![vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0)]], Properties::new()).unwrap();
        let mut h = Harness::new(vec![polygon.into()]);
        let mut select = select(&h);
        h.ray = Some(Ray::new(Point3::new(3.0, 1.0, 5.0), Vector3::new(0.0, 0.0, -1.0)).unwrap());
        h.click(&mut select, Button::Primary);

        let id = h.geometry_layer().ids()[0];
        let events = selected_events(&mut h);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, id);
        assert!((events[0].1 - p(3.0, 1.0)).norm() < 1e-9);
        assert!(h.geometry_layer().geometry(id).unwrap().flags().highlighted);
    }

    #[test]
    fn snapped_object_is_the_fallback() {
        let mut h = Harness::new(vec![point(1.0, 1.0)]);
        let mut select = select(&h);
        let id = h.geometry_layer().ids()[0];
        h.cursor.snapped_object = Some(GeometryRef::new(h.layer, id));
        h.cursor.position = p(1.0, 1.0);
        h.click(&mut select, Button::Primary);
        assert_eq!(selected_events(&mut h), vec![(id, p(1.0, 1.0))]);
    }

    #[test]
    fn color_pick_resolves_batched_points() {
        let mut h = Harness::new(vec![point(1.0, 1.0), point(7.0, 2.0)]);
        let mut select = select(&h);
        let second = h.geometry_layer().ids()[1];
        h.pick = Some(encode_pick_color(PointBatch::pick_id(1)));
        h.click(&mut select, Button::Primary);
        assert_eq!(selected_events(&mut h), vec![(second, p(7.0, 2.0))]);
    }

    #[test]
    fn empty_click_clears_selection() {
        let mut h = Harness::new(vec![point(1.0, 1.0)]);
        let mut select = select(&h);
        let id = h.geometry_layer().ids()[0];
        h.cursor.snapped_object = Some(GeometryRef::new(h.layer, id));
        h.click(&mut select, Button::Primary);
        assert!(h.geometry_layer().geometry(id).unwrap().flags().highlighted);

        h.cursor.snapped_object = None;
        h.click(&mut select, Button::Primary);
        assert!(select.as_select().unwrap().selected().is_none());
        assert!(!h.geometry_layer().geometry(id).unwrap().flags().highlighted);
    }

    #[test]
    fn deactivation_drops_highlight() {
        let mut h = Harness::new(vec![point(1.0, 1.0)]);
        let mut select = select(&h);
        let id = h.geometry_layer().ids()[0];
        h.cursor.snapped_object = Some(GeometryRef::new(h.layer, id));
        h.click(&mut select, Button::Primary);
        select.set_active(false, h.id, &mut h.layers, &mut h.outbox);
        assert!(!h.geometry_layer().geometry(id).unwrap().flags().highlighted);
        assert!(select.as_select().unwrap().selected().is_none());
    }

    #[test]
    fn other_buttons_are_ignored() {
        let mut h = Harness::new(vec![point(1.0, 1.0)]);
        let mut select = select(&h);
        let id = h.geometry_layer().ids()[0];
        h.cursor.snapped_object = Some(GeometryRef::new(h.layer, id));
        h.click(&mut select, Button::Secondary);
        assert!(selected_events(&mut h).is_empty());
    }
}
