//! The editing session: owner of layers, snap indices, interactions and the
//! cursor for one view.
//!
//! Every pointer event is resolved by the cursor first, then handed to the
//! active interactions in registration order. Layer changes made while
//! handling the event are applied to the snap indices before the call
//! returns.

use slotmap::SlotMap;
use tracing::{debug, info, warn};

use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::cursor::{CursorEngine, CursorState, SnapContext};
use crate::error::{GeometryError, InteractionError, LayerError, Result};
use crate::event::{EditEvent, LayerEvent, Outbox, RenderChange};
use crate::geometry::{Geometry, GeometryKind, Polygon};
use crate::interaction::{
    Draw, Interaction, InteractionContext, InteractionId, Modify, ModifyOptions, PointerEvent, PointerKind, Select,
    SelectOptions,
};
use crate::layer::{GeometryId, GeometryLayer, GeometryRef, Layer, LayerId};
use crate::math::{Aabb, Point3};
use crate::picker::{EmptyScene, ScenePicker};
use crate::snap::{SnapId, SnapIndex};

pub struct EditSession {
    config: EditorConfig,
    layers: SlotMap<LayerId, Layer>,
    snaps: SlotMap<SnapId, SnapIndex>,
    interactions: SlotMap<InteractionId, Interaction>,
    order: Vec<InteractionId>,
    cursor: CursorEngine,
    camera: Option<Camera>,
    picker: Box<dyn ScenePicker>,
    outbox: Outbox,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditSession {
    /// Creates a session over an empty external scene.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self::with_picker(config, EmptyScene)
    }

    /// Creates a session whose surface and height queries go to `picker`.
    #[must_use]
    pub fn with_picker(config: EditorConfig, picker: impl ScenePicker + 'static) -> Self {
        Self {
            cursor: CursorEngine::new(&config.cursor),
            config,
            layers: SlotMap::with_key(),
            snaps: SlotMap::with_key(),
            interactions: SlotMap::with_key(),
            order: Vec::new(),
            camera: None,
            picker: Box::new(picker),
            outbox: Outbox::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_camera(&mut self, camera: Option<Camera>) {
        self.camera = camera;
    }

    #[must_use]
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    #[must_use]
    pub fn cursor(&self) -> &CursorState {
        self.cursor.state()
    }

    // Layers

    /// Adds a layer. Every geometry it already holds is attached for
    /// rendering.
    pub fn add_layer(&mut self, layer: impl Into<Layer>) -> LayerId {
        let layer = layer.into();
        let ids: Vec<GeometryId> = layer.as_geometry().map(|l| l.ids().to_vec()).unwrap_or_default();
        let name = layer.name().to_string();
        let kind = layer.kind();
        let layer_id = self.layers.insert(layer);
        for geometry in ids {
            self.outbox
                .render(RenderChange::Attach(GeometryRef::new(layer_id, geometry)));
        }
        info!(%name, %kind, "layer added");
        layer_id
    }

    /// Removes a layer and detaches its geometries. Snap indices watching
    /// it are rebuilt.
    pub fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        let layer = self.layers.remove(id)?;
        if let Some(geometries) = layer.as_geometry() {
            for &geometry in geometries.ids() {
                self.outbox.render(RenderChange::Detach(GeometryRef::new(id, geometry)));
            }
        }
        for index in self.snaps.values_mut() {
            if index.sources().contains(&id) {
                index.rebuild(&self.layers);
            }
        }
        Some(layer)
    }

    /// # Errors
    ///
    /// Returns [`LayerError::LayerNotFound`] for unknown IDs.
    pub fn layer(&self, id: LayerId) -> Result<&Layer> {
        Ok(self.layers.get(id).ok_or(LayerError::LayerNotFound)?)
    }

    /// # Errors
    ///
    /// Returns [`LayerError::LayerNotFound`] for unknown IDs and
    /// [`LayerError::NotAGeometryLayer`] for external layers.
    pub fn geometry_layer(&self, id: LayerId) -> Result<&GeometryLayer> {
        let layer = self.layer(id)?;
        Ok(layer.as_geometry().ok_or_else(|| LayerError::NotAGeometryLayer {
            name: layer.name().to_string(),
            kind: layer.kind().name(),
        })?)
    }

    fn geometry_layer_mut(&mut self, id: LayerId) -> Result<&mut GeometryLayer> {
        let layer = self.layers.get_mut(id).ok_or(LayerError::LayerNotFound)?;
        Ok(layer.geometry_layer_mut()?)
    }

    /// # Errors
    ///
    /// Returns [`LayerError::LayerNotFound`] for unknown IDs.
    pub fn show_layer(&mut self, id: LayerId) -> Result<()> {
        self.layers.get_mut(id).ok_or(LayerError::LayerNotFound)?.show();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`LayerError::LayerNotFound`] for unknown IDs.
    pub fn hide_layer(&mut self, id: LayerId) -> Result<()> {
        self.layers.get_mut(id).ok_or(LayerError::LayerNotFound)?.hide();
        Ok(())
    }

    /// Bounding box of a layer's content, if it has any.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::LayerNotFound`] for unknown IDs.
    pub fn bbox(&self, id: LayerId) -> Result<Option<Aabb>> {
        Ok(self.layer(id)?.bbox())
    }

    // Geometries

    /// # Errors
    ///
    /// Returns a [`LayerError`] if the layer or the geometry does not exist.
    pub fn geometry(&self, object: GeometryRef) -> Result<&Geometry> {
        Ok(self.geometry_layer(object.layer)?.geometry(object.geometry)?)
    }

    /// Adds a geometry to a geometry layer.
    ///
    /// # Errors
    ///
    /// Returns a [`LayerError`] if `layer` does not exist or is not a
    /// geometry layer.
    pub fn add_geometry(&mut self, layer: LayerId, geometry: Geometry) -> Result<GeometryId> {
        let id = self.geometry_layer_mut(layer)?.add(geometry);
        let object = GeometryRef::new(layer, id);
        self.outbox.render(RenderChange::Attach(object));
        self.outbox.layer(LayerEvent::Added(object));
        self.flush_layer_events();
        Ok(id)
    }

    /// Removes a geometry from its layer.
    ///
    /// # Errors
    ///
    /// Returns a [`LayerError`] if the layer or the geometry does not exist.
    pub fn remove_geometry(&mut self, object: GeometryRef) -> Result<Geometry> {
        let geometry = self
            .geometry_layer_mut(object.layer)?
            .remove(object.geometry)
            .ok_or(LayerError::GeometryNotFound)?;
        self.outbox.render(RenderChange::Detach(object));
        self.outbox.layer(LayerEvent::Removed(object));
        self.flush_layer_events();
        Ok(geometry)
    }

    fn polygon_mut(&mut self, object: GeometryRef) -> Result<&mut Polygon> {
        match self.geometry_layer_mut(object.layer)?.geometry_mut(object.geometry)? {
            Geometry::Polygon(polygon) => Ok(polygon),
            other => Err(GeometryError::Degenerate(format!("{} is not a polygon", other.kind())).into()),
        }
    }

    /// Cuts `cutter` out of the polygon `target` as a new hole.
    ///
    /// Returns `false`, leaving the polygon untouched, when the cutter is
    /// not fully inside the filled area of the target.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` does not exist or is not a polygon, or if
    /// the carved polygon cannot be triangulated.
    pub fn carve_hole(&mut self, target: GeometryRef, cutter: &Polygon) -> Result<bool> {
        let carved = self.polygon_mut(target)?.carve_hole(cutter)?;
        if carved {
            self.polygon_edited(target);
        }
        Ok(carved)
    }

    /// Removes the holes of polygon `target` that contain `position`.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` does not exist or is not a polygon, or if
    /// the polygon cannot be triangulated.
    pub fn fill_hole(&mut self, target: GeometryRef, position: &Point3) -> Result<bool> {
        let filled = self.polygon_mut(target)?.fill_hole(position)?;
        if filled {
            self.polygon_edited(target);
        }
        Ok(filled)
    }

    fn polygon_edited(&mut self, target: GeometryRef) {
        self.outbox.render(RenderChange::Update(target));
        self.outbox.layer(LayerEvent::ModifyEnd(target));
        self.flush_layer_events();
    }

    // Snapping

    /// Registers a snap index and builds its candidates. Indices are
    /// consulted in registration order for point snapping.
    pub fn add_snap_index(&mut self, mut index: SnapIndex) -> SnapId {
        index.rebuild(&self.layers);
        self.snaps.insert(index)
    }

    #[must_use]
    pub fn snap_index(&self, id: SnapId) -> Option<&SnapIndex> {
        self.snaps.get(id)
    }

    pub fn remove_snap_index(&mut self, id: SnapId) -> Option<SnapIndex> {
        self.snaps.remove(id)
    }

    /// Activates or deactivates a snap index. Returns `false` for unknown
    /// IDs.
    pub fn set_snap_active(&mut self, id: SnapId, active: bool) -> bool {
        match self.snaps.get_mut(id) {
            Some(index) => {
                index.set_active(active, &self.layers);
                true
            }
            None => false,
        }
    }

    // Interactions

    /// Registers an interaction.
    ///
    /// An interaction attached to a point cloud or model layer is accepted
    /// with a warning and never reacts to input.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::LayerNotFound`] if the interaction's layer does
    /// not exist.
    pub fn add_interaction(&mut self, interaction: impl Into<Interaction>) -> Result<InteractionId> {
        let interaction = interaction.into();
        let layer = self.layer(interaction.layer())?;
        if layer.as_geometry().is_none() {
            warn!(
                layer = %layer.name(),
                kind = %layer.kind(),
                "interactions only work on geometry layers, this one stays inert"
            );
        }
        let id = self.interactions.insert(interaction);
        self.order.push(id);
        Ok(id)
    }

    /// Adds a Draw interaction using the configured vertex cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer does not exist or the configured cap is
    /// zero.
    pub fn add_draw(&mut self, layer: LayerId, kind: GeometryKind) -> Result<InteractionId> {
        let draw = Draw::builder(layer)
            .kind(kind)
            .max_vertices(self.config.draw.max_vertices)
            .build()?;
        self.add_interaction(draw)
    }

    /// Adds a Modify interaction using the configured options.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer does not exist.
    pub fn add_modify(&mut self, layer: LayerId) -> Result<InteractionId> {
        let options = ModifyOptions::from(&self.config.modify);
        self.add_interaction(Modify::new(layer, options))
    }

    /// Adds a Select interaction using the configured options.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer does not exist.
    pub fn add_select(&mut self, layer: LayerId) -> Result<InteractionId> {
        let options = SelectOptions::from(&self.config.select);
        self.add_interaction(Select::new(layer, options))
    }

    #[must_use]
    pub fn interaction(&self, id: InteractionId) -> Option<&Interaction> {
        self.interactions.get(id)
    }

    /// Deactivates and removes an interaction.
    pub fn remove_interaction(&mut self, id: InteractionId) -> Option<Interaction> {
        let mut interaction = self.interactions.remove(id)?;
        interaction.set_active(false, id, &mut self.layers, &mut self.outbox);
        self.order.retain(|&i| i != id);
        Some(interaction)
    }

    /// # Errors
    ///
    /// Returns [`InteractionError::NotFound`] for unknown IDs.
    pub fn set_interaction_active(&mut self, id: InteractionId, active: bool) -> Result<()> {
        let interaction = self.interactions.get_mut(id).ok_or(InteractionError::NotFound)?;
        interaction.set_active(active, id, &mut self.layers, &mut self.outbox);
        debug!(active, "interaction toggled");
        Ok(())
    }

    /// Undoes a vertex of an in-progress drawing.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NotFound`] if `id` is not a Draw
    /// interaction.
    pub fn draw_undo(&mut self, id: InteractionId, index: Option<usize>) -> Result<Option<Point3>> {
        let draw = self
            .interactions
            .get_mut(id)
            .and_then(Interaction::as_draw_mut)
            .ok_or(InteractionError::NotFound)?;
        Ok(draw.undo(index))
    }

    /// Deletes the vertex grabbed by a Modify interaction.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NotFound`] if `id` is not a Modify
    /// interaction.
    pub fn remove_selected_vertex(&mut self, id: InteractionId) -> Result<bool> {
        let modify = self
            .interactions
            .get_mut(id)
            .and_then(Interaction::as_modify_mut)
            .ok_or(InteractionError::NotFound)?;
        let removed = modify.remove_selected_vertex(id, &mut self.layers, &mut self.outbox);
        self.flush_layer_events();
        Ok(removed)
    }

    // Input

    /// Processes one pointer event.
    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        let snap_ctx = SnapContext {
            layers: &self.layers,
            snaps: &self.snaps,
            picker: self.picker.as_ref(),
        };
        match event.kind {
            PointerKind::Move => self.cursor.pointer_moved(self.camera.as_ref(), &event.ndc, &snap_ctx),
            PointerKind::Down => self.cursor.pointer_down(self.camera.as_ref(), &event.ndc, &snap_ctx),
            PointerKind::Up => {}
        }

        let ray = self.camera.as_ref().and_then(|camera| match camera.ray(&event.ndc) {
            Ok(ray) => Some(ray),
            Err(err) => {
                debug!(%err, "no pick ray for interactions");
                None
            }
        });

        for &id in &self.order {
            let Some(interaction) = self.interactions.get_mut(id) else {
                continue;
            };
            let mut ctx = InteractionContext {
                id,
                layers: &mut self.layers,
                cursor: self.cursor.state(),
                ray: ray.as_ref(),
                picker: self.picker.as_ref(),
                outbox: &mut self.outbox,
                ndc: event.ndc,
            };
            interaction.handle_pointer(event, &mut ctx);
        }

        self.flush_layer_events();
    }

    /// Rebuilds the snap indices watching the layers that changed and
    /// forwards the layer events.
    fn flush_layer_events(&mut self) {
        for event in self.outbox.take_layer_events() {
            for index in self.snaps.values_mut() {
                if index.handles_event(&event) {
                    index.rebuild(&self.layers);
                }
            }
            self.outbox.emit(EditEvent::Layer(event));
        }
    }

    /// Takes the domain events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<EditEvent> {
        self.outbox.drain_events()
    }

    /// Takes the renderable changes recorded since the last call.
    pub fn drain_render_changes(&mut self) -> Vec<RenderChange> {
        self.outbox.drain_render()
    }
}
