//! Events emitted by interactions and layers, and the render changes an
//! external renderer mirrors.

use crate::geometry::VertexRef;
use crate::interaction::InteractionId;
use crate::layer::{GeometryId, GeometryRef, LayerId};
use crate::math::Point3;

/// The vertex an edit applies to, with its coordinates at event time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditedVertex {
    pub at: VertexRef,
    pub coordinates: Point3,
}

/// Changes to the contents of a geometry layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerEvent {
    Added(GeometryRef),
    Removed(GeometryRef),
    ModifyEnd(GeometryRef),
}

impl LayerEvent {
    /// The geometry the event refers to.
    #[must_use]
    pub fn geometry(&self) -> GeometryRef {
        match *self {
            Self::Added(g) | Self::Removed(g) | Self::ModifyEnd(g) => g,
        }
    }

    /// The layer the event originated from.
    #[must_use]
    pub fn layer(&self) -> LayerId {
        self.geometry().layer
    }
}

/// Domain events for application code.
#[derive(Debug, Clone, PartialEq)]
pub enum EditEvent {
    /// A vertex was appended to an in-progress drawing.
    VertexAdded {
        interaction: InteractionId,
        vertex: Point3,
        index: usize,
    },
    /// A drawing was committed into the target layer.
    DrawEnd {
        interaction: InteractionId,
        layer: LayerId,
        geometries: Vec<GeometryId>,
    },
    ModifyStart {
        interaction: InteractionId,
        object: GeometryRef,
        edited: Option<EditedVertex>,
    },
    ModifyEnd {
        interaction: InteractionId,
        object: GeometryRef,
        edited: Option<EditedVertex>,
    },
    Selected {
        interaction: InteractionId,
        geometry: GeometryRef,
        click_position: Point3,
    },
    Layer(LayerEvent),
}

/// A change to the renderable representation of a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderChange {
    Attach(GeometryRef),
    Update(GeometryRef),
    Detach(GeometryRef),
}

/// Queues filled while handling one input event.
#[derive(Debug, Default)]
pub struct Outbox {
    events: Vec<EditEvent>,
    layer_events: Vec<LayerEvent>,
    render: Vec<RenderChange>,
}

impl Outbox {
    pub fn emit(&mut self, event: EditEvent) {
        self.events.push(event);
    }

    pub fn layer(&mut self, event: LayerEvent) {
        self.layer_events.push(event);
    }

    pub fn render(&mut self, change: RenderChange) {
        self.render.push(change);
    }

    /// Takes the pending layer events.
    pub fn take_layer_events(&mut self) -> Vec<LayerEvent> {
        std::mem::take(&mut self.layer_events)
    }

    pub fn drain_events(&mut self) -> Vec<EditEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_render(&mut self) -> Vec<RenderChange> {
        std::mem::take(&mut self.render)
    }
}
