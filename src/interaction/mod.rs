//! Editing state machines driven by pointer input.
//!
//! Interactions never resolve the cursor themselves: the session updates
//! the [`CursorState`] first and hands it to every active interaction in
//! registration order.

mod draw;
mod draw_buffer;
mod modify;
mod select;

pub use draw::{Draw, DrawBuilder};
pub use draw_buffer::DrawBuffer;
pub use modify::{Modify, ModifyOptions};
pub use select::{Select, SelectOptions};

use serde::Deserialize;
use slotmap::SlotMap;

use crate::camera::pixel_to_ndc;
use crate::cursor::CursorState;
use crate::event::Outbox;
use crate::layer::{GeometryLayer, Layer, LayerId};
use crate::math::{Point2, Ray};
use crate::picker::ScenePicker;

slotmap::new_key_type! {
    /// Unique identifier for an interaction in an editing session.
    pub struct InteractionId;
}

/// Mouse button of a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    #[default]
    Primary,
    Auxiliary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Move,
    Down,
    Up,
}

/// A pointer event in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub button: Button,
    pub ndc: Point2,
}

impl PointerEvent {
    #[must_use]
    pub fn new(kind: PointerKind, button: Button, ndc: Point2) -> Self {
        Self { kind, button, ndc }
    }

    /// A pointer event at pixel `(x, y)` of a `width` x `height` viewport.
    #[must_use]
    pub fn from_pixels(kind: PointerKind, button: Button, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(kind, button, pixel_to_ndc(x, y, width, height))
    }

    #[must_use]
    pub fn moved(ndc: Point2) -> Self {
        Self::new(PointerKind::Move, Button::Primary, ndc)
    }

    #[must_use]
    pub fn down(button: Button, ndc: Point2) -> Self {
        Self::new(PointerKind::Down, button, ndc)
    }

    #[must_use]
    pub fn up(button: Button, ndc: Point2) -> Self {
        Self::new(PointerKind::Up, button, ndc)
    }

    /// Returns `true` for a release of `button`.
    #[must_use]
    pub fn is_release_of(&self, button: Button) -> bool {
        self.kind == PointerKind::Up && self.button == button
    }
}

/// Session state lent to an interaction for one pointer event.
pub struct InteractionContext<'a> {
    pub id: InteractionId,
    pub layers: &'a mut SlotMap<LayerId, Layer>,
    pub cursor: &'a CursorState,
    /// Pick ray through the pointer, when a camera is set.
    pub ray: Option<&'a Ray>,
    pub picker: &'a dyn ScenePicker,
    pub outbox: &'a mut Outbox,
    pub ndc: Point2,
}

impl InteractionContext<'_> {
    fn geometry_layer_mut(&mut self, layer: LayerId) -> Option<&mut GeometryLayer> {
        self.layers.get_mut(layer).and_then(Layer::as_geometry_mut)
    }

    /// Returns `true` for a pointer-up that was not preceded by a drag.
    fn is_click(&self, event: &PointerEvent, button: Button) -> bool {
        event.is_release_of(button) && !self.cursor.moved_mouse
    }
}

/// An interaction attached to one geometry layer.
#[derive(Debug, Clone)]
pub enum Interaction {
    Draw(Draw),
    Modify(Modify),
    Select(Select),
}

impl Interaction {
    /// The layer the interaction edits.
    #[must_use]
    pub fn layer(&self) -> LayerId {
        match self {
            Self::Draw(i) => i.layer(),
            Self::Modify(i) => i.layer(),
            Self::Select(i) => i.layer(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        match self {
            Self::Draw(i) => i.is_active(),
            Self::Modify(i) => i.is_active(),
            Self::Select(i) => i.is_active(),
        }
    }

    /// Feeds a pointer event to the interaction. Inactive interactions and
    /// interactions whose layer is not a geometry layer ignore input.
    pub fn handle_pointer(&mut self, event: &PointerEvent, ctx: &mut InteractionContext<'_>) {
        if !self.is_active() || ctx.geometry_layer_mut(self.layer()).is_none() {
            return;
        }
        match self {
            Self::Draw(i) => i.handle_pointer(event, ctx),
            Self::Modify(i) => i.handle_pointer(event, ctx),
            Self::Select(i) => i.handle_pointer(event, ctx),
        }
    }

    /// Activates or deactivates the interaction. Deactivation discards any
    /// uncommitted state without emitting events.
    pub fn set_active(&mut self, active: bool, id: InteractionId, layers: &mut SlotMap<LayerId, Layer>, outbox: &mut Outbox) {
        match self {
            Self::Draw(i) => i.set_active(active),
            Self::Modify(i) => i.set_active(active, id, layers),
            Self::Select(i) => i.set_active(active, layers, outbox),
        }
    }

    #[must_use]
    pub fn as_draw(&self) -> Option<&Draw> {
        match self {
            Self::Draw(i) => Some(i),
            Self::Modify(_) | Self::Select(_) => None,
        }
    }

    pub fn as_draw_mut(&mut self) -> Option<&mut Draw> {
        match self {
            Self::Draw(i) => Some(i),
            Self::Modify(_) | Self::Select(_) => None,
        }
    }

    #[must_use]
    pub fn as_modify(&self) -> Option<&Modify> {
        match self {
            Self::Modify(i) => Some(i),
            Self::Draw(_) | Self::Select(_) => None,
        }
    }

    pub fn as_modify_mut(&mut self) -> Option<&mut Modify> {
        match self {
            Self::Modify(i) => Some(i),
            Self::Draw(_) | Self::Select(_) => None,
        }
    }

    #[must_use]
    pub fn as_select(&self) -> Option<&Select> {
        match self {
            Self::Select(i) => Some(i),
            Self::Draw(_) | Self::Modify(_) => None,
        }
    }
}

impl From<Draw> for Interaction {
    fn from(value: Draw) -> Self {
        Self::Draw(value)
    }
}

impl From<Modify> for Interaction {
    fn from(value: Modify) -> Self {
        Self::Modify(value)
    }
}

impl From<Select> for Interaction {
    fn from(value: Select) -> Self {
        Self::Select(value)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_matching() {
        let up = PointerEvent::up(Button::Secondary, Point2::origin());
        assert!(up.is_release_of(Button::Secondary));
        assert!(!up.is_release_of(Button::Primary));
        assert!(!PointerEvent::moved(Point2::origin()).is_release_of(Button::Primary));
    }

    #[test]
    fn pixel_events_use_ndc() {
        let event = PointerEvent::from_pixels(PointerKind::Down, Button::Primary, 400.0, 300.0, 800.0, 600.0);
        assert_eq!(event.ndc, Point2::new(0.0, 0.0));
    }
}
