use tracing::{debug, info, warn};

use crate::error::{InteractionError, Result};
use crate::event::{EditEvent, LayerEvent, RenderChange};
use crate::geometry::{Geometry, GeometryKind, Line, Point, Polygon, Properties};
use crate::layer::{GeometryRef, LayerId};
use crate::math::Point3;

use super::{Button, DrawBuffer, InteractionContext, PointerEvent};

/// Builder for [`Draw`]; the shape kind is required.
#[derive(Debug, Clone)]
pub struct DrawBuilder {
    layer: LayerId,
    kind: Option<GeometryKind>,
    max_vertices: Option<usize>,
}

impl DrawBuilder {
    #[must_use]
    pub fn kind(mut self, kind: GeometryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Caps the number of vertices a single drawing may hold.
    #[must_use]
    pub fn max_vertices(mut self, max: Option<usize>) -> Self {
        self.max_vertices = max;
        self
    }

    /// Builds the interaction, active.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::MissingShapeKind`] if no kind was given
    /// and [`InteractionError::InvalidVertexCap`] for a cap of zero.
    pub fn build(self) -> Result<Draw> {
        let kind = self.kind.ok_or(InteractionError::MissingShapeKind)?;
        if self.max_vertices == Some(0) {
            return Err(InteractionError::InvalidVertexCap.into());
        }
        Ok(Draw {
            layer: self.layer,
            kind,
            max_vertices: self.max_vertices,
            active: true,
            buffer: DrawBuffer::new(kind),
        })
    }
}

/// Places new geometries of one kind into a geometry layer.
///
/// A primary click appends the cursor position; a secondary click commits
/// the buffered vertices.
#[derive(Debug, Clone)]
pub struct Draw {
    layer: LayerId,
    kind: GeometryKind,
    max_vertices: Option<usize>,
    active: bool,
    buffer: DrawBuffer,
}

impl Draw {
    #[must_use]
    pub fn builder(layer: LayerId) -> DrawBuilder {
        DrawBuilder {
            layer,
            kind: None,
            max_vertices: None,
        }
    }

    #[must_use]
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    #[must_use]
    pub fn max_vertices(&self) -> Option<usize> {
        self.max_vertices
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The in-progress drawing.
    #[must_use]
    pub fn buffer(&self) -> &DrawBuffer {
        &self.buffer
    }

    pub(super) fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.buffer.clear();
        }
    }

    /// Drops the vertex at `index` (the last one when `None`) from the
    /// in-progress drawing.
    pub fn undo(&mut self, index: Option<usize>) -> Option<Point3> {
        let removed = self.buffer.remove(index);
        if let Some(vertex) = removed {
            debug!(?vertex, remaining = self.buffer.len(), "draw vertex undone");
        }
        removed
    }

    pub(super) fn handle_pointer(&mut self, event: &PointerEvent, ctx: &mut InteractionContext<'_>) {
        if ctx.is_click(event, Button::Primary) {
            self.add_vertex(ctx);
        } else if ctx.is_click(event, Button::Secondary) {
            self.finish(ctx);
        }
    }

    fn add_vertex(&mut self, ctx: &mut InteractionContext<'_>) {
        if self.max_vertices.is_some_and(|max| self.buffer.len() >= max) {
            debug!(max = ?self.max_vertices, "vertex cap reached");
            return;
        }
        let vertex = ctx.cursor.position;
        let index = self.buffer.push(vertex);
        ctx.outbox.emit(EditEvent::VertexAdded {
            interaction: ctx.id,
            vertex,
            index,
        });
    }

    fn finish(&mut self, ctx: &mut InteractionContext<'_>) {
        let vectors = self.buffer.take();
        let count = vectors.len();
        let geometries = match build_geometries(self.kind, vectors) {
            Ok(geometries) if !geometries.is_empty() => geometries,
            Ok(_) => {
                debug!(kind = %self.kind, count, "drawing discarded, not enough vertices");
                return;
            }
            Err(err) => {
                warn!(%err, kind = %self.kind, "drawing discarded");
                return;
            }
        };

        let layer_id = self.layer;
        let Some(layer) = ctx.geometry_layer_mut(layer_id) else {
            return;
        };
        let ids: Vec<_> = geometries.into_iter().map(|g| layer.add(g)).collect();
        for &id in &ids {
            let object = GeometryRef::new(layer_id, id);
            ctx.outbox.render(RenderChange::Attach(object));
            ctx.outbox.layer(LayerEvent::Added(object));
        }
        info!(kind = %self.kind, geometries = ids.len(), "drawing committed");
        ctx.outbox.emit(EditEvent::DrawEnd {
            interaction: ctx.id,
            layer: layer_id,
            geometries: ids,
        });
    }
}

/// Turns the buffered vertices into committed geometries: one Point per
/// vertex, or a single Line or Polygon. Returns an empty list when the
/// kind's minimum is not met.
fn build_geometries(kind: GeometryKind, vectors: Vec<Point3>) -> Result<Vec<Geometry>> {
    if vectors.len() < kind.min_vertices() {
        return Ok(Vec::new());
    }
    Ok(match kind {
        GeometryKind::Point => vectors
            .into_iter()
            .map(|v| Point::new(v, Properties::new()).into())
            .collect(),
        GeometryKind::Line => vec![Line::new(vectors, Properties::new())?.into()],
        GeometryKind::Polygon => vec![Polygon::new(vec![vectors], Properties::new())?.into()],
    })
}
