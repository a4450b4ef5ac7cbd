//! The authoritative 3D cursor.
//!
//! Every pointer move is resolved into one world position, in strict
//! priority order: snap points, then boundary lines, then dense surfaces,
//! and finally the horizontal plane at the current cursor height. The first
//! accepted candidate wins regardless of how close a lower-priority
//! candidate is.

use slotmap::SlotMap;
use tracing::{debug, error};

use crate::camera::Camera;
use crate::config::CursorConfig;
use crate::error::{ResolveError, Result};
use crate::layer::{GeometryRef, Layer, LayerId};
use crate::math::intersect_3d::ray_horizontal_plane;
use crate::math::{Point2, Point3, Ray, TOLERANCE};
use crate::picker::ScenePicker;
use crate::snap::{SnapId, SnapIndex};

/// What the cursor is locked onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapKind {
    Point,
    Line,
    Surface,
}

/// The cursor as seen by interactions.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorState {
    /// Authoritative world position.
    pub position: Point3,
    /// Projected pointer position; equal to `position` while snapped.
    pub mouse_position: Point3,
    pub snapped: bool,
    pub snapped_object: Option<GeometryRef>,
    pub snap_kind: Option<SnapKind>,
    /// Set by pointer moves, cleared by pointer-down. A pointer-up with
    /// this still `false` is a click.
    pub moved_mouse: bool,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            mouse_position: Point3::origin(),
            snapped: false,
            snapped_object: None,
            snap_kind: None,
            moved_mouse: false,
        }
    }
}

/// Read-only view of the session data the cursor resolves against.
#[derive(Clone, Copy)]
pub struct SnapContext<'a> {
    pub layers: &'a SlotMap<LayerId, Layer>,
    pub snaps: &'a SlotMap<SnapId, SnapIndex>,
    pub picker: &'a dyn ScenePicker,
}

impl SnapContext<'_> {
    fn is_being_modified(&self, object: GeometryRef) -> bool {
        self.layers
            .get(object.layer)
            .and_then(Layer::as_geometry)
            .and_then(|layer| layer.get(object.geometry))
            .is_some_and(|g| g.flags().is_being_modified())
    }

    /// Active indices whose fixed target (if any) is not being modified.
    fn usable_indices(&self) -> impl Iterator<Item = &SnapIndex> + '_ {
        self.snaps.values().filter(|index| {
            index.is_active() && !index.target().is_some_and(|t| self.is_being_modified(t))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Resolution {
    Snapped {
        position: Point3,
        object: Option<GeometryRef>,
        kind: SnapKind,
    },
    Free(Point3),
}

/// Resolves pointer input into the cursor state.
#[derive(Debug, Clone)]
pub struct CursorEngine {
    state: CursorState,
    point_snap_distance: f64,
    line_snap_distance: f64,
}

impl CursorEngine {
    #[must_use]
    pub fn new(config: &CursorConfig) -> Self {
        Self {
            state: CursorState::default(),
            point_snap_distance: config.point_snap_distance,
            line_snap_distance: config.line_snap_distance,
        }
    }

    #[must_use]
    pub fn state(&self) -> &CursorState {
        &self.state
    }

    /// Handles a pointer move. Resolution failures are logged and leave the
    /// cursor where it was.
    pub fn pointer_moved(&mut self, camera: Option<&Camera>, ndc: &Point2, ctx: &SnapContext<'_>) {
        if let Err(err) = self.update_position(camera, ndc, ctx) {
            error!(%err, "cursor position not updated");
        }
        self.state.moved_mouse = true;
    }

    /// Handles a pointer-down: probes the scene height, then arms click
    /// detection.
    pub fn pointer_down(&mut self, camera: Option<&Camera>, ndc: &Point2, ctx: &SnapContext<'_>) {
        if let Err(err) = self.update_height(camera, ndc, ctx) {
            error!(%err, "cursor height not updated");
        }
        self.state.moved_mouse = false;
    }

    /// Casts a ray through `ndc` and resolves it.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if there is no camera, the ray is invalid
    /// or a scene query fails. The cursor state is unchanged on error.
    pub fn update_position(
        &mut self,
        camera: Option<&Camera>,
        ndc: &Point2,
        ctx: &SnapContext<'_>,
    ) -> Result<()> {
        let ray = camera.ok_or(ResolveError::NoCamera)?.ray(ndc)?;
        self.resolve_ray(&ray, ctx)
    }

    /// Resolves `ray` against the snap candidates and applies the result.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if a surface query fails or the ray runs
    /// parallel to the horizontal plane. The cursor state is unchanged on
    /// error.
    pub fn resolve_ray(&mut self, ray: &Ray, ctx: &SnapContext<'_>) -> Result<()> {
        match self.resolve(ray, ctx)? {
            Resolution::Snapped {
                position,
                object,
                kind,
            } => self.snap_to(position, object, kind),
            Resolution::Free(position) => {
                self.unsnap();
                self.state.position = position;
                self.state.mouse_position = position;
            }
        }
        Ok(())
    }

    fn resolve(&self, ray: &Ray, ctx: &SnapContext<'_>) -> Result<Resolution> {
        if let Some(resolution) = self.resolve_point(ray, ctx) {
            return Ok(resolution);
        }
        if let Some(resolution) = self.resolve_line(ray, ctx) {
            return Ok(resolution);
        }

        let surfaces: Vec<LayerId> = ctx
            .usable_indices()
            .flat_map(|index| index.surfaces().iter().map(|s| s.layer))
            .collect();
        if !surfaces.is_empty() {
            if let Some(position) = ctx.picker.intersect_surfaces(ray, &surfaces)? {
                debug!(?position, "snapped to surface");
                return Ok(Resolution::Snapped {
                    position,
                    object: None,
                    kind: SnapKind::Surface,
                });
            }
        }

        let height = self.state.position.z;
        let position = ray_horizontal_plane(ray, height).ok_or(ResolveError::ParallelToPlane(height))?;
        Ok(Resolution::Free(position))
    }

    /// First index (in session order) whose nearest usable point is within
    /// the point snap distance.
    fn resolve_point(&self, ray: &Ray, ctx: &SnapContext<'_>) -> Option<Resolution> {
        for index in ctx.usable_indices() {
            if index.points().is_empty() {
                continue;
            }
            let hit = index
                .point_cloud()
                .raycast(ray, self.point_snap_distance)
                .into_iter()
                .filter_map(|hit| index.points().get(hit.index))
                .find(|candidate| !ctx.is_being_modified(candidate.refers_to));
            if let Some(candidate) = hit {
                debug!(position = ?candidate.coordinates, "snapped to point");
                return Some(Resolution::Snapped {
                    position: candidate.coordinates,
                    object: Some(candidate.refers_to),
                    kind: SnapKind::Point,
                });
            }
        }
        None
    }

    /// Nearest usable boundary line across all indices.
    fn resolve_line(&self, ray: &Ray, ctx: &SnapContext<'_>) -> Option<Resolution> {
        ctx.usable_indices()
            .flat_map(SnapIndex::lines)
            .filter(|line| !ctx.is_being_modified(line.refers_to))
            .filter_map(|line| {
                line.polyline
                    .raycast(ray, self.line_snap_distance)
                    .map(|hit| (hit, line.refers_to))
            })
            .min_by(|a, b| a.0.distance.total_cmp(&b.0.distance))
            .map(|(hit, refers_to)| {
                debug!(position = ?hit.point, "snapped to line");
                Resolution::Snapped {
                    position: hit.point,
                    object: Some(refers_to),
                    kind: SnapKind::Line,
                }
            })
    }

    /// Probes the scene under `ndc` for a new cursor height.
    ///
    /// Does nothing while snapped. Geometry layer renderables are tried
    /// first (a hit at height zero is ignored), then the external scene;
    /// without a hit the current height is kept. The cursor is then placed
    /// on the horizontal plane at that height.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if there is no camera, the ray is invalid,
    /// the scene query fails or the ray runs parallel to the plane. The
    /// cursor state is unchanged on error.
    pub fn update_height(
        &mut self,
        camera: Option<&Camera>,
        ndc: &Point2,
        ctx: &SnapContext<'_>,
    ) -> Result<()> {
        if self.state.snapped {
            return Ok(());
        }
        let ray = camera.ok_or(ResolveError::NoCamera)?.ray(ndc)?;

        let model_hit = ctx
            .layers
            .values()
            .filter_map(Layer::as_geometry)
            .filter_map(|layer| layer.raycast(&ray, self.line_snap_distance, |_, _| true))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
            .map(|hit| hit.point)
            .filter(|point| point.z.abs() > TOLERANCE);

        let height = match model_hit {
            Some(point) => point.z,
            None => match ctx.picker.intersect_scene(&ray)? {
                Some(point) => point.z,
                None => self.state.position.z,
            },
        };

        let position = ray_horizontal_plane(&ray, height).ok_or(ResolveError::ParallelToPlane(height))?;
        debug!(height, "cursor height probed");
        self.state.position = position;
        self.state.mouse_position = position;
        Ok(())
    }

    /// Locks the cursor onto `position`.
    pub fn snap_to(&mut self, position: Point3, object: Option<GeometryRef>, kind: SnapKind) {
        self.state.snapped = true;
        self.state.snapped_object = object;
        self.state.snap_kind = Some(kind);
        self.state.position = position;
        self.state.mouse_position = position;
    }

    /// Releases the snap lock. The position is kept until the next resolve.
    pub fn unsnap(&mut self) {
        self.state.snapped = false;
        self.state.snapped_object = None;
        self.state.snap_kind = None;
    }
}
