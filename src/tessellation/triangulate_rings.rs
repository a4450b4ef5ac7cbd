use std::collections::{HashMap, VecDeque};

use spade::handles::{FixedFaceHandle, InnerTag};
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};
use tracing::warn;

use crate::error::{Result, TessellationError};
use crate::math::{Point3, Vector3};

use super::LocalMesh;

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Triangulates a polygon given as `[outer, hole, hole, ...]` rings.
///
/// Rings are projected onto the XY plane; each output vertex keeps the
/// height of the input vertex it came from. The mesh is localized to the
/// first vertex of the outer ring. Hole interiors are excluded.
///
/// Constraint edges that would cross an already inserted edge are skipped
/// with a warning, so self-intersecting rings and overlapping holes still
/// produce a (possibly imperfect) mesh.
///
/// # Errors
///
/// Returns [`TessellationError::InvalidInput`] if the outer ring has fewer
/// than 3 vertices, or [`TessellationError::Failed`] if a vertex cannot be
/// inserted (non-finite coordinates).
#[allow(clippy::cast_possible_truncation)]
pub fn triangulate_rings(rings: &[Vec<Point3>]) -> Result<LocalMesh> {
    let Some(outer) = rings.first() else {
        return Err(TessellationError::InvalidInput("no rings".into()).into());
    };
    if outer.len() < 3 {
        return Err(TessellationError::InvalidInput(format!(
            "outer ring needs at least 3 vertices, got {}",
            outer.len()
        ))
        .into());
    }
    let origin = outer[0];

    let mut cdt = Cdt::new();
    let mut heights: HashMap<usize, Vector3> = HashMap::new();
    for (ring_index, ring) in rings.iter().enumerate() {
        if ring.len() < 3 {
            warn!(ring_index, len = ring.len(), "skipping ring with fewer than 3 vertices");
            continue;
        }
        let local: Vec<Vector3> = ring.iter().map(|p| p - origin).collect();
        insert_constraint_loop(&mut cdt, &local, &mut heights, ring_index)?;
    }

    let inside = odd_parity_faces(&cdt);

    let mut mesh = LocalMesh {
        origin,
        ..LocalMesh::default()
    };
    let mut vertex_map: HashMap<usize, u32> = HashMap::new();

    for face_handle in cdt.inner_faces() {
        if !inside.get(face_handle.fix().index()).copied().unwrap_or(false) {
            continue;
        }

        let mut tri_indices = [0u32; 3];
        for (i, vh) in face_handle.vertices().iter().enumerate() {
            let idx = vh.fix().index();
            let mesh_idx = if let Some(&existing) = vertex_map.get(&idx) {
                existing
            } else {
                let pos = vh.position();
                let local = heights
                    .get(&idx)
                    .copied()
                    .unwrap_or_else(|| Vector3::new(pos.x, pos.y, 0.0));
                let new_idx = mesh.vertices.len() as u32;
                mesh.vertices.push(local);
                vertex_map.insert(idx, new_idx);
                new_idx
            };
            tri_indices[i] = mesh_idx;
        }
        mesh.indices.push(tri_indices);
    }

    Ok(mesh)
}

/// Inserts a closed ring as constraint edges into the CDT, recording the
/// full local position of every inserted vertex.
fn insert_constraint_loop(
    cdt: &mut Cdt,
    ring: &[Vector3],
    positions: &mut HashMap<usize, Vector3>,
    ring_index: usize,
) -> Result<()> {
    let mut handles = Vec::with_capacity(ring.len());
    for local in ring {
        let h = cdt
            .insert(SpadePoint2::new(local.x, local.y))
            .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        positions.entry(h.index()).or_insert(*local);
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from == to {
            continue;
        }
        if cdt.can_add_constraint(from, to) {
            cdt.add_constraint(from, to);
        } else {
            warn!(ring_index, edge = i, "skipping constraint edge crossing another ring edge");
        }
    }

    Ok(())
}

/// Marks every inner face lying inside an odd number of constraint loops,
/// indexed by fixed face index.
///
/// The walk enters from the convex hull and flips parity on every
/// constraint edge it crosses, so hole interiors come out even.
fn odd_parity_faces(cdt: &Cdt) -> Vec<bool> {
    let mut parity: Vec<Option<bool>> = vec![None; cdt.num_all_faces()];
    let mut pending: VecDeque<(FixedFaceHandle<InnerTag>, bool)> = VecDeque::new();

    for hull_edge in cdt.convex_hull() {
        let crosses = cdt.is_constraint_edge(hull_edge.as_undirected().fix());
        let entered = [hull_edge.face(), hull_edge.rev().face()]
            .into_iter()
            .find_map(|face| face.as_inner());
        if let Some(face) = entered {
            pending.push_back((face.fix(), crosses));
        }
    }

    while let Some((fix, odd)) = pending.pop_front() {
        let slot = &mut parity[fix.index()];
        if slot.is_some() {
            continue;
        }
        *slot = Some(odd);
        for edge in cdt.face(fix).adjacent_edges() {
            if let Some(next) = edge.rev().face().as_inner() {
                if parity[next.fix().index()].is_none() {
                    let crosses = cdt.is_constraint_edge(edge.as_undirected().fix());
                    pending.push_back((next.fix(), odd ^ crosses));
                }
            }
        }
    }

    parity.into_iter().map(|p| p == Some(true)).collect()
}
