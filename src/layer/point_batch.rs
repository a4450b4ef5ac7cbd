use crate::math::{Point3, Ray};
use crate::tessellation::{LocalPoints, PointHit};

use super::GeometryId;

/// Encodes a pick id as a 24-bit RGB color for the color-pick pass.
///
/// Id `0` is reserved for the background. Only the low 24 bits are kept.
#[must_use]
pub fn encode_pick_color(id: u32) -> [u8; 3] {
    let [_, r, g, b] = id.to_be_bytes();
    [r, g, b]
}

/// Decodes a color read back from the pick pass into a pick id.
#[must_use]
pub fn decode_pick_color(color: [u8; 3]) -> u32 {
    u32::from_be_bytes([0, color[0], color[1], color[2]])
}

/// All Point geometries of a layer as one localized point buffer.
///
/// Each batched point carries a pick id (`index + 1`) so a color-pick pass
/// can resolve a clicked pixel back to the geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointBatch {
    points: LocalPoints,
    geometries: Vec<GeometryId>,
}

impl PointBatch {
    pub(super) fn from_points(entries: impl IntoIterator<Item = (GeometryId, Point3)>) -> Self {
        let (geometries, positions): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        Self {
            points: LocalPoints::from_world(&positions),
            geometries,
        }
    }

    /// The localized point buffer.
    #[must_use]
    pub fn points(&self) -> &LocalPoints {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// The geometry behind batch entry `index`.
    #[must_use]
    pub fn geometry_at(&self, index: usize) -> Option<GeometryId> {
        self.geometries.get(index).copied()
    }

    /// Pick id of batch entry `index`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn pick_id(index: usize) -> u32 {
        index as u32 + 1
    }

    /// Per-point pick colors, in batch order.
    #[must_use]
    pub fn pick_colors(&self) -> Vec<[u8; 3]> {
        (0..self.len()).map(|i| encode_pick_color(Self::pick_id(i))).collect()
    }

    /// Resolves a pick id back to its geometry.
    #[must_use]
    pub fn geometry_for_pick(&self, pick_id: u32) -> Option<GeometryId> {
        let index = usize::try_from(pick_id.checked_sub(1)?).ok()?;
        self.geometry_at(index)
    }

    /// Batched points within `threshold` of `ray`, nearest first.
    #[must_use]
    pub fn raycast(&self, ray: &Ray, threshold: f64) -> Vec<(GeometryId, PointHit)> {
        self.points
            .raycast(ray, threshold)
            .into_iter()
            .filter_map(|hit| Some((self.geometry_at(hit.index)?, hit)))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn pick_color_round_trip() {
        assert_eq!(encode_pick_color(1), [0, 0, 1]);
        assert_eq!(encode_pick_color(0x0012_3456), [0x12, 0x34, 0x56]);
        assert_eq!(decode_pick_color([0x12, 0x34, 0x56]), 0x0012_3456);
        assert_eq!(decode_pick_color(encode_pick_color(70_000)), 70_000);
    }

    #[test]
    fn background_color_resolves_to_nothing() {
        let mut ids: SlotMap<GeometryId, ()> = SlotMap::with_key();
        let a = ids.insert(());
        let batch = PointBatch::from_points([(a, Point3::new(1.0, 2.0, 3.0))]);
        assert_eq!(batch.geometry_for_pick(0), None);
        assert_eq!(batch.geometry_for_pick(1), Some(a));
        assert_eq!(batch.geometry_for_pick(2), None);
        assert_eq!(batch.pick_colors(), vec![[0, 0, 1]]);
    }
}
