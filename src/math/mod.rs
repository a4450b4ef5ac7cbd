pub mod distance_3d;
pub mod intersect_3d;
pub mod polygon_2d;
mod ray;

pub use ray::Ray;

/// 2D point type, used for normalized device coordinates.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type. Every vertex of every geometry is one of these.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates a degenerate box around a single point.
    #[must_use]
    pub fn from_point(point: Point3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Builds the smallest box containing every point, or `None` if empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let mut bbox = Self::from_point(*iter.next()?);
        for p in iter {
            bbox.expand(p);
        }
        Some(bbox)
    }

    /// Grows the box to include `point`.
    pub fn expand(&mut self, point: &Point3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Returns the union of two boxes.
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Returns the center of the box.
    #[must_use]
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }
}
