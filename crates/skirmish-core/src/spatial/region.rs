//! Grid regions, circles, and the [`Shape`] trait used by spatial queries.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle on the integer grid.
///
/// Covers the half-open cell range `[min, min + size)` on both axes. As a
/// continuous box it spans `[min, min + size]`, which is what distances are
/// measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    min: IVec2,
    size: IVec2,
}

impl Region {
    /// # Panics
    ///
    /// Panics if either axis of `size` is not positive.
    pub fn new(min: IVec2, size: IVec2) -> Self {
        assert!(
            size.x > 0 && size.y > 0,
            "region size must be positive, got {size}"
        );
        Self { min, size }
    }

    /// A 1x1 region covering the single cell `cell`.
    pub fn cell(cell: IVec2) -> Self {
        Self::new(cell, IVec2::ONE)
    }

    #[inline]
    pub fn min(&self) -> IVec2 {
        self.min
    }

    #[inline]
    pub fn size(&self) -> IVec2 {
        self.size
    }

    /// Exclusive upper corner, saturating at the edge of the grid.
    #[inline]
    pub fn max(&self) -> IVec2 {
        IVec2::new(
            self.min.x.saturating_add(self.size.x),
            self.min.y.saturating_add(self.size.y),
        )
    }

    pub fn center(&self) -> Vec2 {
        self.min.as_vec2() + self.size.as_vec2() * 0.5
    }

    /// The region expanded by `amount` cells in every direction.
    pub fn grow(&self, amount: i32) -> Region {
        let min = IVec2::new(self.min.x.saturating_sub(amount), self.min.y.saturating_sub(amount));
        let grown = amount.saturating_mul(2);
        Region::new(
            min,
            IVec2::new(self.size.x.saturating_add(grown), self.size.y.saturating_add(grown)),
        )
    }

    /// Whether the two regions share at least one cell.
    pub fn intersects(&self, other: &Region) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        self.min.x < b_max.x
            && other.min.x < a_max.x
            && self.min.y < b_max.y
            && other.min.y < a_max.y
    }

    /// Whether `cell` lies inside the region.
    pub fn contains_cell(&self, cell: IVec2) -> bool {
        let max = self.max();
        cell.x >= self.min.x && cell.y >= self.min.y && cell.x < max.x && cell.y < max.y
    }

    /// Whether `other` lies entirely inside this region.
    pub fn contains_region(&self, other: &Region) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && b_max.x <= a_max.x
            && b_max.y <= a_max.y
    }

    /// True if `a` grown by one cell intersects `b`: the regions overlap or
    /// touch, diagonals included. Symmetric in its arguments.
    pub fn are_adjacent_or_intersecting(a: &Region, b: &Region) -> bool {
        a.grow(1).intersects(b)
    }

    /// Squared Euclidean gap between two boxes; 0 when they touch or overlap.
    pub fn squared_distance(a: &Region, b: &Region) -> f32 {
        let (a_max, b_max) = (a.max(), b.max());
        let gap = |a_min: i32, a_max: i32, b_min: i32, b_max: i32| {
            (i64::from(a_min) - i64::from(b_max))
                .max(i64::from(b_min) - i64::from(a_max))
                .max(0) as f32
        };
        let dx = gap(a.min.x, a_max.x, b.min.x, b_max.x);
        let dy = gap(a.min.y, a_max.y, b.min.y, b_max.y);
        dx * dx + dy * dy
    }

    /// Euclidean gap between two boxes; 0 when they touch or overlap.
    pub fn distance(a: &Region, b: &Region) -> f32 {
        Self::squared_distance(a, b).sqrt()
    }

    /// Squared distance from `point` to the nearest point of this box.
    pub fn squared_distance_to_point(&self, point: Vec2) -> f32 {
        let nearest = point.clamp(self.min.as_vec2(), self.max().as_vec2());
        nearest.distance_squared(point)
    }

    /// Distance from `point` to the nearest point of this box.
    pub fn distance_to_point(&self, point: Vec2) -> f32 {
        self.squared_distance_to_point(point).sqrt()
    }

    /// Every cell covered by the region, row by row.
    pub fn cells(&self) -> impl Iterator<Item = IVec2> {
        let (min, max) = (self.min, self.max());
        (min.y..max.y).flat_map(move |y| (min.x..max.x).map(move |x| IVec2::new(x, y)))
    }
}

// ---------------------------------------------------------------------------
// Circle
// ---------------------------------------------------------------------------

/// A disc in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// An area that can be tested against grid regions.
pub trait Shape {
    /// A region covering every cell the shape can intersect.
    fn bounding_region(&self) -> Region;

    /// Whether the shape overlaps `region`.
    fn intersects_region(&self, region: &Region) -> bool;
}

impl Shape for Region {
    fn bounding_region(&self) -> Region {
        *self
    }

    fn intersects_region(&self, region: &Region) -> bool {
        self.intersects(region)
    }
}

impl Shape for Circle {
    fn bounding_region(&self) -> Region {
        let radius = self.radius.max(0.0);
        // One extra cell on each side absorbs float rounding at the rim.
        let min = (self.center - Vec2::splat(radius)).floor().as_ivec2() - IVec2::ONE;
        let max = (self.center + Vec2::splat(radius)).ceil().as_ivec2() + IVec2::ONE;
        Region::new(min, (max - min).max(IVec2::ONE))
    }

    /// Strict: a box whose nearest point is exactly on the rim is outside.
    fn intersects_region(&self, region: &Region) -> bool {
        region.squared_distance_to_point(self.center) < self.radius * self.radius
    }
}
