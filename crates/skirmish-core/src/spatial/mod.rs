//! Position, footprint, and collision layer of entities, plus the grid index
//! answering "what occupies this area".

pub mod manager;
pub mod region;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::component::{impl_downcast, ComponentData, ComponentKind, Property};

pub use manager::SpatialManager;
pub use region::{Circle, Region, Shape};

/// Collision layer of a spatial entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter, strum::Display,
)]
pub enum CollisionLayer {
    /// Occupies no layer; never blocks anything.
    None,
    Ground,
    Air,
}

impl CollisionLayer {
    pub(crate) const COUNT: usize = 3;

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Where an entity is and how much room it takes.
///
/// The grid footprint is never stored; [`Spatial::grid_region`] derives it from
/// the position every time, so it cannot drift from the float position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spatial {
    /// Minimum corner in world units.
    #[serde(default)]
    position: Vec2,
    size: IVec2,
    #[serde(default)]
    angle: f32,
    collision_layer: CollisionLayer,
}

impl Spatial {
    /// Largest footprint along either axis.
    pub const MAX_SIZE: i32 = 8;

    /// # Panics
    ///
    /// Panics if either axis of `size` is outside `1..=MAX_SIZE`.
    pub fn new(position: Vec2, size: IVec2, collision_layer: CollisionLayer) -> Self {
        assert!(
            size.cmpge(IVec2::ONE).all() && size.cmple(IVec2::splat(Self::MAX_SIZE)).all(),
            "spatial size must be within 1..={} on both axes, got {size}",
            Self::MAX_SIZE
        );
        Self {
            position,
            size,
            angle: 0.0,
            collision_layer,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn size(&self) -> IVec2 {
        self.size
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    #[inline]
    pub fn collision_layer(&self) -> CollisionLayer {
        self.collision_layer
    }

    /// Center of the footprint in world units.
    pub fn center(&self) -> Vec2 {
        self.position + self.size.as_vec2() * 0.5
    }

    /// Footprint on the grid: the rounded position plus the size.
    pub fn grid_region(&self) -> Region {
        Region::new(self.position.round().as_ivec2(), self.size)
    }

    /// Changes position without touching the index; callers go through
    /// [`World::set_position`](crate::world::World::set_position).
    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub(crate) fn set_collision_layer(&mut self, layer: CollisionLayer) {
        self.collision_layer = layer;
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }
}

impl ComponentData for Spatial {
    const KIND: ComponentKind = ComponentKind::Spatial;
    const PROPERTIES: &'static [Property] = &[
        Property::persistent("position"),
        Property::mandatory("size"),
        Property::persistent("angle"),
        Property::mandatory("collision_layer"),
        Property::transient("grid_region"),
        Property::transient("center"),
    ];

    fn validate(&self) -> Result<(), String> {
        let valid_axis = |v: i32| (1..=Self::MAX_SIZE).contains(&v);
        if !(valid_axis(self.size.x) && valid_axis(self.size.y)) {
            return Err(format!(
                "size must be within 1..={} on both axes, got {}",
                Self::MAX_SIZE,
                self.size
            ));
        }
        if !(self.position.is_finite() && self.angle.is_finite()) {
            return Err("position and angle must be finite".to_owned());
        }
        Ok(())
    }

    impl_downcast!(Spatial);
}
