//! Uniform grid index over entity footprints.
//!
//! The world is partitioned into square cells of `cell_size` tiles, one grid
//! per [`CollisionLayer`]. Each cell lists the entities whose footprint
//! overlaps it. A query visits only the cells its shape's bounding region
//! touches, then filters candidates with the exact shape test.
//!
//! Footprints that leave the world bounds are clamped onto the border cells,
//! so out-of-bounds entities are still found.

use std::collections::{BTreeMap, BTreeSet};

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::region::{Region, Shape};
use super::CollisionLayer;
use crate::entity::EntityId;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    region: Region,
    layer: CollisionLayer,
}

/// Grid index answering region and circle queries.
#[derive(Debug, Clone)]
pub struct SpatialManager {
    width: i32,
    height: i32,
    cell_size: i32,
    columns: i32,
    rows: i32,
    /// `layers[layer][row * columns + column]`
    layers: [Vec<Vec<EntityId>>; CollisionLayer::COUNT],
    entries: BTreeMap<EntityId, Entry>,
}

/// Dimensions used to build a [`SpatialManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub width: i32,
    pub height: i32,
    pub cell_size: i32,
}

impl SpatialManager {
    /// Create an empty index covering `width` x `height` tiles.
    ///
    /// # Panics
    ///
    /// Panics if any dimension is not positive.
    pub fn new(width: i32, height: i32, cell_size: i32) -> Self {
        assert!(
            width > 0 && height > 0 && cell_size > 0,
            "grid dimensions must be positive (width={width}, height={height}, cell_size={cell_size})"
        );
        let columns = (width + cell_size - 1) / cell_size;
        let rows = (height + cell_size - 1) / cell_size;
        let cell_count = (columns * rows) as usize;
        Self {
            width,
            height,
            cell_size,
            columns,
            rows,
            layers: std::array::from_fn(|_| vec![Vec::new(); cell_count]),
            entries: BTreeMap::new(),
        }
    }

    pub fn dimensions(&self) -> GridDimensions {
        GridDimensions {
            width: self.width,
            height: self.height,
            cell_size: self.cell_size,
        }
    }

    /// The whole world as a region.
    pub fn bounds(&self) -> Region {
        Region::new(IVec2::ZERO, IVec2::new(self.width, self.height))
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Index `entity` with footprint `region` on `layer`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is already indexed.
    pub fn add(&mut self, entity: EntityId, region: Region, layer: CollisionLayer) {
        let previous = self.entries.insert(entity, Entry { region, layer });
        assert!(previous.is_none(), "entity {entity} is already indexed");
        self.insert_cells(entity, region, layer);
    }

    /// Remove `entity` from the index. Returns `false` if it was not indexed.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        match self.entries.remove(&entity) {
            Some(entry) => {
                self.remove_cells(entity, entry.region, entry.layer);
                true
            }
            None => false,
        }
    }

    /// Move `entity` to a new footprint. Only the cells that differ are
    /// touched. Returns `false` if it was not indexed.
    pub fn update_region(&mut self, entity: EntityId, region: Region) -> bool {
        let Some(entry) = self.entries.get(&entity).copied() else {
            return false;
        };
        if entry.region == region {
            return true;
        }
        if self.cell_span(entry.region) != self.cell_span(region) {
            self.remove_cells(entity, entry.region, entry.layer);
            self.insert_cells(entity, region, entry.layer);
        }
        self.entries.insert(entity, Entry { region, ..entry });
        true
    }

    /// Move `entity` to another collision layer. Returns `false` if it was
    /// not indexed.
    pub fn update_layer(&mut self, entity: EntityId, layer: CollisionLayer) -> bool {
        let Some(entry) = self.entries.get(&entity).copied() else {
            return false;
        };
        if entry.layer == layer {
            return true;
        }
        self.remove_cells(entity, entry.region, entry.layer);
        self.insert_cells(entity, entry.region, layer);
        self.entries.insert(entity, Entry { layer, ..entry });
        true
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            layer.iter_mut().for_each(Vec::clear);
        }
        self.entries.clear();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entries.contains_key(&entity)
    }

    /// Indexed footprint of `entity`.
    pub fn region_of(&self, entity: EntityId) -> Option<Region> {
        self.entries.get(&entity).map(|e| e.region)
    }

    /// Indexed layer of `entity`.
    pub fn layer_of(&self, entity: EntityId) -> Option<CollisionLayer> {
        self.entries.get(&entity).map(|e| e.layer)
    }

    /// Every entity, on any layer, whose footprint intersects `shape`, in
    /// ascending id order.
    pub fn intersecting(&self, shape: &impl Shape) -> Vec<EntityId> {
        self.query(shape, None)
    }

    /// Like [`intersecting`](Self::intersecting), restricted to `layer`.
    pub fn intersecting_on_layer(&self, shape: &impl Shape, layer: CollisionLayer) -> Vec<EntityId> {
        self.query(shape, Some(layer))
    }

    /// True if `region` lies within the world and no entity on `layer`
    /// overlaps it.
    pub fn is_free(&self, region: &Region, layer: CollisionLayer) -> bool {
        self.bounds().contains_region(region) && self.intersecting_on_layer(region, layer).is_empty()
    }

    /// All indexed entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entries.keys().copied()
    }

    fn query(&self, shape: &impl Shape, layer: Option<CollisionLayer>) -> Vec<EntityId> {
        let bounds = shape.bounding_region();
        let mut candidates = BTreeSet::new();
        for cell in self.cells_of(bounds) {
            for (index, grid) in self.layers.iter().enumerate() {
                if layer.is_some_and(|l| l.index() != index) {
                    continue;
                }
                candidates.extend(grid[cell].iter().copied());
            }
        }
        candidates
            .into_iter()
            .filter(|id| {
                self.entries
                    .get(id)
                    .is_some_and(|entry| shape.intersects_region(&entry.region))
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Cell bookkeeping
    // -----------------------------------------------------------------------

    /// Clamped cell coordinates (inclusive) covered by `region`.
    fn cell_span(&self, region: Region) -> (IVec2, IVec2) {
        let last = IVec2::new(self.columns - 1, self.rows - 1);
        let lo = region.min().div_euclid(IVec2::splat(self.cell_size));
        let hi = (region.max() - IVec2::ONE).div_euclid(IVec2::splat(self.cell_size));
        (lo.clamp(IVec2::ZERO, last), hi.clamp(IVec2::ZERO, last))
    }

    fn cells_of(&self, region: Region) -> impl Iterator<Item = usize> {
        let (lo, hi) = self.cell_span(region);
        let columns = self.columns;
        (lo.y..=hi.y).flat_map(move |y| (lo.x..=hi.x).map(move |x| (y * columns + x) as usize))
    }

    fn insert_cells(&mut self, entity: EntityId, region: Region, layer: CollisionLayer) {
        let cells: Vec<usize> = self.cells_of(region).collect();
        let grid = &mut self.layers[layer.index()];
        for cell in cells {
            grid[cell].push(entity);
        }
    }

    fn remove_cells(&mut self, entity: EntityId, region: Region, layer: CollisionLayer) {
        let cells: Vec<usize> = self.cells_of(region).collect();
        let grid = &mut self.layers[layer.index()];
        for cell in cells {
            grid[cell].retain(|&e| e != entity);
        }
    }

    /// Check every entry is listed in exactly the cells its footprint covers.
    pub fn is_consistent(&self) -> bool {
        let mut expected = 0usize;
        for (&id, entry) in &self.entries {
            for cell in self.cells_of(entry.region) {
                let listed = self.layers[entry.layer.index()][cell]
                    .iter()
                    .filter(|&&e| e == id)
                    .count();
                if listed != 1 {
                    return false;
                }
                expected += 1;
            }
        }
        let total: usize = self.layers.iter().flatten().map(Vec::len).sum();
        total == expected
    }
}
