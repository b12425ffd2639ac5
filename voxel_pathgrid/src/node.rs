// Node model: one cell of the path grid.
//
// A `Node` holds only the cell's environment-derived state. Per-search
// bookkeeping (g costs, parent links, open/closed membership) lives in
// `pathfinding::SearchScratch`, indexed by the same flat `NodeIndex`, so
// parent links are plain indices rather than references into the grid.
//
// Nodes are never destroyed individually: a full rebuild overwrites every
// node, an incremental rebuild overwrites one column at a time.

use crate::types::{GridCoord, Vec3};

/// Flat index of a node in `NavGrid`'s storage.
pub type NodeIndex = u32;

/// One voxel cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub walkable: bool,
    /// World-space position of the cell. For ground-supported columns this
    /// follows the terrain (`ground + y * diameter`).
    pub world_position: Vec3,
    pub coord: GridCoord,
    /// True only for cells within the walkable band above detected ground.
    pub has_ground_support: bool,
}

impl Node {
    pub fn new(
        walkable: bool,
        world_position: Vec3,
        coord: GridCoord,
        has_ground_support: bool,
    ) -> Self {
        Self {
            walkable,
            world_position,
            coord,
            has_ground_support,
        }
    }

    /// A blocked cell with no ground beneath it.
    pub fn unsupported(world_position: Vec3, coord: GridCoord) -> Self {
        Self::new(false, world_position, coord, false)
    }

    /// Walkable and standing within the band above ground.
    pub fn is_standable(&self) -> bool {
        self.walkable && self.has_ground_support
    }
}
