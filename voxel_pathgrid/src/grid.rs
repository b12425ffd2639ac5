// Dense 3D path grid and the world-to-cell spatial index.
//
// The lattice is stored as a flat `Vec<Node>` indexed by
// `x + z * size_x + y * size_x * size_z`, giving O(1) access by coordinate
// and a stable `NodeIndex` for search scratch and parent links. Dimensions
// are computed once from `GridConfig` (`round(world_size / node_diameter)`
// per axis) and never change; rebuilds overwrite nodes in place.
//
// `node_from_world_point()` maps a world position to a cell by normalizing
// it within the grid volume, clamping to [0, 1], and rounding onto
// `[0, size - 1]`. The `LookupPolicy` decides what happens when that cell
// is blocked; see `config.rs`.
//
// See also: `builder.rs` which fills the nodes from environment probes,
// `neighbors.rs` for adjacency, `pathfinding.rs` for A* over this grid.
//
// **Critical constraint: determinism.** Flat index order (x inner, z mid,
// y outer) is the only iteration order used anywhere in the crate.

use crate::config::{GridConfig, LookupPolicy};
use crate::node::{Node, NodeIndex};
use crate::types::{GridCoord, Vec3};

/// Lattice dimensions and world placement, derived once from the config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: u32,
    pub node_diameter: f32,
    pub world_size: Vec3,
    pub grid_center: Vec3,
    /// Minimum corner of the grid volume.
    pub world_bottom_left: Vec3,
}

impl GridGeometry {
    /// Derive geometry from a config. Assumes `config.validate()` passed.
    pub fn from_config(config: &GridConfig) -> Self {
        let d = config.node_diameter;
        let size = config.world_size;
        Self {
            size_x: (size.x / d).round() as u32,
            size_y: (size.y / d).round() as u32,
            size_z: (size.z / d).round() as u32,
            node_diameter: d,
            world_size: size,
            grid_center: config.grid_center,
            world_bottom_left: config.grid_center - size * 0.5,
        }
    }

    /// Geometry for an explicit lattice of unit-ish cells, with the volume
    /// sized to fit exactly. Handy for tooling and tests.
    pub fn with_dims(size_x: u32, size_y: u32, size_z: u32, node_diameter: f32) -> Self {
        let world_size = Vec3::new(
            size_x as f32 * node_diameter,
            size_y as f32 * node_diameter,
            size_z as f32 * node_diameter,
        );
        Self {
            size_x,
            size_y,
            size_z,
            node_diameter,
            world_size,
            grid_center: world_size * 0.5,
            world_bottom_left: Vec3::ZERO,
        }
    }

    pub fn node_radius(&self) -> f32 {
        self.node_diameter * 0.5
    }

    pub fn node_count(&self) -> usize {
        self.size_x as usize * self.size_y as usize * self.size_z as usize
    }

    pub fn column_count(&self) -> usize {
        self.size_x as usize * self.size_z as usize
    }

    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && coord.z >= 0
            && (coord.x as u32) < self.size_x
            && (coord.y as u32) < self.size_y
            && (coord.z as u32) < self.size_z
    }

    /// Flat index of a coordinate. Returns `None` if out of bounds.
    pub fn index(&self, coord: GridCoord) -> Option<NodeIndex> {
        if self.in_bounds(coord) {
            let sx = self.size_x as usize;
            let sz = self.size_z as usize;
            let i = coord.x as usize + coord.z as usize * sx + coord.y as usize * sx * sz;
            Some(i as NodeIndex)
        } else {
            None
        }
    }

    /// Inverse of `index()`.
    pub fn coord_of(&self, index: NodeIndex) -> GridCoord {
        let i = index as usize;
        let sx = self.size_x as usize;
        let sz = self.size_z as usize;
        let layer = sx * sz;
        let y = i / layer;
        let rem = i % layer;
        GridCoord::new((rem % sx) as i32, y as i32, (rem / sx) as i32)
    }

    /// Center of a cell on the regular lattice (ignores terrain).
    pub fn lattice_center(&self, coord: GridCoord) -> Vec3 {
        let d = self.node_diameter;
        let r = self.node_radius();
        self.world_bottom_left
            + Vec3::new(
                coord.x as f32 * d + r,
                coord.y as f32 * d + r,
                coord.z as f32 * d + r,
            )
    }

    /// Origin of the downward ground probe for column `(x, z)`: the column
    /// center, one full grid height above the grid center.
    pub fn ground_probe_origin(&self, x: u32, z: u32) -> Vec3 {
        let center = self.lattice_center(GridCoord::new(x as i32, 0, z as i32));
        Vec3::new(center.x, self.grid_center.y + self.world_size.y, center.z)
    }

    /// The cell a world position falls in, clamped onto the lattice.
    /// Returns `None` for non-finite positions or an empty lattice.
    pub fn cell_of(&self, world_position: Vec3) -> Option<GridCoord> {
        if !world_position.is_finite() {
            return None;
        }
        let rel = world_position - self.world_bottom_left;
        let scale = |rel: f32, extent: f32, cells: u32| -> i32 {
            let percent = (rel / extent).clamp(0.0, 1.0);
            (cells.saturating_sub(1) as f32 * percent).round() as i32
        };
        let coord = GridCoord::new(
            scale(rel.x, self.world_size.x, self.size_x),
            scale(rel.y, self.world_size.y, self.size_y),
            scale(rel.z, self.world_size.z, self.size_z),
        );
        self.in_bounds(coord).then_some(coord)
    }
}

/// Walkability summary, used for logging and debug drawing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridStats {
    pub total: usize,
    pub walkable: usize,
    pub ground_supported: usize,
}

/// The path grid: one `Node` per lattice cell.
#[derive(Clone, Debug)]
pub struct NavGrid {
    geometry: GridGeometry,
    nodes: Vec<Node>,
}

impl NavGrid {
    /// Create a grid with every node blocked and unsupported, positioned on
    /// the regular lattice. A rebuild fills in real values.
    pub fn new(geometry: GridGeometry) -> Self {
        Self::from_fn(geometry, |_| (false, false))
    }

    /// Create a grid whose `(walkable, has_ground_support)` comes from `f`.
    /// Nodes sit on the regular lattice.
    pub fn from_fn(geometry: GridGeometry, mut f: impl FnMut(GridCoord) -> (bool, bool)) -> Self {
        let nodes = (0..geometry.node_count() as NodeIndex)
            .map(|i| {
                let coord = geometry.coord_of(i);
                let (walkable, supported) = f(coord);
                Node::new(walkable, geometry.lattice_center(coord), coord, supported)
            })
            .collect();
        Self { geometry, nodes }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index as usize]
    }

    pub fn index(&self, coord: GridCoord) -> Option<NodeIndex> {
        self.geometry.index(coord)
    }

    /// Read a node. Returns `None` for out-of-bounds coordinates.
    pub fn get(&self, coord: GridCoord) -> Option<&Node> {
        self.index(coord).map(|i| &self.nodes[i as usize])
    }

    /// Out-of-bounds coordinates are not walkable.
    pub fn is_walkable(&self, coord: GridCoord) -> bool {
        self.get(coord).is_some_and(|n| n.walkable)
    }

    /// Overwrite the node at `node.coord`. No-op for out-of-bounds nodes.
    pub fn set(&mut self, node: Node) {
        if let Some(i) = self.index(node.coord) {
            self.nodes[i as usize] = node;
        }
    }

    /// Change one node's walkability. No-op for out-of-bounds coordinates.
    pub fn set_walkable(&mut self, coord: GridCoord, walkable: bool) {
        if let Some(i) = self.index(coord) {
            self.nodes[i as usize].walkable = walkable;
        }
    }

    /// Resolve a world position to a node according to `policy`.
    ///
    /// Returns `None` only when the position cannot be mapped onto the
    /// lattice at all (non-finite input).
    pub fn node_from_world_point(
        &self,
        world_position: Vec3,
        policy: LookupPolicy,
    ) -> Option<NodeIndex> {
        let coord = self.geometry.cell_of(world_position)?;
        let direct = self.index(coord)?;
        match policy {
            LookupPolicy::Direct => Some(direct),
            LookupPolicy::NearestSupported => {
                if self.node(direct).is_standable() {
                    return Some(direct);
                }
                Some(self.nearest_standable_in_column(coord).unwrap_or(direct))
            }
        }
    }

    /// Expanding vertical search at `coord`'s column: one below, one above,
    /// two below, two above, ...
    fn nearest_standable_in_column(&self, coord: GridCoord) -> Option<NodeIndex> {
        let size_y = self.geometry.size_y as i32;
        (1..size_y)
            .flat_map(|step| [-step, step])
            .filter_map(|dy| self.index(coord.offset(0, dy, 0)))
            .find(|&i| self.node(i).is_standable())
    }

    pub fn stats(&self) -> GridStats {
        self.nodes.iter().fold(
            GridStats {
                total: self.nodes.len(),
                ..GridStats::default()
            },
            |mut stats, node| {
                stats.walkable += node.walkable as usize;
                stats.ground_supported += node.has_ground_support as usize;
                stats
            },
        )
    }

    /// Walkability of every node in flat index order.
    pub fn walkable_mask(&self) -> Vec<bool> {
        self.nodes.iter().map(|n| n.walkable).collect()
    }
}
