// Neighbor expansion for the 26-connected path grid.
//
// Every offset in {-1, 0, 1}^3 except the origin is a candidate move.
// Axis-aligned moves (one non-zero component) are always offered when in
// bounds. Diagonal moves (two or three non-zero components) are dropped if
// any of the single-axis cells forming their corner is unwalkable, so a
// path can never squeeze between two blocked cells or clip a solid edge.
//
// The neighbor itself is not checked for walkability here; the search does
// that, since it also has to skip closed nodes.

use crate::grid::NavGrid;
use crate::node::NodeIndex;
use smallvec::SmallVec;

/// Up to 26 neighbor indices, inline.
pub type Neighbors = SmallVec<[NodeIndex; 26]>;

/// Neighbors of `index` in x-major, then y, then z offset order.
pub fn neighbors(grid: &NavGrid, index: NodeIndex) -> Neighbors {
    let coord = grid.node(index).coord;
    let mut out = Neighbors::new();

    for dx in -1..=1 {
        for dy in -1..=1 {
            for dz in -1..=1 {
                if dx == 0 && dy == 0 && dz == 0 {
                    continue;
                }
                let Some(neighbor) = grid.index(coord.offset(dx, dy, dz)) else {
                    continue;
                };

                let axes = (dx != 0) as u8 + (dy != 0) as u8 + (dz != 0) as u8;
                if axes > 1 {
                    // Corner cells are in bounds whenever the diagonal is.
                    let cuts_corner = (dx != 0 && !grid.is_walkable(coord.offset(dx, 0, 0)))
                        || (dy != 0 && !grid.is_walkable(coord.offset(0, dy, 0)))
                        || (dz != 0 && !grid.is_walkable(coord.offset(0, 0, dz)));
                    if cuts_corner {
                        continue;
                    }
                }

                out.push(neighbor);
            }
        }
    }

    out
}
