// voxel_pathgrid: real-time 3D grid pathfinding over a probed environment.
//
// This crate builds a dense 3D lattice of walkable/blocked cells by probing
// a caller-supplied environment (ground rays, obstacle overlap spheres),
// keeps it fresh with full or time-sliced incremental rebuilds, and answers
// A* path queries that return simplified world-space waypoints. It has no
// engine dependencies: the host implements `Environment` and drives
// `Navigator::tick()` from its frame loop.
//
// Module overview:
// - `types.rs`:       Vec3, GridCoord, LayerMask.
// - `config.rs`:      GridConfig (JSON-loadable tuning), RebuildMode, LookupPolicy.
// - `error.rs`:       ConfigError, PathError.
// - `node.rs`:        Node: per-cell walkability, position, ground support.
// - `probe.rs`:       Environment trait + per-column GroundHeightCache.
// - `grid.rs`:        NavGrid flat storage, GridGeometry, world-to-cell lookup.
// - `builder.rs`:     GridBuilder (full + incremental column rebuilds), RebuildScheduler.
// - `neighbors.rs`:   26-connected neighbor expansion with corner-cut rules.
// - `pathfinding.rs`: A* search, octile distance, generation-stamped scratch.
// - `path_smooth.rs`: Retrace + straight-run waypoint simplification.
// - `navigator.rs`:   Navigator, the composition root a host embeds.
// - `scene.rs`:       BoxScene, an in-memory Environment of box colliders.
//
// **Critical constraint: determinism.** Given the same grid and query, a
// search expands the same nodes in the same order and returns the same
// path. Costs are integers and every tie in the open set is broken by grid
// coordinate. Nothing depends on hash iteration order or wall-clock time.

pub mod builder;
pub mod config;
pub mod error;
pub mod grid;
pub mod navigator;
pub mod neighbors;
pub mod node;
pub mod path_smooth;
pub mod pathfinding;
pub mod probe;
pub mod scene;
pub mod types;

pub use config::GridConfig;
pub use error::{ConfigError, PathError};
pub use navigator::Navigator;
pub use probe::Environment;
pub use types::{GridCoord, LayerMask, Vec3};
