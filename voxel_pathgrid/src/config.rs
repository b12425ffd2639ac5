// Data-driven path grid configuration.
//
// All tunable parameters live in `GridConfig`, loadable from JSON. The grid
// never uses magic numbers for anything a level designer might want to tune;
// the remaining fixed ratios (obstacle probe inflation, line-of-sight probe
// shrink) are named constants below.
//
// Derived geometry (lattice dimensions, world origin) is computed once from
// this config by `GridGeometry::from_config()` in `grid.rs`.
//
// See also: `navigator.rs` which validates and owns the config,
// `builder.rs` for the rebuild cadence fields, `grid.rs` for
// `LookupPolicy`'s effect on the spatial index.

use crate::error::{ConfigError, ConfigResult};
use crate::node::NodeIndex;
use crate::types::{LayerMask, Vec3};
use serde::{Deserialize, Serialize};

/// Obstacle probe sphere radius, as a multiple of the node radius.
pub const OBSTACLE_PROBE_SCALE: f32 = 1.1;

/// Line-of-sight probe radius, as a multiple of the node radius.
pub const LINE_OF_SIGHT_PROBE_SCALE: f32 = 0.9;

/// Default layer for ground colliders.
pub const GROUND_LAYER: u32 = 0;

/// Default layer for solid obstacles. Must differ from the ground layer, or
/// the obstacle probe (which dips slightly below the cell) hits the floor.
pub const OBSTACLE_LAYER: u32 = 1;

/// How the grid is kept in sync with the environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebuildMode {
    /// Rebuild every column in one call each time the interval elapses.
    Full,
    /// Start a pass each time the interval elapses, then process
    /// `columns_per_tick` columns per tick until the pass completes.
    Incremental,
}

/// How a world position is resolved to a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupPolicy {
    /// Return the cell the position falls in, walkable or not.
    Direct,
    /// If the direct cell is blocked or unsupported, search the same column
    /// (one below, one above, two below, ...) for the nearest walkable,
    /// ground-supported cell. Falls back to the direct cell.
    NearestSupported,
}

/// Complete path grid configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// World-space center of the grid volume.
    pub grid_center: Vec3,
    /// Extents of the grid volume in world units.
    pub world_size: Vec3,
    /// Edge length of one cell in world units.
    pub node_diameter: f32,
    /// Maximum node expansions per search before giving up.
    pub max_iterations: u32,
    /// Layers that make a cell unwalkable and block line of sight.
    pub obstacle_mask: LayerMask,
    /// Layers that count as ground for the height probe.
    pub ground_mask: LayerMask,
    /// Length of the downward ground probe.
    pub max_probe_distance: f32,
    /// Height of the walkable band above detected ground. Cells above the
    /// band are unwalkable and have no ground support.
    pub walkable_height: f32,
    /// When false the scheduler never rebuilds on its own; only
    /// `Navigator::refresh_grid()` does.
    pub auto_update: bool,
    pub rebuild_mode: RebuildMode,
    /// Incremental budget: columns processed per tick.
    pub columns_per_tick: u32,
    /// Seconds between rebuild passes.
    pub rebuild_interval_secs: f32,
    pub lookup_policy: LookupPolicy,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_center: Vec3::ZERO,
            world_size: Vec3::new(50.0, 10.0, 50.0),
            node_diameter: 0.4,
            max_iterations: 1000,
            obstacle_mask: LayerMask::layer(OBSTACLE_LAYER),
            ground_mask: LayerMask::layer(GROUND_LAYER),
            max_probe_distance: 100.0,
            walkable_height: 5.0,
            auto_update: true,
            rebuild_mode: RebuildMode::Incremental,
            columns_per_tick: 100,
            rebuild_interval_secs: 5.0,
            lookup_policy: LookupPolicy::Direct,
        }
    }
}

impl GridConfig {
    /// Parse a config from JSON and validate it. Missing fields take their
    /// default values.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: GridConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn node_radius(&self) -> f32 {
        self.node_diameter * 0.5
    }

    /// Check that a grid can be built from this config.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.node_diameter.is_finite() && self.node_diameter > 0.0) {
            return Err(invalid("node_diameter", "must be finite and positive"));
        }
        if !self.grid_center.is_finite() {
            return Err(invalid("grid_center", "must be finite"));
        }
        let size = self.world_size;
        for (axis, extent) in [("x", size.x), ("y", size.y), ("z", size.z)] {
            if !(extent.is_finite() && extent > 0.0) {
                return Err(invalid(
                    "world_size",
                    format!("{axis} extent must be finite and positive, got {extent}"),
                ));
            }
            if (extent / self.node_diameter).round() < 1.0 {
                return Err(invalid(
                    "world_size",
                    format!(
                        "{axis} extent {extent} holds no cells of diameter {}",
                        self.node_diameter
                    ),
                ));
            }
        }
        let cells = |extent: f32| (extent / self.node_diameter).round() as u64;
        let node_count = cells(size.x)
            .checked_mul(cells(size.y))
            .and_then(|n| n.checked_mul(cells(size.z)));
        if node_count.is_none_or(|n| n > u64::from(NodeIndex::MAX)) {
            return Err(invalid(
                "world_size",
                format!("lattice would exceed {} nodes", NodeIndex::MAX),
            ));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be at least 1"));
        }
        if self.columns_per_tick == 0 {
            return Err(invalid("columns_per_tick", "must be at least 1"));
        }
        if !(self.max_probe_distance.is_finite() && self.max_probe_distance > 0.0) {
            return Err(invalid("max_probe_distance", "must be finite and positive"));
        }
        if !(self.walkable_height.is_finite() && self.walkable_height >= 0.0) {
            return Err(invalid("walkable_height", "must be finite and non-negative"));
        }
        if !(self.rebuild_interval_secs.is_finite() && self.rebuild_interval_secs >= 0.0) {
            return Err(invalid("rebuild_interval_secs", "must be finite and non-negative"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}
