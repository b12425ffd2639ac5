// Grid construction from environment probes, full or time-sliced.
//
// Every column `(x, z)` is built the same way:
//
//   1. Probe ground height once (through `GroundHeightCache`), casting down
//      from one grid height above the grid center.
//   2. No ground: every cell in the column is unwalkable, unsupported, and
//      sits on the regular lattice.
//   3. Ground at `g`: cell `y` sits at `g + y * diameter`. Cells whose lift
//      `y * diameter` is within `walkable_height` are ground-supported and
//      walkable unless an obstacle probe (sphere of 1.1 node radii, centered
//      one radius above the cell) hits something. Cells above the band are
//      unwalkable and unsupported.
//
// Two cadences drive this:
//
// - `GridBuilder::rebuild_full()` builds a fresh lattice in one call and
//   swaps it in.
// - An incremental pass (`begin_incremental()` + `step_incremental()`)
//   walks a resumable `(x, z)` cursor, x-major, overwriting at most
//   `columns_per_tick` columns per step. Searches between steps see a
//   partially refreshed grid; that staleness is bounded by one pass.
//
// The ground cache is cleared at the start of each full rebuild and each
// new incremental pass, never per column.
//
// `RebuildScheduler` is the timer that decides, per host tick, which of the
// above to run. It only returns a `RebuildAction`; `Navigator` executes it.
//
// See also: `probe.rs` for the environment interface and cache,
// `navigator.rs` which wires builder, scheduler, and grid together.
//
// **Critical constraint: single writer.** The grid has exactly one writer
// (this builder) and searches only read it. Hosts that add threads must
// serialize rebuild steps and searches per tick.

use crate::config::{GridConfig, OBSTACLE_PROBE_SCALE, RebuildMode};
use crate::grid::{GridGeometry, GridStats, NavGrid};
use crate::node::Node;
use crate::probe::{Environment, GroundHeightCache};
use crate::types::{GridCoord, LayerMask, Vec3};
use tracing::debug;

/// Probe parameters taken from `GridConfig`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuilderSettings {
    pub ground_mask: LayerMask,
    pub obstacle_mask: LayerMask,
    pub max_probe_distance: f32,
    pub walkable_height: f32,
    pub obstacle_probe_radius: f32,
}

impl BuilderSettings {
    pub fn from_config(config: &GridConfig) -> Self {
        Self {
            ground_mask: config.ground_mask,
            obstacle_mask: config.obstacle_mask,
            max_probe_distance: config.max_probe_distance,
            walkable_height: config.walkable_height,
            obstacle_probe_radius: config.node_radius() * OBSTACLE_PROBE_SCALE,
        }
    }
}

/// Resumable position of an incremental pass: the next column to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebuildCursor {
    pub x: u32,
    pub z: u32,
}

/// State of an in-progress incremental pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IncrementalPass {
    pub cursor: RebuildCursor,
    pub columns_done: usize,
}

/// What one incremental step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    pub columns_processed: usize,
    /// True if this step finished the pass.
    pub pass_complete: bool,
}

/// Populates a `NavGrid` from environment probes.
#[derive(Clone, Debug)]
pub struct GridBuilder {
    settings: BuilderSettings,
    cache: GroundHeightCache,
    pass: Option<IncrementalPass>,
}

impl GridBuilder {
    pub fn new(settings: BuilderSettings, geometry: &GridGeometry) -> Self {
        Self {
            settings,
            cache: GroundHeightCache::with_capacity(geometry.column_count()),
            pass: None,
        }
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    pub fn cache(&self) -> &GroundHeightCache {
        &self.cache
    }

    /// The in-progress incremental pass, if any.
    pub fn incremental_pass(&self) -> Option<&IncrementalPass> {
        self.pass.as_ref()
    }

    pub fn is_incremental_active(&self) -> bool {
        self.pass.is_some()
    }

    /// Build every column into a fresh lattice and swap it in. Cancels any
    /// incremental pass, since the result supersedes it.
    pub fn rebuild_full<E: Environment + ?Sized>(
        &mut self,
        grid: &mut NavGrid,
        env: &E,
    ) -> GridStats {
        self.cache.clear();
        self.pass = None;

        let geometry = *grid.geometry();
        let mut fresh = NavGrid::new(geometry);
        for x in 0..geometry.size_x {
            for z in 0..geometry.size_z {
                self.build_column(&mut fresh, env, x, z);
            }
        }
        *grid = fresh;

        let stats = grid.stats();
        debug!(
            total = stats.total,
            walkable = stats.walkable,
            ground_supported = stats.ground_supported,
            "full grid rebuild complete"
        );
        stats
    }

    /// Start a new incremental pass at column (0, 0), clearing the ground
    /// cache. Restarts any pass already in progress.
    pub fn begin_incremental(&mut self) {
        self.cache.clear();
        self.pass = Some(IncrementalPass::default());
    }

    /// Build up to `budget` columns of the current pass. Does nothing if no
    /// pass is active.
    pub fn step_incremental<E: Environment + ?Sized>(
        &mut self,
        grid: &mut NavGrid,
        env: &E,
        budget: u32,
    ) -> StepOutcome {
        let Some(mut pass) = self.pass else {
            return StepOutcome {
                columns_processed: 0,
                pass_complete: false,
            };
        };
        let geometry = *grid.geometry();

        let mut processed = 0usize;
        while processed < budget as usize && pass.cursor.x < geometry.size_x {
            self.build_column(grid, env, pass.cursor.x, pass.cursor.z);
            processed += 1;

            pass.cursor.z += 1;
            if pass.cursor.z >= geometry.size_z {
                pass.cursor.z = 0;
                pass.cursor.x += 1;
            }
        }
        pass.columns_done += processed;

        let pass_complete = pass.cursor.x >= geometry.size_x;
        if pass_complete {
            self.pass = None;
            let stats = grid.stats();
            debug!(
                columns = pass.columns_done,
                walkable = stats.walkable,
                ground_supported = stats.ground_supported,
                "incremental grid pass complete"
            );
        } else {
            self.pass = Some(pass);
        }

        StepOutcome {
            columns_processed: processed,
            pass_complete,
        }
    }

    /// Probe and overwrite every node in column `(x, z)`.
    pub fn build_column<E: Environment + ?Sized>(
        &mut self,
        grid: &mut NavGrid,
        env: &E,
        x: u32,
        z: u32,
    ) {
        let geometry = *grid.geometry();
        let settings = self.settings;
        let origin = geometry.ground_probe_origin(x, z);
        let sample = self.cache.get_or_probe((x, z), || {
            env.probe_ground_height(origin, settings.max_probe_distance, settings.ground_mask)
        });

        let d = geometry.node_diameter;
        let lift_to_probe = Vec3::UP * geometry.node_radius();

        for y in 0..geometry.size_y {
            let coord = GridCoord::new(x as i32, y as i32, z as i32);
            let node = match sample.height() {
                Some(ground) => {
                    let lift = y as f32 * d;
                    let position = Vec3::new(origin.x, ground + lift, origin.z);
                    if lift <= settings.walkable_height {
                        let blocked = env.probe_obstacle(
                            position + lift_to_probe,
                            settings.obstacle_probe_radius,
                            settings.obstacle_mask,
                        );
                        Node::new(!blocked, position, coord, true)
                    } else {
                        Node::unsupported(position, coord)
                    }
                }
                None => Node::unsupported(geometry.lattice_center(coord), coord),
            };
            grid.set(node);
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// What the host should do this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebuildAction {
    Idle,
    RunFull,
    StartIncremental,
    StepIncremental,
}

/// Interval timer choosing between full and incremental rebuilds.
#[derive(Clone, Debug)]
pub struct RebuildScheduler {
    mode: RebuildMode,
    interval_secs: f32,
    enabled: bool,
    timer_secs: f32,
}

impl RebuildScheduler {
    pub fn new(mode: RebuildMode, interval_secs: f32, enabled: bool) -> Self {
        Self {
            mode,
            interval_secs,
            enabled,
            timer_secs: 0.0,
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(
            config.rebuild_mode,
            config.rebuild_interval_secs,
            config.auto_update,
        )
    }

    pub fn mode(&self) -> RebuildMode {
        self.mode
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Advance by `dt_secs`. While an incremental pass is running, every
    /// tick steps it and the interval timer is paused.
    pub fn tick(&mut self, dt_secs: f32, incremental_active: bool) -> RebuildAction {
        if !self.enabled {
            return RebuildAction::Idle;
        }
        if self.mode == RebuildMode::Incremental && incremental_active {
            return RebuildAction::StepIncremental;
        }

        self.timer_secs += dt_secs;
        if self.timer_secs < self.interval_secs {
            return RebuildAction::Idle;
        }
        self.timer_secs = 0.0;
        match self.mode {
            RebuildMode::Incremental => RebuildAction::StartIncremental,
            RebuildMode::Full => RebuildAction::RunFull,
        }
    }
}
