// Composition root: one grid, its builder, its scheduler, and a searcher,
// bound to a caller-supplied environment.
//
// `Navigator` is what a host embeds. It owns the `Environment` (the host's
// scene or physics adapter) and everything derived from the config. The
// host calls `tick(dt)` once per frame and `find_path()` whenever an agent
// needs a route; both run to completion on the calling thread.
//
// Construction validates the config and performs an initial full build, so
// a freshly created navigator can answer queries immediately. After that,
// rebuilds happen only through `tick()` (when `auto_update` is on) or an
// explicit `refresh_grid()`.
//
// See also: `builder.rs` for rebuild semantics and `RebuildScheduler`,
// `pathfinding.rs` for the search itself.

use crate::builder::{BuilderSettings, GridBuilder, RebuildAction, RebuildScheduler, StepOutcome};
use crate::config::GridConfig;
use crate::error::{ConfigResult, PathError};
use crate::grid::{GridGeometry, GridStats, NavGrid};
use crate::node::Node;
use crate::pathfinding::{PathResult, PathSearcher, SearchSettings};
use crate::probe::Environment;
use crate::types::Vec3;
use tracing::info;

pub struct Navigator<E: Environment> {
    config: GridConfig,
    env: E,
    grid: NavGrid,
    builder: GridBuilder,
    scheduler: RebuildScheduler,
    searcher: PathSearcher,
}

impl<E: Environment> Navigator<E> {
    /// Validate `config`, then build the grid once against `env`.
    pub fn new(config: GridConfig, env: E) -> ConfigResult<Self> {
        config.validate()?;
        let geometry = GridGeometry::from_config(&config);
        let mut navigator = Self {
            grid: NavGrid::new(geometry),
            builder: GridBuilder::new(BuilderSettings::from_config(&config), &geometry),
            scheduler: RebuildScheduler::from_config(&config),
            searcher: PathSearcher::new(SearchSettings::from_config(&config)),
            config,
            env,
        };
        let stats = navigator.refresh_grid();
        info!(
            size_x = geometry.size_x,
            size_y = geometry.size_y,
            size_z = geometry.size_z,
            walkable = stats.walkable,
            mode = ?navigator.config.rebuild_mode,
            "navigator ready"
        );
        Ok(navigator)
    }

    /// Advance the rebuild schedule by `dt_secs` and run whatever it asks
    /// for. Returns the action taken.
    pub fn tick(&mut self, dt_secs: f32) -> RebuildAction {
        let action = self
            .scheduler
            .tick(dt_secs, self.builder.is_incremental_active());
        match action {
            RebuildAction::Idle => {}
            RebuildAction::RunFull => {
                self.builder.rebuild_full(&mut self.grid, &self.env);
            }
            RebuildAction::StartIncremental => self.builder.begin_incremental(),
            RebuildAction::StepIncremental => {
                self.step_rebuild();
            }
        }
        action
    }

    /// Run one budgeted step of the current incremental pass, if any.
    pub fn step_rebuild(&mut self) -> StepOutcome {
        self.builder
            .step_incremental(&mut self.grid, &self.env, self.config.columns_per_tick)
    }

    /// Start an incremental pass now, independent of the timer.
    pub fn begin_incremental_rebuild(&mut self) {
        self.builder.begin_incremental();
    }

    /// Rebuild the whole grid now, independent of the timer.
    pub fn refresh_grid(&mut self) -> GridStats {
        self.builder.rebuild_full(&mut self.grid, &self.env)
    }

    /// Waypoints from `start` to `target`, or `None` if there is no path.
    /// Failures are logged; use `try_find_path()` for the reason.
    pub fn find_path(&mut self, start: Vec3, target: Vec3) -> Option<Vec<Vec3>> {
        self.try_find_path(start, target).ok().map(|r| r.waypoints)
    }

    pub fn try_find_path(&mut self, start: Vec3, target: Vec3) -> Result<PathResult, PathError> {
        self.searcher.find_path(&self.grid, &self.env, start, target)
    }

    /// The node a world position resolves to under the configured lookup
    /// policy.
    pub fn node_at(&self, world_position: Vec3) -> Option<&Node> {
        self.grid
            .node_from_world_point(world_position, self.config.lookup_policy)
            .map(|i| self.grid.node(i))
    }

    pub fn is_rebuilding(&self) -> bool {
        self.builder.is_incremental_active()
    }

    pub fn set_auto_update(&mut self, enabled: bool) {
        self.config.auto_update = enabled;
        self.scheduler.set_enabled(enabled);
    }

    pub fn grid(&self) -> &NavGrid {
        &self.grid
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    /// Mutable access to the environment. Changes take effect at the next
    /// rebuild of the affected columns.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }
}
