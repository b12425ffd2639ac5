// A* search over the 26-connected path grid.
//
// Implements A* using a `BinaryHeap` (min-heap via reversed ordering). The
// open-set key is `(f, h, coord)`: lowest total cost first, then lowest
// heuristic, then lexicographic grid coordinate. The coordinate tie-break
// makes the order total, so two runs over the same grid always expand nodes
// in the same order and return the same path.
//
// Improved costs push a fresh heap entry instead of updating in place;
// entries whose recorded g no longer matches the scratch are stale and are
// skipped on pop without counting as an expansion.
//
// Per-node search state lives in `SearchScratch`, a `Vec` parallel to the
// grid's node storage. Each search bumps a generation stamp, and an entry
// with an old stamp reads as untouched, so nothing is cleared between
// searches. Parent links are node indices.
//
// Edge cost and heuristic share one function, `distance()`: a 3D octile
// metric on integer grid deltas (10 per axis step, 14 per planar diagonal,
// 17 per space diagonal). Integer costs keep results reproducible.
//
// The search is bounded by `max_iterations` expansions; past that it gives
// up with `PathError::IterationCapped` rather than returning a partial path.
//
// See also: `neighbors.rs` for the corner-cutting rules, `path_smooth.rs`
// for waypoint simplification, `navigator.rs` which owns the searcher.

use crate::config::{GridConfig, LINE_OF_SIGHT_PROBE_SCALE, LookupPolicy};
use crate::error::PathError;
use crate::grid::NavGrid;
use crate::neighbors::neighbors;
use crate::node::NodeIndex;
use crate::path_smooth::{retrace_positions, simplify_path};
use crate::probe::Environment;
use crate::types::{GridCoord, LayerMask, Vec3};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, warn};

/// Cost of one axis-aligned step.
pub const AXIS_STEP_COST: u32 = 10;
/// Cost of one planar diagonal step (10 * sqrt 2).
pub const PLANAR_DIAGONAL_COST: u32 = 14;
/// Cost of one space diagonal step (10 * sqrt 3).
pub const SPACE_DIAGONAL_COST: u32 = 17;

/// 3D octile distance between two cells.
///
/// With per-axis deltas sorted ascending to `d0 <= d1 <= d2`:
/// `17 * d0 + 14 * (d1 - d0) + 10 * (d2 - d1)`. Used both as the edge cost
/// between neighbors and as the heuristic toward the target.
pub fn distance(a: GridCoord, b: GridCoord) -> u32 {
    let mut d = [
        (a.x - b.x).unsigned_abs(),
        (a.y - b.y).unsigned_abs(),
        (a.z - b.z).unsigned_abs(),
    ];
    d.sort_unstable();
    SPACE_DIAGONAL_COST * d[0]
        + PLANAR_DIAGONAL_COST * (d[1] - d[0])
        + AXIS_STEP_COST * (d[2] - d[1])
}

// ---------------------------------------------------------------------------
// Open set
// ---------------------------------------------------------------------------

/// Entry in the A* open set (min-heap via reversed ordering).
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    f: u32,
    h: u32,
    coord: GridCoord,
    node: NodeIndex,
    /// g at push time, for staleness checks.
    g: u32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest key is "greatest".
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

// ---------------------------------------------------------------------------
// Search scratch
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default)]
struct ScratchEntry {
    stamp: u32,
    g: u32,
    parent: Option<NodeIndex>,
    closed: bool,
}

/// Per-node search state, reused across searches.
#[derive(Clone, Debug, Default)]
pub struct SearchScratch {
    entries: Vec<ScratchEntry>,
    stamp: u32,
}

impl SearchScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new search over `node_count` nodes. Every entry becomes
    /// logically fresh.
    fn begin(&mut self, node_count: usize) {
        if self.entries.len() != node_count {
            self.entries.clear();
            self.entries.resize(node_count, ScratchEntry::default());
        }
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            // Stamp wrapped: old stamps could alias, so clear for real.
            self.entries.fill(ScratchEntry::default());
            self.stamp = 1;
        }
    }

    /// State written during the current search, if any.
    fn get(&self, node: NodeIndex) -> Option<&ScratchEntry> {
        self.entries
            .get(node as usize)
            .filter(|e| e.stamp == self.stamp)
    }

    fn open(&mut self, node: NodeIndex, g: u32, parent: Option<NodeIndex>) {
        self.entries[node as usize] = ScratchEntry {
            stamp: self.stamp,
            g,
            parent,
            closed: false,
        };
    }

    fn close(&mut self, node: NodeIndex) {
        self.entries[node as usize].closed = true;
    }

    /// Follow parent links from `target` back to the start, returned in
    /// start-to-target order.
    fn chain_to(&self, target: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = vec![target];
        let mut current = target;
        while let Some(parent) = self.get(current).and_then(|e| e.parent) {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }
}

// ---------------------------------------------------------------------------
// Searcher
// ---------------------------------------------------------------------------

/// Search parameters taken from `GridConfig`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchSettings {
    pub max_iterations: u32,
    pub lookup_policy: LookupPolicy,
    pub obstacle_mask: LayerMask,
    /// Sphere radius for line-of-sight probes during simplification.
    pub line_of_sight_radius: f32,
}

impl SearchSettings {
    pub fn from_config(config: &GridConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            lookup_policy: config.lookup_policy,
            obstacle_mask: config.obstacle_mask,
            line_of_sight_radius: config.node_radius() * LINE_OF_SIGHT_PROBE_SCALE,
        }
    }
}

/// Node chain produced by a successful search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawPath {
    /// Node indices from start to target, inclusive.
    pub nodes: Vec<NodeIndex>,
    /// Total traversal cost in `distance()` units.
    pub cost: u32,
    /// Nodes expanded (moved to the closed set).
    pub expanded: usize,
}

/// The result of a successful world-space path query.
#[derive(Clone, Debug, PartialEq)]
pub struct PathResult {
    /// Simplified waypoints, start to target. Never empty.
    pub waypoints: Vec<Vec3>,
    pub raw: RawPath,
}

/// A* searcher. Owns reusable scratch; borrow the grid per call.
#[derive(Clone, Debug)]
pub struct PathSearcher {
    settings: SearchSettings,
    scratch: SearchScratch,
    open: BinaryHeap<OpenEntry>,
}

impl PathSearcher {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            scratch: SearchScratch::new(),
            open: BinaryHeap::new(),
        }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn set_max_iterations(&mut self, max_iterations: u32) {
        self.settings.max_iterations = max_iterations;
    }

    /// Resolve both endpoints, search, and simplify the result.
    ///
    /// Fails if either endpoint does not resolve to a node, if the target
    /// node is unwalkable, if no path exists, or if the iteration cap is hit.
    /// The start node may be unwalkable (an agent standing in a blocked
    /// cell can still walk out of it).
    pub fn find_path<E: Environment + ?Sized>(
        &mut self,
        grid: &NavGrid,
        env: &E,
        start_world: Vec3,
        target_world: Vec3,
    ) -> Result<PathResult, PathError> {
        let result = self.find_path_inner(grid, env, start_world, target_world);
        match &result {
            Ok(path) => debug!(
                cost = path.raw.cost,
                expanded = path.raw.expanded,
                raw_nodes = path.raw.nodes.len(),
                waypoints = path.waypoints.len(),
                "path found"
            ),
            Err(err) if err.is_retryable() => {
                warn!(%start_world, %target_world, "pathfinding gave up: {err}")
            }
            Err(err) => warn!(%start_world, %target_world, "no path: {err}"),
        }
        result
    }

    fn find_path_inner<E: Environment + ?Sized>(
        &mut self,
        grid: &NavGrid,
        env: &E,
        start_world: Vec3,
        target_world: Vec3,
    ) -> Result<PathResult, PathError> {
        let policy = self.settings.lookup_policy;
        let start = grid
            .node_from_world_point(start_world, policy)
            .ok_or(PathError::StartOutsideGrid)?;
        let target = grid
            .node_from_world_point(target_world, policy)
            .ok_or(PathError::TargetOutsideGrid)?;
        let target_node = grid.node(target);
        if !target_node.walkable {
            return Err(PathError::TargetUnwalkable {
                target: target_node.coord,
            });
        }

        let raw = self.search(grid, start, target)?;
        let points = retrace_positions(grid, &raw.nodes);
        let radius = self.settings.line_of_sight_radius;
        let mask = self.settings.obstacle_mask;
        let waypoints = simplify_path(&points, |from, to| {
            env.probe_line_of_sight(from, to, radius, mask)
        });
        Ok(PathResult { waypoints, raw })
    }

    /// A* from `start` to `target` over node indices. Indices outside
    /// `grid` fail with `StartOutsideGrid` / `TargetOutsideGrid`.
    pub fn search(
        &mut self,
        grid: &NavGrid,
        start: NodeIndex,
        target: NodeIndex,
    ) -> Result<RawPath, PathError> {
        let node_count = grid.nodes().len();
        if start as usize >= node_count {
            return Err(PathError::StartOutsideGrid);
        }
        if target as usize >= node_count {
            return Err(PathError::TargetOutsideGrid);
        }

        let max_iterations = self.settings.max_iterations;
        let target_coord = grid.node(target).coord;

        self.scratch.begin(node_count);
        self.open.clear();

        let start_coord = grid.node(start).coord;
        let h_start = distance(start_coord, target_coord);
        self.scratch.open(start, 0, None);
        self.open.push(OpenEntry {
            f: h_start,
            h: h_start,
            coord: start_coord,
            node: start,
            g: 0,
        });

        let mut expanded = 0usize;

        while let Some(entry) = self.open.pop() {
            let current = entry.node;
            let Some(state) = self.scratch.get(current) else {
                continue;
            };
            if state.closed || state.g != entry.g {
                continue; // Stale entry.
            }

            expanded += 1;
            if expanded > max_iterations as usize {
                self.open.clear();
                return Err(PathError::IterationCapped { max_iterations });
            }

            self.scratch.close(current);

            if current == target {
                self.open.clear();
                return Ok(RawPath {
                    nodes: self.scratch.chain_to(target),
                    cost: entry.g,
                    expanded,
                });
            }

            let current_g = entry.g;
            for neighbor in neighbors(grid, current) {
                let node = grid.node(neighbor);
                if !node.walkable {
                    continue;
                }
                let known_g = match self.scratch.get(neighbor) {
                    Some(s) if s.closed => continue,
                    Some(s) => Some(s.g),
                    None => None,
                };

                let tentative_g = current_g + distance(entry.coord, node.coord);
                if known_g.is_none_or(|g| tentative_g < g) {
                    let h = distance(node.coord, target_coord);
                    self.scratch.open(neighbor, tentative_g, Some(current));
                    self.open.push(OpenEntry {
                        f: tentative_g + h,
                        h,
                        coord: node.coord,
                        node: neighbor,
                        g: tentative_g,
                    });
                }
            }
        }

        Err(PathError::Exhausted { expanded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridGeometry;
    use crate::scene::BoxScene;

    fn settings(max_iterations: u32) -> SearchSettings {
        SearchSettings {
            max_iterations,
            lookup_policy: LookupPolicy::Direct,
            obstacle_mask: LayerMask::ALL,
            line_of_sight_radius: 0.45,
        }
    }

    fn flat_grid(size: u32, blocked: &[GridCoord]) -> NavGrid {
        NavGrid::from_fn(GridGeometry::with_dims(size, 1, size, 1.0), |c| {
            (!blocked.contains(&c), true)
        })
    }

    fn idx(grid: &NavGrid, x: i32, y: i32, z: i32) -> NodeIndex {
        grid.index(GridCoord::new(x, y, z)).unwrap()
    }

    #[test]
    fn distance_weights() {
        let o = GridCoord::new(0, 0, 0);
        assert_eq!(distance(o, o), 0);
        assert_eq!(distance(o, GridCoord::new(3, 0, 0)), 30);
        assert_eq!(distance(o, GridCoord::new(2, 0, 2)), 28);
        assert_eq!(distance(o, GridCoord::new(1, 1, 1)), 17);
        // d = (1, 2, 5): 17 + 14 + 30
        assert_eq!(distance(o, GridCoord::new(5, -1, 2)), 61);
    }

    #[test]
    fn distance_is_symmetric() {
        let coords = [
            GridCoord::new(0, 0, 0),
            GridCoord::new(4, 1, 7),
            GridCoord::new(-2, 3, 1),
            GridCoord::new(9, 9, 0),
            GridCoord::new(1, 8, 3),
        ];
        for &a in &coords {
            assert_eq!(distance(a, a), 0);
            for &b in &coords {
                assert_eq!(distance(a, b), distance(b, a));
            }
        }
    }

    #[test]
    fn open_entries_pop_by_f_then_h_then_coord() {
        let mut heap = BinaryHeap::new();
        let e = |f: u32, h: u32, x: i32| OpenEntry {
            f,
            h,
            coord: GridCoord::new(x, 0, 0),
            node: x as NodeIndex,
            g: f - h,
        };
        heap.push(e(30, 10, 0));
        heap.push(e(20, 15, 1));
        heap.push(e(20, 5, 3));
        heap.push(e(20, 5, 2));
        let mut order = Vec::new();
        while let Some(open) = heap.pop() {
            order.push(open.coord.x);
        }
        assert_eq!(order, vec![2, 3, 1, 0]);
    }

    #[test]
    fn same_start_and_target() {
        let grid = flat_grid(3, &[]);
        let mut searcher = PathSearcher::new(settings(100));
        let a = idx(&grid, 1, 0, 1);
        let path = searcher.search(&grid, a, a).unwrap();
        assert_eq!(path.nodes, vec![a]);
        assert_eq!(path.cost, 0);
        assert_eq!(path.expanded, 1);
    }

    #[test]
    fn planar_diagonal_costs_four_diagonal_steps() {
        let grid = flat_grid(5, &[]);
        let mut searcher = PathSearcher::new(settings(1000));
        let path = searcher
            .search(&grid, idx(&grid, 0, 0, 0), idx(&grid, 4, 0, 4))
            .unwrap();
        assert_eq!(path.nodes.len(), 5);
        assert_eq!(path.cost, 4 * PLANAR_DIAGONAL_COST);
    }

    #[test]
    fn space_diagonal_costs_four_triple_steps() {
        let grid = NavGrid::from_fn(GridGeometry::with_dims(5, 5, 5, 1.0), |_| (true, true));
        let mut searcher = PathSearcher::new(settings(1000));
        let path = searcher
            .search(&grid, idx(&grid, 0, 0, 0), idx(&grid, 4, 4, 4))
            .unwrap();
        assert_eq!(path.cost, 4 * SPACE_DIAGONAL_COST);
        assert_eq!(path.nodes.len(), 5);
    }

    #[test]
    fn routes_around_blocked_center() {
        let blocked = GridCoord::new(2, 0, 2);
        let grid = flat_grid(5, &[blocked]);
        let mut searcher = PathSearcher::new(settings(1000));
        let path = searcher
            .search(&grid, idx(&grid, 0, 0, 0), idx(&grid, 4, 0, 4))
            .unwrap();
        let blocked_idx = grid.index(blocked).unwrap();
        assert!(!path.nodes.contains(&blocked_idx));
        assert!(path.cost > 4 * PLANAR_DIAGONAL_COST);
        assert_eq!(*path.nodes.first().unwrap(), idx(&grid, 0, 0, 0));
        assert_eq!(*path.nodes.last().unwrap(), idx(&grid, 4, 0, 4));
    }

    #[test]
    fn consecutive_path_nodes_are_neighbors() {
        let wall: Vec<_> = (1..4).map(|z| GridCoord::new(2, 0, z)).collect();
        let grid = flat_grid(6, &wall);
        let mut searcher = PathSearcher::new(settings(1000));
        let path = searcher
            .search(&grid, idx(&grid, 0, 0, 2), idx(&grid, 5, 0, 2))
            .unwrap();
        for pair in path.nodes.windows(2) {
            let a = grid.node(pair[0]).coord;
            let b = grid.node(pair[1]).coord;
            let moves = neighbors(&grid, pair[0]);
            assert!(moves.contains(&pair[1]), "{a} -> {b} is not a move");
        }
    }

    #[test]
    fn walled_off_target_exhausts() {
        // Wall across x = 2 for the full depth.
        let wall: Vec<GridCoord> = (0..5).map(|z| GridCoord::new(2, 0, z)).collect();
        let grid = flat_grid(5, &wall);
        let mut searcher = PathSearcher::new(settings(1000));
        let err = searcher
            .search(&grid, idx(&grid, 0, 0, 0), idx(&grid, 4, 0, 4))
            .unwrap_err();
        // Ten reachable cells on the start side.
        assert_eq!(err, PathError::Exhausted { expanded: 10 });
    }

    #[test]
    fn iteration_cap_is_distinct_from_exhaustion() {
        let grid = flat_grid(20, &[]);
        let mut searcher = PathSearcher::new(settings(5));
        let err = searcher
            .search(&grid, idx(&grid, 0, 0, 0), idx(&grid, 19, 0, 19))
            .unwrap_err();
        assert_eq!(err, PathError::IterationCapped { max_iterations: 5 });
        assert!(err.is_retryable());

        searcher.set_max_iterations(10_000);
        let retry = searcher.search(&grid, idx(&grid, 0, 0, 0), idx(&grid, 19, 0, 19));
        assert!(retry.is_ok());
    }

    #[test]
    fn indices_from_another_grid_are_rejected() {
        let big = flat_grid(8, &[]);
        let small = flat_grid(3, &[]);
        let mut searcher = PathSearcher::new(settings(1000));
        let far = idx(&big, 7, 0, 7);
        let near = idx(&small, 0, 0, 0);
        assert_eq!(
            searcher.search(&small, far, near),
            Err(PathError::StartOutsideGrid)
        );
        assert_eq!(
            searcher.search(&small, near, far),
            Err(PathError::TargetOutsideGrid)
        );
        // The searcher still works afterwards.
        let corner = idx(&small, 2, 0, 2);
        assert!(searcher.search(&small, near, corner).is_ok());
    }

    #[test]
    fn scratch_from_previous_search_does_not_leak() {
        let mut grid = flat_grid(5, &[]);
        let mut searcher = PathSearcher::new(settings(1000));
        let start = idx(&grid, 0, 0, 0);
        let target = idx(&grid, 4, 0, 4);
        let first = searcher.search(&grid, start, target).unwrap();

        grid.set_walkable(GridCoord::new(2, 0, 2), false);
        let second = searcher.search(&grid, start, target).unwrap();
        assert!(!second.nodes.contains(&idx(&grid, 2, 0, 2)));
        assert!(second.cost > first.cost);

        grid.set_walkable(GridCoord::new(2, 0, 2), true);
        let third = searcher.search(&grid, start, target).unwrap();
        assert_eq!(third, first);
    }

    #[test]
    fn search_is_deterministic() {
        let grid = flat_grid(8, &[GridCoord::new(3, 0, 3), GridCoord::new(4, 0, 4)]);
        let mut a = PathSearcher::new(settings(1000));
        let mut b = PathSearcher::new(settings(1000));
        let start = idx(&grid, 0, 0, 0);
        let target = idx(&grid, 7, 0, 7);
        let first = a.search(&grid, start, target);
        assert_eq!(first, b.search(&grid, start, target));
    }

    #[test]
    fn find_path_rejects_unwalkable_target() {
        let grid = flat_grid(5, &[GridCoord::new(4, 0, 4)]);
        let mut searcher = PathSearcher::new(settings(1000));
        let env = BoxScene::new();
        let geo = *grid.geometry();
        let err = searcher
            .find_path(
                &grid,
                &env,
                geo.lattice_center(GridCoord::new(0, 0, 0)),
                geo.lattice_center(GridCoord::new(4, 0, 4)),
            )
            .unwrap_err();
        assert_eq!(
            err,
            PathError::TargetUnwalkable {
                target: GridCoord::new(4, 0, 4)
            }
        );
    }

    #[test]
    fn find_path_single_node_returns_single_point() {
        let grid = flat_grid(5, &[]);
        let mut searcher = PathSearcher::new(settings(1000));
        let env = BoxScene::new();
        let p = grid.geometry().lattice_center(GridCoord::new(2, 0, 2));
        let target = p + Vec3::new(0.1, 0.0, -0.1);
        let result = searcher.find_path(&grid, &env, p, target).unwrap();
        assert_eq!(result.waypoints, vec![p]);
    }

    #[test]
    fn find_path_straight_diagonal_simplifies_to_endpoints() {
        let grid = flat_grid(5, &[]);
        let mut searcher = PathSearcher::new(settings(1000));
        let env = BoxScene::new();
        let geo = *grid.geometry();
        let start = geo.lattice_center(GridCoord::new(0, 0, 0));
        let end = geo.lattice_center(GridCoord::new(4, 0, 4));
        let result = searcher.find_path(&grid, &env, start, end).unwrap();
        assert_eq!(result.waypoints, vec![start, end]);
        assert_eq!(result.raw.cost, 4 * PLANAR_DIAGONAL_COST);
    }
}
