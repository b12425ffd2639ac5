// End-to-end scenarios: a Navigator over a BoxScene, driven the way a host
// would drive it (construct, tick, query).
//
// Every scene uses an 8 x 2 x 8 world with 1-unit cells, centered on the
// origin, with a floor whose top sits at the grid's bottom face (y = -1).
// A zero-height walkable band keeps only the bottom layer walkable, so
// paths stay on the floor.

use voxel_pathgrid::builder::RebuildAction;
use voxel_pathgrid::config::{GROUND_LAYER, OBSTACLE_LAYER, RebuildMode};
use voxel_pathgrid::scene::{Aabb, BoxScene};
use voxel_pathgrid::{GridConfig, GridCoord, Navigator, PathError, Vec3};

fn config() -> GridConfig {
    GridConfig {
        world_size: Vec3::new(8.0, 2.0, 8.0),
        node_diameter: 1.0,
        walkable_height: 0.0,
        rebuild_mode: RebuildMode::Incremental,
        columns_per_tick: 8,
        ..GridConfig::default()
    }
}

fn floor() -> BoxScene {
    BoxScene::new().with_box(
        Aabb::new(Vec3::new(-4.0, -2.0, -4.0), Vec3::new(4.0, -1.0, 4.0)),
        GROUND_LAYER,
    )
}

/// A wall along z through the middle of the floor, from z = -4 to `z_end`.
fn wall(z_end: f32) -> Aabb {
    Aabb::new(Vec3::new(-0.4, -1.0, -4.0), Vec3::new(0.4, 0.5, z_end))
}

/// World position on the floor above cell `(x, z)`.
fn floor_point(x: i32, z: i32) -> Vec3 {
    Vec3::new(x as f32 - 3.5, -1.0, z as f32 - 3.5)
}

#[test]
fn open_floor_diagonal_collapses_to_endpoints() {
    let mut nav = Navigator::new(config(), floor()).unwrap();
    let start = floor_point(0, 0);
    let target = floor_point(7, 7);
    let path = nav.find_path(start, target).unwrap();
    assert_eq!(path, vec![start, target]);
}

#[test]
fn wall_forces_detour_through_gap() {
    // Gap only in the last row (z = 7).
    let scene = floor().with_box(wall(2.0), OBSTACLE_LAYER);
    let mut nav = Navigator::new(config(), scene).unwrap();
    assert!(!nav.grid().is_walkable(GridCoord::new(3, 0, 6)));
    assert!(nav.grid().is_walkable(GridCoord::new(3, 0, 7)));

    let start = floor_point(0, 0);
    let target = floor_point(7, 0);
    let result = nav.try_find_path(start, target).unwrap();

    assert_eq!(result.waypoints.first(), Some(&start));
    assert_eq!(result.waypoints.last(), Some(&target));
    let waypoints = &result.waypoints;
    assert!(waypoints.iter().any(|p| p.z >= 3.0), "{waypoints:?}");
    // Straight across would cost 70.
    assert!(result.raw.cost > 70);

    // Every raw step stays on walkable cells.
    for &i in &result.raw.nodes {
        assert!(nav.grid().node(i).walkable);
    }
}

#[test]
fn sealed_wall_exhausts_search() {
    let scene = floor().with_box(wall(4.0), OBSTACLE_LAYER);
    let mut nav = Navigator::new(config(), scene).unwrap();
    let err = nav
        .try_find_path(floor_point(0, 0), floor_point(7, 0))
        .unwrap_err();
    assert!(matches!(err, PathError::Exhausted { .. }));
    assert!(!err.is_retryable());
}

#[test]
fn iteration_cap_gives_up_without_partial_path() {
    let scene = floor().with_box(wall(2.0), OBSTACLE_LAYER);
    let capped = GridConfig {
        max_iterations: 5,
        ..config()
    };
    let mut nav = Navigator::new(capped, scene).unwrap();
    let start = floor_point(0, 0);
    let target = floor_point(7, 0);
    let err = nav.try_find_path(start, target).unwrap_err();
    assert_eq!(err, PathError::IterationCapped { max_iterations: 5 });
    assert!(err.is_retryable());
    assert!(nav.find_path(start, target).is_none());
}

#[test]
fn blocked_target_returns_none() {
    let pillar = Aabb::from_center_size(Vec3::new(2.5, -0.5, 2.5), Vec3::new(0.4, 1.0, 0.4));
    let scene = floor().with_box(pillar, OBSTACLE_LAYER);
    let mut nav = Navigator::new(config(), scene).unwrap();
    let target = floor_point(6, 6);
    assert!(nav.find_path(floor_point(0, 0), target).is_none());
    assert_eq!(
        nav.try_find_path(floor_point(0, 0), target),
        Err(PathError::TargetUnwalkable {
            target: GridCoord::new(6, 0, 6)
        })
    );
}

#[test]
fn path_follows_raised_terrain() {
    // A platform 0.4 above the floor under the x >= 0 half.
    let platform = Aabb::new(Vec3::new(0.0, -1.0, -4.0), Vec3::new(4.0, -0.6, 4.0));
    let scene = floor().with_box(platform, GROUND_LAYER);
    let mut nav = Navigator::new(config(), scene).unwrap();

    let high = nav.grid().get(GridCoord::new(5, 0, 0)).unwrap();
    assert!(high.is_standable());
    assert!((high.world_position.y + 0.6).abs() < 1e-5);

    let start = floor_point(0, 0);
    let target = high.world_position;
    let path = nav.find_path(start, target).unwrap();
    // Start, the last low cell, the first high cell, target.
    assert_eq!(path.len(), 4, "{path:?}");
    assert!(path[1].approx_eq(floor_point(3, 0), 1e-5));
    assert!((path[2].y + 0.6).abs() < 1e-5);
    assert_eq!(path.last(), Some(&target));
}

#[test]
fn incremental_pass_exposes_partial_state() {
    let mut nav = Navigator::new(config(), floor()).unwrap();
    let start = floor_point(0, 0);
    let target = floor_point(7, 0);
    assert!(nav.find_path(start, target).is_some());

    nav.env_mut().add_box(wall(4.0), OBSTACLE_LAYER);
    nav.begin_incremental_rebuild();

    // One step rebuilds only column x = 0; the wall is at x = 3 and 4.
    assert_eq!(nav.tick(0.0), RebuildAction::StepIncremental);
    assert!(nav.is_rebuilding());
    assert!(nav.find_path(start, target).is_some());

    while nav.is_rebuilding() {
        nav.tick(0.0);
    }
    assert!(nav.find_path(start, target).is_none());
}

#[test]
fn navigator_from_json_config() {
    let json = r#"{
        "world_size": { "x": 8.0, "y": 2.0, "z": 8.0 },
        "node_diameter": 1.0,
        "walkable_height": 0.0,
        "rebuild_mode": "Full"
    }"#;
    let config = GridConfig::from_json(json).unwrap();
    let mut nav = Navigator::new(config, floor()).unwrap();
    assert_eq!(nav.grid().stats().walkable, 64);
    let far_corner = floor_point(7, 7);
    assert!(nav.find_path(floor_point(0, 0), far_corner).is_some());
}
