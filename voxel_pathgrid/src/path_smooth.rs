// Path post-processing: node chain to simplified waypoints.
//
// `retrace_positions()` turns a start-to-target node chain into world
// positions. `simplify_path()` then drops interior points that lie on a
// straight run: a point is kept when the direction into it differs from the
// direction out of it, or when the caller's line-of-sight probe reports no
// clear line from the last kept waypoint to the point after it. The first
// and last points are always kept, unchanged.
//
// Directions are compared in world space because ground-following columns
// give cells on uneven terrain different heights.

use crate::grid::NavGrid;
use crate::node::NodeIndex;
use crate::types::Vec3;

/// Tolerance when comparing unit direction vectors.
const DIRECTION_EPSILON: f32 = 1e-4;

/// World positions of `nodes`, in order.
pub fn retrace_positions(grid: &NavGrid, nodes: &[NodeIndex]) -> Vec<Vec3> {
    nodes
        .iter()
        .map(|&index| grid.node(index).world_position)
        .collect()
}

/// Collapse straight runs in `points`.
///
/// `line_of_sight(from, to)` must return true when the straight line between
/// the two points is unobstructed. It is only consulted for points that lie
/// on a straight run.
pub fn simplify_path(
    points: &[Vec3],
    mut line_of_sight: impl FnMut(Vec3, Vec3) -> bool,
) -> Vec<Vec3> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut simplified = Vec::with_capacity(points.len());
    simplified.push(points[0]);

    for i in 1..last {
        let dir_in = (points[i] - points[i - 1]).normalized();
        let dir_out = (points[i + 1] - points[i]).normalized();
        let turns = !dir_in.approx_eq(dir_out, DIRECTION_EPSILON);

        let anchor = simplified[simplified.len() - 1];
        let keep = turns || !line_of_sight(anchor, points[i + 1]);
        if keep {
            simplified.push(points[i]);
        }
    }

    simplified.push(points[last]);
    simplified
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3::new(x, y, z)
    }

    #[test]
    fn short_paths_pass_through() {
        assert!(simplify_path(&[], |_, _| true).is_empty());
        let one = [p(1.0, 0.0, 1.0)];
        assert_eq!(simplify_path(&one, |_, _| true), one.to_vec());
        let two = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)];
        assert_eq!(simplify_path(&two, |_, _| true), two.to_vec());
    }

    #[test]
    fn straight_run_collapses_to_endpoints() {
        let points: Vec<Vec3> = (0..6).map(|i| p(i as f32, 0.0, i as f32)).collect();
        let out = simplify_path(&points, |_, _| true);
        assert_eq!(out, vec![points[0], points[5]]);
    }

    #[test]
    fn keeps_turning_points() {
        let points = [
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(2.0, 0.0, 0.0),
            p(2.0, 0.0, 1.0),
            p(2.0, 0.0, 2.0),
        ];
        let out = simplify_path(&points, |_, _| true);
        assert_eq!(out, vec![points[0], points[2], points[4]]);
    }

    #[test]
    fn blocked_line_of_sight_keeps_straight_points() {
        let points: Vec<Vec3> = (0..4).map(|i| p(i as f32, 0.0, 0.0)).collect();
        let out = simplify_path(&points, |_, _| false);
        assert_eq!(out, points);
    }

    #[test]
    fn line_of_sight_checked_from_last_kept_point() {
        let points: Vec<Vec3> = (0..5).map(|i| p(i as f32, 0.0, 0.0)).collect();
        let mut probes = Vec::new();
        // Sight from the start reaches at most x = 2.
        let out = simplify_path(&points, |from, to| {
            probes.push((from.x, to.x));
            to.x - from.x <= 2.0
        });
        assert_eq!(out, vec![points[0], points[2], points[4]]);
        assert_eq!(probes, vec![(0.0, 2.0), (0.0, 3.0), (2.0, 4.0)]);
    }

    #[test]
    fn endpoints_always_preserved() {
        let points = [
            p(0.0, 0.3, 0.0),
            p(0.4, 0.5, 0.4),
            p(0.8, 0.2, 0.8),
            p(1.2, 0.2, 0.8),
        ];
        for los in [true, false] {
            let out = simplify_path(&points, |_, _| los);
            assert_eq!(out.first(), points.first());
            assert_eq!(out.last(), points.last());
        }
    }
}
