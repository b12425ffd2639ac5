// Environment probe interface and the per-column ground height cache.
//
// The path grid never looks at geometry directly. Everything it knows about
// the world comes through the three queries of the `Environment` trait:
// a downward ground ray, a solid-occupancy sphere test, and a sphere cast
// used for line of sight during path simplification. Hosts implement the
// trait over their physics engine; `scene::BoxScene` is the in-crate
// implementation used by tests and benchmarks.
//
// `GroundHeightCache` memoizes ground rays by `(x, z)` column. It is cleared
// at the start of every full rebuild and every new incremental pass (not per
// column), so a column is probed at most once per pass.
//
// See also: `builder.rs` which drives both, `path_smooth.rs` for the
// line-of-sight consumer.

use crate::types::{LayerMask, Vec3};
use rustc_hash::FxHashMap;

/// Collision queries the grid needs from the host environment.
pub trait Environment {
    /// Cast a ray straight down from `origin` for up to `max_distance`
    /// against colliders in `mask`. Returns the Y coordinate of the first
    /// hit, or `None` if nothing was hit.
    fn probe_ground_height(&self, origin: Vec3, max_distance: f32, mask: LayerMask) -> Option<f32>;

    /// True if a sphere at `point` overlaps any collider in `mask`.
    fn probe_obstacle(&self, point: Vec3, radius: f32, mask: LayerMask) -> bool;

    /// True if a sphere of `radius` swept from `from` to `to` touches no
    /// collider in `mask`.
    fn probe_line_of_sight(&self, from: Vec3, to: Vec3, radius: f32, mask: LayerMask) -> bool;
}

impl<E: Environment + ?Sized> Environment for &E {
    fn probe_ground_height(&self, origin: Vec3, max_distance: f32, mask: LayerMask) -> Option<f32> {
        (**self).probe_ground_height(origin, max_distance, mask)
    }

    fn probe_obstacle(&self, point: Vec3, radius: f32, mask: LayerMask) -> bool {
        (**self).probe_obstacle(point, radius, mask)
    }

    fn probe_line_of_sight(&self, from: Vec3, to: Vec3, radius: f32, mask: LayerMask) -> bool {
        (**self).probe_line_of_sight(from, to, radius, mask)
    }
}

/// Result of a ground probe for one column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GroundSample {
    Ground(f32),
    NoGround,
}

impl GroundSample {
    pub fn height(self) -> Option<f32> {
        match self {
            GroundSample::Ground(h) => Some(h),
            GroundSample::NoGround => None,
        }
    }
}

impl From<Option<f32>> for GroundSample {
    fn from(hit: Option<f32>) -> Self {
        match hit {
            Some(h) => GroundSample::Ground(h),
            None => GroundSample::NoGround,
        }
    }
}

/// Memoized ground heights keyed by `(x, z)` column.
///
/// Lookup-only: iteration order never influences grid contents, so a hash
/// map is safe here.
#[derive(Clone, Debug, Default)]
pub struct GroundHeightCache {
    samples: FxHashMap<(u32, u32), GroundSample>,
    hits: u64,
    misses: u64,
}

impl GroundHeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(columns: usize) -> Self {
        Self {
            samples: FxHashMap::with_capacity_and_hasher(columns, Default::default()),
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached sample for `column`, running `probe` only on a miss.
    pub fn get_or_probe(
        &mut self,
        column: (u32, u32),
        probe: impl FnOnce() -> Option<f32>,
    ) -> GroundSample {
        if let Some(&sample) = self.samples.get(&column) {
            self.hits += 1;
            return sample;
        }
        self.misses += 1;
        let sample = GroundSample::from(probe());
        self.samples.insert(column, sample);
        sample
    }

    pub fn get(&self, column: (u32, u32)) -> Option<GroundSample> {
        self.samples.get(&column).copied()
    }

    /// Forget every sample. Hit/miss counters are kept.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `(hits, misses)` since construction.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
