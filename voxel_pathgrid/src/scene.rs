// In-memory environment made of axis-aligned box colliders.
//
// `BoxScene` implements `Environment` without a physics engine, for tests,
// benchmarks, and hosts whose level geometry is already box-shaped. Each
// collider carries a layer index; probes only see colliders whose layer is
// in the query mask.
//
// Query semantics:
// - Ground probe: the highest box top at or below the ray origin whose
//   footprint contains the origin's x/z, within `max_distance`. A ray that
//   starts inside a box does not hit that box.
// - Obstacle probe: sphere/box overlap via the closest point on the box.
//   Touching counts as overlap.
// - Line of sight: the segment is tested against every box inflated by the
//   sphere radius (a slightly conservative sphere cast at the box corners).

use crate::probe::Environment;
use crate::types::{LayerMask, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box spanning two corners, in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half)
    }

    pub fn contains_xz(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.z && p.z <= self.max.z
    }

    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
            p.z.clamp(self.min.z, self.max.z),
        )
    }

    pub fn distance_squared(&self, p: Vec3) -> f32 {
        let d = p - self.closest_point(p);
        d.dot(d)
    }

    pub fn inflated(&self, by: f32) -> Self {
        let pad = Vec3::new(by, by, by);
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Slab test: does the segment `from -> to` touch the box?
    pub fn intersects_segment(&self, from: Vec3, to: Vec3) -> bool {
        let axes = from
            .to_array()
            .into_iter()
            .zip((to - from).to_array())
            .zip(self.min.to_array().into_iter().zip(self.max.to_array()));

        let mut t_enter = 0.0f32;
        let mut t_exit = 1.0f32;
        for ((origin, dir), (lo, hi)) in axes {
            if dir.abs() <= f32::EPSILON {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return false;
            }
        }
        true
    }
}

/// A box on a collision layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub bounds: Aabb,
    pub layer: u32,
}

impl Collider {
    fn in_mask(&self, mask: LayerMask) -> bool {
        LayerMask::layer(self.layer).intersects(mask)
    }
}

/// A scene of box colliders.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BoxScene {
    colliders: Vec<Collider>,
}

impl BoxScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a box on `layer`. Returns its index.
    pub fn add_box(&mut self, bounds: Aabb, layer: u32) -> usize {
        self.colliders.push(Collider { bounds, layer });
        self.colliders.len() - 1
    }

    /// Builder form of `add_box`.
    pub fn with_box(mut self, bounds: Aabb, layer: u32) -> Self {
        self.add_box(bounds, layer);
        self
    }

    /// Remove the collider at `index`, shifting later indices down.
    /// Returns `None` if there is no such collider.
    pub fn remove(&mut self, index: usize) -> Option<Collider> {
        (index < self.colliders.len()).then(|| self.colliders.remove(index))
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    pub fn clear(&mut self) {
        self.colliders.clear();
    }
}

impl Environment for BoxScene {
    fn probe_ground_height(&self, origin: Vec3, max_distance: f32, mask: LayerMask) -> Option<f32> {
        self.colliders
            .iter()
            .filter(|c| c.in_mask(mask) && c.bounds.contains_xz(origin))
            .map(|c| c.bounds.max.y)
            .filter(|&top| top <= origin.y && origin.y - top <= max_distance)
            .max_by(f32::total_cmp)
    }

    fn probe_obstacle(&self, point: Vec3, radius: f32, mask: LayerMask) -> bool {
        let r2 = radius * radius;
        self.colliders
            .iter()
            .filter(|c| c.in_mask(mask))
            .any(|c| c.bounds.distance_squared(point) <= r2)
    }

    fn probe_line_of_sight(&self, from: Vec3, to: Vec3, radius: f32, mask: LayerMask) -> bool {
        !self
            .colliders
            .iter()
            .filter(|c| c.in_mask(mask))
            .any(|c| c.bounds.inflated(radius).intersects_segment(from, to))
    }
}
