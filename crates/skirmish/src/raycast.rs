//! # Ray / Box Intersection
//!
//! Tanks ask one question of the level geometry: "is there an obstacle between
//! me and that point?" Obstacles are entities whose template type matches
//! [`SimConfig::obstacle_type`](crate::config::SimConfig::obstacle_type); each
//! one contributes an axis-aligned box (template bounds, scaled and moved to
//! the entity's position). Rotation is ignored, as for any AABB.
//!
//! ## The slab test
//!
//! ```text
//!           tmin          tmax
//!   origin ──●────[=========]────▶ direction
//!                 box interval
//! ```
//!
//! For each axis, the ray crosses the two bounding planes at
//! `(plane - origin) / direction`. The latest entry and the earliest exit over
//! all three axes give the interval the ray spends inside the box. The ray hits
//! if that interval is non-empty and not entirely behind the origin.
//!
//! The queries themselves live on [`EntityView`](crate::manager::EntityView)
//! so they work both from the manager and from inside an entity's update.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::math::Vec3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Unit cube centred on the origin.
    pub const UNIT: Self = Self {
        min: Vec3::splat(-0.5),
        max: Vec3::splat(0.5),
    };

    /// Build from two corners in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Scale about the local origin, then translate.
    pub fn scaled_and_moved(&self, scale: Vec3, offset: Vec3) -> Self {
        Self::new(self.min * scale + offset, self.max * scale + offset)
    }

    /// Distances along `ray` at which it enters and leaves the box, or `None`
    /// if the ray misses or the box is entirely behind the origin. `tmin` is
    /// negative when the origin is inside the box.
    pub fn ray_interval(&self, ray: &Ray) -> Option<(f32, f32)> {
        if ray.direction == Vec3::ZERO {
            return None;
        }
        let inv = ray.direction.recip();
        let t1 = (self.min - ray.origin) * inv;
        let t2 = (self.max - ray.origin) * inv;
        let tmin = t1.min(t2).max_element();
        let tmax = t1.max(t2).min_element();
        if tmax < 0.0 || tmin > tmax {
            return None;
        }
        Some((tmin, tmax))
    }
}

/// A half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Normalises `direction`. A zero direction produces a ray that hits nothing.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray from `from` toward `to`, plus the distance between them.
    pub fn between(from: Vec3, to: Vec3) -> (Self, f32) {
        (Self::new(from, to - from), from.distance(to))
    }
}

/// World-space box of an obstacle entity.
pub fn world_bounds(entity: &Entity) -> Aabb {
    let t = entity.transform();
    entity
        .template()
        .bounds()
        .scaled_and_moved(t.scale, t.translation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn building() -> Aabb {
        Aabb::new(
            Vec3::new(-7.36113, -0.148627, -4.34613),
            Vec3::new(5.11745, 11.1836, 5.35663),
        )
    }

    #[test]
    fn ray_through_box_hits() {
        let ray = Ray::new(Vec3::new(-20.0, 1.0, 0.0), Vec3::X);
        let (tmin, tmax) = building().ray_interval(&ray).unwrap();
        assert!((tmin - (20.0 - 7.36113)).abs() < 0.001);
        assert!((tmax - (20.0 + 5.11745)).abs() < 0.001);
    }

    #[test]
    fn box_behind_origin_misses() {
        let ray = Ray::new(Vec3::new(-20.0, 1.0, 0.0), Vec3::NEG_X);
        assert!(building().ray_interval(&ray).is_none());
    }

    #[test]
    fn ray_passing_above_misses() {
        let ray = Ray::new(Vec3::new(-20.0, 20.0, 0.0), Vec3::X);
        assert!(building().ray_interval(&ray).is_none());
    }

    #[test]
    fn origin_inside_box_hits() {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Z);
        let (tmin, tmax) = building().ray_interval(&ray).unwrap();
        assert!(tmin < 0.0 && tmax > 0.0);
    }

    #[test]
    fn unnormalised_direction_is_normalised() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_direction_hits_nothing() {
        let ray = Ray::new(Vec3::ZERO, Vec3::ZERO);
        assert!(Aabb::UNIT.ray_interval(&ray).is_none());
    }

    #[test]
    fn scaled_and_moved_box() {
        let b = Aabb::UNIT.scaled_and_moved(Vec3::splat(4.0), Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(b.min, Vec3::new(8.0, -2.0, -2.0));
        assert_eq!(b.max, Vec3::new(12.0, 2.0, 2.0));
    }
}
