//! OpenField - headless реализация SpatialQueries
//!
//! Мир = горизонтальные ground patches + сферы/коробки-препятствия.
//! Достаточно для demo binary и тестов (обрывы, стены, пустота под ногами).

use bevy::prelude::*;

use super::{RayHit, SpatialQueries, LAYER_ENVIRONMENT, LAYER_GROUND};

/// Горизонтальный участок пола (XZ прямоугольник на высоте `height`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPatch {
    pub min: Vec2,
    pub max: Vec2,
    pub height: f32,
}

impl GroundPatch {
    fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.min.x && x <= self.max.x && z >= self.min.y && z <= self.max.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Obstacle {
    Sphere { center: Vec3, radius: f32 },
    Box { min: Vec3, max: Vec3 },
}

#[derive(Debug, Clone, Default)]
pub struct OpenField {
    pub ground: Vec<GroundPatch>,
    pub obstacles: Vec<Obstacle>,
}

impl OpenField {
    /// Бесконечный пол на высоте `height`
    pub fn flat(height: f32) -> Self {
        Self {
            ground: vec![GroundPatch {
                min: Vec2::splat(f32::MIN),
                max: Vec2::splat(f32::MAX),
                height,
            }],
            obstacles: Vec::new(),
        }
    }

    /// Пустота: ни пола, ни препятствий
    pub fn void() -> Self {
        Self::default()
    }

    pub fn with_patch(mut self, patch: GroundPatch) -> Self {
        self.ground.push(patch);
        self
    }

    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// Общий cast: луч (radius = 0) или сфера (препятствия раздуваются на radius)
    fn cast(&self, origin: Vec3, radius: f32, direction: Vec3, max_distance: f32, mask: u32) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        let mut best: Option<RayHit> = None;
        let mut consider = |hit: Option<RayHit>| {
            if let Some(hit) = hit {
                if hit.distance <= max_distance && best.map_or(true, |b| hit.distance < b.distance) {
                    best = Some(hit);
                }
            }
        };

        if mask & LAYER_ENVIRONMENT != 0 {
            for obstacle in &self.obstacles {
                let hit = match *obstacle {
                    Obstacle::Sphere { center, radius: r } => ray_sphere(origin, dir, center, r + radius),
                    Obstacle::Box { min, max } => {
                        ray_box(origin, dir, min - Vec3::splat(radius), max + Vec3::splat(radius))
                    }
                };
                consider(hit);
            }
        }

        if mask & LAYER_GROUND != 0 {
            for patch in &self.ground {
                consider(ray_patch(origin, dir, patch, radius));
            }
        }

        best
    }
}

impl SpatialQueries for OpenField {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u32) -> Option<RayHit> {
        self.cast(origin, 0.0, direction, max_distance, mask)
    }

    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: u32,
    ) -> Option<RayHit> {
        self.cast(origin, radius, direction, max_distance, mask)
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: u32) -> bool {
        if mask & LAYER_ENVIRONMENT != 0 {
            let blocked = self.obstacles.iter().any(|obstacle| match *obstacle {
                Obstacle::Sphere { center: c, radius: r } => center.distance(c) < r + radius,
                Obstacle::Box { min, max } => center.clamp(min, max).distance(center) < radius,
            });
            if blocked {
                return true;
            }
        }

        if mask & LAYER_GROUND != 0 {
            return self
                .ground
                .iter()
                .any(|patch| patch.contains(center.x, center.z) && (center.y - patch.height).abs() < radius);
        }

        false
    }

    fn path_distance(&self, from: Vec3, to: Vec3) -> Option<f32> {
        // Нет navmesh - прямая
        Some(from.distance(to))
    }
}

fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<RayHit> {
    let oc = origin - center;
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        // Старт внутри сферы
        return Some(RayHit {
            point: origin,
            distance: 0.0,
            normal: oc.normalize_or_zero(),
        });
    }

    let b = oc.dot(dir);
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let t = -b - discriminant.sqrt();
    if t < 0.0 {
        return None;
    }

    let point = origin + dir * t;
    Some(RayHit {
        point,
        distance: t,
        normal: (point - center).normalize_or_zero(),
    })
}

fn ray_box(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<RayHit> {
    let mut t_min = f32::MIN;
    let mut t_max = f32::MAX;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < 1e-6 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let t1 = (min[axis] - o) / d;
        let t2 = (max[axis] - o) / d;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
    }

    if t_max < t_min.max(0.0) {
        return None;
    }

    let t = t_min.max(0.0);
    Some(RayHit {
        point: origin + dir * t,
        distance: t,
        normal: -dir,
    })
}

fn ray_patch(origin: Vec3, dir: Vec3, patch: &GroundPatch, radius: f32) -> Option<RayHit> {
    // Сфера касается пола когда центр на высоте height + radius
    // Пол односторонний: блокирует только движение вниз
    let surface = patch.height + radius;
    if dir.y > -1e-6 {
        return None;
    }

    let t = (surface - origin.y) / dir.y;
    if t < 0.0 {
        return None;
    }

    let point = origin + dir * t;
    if !patch.contains(point.x, point.z) {
        return None;
    }

    Some(RayHit {
        point: Vec3::new(point.x, patch.height, point.z),
        distance: t,
        normal: Vec3::Y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{segment_clear, step_clear, MASK_LINE_OF_SIGHT};

    #[test]
    fn test_flat_ground_below() {
        let field = OpenField::flat(0.0);
        let hit = field.ground_below(Vec3::new(3.0, 2.0, -4.0), 5.0).expect("ground");
        assert_eq!(hit.point, Vec3::new(3.0, 0.0, -4.0));
        assert_eq!(hit.distance, 2.0);

        // Пол дальше чем probe
        assert!(field.ground_below(Vec3::new(0.0, 10.0, 0.0), 5.0).is_none());
    }

    #[test]
    fn test_void_has_no_ground() {
        let field = OpenField::void();
        assert!(field.ground_below(Vec3::new(0.0, 1.0, 0.0), 1000.0).is_none());
    }

    #[test]
    fn test_patch_edge_is_a_ledge() {
        let field = OpenField::void().with_patch(GroundPatch {
            min: Vec2::new(-5.0, -5.0),
            max: Vec2::new(5.0, 5.0),
            height: 0.0,
        });
        assert!(field.ground_below(Vec3::new(4.0, 1.0, 0.0), 2.0).is_some());
        assert!(field.ground_below(Vec3::new(6.0, 1.0, 0.0), 2.0).is_none());
    }

    #[test]
    fn test_sphere_blocks_line_of_sight() {
        let field = OpenField::flat(0.0).with_obstacle(Obstacle::Sphere {
            center: Vec3::new(5.0, 1.0, 0.0),
            radius: 1.0,
        });
        let from = Vec3::new(0.0, 1.0, 0.0);
        assert!(!segment_clear(&field, from, Vec3::new(10.0, 1.0, 0.0), MASK_LINE_OF_SIGHT));
        assert!(segment_clear(&field, from, Vec3::new(0.0, 1.0, 10.0), MASK_LINE_OF_SIGHT));
    }

    #[test]
    fn test_box_wall_blocks_step() {
        let field = OpenField::flat(0.0).with_obstacle(Obstacle::Box {
            min: Vec3::new(1.0, 0.0, -10.0),
            max: Vec3::new(2.0, 3.0, 10.0),
        });
        let position = Vec3::new(0.0, 1.0, 0.0);
        // 0.4 шаг + 0.5 радиус - упираемся в стену на x = 1
        assert!(!step_clear(&field, position, Vec3::new(0.6, 0.0, 0.0), 0.5));
        assert!(step_clear(&field, position, Vec3::new(0.3, 0.0, 0.0), 0.5));
        assert!(step_clear(&field, position, Vec3::new(-1.0, 0.0, 0.0), 0.5));
    }

    #[test]
    fn test_overlap_sphere() {
        let field = OpenField::void().with_obstacle(Obstacle::Sphere {
            center: Vec3::ZERO,
            radius: 1.0,
        });
        assert!(field.overlap_sphere(Vec3::new(1.5, 0.0, 0.0), 0.6, LAYER_ENVIRONMENT));
        assert!(!field.overlap_sphere(Vec3::new(3.0, 0.0, 0.0), 0.6, LAYER_ENVIRONMENT));
    }
}
