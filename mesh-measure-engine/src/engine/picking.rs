//! Screen-space picking against the measured model.
//!
//! A click becomes a surface point in three steps: pixel coordinates map to
//! normalized device coordinates (Y inverted, using the viewport's current
//! size), the camera turns the NDC coordinate into a world-space ray, and
//! the ray is intersected with the measured model's triangles — and nothing
//! else, so markers and segments never occlude a pick.

use bevy::prelude::*;

use crate::engine::geometry::WorldPoint;
use crate::engine::loading::stl_loader::StlModel;

/// Result of a successful surface ray cast.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceHit {
    pub position: WorldPoint,
    /// Unit surface normal at the hit point, world frame.
    pub normal: Vec3,
}

/// Rays must clear this much distance before a hit counts.
const MIN_HIT_DISTANCE: f32 = 1.0e-6;

/// Determinants below this mean the ray runs parallel to the triangle plane.
const PARALLEL_EPSILON: f32 = 1.0e-8;

/// Map window pixel coordinates to normalized device coordinates.
///
/// Pixel origin is the top-left corner; NDC spans `[-1, 1]` on both axes
/// with +Y up, so the Y axis flips. The size is read per call so the mapping
/// stays correct across window resizes.
pub fn screen_to_ndc(pixel: Vec2, viewport_size: Vec2) -> Vec2 {
    let ndc = (pixel / viewport_size) * 2.0 - Vec2::ONE;
    Vec2::new(ndc.x, -ndc.y)
}

/// World-space ray through an NDC coordinate, from the near plane outward.
pub fn viewport_ray(
    camera: &Camera,
    camera_transform: &GlobalTransform,
    ndc: Vec2,
) -> Option<Ray3d> {
    let ndc_to_world = camera_transform.compute_matrix() * camera.clip_from_view().inverse();
    let near = ndc_to_world.project_point3(ndc.extend(1.0));
    let far = ndc_to_world.project_point3(ndc.extend(f32::EPSILON));
    let direction = Dir3::new(far - near).ok()?;
    Some(Ray3d {
        origin: near,
        direction,
    })
}

/// Cast a world ray against the model's triangles, nearest hit first.
///
/// The ray is expressed in the model's local frame (the triangles never
/// move; the model's transform does), and the winning hit position and face
/// normal go back out through the transform into world space.
pub fn raycast_model(
    ray: Ray3d,
    model: &StlModel,
    model_transform: &GlobalTransform,
) -> Option<SurfaceHit> {
    let matrix = model_transform.compute_matrix();
    let inverse = matrix.inverse();
    let origin = inverse.transform_point3(ray.origin);
    let direction = inverse.transform_vector3(*ray.direction);

    let mut nearest: Option<(f32, usize)> = None;
    for index in 0..model.triangle_count() {
        let [a, b, c] = model.triangle(index);
        if let Some(t) = ray_triangle_hit_t(origin, direction, a, b, c) {
            if nearest.is_none_or(|(best, _)| t < best) {
                nearest = Some((t, index));
            }
        }
    }

    let (t, index) = nearest?;
    let [a, b, c] = model.triangle(index);
    let position = WorldPoint::new(matrix.transform_point3(origin + direction * t));
    let mut normal = matrix
        .transform_vector3((b - a).cross(c - a))
        .normalize_or_zero();
    if normal == Vec3::ZERO {
        return None;
    }
    // A normal pointing away from the viewer would push the offset point
    // under the surface; orient it against the ray.
    if normal.dot(*ray.direction) > 0.0 {
        normal = -normal;
    }
    Some(SurfaceHit { position, normal })
}

/// Möller–Trumbore ray–triangle intersection, returns Some(t) or None.
fn ray_triangle_hit_t(origin: Vec3, direction: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t > MIN_HIT_DISTANCE).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn facing_triangle() -> StlModel {
        // Single triangle in the local XY plane, normal towards +Z.
        StlModel {
            positions: vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            triangles: vec![[0, 1, 2]],
        }
    }

    fn ray(origin: Vec3, towards: Vec3) -> Ray3d {
        Ray3d {
            origin,
            direction: Dir3::new(towards).unwrap(),
        }
    }

    #[test]
    fn ndc_center_and_corners() {
        let size = Vec2::new(800.0, 600.0);
        assert_eq!(screen_to_ndc(Vec2::new(400.0, 300.0), size), Vec2::ZERO);
        assert_eq!(screen_to_ndc(Vec2::ZERO, size), Vec2::new(-1.0, 1.0));
        assert_eq!(screen_to_ndc(size, size), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn ndc_mapping_follows_the_viewport_size() {
        // The same relative cursor position maps identically after a resize.
        let before = screen_to_ndc(Vec2::new(150.0, 100.0), Vec2::new(600.0, 400.0));
        let after = screen_to_ndc(Vec2::new(300.0, 200.0), Vec2::new(1200.0, 800.0));
        assert_eq!(before, after);
        assert_eq!(before, Vec2::new(-0.5, 0.5));
    }

    #[test]
    fn triangle_hit_reports_ray_distance() {
        let t = ray_triangle_hit_t(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::NEG_Z,
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert_relative_eq!(t.unwrap(), 5.0);
    }

    #[test]
    fn triangle_miss_and_parallel_ray() {
        let a = Vec3::new(-1.0, -1.0, 0.0);
        let b = Vec3::new(1.0, -1.0, 0.0);
        let c = Vec3::new(0.0, 1.0, 0.0);
        // Outside the triangle.
        assert_eq!(
            ray_triangle_hit_t(Vec3::new(5.0, 5.0, 5.0), Vec3::NEG_Z, a, b, c),
            None
        );
        // In the triangle plane.
        assert_eq!(
            ray_triangle_hit_t(Vec3::new(0.0, 0.0, 0.5), Vec3::X, a, b, c),
            None
        );
    }

    #[test]
    fn raycast_returns_world_position_and_normal() {
        let model = facing_triangle();
        let transform =
            GlobalTransform::from(Transform::from_translation(Vec3::new(0.0, 0.0, -5.0)));
        let hit = raycast_model(ray(Vec3::ZERO, Vec3::NEG_Z), &model, &transform).unwrap();
        assert!((hit.position.as_vec3() - Vec3::new(0.0, 0.0, -5.0)).length() < 1.0e-5);
        assert!((hit.normal - Vec3::Z).length() < 1.0e-5);
    }

    #[test]
    fn raycast_keeps_the_nearest_of_stacked_triangles() {
        let model = StlModel {
            positions: vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(-1.0, -1.0, 2.0),
                Vec3::new(1.0, -1.0, 2.0),
                Vec3::new(0.0, 1.0, 2.0),
            ],
            triangles: vec![[0, 1, 2], [3, 4, 5]],
        };
        let hit = raycast_model(
            ray(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z),
            &model,
            &GlobalTransform::IDENTITY,
        )
        .unwrap();
        assert_relative_eq!(hit.position.as_vec3().z, 2.0, epsilon = 1.0e-5);
    }

    #[test]
    fn raycast_misses_off_model() {
        let hit = raycast_model(
            ray(Vec3::new(10.0, 10.0, 10.0), Vec3::NEG_Z),
            &facing_triangle(),
            &GlobalTransform::IDENTITY,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn raycast_tracks_model_rotation_and_faces_the_viewer() {
        let model = facing_triangle();
        // Half-turn about Y points the face normal away from the camera; the
        // reported normal still faces the viewer.
        let transform = GlobalTransform::from(Transform::from_rotation(Quat::from_rotation_y(
            std::f32::consts::PI,
        )));
        let hit =
            raycast_model(ray(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z), &model, &transform).unwrap();
        assert!((hit.normal - Vec3::Z).length() < 1.0e-5);
    }
}
