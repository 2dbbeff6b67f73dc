//! Frame-tagged measurement geometry.
//!
//! Picked points live in one of two frames: the scene-fixed world frame, or
//! the measured model's own frame, which the user rotates by dragging. The
//! two are distinct types, so passing a point from the wrong frame into a
//! measurement function is a compile error; `to_local` is the only crossing
//! point between them.

use std::marker::PhantomData;

use bevy::prelude::*;

/// Coordinate frame marker, implemented by the uninhabited frame types.
pub trait Frame {}

/// The scene-fixed frame.
pub enum WorldFrame {}
impl Frame for WorldFrame {}

/// The measured model's own frame.
pub enum LocalFrame {}
impl Frame for LocalFrame {}

/// A position tagged with the frame it is expressed in.
pub struct FramePoint<F: Frame> {
    v: Vec3,
    _frame: PhantomData<F>,
}

pub type WorldPoint = FramePoint<WorldFrame>;
pub type LocalPoint = FramePoint<LocalFrame>;

impl<F: Frame> FramePoint<F> {
    pub const fn new(v: Vec3) -> Self {
        Self {
            v,
            _frame: PhantomData,
        }
    }

    pub const fn as_vec3(&self) -> Vec3 {
        self.v
    }
}

impl<F: Frame> Clone for FramePoint<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: Frame> Copy for FramePoint<F> {}

impl<F: Frame> PartialEq for FramePoint<F> {
    fn eq(&self, other: &Self) -> bool {
        self.v == other.v
    }
}

impl<F: Frame> std::fmt::Debug for FramePoint<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.v.x, self.v.y, self.v.z)
    }
}

/// Arms shorter than this make an angle undefined.
const DEGENERATE_ARM_EPSILON: f32 = 1.0e-12;

/// Nudge a world point off the surface along the (unit) normal.
pub fn offset_along_normal(point: WorldPoint, normal: Vec3, distance: f32) -> WorldPoint {
    WorldPoint::new(point.as_vec3() + normal * distance)
}

/// Express a world point in the model's frame through the inverse of the
/// model's current transform. Recomputed per call: the transform changes
/// whenever the user drags the model between picks.
pub fn to_local(point: WorldPoint, model_transform: &GlobalTransform) -> LocalPoint {
    let inverse = model_transform.compute_matrix().inverse();
    LocalPoint::new(inverse.transform_point3(point.as_vec3()))
}

/// Euclidean distance between two points of the same frame.
pub fn distance<F: Frame>(a: FramePoint<F>, b: FramePoint<F>) -> f32 {
    a.as_vec3().distance(b.as_vec3())
}

/// Angle at `vertex` between the arms towards `a` and `b`, in degrees.
/// `None` when either arm has zero length, in which case the angle is
/// undefined rather than NaN.
pub fn angle_degrees<F: Frame>(
    a: FramePoint<F>,
    vertex: FramePoint<F>,
    b: FramePoint<F>,
) -> Option<f32> {
    let arm_a = a.as_vec3() - vertex.as_vec3();
    let arm_b = b.as_vec3() - vertex.as_vec3();
    if arm_a.length_squared() <= DEGENERATE_ARM_EPSILON
        || arm_b.length_squared() <= DEGENERATE_ARM_EPSILON
    {
        return None;
    }
    Some(arm_a.angle_between(arm_b).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wp(x: f32, y: f32, z: f32) -> WorldPoint {
        WorldPoint::new(Vec3::new(x, y, z))
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = wp(1.0, 2.0, 3.0);
        let b = wp(-4.0, 0.5, 2.0);
        assert_relative_eq!(distance(a, b), distance(b, a));
        assert_relative_eq!(distance(a, a), 0.0);
    }

    #[test]
    fn distance_three_four_five() {
        assert_relative_eq!(distance(wp(0.0, 0.0, 0.0), wp(3.0, 4.0, 0.0)), 5.0);
    }

    #[test]
    fn right_angle_is_ninety_degrees() {
        let angle = angle_degrees(wp(1.0, 0.0, 0.0), wp(0.0, 0.0, 0.0), wp(0.0, 1.0, 0.0));
        assert_relative_eq!(angle.unwrap(), 90.0, epsilon = 1.0e-4);
    }

    #[test]
    fn angle_is_symmetric_in_its_arms() {
        let p1 = wp(2.0, 1.0, 0.5);
        let p2 = wp(0.0, 0.0, 0.0);
        let p3 = wp(-1.0, 3.0, 2.0);
        assert_relative_eq!(
            angle_degrees(p1, p2, p3).unwrap(),
            angle_degrees(p3, p2, p1).unwrap(),
        );
    }

    #[test]
    fn angle_stays_within_half_turn() {
        let triples = [
            (wp(1.0, 0.0, 0.0), wp(0.0, 0.0, 0.0), wp(-1.0, 0.0, 0.0)),
            (wp(1.0, 0.0, 0.0), wp(0.0, 0.0, 0.0), wp(1.0, 0.001, 0.0)),
            (wp(5.0, -2.0, 1.0), wp(1.0, 1.0, 1.0), wp(-3.0, 0.0, 4.0)),
        ];
        for (a, vertex, b) in triples {
            let angle = angle_degrees(a, vertex, b).unwrap();
            assert!((0.0..=180.0).contains(&angle), "angle {angle} out of range");
        }
    }

    #[test]
    fn coincident_arm_yields_undefined_angle() {
        let vertex = wp(1.0, 1.0, 1.0);
        assert_eq!(angle_degrees(vertex, vertex, wp(2.0, 0.0, 0.0)), None);
        assert_eq!(angle_degrees(wp(2.0, 0.0, 0.0), vertex, vertex), None);
    }

    #[test]
    fn equal_offsets_along_parallel_normals_preserve_distance() {
        let normal = Vec3::Z;
        let a = offset_along_normal(wp(0.0, 0.0, 0.0), normal, 0.1);
        let b = offset_along_normal(wp(1.0, 0.0, 0.0), normal, 0.1);
        assert_eq!(a, wp(0.0, 0.0, 0.1));
        assert_eq!(b, wp(1.0, 0.0, 0.1));
        assert_relative_eq!(distance(a, b), 1.0);
    }

    #[test]
    fn to_local_inverts_the_model_rotation() {
        let transform = GlobalTransform::from(Transform::from_rotation(Quat::from_rotation_z(
            std::f32::consts::FRAC_PI_2,
        )));
        let local = to_local(wp(1.0, 0.0, 0.0), &transform);
        let expected = Vec3::new(0.0, -1.0, 0.0);
        assert!((local.as_vec3() - expected).length() < 1.0e-6);
    }

    #[test]
    fn to_local_tracks_the_current_transform() {
        let moved = GlobalTransform::from(Transform::from_translation(Vec3::new(1.0, 1.0, 1.0)));
        let local = to_local(wp(0.0, 0.0, 0.0), &moved);
        assert!((local.as_vec3() - Vec3::splat(-1.0)).length() < 1.0e-6);
    }
}
