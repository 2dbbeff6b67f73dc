use bevy::input::mouse::MouseMotion;
use bevy::math::EulerRot;
use bevy::prelude::*;
use bevy::window::CursorLeft;

use constants::render_settings::{DRAG_CLICK_TOLERANCE_PX, DRAG_ROTATE_DEGREES_PER_PX};

use crate::engine::scene::MeasuredModel;

/// Camera framing for the viewport. The camera itself never moves during
/// interaction; dragging rotates the model instead.
#[derive(Resource)]
pub struct ViewportCamera {
    pub focus_point: Vec3,
    pub distance: f32,
}

impl ViewportCamera {
    pub fn with_bounds(min: Vec3, max: Vec3, distance_factor: f32) -> Self {
        let focus_point = (min + max) * 0.5;
        let distance = ((max - min).length() * 0.5 * distance_factor).max(1.0);
        Self {
            focus_point,
            distance,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.focus_point + Vec3::Z * self.distance)
            .looking_at(self.focus_point, Vec3::Y)
    }
}

impl Default for ViewportCamera {
    fn default() -> Self {
        Self {
            focus_point: Vec3::ZERO,
            distance: 10.0,
        }
    }
}

/// Left-button gesture state. A gesture that travels further than the click
/// tolerance becomes a drag, and releasing a drag is not a pick.
#[derive(Resource, Default)]
pub struct DragGesture {
    pressed: bool,
    travelled_px: f32,
    dragged: bool,
}

impl DragGesture {
    pub fn begin(&mut self) {
        self.pressed = true;
        self.travelled_px = 0.0;
        self.dragged = false;
    }

    pub fn track(&mut self, delta: Vec2) {
        if !self.pressed {
            return;
        }
        self.travelled_px += delta.length();
        if self.travelled_px > DRAG_CLICK_TOLERANCE_PX {
            self.dragged = true;
        }
    }

    /// End the gesture; true when its release counts as a click.
    pub fn finish(&mut self) -> bool {
        let was_click = self.pressed && !self.dragged;
        self.cancel();
        was_click
    }

    pub fn cancel(&mut self) {
        self.pressed = false;
        self.travelled_px = 0.0;
        self.dragged = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.pressed && self.dragged
    }
}

/// Track the left-button gesture from press through motion to cursor-leave.
pub fn track_drag_gesture(
    mut gesture: ResMut<DragGesture>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut cursor_left: EventReader<CursorLeft>,
) {
    if mouse_button.just_pressed(MouseButton::Left) {
        gesture.begin();
    }
    let delta: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();
    if delta != Vec2::ZERO {
        gesture.track(delta);
    }
    if !cursor_left.is_empty() {
        cursor_left.clear();
        gesture.cancel();
    }
}

/// Dragging with the left button spins the model itself: pixel deltas become
/// Euler increments premultiplied onto the model's quaternion, so the model
/// turns in screen space whatever its current orientation.
pub fn model_drag_rotation(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut models: Query<&mut Transform, With<MeasuredModel>>,
) {
    let delta: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();
    if !mouse_button.pressed(MouseButton::Left) || delta == Vec2::ZERO {
        return;
    }
    let Ok(mut transform) = models.single_mut() else {
        return;
    };
    let increment = Quat::from_euler(
        EulerRot::XYZ,
        (delta.y * DRAG_ROTATE_DEGREES_PER_PX).to_radians(),
        (delta.x * DRAG_ROTATE_DEGREES_PER_PX).to_radians(),
        0.0,
    );
    transform.rotation = increment * transform.rotation;
}

/// Keep the render camera on the framing held by `ViewportCamera`.
pub fn sync_viewport_camera(
    viewport_camera: Res<ViewportCamera>,
    mut cameras: Query<&mut Transform, With<Camera3d>>,
) {
    if !viewport_camera.is_changed() {
        return;
    }
    let Ok(mut transform) = cameras.single_mut() else {
        return;
    };
    *transform = viewport_camera.transform();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_click_finishes_as_a_click() {
        let mut gesture = DragGesture::default();
        gesture.begin();
        assert!(gesture.finish());
    }

    #[test]
    fn motion_within_tolerance_still_clicks() {
        let mut gesture = DragGesture::default();
        gesture.begin();
        gesture.track(Vec2::new(1.0, 1.0));
        assert!(gesture.finish());
    }

    #[test]
    fn travel_past_tolerance_becomes_a_drag() {
        let mut gesture = DragGesture::default();
        gesture.begin();
        gesture.track(Vec2::new(DRAG_CLICK_TOLERANCE_PX + 1.0, 0.0));
        assert!(gesture.is_dragging());
        assert!(!gesture.finish());
    }

    #[test]
    fn accumulated_travel_counts() {
        let mut gesture = DragGesture::default();
        gesture.begin();
        for _ in 0..10 {
            gesture.track(Vec2::new(1.0, 0.0));
        }
        assert!(!gesture.finish());
    }

    #[test]
    fn cursor_leave_cancels_the_gesture() {
        let mut gesture = DragGesture::default();
        gesture.begin();
        gesture.cancel();
        assert!(!gesture.finish());
    }

    #[test]
    fn motion_without_a_press_is_ignored() {
        let mut gesture = DragGesture::default();
        gesture.track(Vec2::new(100.0, 0.0));
        assert!(!gesture.is_dragging());
        assert!(!gesture.finish());
    }

    #[test]
    fn framing_looks_at_the_bounds_centre() {
        let camera = ViewportCamera::with_bounds(Vec3::splat(-1.0), Vec3::splat(1.0), 2.5);
        assert_eq!(camera.focus_point, Vec3::ZERO);
        let transform = camera.transform();
        assert!(transform.translation.z > 0.0);
    }
}
