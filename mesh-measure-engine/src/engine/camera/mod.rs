/// Viewport camera framing, model drag rotation, and gesture tracking.
pub mod viewport_camera;

pub use viewport_camera::{
    DragGesture, ViewportCamera, model_drag_rotation, sync_viewport_camera, track_drag_gesture,
};
