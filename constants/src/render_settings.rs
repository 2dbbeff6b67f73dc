/// Offset applied along the surface normal to every accepted pick, in model
/// units. Lifts markers and segments off the surface so they are not
/// depth-fought by it. Measured values are computed from the offset points.
pub const SURFACE_PICK_OFFSET: f32 = 0.1;

/// Radius of the sphere marking an accepted pick.
pub const PICK_MARKER_RADIUS: f32 = 0.1;

/// Cross-section side length of a measurement segment.
pub const SEGMENT_THICKNESS: f32 = 0.025;

/// Segments between endpoints closer than this are not drawn.
pub const MIN_SEGMENT_LENGTH: f32 = 1.0e-4;

/// Cursor travel in logical pixels above which a left-button gesture counts
/// as a drag. Releasing a drag never dispatches a measurement pick.
pub const DRAG_CLICK_TOLERANCE_PX: f32 = 4.0;

/// Model rotation per pixel of drag travel.
pub const DRAG_ROTATE_DEGREES_PER_PX: f32 = 1.0;

/// Camera distance as a multiple of the model's bounding radius.
pub const CAMERA_DISTANCE_FACTOR: f32 = 2.5;

// Annotation colours, sRGB components.
pub const PICK_MARKER_COLOR: [f32; 3] = [1.0, 0.0, 0.0];
pub const SEGMENT_COLOR: [f32; 3] = [0.0, 0.0, 1.0];
/// Closing edge of an angle triangle.
pub const CLOSING_SEGMENT_COLOR: [f32; 3] = [0.0, 1.0, 0.0];
pub const MODEL_COLOR: [f32; 3] = [0.333, 0.333, 0.333];
