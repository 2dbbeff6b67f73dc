//! Interactive measurement tools.
//!
//! Two measurement modes share one pick pipeline:
//!
//! ```text
//! Button/Key/RPC input
//!   └─> MeasureModeEvent
//!       └─> handle_measure_mode_events()
//!           ├─> MeasureSession::start (buffer cleared, mode set)
//!           ├─> clear_annotations()
//!           └─> readouts reset + RPC notification
//!
//! Left-button release (no drag)
//!   └─> measure_click_system()
//!       ├─> screen → NDC → ray → surface hit
//!       ├─> MeasureSession::on_pick (offset point buffered, marker shown)
//!       └─> on completion: annotations rebuilt as segments,
//!           result published, session reset to no mode
//! ```
//!
//! ## Modes
//!
//! ### Distance (`D` key, "Distance" button, or `tool_selection` RPC)
//! Two picks on the surface; the readout shows the Euclidean distance
//! between the offset pick points and a segment connects them.
//!
//! ### Angle (`A` key, "Angle" button, or `tool_selection` RPC)
//! Three picks; the readout shows the angle at the second pick, and the
//! three points are closed into a triangle whose closing edge is drawn in a
//! distinct colour.
//!
//! Markers shown while picking are replaced by the segments when the
//! measurement completes. Segments are children of the model and rotate with
//! it; markers stay where the surface was when picked.

/// Marker/segment spawning and the live-annotation registry.
pub mod annotations;

/// Measurement session state machine and the pick systems.
pub mod measure;

/// Mode selection events, buttons, and keyboard shortcuts.
pub mod tool_manager;
