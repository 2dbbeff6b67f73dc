//! Asset loading systems for the measured model.
//!
//! A two-stage pipeline: the viewer manifest JSON names the model resource,
//! then the STL loader decodes it. Progress flags drive the app state
//! transitions; a failure at either stage parks the app in `LoadFailed`.

/// Viewer manifest loading; kicks off the model load when parsed.
pub mod manifest_loader;

/// Loading progress flags consumed by the state transitions.
pub mod progress;

/// STL asset type and loader.
pub mod stl_loader;
