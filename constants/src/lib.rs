//! Shared tuning constants for the viewer and measurement tools.

pub mod render_settings;
