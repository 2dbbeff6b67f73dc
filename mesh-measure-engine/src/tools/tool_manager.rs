//! Measurement mode selection.
//!
//! Mode changes arrive from three places — UI buttons, keyboard shortcuts
//! (native builds), and RPC requests — and all funnel through
//! `MeasureModeEvent` into one handler, which resets the session,
//! annotations, and readouts as a single step.

use bevy::prelude::*;

use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::annotations::{AnnotationSet, clear_annotations};
use crate::tools::measure::{MeasureMode, MeasureSession};
use crate::{AngleReadout, DistanceReadout};

/// Event fired when a measurement mode is requested.
#[derive(Event)]
pub struct MeasureModeEvent {
    pub mode: MeasureMode,
    pub source: MeasureModeSource,
}

/// Source of a mode request, for logging and conditional logic.
#[derive(Debug, Clone, Copy)]
pub enum MeasureModeSource {
    Ui,
    Keyboard,
    Rpc,
}

/// Marker on a mode button, carrying the mode it triggers.
#[derive(Component)]
pub struct ModeButton(pub MeasureMode);

/// System handling mode selection with full state reset: a start preempts
/// whatever was in progress — points, annotations, and readouts together.
pub fn handle_measure_mode_events(
    mut commands: Commands,
    mut events: EventReader<MeasureModeEvent>,
    mut session: ResMut<MeasureSession>,
    mut annotations: ResMut<AnnotationSet>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut readouts: ParamSet<(
        Query<&mut Text, With<DistanceReadout>>,
        Query<&mut Text, With<AngleReadout>>,
    )>,
) {
    for event in events.read() {
        session.start(event.mode);
        clear_annotations(&mut commands, &mut annotations);
        if let Ok(mut text) = readouts.p0().single_mut() {
            text.0 = "Distance:".to_string();
        }
        if let Ok(mut text) = readouts.p1().single_mut() {
            text.0 = "Angle:".to_string();
        }
        info!(
            "Measurement mode {:?} activated via {:?}",
            event.mode, event.source
        );
        rpc_interface.send_notification(
            "measure_started",
            serde_json::json!({ "mode": event.mode.as_str() }),
        );
    }
}

/// Pressing a mode button requests its mode.
pub fn handle_measure_mode_buttons(
    interactions: Query<(&Interaction, &ModeButton), (Changed<Interaction>, With<Button>)>,
    mut mode_events: EventWriter<MeasureModeEvent>,
) {
    for (interaction, button) in &interactions {
        if *interaction == Interaction::Pressed {
            mode_events.write(MeasureModeEvent {
                mode: button.0,
                source: MeasureModeSource::Ui,
            });
        }
    }
}

/// Keyboard shortcuts for mode selection (native builds only).
#[cfg(not(target_arch = "wasm32"))]
pub fn handle_measure_mode_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut mode_events: EventWriter<MeasureModeEvent>,
) {
    if keyboard.just_pressed(KeyCode::KeyD) {
        mode_events.write(MeasureModeEvent {
            mode: MeasureMode::Distance,
            source: MeasureModeSource::Keyboard,
        });
    }
    if keyboard.just_pressed(KeyCode::KeyA) {
        mode_events.write(MeasureModeEvent {
            mode: MeasureMode::Angle,
            source: MeasureModeSource::Keyboard,
        });
    }
}

/// Mode selection is RPC-driven in browser builds.
#[cfg(target_arch = "wasm32")]
pub fn handle_measure_mode_shortcuts() {}
