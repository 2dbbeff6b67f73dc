//! Measurement modes and the pick state machine.
//!
//! `MeasureSession` owns the active mode and the buffered pick points; its
//! transition methods are plain functions returning effect values, so the
//! machine is testable with no renderer behind it. The systems below wire it
//! to clicks, annotations, readouts, and RPC notifications.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use serde::{Deserialize, Serialize};

use constants::render_settings::{CLOSING_SEGMENT_COLOR, SEGMENT_COLOR, SURFACE_PICK_OFFSET};

use crate::engine::camera::DragGesture;
use crate::engine::geometry::{self, LocalPoint, WorldPoint};
use crate::engine::loading::stl_loader::StlModel;
use crate::engine::picking::{self, SurfaceHit};
use crate::engine::scene::{MeasuredModel, ModelAssets};
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::annotations::{self, AnnotationSet};
use crate::{AngleReadout, DistanceReadout};

/// Active measurement mode. Exactly one at a time; decides how many picks
/// complete a measurement and which result is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureMode {
    #[default]
    None,
    Distance,
    Angle,
}

impl MeasureMode {
    /// Picks required to complete a measurement in this mode.
    pub fn required_points(self) -> usize {
        match self {
            MeasureMode::None => 0,
            MeasureMode::Distance => 2,
            MeasureMode::Angle => 3,
        }
    }

    /// Convert string identifier to mode for RPC compatibility.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "distance" => Some(Self::Distance),
            "angle" => Some(Self::Angle),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MeasureMode::None => "none",
            MeasureMode::Distance => "distance",
            MeasureMode::Angle => "angle",
        }
    }
}

/// Scalar outcome of a completed measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureValue {
    /// Point-to-point distance, model units.
    Distance(f32),
    /// Included angle at the middle pick, degrees.
    Angle(f32),
    /// Angle requested over a degenerate vertex (coincident picks).
    Undefined,
}

/// A completed measurement and the world-frame offset picks it came from.
/// Replaced wholesale by the next completion; never accumulated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    pub id: u32,
    pub mode: MeasureMode,
    pub points: Vec<[f32; 3]>,
    pub value: MeasureValue,
}

/// What a pick did to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickEffect {
    /// No mode active; the pick was ignored.
    Ignored,
    /// The pick was buffered; a marker belongs at the offset point.
    Buffered(WorldPoint),
    /// The pick filled the buffer; the measurement is ready to complete.
    Completed,
}

/// Owns the active mode and the in-progress pick buffer.
#[derive(Resource, Default)]
pub struct MeasureSession {
    mode: MeasureMode,
    buffer: Vec<WorldPoint>,
    next_id: u32,
    current: Option<Measurement>,
}

impl MeasureSession {
    pub fn mode(&self) -> MeasureMode {
        self.mode
    }

    pub fn buffered_points(&self) -> &[WorldPoint] {
        &self.buffer
    }

    pub fn current(&self) -> Option<&Measurement> {
        self.current.as_ref()
    }

    /// Enter a measurement mode, dropping any in-progress points and the
    /// previously completed measurement. Either mode preempts the other.
    pub fn start(&mut self, mode: MeasureMode) {
        self.mode = mode;
        self.buffer.clear();
        self.current = None;
    }

    pub fn start_distance(&mut self) {
        self.start(MeasureMode::Distance);
    }

    pub fn start_angle(&mut self) {
        self.start(MeasureMode::Angle);
    }

    /// Feed one surface hit. The hit point is lifted off the surface along
    /// its normal before buffering; the offset points are what get measured.
    pub fn on_pick(&mut self, hit: SurfaceHit) -> PickEffect {
        if self.mode == MeasureMode::None {
            return PickEffect::Ignored;
        }
        let offset = geometry::offset_along_normal(hit.position, hit.normal, SURFACE_PICK_OFFSET);
        self.buffer.push(offset);
        if self.buffer.len() < self.mode.required_points() {
            return PickEffect::Buffered(offset);
        }
        PickEffect::Completed
    }

    /// Finish the measurement from the buffered picks, expressed in the
    /// model's frame through its current transform. The buffer is cleared
    /// and the mode reset in the same step, so no other handler ever sees a
    /// full buffer with a live mode.
    pub fn complete(&mut self, model_transform: &GlobalTransform) -> (Measurement, Vec<LocalPoint>) {
        let locals: Vec<LocalPoint> = self
            .buffer
            .iter()
            .map(|point| geometry::to_local(*point, model_transform))
            .collect();
        let value = match self.mode {
            MeasureMode::Distance => {
                MeasureValue::Distance(geometry::distance(locals[0], locals[1]))
            }
            MeasureMode::Angle => match geometry::angle_degrees(locals[0], locals[1], locals[2]) {
                Some(degrees) => MeasureValue::Angle(degrees),
                None => MeasureValue::Undefined,
            },
            // A pick in None mode never reaches completion.
            MeasureMode::None => MeasureValue::Undefined,
        };
        let measurement = Measurement {
            id: self.next_id,
            mode: self.mode,
            points: self.buffer.iter().map(|p| p.as_vec3().to_array()).collect(),
            value,
        };
        self.next_id += 1;
        self.buffer.clear();
        self.mode = MeasureMode::None;
        self.current = Some(measurement.clone());
        (measurement, locals)
    }
}

/// Release of a non-drag left-button gesture dispatches a pick while a
/// measurement mode is active.
pub fn measure_click_system(
    mut commands: Commands,
    mut session: ResMut<MeasureSession>,
    mut gesture: ResMut<DragGesture>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    buttons: Query<&Interaction, With<Button>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    models: Query<(Entity, &GlobalTransform), With<MeasuredModel>>,
    model_assets: Res<ModelAssets>,
    stl_models: Res<Assets<StlModel>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut annotations: ResMut<AnnotationSet>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut readouts: ParamSet<(
        Query<&mut Text, With<DistanceReadout>>,
        Query<&mut Text, With<AngleReadout>>,
    )>,
) {
    if !mouse_button.just_released(MouseButton::Left) {
        return;
    }
    if !gesture.finish() {
        return; // The gesture was a drag; its release is not a pick.
    }
    // Clicks on the mode buttons never double as surface picks.
    if buttons.iter().any(|i| *i != Interaction::None) {
        return;
    }
    if session.mode() == MeasureMode::None {
        return;
    }
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor_pos) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let Ok((model_entity, model_transform)) = models.single() else {
        return;
    };
    let Some(model) = model_assets
        .model
        .as_ref()
        .and_then(|handle| stl_models.get(handle))
    else {
        return;
    };

    let viewport_size = camera
        .logical_viewport_size()
        .unwrap_or_else(|| window.size());
    let ndc = picking::screen_to_ndc(cursor_pos, viewport_size);
    let Some(ray) = picking::viewport_ray(camera, camera_transform, ndc) else {
        return;
    };
    let Some(hit) = picking::raycast_model(ray, model, model_transform) else {
        debug!("Pick at ({:.0}, {:.0}) missed the model", cursor_pos.x, cursor_pos.y);
        return;
    };

    match session.on_pick(hit) {
        PickEffect::Ignored => {}
        PickEffect::Buffered(point) => {
            annotations::spawn_marker(
                &mut commands,
                &mut meshes,
                &mut materials,
                &mut annotations,
                point,
            );
            rpc_interface.send_notification(
                "measure_point_added",
                serde_json::json!({
                    "mode": session.mode().as_str(),
                    "point_count": session.buffered_points().len(),
                    "position": point.as_vec3().to_array(),
                }),
            );
        }
        PickEffect::Completed => {
            // The completing pick never shows a marker: the display is
            // rebuilt as segments only.
            annotations::clear_annotations(&mut commands, &mut annotations);
            let (measurement, locals) = session.complete(model_transform);
            spawn_result_segments(
                &mut commands,
                &mut meshes,
                &mut materials,
                &mut annotations,
                model_entity,
                &measurement,
                &locals,
            );
            publish_result(&measurement, &mut readouts, &mut rpc_interface);
        }
    }
}

/// One segment for a distance, three edges closing a triangle for an angle.
fn spawn_result_segments(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    annotations: &mut AnnotationSet,
    model: Entity,
    measurement: &Measurement,
    locals: &[LocalPoint],
) {
    match measurement.mode {
        MeasureMode::Distance => {
            annotations::spawn_segment(
                commands,
                meshes,
                materials,
                annotations,
                model,
                locals[0],
                locals[1],
                SEGMENT_COLOR,
            );
        }
        MeasureMode::Angle => {
            annotations::spawn_segment(
                commands,
                meshes,
                materials,
                annotations,
                model,
                locals[0],
                locals[1],
                SEGMENT_COLOR,
            );
            annotations::spawn_segment(
                commands,
                meshes,
                materials,
                annotations,
                model,
                locals[1],
                locals[2],
                SEGMENT_COLOR,
            );
            annotations::spawn_segment(
                commands,
                meshes,
                materials,
                annotations,
                model,
                locals[2],
                locals[0],
                CLOSING_SEGMENT_COLOR,
            );
        }
        MeasureMode::None => {}
    }
}

fn publish_result(
    measurement: &Measurement,
    readouts: &mut ParamSet<(
        Query<&mut Text, With<DistanceReadout>>,
        Query<&mut Text, With<AngleReadout>>,
    )>,
    rpc_interface: &mut WebRpcInterface,
) {
    match measurement.value {
        MeasureValue::Distance(units) => {
            info!("Distance measured: {units:.2} units");
            if let Ok(mut text) = readouts.p0().single_mut() {
                text.0 = format!("Distance: {units:.2} units");
            }
        }
        MeasureValue::Angle(degrees) => {
            info!("Angle measured: {degrees:.2} degrees");
            if let Ok(mut text) = readouts.p1().single_mut() {
                text.0 = format!("Angle: {degrees:.2} degrees");
            }
        }
        MeasureValue::Undefined => {
            debug!("Angle undefined: coincident picks");
            if let Ok(mut text) = readouts.p1().single_mut() {
                text.0 = "Angle: --".to_string();
            }
        }
    }
    let scalar = match measurement.value {
        MeasureValue::Distance(v) | MeasureValue::Angle(v) => Some(v),
        MeasureValue::Undefined => None,
    };
    rpc_interface.send_notification(
        "measure_completed",
        serde_json::json!({
            "id": measurement.id,
            "mode": measurement.mode.as_str(),
            "points": measurement.points,
            "value": scalar,
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hit(x: f32, y: f32, z: f32) -> SurfaceHit {
        SurfaceHit {
            position: WorldPoint::new(Vec3::new(x, y, z)),
            normal: Vec3::Z,
        }
    }

    #[test]
    fn picks_without_a_mode_are_ignored() {
        let mut session = MeasureSession::default();
        assert_eq!(session.on_pick(hit(1.0, 2.0, 3.0)), PickEffect::Ignored);
        assert!(session.buffered_points().is_empty());
    }

    #[test]
    fn picks_are_offset_along_the_normal_before_buffering() {
        let mut session = MeasureSession::default();
        session.start_distance();
        let PickEffect::Buffered(point) = session.on_pick(hit(1.0, 2.0, 3.0)) else {
            panic!("first pick should buffer");
        };
        assert_eq!(point, WorldPoint::new(Vec3::new(1.0, 2.0, 3.1)));
    }

    #[test]
    fn distance_completes_on_the_second_pick() {
        let mut session = MeasureSession::default();
        session.start_distance();
        assert!(matches!(
            session.on_pick(hit(0.0, 0.0, 0.0)),
            PickEffect::Buffered(_)
        ));
        assert_eq!(session.on_pick(hit(3.0, 4.0, 0.0)), PickEffect::Completed);

        let (measurement, locals) = session.complete(&GlobalTransform::IDENTITY);
        let MeasureValue::Distance(units) = measurement.value else {
            panic!("expected a distance value");
        };
        assert_relative_eq!(units, 5.0);
        assert_eq!(locals.len(), 2);
        assert!(session.buffered_points().is_empty());
        assert_eq!(session.mode(), MeasureMode::None);
    }

    #[test]
    fn angle_completes_on_the_third_pick_at_ninety_degrees() {
        let mut session = MeasureSession::default();
        session.start_angle();
        session.on_pick(hit(1.0, 0.0, 0.0));
        session.on_pick(hit(0.0, 0.0, 0.0));
        assert_eq!(session.on_pick(hit(0.0, 1.0, 0.0)), PickEffect::Completed);

        let (measurement, _) = session.complete(&GlobalTransform::IDENTITY);
        let MeasureValue::Angle(degrees) = measurement.value else {
            panic!("expected an angle value");
        };
        assert_relative_eq!(degrees, 90.0, epsilon = 1.0e-3);
    }

    #[test]
    fn coincident_angle_picks_complete_as_undefined() {
        let mut session = MeasureSession::default();
        session.start_angle();
        session.on_pick(hit(0.0, 0.0, 0.0));
        session.on_pick(hit(0.0, 0.0, 0.0));
        session.on_pick(hit(1.0, 0.0, 0.0));
        let (measurement, _) = session.complete(&GlobalTransform::IDENTITY);
        assert_eq!(measurement.value, MeasureValue::Undefined);
        assert_eq!(session.mode(), MeasureMode::None);
    }

    #[test]
    fn starting_a_mode_clears_partial_points_of_the_other() {
        let mut session = MeasureSession::default();
        session.start_distance();
        session.on_pick(hit(0.0, 0.0, 0.0));
        session.start_angle();
        assert!(session.buffered_points().is_empty());
        assert_eq!(session.mode(), MeasureMode::Angle);
        // Still needs all three angle picks.
        assert!(matches!(
            session.on_pick(hit(0.0, 0.0, 0.0)),
            PickEffect::Buffered(_)
        ));
    }

    #[test]
    fn restarting_the_same_mode_also_resets() {
        let mut session = MeasureSession::default();
        session.start_distance();
        session.on_pick(hit(0.0, 0.0, 0.0));
        session.start_distance();
        assert!(session.buffered_points().is_empty());
    }

    #[test]
    fn after_completion_picks_are_ignored_until_restarted() {
        let mut session = MeasureSession::default();
        session.start_distance();
        session.on_pick(hit(0.0, 0.0, 0.0));
        session.on_pick(hit(1.0, 0.0, 0.0));
        session.complete(&GlobalTransform::IDENTITY);
        assert_eq!(session.on_pick(hit(5.0, 5.0, 5.0)), PickEffect::Ignored);
    }

    #[test]
    fn completion_uses_the_model_transform_at_completion_time() {
        let mut session = MeasureSession::default();
        session.start_distance();
        session.on_pick(hit(0.0, 0.0, 0.0));
        session.on_pick(hit(3.0, 4.0, 0.0));
        // Distance is invariant under the rigid transform applied between
        // the picks and the completion.
        let moved = GlobalTransform::from(Transform::from_translation(Vec3::new(7.0, -2.0, 1.0)));
        let (measurement, locals) = session.complete(&moved);
        let MeasureValue::Distance(units) = measurement.value else {
            panic!("expected a distance value");
        };
        assert_relative_eq!(units, 5.0, epsilon = 1.0e-4);
        assert!((locals[0].as_vec3() - Vec3::new(-7.0, 2.0, -0.9)).length() < 1.0e-5);
    }

    #[test]
    fn completed_measurement_is_kept_until_the_next_mode_start() {
        let mut session = MeasureSession::default();
        session.start_distance();
        session.on_pick(hit(0.0, 0.0, 0.0));
        session.on_pick(hit(1.0, 0.0, 0.0));
        session.complete(&GlobalTransform::IDENTITY);
        assert!(session.current().is_some());
        session.start_angle();
        assert!(session.current().is_none());
    }

    #[test]
    fn measurement_ids_increase() {
        let mut session = MeasureSession::default();
        for _ in 0..2 {
            session.start_distance();
            session.on_pick(hit(0.0, 0.0, 0.0));
            session.on_pick(hit(1.0, 0.0, 0.0));
            session.complete(&GlobalTransform::IDENTITY);
        }
        assert_eq!(session.current().unwrap().id, 1);
    }
}
