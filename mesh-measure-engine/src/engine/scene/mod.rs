//! Scene construction for the measured model.
//!
//! Spawns the model entity once its STL asset is decoded, recentres the
//! geometry, frames the camera from the bounds, and watches for load
//! failures from either loading stage.

use bevy::asset::AssetLoadFailedEvent;
use bevy::prelude::*;

use constants::render_settings::{CAMERA_DISTANCE_FACTOR, MODEL_COLOR};

use crate::StatusReadout;
use crate::engine::camera::ViewportCamera;
use crate::engine::loading::manifest_loader::ViewerManifest;
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::loading::stl_loader::StlModel;
use crate::rpc::web_rpc::WebRpcInterface;

/// Marker for the measured model entity. Segments parent to it; ray casts
/// run against it and nothing else.
#[derive(Component)]
pub struct MeasuredModel;

/// Handle to the decoded model, kept for ray casting after spawn.
#[derive(Resource, Default)]
pub struct ModelAssets {
    pub model: Option<Handle<StlModel>>,
}

/// Spawn the model entity as soon as its asset is decoded.
pub fn spawn_model_when_ready(
    mut commands: Commands,
    mut loading_progress: ResMut<LoadingProgress>,
    model_assets: Res<ModelAssets>,
    mut stl_models: ResMut<Assets<StlModel>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    manifest: Option<Res<ViewerManifest>>,
    mut status_readout: Query<&mut Text, With<StatusReadout>>,
) {
    if loading_progress.model_spawned {
        return;
    }
    let Some(ref handle) = model_assets.model else {
        return;
    };
    let Some(model) = stl_models.get_mut(handle) else {
        return;
    };

    // Recentre so drag rotation spins the model around its own middle.
    model.recentre();
    let Some((min, max)) = model.bounds() else {
        return;
    };
    let radius = (max - min).length() * 0.5;

    info!(
        "Model ready: {} triangles, bounding radius {:.2}",
        model.triangle_count(),
        radius
    );

    let [r, g, b] = MODEL_COLOR;
    commands.spawn((
        Mesh3d(meshes.add(model.to_render_mesh())),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(r, g, b),
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::IDENTITY,
        MeasuredModel,
    ));

    let factor = manifest
        .as_ref()
        .map(|m| m.camera_distance_factor)
        .unwrap_or(CAMERA_DISTANCE_FACTOR);
    commands.insert_resource(ViewportCamera::with_bounds(min, max, factor));

    if let Ok(mut text) = status_readout.single_mut() {
        let name = manifest
            .as_ref()
            .map(|m| m.display_name.as_str())
            .unwrap_or("model");
        text.0 = format!("Viewing {name} — drag to rotate, D/A to measure");
    }

    loading_progress.model_spawned = true;
}

/// Surface manifest and model load failures; the viewer stays up with
/// measurement inert.
pub fn watch_load_failures(
    mut model_failures: EventReader<AssetLoadFailedEvent<StlModel>>,
    mut manifest_failures: EventReader<AssetLoadFailedEvent<ViewerManifest>>,
    mut loading_progress: ResMut<LoadingProgress>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut status_readout: Query<&mut Text, With<StatusReadout>>,
) {
    let mut failed: Option<(String, String)> = None;
    for failure in model_failures.read() {
        failed = Some((failure.path.to_string(), failure.error.to_string()));
    }
    for failure in manifest_failures.read() {
        failed = Some((failure.path.to_string(), failure.error.to_string()));
    }
    let Some((path, error)) = failed else {
        return;
    };

    error!("Failed to load {path}: {error}");
    loading_progress.load_failed = true;
    rpc_interface.send_notification(
        "model_load_failed",
        serde_json::json!({ "path": path, "error": error }),
    );
    if let Ok(mut text) = status_readout.single_mut() {
        text.0 = format!("Failed to load {path}");
    }
}
