use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::loading::progress::LoadingProgress;
use crate::engine::scene::ModelAssets;

/// Viewer configuration as a Bevy asset. Mirrors the JSON structure exactly.
#[derive(Asset, Debug, Clone, Serialize, Deserialize, TypePath, Resource)]
pub struct ViewerManifest {
    /// Asset-relative path of the model file to display.
    pub model_path: String,
    /// Human-readable name shown in the status readout.
    pub display_name: String,
    /// Camera distance as a multiple of the model's bounding radius.
    #[serde(default = "default_camera_distance_factor")]
    pub camera_distance_factor: f32,
}

fn default_camera_distance_factor() -> f32 {
    constants::render_settings::CAMERA_DISTANCE_FACTOR
}

const MANIFEST_PATH: &str = "viewer/manifest.json";

#[derive(Resource, Default)]
pub struct ManifestLoader {
    handle: Option<Handle<ViewerManifest>>,
}

/// Start the loading process.
pub fn start_manifest_load(
    mut manifest_loader: ResMut<ManifestLoader>,
    asset_server: Res<AssetServer>,
) {
    info!("Loading viewer manifest from {}", MANIFEST_PATH);
    manifest_loader.handle = Some(asset_server.load(MANIFEST_PATH));
}

/// Once the manifest is parsed, request the model it names.
pub fn watch_manifest(
    mut loading_progress: ResMut<LoadingProgress>,
    manifest_loader: Res<ManifestLoader>,
    manifests: Res<Assets<ViewerManifest>>,
    mut model_assets: ResMut<ModelAssets>,
    asset_server: Res<AssetServer>,
    mut commands: Commands,
) {
    if loading_progress.manifest_loaded {
        return;
    }
    let Some(ref handle) = manifest_loader.handle else {
        return;
    };
    let Some(manifest) = manifests.get(handle) else {
        return;
    };

    info!(
        "Manifest loaded: \"{}\" from {}",
        manifest.display_name, manifest.model_path
    );
    model_assets.model = Some(asset_server.load(&manifest.model_path));
    commands.insert_resource(manifest.clone());
    loading_progress.manifest_loaded = true;
}
