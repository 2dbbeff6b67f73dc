use bevy::prelude::*;

#[derive(Resource, Default)]
pub struct LoadingProgress {
    pub manifest_loaded: bool,
    pub model_spawned: bool,
    pub load_failed: bool,
}
