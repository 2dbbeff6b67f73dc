use bevy::prelude::*;

use crate::engine::loading::progress::LoadingProgress;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    #[default]
    Loading,
    Ready,
    LoadFailed,
}

/// Transition to Ready once the measured model exists in the scene.
pub fn transition_to_ready(
    loading_progress: Res<LoadingProgress>,
    state: Res<State<AppState>>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if *state.get() == AppState::Loading && loading_progress.model_spawned {
        info!("→ Model ready, transitioning to Ready state");
        next_state.set(AppState::Ready);
    }
}

/// A failed manifest or model load parks the app. Measurement mode changes
/// stay accepted, but picks have nothing to hit.
pub fn transition_on_load_failure(
    loading_progress: Res<LoadingProgress>,
    state: Res<State<AppState>>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if *state.get() == AppState::Loading && loading_progress.load_failed {
        info!("→ Load failed, transitioning to LoadFailed state");
        next_state.set(AppState::LoadFailed);
    }
}
