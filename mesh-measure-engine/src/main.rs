use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy::window::PresentMode;
use bevy_common_assets::json::JsonAssetPlugin;

mod engine;
mod rpc;
mod tools;

use engine::{
    camera::{
        DragGesture, ViewportCamera, model_drag_rotation, sync_viewport_camera,
        track_drag_gesture,
    },
    core::app_state::{AppState, transition_on_load_failure, transition_to_ready},
    loading::{
        manifest_loader::{ManifestLoader, ViewerManifest, start_manifest_load, watch_manifest},
        progress::LoadingProgress,
        stl_loader::{StlModel, StlModelLoader},
    },
    scene::{ModelAssets, spawn_model_when_ready, watch_load_failures},
};
use rpc::web_rpc::WebRpcPlugin;
use tools::{
    annotations::AnnotationSet,
    measure::{MeasureMode, MeasureSession, measure_click_system},
    tool_manager::{
        MeasureModeEvent, ModeButton, handle_measure_mode_buttons, handle_measure_mode_events,
        handle_measure_mode_shortcuts,
    },
};

fn main() {
    let mut app = create_app();

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.run();
    }
}

fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        .add_plugins(JsonAssetPlugin::<ViewerManifest>::new(&["json"]))
        .add_plugins(WebRpcPlugin)
        .init_asset::<StlModel>()
        .init_asset_loader::<StlModelLoader>()
        .init_state::<AppState>()
        .insert_resource(ClearColor(Color::WHITE))
        .init_resource::<LoadingProgress>()
        .init_resource::<ManifestLoader>()
        .init_resource::<ModelAssets>()
        .init_resource::<ViewportCamera>()
        .init_resource::<DragGesture>()
        .init_resource::<MeasureSession>()
        .init_resource::<AnnotationSet>()
        .add_event::<MeasureModeEvent>()
        .add_systems(Startup, (setup, start_manifest_load))
        .add_systems(
            Update,
            (
                watch_manifest,
                spawn_model_when_ready,
                watch_load_failures,
                transition_to_ready,
                transition_on_load_failure,
                sync_viewport_camera,
                fps_text_update_system,
            ),
        )
        .add_systems(
            Update,
            (
                handle_measure_mode_shortcuts,
                handle_measure_mode_buttons,
                handle_measure_mode_events,
                track_drag_gesture,
                model_drag_rotation,
                measure_click_system.run_if(in_state(AppState::Ready)),
            )
                .chain(),
        );

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}

fn create_window_config() -> Window {
    #[cfg(target_arch = "wasm32")]
    {
        Window {
            canvas: Some("#bevy".into()),
            fit_canvas_to_parent: true,
            prevent_default_event_handling: false,
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Window {
            title: "mesh-measure-engine".into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }
}

/// Numeric readout for the last distance measurement.
#[derive(Component)]
pub struct DistanceReadout;

/// Numeric readout for the last angle measurement.
#[derive(Component)]
pub struct AngleReadout;

/// Load/interaction status line.
#[derive(Component)]
pub struct StatusReadout;

#[derive(Component)]
struct FpsText;

fn setup(mut commands: Commands) {
    spawn_lighting(&mut commands);
    spawn_camera(&mut commands);
    spawn_ui(&mut commands);
}

fn spawn_camera(commands: &mut Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 0.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn spawn_lighting(commands: &mut Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(1.0, 1.0, 1.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn readout_color() -> TextColor {
    TextColor(Color::srgb(0.1, 0.1, 0.1))
}

fn spawn_ui(commands: &mut Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("Distance:"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                readout_color(),
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                DistanceReadout,
            ));
            parent.spawn((
                Text::new("Angle:"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                readout_color(),
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(34.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                AngleReadout,
            ));
            parent.spawn((
                Text::new("Loading model..."),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                readout_color(),
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(58.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                StatusReadout,
            ));
            parent.spawn((
                Text::new("FPS: "),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(1.0, 0.0, 0.0)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    right: Val::Px(12.0),
                    ..default()
                },
                FpsText,
            ));

            for (label, mode, left_px) in [
                ("Distance", MeasureMode::Distance, 12.0),
                ("Angle", MeasureMode::Angle, 132.0),
            ] {
                parent
                    .spawn((
                        Button,
                        Node {
                            position_type: PositionType::Absolute,
                            bottom: Val::Px(12.0),
                            left: Val::Px(left_px),
                            width: Val::Px(110.0),
                            height: Val::Px(32.0),
                            justify_content: JustifyContent::Center,
                            align_items: AlignItems::Center,
                            ..default()
                        },
                        BackgroundColor(Color::srgb(0.15, 0.15, 0.2)),
                        ModeButton(mode),
                    ))
                    .with_children(|button| {
                        button.spawn((
                            Text::new(label),
                            TextFont {
                                font_size: 14.0,
                                ..default()
                            },
                            TextColor(Color::WHITE),
                        ));
                    });
            }
        });
}

fn fps_text_update_system(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsText>>,
) {
    for mut text in &mut query {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                text.0 = format!("FPS: {value:.1}");
            }
        }
    }
}
