mod app;
mod ar;
mod input;
mod scene;
mod tracking;
mod ui;

use bevy::diagnostic::{EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy::winit::WinitSettings;
use app::{AppState, ArPlugin};
use input::{DeviceCamera, InputPlugin};
use tracking::TrackingPlugin;
use ui::UiPlugin;

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.05, 0.06, 0.08)))
        .insert_resource(Msaa::Sample4)
        .insert_resource(WinitSettings::desktop_app())
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 300.0,
        })
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(EntityCountDiagnosticsPlugin)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "hoop-ar: AR basketball hoop".into(),
                resolution: (1280., 800.).into(),
                ..default()
            }),
            ..default()
        }))
        .init_state::<AppState>()
        .add_plugins((ArPlugin, TrackingPlugin, InputPlugin, UiPlugin))
        .add_systems(Startup, (setup_camera, setup_default_lighting))
        .add_systems(Update, scene::draw_surface_grid)
        .run();
}

fn setup_camera(mut commands: Commands) {
    let transform =
        Transform::from_xyz(0.0, 1.4, 1.5).looking_at(Vec3::new(0.0, 0.0, -2.0), Vec3::Y);
    let (yaw, pitch, _) = transform.rotation.to_euler(EulerRot::YXZ);
    commands.spawn((
        Camera3dBundle {
            transform,
            ..default()
        },
        DeviceCamera { yaw, pitch },
        MainCamera,
    ));
}

fn setup_default_lighting(mut commands: Commands) {
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_xyz(2.0, 6.0, 3.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });
}

#[derive(Component)]
pub struct MainCamera;
