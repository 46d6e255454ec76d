use crate::app::{AppState, ArSettings, RestartSession, SessionSet};
use crate::ar::GestureInput;
use crate::MainCamera;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TapGesture>()
            .add_event::<TapEvent>()
            .add_systems(
                Update,
                (detect_taps, device_camera, restart_trigger, leave_session)
                    .in_set(SessionSet::Sense)
                    .run_if(in_state(AppState::Session)),
            )
            .add_systems(Update, (help_toggle, statistics_toggle));
    }
}

#[derive(Event, Clone, Copy, Debug)]
pub struct TapEvent {
    pub screen_point: Vec2,
}

/// The single tap listener of the AR view.
#[derive(Resource, Default, Debug)]
pub struct TapGesture {
    registered: bool,
    enabled: bool,
}

impl TapGesture {
    pub fn is_listening(&self) -> bool {
        self.registered && self.enabled
    }
}

impl GestureInput for TapGesture {
    fn register_tap(&mut self) {
        self.registered = true;
        self.enabled = true;
    }

    fn set_tap_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// Orientation of the simulated device.
#[derive(Component, Default)]
pub struct DeviceCamera {
    pub yaw: f32,
    pub pitch: f32,
}

fn detect_taps(
    gesture: Res<TapGesture>,
    buttons: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut contexts: EguiContexts,
    mut taps: EventWriter<TapEvent>,
) {
    if !gesture.is_listening() {
        return;
    }
    // Clicks on the HUD are not taps on the world.
    if contexts.ctx_mut().wants_pointer_input() {
        return;
    }

    if buttons.just_pressed(MouseButton::Left) {
        if let Some(cursor) = windows.get_single().ok().and_then(|w| w.cursor_position()) {
            taps.send(TapEvent {
                screen_point: cursor,
            });
        }
    }
    for touch in touches.iter_just_pressed() {
        taps.send(TapEvent {
            screen_point: touch.position(),
        });
    }
}

fn device_camera(
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    mut scroll_evr: EventReader<MouseWheel>,
    settings: Res<ArSettings>,
    mut q_cam: Query<(&mut Transform, &mut DeviceCamera), With<MainCamera>>,
) {
    let Ok((mut t, mut device)) = q_cam.get_single_mut() else {
        return;
    };

    // Look around
    if buttons.pressed(MouseButton::Right) {
        for m in motion.read() {
            device.yaw -= m.delta.x * settings.look_sensitivity;
            device.pitch = (device.pitch - m.delta.y * settings.look_sensitivity).clamp(-1.4, 1.4);
        }
    } else {
        motion.clear();
    }
    t.rotation = Quat::from_euler(EulerRot::YXZ, device.yaw, device.pitch, 0.0);

    // Walk
    let forward = Vec3::new(t.forward().x, 0.0, t.forward().z).normalize_or_zero();
    let right = Vec3::new(t.right().x, 0.0, t.right().z).normalize_or_zero();
    let mut dir = Vec3::ZERO;
    if keys.pressed(KeyCode::ArrowUp) || keys.pressed(KeyCode::KeyW) {
        dir += forward;
    }
    if keys.pressed(KeyCode::ArrowDown) || keys.pressed(KeyCode::KeyS) {
        dir -= forward;
    }
    if keys.pressed(KeyCode::ArrowLeft) || keys.pressed(KeyCode::KeyA) {
        dir -= right;
    }
    if keys.pressed(KeyCode::ArrowRight) || keys.pressed(KeyCode::KeyD) {
        dir += right;
    }
    t.translation += dir.normalize_or_zero() * settings.camera_speed * time.delta_seconds();

    // Raise / lower the device
    for ev in scroll_evr.read() {
        t.translation.y = (t.translation.y + ev.y * 0.05).clamp(0.3, 3.0);
    }
}

fn restart_trigger(mut ev_restart: EventWriter<RestartSession>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyR) {
        ev_restart.send(RestartSession);
    }
}

fn leave_session(mut next_state: ResMut<NextState<AppState>>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::Escape) {
        next_state.set(AppState::Onboarding);
    }
}

fn help_toggle(mut settings: ResMut<ArSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyH) {
        settings.show_help = !settings.show_help;
    }
}

fn statistics_toggle(mut settings: ResMut<ArSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::F3) {
        settings.show_statistics = !settings.show_statistics;
    }
}
