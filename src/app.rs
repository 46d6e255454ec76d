use bevy::prelude::*;
use bevy::winit::WinitSettings;

use crate::ar::placement::PlacementOptions;
use crate::ar::{
    AnchorEvent, AssetId, GestureInput, PlacementContext, PlacementController, PlacementOutcome,
    PlaneAlignment, SessionLifecycleManager, SurfaceVisualizer, TrackingConfig,
};
use crate::input::{TapEvent, TapGesture};
use crate::scene::{BevyScene, CameraRaycaster, ProceduralAssets, SkinMaterials, WinitIdleDisplay};
use crate::tracking::SimulatedTracking;
use crate::MainCamera;

#[derive(States, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AppState {
    #[default]
    Onboarding,
    Session,
}

/// Per-frame order of a running session: hosts report what they saw, then the state machine reacts.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionSet {
    Sense,
    React,
}

/// Tears down the grid and the placed assembly and starts tracking from scratch.
#[derive(Event, Default)]
pub struct RestartSession;

/// A real-world surface the simulated device can discover.
#[derive(Clone, Debug)]
pub struct ScriptedSurface {
    pub center: Vec3,
    pub size: Vec2,
    pub alignment: PlaneAlignment,
}

#[derive(Resource, Clone)]
pub struct ArSettings {
    pub deterministic: bool,
    pub seed: u64,
    pub tracking: TrackingConfig,
    pub placement: PlacementOptions,
    /// Height of the plane hit tests fall back to when no tracked plane is under the tap.
    pub estimated_floor_height: f32,
    pub surfaces: Vec<ScriptedSurface>,
    pub discovery_interval: f32,
    pub refine_interval: f32,
    /// Metres added to each side of an estimate per refinement, min and max.
    pub refine_growth: Vec2,
    /// Fraction of the real size the first estimate covers.
    pub initial_coverage: f32,
    pub center_jitter: f32,
    pub missing_assets: Vec<AssetId>,
    pub show_help: bool,
    pub show_statistics: bool,
    pub camera_speed: f32,
    pub look_sensitivity: f32,
}

impl Default for ArSettings {
    fn default() -> Self {
        Self {
            deterministic: false,
            seed: 0,
            tracking: TrackingConfig::default(),
            placement: PlacementOptions::default(),
            estimated_floor_height: 0.0,
            surfaces: vec![
                ScriptedSurface {
                    center: Vec3::new(0.0, 0.0, -2.5),
                    size: Vec2::new(6.0, 5.0),
                    alignment: PlaneAlignment::Horizontal,
                },
                ScriptedSurface {
                    center: Vec3::new(1.8, 0.75, -1.2),
                    size: Vec2::new(1.2, 0.8),
                    alignment: PlaneAlignment::Horizontal,
                },
                ScriptedSurface {
                    center: Vec3::new(0.0, 1.5, -5.0),
                    size: Vec2::new(6.0, 3.0),
                    alignment: PlaneAlignment::Vertical,
                },
            ],
            discovery_interval: 1.5,
            refine_interval: 0.4,
            refine_growth: Vec2::new(0.02, 0.12),
            initial_coverage: 0.2,
            center_jitter: 0.02,
            missing_assets: Vec::new(),
            show_help: true,
            show_statistics: false,
            camera_speed: 1.2,
            look_sensitivity: 0.004,
        }
    }
}

pub struct ArPlugin;
impl Plugin for ArPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ArSettings>();
        let placement = app.world().resource::<ArSettings>().placement;

        app.insert_resource(PlacementController::new(placement))
            .init_resource::<SurfaceVisualizer>()
            .init_resource::<SessionLifecycleManager>()
            .init_resource::<SkinMaterials>()
            .add_event::<AnchorEvent>()
            .add_event::<RestartSession>()
            .configure_sets(Update, (SessionSet::Sense, SessionSet::React).chain())
            .add_systems(OnEnter(AppState::Session), enter_session)
            .add_systems(OnExit(AppState::Session), exit_session)
            .add_systems(
                Update,
                (route_anchor_events, handle_taps, handle_restart)
                    .chain()
                    .in_set(SessionSet::React)
                    .run_if(in_state(AppState::Session)),
            );
    }
}

fn enter_session(
    mut manager: ResMut<SessionLifecycleManager>,
    mut tracking: ResMut<SimulatedTracking>,
    mut gestures: ResMut<TapGesture>,
    mut winit: ResMut<WinitSettings>,
    settings: Res<ArSettings>,
) {
    let mut idle = WinitIdleDisplay {
        settings: &mut *winit,
    };
    manager.activate(
        &mut *tracking,
        &mut idle,
        &mut *gestures,
        &settings.tracking,
    );
}

fn exit_session(
    mut manager: ResMut<SessionLifecycleManager>,
    mut tracking: ResMut<SimulatedTracking>,
    mut winit: ResMut<WinitSettings>,
) {
    let mut idle = WinitIdleDisplay {
        settings: &mut *winit,
    };
    manager.deactivate(&mut *tracking, &mut idle);
}

fn route_anchor_events(
    mut anchors: EventReader<AnchorEvent>,
    mut visualizer: ResMut<SurfaceVisualizer>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    skins: Res<SkinMaterials>,
) {
    if anchors.is_empty() {
        return;
    }
    let mut scene = BevyScene {
        commands: &mut commands,
        meshes: &mut meshes,
        materials: &mut materials,
        skins: &skins,
    };

    for event in anchors.read() {
        match *event {
            AnchorEvent::Added {
                id,
                kind,
                center,
                extent,
            } => {
                visualizer.on_surface_detected(&mut scene, id, kind, center, extent);
            }
            AnchorEvent::Updated {
                id,
                kind,
                center,
                extent,
            } => {
                visualizer.on_surface_updated(&mut scene, id, kind, center, extent);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_taps(
    mut taps: EventReader<TapEvent>,
    mut placement: ResMut<PlacementController>,
    mut visualizer: ResMut<SurfaceVisualizer>,
    mut gestures: ResMut<TapGesture>,
    tracking: Res<SimulatedTracking>,
    settings: Res<ArSettings>,
    cameras: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    skins: Res<SkinMaterials>,
) {
    if taps.is_empty() {
        return;
    }
    let Ok((camera, camera_transform)) = cameras.get_single() else {
        taps.clear();
        return;
    };

    let raycaster = CameraRaycaster {
        camera,
        camera_transform,
        planes: tracking.planes(),
        estimated_floor_height: settings.estimated_floor_height,
    };
    let assets = ProceduralAssets::new(settings.missing_assets.clone());
    let mut scene = BevyScene {
        commands: &mut commands,
        meshes: &mut meshes,
        materials: &mut materials,
        skins: &skins,
    };
    let mut ctx = PlacementContext {
        visualizer: &mut *visualizer,
        hit_test: &raycaster,
        assets: &assets,
        scene: &mut scene,
        gestures: &mut *gestures,
    };

    for tap in taps.read() {
        match placement.on_first_tap(tap.screen_point, &mut ctx) {
            PlacementOutcome::AlreadyPlaced => debug!("ignoring tap, hoop already placed"),
            PlacementOutcome::Missed => info!("tap missed every surface, placement spent"),
            PlacementOutcome::Placed { failed, .. } if !failed.is_empty() => {
                warn!("hoop placed without {failed:?}")
            }
            PlacementOutcome::Placed { .. } => {}
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_restart(
    mut restarts: EventReader<RestartSession>,
    mut anchors: ResMut<Events<AnchorEvent>>,
    mut placement: ResMut<PlacementController>,
    mut visualizer: ResMut<SurfaceVisualizer>,
    mut gestures: ResMut<TapGesture>,
    mut tracking: ResMut<SimulatedTracking>,
    settings: Res<ArSettings>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    skins: Res<SkinMaterials>,
) {
    if restarts.is_empty() {
        return;
    }
    restarts.clear();

    let mut scene = BevyScene {
        commands: &mut commands,
        meshes: &mut meshes,
        materials: &mut materials,
        skins: &skins,
    };
    visualizer.reset(&mut scene);
    placement.reset(&mut scene);
    *placement = PlacementController::new(settings.placement);
    tracking.restart(&settings);
    // Anchors not yet routed belong to the torn down session.
    anchors.clear();
    gestures.set_tap_enabled(true);
    info!("session restarted");
}
