use std::time::Duration;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::app::{AppState, ArSettings, ScriptedSurface, SessionSet};
use crate::ar::{
    AnchorEvent, AnchorId, AnchorKind, PlaneAlignment, PlaneExtent, TrackingConfig,
    TrackingService,
};

pub struct TrackingPlugin;
impl Plugin for TrackingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulatedTracking>()
            .add_systems(Startup, spawn_backdrop)
            .add_systems(
                Update,
                run_tracking
                    .in_set(SessionSet::Sense)
                    .run_if(in_state(AppState::Session)),
            );
    }
}

/// Current estimate of one detected plane.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TrackedPlane {
    pub id: AnchorId,
    pub alignment: PlaneAlignment,
    pub center: Vec3,
    pub extent: PlaneExtent,
    /// The real surface; estimates never grow past it.
    pub limit: Vec2,
}

/// Stands in for the device's world tracking: discovers the scripted surfaces one by one and
/// keeps refining their estimates while the session runs.
#[derive(Resource)]
pub struct SimulatedTracking {
    running: bool,
    config: TrackingConfig,
    next_surface: usize,
    next_id: u64,
    feature_reported: bool,
    planes: Vec<TrackedPlane>,
    discovery: Timer,
    refine: Timer,
    rng: StdRng,
}

impl FromWorld for SimulatedTracking {
    fn from_world(world: &mut World) -> Self {
        let settings = world
            .get_resource::<ArSettings>()
            .cloned()
            .unwrap_or_default();
        Self::new(&settings)
    }
}

impl SimulatedTracking {
    pub fn new(settings: &ArSettings) -> Self {
        let rng = if settings.deterministic {
            StdRng::seed_from_u64(settings.seed)
        } else {
            StdRng::from_entropy()
        };
        Self {
            running: false,
            config: settings.tracking,
            next_surface: 0,
            next_id: 1,
            feature_reported: false,
            planes: Vec::new(),
            discovery: Timer::from_seconds(settings.discovery_interval, TimerMode::Repeating),
            refine: Timer::from_seconds(settings.refine_interval, TimerMode::Repeating),
            rng,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn planes(&self) -> &[TrackedPlane] {
        &self.planes
    }

    /// Forgets every anchor, like a tracking reset. Keeps the running flag; ids are never reused.
    pub fn restart(&mut self, settings: &ArSettings) {
        let running = self.running;
        let config = self.config;
        let next_id = self.next_id;
        *self = Self::new(settings);
        self.running = running;
        self.config = config;
        self.next_id = next_id;
    }

    pub fn advance(&mut self, dt: Duration, settings: &ArSettings) -> Vec<AnchorEvent> {
        let mut events = Vec::new();
        if !self.running {
            return events;
        }

        self.discovery.tick(dt);
        if self.discovery.just_finished() {
            if !self.feature_reported {
                self.feature_reported = true;
                events.push(AnchorEvent::Added {
                    id: self.allocate_id(),
                    kind: AnchorKind::Other,
                    center: Vec3::new(0.3, 1.0, -1.0),
                    extent: PlaneExtent::default(),
                });
            }
            if let Some(event) = self.discover_next(&settings.surfaces, settings.initial_coverage) {
                events.push(event);
            }
        }

        self.refine.tick(dt);
        if self.refine.just_finished() {
            events.extend(self.refine_planes(settings));
        }
        events
    }

    fn allocate_id(&mut self) -> AnchorId {
        let id = AnchorId(self.next_id);
        self.next_id += 1;
        id
    }

    fn discover_next(
        &mut self,
        surfaces: &[ScriptedSurface],
        coverage: f32,
    ) -> Option<AnchorEvent> {
        while let Some(surface) = surfaces.get(self.next_surface) {
            self.next_surface += 1;
            if !self.config.plane_detection.detects(surface.alignment) {
                continue;
            }

            let start = surface.size * coverage.clamp(0.05, 1.0);
            let plane = TrackedPlane {
                id: self.allocate_id(),
                alignment: surface.alignment,
                center: surface.center,
                extent: PlaneExtent::new(start.x, start.y),
                limit: surface.size,
            };
            self.planes.push(plane);
            debug!("discovered {} ({:?})", plane.id, plane.alignment);
            return Some(AnchorEvent::Added {
                id: plane.id,
                kind: AnchorKind::Plane(plane.alignment),
                center: plane.center,
                extent: plane.extent,
            });
        }
        None
    }

    fn refine_planes(&mut self, settings: &ArSettings) -> Vec<AnchorEvent> {
        let (lo, hi) = (
            settings.refine_growth.x,
            settings.refine_growth.y.max(settings.refine_growth.x),
        );
        let jitter = settings.center_jitter.abs();
        let mut events = Vec::new();

        for plane in &mut self.planes {
            let current = plane.extent.as_vec2();
            if current.cmpge(plane.limit).all() {
                continue;
            }
            let grow = Vec2::new(self.rng.gen_range(lo..=hi), self.rng.gen_range(lo..=hi));
            let next = (current + grow * 2.0).min(plane.limit);
            plane.extent = PlaneExtent::new(next.x, next.y);
            if jitter > 0.0 {
                plane.center.x += self.rng.gen_range(-jitter..=jitter);
                plane.center.z += self.rng.gen_range(-jitter..=jitter);
            }
            events.push(AnchorEvent::Updated {
                id: plane.id,
                kind: AnchorKind::Plane(plane.alignment),
                center: plane.center,
                extent: plane.extent,
            });
        }
        events
    }
}

impl TrackingService for SimulatedTracking {
    fn start_session(&mut self, config: &TrackingConfig) {
        self.config = *config;
        self.running = true;
    }

    fn pause_session(&mut self) {
        self.running = false;
    }
}

fn run_tracking(
    time: Res<Time>,
    settings: Res<ArSettings>,
    mut tracking: ResMut<SimulatedTracking>,
    mut anchors: EventWriter<AnchorEvent>,
) {
    let events = tracking.advance(time.delta(), &settings);
    anchors.send_batch(events);
}

/// The "room" the simulated device is looking at.
fn spawn_backdrop(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<ArSettings>,
) {
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.22, 0.23, 0.26),
        perceptual_roughness: 0.95,
        ..default()
    });

    for surface in &settings.surfaces {
        let (size, at) = match surface.alignment {
            PlaneAlignment::Horizontal if surface.center.y > 0.01 => (
                Vec3::new(surface.size.x, surface.center.y, surface.size.y),
                surface.center - Vec3::Y * surface.center.y * 0.5,
            ),
            PlaneAlignment::Horizontal => (
                Vec3::new(surface.size.x, 0.01, surface.size.y),
                surface.center - Vec3::Y * 0.005,
            ),
            PlaneAlignment::Vertical => (
                Vec3::new(surface.size.x, surface.size.y, 0.05),
                surface.center,
            ),
        };
        commands.spawn(PbrBundle {
            mesh: meshes.add(Cuboid::from_size(size)),
            material: material.clone(),
            transform: Transform::from_translation(at),
            ..default()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::collab::PlaneDetection;

    fn settings() -> ArSettings {
        ArSettings {
            deterministic: true,
            seed: 7,
            discovery_interval: 1.0,
            refine_interval: 0.5,
            ..default()
        }
    }

    fn tick(tracking: &mut SimulatedTracking, s: &ArSettings, secs: f32) -> Vec<AnchorEvent> {
        tracking.advance(Duration::from_secs_f32(secs), s)
    }

    #[test]
    fn nothing_happens_before_start() {
        let s = settings();
        let mut tracking = SimulatedTracking::new(&s);
        assert!(tick(&mut tracking, &s, 5.0).is_empty());
        assert!(tracking.planes().is_empty());
    }

    #[test]
    fn discovers_horizontal_planes_once_each() {
        let s = settings();
        let mut tracking = SimulatedTracking::new(&s);
        tracking.start_session(&TrackingConfig::default());

        let mut added = Vec::new();
        for _ in 0..10 {
            for event in tick(&mut tracking, &s, 1.0) {
                if let AnchorEvent::Added { id, kind, .. } = event {
                    added.push((id, kind));
                }
            }
        }

        let planes: Vec<_> = added
            .iter()
            .filter(|(_, kind)| matches!(kind, AnchorKind::Plane(_)))
            .collect();
        // The wall is vertical and horizontal-only detection skips it.
        assert_eq!(planes.len(), 2);
        assert!(planes.iter().all(|(_, k)| k.is_horizontal_plane()));
        assert_eq!(
            added.iter().filter(|(_, k)| *k == AnchorKind::Other).count(),
            1
        );
        assert_eq!(tracking.planes().len(), 2);
    }

    #[test]
    fn vertical_detection_finds_the_wall() {
        let s = settings();
        let mut tracking = SimulatedTracking::new(&s);
        tracking.start_session(&TrackingConfig {
            plane_detection: PlaneDetection::Both,
        });
        for _ in 0..5 {
            tick(&mut tracking, &s, 1.0);
        }
        assert!(tracking
            .planes()
            .iter()
            .any(|p| p.alignment == PlaneAlignment::Vertical));
    }

    #[test]
    fn refinement_grows_up_to_the_real_size() {
        let s = settings();
        let mut tracking = SimulatedTracking::new(&s);
        tracking.start_session(&TrackingConfig::default());

        let first = tick(&mut tracking, &s, 1.0);
        let id = first
            .iter()
            .find_map(|e| match e {
                AnchorEvent::Added {
                    id,
                    kind: AnchorKind::Plane(_),
                    ..
                } => Some(*id),
                _ => None,
            })
            .unwrap();

        let mut updates = 0;
        for _ in 0..400 {
            for event in tick(&mut tracking, &s, 0.5) {
                if matches!(event, AnchorEvent::Updated { id: u, .. } if u == id) {
                    updates += 1;
                }
            }
        }
        assert!(updates > 0);

        let plane = tracking.planes().iter().find(|p| p.id == id).unwrap();
        assert_eq!(plane.extent.as_vec2(), plane.limit);
    }

    #[test]
    fn pause_stops_events_and_restart_forgets_planes() {
        let s = settings();
        let mut tracking = SimulatedTracking::new(&s);
        tracking.start_session(&TrackingConfig::default());
        tick(&mut tracking, &s, 1.0);
        assert!(!tracking.planes().is_empty());

        tracking.pause_session();
        assert!(tick(&mut tracking, &s, 3.0).is_empty());

        tracking.start_session(&TrackingConfig::default());
        tracking.restart(&s);
        assert!(tracking.is_running());
        assert!(tracking.planes().is_empty());
        assert!(!tick(&mut tracking, &s, 1.0).is_empty());
    }

    #[test]
    fn anchor_ids_survive_restart() {
        let s = settings();
        let mut tracking = SimulatedTracking::new(&s);
        tracking.start_session(&TrackingConfig::default());
        let before: Vec<AnchorId> = tick(&mut tracking, &s, 1.0)
            .iter()
            .map(|e| match e {
                AnchorEvent::Added { id, .. } | AnchorEvent::Updated { id, .. } => *id,
            })
            .collect();
        assert!(!before.is_empty());

        tracking.restart(&s);
        let after = tick(&mut tracking, &s, 1.0);
        assert!(!after.is_empty());
        for event in after {
            let (AnchorEvent::Added { id, .. } | AnchorEvent::Updated { id, .. }) = event;
            assert!(!before.contains(&id), "{id} reused after restart");
        }
    }
}
