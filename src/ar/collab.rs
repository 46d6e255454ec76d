//! Services the AR runtime provides. The state machine only ever talks to these traits;
//! the Bevy host in `scene`, `tracking` and `input` implements them.

use bevy::prelude::*;
use thiserror::Error;

use super::anchor::{AnchorId, PlaneAlignment};
use super::placement::AssetId;
use super::scene_node::{NodeGroup, SceneNode};

/// Node owned by the scene graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeHandle(pub Entity);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PlaneDetection {
    #[default]
    Horizontal,
    Vertical,
    Both,
}

impl PlaneDetection {
    pub fn detects(self, alignment: PlaneAlignment) -> bool {
        matches!(
            (self, alignment),
            (PlaneDetection::Both, _)
                | (PlaneDetection::Horizontal, PlaneAlignment::Horizontal)
                | (PlaneDetection::Vertical, PlaneAlignment::Vertical)
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TrackingConfig {
    pub plane_detection: PlaneDetection,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HitSource {
    TrackedPlane(AnchorId),
    EstimatedPlane,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct WorldHit {
    pub position: Vec3,
    pub source: HitSource,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("asset {0} is not in the catalog")]
    Missing(AssetId),
}

pub trait TrackingService {
    fn start_session(&mut self, config: &TrackingConfig);
    fn pause_session(&mut self);
}

pub trait HitTestService {
    fn raycast(
        &self,
        screen_point: Vec2,
        allow_estimated_plane: bool,
        alignment: PlaneAlignment,
    ) -> Option<WorldHit>;
}

pub trait SceneGraph {
    fn attach_node(&mut self, node: SceneNode, parent: Option<NodeHandle>) -> NodeHandle;
    fn reshape_node(&mut self, node: NodeHandle, transform: Transform);
    /// Unknown or already removed nodes are ignored.
    fn remove_node(&mut self, node: NodeHandle);
}

pub trait AssetStore {
    fn load_asset(&self, id: AssetId) -> Result<NodeGroup, AssetError>;
}

pub trait IdleDisplay {
    fn set_idle_timer_disabled(&mut self, disabled: bool);
}

pub trait GestureInput {
    fn register_tap(&mut self);
    fn set_tap_enabled(&mut self, enabled: bool);
}

/// In-memory collaborators shared by the state machine tests.
#[cfg(test)]
pub(crate) mod fakes {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    pub struct RecordingScene {
        next: u32,
        pub live: HashMap<NodeHandle, SceneNode>,
        pub attached: usize,
        pub removed: Vec<NodeHandle>,
    }

    impl SceneGraph for RecordingScene {
        fn attach_node(&mut self, node: SceneNode, _parent: Option<NodeHandle>) -> NodeHandle {
            self.next += 1;
            let handle = NodeHandle(Entity::from_raw(self.next));
            self.live.insert(handle, node);
            self.attached += 1;
            handle
        }

        fn reshape_node(&mut self, node: NodeHandle, transform: Transform) {
            if let Some(n) = self.live.get_mut(&node) {
                n.transform = transform;
            }
        }

        fn remove_node(&mut self, node: NodeHandle) {
            if self.live.remove(&node).is_some() {
                self.removed.push(node);
            }
        }
    }

    /// Returns the same answer for every query and remembers what it was asked.
    #[derive(Default)]
    pub struct FixedHitTest {
        pub hit: Option<Vec3>,
        pub queries: RefCell<Vec<(Vec2, bool)>>,
    }

    impl FixedHitTest {
        pub fn at(position: Vec3) -> Self {
            Self {
                hit: Some(position),
                ..default()
            }
        }

        pub fn miss() -> Self {
            Self::default()
        }
    }

    impl HitTestService for FixedHitTest {
        fn raycast(
            &self,
            screen_point: Vec2,
            allow_estimated_plane: bool,
            _alignment: PlaneAlignment,
        ) -> Option<WorldHit> {
            self.queries
                .borrow_mut()
                .push((screen_point, allow_estimated_plane));
            self.hit.map(|position| WorldHit {
                position,
                source: HitSource::EstimatedPlane,
            })
        }
    }

    #[derive(Default)]
    pub struct RecordingGestures {
        pub registrations: usize,
        pub enabled: bool,
    }

    impl GestureInput for RecordingGestures {
        fn register_tap(&mut self) {
            self.registrations += 1;
            self.enabled = true;
        }

        fn set_tap_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
    }

    #[derive(Default)]
    pub struct RecordingTracking {
        pub started: Vec<TrackingConfig>,
        pub pauses: usize,
    }

    impl TrackingService for RecordingTracking {
        fn start_session(&mut self, config: &TrackingConfig) {
            self.started.push(*config);
        }

        fn pause_session(&mut self) {
            self.pauses += 1;
        }
    }

    #[derive(Default)]
    pub struct RecordingIdle {
        pub calls: Vec<bool>,
    }

    impl IdleDisplay for RecordingIdle {
        fn set_idle_timer_disabled(&mut self, disabled: bool) {
            self.calls.push(disabled);
        }
    }
}
