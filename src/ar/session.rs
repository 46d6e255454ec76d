use bevy::prelude::*;

use super::collab::{GestureInput, IdleDisplay, TrackingConfig, TrackingService};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SessionPhase {
    #[default]
    Inactive,
    Running,
    Paused,
}

/// Starts and pauses tracking as the AR view comes and goes.
#[derive(Resource, Default, Debug)]
pub struct SessionLifecycleManager {
    phase: SessionPhase,
    tap_registered: bool,
    activations: u32,
}

impl SessionLifecycleManager {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn activations(&self) -> u32 {
        self.activations
    }

    pub fn activate(
        &mut self,
        tracking: &mut dyn TrackingService,
        idle: &mut dyn IdleDisplay,
        gestures: &mut dyn GestureInput,
        config: &TrackingConfig,
    ) {
        if self.is_running() {
            return;
        }
        idle.set_idle_timer_disabled(true);
        tracking.start_session(config);
        if !self.tap_registered {
            gestures.register_tap();
            self.tap_registered = true;
        }
        self.phase = SessionPhase::Running;
        self.activations += 1;
        info!(
            "tracking session started ({:?} planes), activation {}",
            config.plane_detection, self.activations
        );
    }

    pub fn deactivate(&mut self, tracking: &mut dyn TrackingService, idle: &mut dyn IdleDisplay) {
        if !self.is_running() {
            return;
        }
        tracking.pause_session();
        idle.set_idle_timer_disabled(false);
        self.phase = SessionPhase::Paused;
        info!("tracking session paused");
    }
}
