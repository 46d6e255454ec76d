use bevy::diagnostic::{DiagnosticsStore, EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::app::{AppState, ArSettings, RestartSession};
use crate::ar::surface::VisualizationState;
use crate::ar::{PlacementController, PlacementState, SessionLifecycleManager, SurfaceVisualizer};
use crate::tracking::SimulatedTracking;

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .add_systems(Update, onboarding_ui.run_if(in_state(AppState::Onboarding)))
            .add_systems(Update, session_ui.run_if(in_state(AppState::Session)))
            .add_systems(Update, overlays_ui);
    }
}

/// What the user should do next.
pub fn hint(
    surface: VisualizationState,
    placement: PlacementState,
    placed_groups: usize,
) -> &'static str {
    match (placement, surface) {
        (PlacementState::AwaitingPlacement, VisualizationState::Idle) => {
            "Move the device slowly to find a horizontal surface."
        }
        (PlacementState::AwaitingPlacement, _) => "Tap the floor to place the hoop.",
        (PlacementState::Placed, _) if placed_groups == 0 => {
            "Nothing was placed. Press R to restart the session."
        }
        (PlacementState::Placed, _) => "Hoop placed. Press R to start over.",
    }
}

fn onboarding_ui(mut contexts: EguiContexts, mut next_state: ResMut<NextState<AppState>>) {
    egui::Window::new("AR Basketball")
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .collapsible(false)
        .resizable(false)
        .show(contexts.ctx_mut(), |ui| {
            ui.label("Point the device at the floor and wait for the grid to appear.");
            ui.label("Tap the grid once to place the hoop.");
            ui.separator();
            if ui.button("Start").clicked() {
                next_state.set(AppState::Session);
            }
        });
}

#[allow(clippy::too_many_arguments)]
fn session_ui(
    mut contexts: EguiContexts,
    mut settings: ResMut<ArSettings>,
    manager: Res<SessionLifecycleManager>,
    tracking: Res<SimulatedTracking>,
    visualizer: Res<SurfaceVisualizer>,
    placement: Res<PlacementController>,
    mut ev_restart: EventWriter<RestartSession>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let placed_groups = placement.assembly().map_or(0, |a| a.groups.len());

    egui::Window::new("Session").show(contexts.ctx_mut(), |ui| {
        ui.label(format!(
            "Tracking: {:?}, {} (activations: {})",
            manager.phase(),
            if tracking.is_running() { "running" } else { "stopped" },
            manager.activations()
        ));
        ui.label(format!("Planes: {}", tracking.planes().len()));
        match visualizer.tracked() {
            Some(surface) => ui.label(format!(
                "Grid: {} {:.2} x {:.2} m",
                surface.anchor, surface.extent.width, surface.extent.height
            )),
            None => ui.label("Grid: none"),
        };
        ui.label(format!("Placement: {:?}", placement.state()));
        if let Some(assembly) = placement.assembly() {
            ui.label(format!(
                "Assembly at ({:.2}, {:.2}, {:.2}), {} nodes",
                assembly.origin.x,
                assembly.origin.y,
                assembly.origin.z,
                assembly.node_count()
            ));
        }

        ui.separator();
        ui.label(hint(visualizer.state(), placement.state(), placed_groups));
        ui.separator();

        ui.label("Applied on restart:");
        ui.checkbox(
            &mut settings.placement.allow_estimated_plane,
            "Hit estimated planes",
        );
        ui.checkbox(&mut settings.placement.override_floor_skin, "Floor skin");
        ui.horizontal(|ui| {
            if ui.button("Restart").clicked() {
                ev_restart.send(RestartSession);
            }
            if ui.button("Leave").clicked() {
                next_state.set(AppState::Onboarding);
            }
        });
    });
}

fn overlays_ui(
    mut contexts: EguiContexts,
    settings: Res<ArSettings>,
    diagnostics: Res<DiagnosticsStore>,
) {
    if settings.show_help {
        egui::Window::new("Help").show(contexts.ctx_mut(), |ui| {
            ui.label("Left Mouse / Touch: Tap");
            ui.label("WASD/Arrows: Move device");
            ui.label("Right Mouse: Look around (drag)");
            ui.label("Mouse Wheel: Raise / lower device");
            ui.label("R: Restart session");
            ui.label("Esc: Back to start screen");
            ui.label("H: Toggle Help");
            ui.label("F3: Toggle Statistics");
        });
    }

    if settings.show_statistics {
        egui::Window::new("Statistics").show(contexts.ctx_mut(), |ui| {
            if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
                if let Some(value) = fps.smoothed() {
                    ui.label(format!("FPS: {:.1}", value));
                }
            }
            if let Some(entity_count) = diagnostics.get(&EntityCountDiagnosticsPlugin::ENTITY_COUNT)
            {
                if let Some(value) = entity_count.value() {
                    ui.label(format!("Entities: {}", value));
                }
            }
        });
    }
}
