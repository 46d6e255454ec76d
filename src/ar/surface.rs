use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

use super::anchor::{AnchorId, AnchorKind, PlaneExtent};
use super::collab::{NodeHandle, SceneGraph};
use super::scene_node::{Geometry, SceneNode, Skin};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct VisualizationHandle {
    pub node: NodeHandle,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TrackedSurface {
    pub anchor: AnchorId,
    pub center: Vec3,
    pub extent: PlaneExtent,
    pub handle: VisualizationHandle,
}

impl TrackedSurface {
    /// Placement of the unit grid rectangle: flat on the plane, scaled to the extent.
    pub fn transform(&self) -> Transform {
        grid_transform(self.center, self.extent)
    }
}

fn grid_transform(center: Vec3, extent: PlaneExtent) -> Transform {
    Transform::from_translation(center)
        .with_rotation(Quat::from_rotation_x(-FRAC_PI_2))
        .with_scale(Vec3::new(extent.width, extent.height, 1.0))
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum VisualizationState {
    /// Nothing shown yet this session.
    #[default]
    Idle,
    Showing(TrackedSurface),
    /// Shown once and taken down; stays down until the session restarts.
    Removed,
}

/// Owns the grid overlay that marks the detected surface until content is placed.
#[derive(Resource, Default, Debug)]
pub struct SurfaceVisualizer {
    state: VisualizationState,
}

impl SurfaceVisualizer {
    pub fn state(&self) -> VisualizationState {
        self.state
    }

    pub fn tracked(&self) -> Option<&TrackedSurface> {
        match &self.state {
            VisualizationState::Showing(surface) => Some(surface),
            _ => None,
        }
    }

    /// Shows the grid for the first horizontal plane of the session. Every later detection,
    /// including ones for other anchors, is ignored.
    pub fn on_surface_detected(
        &mut self,
        scene: &mut dyn SceneGraph,
        anchor: AnchorId,
        kind: AnchorKind,
        center: Vec3,
        extent: PlaneExtent,
    ) -> Option<VisualizationHandle> {
        if !kind.is_horizontal_plane() {
            debug!("ignoring {kind:?} {anchor}");
            return None;
        }
        if self.state != VisualizationState::Idle {
            debug!("grid already added, ignoring {anchor}");
            return None;
        }

        let node = SceneNode::new(
            "surface-grid",
            Geometry::Rectangle {
                width: 1.0,
                height: 1.0,
            },
            grid_transform(center, extent),
            Skin::Grid,
        );
        let handle = VisualizationHandle {
            node: scene.attach_node(node, None),
        };
        self.state = VisualizationState::Showing(TrackedSurface {
            anchor,
            center,
            extent,
            handle,
        });
        info!(
            "showing grid for {anchor} at {center} ({:.2} x {:.2} m)",
            extent.width, extent.height
        );
        Some(handle)
    }

    /// Refreshes the grid if `anchor` is the one being shown. Returns whether anything changed.
    pub fn on_surface_updated(
        &mut self,
        scene: &mut dyn SceneGraph,
        anchor: AnchorId,
        kind: AnchorKind,
        center: Vec3,
        extent: PlaneExtent,
    ) -> bool {
        if !matches!(kind, AnchorKind::Plane(_)) {
            return false;
        }
        let VisualizationState::Showing(surface) = &mut self.state else {
            return false;
        };
        if surface.anchor != anchor {
            return false;
        }

        surface.center = center;
        surface.extent = extent;
        scene.reshape_node(surface.handle.node, surface.transform());
        true
    }

    /// Takes the grid down. Safe to call at any time.
    pub fn remove_visualization(&mut self, scene: &mut dyn SceneGraph) -> bool {
        let VisualizationState::Showing(surface) = self.state else {
            return false;
        };
        scene.remove_node(surface.handle.node);
        self.state = VisualizationState::Removed;
        info!("removed grid for {}", surface.anchor);
        true
    }

    /// Session restart: the next detected plane gets a grid again.
    pub fn reset(&mut self, scene: &mut dyn SceneGraph) {
        self.remove_visualization(scene);
        self.state = VisualizationState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::anchor::PlaneAlignment;
    use crate::ar::collab::fakes::RecordingScene;

    const PLANE: AnchorKind = AnchorKind::Plane(PlaneAlignment::Horizontal);

    fn detect(v: &mut SurfaceVisualizer, scene: &mut RecordingScene, id: u64) -> bool {
        v.on_surface_detected(scene, AnchorId(id), PLANE, Vec3::ZERO, PlaneExtent::new(1.0, 1.0))
            .is_some()
    }

    #[test]
    fn only_first_plane_gets_a_grid() {
        let mut scene = RecordingScene::default();
        let mut v = SurfaceVisualizer::default();

        assert!(detect(&mut v, &mut scene, 1));
        assert!(!detect(&mut v, &mut scene, 2));
        assert!(!detect(&mut v, &mut scene, 1));
        assert_eq!(scene.attached, 1);
        assert_eq!(v.tracked().map(|s| s.anchor), Some(AnchorId(1)));
    }

    #[test]
    fn non_plane_and_vertical_anchors_are_ignored() {
        let mut scene = RecordingScene::default();
        let mut v = SurfaceVisualizer::default();

        let other = v.on_surface_detected(
            &mut scene,
            AnchorId(1),
            AnchorKind::Other,
            Vec3::ZERO,
            PlaneExtent::new(1.0, 1.0),
        );
        let wall = v.on_surface_detected(
            &mut scene,
            AnchorId(2),
            AnchorKind::Plane(PlaneAlignment::Vertical),
            Vec3::ZERO,
            PlaneExtent::new(1.0, 1.0),
        );
        assert!(other.is_none() && wall.is_none());
        assert_eq!(v.state(), VisualizationState::Idle);
        assert!(detect(&mut v, &mut scene, 3));
    }

    #[test]
    fn update_recenters_and_resizes() {
        let mut scene = RecordingScene::default();
        let mut v = SurfaceVisualizer::default();
        let handle = v
            .on_surface_detected(
                &mut scene,
                AnchorId(10),
                PLANE,
                Vec3::ZERO,
                PlaneExtent::new(1.0, 1.0),
            )
            .unwrap();

        let created = &scene.live[&handle.node];
        assert_eq!(created.transform.translation, Vec3::ZERO);
        assert_eq!(created.transform.scale, Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(created.skin, Skin::Grid);

        let center = Vec3::new(0.2, 0.0, 0.1);
        assert!(v.on_surface_updated(
            &mut scene,
            AnchorId(10),
            PLANE,
            center,
            PlaneExtent::new(1.5, 1.2)
        ));

        let updated = &scene.live[&handle.node];
        assert_eq!(updated.transform.translation, center);
        assert_eq!(updated.transform.scale, Vec3::new(1.5, 1.2, 1.0));
        let surface = v.tracked().unwrap();
        assert_eq!(surface.center, center);
        assert_eq!(surface.extent, PlaneExtent::new(1.5, 1.2));
    }

    #[test]
    fn grid_lies_flat() {
        let mut scene = RecordingScene::default();
        let mut v = SurfaceVisualizer::default();
        let handle = v
            .on_surface_detected(
                &mut scene,
                AnchorId(1),
                PLANE,
                Vec3::ZERO,
                PlaneExtent::new(1.0, 1.0),
            )
            .unwrap();
        let normal = scene.live[&handle.node].transform.rotation * Vec3::Z;
        assert!(normal.abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn updates_for_unknown_anchors_are_noops() {
        let mut scene = RecordingScene::default();
        let mut v = SurfaceVisualizer::default();

        // Nothing tracked yet.
        assert!(!v.on_surface_updated(
            &mut scene,
            AnchorId(1),
            PLANE,
            Vec3::ONE,
            PlaneExtent::new(2.0, 2.0)
        ));

        detect(&mut v, &mut scene, 1);
        let before = v.state();
        assert!(!v.on_surface_updated(
            &mut scene,
            AnchorId(2),
            PLANE,
            Vec3::ONE,
            PlaneExtent::new(2.0, 2.0)
        ));
        assert!(!v.on_surface_updated(
            &mut scene,
            AnchorId(1),
            AnchorKind::Other,
            Vec3::ONE,
            PlaneExtent::new(2.0, 2.0)
        ));
        assert_eq!(v.state(), before);
    }

    #[test]
    fn updates_after_removal_are_noops() {
        let mut scene = RecordingScene::default();
        let mut v = SurfaceVisualizer::default();
        detect(&mut v, &mut scene, 1);

        assert!(v.remove_visualization(&mut scene));
        assert!(scene.live.is_empty());
        assert!(!v.on_surface_updated(
            &mut scene,
            AnchorId(1),
            PLANE,
            Vec3::ONE,
            PlaneExtent::new(2.0, 2.0)
        ));
        assert_eq!(v.state(), VisualizationState::Removed);
        // A removed grid does not come back for a new plane.
        assert!(!detect(&mut v, &mut scene, 2));
    }

    #[test]
    fn removal_is_idempotent() {
        let mut scene = RecordingScene::default();
        let mut v = SurfaceVisualizer::default();

        assert!(!v.remove_visualization(&mut scene));
        detect(&mut v, &mut scene, 1);
        assert!(v.remove_visualization(&mut scene));
        assert!(!v.remove_visualization(&mut scene));
        assert_eq!(scene.removed.len(), 1);
    }

    #[test]
    fn reset_allows_a_new_grid() {
        let mut scene = RecordingScene::default();
        let mut v = SurfaceVisualizer::default();
        detect(&mut v, &mut scene, 1);

        v.reset(&mut scene);
        assert_eq!(v.state(), VisualizationState::Idle);
        assert!(scene.live.is_empty());
        assert!(detect(&mut v, &mut scene, 2));
    }
}
