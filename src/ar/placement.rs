use std::fmt;

use bevy::prelude::*;

use super::anchor::PlaneAlignment;
use super::collab::{AssetStore, GestureInput, HitTestService, NodeHandle, SceneGraph};
use super::scene_node::{CollisionShape, NodeGroup, Skin, StaticBody};
use super::surface::SurfaceVisualizer;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AssetId {
    Board,
    Ring,
    Floor,
}

impl AssetId {
    /// Everything placed by the first tap, in load order.
    pub const ASSEMBLY: [AssetId; 3] = [AssetId::Board, AssetId::Ring, AssetId::Floor];

    pub fn scene_path(self) -> &'static str {
        match self {
            AssetId::Board => "Assets.scnassets/BasketballBoard.scn",
            AssetId::Ring => "Assets.scnassets/BasketballRing.scn",
            AssetId::Floor => "Assets.scnassets/BasketballFloor.scn",
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scene_path())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PlacementState {
    #[default]
    AwaitingPlacement,
    Placed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PlacementOptions {
    pub allow_estimated_plane: bool,
    pub override_floor_skin: bool,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            allow_estimated_plane: true,
            override_floor_skin: true,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PlacedGroup {
    pub asset: AssetId,
    pub nodes: Vec<NodeHandle>,
}

/// What the first tap put into the scene. Only kept so a restart can take it down again.
#[derive(Clone, PartialEq, Debug)]
pub struct PlacedAssembly {
    pub origin: Vec3,
    pub groups: Vec<PlacedGroup>,
}

impl PlacedAssembly {
    pub fn node_count(&self) -> usize {
        self.groups.iter().map(|g| g.nodes.len()).sum()
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PlacementOutcome {
    AlreadyPlaced,
    /// The hit test found nothing. Placement is still spent.
    Missed,
    Placed {
        attached_groups: usize,
        failed: Vec<AssetId>,
    },
}

pub struct PlacementContext<'a> {
    pub visualizer: &'a mut SurfaceVisualizer,
    pub hit_test: &'a dyn HitTestService,
    pub assets: &'a dyn AssetStore,
    pub scene: &'a mut dyn SceneGraph,
    pub gestures: &'a mut dyn GestureInput,
}

#[derive(Resource, Default, Debug)]
pub struct PlacementController {
    state: PlacementState,
    options: PlacementOptions,
    assembly: Option<PlacedAssembly>,
}

impl PlacementController {
    pub fn new(options: PlacementOptions) -> Self {
        Self {
            options,
            ..default()
        }
    }

    pub fn state(&self) -> PlacementState {
        self.state
    }

    pub fn assembly(&self) -> Option<&PlacedAssembly> {
        self.assembly.as_ref()
    }

    /// Handles a tap. Only the first tap of a session does anything beyond removing the grid,
    /// and it spends the placement even when the hit test misses.
    pub fn on_first_tap(
        &mut self,
        screen_point: Vec2,
        ctx: &mut PlacementContext<'_>,
    ) -> PlacementOutcome {
        ctx.visualizer.remove_visualization(ctx.scene);

        if self.state == PlacementState::Placed {
            return PlacementOutcome::AlreadyPlaced;
        }
        self.state = PlacementState::Placed;
        ctx.gestures.set_tap_enabled(false);

        let Some(hit) = ctx.hit_test.raycast(
            screen_point,
            self.options.allow_estimated_plane,
            PlaneAlignment::Horizontal,
        ) else {
            debug!("tap at {screen_point} hit no horizontal surface");
            return PlacementOutcome::Missed;
        };

        let mut groups = Vec::with_capacity(AssetId::ASSEMBLY.len());
        let mut failed = Vec::new();
        for id in AssetId::ASSEMBLY {
            match ctx.assets.load_asset(id) {
                Ok(group) => {
                    let nodes = self.attach_group(group, hit.position, ctx.scene);
                    groups.push(PlacedGroup { asset: id, nodes });
                }
                Err(err) => {
                    warn!("skipping {id}: {err}");
                    failed.push(id);
                }
            }
        }

        info!(
            "placed {} of {} assets at {} ({:?})",
            groups.len(),
            AssetId::ASSEMBLY.len(),
            hit.position,
            hit.source
        );
        let attached_groups = groups.len();
        self.assembly = Some(PlacedAssembly {
            origin: hit.position,
            groups,
        });
        PlacementOutcome::Placed {
            attached_groups,
            failed,
        }
    }

    fn attach_group(
        &self,
        group: NodeGroup,
        offset: Vec3,
        scene: &mut dyn SceneGraph,
    ) -> Vec<NodeHandle> {
        let floor_skin = group.asset == AssetId::Floor && self.options.override_floor_skin;
        group
            .nodes
            .into_iter()
            .map(|mut node| {
                node.transform.translation += offset;
                node.body = CollisionShape::from_mesh(&node.geometry.to_mesh())
                    .map(|shape| StaticBody { shape });
                if floor_skin {
                    node.skin = Skin::Floor;
                }
                scene.attach_node(node, None)
            })
            .collect()
    }

    /// Session restart: takes the assembly down and waits for the next first tap.
    pub fn reset(&mut self, scene: &mut dyn SceneGraph) {
        if let Some(assembly) = self.assembly.take() {
            for node in assembly.groups.into_iter().flat_map(|g| g.nodes) {
                scene.remove_node(node);
            }
        }
        self.state = PlacementState::AwaitingPlacement;
    }
}
