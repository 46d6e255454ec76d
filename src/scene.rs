use bevy::prelude::*;
use bevy::winit::WinitSettings;

use crate::ar::{
    AssetError, AssetId, AssetStore, Geometry, HitSource, HitTestService, IdleDisplay, NodeGroup,
    NodeHandle, PlaneAlignment, SceneGraph, SceneNode, Skin, WorldHit,
};
use crate::tracking::TrackedPlane;

/// Target size of one grid cell drawn over the surface visualization, in metres.
const GRID_CELL: f32 = 0.1;

#[derive(Component)]
pub struct SurfaceGrid;

#[derive(Component)]
pub struct PlacedNode;

#[derive(Resource)]
pub struct SkinMaterials {
    pub grid: Handle<StandardMaterial>,
    pub floor: Handle<StandardMaterial>,
}

impl FromWorld for SkinMaterials {
    fn from_world(world: &mut World) -> Self {
        let mut materials = world.resource_mut::<Assets<StandardMaterial>>();
        Self {
            grid: materials.add(StandardMaterial {
                base_color: Color::srgba(0.3, 0.8, 1.0, 0.25),
                alpha_mode: AlphaMode::Blend,
                unlit: true,
                double_sided: true,
                cull_mode: None,
                ..default()
            }),
            floor: materials.add(StandardMaterial {
                base_color: Color::srgb(0.76, 0.52, 0.3),
                perceptual_roughness: 0.7,
                ..default()
            }),
        }
    }
}

/// Scene graph backed by the ECS world. Nodes become PBR entities.
pub struct BevyScene<'a, 'w, 's> {
    pub commands: &'a mut Commands<'w, 's>,
    pub meshes: &'a mut Assets<Mesh>,
    pub materials: &'a mut Assets<StandardMaterial>,
    pub skins: &'a SkinMaterials,
}

impl SceneGraph for BevyScene<'_, '_, '_> {
    fn attach_node(&mut self, node: SceneNode, parent: Option<NodeHandle>) -> NodeHandle {
        let material = match node.skin {
            Skin::Grid => self.skins.grid.clone(),
            Skin::Floor => self.skins.floor.clone(),
            Skin::Authored(color) => self.materials.add(StandardMaterial {
                base_color: color,
                perceptual_roughness: 0.6,
                ..default()
            }),
        };

        let mut entity = self.commands.spawn((
            PbrBundle {
                mesh: self.meshes.add(node.geometry.to_mesh()),
                material,
                transform: node.transform,
                ..default()
            },
            Name::new(node.name),
        ));
        if node.skin == Skin::Grid {
            entity.insert(SurfaceGrid);
        } else {
            entity.insert(PlacedNode);
        }
        if let Some(body) = node.body {
            entity.insert(body);
        }
        if let Some(parent) = parent {
            entity.set_parent(parent.0);
        }
        NodeHandle(entity.id())
    }

    fn reshape_node(&mut self, node: NodeHandle, transform: Transform) {
        if let Some(mut entity) = self.commands.get_entity(node.0) {
            entity.insert(transform);
        }
    }

    fn remove_node(&mut self, node: NodeHandle) {
        if let Some(entity) = self.commands.get_entity(node.0) {
            entity.despawn_recursive();
        }
    }
}

/// Hit tests through the device camera against the tracked planes.
pub struct CameraRaycaster<'a> {
    pub camera: &'a Camera,
    pub camera_transform: &'a GlobalTransform,
    pub planes: &'a [TrackedPlane],
    pub estimated_floor_height: f32,
}

impl HitTestService for CameraRaycaster<'_> {
    fn raycast(
        &self,
        screen_point: Vec2,
        allow_estimated_plane: bool,
        alignment: PlaneAlignment,
    ) -> Option<WorldHit> {
        let ray = self
            .camera
            .viewport_to_world(self.camera_transform, screen_point)?;
        let estimated = allow_estimated_plane.then_some(self.estimated_floor_height);
        cast_ray(ray, self.planes, estimated, alignment)
    }
}

/// Nearest tracked plane under the ray; falls back to the estimated floor when one is given.
/// Only horizontal queries can hit anything: the simulated planes carry no wall orientation.
pub fn cast_ray(
    ray: Ray3d,
    planes: &[TrackedPlane],
    estimated_floor: Option<f32>,
    alignment: PlaneAlignment,
) -> Option<WorldHit> {
    if alignment != PlaneAlignment::Horizontal {
        return None;
    }
    let up = InfinitePlane3d::new(Vec3::Y);

    let tracked = planes
        .iter()
        .filter(|p| p.alignment == PlaneAlignment::Horizontal)
        .filter_map(|p| {
            let distance = ray.intersect_plane(p.center, up)?;
            let point = ray.get_point(distance);
            let local = point - p.center;
            p.extent
                .contains(Vec2::new(local.x, local.z))
                .then_some((distance, point, p.id))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0));
    if let Some((_, position, id)) = tracked {
        return Some(WorldHit {
            position,
            source: HitSource::TrackedPlane(id),
        });
    }

    let height = estimated_floor?;
    let distance = ray.intersect_plane(Vec3::Y * height, up)?;
    Some(WorldHit {
        position: ray.get_point(distance),
        source: HitSource::EstimatedPlane,
    })
}

/// The hoop assembly, authored in code. Origin is the spot on the floor under the ring.
pub struct ProceduralAssets {
    missing: Vec<AssetId>,
}

impl ProceduralAssets {
    /// `missing` lists assets that fail to load, to rehearse partial placements.
    pub fn new(missing: Vec<AssetId>) -> Self {
        Self { missing }
    }

    fn authored(id: AssetId) -> Vec<SceneNode> {
        let white = Skin::Authored(Color::srgb(0.95, 0.95, 0.95));
        match id {
            AssetId::Board => vec![
                SceneNode::new(
                    "backboard",
                    Geometry::Cuboid {
                        size: Vec3::new(1.8, 1.05, 0.05),
                    },
                    Transform::from_xyz(0.0, 3.35, -1.2),
                    white,
                ),
                SceneNode::new(
                    "pole",
                    Geometry::Cylinder {
                        radius: 0.08,
                        height: 3.9,
                    },
                    Transform::from_xyz(0.0, 1.95, -1.5),
                    Skin::Authored(Color::srgb(0.2, 0.2, 0.22)),
                ),
                SceneNode::new(
                    "arm",
                    Geometry::Cuboid {
                        size: Vec3::new(0.1, 0.1, 0.3),
                    },
                    Transform::from_xyz(0.0, 3.35, -1.35),
                    Skin::Authored(Color::srgb(0.2, 0.2, 0.22)),
                ),
            ],
            AssetId::Ring => vec![
                SceneNode::new(
                    "rim",
                    Geometry::Torus {
                        minor_radius: 0.02,
                        major_radius: 0.23,
                    },
                    Transform::from_xyz(0.0, 3.05, -0.94),
                    Skin::Authored(Color::srgb(0.95, 0.35, 0.1)),
                ),
                SceneNode::new(
                    "net",
                    Geometry::Cylinder {
                        radius: 0.2,
                        height: 0.4,
                    },
                    Transform::from_xyz(0.0, 2.83, -0.94),
                    white,
                ),
            ],
            AssetId::Floor => vec![SceneNode::new(
                "court",
                Geometry::Cuboid {
                    size: Vec3::new(4.0, 0.02, 4.0),
                },
                Transform::from_xyz(0.0, 0.01, 0.5),
                Skin::Authored(Color::srgb(0.5, 0.5, 0.5)),
            )],
        }
    }
}

impl AssetStore for ProceduralAssets {
    fn load_asset(&self, id: AssetId) -> Result<NodeGroup, AssetError> {
        if self.missing.contains(&id) {
            return Err(AssetError::Missing(id));
        }
        Ok(NodeGroup {
            asset: id,
            nodes: Self::authored(id),
        })
    }
}

/// Keeps the window redrawing while a session runs; reactive updates otherwise.
pub struct WinitIdleDisplay<'a> {
    pub settings: &'a mut WinitSettings,
}

impl IdleDisplay for WinitIdleDisplay<'_> {
    fn set_idle_timer_disabled(&mut self, disabled: bool) {
        *self.settings = if disabled {
            WinitSettings::game()
        } else {
            WinitSettings::desktop_app()
        };
    }
}

pub fn draw_surface_grid(grids: Query<&Transform, With<SurfaceGrid>>, mut gizmos: Gizmos) {
    let color = Color::srgba(0.6, 0.9, 1.0, 0.8);
    for transform in &grids {
        // The grid mesh is a unit rectangle scaled to the plane extent.
        let size = transform.scale.truncate();
        if size.x <= 0.0 || size.y <= 0.0 {
            continue;
        }
        let cells = (size / GRID_CELL).ceil().max(Vec2::ONE);
        let lift = Vec3::Y * 0.002;
        let to_world = |x: f32, y: f32| {
            transform.translation + transform.rotation * Vec3::new(x, y, 0.0) + lift
        };
        let half = size * 0.5;

        for i in 0..=cells.x as u32 {
            let x = -half.x + size.x * i as f32 / cells.x;
            gizmos.line(to_world(x, -half.y), to_world(x, half.y), color);
        }
        for j in 0..=cells.y as u32 {
            let y = -half.y + size.y * j as f32 / cells.y;
            gizmos.line(to_world(-half.x, y), to_world(half.x, y), color);
        }
    }
}
