use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;

use super::placement::AssetId;

/// Authored shape of a node. Everything is meshed from Bevy primitives.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Geometry {
    /// Lies in the local XY plane, like a picture frame. Rotate to lay it flat.
    Rectangle { width: f32, height: f32 },
    Cuboid { size: Vec3 },
    Cylinder { radius: f32, height: f32 },
    Torus { minor_radius: f32, major_radius: f32 },
}

impl Geometry {
    pub fn to_mesh(&self) -> Mesh {
        match *self {
            Geometry::Rectangle { width, height } => Mesh::from(Rectangle::new(width, height)),
            Geometry::Cuboid { size } => Mesh::from(Cuboid::from_size(size)),
            Geometry::Cylinder { radius, height } => Mesh::from(Cylinder::new(radius, height)),
            Geometry::Torus {
                minor_radius,
                major_radius,
            } => Mesh::from(Torus {
                minor_radius,
                major_radius,
            }),
        }
    }
}

/// Surface material reference, resolved to a real material by the scene graph.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Skin {
    /// Marks the surface visualization.
    Grid,
    Floor,
    Authored(Color),
}

#[derive(Clone, PartialEq, Debug)]
pub enum CollisionShape {
    ConcavePolyhedron {
        vertices: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
    },
}

impl CollisionShape {
    /// Triangle soup of the mesh, in the mesh's local space.
    /// Returns `None` for meshes that are not triangle lists or carry no positions.
    pub fn from_mesh(mesh: &Mesh) -> Option<Self> {
        if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
            return None;
        }
        let positions = mesh.attribute(Mesh::ATTRIBUTE_POSITION)?.as_float3()?;
        let vertices: Vec<Vec3> = positions.iter().map(|p| Vec3::from_array(*p)).collect();

        let flat: Vec<u32> = match mesh.indices() {
            Some(indices) => indices.iter().map(|i| i as u32).collect(),
            None => (0..vertices.len() as u32).collect(),
        };
        let triangles: Vec<[u32; 3]> = flat
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        if triangles.is_empty() {
            return None;
        }

        Some(CollisionShape::ConcavePolyhedron {
            vertices,
            triangles,
        })
    }

    pub fn triangle_count(&self) -> usize {
        match self {
            CollisionShape::ConcavePolyhedron { triangles, .. } => triangles.len(),
        }
    }
}

/// Immovable physics body. Simulation itself is left to whichever physics backend is plugged in.
#[derive(Component, Clone, PartialEq, Debug)]
pub struct StaticBody {
    pub shape: CollisionShape,
}

#[derive(Clone, PartialEq, Debug)]
pub struct SceneNode {
    pub name: String,
    pub geometry: Geometry,
    pub transform: Transform,
    pub skin: Skin,
    pub body: Option<StaticBody>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, geometry: Geometry, transform: Transform, skin: Skin) -> Self {
        Self {
            name: name.into(),
            geometry,
            transform,
            skin,
            body: None,
        }
    }
}

/// Contents of one loaded asset.
#[derive(Clone, PartialEq, Debug)]
pub struct NodeGroup {
    pub asset: AssetId,
    pub nodes: Vec<SceneNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_collision_shape_has_twelve_triangles() {
        let mesh = Geometry::Cuboid { size: Vec3::ONE }.to_mesh();
        let shape = CollisionShape::from_mesh(&mesh).unwrap();
        assert_eq!(shape.triangle_count(), 12);
        let CollisionShape::ConcavePolyhedron { vertices, triangles } = shape;
        assert!(triangles
            .iter()
            .flatten()
            .all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn torus_and_rectangle_produce_shapes() {
        let torus = Geometry::Torus {
            minor_radius: 0.02,
            major_radius: 0.23,
        };
        assert!(CollisionShape::from_mesh(&torus.to_mesh()).is_some());

        let rect = Geometry::Rectangle {
            width: 1.0,
            height: 1.0,
        };
        assert_eq!(
            CollisionShape::from_mesh(&rect.to_mesh())
                .unwrap()
                .triangle_count(),
            2
        );
    }
}
