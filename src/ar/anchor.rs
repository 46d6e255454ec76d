use std::fmt;

use bevy::prelude::*;

/// Identifier the tracking service assigns to every anchor it reports.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AnchorId(pub u64);

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anchor#{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PlaneAlignment {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnchorKind {
    Plane(PlaneAlignment),
    /// Feature points, images, faces... anything that is not a plane.
    Other,
}

impl AnchorKind {
    pub fn is_horizontal_plane(self) -> bool {
        matches!(self, AnchorKind::Plane(PlaneAlignment::Horizontal))
    }
}

/// Width (x) and height (z) of a plane estimate, in metres.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct PlaneExtent {
    pub width: f32,
    pub height: f32,
}

impl PlaneExtent {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Whether a point given relative to the plane center lies on the plane.
    pub fn contains(self, local: Vec2) -> bool {
        local.x.abs() <= self.width * 0.5 && local.y.abs() <= self.height * 0.5
    }
}

#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub enum AnchorEvent {
    Added {
        id: AnchorId,
        kind: AnchorKind,
        center: Vec3,
        extent: PlaneExtent,
    },
    Updated {
        id: AnchorId,
        kind: AnchorKind,
        center: Vec3,
        extent: PlaneExtent,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_clamps_negative_sizes() {
        let e = PlaneExtent::new(-1.0, 2.0);
        assert_eq!(e.width, 0.0);
        assert_eq!(e.height, 2.0);
    }

    #[test]
    fn extent_contains_is_centered() {
        let e = PlaneExtent::new(2.0, 1.0);
        assert!(e.contains(Vec2::new(0.9, -0.4)));
        assert!(!e.contains(Vec2::new(1.1, 0.0)));
        assert!(!e.contains(Vec2::new(0.0, 0.6)));
    }

    #[test]
    fn only_horizontal_planes_qualify() {
        assert!(AnchorKind::Plane(PlaneAlignment::Horizontal).is_horizontal_plane());
        assert!(!AnchorKind::Plane(PlaneAlignment::Vertical).is_horizontal_plane());
        assert!(!AnchorKind::Other.is_horizontal_plane());
        assert_eq!(AnchorId(7).to_string(), "anchor#7");
    }
}
