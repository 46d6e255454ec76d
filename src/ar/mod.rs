//! Anchor tracking and content placement, independent of how the AR runtime is provided.
//! - `surface`: grid overlay on the first detected horizontal plane.
//! - `placement`: the one-shot placement of the hoop assembly.
//! - `session`: tracking start/pause around the AR view.

pub mod anchor;
pub mod collab;
pub mod placement;
pub mod scene_node;
pub mod session;
pub mod surface;

pub use anchor::{AnchorEvent, AnchorId, AnchorKind, PlaneAlignment, PlaneExtent};
pub use collab::{
    AssetError, AssetStore, GestureInput, HitSource, HitTestService, IdleDisplay, NodeHandle,
    SceneGraph, TrackingConfig, TrackingService, WorldHit,
};
pub use placement::{
    AssetId, PlacementContext, PlacementController, PlacementOutcome, PlacementState,
};
pub use scene_node::{Geometry, NodeGroup, SceneNode, Skin};
pub use session::SessionLifecycleManager;
pub use surface::SurfaceVisualizer;
