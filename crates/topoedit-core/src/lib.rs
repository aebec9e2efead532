//! topoedit Core Library
//!
//! Platform-agnostic editing layer for network topology diagrams: the
//! topology model, geo projection, keyed reconciliation onto a retained
//! drawing surface, and the drag interaction that keeps shared points of
//! presence attached.

pub mod config;
pub mod editor;
pub mod events;
pub mod geo;
pub mod input;
pub mod layer;
pub mod projection;
pub mod reconcile;
pub mod surface;
pub mod topology;

pub use config::{ConfigError, EditorConfig};
pub use editor::{EditHook, EditorLayer};
pub use events::{ElementEvent, EventKind, EventRegistry, Handler, UiEvent};
pub use geo::LatLng;
pub use input::{ControlPointKey, DragGesture, DragState, HitTarget, MouseButton, PointerEvent};
pub use layer::{BaseLayer, Layer};
pub use projection::{FnProjection, Projection, Viewport};
pub use reconcile::{KeyedDiff, diff};
pub use surface::{ControlPoint, ElementId, LinkGroup, PathElement, RenderStats, Surface};
pub use topology::{
    Link, LinkId, Pop, PopId, SyncDirective, Topology, TopologyError, TopologyResult, Waypoint,
    WaypointId,
};
