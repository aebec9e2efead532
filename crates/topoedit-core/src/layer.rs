//! Base layer shared by every topology layer.

use crate::events::EventRegistry;
use crate::geo::LatLng;
use crate::projection::Projection;
use crate::surface::RenderStats;
use crate::topology::{Link, Pop, SyncDirective, Topology, Waypoint};
use kurbo::Point;
use uuid::Uuid;

/// State every layer carries: projection, topology and event registries.
pub struct BaseLayer {
    layer_id: String,
    name: String,
    projection: Box<dyn Projection>,
    topology: Option<Topology>,
    link_events: EventRegistry<Link>,
    endpoint_events: EventRegistry<Waypoint>,
    pop_events: EventRegistry<Pop>,
}

impl BaseLayer {
    /// Create a layer with a fresh `layer-<uuid>` id and no topology.
    pub fn new(name: impl Into<String>, projection: Box<dyn Projection>) -> Self {
        Self {
            layer_id: format!("layer-{}", Uuid::new_v4()),
            name: name.into(),
            projection,
            topology: None,
            link_events: EventRegistry::new(),
            endpoint_events: EventRegistry::new(),
            pop_events: EventRegistry::new(),
        }
    }

    /// Unique id of this layer instance.
    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    /// Human readable name used in log messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active geo/screen projection.
    pub fn projection(&self) -> &dyn Projection {
        self.projection.as_ref()
    }

    /// Replace the projection. Takes effect on the next update.
    pub fn set_projection(&mut self, projection: impl Projection + 'static) {
        self.projection = Box::new(projection);
    }

    /// Project a coordinate to screen space.
    pub fn lat_lng_to_xy(&self, coord: LatLng) -> Point {
        self.projection.lat_lng_to_xy(coord)
    }

    /// Map a screen point back to a coordinate.
    pub fn xy_to_lat_lng(&self, xy: Point) -> LatLng {
        self.projection.xy_to_lat_lng(xy)
    }

    /// Topology being edited, if one was set.
    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    /// Mutable topology access. Call `update` afterwards to re-render.
    pub fn topology_mut(&mut self) -> Option<&mut Topology> {
        self.topology.as_mut()
    }

    /// Store a topology without notifying anyone. Returns the previous one.
    pub fn replace_topology(&mut self, topology: Topology) -> Option<Topology> {
        self.topology.replace(topology)
    }

    /// Detach the topology, leaving the layer without one.
    pub fn take_topology(&mut self) -> Option<Topology> {
        self.topology.take()
    }

    /// Handlers attached to entering link paths.
    pub fn link_events(&self) -> &EventRegistry<Link> {
        &self.link_events
    }

    /// Mutable link handler registry.
    pub fn link_events_mut(&mut self) -> &mut EventRegistry<Link> {
        &mut self.link_events
    }

    /// Handlers attached to entering control points.
    pub fn endpoint_events(&self) -> &EventRegistry<Waypoint> {
        &self.endpoint_events
    }

    /// Mutable control point handler registry.
    pub fn endpoint_events_mut(&mut self) -> &mut EventRegistry<Waypoint> {
        &mut self.endpoint_events
    }

    /// Handlers fired with the PoP of a terminal control point.
    pub fn pop_events(&self) -> &EventRegistry<Pop> {
        &self.pop_events
    }

    /// Mutable PoP handler registry.
    pub fn pop_events_mut(&mut self) -> &mut EventRegistry<Pop> {
        &mut self.pop_events
    }
}

/// Update-trigger protocol implemented by concrete layers.
pub trait Layer {
    fn base(&self) -> &BaseLayer;

    fn base_mut(&mut self) -> &mut BaseLayer;

    /// Reconcile the rendered elements with the current topology, syncing
    /// shared positions first when a directive is given. Returns `None` when
    /// there is nothing to render from.
    fn update(&mut self, directive: Option<SyncDirective>) -> Option<RenderStats>;

    /// Assign the active topology and re-render.
    fn set_topology(&mut self, topology: Topology) -> &mut Self
    where
        Self: Sized,
    {
        self.base_mut().replace_topology(topology);
        self.update(None);
        self
    }

    fn topology(&self) -> Option<&Topology> {
        self.base().topology()
    }
}
