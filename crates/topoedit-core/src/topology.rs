//! Topology model: links, waypoints and points of presence.

use crate::geo::LatLng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Stable identity of a link across reconciliation passes.
    LinkId
);
string_id!(
    /// Identity of a waypoint, unique within its link.
    WaypointId
);
string_id!(
    /// Identity of a point of presence.
    PopId
);

/// Topology errors.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Unknown link: {0}")]
    UnknownLink(LinkId),
    #[error("Unknown waypoint {waypoint_id} on link {link_id}")]
    UnknownWaypoint {
        link_id: LinkId,
        waypoint_id: WaypointId,
    },
    #[error("Unknown point of presence: {0}")]
    UnknownPop(PopId),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;

/// One point along a link's path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(rename = "waypointId")]
    pub waypoint_id: WaypointId,
    pub lat: f64,
    pub lon: f64,
    /// Terminal waypoint of the link.
    #[serde(default)]
    pub endpoint: bool,
    /// Point of presence this terminal attaches to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pop: Option<PopId>,
}

impl Waypoint {
    /// Create a plain bend point.
    pub fn new(waypoint_id: impl Into<WaypointId>, coord: LatLng) -> Self {
        Self {
            waypoint_id: waypoint_id.into(),
            lat: coord.lat,
            lon: coord.lon,
            endpoint: false,
            pop: None,
        }
    }

    /// Create a terminal waypoint attached to a point of presence.
    pub fn terminal(
        waypoint_id: impl Into<WaypointId>,
        coord: LatLng,
        pop: impl Into<PopId>,
    ) -> Self {
        Self {
            endpoint: true,
            pop: Some(pop.into()),
            ..Self::new(waypoint_id, coord)
        }
    }

    /// Position as a coordinate.
    pub fn lat_lng(&self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }

    /// Overwrite the position.
    pub fn set_lat_lng(&mut self, coord: LatLng) {
        self.lat = coord.lat;
        self.lon = coord.lon;
    }
}

/// An adjacency drawn through an ordered list of waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "linkId")]
    pub link_id: LinkId,
    /// Waypoints in drawing order.
    #[serde(default)]
    pub path: Vec<Waypoint>,
}

impl Link {
    /// Create a link through `path`.
    pub fn new(link_id: impl Into<LinkId>, path: Vec<Waypoint>) -> Self {
        Self {
            link_id: link_id.into(),
            path,
        }
    }

    /// Waypoint of this link by id.
    pub fn waypoint(&self, waypoint_id: &WaypointId) -> Option<&Waypoint> {
        self.path.iter().find(|w| &w.waypoint_id == waypoint_id)
    }

    /// Mutable waypoint lookup.
    pub fn waypoint_mut(&mut self, waypoint_id: &WaypointId) -> Option<&mut Waypoint> {
        self.path.iter_mut().find(|w| &w.waypoint_id == waypoint_id)
    }

    /// Terminal waypoints of this link.
    pub fn endpoints(&self) -> impl Iterator<Item = &Waypoint> {
        self.path.iter().filter(|w| w.endpoint)
    }
}

/// A named location shared by the endpoints of one or more links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pop {
    #[serde(rename = "popId")]
    pub pop_id: PopId,
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Pop {
    /// Create a PoP at `coord`.
    pub fn new(pop_id: impl Into<PopId>, name: impl Into<String>, coord: LatLng) -> Self {
        Self {
            pop_id: pop_id.into(),
            name: name.into(),
            lat: coord.lat,
            lon: coord.lon,
        }
    }

    /// Position as a coordinate.
    pub fn lat_lng(&self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }

    /// Overwrite the position.
    pub fn set_lat_lng(&mut self, coord: LatLng) {
        self.lat = coord.lat;
        self.lon = coord.lon;
    }
}

/// Names what moved so shared positions can be propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDirective {
    /// A terminal waypoint on an adjacency was relocated.
    AdjacencyMoved {
        link_id: LinkId,
        waypoint_id: WaypointId,
    },
    /// A point of presence was relocated.
    PopMoved { pop_id: PopId },
}

/// The network diagram model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    pops: Vec<Pop>,
}

impl Topology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a topology from JSON.
    pub fn from_json(json: &str) -> TopologyResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the topology to pretty-printed JSON.
    pub fn to_json(&self) -> TopologyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Append a link (builder style).
    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    /// Append a PoP (builder style).
    pub fn with_pop(mut self, pop: Pop) -> Self {
        self.pops.push(pop);
        self
    }

    /// Links in document order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Mutable links. Call `update` on the layer afterwards.
    pub fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.links
    }

    /// Points of presence.
    pub fn pops(&self) -> &[Pop] {
        &self.pops
    }

    /// Link by id.
    pub fn link(&self, link_id: &LinkId) -> Option<&Link> {
        self.links.iter().find(|l| &l.link_id == link_id)
    }

    /// Mutable link by id.
    pub fn link_mut(&mut self, link_id: &LinkId) -> Option<&mut Link> {
        self.links.iter_mut().find(|l| &l.link_id == link_id)
    }

    /// Append a link.
    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
    }

    /// Remove a link, returning it if it was present.
    pub fn remove_link(&mut self, link_id: &LinkId) -> Option<Link> {
        let index = self.links.iter().position(|l| &l.link_id == link_id)?;
        Some(self.links.remove(index))
    }

    /// PoP by id.
    pub fn pop(&self, pop_id: &PopId) -> Option<&Pop> {
        self.pops.iter().find(|p| &p.pop_id == pop_id)
    }

    fn pop_mut(&mut self, pop_id: &PopId) -> Option<&mut Pop> {
        self.pops.iter_mut().find(|p| &p.pop_id == pop_id)
    }

    /// Append a PoP.
    pub fn add_pop(&mut self, pop: Pop) {
        self.pops.push(pop);
    }

    /// Look up a waypoint by link and waypoint id.
    pub fn waypoint(
        &self,
        link_id: &LinkId,
        waypoint_id: &WaypointId,
    ) -> TopologyResult<&Waypoint> {
        let link = self
            .link(link_id)
            .ok_or_else(|| TopologyError::UnknownLink(link_id.clone()))?;
        link.waypoint(waypoint_id)
            .ok_or_else(|| TopologyError::UnknownWaypoint {
                link_id: link_id.clone(),
                waypoint_id: waypoint_id.clone(),
            })
    }

    /// Write a new coordinate into a waypoint. No propagation happens here;
    /// follow with [`Topology::sync_adj_endpoints`] for terminal waypoints.
    pub fn move_waypoint(
        &mut self,
        link_id: &LinkId,
        waypoint_id: &WaypointId,
        coord: LatLng,
    ) -> TopologyResult<&Waypoint> {
        let link = self
            .link_mut(link_id)
            .ok_or_else(|| TopologyError::UnknownLink(link_id.clone()))?;
        let waypoint = link
            .waypoint_mut(waypoint_id)
            .ok_or_else(|| TopologyError::UnknownWaypoint {
                link_id: link_id.clone(),
                waypoint_id: waypoint_id.clone(),
            })?;
        waypoint.set_lat_lng(coord);
        Ok(&*waypoint)
    }

    /// Relocate a point of presence. Attached endpoints keep their old
    /// coordinate until a [`SyncDirective::PopMoved`] sync runs.
    pub fn move_pop(&mut self, pop_id: &PopId, coord: LatLng) -> TopologyResult<()> {
        let pop = self
            .pop_mut(pop_id)
            .ok_or_else(|| TopologyError::UnknownPop(pop_id.clone()))?;
        pop.set_lat_lng(coord);
        Ok(())
    }

    /// Propagate a moved endpoint or PoP to every terminal waypoint that
    /// references the same PoP.
    ///
    /// Returns the number of waypoints now sitting on the PoP coordinate.
    /// When an endpoint names a PoP with no record, the other endpoints are
    /// still moved before [`TopologyError::UnknownPop`] is returned.
    pub fn sync_adj_endpoints(&mut self, directive: &SyncDirective) -> TopologyResult<usize> {
        let (pop_id, coord, pop_missing) = match directive {
            SyncDirective::AdjacencyMoved { link_id, waypoint_id } => {
                let waypoint = self.waypoint(link_id, waypoint_id)?;
                let pop_id = match (&waypoint.pop, waypoint.endpoint) {
                    (Some(pop_id), true) => pop_id.clone(),
                    _ => {
                        log::debug!("Waypoint {waypoint_id} on {link_id} is not attached to a PoP");
                        return Ok(0);
                    }
                };
                let coord = waypoint.lat_lng();
                let pop_missing = match self.pop_mut(&pop_id) {
                    Some(pop) => {
                        pop.set_lat_lng(coord);
                        false
                    }
                    None => true,
                };
                (pop_id, coord, pop_missing)
            }
            SyncDirective::PopMoved { pop_id } => {
                let pop = self
                    .pop(pop_id)
                    .ok_or_else(|| TopologyError::UnknownPop(pop_id.clone()))?;
                (pop_id.clone(), pop.lat_lng(), false)
            }
        };

        let mut synced = 0;
        for waypoint in self
            .links
            .iter_mut()
            .flat_map(|link| link.path.iter_mut())
            .filter(|w| w.endpoint && w.pop.as_ref() == Some(&pop_id))
        {
            waypoint.set_lat_lng(coord);
            synced += 1;
        }
        log::debug!("Synced {synced} endpoints to PoP {pop_id}");
        // Endpoints still agree with each other when the record is absent.
        if pop_missing {
            return Err(TopologyError::UnknownPop(pop_id));
        }
        Ok(synced)
    }
}
