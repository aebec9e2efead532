//! Retained drawing surface the editor layer reconciles into.
//!
//! The surface mirrors what a scene graph or SVG DOM would hold: one group per
//! link with two path primitives and a marker per waypoint. Renderers walk it
//! read-only; only the editor layer mutates it.

use crate::events::EventRegistry;
use crate::projection::Projection;
use crate::topology::{Link, LinkId, Pop, Waypoint, WaypointId};
use kurbo::{BezPath, PathEl, Point};
use std::sync::atomic::{AtomicU64, Ordering};

/// Control point marker radius in screen pixels.
pub const CONTROL_POINT_RADIUS: f64 = 6.0;

/// Stroke width of the shadow path used as the pointer hit target.
pub const SHADOW_HIT_WIDTH: f64 = 12.0;

/// Class names attached to surface elements.
pub mod class {
    pub const EDITOR: &str = "editor";
    pub const ADJACENCY: &str = "adjacency";
    pub const SHADOW: &str = "editorShadow";
    pub const HIGHLIGHT: &str = "editorHighlight";
    pub const CONTROL_POINTS: &str = "adjacency-control-points";
    pub const CONTROL_POINT: &str = "control-point";
    pub const HIDDEN: &str = "hidden";
    pub const END_POINT: &str = "end-point";
}

static NEXT_ELEMENT: AtomicU64 = AtomicU64::new(1);

/// Identity of a created element. Survives updates, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        Self(NEXT_ELEMENT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Counts of element operations performed by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

impl RenderStats {
    /// True when the pass only updated existing elements.
    pub fn is_stable(&self) -> bool {
        self.created == 0 && self.removed == 0
    }
}

/// Map each waypoint to the screen in path order, joined by straight segments.
pub fn path_geometry(path: &[Waypoint], projection: &dyn Projection) -> BezPath {
    let mut geometry = BezPath::new();
    let mut points = path.iter().map(|w| projection.lat_lng_to_xy(w.lat_lng()));
    if let Some(first) = points.next() {
        geometry.move_to(first);
        for point in points {
            geometry.line_to(point);
        }
    }
    geometry
}

/// A stroked path primitive of a link group.
#[derive(Debug, Clone)]
pub struct PathElement {
    pub element: ElementId,
    pub class: &'static str,
    pub geometry: BezPath,
    pub listeners: EventRegistry<Link>,
}

impl PathElement {
    fn new(class: &'static str, geometry: BezPath, listeners: EventRegistry<Link>) -> Self {
        Self {
            element: ElementId::next(),
            class,
            geometry,
            listeners,
        }
    }

    /// Distance from `point` to the nearest segment of the polyline.
    pub fn distance_to(&self, point: Point) -> Option<f64> {
        let mut nearest: Option<f64> = None;
        let mut previous: Option<Point> = None;
        for element in self.geometry.elements() {
            let distance = match *element {
                PathEl::MoveTo(p) => {
                    previous = Some(p);
                    point.distance(p)
                }
                PathEl::LineTo(p) => {
                    let start = previous.unwrap_or(p);
                    previous = Some(p);
                    distance_to_segment(point, start, p)
                }
                _ => continue,
            };
            nearest = Some(nearest.map_or(distance, |d| d.min(distance)));
        }
        nearest
    }
}

fn distance_to_segment(point: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let length_sq = ab.hypot2();
    if length_sq == 0.0 {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

/// Draggable marker for one waypoint.
#[derive(Debug, Clone)]
pub struct ControlPoint {
    pub element: ElementId,
    pub waypoint_id: WaypointId,
    /// Centre in screen coordinates.
    pub center: Point,
    pub radius: f64,
    /// Terminal marker; drives the `end-point`/`hidden` classes.
    pub endpoint: bool,
    pub listeners: EventRegistry<Waypoint>,
    pub pop_listeners: EventRegistry<Pop>,
}

impl ControlPoint {
    pub(crate) fn enter(
        waypoint: &Waypoint,
        projection: &dyn Projection,
        listeners: EventRegistry<Waypoint>,
        pop_listeners: EventRegistry<Pop>,
    ) -> Self {
        Self {
            element: ElementId::next(),
            waypoint_id: waypoint.waypoint_id.clone(),
            center: projection.lat_lng_to_xy(waypoint.lat_lng()),
            radius: CONTROL_POINT_RADIUS,
            endpoint: waypoint.endpoint,
            listeners,
            pop_listeners,
        }
    }

    pub(crate) fn refresh(&mut self, waypoint: &Waypoint, projection: &dyn Projection) {
        self.center = projection.lat_lng_to_xy(waypoint.lat_lng());
        self.endpoint = waypoint.endpoint;
    }

    /// Class list, terminal markers distinguished from bend points.
    pub fn classes(&self) -> Vec<&'static str> {
        if self.endpoint {
            vec![class::CONTROL_POINT, class::END_POINT]
        } else {
            vec![class::CONTROL_POINT, class::HIDDEN]
        }
    }

    /// Whether `name` is in [`ControlPoint::classes`].
    pub fn has_class(&self, name: &str) -> bool {
        self.classes().contains(&name)
    }

    /// Bend points carry the `hidden` class.
    pub fn is_hidden(&self) -> bool {
        !self.endpoint
    }

    /// Whether `point` falls inside the marker.
    pub fn hit_test(&self, point: Point) -> bool {
        point.distance(self.center) <= self.radius
    }
}

/// Everything drawn for one link.
#[derive(Debug, Clone)]
pub struct LinkGroup {
    pub element: ElementId,
    pub link_id: LinkId,
    /// Wide transparent stroke that receives pointer events.
    pub shadow: PathElement,
    /// Thin visible stroke.
    pub highlight: PathElement,
    /// Markers in path order.
    pub control_points: Vec<ControlPoint>,
}

impl LinkGroup {
    pub(crate) fn enter(
        link_id: LinkId,
        geometry: BezPath,
        listeners: &EventRegistry<Link>,
        control_points: Vec<ControlPoint>,
    ) -> Self {
        Self {
            element: ElementId::next(),
            link_id,
            shadow: PathElement::new(class::SHADOW, geometry.clone(), listeners.clone()),
            highlight: PathElement::new(class::HIGHLIGHT, geometry, listeners.clone()),
            control_points,
        }
    }

    /// Class of every link group.
    pub fn class(&self) -> &'static str {
        class::ADJACENCY
    }

    /// Marker for `waypoint_id`, if rendered.
    pub fn control_point(&self, waypoint_id: &WaypointId) -> Option<&ControlPoint> {
        self.control_points.iter().find(|c| &c.waypoint_id == waypoint_id)
    }

    /// Mutable marker lookup.
    pub fn control_point_mut(&mut self, waypoint_id: &WaypointId) -> Option<&mut ControlPoint> {
        self.control_points
            .iter_mut()
            .find(|c| &c.waypoint_id == waypoint_id)
    }

    /// Check whether `point` falls on the shadow stroke.
    pub fn hit_test_path(&self, point: Point) -> bool {
        self.shadow
            .distance_to(point)
            .is_some_and(|d| d <= SHADOW_HIT_WIDTH / 2.0)
    }
}

/// The drawing surface handle an editor layer renders into.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    id: String,
    class: String,
    groups: Vec<LinkGroup>,
}

impl Surface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Element id; the editor sets it to its layer id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the element id.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Class attribute of the surface root.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Set the root class attribute.
    pub fn set_class(&mut self, class: impl Into<String>) {
        self.class = class.into();
    }

    /// Link groups in insertion order.
    pub fn groups(&self) -> &[LinkGroup] {
        &self.groups
    }

    /// Group rendered for `link_id`.
    pub fn group(&self, link_id: &LinkId) -> Option<&LinkGroup> {
        self.groups.iter().find(|g| &g.link_id == link_id)
    }

    pub(crate) fn group_mut(&mut self, link_id: &LinkId) -> Option<&mut LinkGroup> {
        self.groups.iter_mut().find(|g| &g.link_id == link_id)
    }

    pub(crate) fn insert_group(&mut self, group: LinkGroup) {
        self.groups.push(group);
    }

    pub(crate) fn remove_group(&mut self, link_id: &LinkId) -> Option<LinkGroup> {
        let index = self.groups.iter().position(|g| &g.link_id == link_id)?;
        Some(self.groups.remove(index))
    }

    /// Marker for one waypoint of one link.
    pub fn control_point(
        &self,
        link_id: &LinkId,
        waypoint_id: &WaypointId,
    ) -> Option<&ControlPoint> {
        self.group(link_id)?.control_point(waypoint_id)
    }

    pub(crate) fn control_point_mut(
        &mut self,
        link_id: &LinkId,
        waypoint_id: &WaypointId,
    ) -> Option<&mut ControlPoint> {
        self.group_mut(link_id)?.control_point_mut(waypoint_id)
    }

    /// Total number of control point markers.
    pub fn control_point_count(&self) -> usize {
        self.groups.iter().map(|g| g.control_points.len()).sum()
    }

    /// True when no link is rendered.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
