//! Editor layer: renders a topology as draggable adjacencies.
//!
//! Each link becomes a group with a wide shadow path (pointer target), a thin
//! highlight path and one control point per waypoint. Dragging a control point
//! writes the new coordinate into the topology, syncs shared PoPs when the
//! point is a terminal, and reconciles the whole surface so connected paths
//! stay attached.

use crate::config::{ConfigError, EditorConfig};
use crate::events::{ElementEvent, EventKind, UiEvent};
use crate::geo::LatLng;
use crate::input::{
    ControlPointKey, DragGesture, DragState, HitTarget, MouseButton, PointerEvent, PointerTracker,
};
use crate::layer::{BaseLayer, Layer};
use crate::reconcile;
use crate::surface::{ControlPoint, LinkGroup, RenderStats, Surface, class, path_geometry};
use crate::topology::{
    Link, LinkId, Pop, PopId, SyncDirective, TopologyResult, Waypoint, WaypointId,
};
use kurbo::Point;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Lifecycle hook invoked with the layer as context.
pub type EditHook = Rc<dyn Fn(&EditorLayer)>;

fn noop_hook() -> EditHook {
    Rc::new(|_| {})
}

/// Editable rendering of a topology onto a [`Surface`].
pub struct EditorLayer {
    base: BaseLayer,
    surface: Surface,
    drag: DragState,
    pointer: PointerTracker,
    on_edit: EditHook,
    on_edit_end: EditHook,
}

impl fmt::Debug for EditorLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorLayer")
            .field("layer_id", &self.base.layer_id())
            .field("name", &self.base.name())
            .field("surface", &self.surface)
            .field("drag", &self.drag)
            .finish_non_exhaustive()
    }
}

impl EditorLayer {
    /// Create an editor layer. Fails when no surface was configured.
    pub fn new(config: EditorConfig) -> Result<Self, ConfigError> {
        let EditorConfig {
            surface,
            name,
            projection,
        } = config;
        let Some(mut surface) = surface else {
            log::error!("{}", ConfigError::MissingSurface);
            return Err(ConfigError::MissingSurface);
        };

        let base = BaseLayer::new(name, projection);
        surface.set_id(base.layer_id());
        surface.set_class(class::EDITOR);

        Ok(Self {
            base,
            surface,
            drag: DragState::Idle,
            pointer: PointerTracker::default(),
            on_edit: noop_hook(),
            on_edit_end: noop_hook(),
        })
    }

    /// The surface this layer renders into.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Current drag interaction state.
    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    /// Hook fired after every drag move.
    pub fn on_edit(&self) -> &EditHook {
        &self.on_edit
    }

    /// Replace the `on_edit` hook.
    pub fn set_on_edit(&mut self, hook: impl Fn(&EditorLayer) + 'static) -> &mut Self {
        self.on_edit = Rc::new(hook);
        self
    }

    /// Hook fired once when a drag is released.
    pub fn on_edit_end(&self) -> &EditHook {
        &self.on_edit_end
    }

    /// Replace the `on_edit_end` hook.
    pub fn set_on_edit_end(&mut self, hook: impl Fn(&EditorLayer) + 'static) -> &mut Self {
        self.on_edit_end = Rc::new(hook);
        self
    }

    /// Register a link handler. Applies to links entering after this call.
    pub fn on_link_event(
        &mut self,
        kind: EventKind,
        handler: impl Fn(&ElementEvent<'_, Link>) + 'static,
    ) -> &mut Self {
        self.base.link_events_mut().on(kind, handler);
        self
    }

    /// Register an endpoint (control point) handler.
    pub fn on_endpoint_event(
        &mut self,
        kind: EventKind,
        handler: impl Fn(&ElementEvent<'_, Waypoint>) + 'static,
    ) -> &mut Self {
        self.base.endpoint_events_mut().on(kind, handler);
        self
    }

    /// Register a PoP handler, fired from terminal control points.
    pub fn on_pop_event(
        &mut self,
        kind: EventKind,
        handler: impl Fn(&ElementEvent<'_, Pop>) + 'static,
    ) -> &mut Self {
        self.base.pop_events_mut().on(kind, handler);
        self
    }

    /// Relocate a PoP and re-render with every attached endpoint synced.
    pub fn move_pop(
        &mut self,
        pop_id: &PopId,
        coord: LatLng,
    ) -> TopologyResult<Option<RenderStats>> {
        let Some(topology) = self.base.topology_mut() else {
            log::warn!("No topology set, cannot move PoP {pop_id} on {}", self.base.name());
            return Ok(None);
        };
        topology.move_pop(pop_id, coord)?;
        Ok(self.update(Some(SyncDirective::PopMoved {
            pop_id: pop_id.clone(),
        })))
    }

    /// Begin dragging a control point. Returns the drag origin: the marker's
    /// current projected position.
    ///
    /// A drag still in progress is ended first, firing `on_edit_end`.
    /// Waypoints outside the projection's domain cannot be dragged.
    pub fn drag_start(&mut self, target: &ControlPointKey) -> Option<Point> {
        if self.drag.is_dragging() {
            log::debug!("Drag restarted without release, ending previous drag");
            self.drag_end();
        }

        let waypoint = self
            .base
            .topology()?
            .waypoint(&target.link_id, &target.waypoint_id)
            .ok()?;
        self.surface
            .control_point(&target.link_id, &target.waypoint_id)?;

        let coord = waypoint.lat_lng();
        if !self.base.projection().contains(coord) {
            log::warn!(
                "Waypoint {}/{} at {coord:?} is outside the projection, not draggable",
                target.link_id,
                target.waypoint_id
            );
            return None;
        }

        let origin = self.base.lat_lng_to_xy(coord);
        log::debug!(
            "Drag start on {}/{} at {origin:?}",
            target.link_id,
            target.waypoint_id
        );
        self.drag = DragState::Dragging {
            target: target.clone(),
            origin,
        };
        Some(origin)
    }

    /// Move the dragged control point to `position` (screen coordinates).
    ///
    /// Returns false when no drag is in progress, the position maps outside
    /// the projection, or the dragged waypoint has disappeared.
    pub fn drag_move(&mut self, position: Point) -> bool {
        let Some(target) = self.drag.target().cloned() else {
            return false;
        };
        let coord = self.base.xy_to_lat_lng(position);
        if !self.base.projection().contains(coord) {
            log::warn!("Dropping drag move to {position:?}: {coord:?} is outside the projection");
            return false;
        }

        // Optimistic redraw of the marker before the full pass
        if let Some(control_point) = self
            .surface
            .control_point_mut(&target.link_id, &target.waypoint_id)
        {
            control_point.center = position;
        }

        let Some(topology) = self.base.topology_mut() else {
            return false;
        };
        let endpoint = match topology.move_waypoint(&target.link_id, &target.waypoint_id, coord) {
            Ok(waypoint) => waypoint.endpoint,
            Err(err) => {
                log::warn!("Dropping drag move: {err}");
                return false;
            }
        };

        let directive = endpoint.then(|| SyncDirective::AdjacencyMoved {
            link_id: target.link_id.clone(),
            waypoint_id: target.waypoint_id.clone(),
        });
        self.update(directive);

        let hook = Rc::clone(&self.on_edit);
        hook(self);
        true
    }

    /// Release the drag. Fires `on_edit_end` once.
    pub fn drag_end(&mut self) -> bool {
        if !self.drag.is_dragging() {
            return false;
        }
        self.drag = DragState::Idle;

        let hook = Rc::clone(&self.on_edit_end);
        hook(self);
        true
    }

    /// Find the element under `point`. Control points win over paths, and
    /// later groups win over earlier ones.
    pub fn hit_test(&self, point: Point) -> Option<HitTarget> {
        for group in self.surface.groups().iter().rev() {
            let hit = group.control_points.iter().rev().find(|c| c.hit_test(point));
            if let Some(control_point) = hit {
                return Some(HitTarget::ControlPoint(ControlPointKey {
                    link_id: group.link_id.clone(),
                    waypoint_id: control_point.waypoint_id.clone(),
                }));
            }
        }
        self.surface
            .groups()
            .iter()
            .rev()
            .find(|g| g.hit_test_path(point))
            .map(|g| HitTarget::Link(g.link_id.clone()))
    }

    /// Invoke the handlers attached to `target` for `kind`.
    pub fn dispatch(&self, target: &HitTarget, kind: EventKind, position: Point) -> bool {
        let Some(topology) = self.base.topology() else {
            return false;
        };
        let event = UiEvent { kind, position };

        match target {
            HitTarget::Link(link_id) => {
                let (Some(group), Some(link)) =
                    (self.surface.group(link_id), topology.link(link_id))
                else {
                    return false;
                };
                group.shadow.listeners.emit(event, link)
            }
            HitTarget::ControlPoint(key) => {
                let (Some(control_point), Ok(waypoint)) = (
                    self.surface.control_point(&key.link_id, &key.waypoint_id),
                    topology.waypoint(&key.link_id, &key.waypoint_id),
                ) else {
                    return false;
                };
                let mut handled = control_point.listeners.emit(event, waypoint);
                let pop = waypoint
                    .pop
                    .as_ref()
                    .filter(|_| waypoint.endpoint)
                    .and_then(|pop_id| topology.pop(pop_id));
                if let Some(pop) = pop {
                    handled |= control_point.pop_listeners.emit(event, pop);
                }
                handled
            }
        }
    }

    /// Route a host pointer event through hit testing, dragging and handlers.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { position, button } => {
                // A press while dragging means the release was lost
                if self.pointer.gesture.take().is_some() {
                    self.drag_end();
                }
                let target = self.hit_test(position);
                if let Some(target) = &target {
                    self.dispatch(target, EventKind::MouseDown, position);
                    match (button, target) {
                        (MouseButton::Left, HitTarget::ControlPoint(key)) => {
                            if let Some(origin) = self.drag_start(key) {
                                self.pointer.gesture = Some(DragGesture::new(origin, position));
                            }
                        }
                        (MouseButton::Right, _) => {
                            self.dispatch(target, EventKind::ContextMenu, position);
                        }
                        _ => {}
                    }
                }
                self.pointer.pressed = target.map(|t| (t, position));
            }
            PointerEvent::Move { position } => match self.pointer.gesture {
                Some(gesture) => {
                    self.drag_move(gesture.position(position));
                }
                None => self.update_hover(position),
            },
            PointerEvent::Up { position, button } => {
                if self.pointer.gesture.take().is_some() {
                    self.drag_end();
                }
                if let Some(target) = self.hit_test(position) {
                    self.dispatch(&target, EventKind::MouseUp, position);
                    if button == MouseButton::Left && self.pointer.is_click(&target, position) {
                        self.dispatch(&target, EventKind::Click, position);
                        if self.pointer.register_click(&target) {
                            self.dispatch(&target, EventKind::DoubleClick, position);
                        }
                    }
                }
                self.pointer.pressed = None;
            }
        }
    }

    fn update_hover(&mut self, position: Point) {
        let target = self.hit_test(position);
        if target == self.pointer.hovered {
            return;
        }
        if let Some(previous) = self.pointer.hovered.take() {
            self.dispatch(&previous, EventKind::MouseOut, position);
            self.dispatch(&previous, EventKind::MouseLeave, position);
        }
        if let Some(current) = &target {
            self.dispatch(current, EventKind::MouseEnter, position);
            self.dispatch(current, EventKind::MouseOver, position);
        }
        self.pointer.hovered = target;
    }
}

impl Layer for EditorLayer {
    fn base(&self) -> &BaseLayer {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseLayer {
        &mut self.base
    }

    fn update(&mut self, directive: Option<SyncDirective>) -> Option<RenderStats> {
        if self.base.topology().is_none() {
            log::warn!("No topology set, skipping update for {}", self.base.name());
            return None;
        }

        if let (Some(directive), Some(topology)) = (directive, self.base.topology_mut()) {
            if let Err(err) = topology.sync_adj_endpoints(&directive) {
                log::warn!("Endpoint sync failed on {}: {err}", self.base.name());
            }
        }

        let stats = reconcile_surface(&mut self.surface, &self.base);
        log::debug!(
            "Reconciled {}: {} created, {} updated, {} removed",
            self.base.name(),
            stats.created,
            stats.updated,
            stats.removed
        );
        Some(stats)
    }
}

/// Bring the surface in line with the base layer's topology.
fn reconcile_surface(surface: &mut Surface, base: &BaseLayer) -> RenderStats {
    let mut stats = RenderStats::default();
    let Some(topology) = base.topology() else {
        return stats;
    };
    let projection = base.projection();

    let previous: Vec<LinkId> = surface.groups().iter().map(|g| g.link_id.clone()).collect();
    let current: Vec<LinkId> = topology.links().iter().map(|l| l.link_id.clone()).collect();
    let links = reconcile::diff(&previous, &current);

    for link_id in &links.delete {
        if let Some(group) = surface.remove_group(link_id) {
            stats.removed += 1 + group.control_points.len();
        }
    }

    for link_id in &links.update {
        let (Some(link), Some(group)) = (topology.link(link_id), surface.group_mut(link_id)) else {
            continue;
        };
        let geometry = path_geometry(&link.path, projection);
        group.shadow.geometry = geometry.clone();
        group.highlight.geometry = geometry;
        stats.updated += 1;
        update_control_points(group, link, base, &mut stats);
    }

    for link_id in &links.create {
        let Some(link) = topology.link(link_id) else {
            continue;
        };
        let ids: Vec<WaypointId> = link.path.iter().map(|w| w.waypoint_id.clone()).collect();
        let control_points: Vec<ControlPoint> = reconcile::diff(&[], &ids)
            .create
            .iter()
            .filter_map(|id| link.waypoint(id))
            .map(|waypoint| enter_control_point(waypoint, base))
            .collect();
        stats.created += 1 + control_points.len();
        surface.insert_group(LinkGroup::enter(
            link.link_id.clone(),
            path_geometry(&link.path, projection),
            base.link_events(),
            control_points,
        ));
    }

    stats
}

fn enter_control_point(waypoint: &Waypoint, base: &BaseLayer) -> ControlPoint {
    ControlPoint::enter(
        waypoint,
        base.projection(),
        base.endpoint_events().clone(),
        base.pop_events().clone(),
    )
}

/// Keyed update of one group's markers; the result follows path order.
fn update_control_points(
    group: &mut LinkGroup,
    link: &Link,
    base: &BaseLayer,
    stats: &mut RenderStats,
) {
    let previous: Vec<WaypointId> = group
        .control_points
        .iter()
        .map(|c| c.waypoint_id.clone())
        .collect();
    let current: Vec<WaypointId> = link.path.iter().map(|w| w.waypoint_id.clone()).collect();
    let waypoints = reconcile::diff(&previous, &current);
    stats.removed += waypoints.delete.len();

    let mut existing: HashMap<WaypointId, ControlPoint> = group
        .control_points
        .drain(..)
        .map(|c| (c.waypoint_id.clone(), c))
        .collect();

    let mut seen: HashSet<&WaypointId> = HashSet::new();
    for waypoint in &link.path {
        if !seen.insert(&waypoint.waypoint_id) {
            continue;
        }
        let control_point = match existing.remove(&waypoint.waypoint_id) {
            Some(mut control_point) => {
                control_point.refresh(waypoint, base.projection());
                stats.updated += 1;
                control_point
            }
            None => {
                stats.created += 1;
                enter_control_point(waypoint, base)
            }
        };
        group.control_points.push(control_point);
    }
}
