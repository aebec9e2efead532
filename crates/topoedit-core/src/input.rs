//! Pointer input and drag gesture tracking.

use crate::topology::{LinkId, WaypointId};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Maximum pointer travel (screen pixels) for a press/release to count as a click.
pub const CLICK_TOLERANCE: f64 = 3.0;

/// Two clicks on the same element within this window form a double click.
pub const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(500);

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event delivered by the host, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, button: MouseButton },
    Up { position: Point, button: MouseButton },
    Move { position: Point },
}

impl PointerEvent {
    /// Screen position carried by the event.
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position } => position,
        }
    }
}

/// Addresses one control point on the surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlPointKey {
    pub link_id: LinkId,
    pub waypoint_id: WaypointId,
}

impl ControlPointKey {
    /// Address the marker of `waypoint_id` on `link_id`.
    pub fn new(link_id: impl Into<LinkId>, waypoint_id: impl Into<WaypointId>) -> Self {
        Self {
            link_id: link_id.into(),
            waypoint_id: waypoint_id.into(),
        }
    }
}

/// Surface element under the pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HitTarget {
    ControlPoint(ControlPointKey),
    Link(LinkId),
}

/// Drag interaction state of the editor layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        target: ControlPointKey,
        /// Screen position of the marker when the drag began.
        origin: Point,
    },
}

impl DragState {
    /// True between drag start and drag end.
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    /// Control point being dragged, if any.
    pub fn target(&self) -> Option<&ControlPointKey> {
        match self {
            DragState::Dragging { target, .. } => Some(target),
            DragState::Idle => None,
        }
    }
}

/// Maps raw pointer positions to drag positions relative to the drag origin,
/// so a gesture starts exactly on the marker wherever it was grabbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGesture {
    pub origin: Point,
    pub pointer_start: Point,
}

impl DragGesture {
    /// Start a gesture grabbed at `pointer_start` on a marker at `origin`.
    pub fn new(origin: Point, pointer_start: Point) -> Self {
        Self {
            origin,
            pointer_start,
        }
    }

    /// Pointer travel since the gesture began.
    pub fn delta(&self, pointer: Point) -> Vec2 {
        pointer - self.pointer_start
    }

    /// Drag position for the current pointer location.
    pub fn position(&self, pointer: Point) -> Point {
        self.origin + self.delta(pointer)
    }
}

/// Press/hover bookkeeping between pointer events.
#[derive(Debug, Clone, Default)]
pub(crate) struct PointerTracker {
    /// Element and position of the last button press.
    pub pressed: Option<(HitTarget, Point)>,
    pub hovered: Option<HitTarget>,
    pub gesture: Option<DragGesture>,
    /// Last completed click, for double click detection.
    last_click: Option<(HitTarget, Instant)>,
}

impl PointerTracker {
    /// Whether a release at `position` completes a click on `target`.
    pub fn is_click(&self, target: &HitTarget, position: Point) -> bool {
        self.pressed
            .as_ref()
            .is_some_and(|(pressed, start)| {
                pressed == target && start.distance(position) <= CLICK_TOLERANCE
            })
    }

    /// Record a click; returns true when it completes a double click.
    pub fn register_click(&mut self, target: &HitTarget) -> bool {
        let now = Instant::now();
        let double = self
            .last_click
            .as_ref()
            .is_some_and(|(last, at)| {
                last == target && now.duration_since(*at) < DOUBLE_CLICK_TIME
            });
        // A double click resets so a third click starts over
        self.last_click = if double { None } else { Some((target.clone(), now)) };
        double
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gesture_starts_on_origin() {
        let gesture = DragGesture::new(Point::new(100.0, 100.0), Point::new(103.0, 98.0));
        assert_eq!(gesture.position(Point::new(103.0, 98.0)), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_gesture_follows_pointer_delta() {
        let gesture = DragGesture::new(Point::new(100.0, 100.0), Point::new(103.0, 98.0));
        let delta = gesture.delta(Point::new(153.0, 118.0));
        assert!((delta.x - 50.0).abs() < f64::EPSILON);
        assert!((delta.y - 20.0).abs() < f64::EPSILON);
        assert_eq!(gesture.position(Point::new(153.0, 118.0)), Point::new(150.0, 120.0));
    }

    #[test]
    fn test_drag_state() {
        let idle = DragState::default();
        assert!(!idle.is_dragging());
        assert!(idle.target().is_none());

        let dragging = DragState::Dragging {
            target: ControlPointKey::new("l", "w"),
            origin: Point::ZERO,
        };
        assert!(dragging.is_dragging());
        assert_eq!(dragging.target(), Some(&ControlPointKey::new("l", "w")));
    }

    #[test]
    fn test_click_tolerance() {
        let target = HitTarget::Link("l".into());
        let tracker = PointerTracker {
            pressed: Some((target.clone(), Point::new(10.0, 10.0))),
            ..Default::default()
        };
        assert!(tracker.is_click(&target, Point::new(11.0, 12.0)));
        assert!(!tracker.is_click(&target, Point::new(20.0, 10.0)));
        assert!(!tracker.is_click(&HitTarget::Link("other".into()), Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_double_click_detection() {
        let target = HitTarget::Link("l".into());
        let mut tracker = PointerTracker::default();
        assert!(!tracker.register_click(&target));
        assert!(tracker.register_click(&target));
        // Third click starts a new pair
        assert!(!tracker.register_click(&target));
    }

    #[test]
    fn test_double_click_needs_same_target() {
        let mut tracker = PointerTracker::default();
        assert!(!tracker.register_click(&HitTarget::Link("a".into())));
        assert!(!tracker.register_click(&HitTarget::Link("b".into())));
    }

    #[test]
    fn test_pointer_event_position() {
        let event = PointerEvent::Down {
            position: Point::new(4.0, 5.0),
            button: MouseButton::Left,
        };
        assert_eq!(event.position(), Point::new(4.0, 5.0));
    }
}
