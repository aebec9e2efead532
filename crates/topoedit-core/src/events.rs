//! Typed pointer event registries for links, endpoints and PoPs.

use crate::config::ConfigError;
use kurbo::Point;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Pointer events an element can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    DoubleClick,
    MouseDown,
    MouseUp,
    MouseEnter,
    MouseLeave,
    MouseOver,
    MouseOut,
    ContextMenu,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::Click,
        EventKind::DoubleClick,
        EventKind::MouseDown,
        EventKind::MouseUp,
        EventKind::MouseEnter,
        EventKind::MouseLeave,
        EventKind::MouseOver,
        EventKind::MouseOut,
        EventKind::ContextMenu,
    ];

    /// DOM-style event name.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::DoubleClick => "dblclick",
            EventKind::MouseDown => "mousedown",
            EventKind::MouseUp => "mouseup",
            EventKind::MouseEnter => "mouseenter",
            EventKind::MouseLeave => "mouseleave",
            EventKind::MouseOver => "mouseover",
            EventKind::MouseOut => "mouseout",
            EventKind::ContextMenu => "contextmenu",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownEvent(s.to_string()))
    }
}

/// The pointer event that triggered a handler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiEvent {
    pub kind: EventKind,
    /// Pointer position in screen coordinates.
    pub position: Point,
}

/// What a handler receives: the event plus the model datum of the element.
#[derive(Debug)]
pub struct ElementEvent<'a, T> {
    pub event: UiEvent,
    pub data: &'a T,
}

/// A registered event handler.
pub type Handler<T> = Rc<dyn Fn(&ElementEvent<'_, T>)>;

/// Mapping from event kind to a single handler.
pub struct EventRegistry<T> {
    handlers: BTreeMap<EventKind, Handler<T>>,
}

impl<T> Default for EventRegistry<T> {
    fn default() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }
}

impl<T> Clone for EventRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<T> fmt::Debug for EventRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

impl<T> EventRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same kind.
    pub fn on(&mut self, kind: EventKind, handler: impl Fn(&ElementEvent<'_, T>) + 'static) {
        self.handlers.insert(kind, Rc::new(handler));
    }

    /// Register a handler by event name.
    pub fn on_named(
        &mut self,
        name: &str,
        handler: impl Fn(&ElementEvent<'_, T>) + 'static,
    ) -> Result<(), ConfigError> {
        let kind = name.parse()?;
        self.on(kind, handler);
        Ok(())
    }

    /// Remove the handler for `kind`.
    pub fn remove(&mut self, kind: EventKind) -> Option<Handler<T>> {
        self.handlers.remove(&kind)
    }

    /// Handler registered for `kind`.
    pub fn get(&self, kind: EventKind) -> Option<&Handler<T>> {
        self.handlers.get(&kind)
    }

    /// Whether a handler is registered for `kind`.
    pub fn contains(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Registered kinds in a stable order.
    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.handlers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invoke the handler for `event.kind`, if any.
    pub fn emit(&self, event: UiEvent, data: &T) -> bool {
        match self.handlers.get(&event.kind) {
            Some(handler) => {
                handler(&ElementEvent { event, data });
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_parse_event_names() {
        assert_eq!("click".parse::<EventKind>().unwrap(), EventKind::Click);
        assert_eq!("mouseenter".parse::<EventKind>().unwrap(), EventKind::MouseEnter);
        assert_eq!("DblClick".parse::<EventKind>().unwrap(), EventKind::DoubleClick);
        for kind in EventKind::ALL {
            assert_eq!(kind.name().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_event_name_is_config_error() {
        let err = "hover".parse::<EventKind>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEvent(ref name) if name == "hover"));

        let mut registry: EventRegistry<u32> = EventRegistry::new();
        assert!(registry.on_named("wiggle", |_| {}).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_single_handler_per_kind() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut registry: EventRegistry<u32> = EventRegistry::new();

        let first = Rc::clone(&calls);
        registry.on(EventKind::Click, move |e| first.borrow_mut().push(("first", *e.data)));
        let second = Rc::clone(&calls);
        registry.on(EventKind::Click, move |e| second.borrow_mut().push(("second", *e.data)));

        assert_eq!(registry.len(), 1);
        let event = UiEvent {
            kind: EventKind::Click,
            position: Point::new(1.0, 2.0),
        };
        assert!(registry.emit(event, &7));
        assert_eq!(*calls.borrow(), vec![("second", 7)]);
    }

    #[test]
    fn test_emit_without_handler() {
        let registry: EventRegistry<u32> = EventRegistry::new();
        let event = UiEvent {
            kind: EventKind::MouseOut,
            position: Point::ZERO,
        };
        assert!(!registry.emit(event, &1));
    }

    #[test]
    fn test_clone_shares_handlers() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        registry.on(EventKind::MouseDown, |_| {});
        let snapshot = registry.clone();
        registry.remove(EventKind::MouseDown);
        assert!(snapshot.contains(EventKind::MouseDown));
        assert!(!registry.contains(EventKind::MouseDown));
    }
}
