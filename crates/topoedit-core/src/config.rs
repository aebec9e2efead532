//! Editor layer configuration.

use crate::projection::{Projection, Viewport};
use crate::surface::Surface;
use thiserror::Error;

/// Default layer name used in log messages.
pub const DEFAULT_LAYER_NAME: &str = "editor";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Must provide a surface to render into")]
    MissingSurface,
    #[error("Unknown event name: {0}")]
    UnknownEvent(String),
}

/// Construction parameters for an [`crate::EditorLayer`].
pub struct EditorConfig {
    /// Drawing surface to render into. Required.
    pub surface: Option<Surface>,
    /// Human readable layer name.
    pub name: String,
    /// Geo ↔ screen transform pair.
    pub projection: Box<dyn Projection>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            surface: None,
            name: DEFAULT_LAYER_NAME.to_string(),
            projection: Box::new(Viewport::default()),
        }
    }
}

impl EditorConfig {
    /// Create a configuration rendering into `surface`.
    pub fn new(surface: Surface) -> Self {
        Self::default().with_surface(surface)
    }

    /// Set the surface to render into.
    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Set the layer name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the geo/screen projection.
    pub fn with_projection(mut self, projection: impl Projection + 'static) -> Self {
        self.projection = Box::new(projection);
        self
    }
}
