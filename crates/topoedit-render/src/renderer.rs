//! Renderer trait abstraction.

use kurbo::Size;
use peniko::Color;
use thiserror::Error;
use topoedit_core::Surface;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Formatting failed: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render pass.
pub struct RenderContext<'a> {
    /// The editor surface to render.
    pub surface: &'a Surface,
    /// Viewport size in pixels.
    pub viewport_size: Size,
    /// Background fill. `None` leaves the output transparent.
    pub background_color: Option<Color>,
    /// Stroke of the wide pointer target path.
    pub shadow_color: Color,
    pub shadow_width: f64,
    /// Stroke of the visible link path.
    pub highlight_color: Color,
    pub highlight_width: f64,
    /// Fill of terminal control points.
    pub endpoint_color: Color,
    /// Fill of bend control points.
    pub control_point_color: Color,
    /// Opacity applied to bend control points, which carry the hidden class.
    pub hidden_opacity: f64,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(surface: &'a Surface, viewport_size: Size) -> Self {
        Self {
            surface,
            viewport_size,
            background_color: None,
            shadow_color: Color::from_rgba8(0, 0, 0, 0),
            shadow_width: topoedit_core::surface::SHADOW_HIT_WIDTH,
            highlight_color: Color::from_rgba8(59, 130, 246, 255), // Blue
            highlight_width: 2.0,
            endpoint_color: Color::from_rgba8(239, 68, 68, 255), // Red
            control_point_color: Color::from_rgba8(255, 255, 255, 255),
            hidden_opacity: 0.0,
        }
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }

    /// Set the shadow stroke color and width.
    pub fn with_shadow(mut self, color: Color, width: f64) -> Self {
        self.shadow_color = color;
        self.shadow_width = width;
        self
    }

    /// Set the highlight stroke color and width.
    pub fn with_highlight(mut self, color: Color, width: f64) -> Self {
        self.highlight_color = color;
        self.highlight_width = width;
        self
    }

    /// Set the fill of terminal control points.
    pub fn with_endpoint_color(mut self, color: Color) -> Self {
        self.endpoint_color = color;
        self
    }

    /// Set the fill of bend control points.
    pub fn with_control_point_color(mut self, color: Color) -> Self {
        self.control_point_color = color;
        self
    }

    /// Set the opacity of bend points. 0 hides them until hovered by a host.
    pub fn with_hidden_opacity(mut self, opacity: f64) -> Self {
        self.hidden_opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Build the output for one pass over the surface.
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Option<Color> {
        ctx.background_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_defaults() {
        let surface = Surface::new();
        let ctx = RenderContext::new(&surface, Size::new(800.0, 600.0));
        assert!(ctx.background_color.is_none());
        assert_eq!(ctx.shadow_width, 12.0);
        assert_eq!(ctx.highlight_width, 2.0);
        assert_eq!(ctx.shadow_color.to_rgba8().a, 0);
    }

    #[test]
    fn test_context_builders() {
        let surface = Surface::new();
        let ctx = RenderContext::new(&surface, Size::new(10.0, 10.0))
            .with_background(Color::from_rgba8(1, 2, 3, 255))
            .with_highlight(Color::from_rgba8(9, 9, 9, 255), 4.0)
            .with_hidden_opacity(3.0);
        assert_eq!(ctx.background_color.map(|c| c.to_rgba8().g), Some(2));
        assert_eq!(ctx.highlight_width, 4.0);
        assert_eq!(ctx.hidden_opacity, 1.0);
    }
}
