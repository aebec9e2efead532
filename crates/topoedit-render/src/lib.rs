//! topoedit Render Library
//!
//! Renderer abstraction over an editor surface. The default implementation
//! writes SVG markup with the same group and class structure the editor
//! layer maintains.

mod renderer;
mod svg;

pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};
pub use svg::SvgRenderer;
