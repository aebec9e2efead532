//! SVG output of an editor surface.

use crate::renderer::{RenderContext, RenderResult, Renderer};
use kurbo::{BezPath, PathEl};
use peniko::Color;
use std::fmt::Write as _;
use topoedit_core::surface::{ControlPoint, PathElement, class};

/// Renders a surface to an SVG document.
#[derive(Debug, Default)]
pub struct SvgRenderer {
    output: String,
}

impl SvgRenderer {
    /// Create a renderer with empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Markup produced by the last [`Renderer::build_scene`] call.
    pub fn svg(&self) -> &str {
        &self.output
    }

    /// Render and hand back the document.
    pub fn render_to_string(&mut self, ctx: &RenderContext) -> RenderResult<String> {
        self.build_scene(ctx)?;
        Ok(std::mem::take(&mut self.output))
    }

    fn write_path(
        out: &mut String,
        path: &PathElement,
        color: Color,
        width: f64,
    ) -> RenderResult<()> {
        writeln!(
            out,
            concat!(
                r#"    <path class="{}" d="{}" fill="none" stroke="{}" stroke-opacity="{}" "#,
                r#"stroke-width="{}" stroke-linecap="round" stroke-linejoin="round"/>"#,
            ),
            path.class,
            path_data(&path.geometry),
            hex(color),
            fmt_num(alpha(color)),
            fmt_num(width),
        )?;
        Ok(())
    }

    fn write_control_point(
        out: &mut String,
        ctx: &RenderContext,
        point: &ControlPoint,
    ) -> RenderResult<()> {
        let (fill, opacity) = if point.is_hidden() {
            (ctx.control_point_color, ctx.hidden_opacity)
        } else {
            (ctx.endpoint_color, 1.0)
        };
        writeln!(
            out,
            concat!(
                r#"      <circle data-waypoint="{}" class="{}" cx="{}" cy="{}" r="{}" "#,
                r#"fill="{}" opacity="{}" stroke="{}"/>"#,
            ),
            escape_attr(point.waypoint_id.as_str()),
            point.classes().join(" "),
            fmt_num(point.center.x),
            fmt_num(point.center.y),
            fmt_num(point.radius),
            hex(fill),
            fmt_num(opacity),
            hex(ctx.highlight_color),
        )?;
        Ok(())
    }
}

impl Renderer for SvgRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        let surface = ctx.surface;
        let (width, height) = (ctx.viewport_size.width, ctx.viewport_size.height);
        let mut out = String::new();

        writeln!(
            out,
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" "#,
                r#"width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            ),
            w = fmt_num(width),
            h = fmt_num(height),
        )?;
        if let Some(background) = self.background_color(ctx) {
            writeln!(
                out,
                r#"  <rect width="100%" height="100%" fill="{}"/>"#,
                hex(background)
            )?;
        }
        writeln!(
            out,
            r#"  <g id="{}" class="{}">"#,
            escape_attr(surface.id()),
            escape_attr(surface.class())
        )?;

        for group in surface.groups() {
            writeln!(
                out,
                r#"   <g id="{}" class="{}">"#,
                escape_attr(group.link_id.as_str()),
                group.class()
            )?;
            Self::write_path(&mut out, &group.shadow, ctx.shadow_color, ctx.shadow_width)?;
            Self::write_path(
                &mut out,
                &group.highlight,
                ctx.highlight_color,
                ctx.highlight_width,
            )?;
            writeln!(out, r#"    <g class="{}">"#, class::CONTROL_POINTS)?;
            for point in &group.control_points {
                Self::write_control_point(&mut out, ctx, point)?;
            }
            writeln!(out, "    </g>")?;
            writeln!(out, "   </g>")?;
        }

        writeln!(out, "  </g>")?;
        writeln!(out, "</svg>")?;

        log::debug!(
            "Rendered {} links, {} control points to SVG",
            surface.groups().len(),
            surface.control_point_count()
        );
        self.output = out;
        Ok(())
    }
}

/// SVG path data for a polyline or curve.
fn path_data(path: &BezPath) -> String {
    let mut d = String::new();
    for element in path.elements() {
        if !d.is_empty() {
            d.push(' ');
        }
        match *element {
            PathEl::MoveTo(p) => d.push_str(&format!("M{},{}", fmt_num(p.x), fmt_num(p.y))),
            PathEl::LineTo(p) => d.push_str(&format!("L{},{}", fmt_num(p.x), fmt_num(p.y))),
            PathEl::QuadTo(a, p) => d.push_str(&format!(
                "Q{},{} {},{}",
                fmt_num(a.x),
                fmt_num(a.y),
                fmt_num(p.x),
                fmt_num(p.y)
            )),
            PathEl::CurveTo(a, b, p) => d.push_str(&format!(
                "C{},{} {},{} {},{}",
                fmt_num(a.x),
                fmt_num(a.y),
                fmt_num(b.x),
                fmt_num(b.y),
                fmt_num(p.x),
                fmt_num(p.y)
            )),
            PathEl::ClosePath => d.push('Z'),
        }
    }
    d
}

/// Shortest decimal form, without `-0` or float noise.
fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut r = (v * 1000.0).round() / 1000.0;
    if r == 0.0 {
        r = 0.0;
    }
    r.to_string()
}

fn hex(color: Color) -> String {
    let rgba = color.to_rgba8();
    format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
}

fn alpha(color: Color) -> f64 {
    f64::from(color.to_rgba8().a) / 255.0
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
