//! Headless topoedit shell.
//!
//! Loads a topology, replays scripted drags through the editor layer exactly
//! as pointer input would, then renders the surface to SVG and optionally
//! saves the edited topology.

use kurbo::Size;
use peniko::Color;
use std::cell::Cell;
use std::io::Read;
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;
use topoedit_core::{
    ConfigError, ControlPointKey, EditorConfig, EditorLayer, LatLng, Layer, LinkId, Surface,
    Topology, TopologyError, Viewport, WaypointId,
};
use topoedit_render::{RenderContext, RendererError, SvgRenderer};

/// Padding around the fitted topology, in pixels.
pub const FIT_PADDING: f64 = 40.0;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error("No control point {0} in topology")]
    UnknownTarget(String),
}

/// Help text printed on usage errors.
pub fn usage() -> &'static str {
    "topoedit\n\
\n\
USAGE:\n\
  topoedit [--out <svg>] [--save <json>] [--width <w>] [--height <h>]\n\
           [--move <link>/<waypoint>=<lat>,<lon>]... <topology.json|->\n\
\n\
NOTES:\n\
  - SVG is printed to stdout unless --out is given.\n\
  - --move drags one control point; terminal moves carry their PoP along.\n\
"
}

/// One scripted drag.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveSpec {
    pub target: ControlPointKey,
    pub coord: LatLng,
}

impl std::str::FromStr for MoveSpec {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            CliError::Usage(format!(
                "Invalid move '{s}', expected <link>/<waypoint>=<lat>,<lon>"
            ))
        };
        let (target, coord) = s.split_once('=').ok_or_else(invalid)?;
        let (link_id, waypoint_id) = target.rsplit_once('/').ok_or_else(invalid)?;
        let (lat, lon) = coord.split_once(',').ok_or_else(invalid)?;
        let lat = lat.trim().parse::<f64>().map_err(|_| invalid())?;
        let lon = lon.trim().parse::<f64>().map_err(|_| invalid())?;
        if link_id.is_empty() || waypoint_id.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            target: ControlPointKey::new(LinkId::from(link_id), WaypointId::from(waypoint_id)),
            coord: LatLng::new(lat, lon),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub input: Option<String>,
    pub out: Option<PathBuf>,
    pub save: Option<PathBuf>,
    pub width: f64,
    pub height: f64,
    pub moves: Vec<MoveSpec>,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            input: None,
            out: None,
            save: None,
            width: 800.0,
            height: 600.0,
            moves: Vec::new(),
        }
    }
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    it.next().ok_or_else(|| CliError::Usage(usage().to_string()))
}

fn parse_dimension(value: &str) -> Result<f64, CliError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(CliError::Usage(usage().to_string())),
    }
}

/// Parse `argv`, including the program name at index 0.
pub fn parse_args(argv: &[String]) -> Result<CliArgs, CliError> {
    let mut args = CliArgs::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage().to_string())),
            "--out" => args.out = Some(PathBuf::from(next_value(&mut it)?)),
            "--save" => args.save = Some(PathBuf::from(next_value(&mut it)?)),
            "--width" => args.width = parse_dimension(next_value(&mut it)?)?,
            "--height" => args.height = parse_dimension(next_value(&mut it)?)?,
            "--move" => args.moves.push(next_value(&mut it)?.parse()?),
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage().to_string()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage().to_string()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    if args.input.is_none() {
        return Err(CliError::Usage(usage().to_string()));
    }
    Ok(args)
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub svg: String,
    pub edits: usize,
    pub topology: Topology,
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

/// Fit a viewport around every waypoint and PoP of `topology`.
pub fn fit_viewport(topology: &Topology, size: Size) -> Viewport {
    let coords = topology
        .links()
        .iter()
        .flat_map(|link| link.path.iter().map(|w| w.lat_lng()))
        .chain(topology.pops().iter().map(|p| p.lat_lng()));
    let mut viewport = Viewport::new();
    viewport.fit_to_coords(coords, size, FIT_PADDING);
    viewport
}

/// Apply `moves` to `topology` through an editor layer and render the result.
pub fn edit(topology: Topology, moves: &[MoveSpec], size: Size) -> Result<RunOutput, CliError> {
    let viewport = fit_viewport(&topology, size);
    let mut editor = EditorLayer::new(
        EditorConfig::new(Surface::new())
            .with_name("topoedit")
            .with_projection(viewport),
    )?;

    let edits = Rc::new(Cell::new(0usize));
    let ended = Rc::clone(&edits);
    editor
        .set_on_edit(|layer| log::debug!("{} edited", layer.base().name()))
        .set_on_edit_end(move |layer| {
            ended.set(ended.get() + 1);
            log::info!("{} edit {} committed", layer.base().name(), ended.get());
        })
        .set_topology(topology);

    for spec in moves {
        let target = &spec.target;
        if editor.drag_start(target).is_none() {
            return Err(CliError::UnknownTarget(format!(
                "{}/{}",
                target.link_id, target.waypoint_id
            )));
        }
        let position = editor.base().lat_lng_to_xy(spec.coord);
        editor.drag_move(position);
        editor.drag_end();
    }

    let ctx = RenderContext::new(editor.surface(), size)
        .with_background(Color::from_rgba8(255, 255, 255, 255));
    let svg = SvgRenderer::new().render_to_string(&ctx)?;

    let topology = editor
        .base_mut()
        .take_topology()
        .unwrap_or_default();
    Ok(RunOutput {
        svg,
        edits: edits.get(),
        topology,
    })
}

/// Run the CLI with parsed arguments.
pub fn run(args: CliArgs) -> Result<(), CliError> {
    let topology = Topology::from_json(&read_input(args.input.as_deref())?)?;
    log::info!(
        "Loaded {} links and {} PoPs",
        topology.links().len(),
        topology.pops().len()
    );

    let output = edit(topology, &args.moves, Size::new(args.width, args.height))?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, &output.svg)?;
            log::info!("Wrote SVG to {}", path.display());
        }
        None => print!("{}", output.svg),
    }
    if let Some(path) = &args.save {
        std::fs::write(path, output.topology.to_json()?)?;
        log::info!("Saved topology to {} after {} edits", path.display(), output.edits);
    }
    Ok(())
}
