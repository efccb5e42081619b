//! # PlotKit Pipeline
//!
//! Turns one SVG document into paper-space paths and then into board commands:
//! extraction, layer filtering, placement, flattening, optimization and
//! motion planning.

use plotkit_core::{Bounds, Error, MachineConfig, PathList, Result};
use plotkit_optimizer::{Layout, OptimizationOptions};
use plotkit_planner::{MotionPlanner, Plan};
use plotkit_settings::Config;
use plotkit_svg::{extract, Extraction, FlattenOptions};
use std::collections::BTreeSet;

/// Everything needed to turn one SVG document into paper coordinates
#[derive(Debug, Clone, Default)]
pub struct PlotRequest {
    pub svg: String,
    pub layout: Layout,
    pub options: OptimizationOptions,
    /// Group ids whose content is left out
    pub excluded_layers: Vec<String>,
}

impl PlotRequest {
    /// Request for `svg` using the layout, options and exclusions from `config`
    pub fn from_config(svg: impl Into<String>, config: &Config) -> Self {
        Self {
            svg: svg.into(),
            layout: config.layout.layout.clone(),
            options: config.optimization.clone(),
            excluded_layers: config.layout.excluded_layers.clone(),
        }
    }
}

/// Optimized paths in millimeters on the paper
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPlot {
    pub paths: PathList,
    /// Bounds of the optimized paths, `None` when nothing is left to draw
    pub bounds: Option<Bounds>,
    /// Every group id found in the document, excluded ones included
    pub layers: BTreeSet<String>,
}

fn flatten(extraction: &Extraction, request: &PlotRequest, factor: f64) -> PathList {
    let opts = FlattenOptions {
        epsilon: request.options.flatten_epsilon / factor,
        max_depth: request.options.flatten_max_depth,
    };
    extraction
        .paths(&opts)
        .into_iter()
        .filter(|p| {
            !p.groups
                .iter()
                .any(|g| request.excluded_layers.iter().any(|x| x == g))
        })
        .map(|p| p.points)
        .collect()
}

/// Parse, place and optimize the drawing in `request`
pub fn prepare_plot(request: &PlotRequest) -> Result<PreparedPlot> {
    request.options.validate().map_err(Error::other)?;
    request.layout.validate().map_err(Error::other)?;

    let extraction = extract(&request.svg)?;
    let layers = extraction.layers();
    let view_box = extraction.view_box.bounds();

    // Flattening tolerance is given in paper millimeters, so it depends on
    // the final scale factor.
    let mut placement = request.layout.placement(view_box, None);
    let mut paths = flatten(&extraction, request, placement.factor());
    if request.layout.use_bounding_box {
        let fitted = request.layout.placement(view_box, Bounds::of_paths(&paths));
        if fitted.factor() > placement.factor() {
            paths = flatten(&extraction, request, fitted.factor());
        }
        placement = fitted;
    }

    let extracted = paths.len();
    let paths = request.options.pipeline(Some(&placement)).run(paths);
    let bounds = Bounds::of_paths(&paths);
    tracing::info!(
        "Prepared {} of {} paths ({} layers, scale {:.3})",
        paths.len(),
        extracted,
        layers.len(),
        placement.factor()
    );

    Ok(PreparedPlot {
        paths,
        bounds,
        layers,
    })
}

/// Plan board commands for prepared paths
pub fn plan_plot(prepared: &PreparedPlot, machine: &MachineConfig) -> Result<Plan> {
    let planner = MotionPlanner::new(machine)?;
    Ok(planner.plan(&prepared.paths)?)
}
