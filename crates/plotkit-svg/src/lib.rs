//! # PlotKit SVG
//!
//! Turns SVG markup into polylines in document coordinates. Handles `path`
//! data and the basic shapes, composes nested transforms, prunes hidden
//! content and tags every polyline with the group it came from.

pub mod extractor;
pub mod flatten;
pub mod path_data;
pub mod shapes;

pub use extractor::{extract, ExtractedPath, Extraction, SvgElement, ViewBox};
pub use flatten::{flatten_segments, FlattenOptions};
pub use path_data::{parse_path_data, Segment};
pub use shapes::ShapeKind;

use plotkit_core::{ParseError, Path};

/// Parse and flatten a document in one step
///
/// Returns the view box and every visible polyline in document order.
pub fn svg_to_paths(svg: &str, opts: &FlattenOptions) -> Result<(ViewBox, Vec<Path>), ParseError> {
    let extraction = extract(svg)?;
    let paths = extraction
        .paths(opts)
        .into_iter()
        .map(|p| p.points)
        .collect();
    Ok((extraction.view_box, paths))
}
