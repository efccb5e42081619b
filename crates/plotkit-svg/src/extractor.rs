//! SVG document traversal
//!
//! Walks the element tree, composing transforms and tracking the layer and
//! group ids of every drawable shape. Hidden subtrees are pruned here so later
//! stages never see them.

use crate::flatten::{flatten_segments, FlattenOptions};
use crate::path_data::Segment;
use crate::shapes::{shape_segments, ShapeKind};
use lyon::geom::euclid::default::Transform2D;
use plotkit_core::{Bounds, ParseError, Path};
use roxmltree::{Document, Node};
use std::collections::BTreeSet;
use std::str::FromStr;

/// The root `viewBox`, in user units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// The view box as a rectangle
    pub fn bounds(&self) -> Bounds {
        Bounds::from_rect(self.x, self.y, self.width, self.height)
    }
}

/// A drawable element with its fully composed transform
#[derive(Debug, Clone)]
pub struct SvgElement {
    /// Which shape tag produced this element
    pub kind: ShapeKind,
    /// The element's own `id`, if any
    pub id: Option<String>,
    /// Canonical path commands in the element's local coordinates
    pub segments: Vec<Segment>,
    /// Local-to-document transform
    pub transform: Transform2D<f64>,
    /// Id of the nearest ancestor group that has one
    pub layer: Option<String>,
    /// Ids of all containing groups, outermost first
    pub groups: Vec<String>,
}

/// A flattened polyline tagged with its source layer
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPath {
    pub points: Path,
    pub layer: Option<String>,
    pub groups: Vec<String>,
}

/// Result of [`extract`]
#[derive(Debug, Clone)]
pub struct Extraction {
    pub view_box: ViewBox,
    pub elements: Vec<SvgElement>,
}

impl Extraction {
    /// Flatten every element into polylines in document coordinates
    pub fn paths(&self, opts: &FlattenOptions) -> Vec<ExtractedPath> {
        self.elements
            .iter()
            .flat_map(|el| {
                flatten_segments(&el.segments, &el.transform, opts)
                    .into_iter()
                    .map(move |points| ExtractedPath {
                        points,
                        layer: el.layer.clone(),
                        groups: el.groups.clone(),
                    })
            })
            .collect()
    }

    /// Every group id seen on the way to a drawable element
    pub fn layers(&self) -> BTreeSet<String> {
        self.elements
            .iter()
            .flat_map(|el| el.groups.iter().cloned())
            .collect()
    }
}

/// Inherited traversal state
#[derive(Clone)]
struct Context {
    transform: Transform2D<f64>,
    layer: Option<String>,
    groups: Vec<String>,
    visible: bool,
}

/// Look up a presentation property, the `style` attribute taking precedence
fn style_property<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    let from_style = node.attribute("style").and_then(|style| {
        style.split(';').find_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            (key.trim() == name).then(|| value.trim())
        })
    });
    from_style.or_else(|| node.attribute(name).map(str::trim))
}

fn parse_transform(value: &str) -> Option<Transform2D<f64>> {
    match svgtypes::Transform::from_str(value) {
        Ok(t) => Some(Transform2D::new(t.a, t.b, t.c, t.d, t.e, t.f)),
        Err(e) => {
            tracing::warn!("Ignoring unparseable transform '{}': {}", value, e);
            None
        }
    }
}

/// Element transform, then inline style transform, both relative to the parent
fn local_transform(node: &Node) -> Transform2D<f64> {
    let element = node
        .attribute("transform")
        .and_then(parse_transform)
        .unwrap_or_else(Transform2D::identity);
    let style = node
        .attribute("style")
        .and_then(|style| {
            style.split(';').find_map(|decl| {
                let (key, value) = decl.split_once(':')?;
                (key.trim() == "transform").then(|| value.trim())
            })
        })
        .and_then(parse_transform)
        .unwrap_or_else(Transform2D::identity);
    element.then(&style)
}

fn is_container(tag: &str) -> bool {
    matches!(tag, "svg" | "g" | "a")
}

fn walk(node: Node, ctx: &Context, is_root: bool, out: &mut Vec<SvgElement>) {
    if style_property(&node, "display") == Some("none") {
        return;
    }

    let visible = match style_property(&node, "visibility") {
        Some("hidden") | Some("collapse") => false,
        Some("visible") => true,
        _ => ctx.visible,
    };

    let mut local = local_transform(&node);
    let tag = node.tag_name().name();

    if tag == "svg" && !is_root {
        let x = node.attribute("x").and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);
        let y = node.attribute("y").and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);
        local = local.then_translate(lyon::geom::Vector::new(x, y));
    }
    let transform = local.then(&ctx.transform);

    if is_container(tag) {
        let mut child_ctx = Context {
            transform,
            layer: ctx.layer.clone(),
            groups: ctx.groups.clone(),
            visible,
        };
        if !is_root {
            if let Some(id) = node.attribute("id") {
                child_ctx.layer = Some(id.to_string());
                child_ctx.groups.push(id.to_string());
            }
        }
        for child in node.children().filter(|c| c.is_element()) {
            walk(child, &child_ctx, false, out);
        }
        return;
    }

    let Some(kind) = ShapeKind::from_tag(tag) else {
        tracing::debug!("Ignoring unsupported element <{}>", tag);
        return;
    };
    if !visible {
        return;
    }

    let segments = shape_segments(kind, &node);
    if segments.is_empty() {
        return;
    }
    out.push(SvgElement {
        kind,
        id: node.attribute("id").map(str::to_string),
        segments,
        transform,
        layer: ctx.layer.clone(),
        groups: ctx.groups.clone(),
    });
}

/// Parse SVG markup into its view box and drawable elements
///
/// Fails when the document is not XML, the root is not `<svg>`, or the root
/// `viewBox` is missing or malformed. Unknown elements are skipped.
pub fn extract(svg: &str) -> Result<Extraction, ParseError> {
    let doc = Document::parse(svg).map_err(|e| ParseError::InvalidXml {
        reason: e.to_string(),
    })?;
    let root = doc.root_element();

    if root.tag_name().name() != "svg" {
        return Err(ParseError::MissingSvgRoot {
            found: root.tag_name().name().to_string(),
        });
    }

    let raw = root.attribute("viewBox").ok_or(ParseError::MissingViewBox)?;
    let invalid = || ParseError::InvalidViewBox {
        value: raw.to_string(),
    };
    let vb = svgtypes::ViewBox::from_str(raw).map_err(|_| invalid())?;
    if !(vb.w > 0.0 && vb.h > 0.0) {
        return Err(invalid());
    }
    let view_box = ViewBox {
        x: vb.x,
        y: vb.y,
        width: vb.w,
        height: vb.h,
    };

    let ctx = Context {
        transform: Transform2D::identity(),
        layer: None,
        groups: Vec::new(),
        visible: true,
    };
    let mut elements = Vec::new();
    walk(root, &ctx, true, &mut elements);

    tracing::debug!(
        "Extracted {} drawable elements from {}x{} view box",
        elements.len(),
        view_box.width,
        view_box.height
    );
    Ok(Extraction { view_box, elements })
}
