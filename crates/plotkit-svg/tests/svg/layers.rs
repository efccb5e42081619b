use plotkit_svg::{extract, FlattenOptions};

const LAYERED: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" id="root" viewBox="0 0 100 100">
    <line x1="0" y1="0" x2="1" y2="0"/>
    <g id="outline">
        <line x1="0" y1="1" x2="1" y2="1"/>
        <g>
            <g id="detail">
                <rect x="0" y="0" width="5" height="5"/>
            </g>
        </g>
    </g>
</svg>"#;

#[test]
fn test_layer_is_nearest_group_id() {
    let extraction = extract(LAYERED).unwrap();
    let layers: Vec<Option<&str>> = extraction
        .elements
        .iter()
        .map(|el| el.layer.as_deref())
        .collect();
    assert_eq!(layers, vec![None, Some("outline"), Some("detail")]);
    assert_eq!(extraction.elements[2].groups, vec!["outline", "detail"]);
}

#[test]
fn test_layers_collects_all_group_ids() {
    let extraction = extract(LAYERED).unwrap();
    let layers: Vec<String> = extraction.layers().into_iter().collect();
    assert_eq!(layers, vec!["detail".to_string(), "outline".to_string()]);
}

#[test]
fn test_paths_carry_layer() {
    let extraction = extract(LAYERED).unwrap();
    let paths = extraction.paths(&FlattenOptions::default());
    assert_eq!(paths.len(), 3);
    assert_eq!(paths[2].layer.as_deref(), Some("detail"));
    assert_eq!(paths[2].points.first(), paths[2].points.last());
}
