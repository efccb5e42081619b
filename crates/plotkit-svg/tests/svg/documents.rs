use plotkit_core::{ParseError, Point};
use plotkit_svg::{extract, svg_to_paths, FlattenOptions};

#[test]
fn test_missing_view_box_is_rejected() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
        <line x1="0" y1="0" x2="10" y2="10"/>
    </svg>"#;
    assert_eq!(extract(svg).unwrap_err(), ParseError::MissingViewBox);
}

#[test]
fn test_invalid_view_box_is_rejected() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 0 10"/>"#;
    assert!(matches!(
        extract(svg).unwrap_err(),
        ParseError::InvalidViewBox { .. }
    ));
}

#[test]
fn test_non_svg_root_is_rejected() {
    let err = extract("<html/>").unwrap_err();
    assert_eq!(
        err,
        ParseError::MissingSvgRoot {
            found: "html".to_string()
        }
    );
}

#[test]
fn test_malformed_xml_is_rejected() {
    assert!(matches!(
        extract("<svg viewBox='0 0 1 1'>").unwrap_err(),
        ParseError::InvalidXml { .. }
    ));
}

#[test]
fn test_view_box_values() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="-5 10 200 100"/>"#;
    let extraction = extract(svg).unwrap();
    assert_eq!(extraction.view_box.x, -5.0);
    assert_eq!(extraction.view_box.y, 10.0);
    assert_eq!(extraction.view_box.width, 200.0);
    assert_eq!(extraction.view_box.height, 100.0);
    assert!(extraction.elements.is_empty());
}

#[test]
fn test_hidden_content_is_skipped() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <line x1="0" y1="0" x2="1" y2="0"/>
        <line x1="0" y1="1" x2="1" y2="1" style="display:none"/>
        <line x1="0" y1="2" x2="1" y2="2" visibility="hidden"/>
        <g style="visibility: hidden">
            <line x1="0" y1="3" x2="1" y2="3"/>
            <line x1="0" y1="4" x2="1" y2="4" visibility="visible"/>
        </g>
        <g display="none">
            <line x1="0" y1="5" x2="1" y2="5" visibility="visible"/>
        </g>
    </svg>"#;
    let (_, paths) = svg_to_paths(svg, &FlattenOptions::default()).unwrap();
    let ys: Vec<f64> = paths.iter().map(|p| p[0].y).collect();
    assert_eq!(ys, vec![0.0, 4.0]);
}

#[test]
fn test_unknown_elements_are_ignored() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <defs><line x1="0" y1="0" x2="9" y2="9"/></defs>
        <text x="0" y="0">hello</text>
        <path d="M 1 1 L 2 2"/>
    </svg>"#;
    let (_, paths) = svg_to_paths(svg, &FlattenOptions::default()).unwrap();
    assert_eq!(paths, vec![vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]]);
}
