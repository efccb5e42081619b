use plotkit_core::Point;
use plotkit_svg::{svg_to_paths, FlattenOptions};

fn assert_close(a: Point, b: Point) {
    assert!(a.distance(&b) < 1e-9, "{} != {}", a, b);
}

#[test]
fn test_group_and_element_transforms_compose() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <g transform="translate(10, 0)">
            <line x1="0" y1="0" x2="1" y2="0" transform="scale(2)"/>
        </g>
    </svg>"#;
    let (_, paths) = svg_to_paths(svg, &FlattenOptions::default()).unwrap();
    assert_close(paths[0][0], Point::new(10.0, 0.0));
    assert_close(paths[0][1], Point::new(12.0, 0.0));
}

#[test]
fn test_rotation_about_origin() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <line x1="0" y1="0" x2="10" y2="0" transform="rotate(90)"/>
    </svg>"#;
    let (_, paths) = svg_to_paths(svg, &FlattenOptions::default()).unwrap();
    assert_close(paths[0][1], Point::new(0.0, 10.0));
}

#[test]
fn test_style_transform_applies_after_element_transform() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <line x1="1" y1="0" x2="2" y2="0" transform="translate(1,0)" style="transform: scale(3)"/>
    </svg>"#;
    let (_, paths) = svg_to_paths(svg, &FlattenOptions::default()).unwrap();
    assert_close(paths[0][0], Point::new(6.0, 0.0));
    assert_close(paths[0][1], Point::new(9.0, 0.0));
}

#[test]
fn test_nested_svg_offsets_children() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <svg x="5" y="7">
            <line x1="0" y1="0" x2="1" y2="0"/>
        </svg>
    </svg>"#;
    let (_, paths) = svg_to_paths(svg, &FlattenOptions::default()).unwrap();
    assert_close(paths[0][0], Point::new(5.0, 7.0));
}
