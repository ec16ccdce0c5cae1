use fillfix::{fix_even_odd_to_winding, fix_even_odd_to_winding_with, ConvertOptions};
use kurbo::{BezPath, ParamCurveNearest as _, Point, Shape as _};
use proptest::prelude::*;

fn polygons(polys: &[Vec<Point>]) -> BezPath {
    let mut ret = BezPath::new();
    for poly in polys {
        ret.move_to(poly[0]);
        for p in &poly[1..] {
            ret.line_to(*p);
        }
        ret.close_path();
    }
    ret
}

fn even_odd(path: &BezPath, p: Point) -> bool {
    path.winding(p) % 2 != 0
}

fn nonzero(path: &BezPath, p: Point) -> bool {
    path.winding(p) != 0
}

fn near_boundary(path: &BezPath, p: Point, margin: f64) -> bool {
    path.segments()
        .any(|seg| seg.nearest(p, 1e-9).distance_sq <= margin * margin)
}

/// Checks that filling `output` with the nonzero rule covers the same grid
/// points as filling `input` with the even-odd rule.
///
/// Points within `margin` of the input's boundary are skipped. Curves get
/// nudged a little wherever they get cut, so they need a bigger margin than
/// polygons do.
fn assert_same_fill(input: &BezPath, output: &BezPath, size: f64, margin: f64) {
    let steps = 40;
    for i in 0..=steps {
        for j in 0..=steps {
            // The odd offset keeps the grid off of any nice coordinates.
            let p = Point::new(
                -size + 2.0 * size * i as f64 / steps as f64 + 0.0123,
                -size + 2.0 * size * j as f64 / steps as f64 + 0.0071,
            );
            if near_boundary(input, p, margin) {
                continue;
            }
            assert_eq!(
                even_odd(input, p),
                nonzero(output, p),
                "at {p:?}, input {}, output {}",
                input.to_svg(),
                output.to_svg()
            );
        }
    }
}

fn point() -> impl Strategy<Value = Point> {
    (-10.0..10.0f64, -10.0..10.0f64).prop_map(|(x, y)| Point::new(x, y))
}

fn polygon() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec(point(), 3..8)
}

proptest! {
    #[test]
    fn single_polygon(poly in polygon()) {
        let input = polygons(&[poly]);
        let output = fix_even_odd_to_winding(&input).unwrap();
        assert_same_fill(&input, &output.path, 10.0, 1e-6);
    }

    #[test]
    fn several_polygons(polys in prop::collection::vec(polygon(), 1..4)) {
        let input = polygons(&polys);
        let output = fix_even_odd_to_winding(&input).unwrap();
        assert_same_fill(&input, &output.path, 10.0, 1e-6);
    }

    #[test]
    fn fixing_twice_changes_nothing(polys in prop::collection::vec(polygon(), 1..3)) {
        let input = polygons(&polys);
        let once = fix_even_odd_to_winding(&input).unwrap();
        let twice = fix_even_odd_to_winding(&once.path).unwrap();
        prop_assert_eq!(&twice.path, &once.path);
        prop_assert!(!twice.separate_path_for_stroke);
    }
}

#[test]
fn pentagram() {
    let input = BezPath::from_svg("M0 10L5.878 -8.09L-9.511 3.09L9.511 3.09L-5.878 -8.09Z").unwrap();
    let output = fix_even_odd_to_winding(&input).unwrap();
    assert!(output.separate_path_for_stroke);
    assert!(!nonzero(&output.path, Point::ZERO));
    assert_same_fill(&input, &output.path, 10.0, 1e-6);
}

#[test]
fn curves_with_holes() {
    // A circle-ish shape with a quadratic lens through its middle, which
    // sticks out on both sides.
    let input = BezPath::from_svg(
        "M-8 0C-8 -4.4 -4.4 -8 0 -8C4.4 -8 8 -4.4 8 0C8 4.4 4.4 8 0 8C-4.4 8 -8 4.4 -8 0Z\
         M-10 0Q0 6 10 0Q0 -6 -10 0Z",
    )
    .unwrap();
    let output = fix_even_odd_to_winding(&input).unwrap();
    assert!(output.separate_path_for_stroke);
    assert_same_fill(&input, &output.path, 10.0, 0.3);

    let again = fix_even_odd_to_winding(&output.path).unwrap();
    assert_eq!(again.path, output.path);
}

#[test]
fn self_crossing_cubic() {
    let input = BezPath::from_svg("M0 0C20 10 -10 10 10 0Z").unwrap();
    let output = fix_even_odd_to_winding(&input).unwrap();
    assert!(output.separate_path_for_stroke);
    assert_same_fill(&input, &output.path, 10.0, 0.3);
}

#[test]
fn coarse_quality_keeps_parity_for_polygons() {
    // Polygons don't get approximated, so even the coarsest quality should
    // give exactly the same fill.
    let options = ConvertOptions {
        quality: 1e3,
        ..ConvertOptions::default()
    };
    let input = checkerboard(3);
    let output = fix_even_odd_to_winding_with(&input, &options).unwrap();
    assert_eq!(output.attempts, 1);
    assert_same_fill(&input, &output.path, 60.0, 1e-6);
}

/// Overlapping squares, centered on the origin.
fn checkerboard(n: usize) -> BezPath {
    let square = |x: f64, y: f64| {
        vec![
            Point::new(x, y),
            Point::new(x, y + 30.0),
            Point::new(x + 30.0, y + 30.0),
            Point::new(x + 30.0, y),
        ]
    };
    let mut polys = Vec::new();
    for i in 0..n {
        for j in 0..n {
            polys.push(square(40.0 * i as f64, 40.0 * j as f64));
        }
    }
    for i in 0..n - 1 {
        for j in 0..n - 1 {
            polys.push(square(20.0 + 40.0 * i as f64, 20.0 + 40.0 * j as f64));
        }
    }
    let mut ret = polygons(&polys);
    ret.apply_affine(kurbo::Affine::translate((-60.0, -60.0)));
    ret
}

#[test]
fn degenerate_edges_are_harmless() {
    // A zero-length edge in the middle of a bowtie.
    let input = BezPath::from_svg("M-5 -5L5 5L5 5L5 -5L-5 5Z").unwrap();
    let output = fix_even_odd_to_winding(&input).unwrap();
    assert_same_fill(&input, &output.path, 10.0, 1e-6);
}

#[test]
fn side_by_side_overlap() {
    // Two squares sharing parts of their top and bottom edges.
    let input = BezPath::from_svg("M0 0L4 0L4 4L0 4ZM2 0L6 0L6 4L2 4Z").unwrap();
    let output = fix_even_odd_to_winding(&input).unwrap();
    assert!(!nonzero(&output.path, Point::new(3.0, 2.0)));
    assert_same_fill(&input, &output.path, 6.0, 1e-6);

    let again = fix_even_odd_to_winding(&output.path).unwrap();
    assert_eq!(again.path, output.path);
}

#[test]
fn nearly_parallel_edges_meeting_at_a_corner() {
    // The second triangle's first vertex sits on the first triangle's first
    // edge, and both of those edges end at the same corner.
    let input = polygons(&[
        vec![
            Point::new(-5.0, 3.9),
            Point::new(4.6, -4.7),
            Point::new(4.6, 3.9),
        ],
        vec![
            Point::new(-1.159999999999999, 0.4599999999999991),
            Point::new(4.6, -4.7),
            Point::new(-1.159999999999999, -4.7),
        ],
    ]);
    let output = fix_even_odd_to_winding(&input).unwrap();
    assert_same_fill(&input, &output.path, 10.0, 1e-6);

    let again = fix_even_odd_to_winding(&output.path).unwrap();
    assert_eq!(again.path, output.path);
}

#[test]
fn clean_curves_are_left_alone() {
    let input = BezPath::from_svg(
        "M-8 0C-8 -0.3883050859031377 -7.971962240544541 -0.7703795585939515 \
         -7.912950835239493 -1.111186467820747L-6 0Z",
    )
    .unwrap();
    let output = fix_even_odd_to_winding(&input).unwrap();
    assert!(!output.separate_path_for_stroke);
    assert_eq!(output.path, input);
}
