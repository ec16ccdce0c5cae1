#![no_main]

use arbitrary::Unstructured;
use kurbo::{BezPath, Shape as _};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(points) = fillfix::arbitrary::polygon(10.0, &mut u) else {
        return;
    };
    let Ok(sample) = fillfix::arbitrary::point(10.0, &mut u) else {
        return;
    };

    let mut input = BezPath::new();
    input.move_to(points[0]);
    for p in &points[1..] {
        input.line_to(*p);
    }
    input.close_path();

    let output = fillfix::fix_even_odd_to_winding(&input).unwrap().path;
    let near_edge = input
        .segments()
        .any(|seg| kurbo::ParamCurveNearest::nearest(&seg, sample, 1e-9).distance_sq < 1e-12);
    if !near_edge {
        assert_eq!(input.winding(sample) % 2 != 0, output.winding(sample) != 0);
    }
});
