#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;

use fillfix::{
    arbitrary::{float_in_range, path_seg},
    curve::{point_at, solve_t_for_point},
};

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(seg) = path_seg(1e3, &mut u) else {
        return;
    };
    let Ok(t) = float_in_range(0.0, 1.0, &mut u) else {
        return;
    };
    let p = point_at(&seg, t);

    // The parameter might not come back exactly (the curve could pass
    // through `p` more than once), but the point should.
    if let Some(s) = solve_t_for_point(&seg, p) {
        assert!((0.0..=1.0).contains(&s));
        assert!(point_at(&seg, s).distance(p) <= 1e-3, "{seg:?} at {t}: got {s}");
    }
});
