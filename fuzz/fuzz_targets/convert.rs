#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(path) = fillfix::arbitrary::bez_path(100.0, &mut u) else {
        return;
    };
    let conversion = fillfix::fix_even_odd_to_winding(&path).unwrap();
    // Whatever comes out has to be a valid input.
    fillfix::Path::from_bez(&conversion.path).unwrap();
});
