use fillfix::{fix_even_odd_to_winding_with, ConvertOptions};
use kurbo::{BezPath, ParamCurveNearest as _, Point, Shape as _};
use libtest_mimic::{Arguments, Failed, Trial};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug)]
enum Expectation {
    /// The output is exactly the input.
    Unchanged,
    /// The output is this path.
    Output(String),
    /// The stroke flag has this value.
    SeparatePathForStroke(bool),
    /// Nonzero on the output agrees with even-odd on the input, on a grid
    /// covering `[-size, size]^2`, except within `margin` of the boundary.
    Parity { size: f64, margin: f64 },
    /// Converting the output again changes nothing.
    Idempotent,
}

#[derive(Serialize, Deserialize, Debug)]
struct RegressionCaseDeclaration {
    svg_path: String,
    #[serde(default)]
    options: ConvertOptions,
    #[serde(default)]
    expect: Vec<Expectation>,
}

fn main() {
    let args = Arguments::from_args();
    let tests = regression_tests();

    libtest_mimic::run(&args, tests).exit();
}

fn regression_tests() -> Vec<Trial> {
    let ws = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let file_paths = glob::glob(&format!("{ws}/tests/regression/**/*.yml")).unwrap();

    file_paths
        .into_iter()
        .map(|p| {
            let p = p.unwrap();
            let name = input_path_base(&p).display().to_string();
            Trial::test(name, || generate_regression_test(p))
        })
        .collect()
}

fn input_path_base(input_path: &Path) -> &Path {
    let ws = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let base = format!("{ws}/tests/regression");
    input_path.strip_prefix(base).unwrap()
}

fn generate_regression_test(path: PathBuf) -> Result<(), Failed> {
    let input = std::fs::read_to_string(&path).unwrap();
    let case: RegressionCaseDeclaration = serde_yaml::from_str(&input).unwrap();
    let bez = BezPath::from_svg(case.svg_path.as_str()).unwrap();
    let conversion = fix_even_odd_to_winding_with(&bez, &case.options)?;

    for expectation in &case.expect {
        match expectation {
            Expectation::Unchanged => {
                if conversion.path != bez {
                    return Err(format!("expected no change, got {}", conversion.path.to_svg()).into());
                }
            }
            Expectation::Output(expected) => {
                let expected = BezPath::from_svg(expected).unwrap();
                if conversion.path != expected {
                    return Err(format!(
                        "expected {}, got {}",
                        expected.to_svg(),
                        conversion.path.to_svg()
                    )
                    .into());
                }
            }
            Expectation::SeparatePathForStroke(flag) => {
                if conversion.separate_path_for_stroke != *flag {
                    return Err(format!("expected the stroke flag to be {flag}").into());
                }
            }
            Expectation::Parity { size, margin } => {
                assert_parity(&bez, &conversion.path, *size, *margin)?;
            }
            Expectation::Idempotent => {
                let again = fix_even_odd_to_winding_with(&conversion.path, &case.options)?;
                if again.path != conversion.path {
                    return Err(format!(
                        "converting twice gave {}, not {}",
                        again.path.to_svg(),
                        conversion.path.to_svg()
                    )
                    .into());
                }
            }
        }
    }

    Ok(())
}

fn assert_parity(input: &BezPath, output: &BezPath, size: f64, margin: f64) -> Result<(), Failed> {
    let steps = 50;
    for i in 0..=steps {
        for j in 0..=steps {
            let p = Point::new(
                -size + 2.0 * size * i as f64 / steps as f64 + 0.0123,
                -size + 2.0 * size * j as f64 / steps as f64 + 0.0071,
            );
            let near_boundary = input
                .segments()
                .any(|seg| seg.nearest(p, 1e-9).distance_sq <= margin * margin);
            if near_boundary {
                continue;
            }
            let even_odd = input.winding(p) % 2 != 0;
            let nonzero = output.winding(p) != 0;
            if even_odd != nonzero {
                return Err(format!(
                    "fill differs at {p:?}: even-odd {even_odd}, nonzero {nonzero}, output {}",
                    output.to_svg()
                )
                .into());
            }
        }
    }
    Ok(())
}
