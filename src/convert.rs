//! The top-level conversion, and the retry loop that keeps it within its time budget.

use std::{
    cell::Cell,
    time::{Duration, Instant},
};

use kurbo::BezPath;

use crate::{eliminate, intersect, orient, path::Path, Error};

/// How many ticks go by between looks at the clock.
const TICKS_PER_CHECK: u32 = 64;

/// Settings for [`fix_even_odd_to_winding_with`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// The maximum distance between a curve and its polyline approximation,
    /// on the first attempt.
    pub quality: f64,
    /// Every time an attempt runs out of time, `quality` gets multiplied by this.
    pub degrade_factor: f64,
    /// The time budget for a single attempt.
    pub timeout: Duration,
    /// After this many attempts have run out of time, the next one runs
    /// without a time limit.
    pub max_degradations: u32,
    /// The maximum number of times a curve gets bisected while approximating it.
    pub max_depth: u32,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            quality: 0.05,
            degrade_factor: 10.0,
            timeout: Duration::from_secs(10),
            max_degradations: 6,
            max_depth: 16,
        }
    }
}

/// The outcome of a conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct Conversion {
    /// The converted path, to be filled with the nonzero winding rule.
    ///
    /// If the input was already fine, this is exactly the input.
    pub path: BezPath,
    /// Stroking `path` would look different from stroking the input, because
    /// we had to cut it up. If this is true, the input should be kept around
    /// for stroking.
    pub separate_path_for_stroke: bool,
    /// How many attempts it took, including the one that succeeded.
    pub attempts: u32,
    /// The approximation quality of the attempt that succeeded.
    pub quality: f64,
}

/// An attempt ran out of time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Overtime;

/// The state of a single conversion attempt.
///
/// This gets passed down to everything that might take a while, and they
/// call [`ConvertContext::tick`] every so often to find out whether they
/// should give up.
#[derive(Debug)]
pub(crate) struct ConvertContext {
    tolerance: f64,
    eps: f64,
    max_depth: u32,
    deadline: Option<Instant>,
    ticks: Cell<u32>,
}

impl ConvertContext {
    pub fn new(tolerance: f64, eps: f64, max_depth: u32, deadline: Option<Instant>) -> Self {
        ConvertContext {
            tolerance,
            eps,
            max_depth,
            deadline,
            ticks: Cell::new(0),
        }
    }

    #[cfg(test)]
    pub fn unbounded(tolerance: f64, eps: f64) -> Self {
        Self::new(tolerance, eps, ConvertOptions::default().max_depth, None)
    }

    /// The maximum distance between a curve and its polyline approximation.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Points closer than this are considered the same.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Checks the clock.
    pub fn check(&self) -> Result<(), Overtime> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Overtime),
            _ => Ok(()),
        }
    }

    /// Records a unit of work, and checks the clock every so often.
    pub fn tick(&self) -> Result<(), Overtime> {
        let ticks = self.ticks.get().wrapping_add(1);
        self.ticks.set(ticks);
        if ticks % TICKS_PER_CHECK == 0 {
            self.check()
        } else {
            Ok(())
        }
    }
}

/// The paths produced by one successful attempt.
struct Attempt {
    eliminated: Path,
    fixed: Path,
}

fn attempt(path: &Path, ctx: &ConvertContext) -> Result<Attempt, Overtime> {
    ctx.check()?;
    let crossings = intersect::find_intersections(path, ctx)?;
    let eliminated = eliminate::eliminate_intersections(path, &crossings, ctx)?;
    ctx.check()?;
    let fixed = orient::fix_directions(&eliminated, ctx)?;
    Ok(Attempt { eliminated, fixed })
}

/// Converts an even-odd filled path to a nonzero filled path, using the
/// default options.
///
/// See [`fix_even_odd_to_winding_with`].
pub fn fix_even_odd_to_winding(path: &BezPath) -> Result<Conversion, Error> {
    fix_even_odd_to_winding_with(path, &ConvertOptions::default())
}

/// Converts an even-odd filled path to a nonzero filled path.
///
/// The only way this can fail is if the input is malformed: a subpath that
/// doesn't start with a move, or a coordinate that isn't finite. Slow inputs
/// are retried at lower quality until they succeed.
pub fn fix_even_odd_to_winding_with(
    path: &BezPath,
    options: &ConvertOptions,
) -> Result<Conversion, Error> {
    let unchanged = |attempts, quality| Conversion {
        path: path.clone(),
        separate_path_for_stroke: false,
        attempts,
        quality,
    };

    let model = Path::from_bez(path)?;
    let model = model.preprocess();
    if model.is_empty() {
        return Ok(unchanged(0, options.quality));
    }
    let baseline = model.to_bez();

    let bbox = model.control_bbox();
    let eps = (bbox.magnitude() * f64::EPSILON * 64.0).max(1e-9);

    let mut quality = options.quality;
    let mut attempts = 0;
    loop {
        attempts += 1;
        let deadline = (attempts <= options.max_degradations)
            .then(|| Instant::now() + options.timeout);
        let ctx = ConvertContext::new(quality, eps, options.max_depth, deadline);

        match attempt(&model, &ctx) {
            Ok(Attempt { eliminated, fixed }) => {
                let fixed = fixed.to_bez();
                if fixed == baseline {
                    return Ok(unchanged(attempts, quality));
                }
                let separate_path_for_stroke = eliminated.to_bez() != baseline;
                return Ok(Conversion {
                    path: fixed,
                    separate_path_for_stroke,
                    attempts,
                    quality,
                });
            }
            Err(Overtime) => {
                let new_quality = quality * options.degrade_factor;
                tracing::warn!(attempts, quality, new_quality, "conversion ran out of time");
                quality = new_quality;
            }
        }
    }
}

/// Converts path data (in SVG syntax) from even-odd to nonzero filling.
///
/// Returns the new path data, and whether a separate path is needed for
/// stroking (see [`Conversion::separate_path_for_stroke`]). Missing or blank
/// path data is passed through unchanged, as is path data that doesn't need
/// to change.
pub fn convert_path_data(data: Option<&str>) -> Result<(Option<String>, bool), Error> {
    let Some(text) = data.filter(|d| !d.trim().is_empty()) else {
        return Ok((data.map(str::to_owned), false));
    };
    let bez = BezPath::from_svg(text).map_err(|e| Error::Parse(e.to_string()))?;
    let conversion = fix_even_odd_to_winding(&bez)?;
    if conversion.path == bez {
        Ok((Some(text.to_owned()), false))
    } else {
        Ok((
            Some(conversion.path.to_svg()),
            conversion.separate_path_for_stroke,
        ))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn bez(s: &str) -> BezPath {
        BezPath::from_svg(s).unwrap()
    }

    #[test]
    fn empty_passes_through() {
        let conversion = fix_even_odd_to_winding(&BezPath::new()).unwrap();
        assert!(conversion.path.is_empty());
        assert!(!conversion.separate_path_for_stroke);

        assert_eq!(convert_path_data(None).unwrap(), (None, false));
        assert_eq!(
            convert_path_data(Some("  ")).unwrap(),
            (Some("  ".to_owned()), false)
        );
    }

    #[test]
    fn malformed_input() {
        assert_matches!(
            convert_path_data(Some("M0 0L1 1 Q")),
            Err(Error::Parse(_))
        );

        let mut path = BezPath::new();
        path.extend([kurbo::PathEl::LineTo((1.0, 1.0).into())]);
        assert_matches!(fix_even_odd_to_winding(&path), Err(Error::MissingMoveTo));
    }

    #[test]
    fn clean_donut_is_untouched() {
        let input = "M0 0L10 0L10 10L0 10ZM2 2L2 8L8 8L8 2Z";
        let conversion = fix_even_odd_to_winding(&bez(input)).unwrap();
        assert_eq!(conversion.path, bez(input));
        assert!(!conversion.separate_path_for_stroke);
        assert_eq!(conversion.attempts, 1);

        assert_eq!(
            convert_path_data(Some(input)).unwrap(),
            (Some(input.to_owned()), false)
        );
    }

    #[test]
    fn clean_cubic_is_untouched() {
        let input = bez(
            "M-8 0C-8 -0.3883050859031377 -7.971962240544541 -0.7703795585939515 \
             -7.912950835239493 -1.111186467820747L-6 0Z",
        );
        let conversion = fix_even_odd_to_winding(&input).unwrap();
        assert_eq!(conversion.path, input);
        assert!(!conversion.separate_path_for_stroke);
    }

    #[test]
    fn donut_with_wrong_hole() {
        let input = bez("M0 0L10 0L10 10L0 10ZM2 2L8 2L8 8L2 8Z");
        let conversion = fix_even_odd_to_winding(&input).unwrap();
        // Nothing was cut up, so stroking can use the converted path.
        assert!(!conversion.separate_path_for_stroke);
        assert_eq!(
            conversion.path,
            bez("M0 0L10 0L10 10L0 10ZM2 2L2 8L8 8L8 2Z")
        );
    }

    #[test]
    fn bowtie() {
        let conversion = fix_even_odd_to_winding(&bez("M0 0L2 2L2 0L0 2Z")).unwrap();
        assert!(conversion.separate_path_for_stroke);
        assert_eq!(conversion.path, bez("M0 0L1 1L0 2ZM1 1L2 2L2 0Z"));
    }

    #[test]
    fn open_subpaths_get_closed() {
        // An open triangle and a closed one fill the same area.
        let conversion = fix_even_odd_to_winding(&bez("M0 0L4 0L0 4")).unwrap();
        assert_eq!(conversion.path, bez("M0 0L4 0L0 4"));
        assert!(!conversion.separate_path_for_stroke);
    }

    #[test]
    fn degrades_until_it_fits() {
        let options = ConvertOptions {
            timeout: Duration::ZERO,
            max_degradations: 3,
            ..ConvertOptions::default()
        };
        let input = bez("M0 0L2 2L2 0L0 2Z");
        let conversion = fix_even_odd_to_winding_with(&input, &options).unwrap();
        assert_eq!(conversion.attempts, 4);
        assert!((conversion.quality - 50.0).abs() < 1e-9);
        // Lines don't care about the approximation quality.
        assert_eq!(conversion.path, bez("M0 0L1 1L0 2ZM1 1L2 2L2 0Z"));
    }

    #[test]
    fn arbitrary_paths_convert() {
        arbtest::arbtest(|u| {
            let input = crate::arbitrary::bez_path(100.0, u)?;
            let conversion = fix_even_odd_to_winding(&input).unwrap();
            assert!(Path::from_bez(&conversion.path).is_ok());
            Ok(())
        });
    }

    #[test]
    fn options_from_partial_yaml() {
        let options: ConvertOptions = serde_yaml::from_str("quality: 0.5").unwrap();
        assert_eq!(options.quality, 0.5);
        assert_eq!(options.max_depth, ConvertOptions::default().max_depth);
    }
}
