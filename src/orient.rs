//! Choosing the orientation of every subpath, so that the nonzero rule fills
//! the same area that the even-odd rule did.
//!
//! Once no two subpaths cross, they nest: any two of them are either
//! disjoint, or one is inside the other. A point is then filled by the
//! even-odd rule if and only if it's inside an odd number of subpaths, and
//! if every subpath winds the opposite way to the subpath that immediately
//! contains it, then the winding number at every point is either zero or
//! plus-or-minus one, with the same parity.

use kurbo::Point;

use crate::{
    convert::{ConvertContext, Overtime},
    flatten::Polyline,
    geom::{self, BBox},
    path::{Path, SubpathVec},
};

/// What we need to know about a subpath to decide its orientation.
#[derive(Clone, Debug)]
struct Outline {
    /// The polyline approximations of all the segments, joined together.
    polygon: Vec<Point>,
    bbox: BBox,
    /// Twice the signed area of `polygon`.
    area: f64,
    /// A point that's on the subpath, away from its vertices.
    representative: Point,
}

impl Outline {
    fn new(polylines: &[Polyline]) -> Self {
        let mut polygon: Vec<Point> = Vec::new();
        for poly in polylines {
            let skip = usize::from(!polygon.is_empty());
            polygon.extend_from_slice(&poly.points()[skip..]);
        }
        let representative = polylines
            .iter()
            .map(|p| (p.length(), p))
            .fold(None, |best: Option<(f64, &Polyline)>, (len, p)| match best {
                Some((best_len, _)) if best_len >= len => best,
                _ => Some((len, p)),
            })
            .map(|(_, p)| p.midpoint())
            .unwrap_or_default();
        Outline {
            bbox: BBox::from_points(&polygon),
            area: geom::shoelace(&polygon),
            polygon,
            representative,
        }
    }

    /// Is this outline too thin to have an inside?
    fn is_flat(&self, eps: f64) -> bool {
        let perimeter: f64 = self
            .polygon
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum();
        self.area.abs() <= eps * perimeter
    }

    fn contains(&self, p: Point) -> bool {
        self.bbox.contains(p) && geom::polygon_contains(&self.polygon, p)
    }
}

/// Reverses subpaths as necessary, so that every subpath is oriented
/// opposite to the one that immediately contains it.
///
/// Outermost subpaths keep whatever orientation they had, as do subpaths
/// that have no area. The subpaths must not cross one another.
pub(crate) fn fix_directions(path: &Path, ctx: &ConvertContext) -> Result<Path, Overtime> {
    let outlines: SubpathVec<Outline> = path.subpaths().try_map(|_, sp| {
        let polylines = sp
            .segments()
            .map(|idx| Polyline::from_seg(&path[idx], ctx))
            .collect::<Result<Vec<_>, _>>()?;
        Ok::<_, Overtime>(Outline::new(&polylines))
    })?;
    let flat: SubpathVec<bool> = outlines.map(|_, o| o.is_flat(ctx.eps()));

    // Everything that contains each subpath.
    let mut containers: SubpathVec<Vec<_>> = SubpathVec::with_size(outlines.len());
    for (i, inner) in outlines.iter() {
        if flat[i] {
            continue;
        }
        for (j, outer) in outlines.iter() {
            ctx.tick()?;
            if i != j && !flat[j] && outer.contains(inner.representative) {
                containers[i].push(j);
            }
        }
    }
    let depth = containers.map(|_, c| c.len());

    let mut order: Vec<_> = outlines.indices().filter(|i| !flat[*i]).collect();
    order.sort_by_key(|i| depth[*i]);

    // Positive for counter-clockwise (in a y-up coordinate system).
    let mut final_sign: SubpathVec<f64> = outlines.map(|_, o| o.area.signum());
    let mut reverse = SubpathVec::<bool>::with_size(outlines.len());
    for i in order {
        let parent = containers[i]
            .iter()
            .copied()
            .filter(|j| depth[*j] < depth[i])
            .max_by_key(|j| depth[*j]);
        if let Some(parent) = parent {
            let want = -final_sign[parent];
            if want != final_sign[i] {
                reverse[i] = true;
                final_sign[i] = want;
            }
        }
    }

    let reversed = reverse.values().filter(|r| **r).count();
    tracing::debug!(
        subpaths = outlines.len(),
        reversed,
        "fixed directions"
    );
    if reversed == 0 {
        return Ok(path.clone());
    }

    let mut ret = Path::new();
    for (idx, sp) in path.subpaths().iter() {
        let segs = path.subpath_segments(idx);
        if reverse[idx] {
            ret.push_subpath(segs.iter().rev().map(geom::reverse), sp.is_closed());
        } else {
            ret.push_subpath(segs.iter().copied(), sp.is_closed());
        }
    }
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use kurbo::{BezPath, ParamCurve as _, PathSeg};

    use super::*;
    use crate::path::SubpathIdx;

    /// Twice the signed area of the polygon through the segments' start points.
    fn control_area(segs: &[PathSeg]) -> f64 {
        let points: Vec<Point> = segs.iter().map(|s| s.start()).collect();
        geom::shoelace(&points)
    }

    fn ctx() -> ConvertContext {
        ConvertContext::unbounded(0.05, 1e-9)
    }

    fn path(s: &str) -> Path {
        Path::from_bez(&BezPath::from_svg(s).unwrap())
            .unwrap()
            .preprocess()
    }

    fn areas(path: &Path) -> Vec<f64> {
        path.subpaths()
            .indices()
            .map(|i| control_area(path.subpath_segments(i)))
            .collect()
    }

    #[test]
    fn hole_gets_reversed() {
        let input = path("M0 0L10 0L10 10L0 10ZM2 2L8 2L8 8L2 8Z");
        let out = fix_directions(&input, &ctx()).unwrap();
        assert_eq!(areas(&out), vec![200.0, -72.0]);
        assert_eq!(out.subpath_segments(SubpathIdx(1))[0].start(), Point::new(2.0, 2.0));
    }

    #[test]
    fn correct_paths_are_untouched() {
        for s in [
            "M0 0L10 0L10 10L0 10ZM2 2L2 8L8 8L8 2Z",
            // Clockwise outside, counter-clockwise hole.
            "M0 0L0 10L10 10L10 0ZM2 2L8 2L8 8L2 8Z",
            // Side by side, in opposite directions.
            "M0 0L1 0L1 1ZM5 5L5 6L6 6Z",
        ] {
            let input = path(s);
            assert_eq!(fix_directions(&input, &ctx()).unwrap(), input);
        }
    }

    #[test]
    fn three_levels() {
        let input = path("M0 0L10 0L10 10L0 10ZM2 2L8 2L8 8L2 8ZM4 4L6 4L6 6L4 6Z");
        let out = fix_directions(&input, &ctx()).unwrap();
        assert_eq!(areas(&out), vec![200.0, -72.0, 8.0]);
    }

    #[test]
    fn order_doesnt_matter() {
        // The innermost subpath comes first this time.
        let input = path("M4 4L6 4L6 6L4 6ZM2 2L8 2L8 8L2 8ZM0 0L10 0L10 10L0 10Z");
        let out = fix_directions(&input, &ctx()).unwrap();
        assert_eq!(areas(&out), vec![8.0, -72.0, 200.0]);
    }

    #[test]
    fn flat_subpaths_are_ignored() {
        // The second subpath goes out and back along the same line.
        let input = path("M0 0L10 0L10 10L0 10ZM2 2L8 2ZM3 3L7 3L7 7L3 7Z");
        let out = fix_directions(&input, &ctx()).unwrap();
        assert_eq!(out.subpath_segments(SubpathIdx(1)), input.subpath_segments(SubpathIdx(1)));
        assert_eq!(areas(&out)[2], -32.0);
    }

    #[test]
    fn curved_hole() {
        // A lens made of two quadratics, inside a square.
        let input = path("M0 0L10 0L10 10L0 10ZM2 5Q5 8 8 5Q5 2 2 5Z");
        let out = fix_directions(&input, &ctx()).unwrap();
        let inner = out.subpath_segments(SubpathIdx(1));
        assert!(matches!(inner[0], PathSeg::Quad(_)));
        // The lens goes clockwise at first, which is already right.
        assert_eq!(out, input);
    }
}
