//! Finding the places where segments cross each other, or themselves.
//!
//! Everything here works on polyline approximations. The search is pruned at
//! several levels: first by the bounding boxes of whole subpaths, then by
//! those of segments, and finally by those of the [`Part`]s of each polyline.
//! Only edges in overlapping parts are actually tested against each other.

use kurbo::{ParamCurve as _, PathSeg, Point};

use crate::{
    convert::{ConvertContext, Overtime},
    flatten::{Part, Polyline},
    geom::{self, BBox},
    path::{Path, SegIdx, SegVec, SubpathVec},
};

/// A place where a segment crosses something.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Crossing {
    /// Where the crossing is.
    pub point: Point,
    /// The curve parameter of the crossing, according to the polyline.
    ///
    /// This is only as accurate as the polyline approximation.
    pub param: f64,
    /// Is this the segment crossing itself?
    ///
    /// A self-crossing is recorded twice, once for each of the two parameters
    /// that end up at the same point.
    pub self_crossing: bool,
}

/// Curve parameters closer than this to 0 or 1 are at the segment's endpoint.
pub(crate) const PARAM_EPS: f64 = 1e-9;

/// Intersects two edges.
///
/// Returns the intersection point, together with how far along each edge it
/// is. Parallel edges never intersect, not even if they overlap.
///
/// When the edges are almost parallel, the parameters are badly conditioned
/// and the solved point can land well away from one of the edges. Such a
/// point is only reported if it's within `eps` of both edges.
pub(crate) fn intersect_edges(
    (a0, a1): (Point, Point),
    (b0, b1): (Point, Point),
    eps: f64,
) -> Option<(Point, f64, f64)> {
    if !BBox::new(a0, a1).intersects(&BBox::new(b0, b1)) {
        return None;
    }
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = r.cross(s);
    if denom == 0.0 {
        return None;
    }
    let qp = b0 - a0;
    let u = qp.cross(s) / denom;
    let v = qp.cross(r) / denom;
    if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
        return None;
    }
    let point = a0 + u * r;
    if geom::distance_to_edge(point, a0, a1) > eps || geom::distance_to_edge(point, b0, b1) > eps {
        return None;
    }
    Some((point, u, v))
}

/// Which edge-pairs to leave alone, because they share an endpoint.
#[derive(Clone, Copy, Debug, Default)]
struct Skip {
    /// The first segment's last edge ends where the second's first edge starts.
    inner: bool,
    /// The first segment's first edge starts where the second's last edge ends.
    outer: bool,
}

/// All the pairs of parts (one from each polyline) whose bounding boxes overlap.
fn overlapping_parts<'a>(
    a: &'a Polyline,
    b: &'a Polyline,
) -> impl Iterator<Item = (&'a Part, &'a Part)> + 'a {
    a.parts().iter().flat_map(move |pa| {
        b.parts()
            .iter()
            .filter(move |pb| pa.bbox.intersects(&pb.bbox))
            .map(move |pb| (pa, pb))
    })
}

struct Search<'a> {
    path: &'a Path,
    polylines: &'a SegVec<Polyline>,
    ctx: &'a ConvertContext,
    crossings: SegVec<Vec<Crossing>>,
}

impl Search<'_> {
    /// Records a crossing, unless it's at one of the segment's endpoints.
    ///
    /// Crossings at endpoints are already vertices of the path, and there's
    /// nothing to split. A crossing counts as being at an endpoint if either
    /// its position or its parameter says so.
    fn record(&mut self, seg: SegIdx, crossing: Crossing) {
        let s = &self.path[seg];
        let eps = self.ctx.eps();
        if crossing.param <= PARAM_EPS
            || crossing.param >= 1.0 - PARAM_EPS
            || crossing.point.distance(s.start()) <= eps
            || crossing.point.distance(s.end()) <= eps
        {
            return;
        }
        self.crossings[seg].push(crossing);
    }

    fn between(&mut self, a: SegIdx, b: SegIdx, skip: Skip) -> Result<(), Overtime> {
        let polylines = self.polylines;
        let (poly_a, poly_b) = (&polylines[a], &polylines[b]);
        if !poly_a.bbox().intersects(poly_b.bbox()) {
            return Ok(());
        }
        let last_a = poly_a.edge_count() - 1;
        let last_b = poly_b.edge_count() - 1;
        let eps = self.ctx.eps();

        let mut found = Vec::new();
        for (pa, pb) in overlapping_parts(poly_a, poly_b) {
            self.ctx.tick()?;
            for i in pa.edges() {
                for j in pb.edges() {
                    if (skip.inner && i == last_a && j == 0) || (skip.outer && i == 0 && j == last_b) {
                        continue;
                    }
                    let hit = intersect_edges(poly_a.edge(i), poly_b.edge(j), eps);
                    if let Some((point, u, v)) = hit {
                        found.push((point, poly_a.param_at(i, u), poly_b.param_at(j, v)));
                    }
                }
            }
        }

        for (point, param_a, param_b) in found {
            self.record(
                a,
                Crossing {
                    point,
                    param: param_a,
                    self_crossing: false,
                },
            );
            self.record(
                b,
                Crossing {
                    point,
                    param: param_b,
                    self_crossing: false,
                },
            );
        }
        Ok(())
    }

    /// Finds the places where a cubic crosses itself.
    ///
    /// Lines and quadratics can't do that.
    fn within(&mut self, a: SegIdx) -> Result<(), Overtime> {
        if !matches!(self.path[a], PathSeg::Cubic(_)) {
            return Ok(());
        }
        let poly = &self.polylines[a];
        let eps = self.ctx.eps();

        let mut found = Vec::new();
        for (pi, pa) in poly.parts().iter().enumerate() {
            for pb in &poly.parts()[pi..] {
                if !pa.bbox.intersects(&pb.bbox) {
                    continue;
                }
                self.ctx.tick()?;
                for i in pa.edges() {
                    // Adjacent edges always meet at their shared point.
                    for j in pb.edges().filter(|j| *j >= i + 2) {
                        let hit = intersect_edges(poly.edge(i), poly.edge(j), eps);
                        if let Some((point, u, v)) = hit {
                            found.push((point, poly.param_at(i, u), poly.param_at(j, v)));
                        }
                    }
                }
            }
        }

        for (point, param_a, param_b) in found {
            for param in [param_a, param_b] {
                self.record(
                    a,
                    Crossing {
                        point,
                        param,
                        self_crossing: true,
                    },
                );
            }
        }
        Ok(())
    }
}

/// Finds all the crossings in a path.
///
/// The returned vector has, for every segment, the places where it crosses
/// itself or any other segment. Crossings between two segments are recorded
/// on both of them. Nearly-coincident crossings may be reported more than
/// once.
pub(crate) fn find_intersections(
    path: &Path,
    ctx: &ConvertContext,
) -> Result<SegVec<Vec<Crossing>>, Overtime> {
    let polylines = path
        .segments()
        .try_map(|_, seg| Polyline::from_seg(seg, ctx))?;
    let subpath_bboxes: SubpathVec<BBox> = path
        .subpaths()
        .values()
        .map(|sp| {
            sp.segments()
                .fold(BBox::EMPTY, |bbox, s| bbox.union(*polylines[s].bbox()))
        })
        .collect();

    let mut search = Search {
        path,
        polylines: &polylines,
        ctx,
        crossings: SegVec::with_size(path.segments().len()),
    };

    let subpaths = path.subpaths();
    for (sp_idx, sp) in subpaths.iter() {
        let segs: Vec<SegIdx> = sp.segments().collect();
        let n = segs.len();
        for (j, &a) in segs.iter().enumerate() {
            search.within(a)?;
            for (k, &b) in segs.iter().enumerate().skip(j + 1) {
                let skip = Skip {
                    inner: k == j + 1,
                    outer: sp.is_closed() && j == 0 && k == n - 1,
                };
                search.between(a, b, skip)?;
            }
            for (other_idx, other) in subpaths.iter().skip(sp_idx.0 + 1) {
                if !polylines[a].bbox().intersects(&subpath_bboxes[other_idx]) {
                    continue;
                }
                for b in other.segments() {
                    search.between(a, b, Skip::default())?;
                }
            }
        }
    }

    let crossings = search.crossings;
    tracing::debug!(
        segments = path.segments().len(),
        crossings = crossings.values().map(Vec::len).sum::<usize>(),
        "found intersections"
    );
    Ok(crossings)
}
