//! Polyline approximations of segments.

use kurbo::{ParamCurve as _, PathSeg, Point};

use crate::{
    convert::{ConvertContext, Overtime},
    geom::{self, BBox},
};

/// The maximum number of edges in a [`Part`].
pub(crate) const MAX_PART_EDGES: usize = 50;

/// A contiguous run of edges in a polyline, with its bounding box.
///
/// The intersection search compares parts before it compares edges, so that
/// whole runs of edges that are far from each other get skipped at once.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Part {
    /// The edges in this part are `first_edge..end_edge`. Edge `i` goes from
    /// point `i` to point `i + 1`.
    pub first_edge: usize,
    pub end_edge: usize,
    pub bbox: BBox,
}

impl Part {
    pub fn edges(&self) -> std::ops::Range<usize> {
        self.first_edge..self.end_edge
    }
}

/// A sequence of points approximating a segment.
///
/// There are always at least two points, and the first and last of them are
/// exactly the start and end of the segment. Each point also remembers the
/// curve parameter that it was sampled at.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Polyline {
    points: Vec<Point>,
    params: Vec<f64>,
    bbox: BBox,
    parts: Vec<Part>,
}

impl Polyline {
    fn new(points: Vec<Point>, params: Vec<f64>) -> Self {
        debug_assert!(points.len() >= 2);
        debug_assert_eq!(points.len(), params.len());

        let edge_count = points.len() - 1;
        let parts = (0..edge_count)
            .step_by(MAX_PART_EDGES)
            .map(|first_edge| {
                let end_edge = (first_edge + MAX_PART_EDGES).min(edge_count);
                Part {
                    first_edge,
                    end_edge,
                    bbox: BBox::from_points(&points[first_edge..=end_edge]),
                }
            })
            .collect();

        Polyline {
            bbox: BBox::from_points(&points),
            points,
            params,
            parts,
        }
    }

    /// Approximates a segment, to within the context's tolerance.
    ///
    /// Curves are bisected until their control polygon is within the
    /// tolerance of its chord (which bounds the distance from the curve to
    /// the chord), or until the context's maximum depth is reached.
    pub fn from_seg(seg: &PathSeg, ctx: &ConvertContext) -> Result<Self, Overtime> {
        let mut points = vec![seg.start()];
        let mut params = vec![0.0];
        if let PathSeg::Line(l) = seg {
            points.push(l.p1);
            params.push(1.0);
        } else {
            subdivide(seg, 0.0, 1.0, 0, ctx, &mut points, &mut params)?;
            // Subdivision evaluates the curve at the end, which might not be
            // bit-for-bit the end point.
            if let Some(last) = points.last_mut() {
                *last = seg.end();
            }
        }
        Ok(Polyline::new(points, params))
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn bbox(&self) -> &BBox {
        &self.bbox
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn edge_count(&self) -> usize {
        self.points.len() - 1
    }

    pub fn edge(&self, i: usize) -> (Point, Point) {
        (self.points[i], self.points[i + 1])
    }

    /// The curve parameter of the point that's a fraction `s` of the way
    /// along edge `i`.
    pub fn param_at(&self, i: usize, s: f64) -> f64 {
        let (t0, t1) = (self.params[i], self.params[i + 1]);
        t0 + s * (t1 - t0)
    }

    /// The point in the middle of the polyline.
    ///
    /// This is a vertex if there's an odd number of points, and the middle of
    /// an edge otherwise. Either way, it's on the segment (up to the
    /// tolerance) and away from its endpoints.
    pub fn midpoint(&self) -> Point {
        let n = self.points.len();
        if n % 2 == 1 {
            self.points[n / 2]
        } else {
            self.points[n / 2 - 1].midpoint(self.points[n / 2])
        }
    }

    /// The total length of all the edges.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// How far the control polygon of `seg` strays from its chord.
fn deviation(seg: &PathSeg) -> f64 {
    let pts = geom::control_points(seg);
    let (start, end) = (pts[0], pts[pts.len() - 1]);
    pts[1..pts.len() - 1]
        .iter()
        .map(|p| geom::distance_to_edge(*p, start, end))
        .fold(0.0, f64::max)
}

fn subdivide(
    seg: &PathSeg,
    t0: f64,
    t1: f64,
    depth: u32,
    ctx: &ConvertContext,
    points: &mut Vec<Point>,
    params: &mut Vec<f64>,
) -> Result<(), Overtime> {
    ctx.tick()?;
    let piece = seg.subsegment(t0..t1);
    if depth >= ctx.max_depth() || deviation(&piece) <= ctx.tolerance() {
        points.push(piece.end());
        params.push(t1);
        return Ok(());
    }
    let mid = (t0 + t1) / 2.0;
    subdivide(seg, t0, mid, depth + 1, ctx, points, params)?;
    subdivide(seg, mid, t1, depth + 1, ctx, points, params)
}
