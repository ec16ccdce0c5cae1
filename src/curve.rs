//! Evaluating segments, and going back from a point on a segment to its parameter.

use arrayvec::ArrayVec;
use kurbo::{common::solve_cubic, PathSeg, Point};

/// How far outside of `[0, 1]` a root can be before we stop believing that
/// it's really at the boundary.
const UNIT_INTERVAL_SLACK: f64 = 1e-9;

/// A cubic polynomial `c3 x^3 + c2 x^2 + c1 x + c0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cubic {
    /// The coefficient of `x^3`.
    pub c3: f64,
    /// The coefficient of `x^2`.
    pub c2: f64,
    /// The coefficient of `x`.
    pub c1: f64,
    /// The constant term.
    pub c0: f64,
}

impl Cubic {
    /// Evaluates this polynomial at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        ((self.c3 * x + self.c2) * x + self.c1) * x + self.c0
    }

    fn deriv(&self, x: f64) -> f64 {
        (3.0 * self.c3 * x + 2.0 * self.c2) * x + self.c1
    }

    /// The real roots of this polynomial, in no particular order.
    ///
    /// This is tuned for roots in the unit interval: roots far outside of it
    /// may be inaccurate, or missing.
    pub fn roots(&self) -> ArrayVec<f64, 3> {
        let Cubic { c3, c2, c1, c0 } = *self;

        // Since we're only interested in small roots, we can drop the leading
        // coefficient if it's much smaller than the others. Zeroing it out
        // changes the value at the roots by about 1/T (for a threshold T),
        // while keeping it introduces a relative error of about 1e-16 * T in
        // the roots we find. Balancing the two suggests T around 1e7.
        let mut new_c3 = c3;
        let mut new_c2 = c2;
        if c3.abs() < c2.abs().max(c1.abs()).max(c0.abs()) / 1e7 {
            new_c3 = 0.0;
            if c2.abs() < c1.abs().max(c0.abs()) / 1e7 {
                new_c2 = 0.0;
            }
        }
        let mut roots = solve_cubic(c0, c1, new_c2, new_c3);

        // Polish with a few Newton steps against the original coefficients,
        // which undoes most of the error we introduced above.
        for x in &mut roots {
            let mut val = self.eval(*x);
            for _ in 0..3 {
                if val.abs() <= 1e-14 {
                    break;
                }
                let deriv = self.deriv(*x);
                let step = val / deriv;
                if !step.is_finite() {
                    break;
                }
                // Near a double root the Newton step can be huge even though
                // the root is almost right. Don't move by more than sqrt(val).
                let step = step.abs().min(val.abs().sqrt()).copysign(step);
                *x -= step;
                val = self.eval(*x);
            }
        }
        roots
    }
}

/// One coordinate of a segment, as a polynomial in the curve parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// The horizontal coordinate.
    X,
    /// The vertical coordinate.
    Y,
}

impl Axis {
    fn of(self, p: Point) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }
}

/// The power-basis polynomial for one coordinate of `seg`.
///
/// Lines and quadratics come out with zero higher-order coefficients.
pub fn axis_polynomial(seg: &PathSeg, axis: Axis) -> Cubic {
    match *seg {
        PathSeg::Line(l) => {
            let (p0, p1) = (axis.of(l.p0), axis.of(l.p1));
            Cubic {
                c3: 0.0,
                c2: 0.0,
                c1: p1 - p0,
                c0: p0,
            }
        }
        PathSeg::Quad(q) => {
            let (p0, p1, p2) = (axis.of(q.p0), axis.of(q.p1), axis.of(q.p2));
            Cubic {
                c3: 0.0,
                c2: p0 - 2.0 * p1 + p2,
                c1: 2.0 * (p1 - p0),
                c0: p0,
            }
        }
        PathSeg::Cubic(c) => {
            let (p0, p1, p2, p3) = (axis.of(c.p0), axis.of(c.p1), axis.of(c.p2), axis.of(c.p3));
            Cubic {
                c3: p3 - 3.0 * p2 + 3.0 * p1 - p0,
                c2: 3.0 * (p2 - 2.0 * p1 + p0),
                c1: 3.0 * (p1 - p0),
                c0: p0,
            }
        }
    }
}

/// Evaluates a segment at parameter `t`, in the Bernstein basis.
pub fn point_at(seg: &PathSeg, t: f64) -> Point {
    let mt = 1.0 - t;
    match *seg {
        PathSeg::Line(l) => (mt * l.p0.to_vec2() + t * l.p1.to_vec2()).to_point(),
        PathSeg::Quad(q) => (mt * mt * q.p0.to_vec2()
            + 2.0 * mt * t * q.p1.to_vec2()
            + t * t * q.p2.to_vec2())
        .to_point(),
        PathSeg::Cubic(c) => (mt * mt * mt * c.p0.to_vec2()
            + 3.0 * mt * mt * t * c.p1.to_vec2()
            + 3.0 * mt * t * t * c.p2.to_vec2()
            + t * t * t * c.p3.to_vec2())
        .to_point(),
    }
}

/// The parameters at which one coordinate of a segment takes some value.
#[derive(Clone, Debug, PartialEq)]
enum AxisRoots {
    /// The coordinate is constant, so it doesn't constrain the parameter.
    Any,
    /// The parameters in `[0, 1]` that hit the value.
    Some(ArrayVec<f64, 3>),
}

fn axis_roots(seg: &PathSeg, axis: Axis, target: f64) -> AxisRoots {
    let mut poly = axis_polynomial(seg, axis);
    let scale = poly.c0.abs().max(target.abs()).max(1.0);
    if poly.c3.abs().max(poly.c2.abs()).max(poly.c1.abs()) <= scale * 1e-12 {
        return AxisRoots::Any;
    }
    poly.c0 -= target;
    AxisRoots::Some(
        poly.roots()
            .into_iter()
            .filter(|t| (-UNIT_INTERVAL_SLACK..=1.0 + UNIT_INTERVAL_SLACK).contains(t))
            .map(|t| t.clamp(0.0, 1.0))
            .collect(),
    )
}

/// Picks the pair of roots (one from each axis) that agree the best, and
/// returns their average.
fn pair_roots(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for &x in xs {
        for &y in ys {
            let diff = (x - y).abs();
            if best.is_none_or(|(best_diff, _)| diff < best_diff) {
                best = Some((diff, (x + y) / 2.0));
            }
        }
    }
    best.map(|(_, t)| t)
}

/// Finds the parameter of a point that is (approximately) on a segment.
///
/// The horizontal and vertical coordinates are solved for independently,
/// and the pair of solutions that are closest to one another gets averaged.
/// This tolerates points that are a little bit off the curve, like the ones
/// that come out of intersecting polyline approximations. It is *not* a
/// nearest-point search: a point that's far from the curve can get a
/// strange answer, or none at all.
///
/// Returns `None` if one of the coordinates is never attained on the
/// segment, or if the segment is a single point.
pub fn solve_t_for_point(seg: &PathSeg, p: Point) -> Option<f64> {
    match (axis_roots(seg, Axis::X, p.x), axis_roots(seg, Axis::Y, p.y)) {
        (AxisRoots::Any, AxisRoots::Any) => None,
        (AxisRoots::Any, AxisRoots::Some(ts)) | (AxisRoots::Some(ts), AxisRoots::Any) => {
            // Only one coordinate is informative. If it has several
            // solutions, take the one that lands closest to the point.
            ts.into_iter().min_by(|s, t| {
                point_at(seg, *s)
                    .distance_squared(p)
                    .total_cmp(&point_at(seg, *t).distance_squared(p))
            })
        }
        (AxisRoots::Some(xs), AxisRoots::Some(ys)) => pair_roots(&xs, &ys),
    }
}
