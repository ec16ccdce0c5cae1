//! Bounding boxes, and a handful of small geometric helpers on top of `kurbo`.

use kurbo::{PathSeg, Point, Vec2};

/// An axis-aligned bounding box.
///
/// Unlike `kurbo::Rect`, both [`BBox::intersects`] and [`BBox::contains`] are
/// inclusive of the boundary. In particular, a degenerate box (a single
/// point, or a horizontal or vertical edge) still intersects everything that
/// it touches. This matters for the broad phase of the intersection search,
/// because the bounding box of a horizontal edge has zero height.
#[derive(Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BBox {
    /// The smallest horizontal coordinate.
    pub min_x: f64,
    /// The largest horizontal coordinate.
    pub max_x: f64,
    /// The smallest vertical coordinate.
    pub min_y: f64,
    /// The largest vertical coordinate.
    pub max_y: f64,
}

impl std::fmt::Debug for BBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:?}, {:?}] x [{:?}, {:?}]",
            self.min_x, self.max_x, self.min_y, self.max_y
        )
    }
}

impl BBox {
    /// The empty box, which intersects and contains nothing.
    ///
    /// This is the identity for [`BBox::union`].
    pub const EMPTY: BBox = BBox {
        min_x: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        min_y: f64::INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    /// The smallest box containing two corner points.
    pub fn new(p: Point, q: Point) -> Self {
        BBox {
            min_x: p.x.min(q.x),
            max_x: p.x.max(q.x),
            min_y: p.y.min(q.y),
            max_y: p.y.max(q.y),
        }
    }

    /// The smallest box containing all the points.
    ///
    /// If there are no points, this is [`BBox::EMPTY`].
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Self {
        points
            .into_iter()
            .fold(BBox::EMPTY, |bbox, p| bbox.union(BBox::new(*p, *p)))
    }

    /// The smallest box containing both `self` and `other`.
    pub fn union(self, other: BBox) -> BBox {
        BBox {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Do the two boxes have any point in common, boundaries included?
    pub fn intersects(&self, other: &BBox) -> bool {
        other.min_x <= self.max_x
            && other.max_x >= self.min_x
            && other.min_y <= self.max_y
            && other.max_y >= self.min_y
    }

    /// Is `p` inside this box, boundary included?
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// The largest absolute value of any coordinate of this box.
    pub fn magnitude(&self) -> f64 {
        self.min_x
            .abs()
            .max(self.max_x.abs())
            .max(self.min_y.abs())
            .max(self.max_y.abs())
    }
}

/// The control points of a segment, in order, starting at its start point.
pub fn control_points(seg: &PathSeg) -> arrayvec::ArrayVec<Point, 4> {
    let mut ret = arrayvec::ArrayVec::new();
    match seg {
        PathSeg::Line(l) => ret.extend([l.p0, l.p1]),
        PathSeg::Quad(q) => ret.extend([q.p0, q.p1, q.p2]),
        PathSeg::Cubic(c) => ret.extend([c.p0, c.p1, c.p2, c.p3]),
    }
    ret
}

/// Returns the same curve as `seg`, but with its endpoints moved to `start` and `end`.
///
/// Interior control points are left alone.
pub fn with_endpoints(seg: PathSeg, start: Point, end: Point) -> PathSeg {
    match seg {
        PathSeg::Line(mut l) => {
            l.p0 = start;
            l.p1 = end;
            PathSeg::Line(l)
        }
        PathSeg::Quad(mut q) => {
            q.p0 = start;
            q.p2 = end;
            PathSeg::Quad(q)
        }
        PathSeg::Cubic(mut c) => {
            c.p0 = start;
            c.p3 = end;
            PathSeg::Cubic(c)
        }
    }
}

/// The same curve as `seg`, traversed in the other direction.
pub fn reverse(seg: &PathSeg) -> PathSeg {
    match *seg {
        PathSeg::Line(l) => PathSeg::Line(kurbo::Line::new(l.p1, l.p0)),
        PathSeg::Quad(q) => PathSeg::Quad(kurbo::QuadBez::new(q.p2, q.p1, q.p0)),
        PathSeg::Cubic(c) => PathSeg::Cubic(kurbo::CubicBez::new(c.p3, c.p2, c.p1, c.p0)),
    }
}

/// Is `seg` a single point?
pub fn is_degenerate(seg: &PathSeg) -> bool {
    let pts = control_points(seg);
    pts.iter().all(|p| *p == pts[0])
}

/// The direction in which `seg` leaves its start point.
///
/// This is the first non-zero difference between the start point and
/// a later control point, so it is well-defined even when the first control
/// point coincides with the start. For a segment of zero length, it is zero.
pub fn start_direction(seg: &PathSeg) -> Vec2 {
    let pts = control_points(seg);
    pts[1..]
        .iter()
        .map(|p| *p - pts[0])
        .find(|v| v.x != 0.0 || v.y != 0.0)
        .unwrap_or(Vec2::ZERO)
}

/// The direction in which `seg` leaves its end point, if you walk it backwards.
pub fn end_direction(seg: &PathSeg) -> Vec2 {
    let pts = control_points(seg);
    let last = pts[pts.len() - 1];
    pts[..pts.len() - 1]
        .iter()
        .rev()
        .map(|p| *p - last)
        .find(|v| v.x != 0.0 || v.y != 0.0)
        .unwrap_or(Vec2::ZERO)
}

/// The distance from `p` to the line segment between `a` and `b`.
pub fn distance_to_edge(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Twice the signed area of the closed polygon through `points`.
///
/// The polygon is implicitly closed, so the last point doesn't need to repeat the first.
pub fn shoelace(points: &[Point]) -> f64 {
    let Some(last) = points.last() else {
        return 0.0;
    };
    let mut prev = *last;
    let mut sum = 0.0;
    for p in points {
        sum += prev.to_vec2().cross(p.to_vec2());
        prev = *p;
    }
    sum
}

/// Is `p` inside the closed polygon through `points`, according to the even-odd rule?
///
/// Points exactly on the boundary may go either way.
pub fn polygon_contains(points: &[Point], p: Point) -> bool {
    let Some(last) = points.last() else {
        return false;
    };
    let mut prev = *last;
    let mut inside = false;
    for q in points {
        if (q.y > p.y) != (prev.y > p.y) {
            let x = q.x + (p.y - q.y) / (prev.y - q.y) * (prev.x - q.x);
            if p.x < x {
                inside = !inside;
            }
        }
        prev = *q;
    }
    inside
}
