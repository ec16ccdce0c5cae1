//! Utilities for fuzz and/or property testing using `arbitrary`.

use arbitrary::Unstructured;
use kurbo::{BezPath, CubicBez, Line, ParamCurve as _, PathSeg, Point, QuadBez};

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

/// Generate a float in some range, but give it a chance to be close to another float.
pub fn another_float_in_range(
    orig: f64,
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let close: bool = u.arbitrary()?;
    if close {
        let ulps: i32 = u.int_in_range(-32..=32)?;
        let scale = 1.0f64 + ulps as f64 * f64::EPSILON;
        Ok((orig * scale).clamp(start, end))
    } else {
        float_in_range(start, end, u)
    }
}

/// Generate a point with both coordinates in `[-size, size]`.
pub fn point(size: f64, u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    Ok(Point::new(
        float_in_range(-size, size, u)?,
        float_in_range(-size, size, u)?,
    ))
}

/// Generate a point that has a chance of sharing a coordinate with `orig`.
///
/// Shared coordinates make for horizontal and vertical lines, and for
/// collinear control points.
fn another_point(orig: Point, size: f64, u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    Ok(Point::new(
        another_float_in_range(orig.x, -size, size, u)?,
        another_float_in_range(orig.y, -size, size, u)?,
    ))
}

/// Generate a segment starting at `p0`, with all its points in `[-size, size]^2`.
fn path_seg_from(p0: Point, size: f64, u: &mut Unstructured<'_>) -> Result<PathSeg, arbitrary::Error> {
    let degree: u8 = u.int_in_range(1..=3)?;
    let p1 = another_point(p0, size, u)?;
    Ok(match degree {
        1 => PathSeg::Line(Line::new(p0, p1)),
        2 => PathSeg::Quad(QuadBez::new(p0, p1, another_point(p1, size, u)?)),
        _ => {
            let p2 = another_point(p1, size, u)?;
            PathSeg::Cubic(CubicBez::new(p0, p1, p2, another_point(p2, size, u)?))
        }
    })
}

/// Generate an arbitrary line, quadratic, or cubic, with all its points in
/// `[-size, size]^2`.
pub fn path_seg(size: f64, u: &mut Unstructured<'_>) -> Result<PathSeg, arbitrary::Error> {
    let p0 = point(size, u)?;
    path_seg_from(p0, size, u)
}

/// Generate the vertices of a polygon, with between 3 and 8 vertices.
pub fn polygon(size: f64, u: &mut Unstructured<'_>) -> Result<Vec<Point>, arbitrary::Error> {
    let len: usize = u.int_in_range(3..=8)?;
    let mut ret: Vec<Point> = Vec::with_capacity(len);
    for _ in 0..len {
        let p = match ret.last() {
            Some(prev) => another_point(*prev, size, u)?,
            None => point(size, u)?,
        };
        ret.push(p);
    }
    Ok(ret)
}

/// Generate a path with a few closed subpaths, made of lines and curves.
pub fn bez_path(size: f64, u: &mut Unstructured<'_>) -> Result<BezPath, arbitrary::Error> {
    let subpaths: u8 = u.int_in_range(1..=4)?;
    let mut ret = BezPath::new();
    for _ in 0..subpaths {
        let start = point(size, u)?;
        ret.move_to(start);
        let segs: u8 = u.int_in_range(1..=5)?;
        let mut cur = start;
        for _ in 0..segs {
            let seg = path_seg_from(cur, size, u)?;
            match seg {
                PathSeg::Line(l) => ret.line_to(l.p1),
                PathSeg::Quad(q) => ret.quad_to(q.p1, q.p2),
                PathSeg::Cubic(c) => ret.curve_to(c.p1, c.p2, c.p3),
            }
            cur = seg.end();
        }
        ret.close_path();
    }
    Ok(ret)
}
