//! Utilities for generating examples, benchmarks, and test cases.

use kurbo::{BezPath, Point};

fn polygon(path: &mut BezPath, points: &[Point]) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    path.close_path();
}

/// Generate a bunch of squares, arranged in a grid.
///
/// The top-left of the first square is at (x0, y0). Each square has size `size
/// x size`, and the distance between squares (both horizontally and vertically)
/// is `offset`.
///
/// If `slant` is non-zero, generates parallelograms instead of squares: the
/// right-hand side of each square gets translated down by `slant`.
fn squares(
    path: &mut BezPath,
    (x0, y0): (f64, f64),
    size: f64,
    offset: f64,
    slant: f64,
    count: usize,
) {
    for i in 0..count {
        let x = x0 + i as f64 * offset;
        for j in 0..count {
            let y = y0 + j as f64 * offset;
            polygon(
                path,
                &[
                    Point::new(x, y),
                    Point::new(x, y + size),
                    Point::new(x + size, y + size + slant),
                    Point::new(x + size, y + slant),
                ],
            );
        }
    }
}

/// Generate an `n` by `n` checkerboard-like pattern with overlapping squares.
/// For `n = 3`, it looks like:
///
/// ```text
/// ┌────┐ ┌────┐ ┌────┐
/// │    │ │    │ │    │
/// │  ┌─┼─┼─┐┌─┼─┼─┐  │
/// └──┼─┘ └─┼┼─┘ └─┼──┘
/// ┌──┼─┐ ┌─┼┼─┐ ┌─┼──┐
/// │  └─┼─┼─┘└─┼─┼─┘  │
/// │  ┌─┼─┼─┐┌─┼─┼─┐  │
/// └──┼─┘ └─┼┼─┘ └─┼──┘
/// ┌──┼─┐ ┌─┼┼─┐ ┌─┼──┐
/// │  └─┼─┼─┘└─┼─┼─┘  │
/// │    │ │    │ │    │
/// └────┘ └────┘ └────┘
/// ```
///
/// Every inner square crosses four outer squares, and all the squares go the
/// same way around.
pub fn checkerboard(n: usize) -> BezPath {
    let mut ret = BezPath::new();
    squares(&mut ret, (0.0, 0.0), 30.0, 40.0, 0.0, n);
    squares(&mut ret, (20.0, 20.0), 30.0, 40.0, 0.0, n.saturating_sub(1));
    ret
}

/// Like `checkerboard`, but with no exactly-horizontal lines.
pub fn slanted_checkerboard(n: usize) -> BezPath {
    let mut ret = BezPath::new();
    squares(&mut ret, (0.0, 0.0), 30.0, 40.0, 1.0, n);
    squares(&mut ret, (20.0, 20.0), 30.0, 40.0, 1.0, n.saturating_sub(1));
    ret
}

/// A bunch of long, skinny parallelograms, half going from top-left to
/// bottom-right and the other half from top-right to bottom-left.
///
/// Every one of them crosses every one going the other way.
pub fn slanties(n: usize) -> BezPath {
    let h = 20.0 * n as f64;
    let mut ret = BezPath::new();
    for i in 0..n {
        let x_off = 20.0 * i as f64;
        polygon(
            &mut ret,
            &[
                Point::new(x_off, 0.0),
                Point::new(x_off + h, h),
                Point::new(x_off + h + 10.0, h),
                Point::new(x_off + 10.0, 0.0),
            ],
        );
        polygon(
            &mut ret,
            &[
                Point::new(x_off + h, 0.0),
                Point::new(x_off, h),
                Point::new(x_off + 10.0, h),
                Point::new(x_off + h + 10.0, 0.0),
            ],
        );
    }
    ret
}

/// A star polygon with `n` points, drawn in one stroke by joining every
/// `step`th vertex of a regular `n`-gon.
///
/// With `n = 5` and `step = 2`, this is a pentagram: the even-odd rule leaves
/// its middle empty.
pub fn star(n: usize, step: usize, radius: f64) -> BezPath {
    let points: Vec<Point> = (0..n)
        .map(|i| {
            let angle = std::f64::consts::TAU * ((i * step) % n.max(1)) as f64 / n as f64;
            Point::new(radius * angle.sin(), radius * angle.cos())
        })
        .collect();
    let mut ret = BezPath::new();
    polygon(&mut ret, &points);
    ret
}

/// A wiggly closed curve made of cubics, crossing itself many times.
///
/// The curve winds around the origin `turns` times, with its radius
/// oscillating between `0.5 * radius` and `radius`. The oscillation is out of
/// step with the turns, so that each turn crosses the others.
pub fn spiral_knot(segments: usize, turns: usize, radius: f64) -> BezPath {
    let segments = segments.max(2);
    let turns = turns.max(1);
    let wobble = (2 * turns + 1) as f64 / turns as f64;
    let point = |i: usize| {
        let theta = std::f64::consts::TAU * turns as f64 * (i % segments) as f64 / segments as f64;
        let r = radius * (0.75 + 0.25 * (wobble * theta).cos());
        Point::new(r * theta.cos(), r * theta.sin())
    };
    let mut ret = BezPath::new();
    ret.move_to(point(0));
    for i in 0..segments {
        let (p0, p3) = (point(i), point(i + 1));
        // Bulge the control points outwards a bit.
        let bulge = |p: Point| (p.to_vec2() * 1.1).to_point();
        let p1 = bulge(p0.lerp(p3, 1.0 / 3.0));
        let p2 = bulge(p0.lerp(p3, 2.0 / 3.0));
        ret.curve_to(p1, p2, p3);
    }
    ret.close_path();
    ret
}
