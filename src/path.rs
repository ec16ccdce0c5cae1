//! The path model shared by all the stages of the conversion.
//!
//! A [`Path`] stores all of its segments in one arena, and each [`Subpath`] is
//! a contiguous range of that arena. Cloning a path is therefore just a couple
//! of bulk copies, which is convenient because every conversion attempt starts
//! again from a pristine copy of its input.

use arrayvec::ArrayVec;
use kurbo::{BezPath, Line, ParamCurve as _, PathEl, PathSeg, Point};

use crate::{
    geom::{self, BBox},
    Error,
};

typed_vec!(
    /// An index into the segment arena of a [`Path`].
    ///
    /// Segment indices are only meaningful for the path that they came from.
    SegIdx,
    /// A vector indexed by [`SegIdx`].
    SegVec,
    "s"
);

typed_vec!(
    /// An index into the subpaths of a [`Path`].
    SubpathIdx,
    /// A vector indexed by [`SubpathIdx`].
    SubpathVec,
    "sp"
);

/// A chain of segments, each one starting where the previous one ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subpath {
    start: SegIdx,
    end: SegIdx,
    closed: bool,
}

impl Subpath {
    /// The indices of our segments, in order.
    pub fn segments(&self) -> impl DoubleEndedIterator<Item = SegIdx> + ExactSizeIterator {
        (self.start.0..self.end.0).map(SegIdx)
    }

    /// The number of segments in this subpath.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.end.0 - self.start.0
    }

    /// The index of our first segment.
    pub fn first(&self) -> SegIdx {
        self.start
    }

    /// The index of our last segment.
    pub fn last(&self) -> SegIdx {
        SegIdx(self.end.0 - 1)
    }

    /// Does the last segment end where the first one starts?
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The segment that follows `idx` in this subpath.
    ///
    /// For a closed subpath, the first segment follows the last one.
    pub fn next(&self, idx: SegIdx) -> Option<SegIdx> {
        if idx.0 + 1 < self.end.0 {
            Some(SegIdx(idx.0 + 1))
        } else if self.closed {
            Some(self.start)
        } else {
            None
        }
    }
}

/// A sequence of subpaths, made of lines and quadratic and cubic Béziers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    segs: SegVec<PathSeg>,
    subpaths: SubpathVec<Subpath>,
}

impl Path {
    /// Creates an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Does this path have no segments at all?
    pub fn is_empty(&self) -> bool {
        self.segs.is_empty()
    }

    /// All the segments, in arena order.
    pub fn segments(&self) -> &SegVec<PathSeg> {
        &self.segs
    }

    /// All the subpaths, in order.
    pub fn subpaths(&self) -> &SubpathVec<Subpath> {
        &self.subpaths
    }

    /// The segments of a single subpath, in order.
    pub fn subpath_segments(&self, idx: SubpathIdx) -> &[PathSeg] {
        let sp = &self.subpaths[idx];
        &self.segs.as_slice()[sp.start.0..sp.end.0]
    }

    /// Appends a subpath.
    ///
    /// The segments must form a chain, with each one starting exactly where
    /// the previous one ended. If `closed` is true, the last one must also
    /// end where the first one starts. Returns `None` (and adds nothing) if
    /// there are no segments.
    pub fn push_subpath(
        &mut self,
        segs: impl IntoIterator<Item = PathSeg>,
        closed: bool,
    ) -> Option<SubpathIdx> {
        let start = SegIdx(self.segs.len());
        for seg in segs {
            debug_assert!(
                self.segs.as_slice()[start.0..]
                    .last()
                    .is_none_or(|prev| prev.end() == seg.start()),
                "discontinuous subpath"
            );
            self.segs.push(seg);
        }
        let end = SegIdx(self.segs.len());
        if start == end {
            return None;
        }
        debug_assert!(
            !closed || self.segs[start].start() == self.segs[SegIdx(end.0 - 1)].end(),
            "closed subpath doesn't end at its start"
        );
        Some(self.subpaths.push(Subpath { start, end, closed }))
    }

    /// Builds a path from a `kurbo` path.
    ///
    /// The path must start with a `MoveTo`. A `ClosePath` adds a line back to
    /// the start of the subpath, unless we were already there, and anything
    /// drawn after it starts a new subpath at that same point.
    pub fn from_bez(bez: &BezPath) -> Result<Path, Error> {
        let mut ret = Path::new();
        let mut cur: Vec<PathSeg> = Vec::new();
        // The start and current point of the subpath, if there was a move.
        let mut pen: Option<(Point, Point)> = None;

        for el in bez.elements() {
            for p in element_points(el) {
                check_finite(p)?;
            }
            let seg = match *el {
                PathEl::MoveTo(p) => {
                    ret.push_subpath(std::mem::take(&mut cur), false);
                    pen = Some((p, p));
                    continue;
                }
                PathEl::ClosePath => {
                    let (start, current) = pen.ok_or(Error::MissingMoveTo)?;
                    if current != start {
                        cur.push(PathSeg::Line(Line::new(current, start)));
                    }
                    ret.push_subpath(std::mem::take(&mut cur), true);
                    pen = Some((start, start));
                    continue;
                }
                PathEl::LineTo(p1) => {
                    let (_, p0) = pen.ok_or(Error::MissingMoveTo)?;
                    PathSeg::Line(Line::new(p0, p1))
                }
                PathEl::QuadTo(p1, p2) => {
                    let (_, p0) = pen.ok_or(Error::MissingMoveTo)?;
                    PathSeg::Quad(kurbo::QuadBez::new(p0, p1, p2))
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    let (_, p0) = pen.ok_or(Error::MissingMoveTo)?;
                    PathSeg::Cubic(kurbo::CubicBez::new(p0, p1, p2, p3))
                }
            };
            if let Some((_, current)) = pen.as_mut() {
                *current = seg.end();
            }
            cur.push(seg);
        }
        ret.push_subpath(cur, false);
        Ok(ret)
    }

    /// Converts this path back into a `kurbo` path.
    ///
    /// A closed subpath that ends with a line back to its start point gets
    /// a `ClosePath` instead of that line.
    pub fn to_bez(&self) -> BezPath {
        let mut ret = BezPath::new();
        for sp_idx in self.subpaths.indices() {
            let sp = &self.subpaths[sp_idx];
            let segs = self.subpath_segments(sp_idx);
            ret.move_to(segs[0].start());
            let implicit_close =
                sp.closed && segs.len() > 1 && matches!(segs[segs.len() - 1], PathSeg::Line(_));
            let explicit = if implicit_close {
                &segs[..segs.len() - 1]
            } else {
                segs
            };
            for seg in explicit {
                match *seg {
                    PathSeg::Line(l) => ret.line_to(l.p1),
                    PathSeg::Quad(q) => ret.quad_to(q.p1, q.p2),
                    PathSeg::Cubic(c) => ret.curve_to(c.p1, c.p2, c.p3),
                }
            }
            if sp.closed {
                ret.close_path();
            }
        }
        ret
    }

    /// Normalizes a path for filling.
    ///
    /// Segments that are just a single point are dropped, and every subpath
    /// gets closed (with a line, if necessary). Fill rules treat open
    /// subpaths as closed anyway, but the later stages like to have it
    /// explicit.
    pub fn preprocess(&self) -> Path {
        let mut ret = Path::new();
        for sp_idx in self.subpaths.indices() {
            let mut segs: Vec<PathSeg> = self
                .subpath_segments(sp_idx)
                .iter()
                .filter(|s| !geom::is_degenerate(s))
                .copied()
                .collect();
            let (Some(first), Some(last)) = (segs.first(), segs.last()) else {
                continue;
            };
            let (start, end) = (first.start(), last.end());
            if start != end {
                segs.push(PathSeg::Line(Line::new(end, start)));
            }
            ret.push_subpath(segs, true);
        }
        ret
    }

    /// Builds a new path by replacing every segment with a chain of segments.
    ///
    /// The replacement chain for a segment must start and end where the
    /// segment did. The subpath structure is preserved, except that subpaths
    /// whose segments were all replaced by nothing disappear.
    pub fn map_segments(&self, mut f: impl FnMut(SegIdx, &PathSeg) -> Vec<PathSeg>) -> Path {
        let mut ret = Path::new();
        for sp in self.subpaths.values() {
            let segs: Vec<PathSeg> = sp
                .segments()
                .flat_map(|idx| f(idx, &self.segs[idx]))
                .collect();
            ret.push_subpath(segs, sp.closed);
        }
        ret
    }

    /// The bounding box of all the control points.
    pub fn control_bbox(&self) -> BBox {
        self.segs
            .values()
            .flat_map(geom::control_points)
            .fold(BBox::EMPTY, |bbox, p| bbox.union(BBox::new(p, p)))
    }
}

impl std::ops::Index<SegIdx> for Path {
    type Output = PathSeg;

    fn index(&self, index: SegIdx) -> &Self::Output {
        &self.segs[index]
    }
}

fn element_points(el: &PathEl) -> ArrayVec<Point, 3> {
    let mut ret = ArrayVec::new();
    match *el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) => ret.push(p),
        PathEl::QuadTo(p1, p2) => ret.extend([p1, p2]),
        PathEl::CurveTo(p1, p2, p3) => ret.extend([p1, p2, p3]),
        PathEl::ClosePath => {}
    }
    ret
}

fn check_finite(p: Point) -> Result<(), Error> {
    if p.x.is_nan() || p.y.is_nan() {
        Err(Error::NaN)
    } else if p.x.is_infinite() || p.y.is_infinite() {
        Err(Error::Infinity)
    } else {
        Ok(())
    }
}
