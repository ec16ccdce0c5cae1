//! Cutting segments at their crossings, and re-linking subpaths so that they
//! stop crossing.
//!
//! After the cuts, every crossing is a vertex shared by (at least) four
//! half-edges. Two subpaths passing through such a vertex still cross each
//! other there, so we look at the cyclic order of the half-edges around the
//! vertex and, if the incoming and outgoing ones are linked in a crossing
//! way, reconnect them without crossings. This doesn't change the set of
//! segments, so it doesn't change the even-odd fill.
//!
//! Where two subpaths run along the same edge, that edge ends up as two
//! copies of the same segment. Both copies get dropped, which doesn't change
//! the even-odd fill either.

use std::collections::HashMap;

use kurbo::{ParamCurve as _, PathSeg, Point};

use crate::{
    convert::{ConvertContext, Overtime},
    curve,
    geom,
    intersect::{Crossing, PARAM_EPS},
    path::{Path, SegIdx, SegVec},
};

/// Where to cut a segment: parameters in `(0, 1)`, sorted, each with the
/// point that the cut should land on.
fn split_points(seg: &PathSeg, crossings: &[Crossing], ctx: &ConvertContext) -> Vec<(f64, Point)> {
    let max_miss = ctx.tolerance() + ctx.eps();
    let mut ret: Vec<(f64, Point)> = crossings
        .iter()
        .map(|c| {
            // A self-crossing has two parameters for the same point, so only
            // the one from the polyline can tell them apart.
            let t = if c.self_crossing {
                c.param
            } else {
                curve::solve_t_for_point(seg, c.point)
                    .filter(|t| curve::point_at(seg, *t).distance(c.point) <= max_miss)
                    .unwrap_or(c.param)
            };
            (t, c.point)
        })
        .filter(|(t, _)| *t > PARAM_EPS && *t < 1.0 - PARAM_EPS)
        .collect();
    ret.sort_by(|a, b| a.0.total_cmp(&b.0));
    // Split parameters closer than `PARAM_EPS` are the same split.
    ret.dedup_by(|next, prev| next.0 - prev.0 <= PARAM_EPS);
    ret
}

fn split(seg: &PathSeg, splits: &[(f64, Point)]) -> Vec<PathSeg> {
    if splits.is_empty() {
        return vec![*seg];
    }
    let mut ret = Vec::with_capacity(splits.len() + 1);
    let (mut t0, mut p0) = (0.0, seg.start());
    for &(t1, p1) in splits.iter().chain(std::iter::once(&(1.0, seg.end()))) {
        ret.push(geom::with_endpoints(seg.subsegment(t0..t1), p0, p1));
        (t0, p0) = (t1, p1);
    }
    ret
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merges the sets containing `i` and `j`. The root of every set is its
/// smallest element.
fn union(parent: &mut [usize], i: usize, j: usize) {
    let (ri, rj) = (find(parent, i), find(parent, j));
    if ri != rj {
        parent[ri.max(rj)] = ri.min(rj);
    }
}

/// Moves segment endpoints that are within `eps` of each other onto the same
/// point, and then drops segments that shrank to nothing.
///
/// Each cluster of nearby points moves to the start point of the segment
/// that comes first in the arena.
fn snap_endpoints(path: &Path, ctx: &ConvertContext) -> Result<Path, Overtime> {
    let eps = ctx.eps();
    let starts: Vec<Point> = path.segments().values().map(|s| s.start()).collect();
    let mut by_x: Vec<usize> = (0..starts.len()).collect();
    by_x.sort_by(|&i, &j| starts[i].x.total_cmp(&starts[j].x));

    let mut parent: Vec<usize> = (0..starts.len()).collect();
    for (k, &i) in by_x.iter().enumerate() {
        for &j in &by_x[(k + 1)..] {
            if starts[j].x - starts[i].x > eps {
                break;
            }
            ctx.tick()?;
            if starts[i].distance(starts[j]) <= eps {
                union(&mut parent, i, j);
            }
        }
    }

    let snapped: SegVec<Point> = (0..starts.len())
        .map(|i| starts[find(&mut parent, i)])
        .collect();
    let mut ends: SegVec<Point> = path.segments().values().map(|s| s.end()).collect();
    for sp in path.subpaths().values() {
        for idx in sp.segments() {
            if let Some(next) = sp.next(idx) {
                ends[idx] = snapped[next];
            }
        }
    }

    let mut dropped = 0;
    let ret = path.map_segments(|idx, seg| {
        let seg = geom::with_endpoints(*seg, snapped[idx], ends[idx]);
        if geom::is_degenerate(&seg) {
            dropped += 1;
            Vec::new()
        } else {
            vec![seg]
        }
    });
    if dropped > 0 {
        tracing::debug!(dropped, "dropped segments that collapsed while snapping");
    }
    Ok(ret)
}

/// One end of a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct End {
    seg: SegIdx,
    /// Is this the end of the segment (as opposed to its start)?
    incoming: bool,
}

/// One end of a segment, as seen from the vertex that it touches.
#[derive(Clone, Copy, Debug)]
struct HalfEdge {
    seg: SegIdx,
    /// Does the segment end here (as opposed to starting here)?
    incoming: bool,
    /// The direction in which the segment leaves the vertex.
    angle: f64,
}

impl HalfEdge {
    fn end(&self) -> End {
        End {
            seg: self.seg,
            incoming: self.incoming,
        }
    }
}

/// Which segment ends are joined together.
///
/// Joins are symmetric, and only ever join two ends at the same vertex. A
/// subpath leaves a segment through one end and carries on through whatever
/// that end is joined to, walking the next segment backwards if it arrives
/// at that segment's end.
struct Links {
    at_start: SegVec<Option<End>>,
    at_end: SegVec<Option<End>>,
}

impl Links {
    fn new(len: usize) -> Self {
        Links {
            at_start: SegVec::with_size(len),
            at_end: SegVec::with_size(len),
        }
    }

    fn get(&self, e: End) -> Option<End> {
        if e.incoming {
            self.at_end[e.seg]
        } else {
            self.at_start[e.seg]
        }
    }

    fn slot(&mut self, e: End) -> &mut Option<End> {
        if e.incoming {
            &mut self.at_end[e.seg]
        } else {
            &mut self.at_start[e.seg]
        }
    }

    fn join(&mut self, a: End, b: End) {
        *self.slot(a) = Some(b);
        *self.slot(b) = Some(a);
    }
}

fn vertex_key(p: Point) -> (u64, u64) {
    // Adding zero turns -0.0 into 0.0.
    ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())
}

fn angle(v: kurbo::Vec2) -> f64 {
    v.y.atan2(v.x)
}

/// Do two segments trace out the same curve, in either direction?
fn same_curve(a: &PathSeg, b: &PathSeg, eps: f64) -> bool {
    let close = |p: &[Point], q: &[Point]| {
        p.len() == q.len() && p.iter().zip(q).all(|(x, y)| x.distance(*y) <= eps)
    };
    let a = geom::control_points(a);
    close(&a, &geom::control_points(b)) || close(&a, &geom::control_points(&geom::reverse(b)))
}

/// Finds pairs of segments that cover exactly the same ground, and leaves
/// both of them out.
///
/// This happens where two subpaths overlap along an edge. Going over an edge
/// twice makes no difference to the even-odd fill, but it leaves the
/// subpaths overlapping instead of nesting. Returns which segments are left.
fn cancel_doubled(path: &Path, ctx: &ConvertContext) -> Result<(SegVec<bool>, usize), Overtime> {
    let eps = ctx.eps();
    let mut by_ends: HashMap<[(u64, u64); 2], Vec<SegIdx>> = HashMap::new();
    for (idx, seg) in path.segments().iter() {
        let mut key = [vertex_key(seg.start()), vertex_key(seg.end())];
        key.sort();
        by_ends.entry(key).or_default().push(idx);
    }

    let mut keep = SegVec::from_vec(vec![true; path.segments().len()]);
    let mut cancelled = 0;
    for group in by_ends.values().filter(|g| g.len() >= 2) {
        ctx.tick()?;
        for (k, &i) in group.iter().enumerate() {
            if !keep[i] {
                continue;
            }
            let twin = group[(k + 1)..]
                .iter()
                .copied()
                .find(|&j| keep[j] && same_curve(&path[i], &path[j], eps));
            if let Some(j) = twin {
                keep[i] = false;
                keep[j] = false;
                cancelled += 2;
            }
        }
    }
    Ok((keep, cancelled))
}

/// Can the joins around a vertex stay as they are?
///
/// They can if every end is joined to another end at this vertex, and no two
/// joins cross. `half_edges` must be sorted by angle.
fn links_are_planar(half_edges: &[HalfEdge], links: &Links) -> bool {
    let mut chords = Vec::with_capacity(half_edges.len() / 2);
    for (i, h) in half_edges.iter().enumerate() {
        let Some(partner) = links.get(h.end()) else {
            return false;
        };
        let Some(j) = half_edges.iter().position(|g| g.end() == partner) else {
            return false;
        };
        if i < j {
            chords.push((i, j));
        }
    }

    !chords.iter().enumerate().any(|(k, &(a, b))| {
        chords[(k + 1)..]
            .iter()
            .any(|&(c, d)| (a < c && c < b) != (a < d && d < b))
    })
}

/// Joins up the ends around a vertex, without crossings.
///
/// If there are as many incoming ends as outgoing ones, every incoming end
/// gets joined to an outgoing one. Reading the half-edges in angular order,
/// with incoming ones as opening brackets and outgoing ones as closing
/// brackets, this is the usual bracket matching. It starts just after the
/// position where the running bracket count is lowest, so that the count
/// never goes negative.
///
/// Otherwise (which only happens after doubled segments were cancelled),
/// neighbors in the angular order get joined, and some segments will be
/// walked backwards.
fn rematch(half_edges: &[HalfEdge], links: &mut Links) {
    for h in half_edges {
        *links.slot(h.end()) = None;
    }

    let n = half_edges.len();
    let incoming = half_edges.iter().filter(|h| h.incoming).count();
    if 2 * incoming != n {
        for pair in half_edges.chunks_exact(2) {
            links.join(pair[0].end(), pair[1].end());
        }
        return;
    }

    let mut count = 0i32;
    let mut lowest = 0;
    let mut start = 0;
    for (i, h) in half_edges.iter().enumerate() {
        count += if h.incoming { 1 } else { -1 };
        if count < lowest {
            lowest = count;
            start = i + 1;
        }
    }

    let mut open = Vec::new();
    for k in 0..n {
        let h = &half_edges[(start + k) % n];
        if h.incoming {
            open.push(h.end());
        } else if let Some(e) = open.pop() {
            links.join(e, h.end());
        }
    }
    debug_assert!(open.is_empty());
}

/// Joins up the ends of the remaining segments of a path (whose subpaths
/// must all be closed) so that no two subpaths cross at a vertex.
///
/// Returns the joins, and the number of vertices that needed re-joining.
fn relink(
    path: &Path,
    keep: &SegVec<bool>,
    ctx: &ConvertContext,
) -> Result<(Links, usize), Overtime> {
    let mut links = Links::new(path.segments().len());
    for sp in path.subpaths().values() {
        debug_assert!(sp.is_closed());
        for idx in sp.segments() {
            let next = sp.next(idx).unwrap_or(sp.first());
            if keep[idx] && keep[next] {
                links.join(
                    End {
                        seg: idx,
                        incoming: true,
                    },
                    End {
                        seg: next,
                        incoming: false,
                    },
                );
            }
        }
    }

    let mut vertices: HashMap<(u64, u64), Vec<HalfEdge>> = HashMap::new();
    for (idx, seg) in path.segments().iter().filter(|(idx, _)| keep[*idx]) {
        vertices
            .entry(vertex_key(seg.end()))
            .or_default()
            .push(HalfEdge {
                seg: idx,
                incoming: true,
                angle: angle(geom::end_direction(seg)),
            });
        vertices
            .entry(vertex_key(seg.start()))
            .or_default()
            .push(HalfEdge {
                seg: idx,
                incoming: false,
                angle: angle(geom::start_direction(seg)),
            });
    }

    let mut relinked = 0;
    for half_edges in vertices.values_mut() {
        ctx.tick()?;
        half_edges.sort_by(|a, b| {
            a.angle
                .total_cmp(&b.angle)
                .then(a.incoming.cmp(&b.incoming))
                .then(a.seg.cmp(&b.seg))
        });
        if !links_are_planar(half_edges, &links) {
            rematch(half_edges, &mut links);
            relinked += 1;
        }
    }
    Ok((links, relinked))
}

/// Splits every segment at its crossings, and re-links the pieces into
/// subpaths that touch one another but never cross.
///
/// The input's subpaths must all be closed. A path without crossings (and
/// without doubled segments) comes out exactly as it went in.
pub(crate) fn eliminate_intersections(
    path: &Path,
    crossings: &SegVec<Vec<Crossing>>,
    ctx: &ConvertContext,
) -> Result<Path, Overtime> {
    let mut splits = 0;
    let mut pieces = path.segments().try_map(|idx, seg| {
        ctx.tick()?;
        let points = split_points(seg, &crossings[idx], ctx);
        splits += points.len();
        Ok::<_, Overtime>(split(seg, &points))
    })?;
    let cut = path.map_segments(|idx, _| std::mem::take(&mut pieces[idx]));
    let cut = snap_endpoints(&cut, ctx)?;
    let (keep, cancelled) = cancel_doubled(&cut, ctx)?;
    let (links, relinked) = relink(&cut, &keep, ctx)?;

    let mut visited = keep.map(|_, k| !k);
    let mut ret = Path::new();
    for idx in cut.segments().indices() {
        let mut cycle = Vec::new();
        let mut entry = End {
            seg: idx,
            incoming: false,
        };
        while !visited[entry.seg] {
            ctx.tick()?;
            visited[entry.seg] = true;
            // Coming in through the end means walking the segment backwards.
            let seg = &cut[entry.seg];
            cycle.push(if entry.incoming { geom::reverse(seg) } else { *seg });
            let exit = End {
                seg: entry.seg,
                incoming: !entry.incoming,
            };
            match links.get(exit) {
                Some(next) => entry = next,
                None => break,
            }
        }
        let closed = match (cycle.first(), cycle.last()) {
            (Some(first), Some(last)) => first.start() == last.end(),
            _ => false,
        };
        ret.push_subpath(cycle, closed);
    }

    tracing::debug!(
        splits,
        cancelled,
        relinked,
        subpaths = ret.subpaths().len(),
        "eliminated intersections"
    );
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use kurbo::{BezPath, Line, ParamCurve as _};

    use super::*;
    use crate::{intersect, path::SubpathIdx};

    fn ctx() -> ConvertContext {
        ConvertContext::unbounded(0.01, 1e-9)
    }

    fn path(s: &str) -> Path {
        Path::from_bez(&BezPath::from_svg(s).unwrap())
            .unwrap()
            .preprocess()
    }

    fn eliminate(path: &Path) -> Path {
        let ctx = ctx();
        let crossings = intersect::find_intersections(path, &ctx).unwrap();
        eliminate_intersections(path, &crossings, &ctx).unwrap()
    }

    #[test]
    fn bowtie() {
        let out = eliminate(&path("M0 0L2 2L2 0L0 2Z"));
        assert_eq!(
            out.to_bez(),
            BezPath::from_svg("M0 0L1 1L0 2ZM1 1L2 2L2 0Z").unwrap()
        );
        // Once is enough.
        assert_eq!(eliminate(&out), out);
    }

    #[test]
    fn clean_paths_are_untouched() {
        for s in [
            "M0 0L10 0L10 10L0 10ZM2 2L2 8L8 8L8 2Z",
            "M0 0L2 0L1 1ZM1 1L2 2L0 2Z",
            "M0 0Q5 10 10 0Z",
        ] {
            let p = path(s);
            assert_eq!(eliminate(&p), p);
        }
    }

    #[test]
    fn overlapping_squares() {
        let out = eliminate(&path("M0 0L4 0L4 4L0 4ZM2 2L6 2L6 6L2 6Z"));
        // Each square had two of its edges cut, and the two subpaths got
        // re-linked into two new ones at the two crossings.
        assert_eq!(out.segments().len(), 12);
        assert_eq!(out.subpaths().len(), 2);
        assert_eq!(eliminate(&out), out);
    }

    #[test]
    fn figure_eight() {
        let out = eliminate(&path("M0 0C2 1 -1 1 1 0Z"));
        assert_eq!(out.subpaths().len(), 2);

        let outer = out.subpath_segments(SubpathIdx(0));
        assert_eq!(outer.len(), 3);
        let inner = out.subpath_segments(SubpathIdx(1));
        assert_eq!(inner.len(), 1);
        assert!(matches!(inner[0], PathSeg::Cubic(_)));
        assert_eq!(inner[0].start(), inner[0].end());
        assert!(inner[0].start().distance(Point::new(0.5, 0.3)) < 0.05);
    }

    #[test]
    fn tiny_edges_collapse() {
        let mut p = Path::new();
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 0.0);
        let b2 = Point::new(1.0 + 1e-12, 0.0);
        let c = Point::new(0.0, 1.0);
        p.push_subpath(
            [
                PathSeg::Line(Line::new(a, b)),
                PathSeg::Line(Line::new(b, b2)),
                PathSeg::Line(Line::new(b2, c)),
                PathSeg::Line(Line::new(c, a)),
            ],
            true,
        );
        let snapped = snap_endpoints(&p, &ctx()).unwrap();
        assert_eq!(snapped.segments().len(), 3);
        assert_eq!(snapped.segments()[SegIdx(1)].start(), b);
    }

    #[test]
    fn bracket_matching_starts_at_the_right_place() {
        let h = |seg, incoming| HalfEdge {
            seg: SegIdx(seg),
            incoming,
            angle: 0.0,
        };
        let end = |seg, incoming| End {
            seg: SegIdx(seg),
            incoming,
        };
        // out, in, in, out: matching has to wrap around.
        let half_edges = [h(0, false), h(1, true), h(2, true), h(3, false)];
        let mut links = Links::new(4);
        assert!(!links_are_planar(&half_edges, &links));
        rematch(&half_edges, &mut links);
        assert_eq!(links.get(end(2, true)), Some(end(3, false)));
        assert_eq!(links.get(end(1, true)), Some(end(0, false)));
        assert_eq!(links.get(end(0, false)), Some(end(1, true)));
        assert!(links_are_planar(&half_edges, &links));
    }

    #[test]
    fn unbalanced_vertices_join_neighbors() {
        let h = |seg, incoming, angle| HalfEdge {
            seg: SegIdx(seg),
            incoming,
            angle,
        };
        let end = |seg, incoming| End {
            seg: SegIdx(seg),
            incoming,
        };
        // Four segments all ending at the same point.
        let half_edges = [h(0, true, 0.0), h(1, true, 1.0), h(2, true, 2.0), h(3, true, 3.0)];
        let mut links = Links::new(4);
        assert!(!links_are_planar(&half_edges, &links));
        rematch(&half_edges, &mut links);
        assert_eq!(links.get(end(0, true)), Some(end(1, true)));
        assert_eq!(links.get(end(3, true)), Some(end(2, true)));
        assert!(links_are_planar(&half_edges, &links));
    }

    #[test]
    fn clean_curves_keep_their_bits() {
        // Splitting a cubic over its whole range can move its control points
        // by a rounding error.
        let p = path(
            "M-8 0C-8 -0.3883050859031377 -7.971962240544541 -0.7703795585939515 \
             -7.912950835239493 -1.111186467820747L-6 0Z",
        );
        let out = eliminate(&p);
        assert_eq!(out, p);
        assert_eq!(split(&p[SegIdx(0)], &[]), vec![p[SegIdx(0)]]);
    }

    #[test]
    fn doubled_edges_cancel() {
        // The squares share a stretch of their top and bottom edges.
        let out = eliminate(&path("M0 0L4 0L4 4L0 4ZM2 0L6 0L6 4L2 4Z"));
        assert_eq!(
            out.to_bez(),
            BezPath::from_svg("M0 0L2 0L2 4L0 4ZM4 0L4 4L6 4L6 0Z").unwrap()
        );
        assert_eq!(eliminate(&out), out);
    }

    #[test]
    fn same_curve_either_way() {
        let q = PathSeg::Quad(kurbo::QuadBez::new((0.0, 0.0), (1.0, 2.0), (2.0, 0.0)));
        assert!(same_curve(&q, &geom::reverse(&q), 1e-9));
        let other = PathSeg::Quad(kurbo::QuadBez::new((0.0, 0.0), (1.0, -2.0), (2.0, 0.0)));
        assert!(!same_curve(&q, &other, 1e-9));
        let line = PathSeg::Line(Line::new((0.0, 0.0), (2.0, 0.0)));
        assert!(!same_curve(&q, &line, 1e-9));
    }
}
