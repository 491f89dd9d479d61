use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::line::orientation;
use crate::{Bounds, Line, Pt2D};

/// A closed loop of points forming a simple polygon: the first point equals the last, there are
/// at least 3 distinct points, the area isn't zero, and no edges cross or touch except for
/// consecutive edges at their shared vertex.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    // first equals last
    pts: Vec<Pt2D>,
}

impl Ring {
    pub fn new(pts: Vec<Pt2D>) -> Result<Ring> {
        if pts.len() < 4 {
            bail!(
                "Can't make a ring with {} points; need at least 4, including the closing point",
                pts.len()
            );
        }
        if pts[0] != *pts.last().unwrap() {
            bail!(
                "Can't make a ring with mismatching first/last points {} and {}",
                pts[0],
                pts.last().unwrap()
            );
        }
        if let Some(pair) = pts.windows(2).find(|pair| pair[0] == pair[1]) {
            bail!("Ring has dupe adjacent points at {}", pair[0]);
        }
        if signed_area(&pts) == 0.0 {
            bail!("Ring has zero area");
        }
        if let Some(pt) = find_self_intersection(&pts) {
            bail!("Ring self-intersects at {}", pt);
        }

        Ok(Ring { pts })
    }

    pub fn must_new(pts: Vec<Pt2D>) -> Ring {
        Ring::new(pts).unwrap()
    }

    /// First dedupes adjacent points, and closes the loop if needed
    pub fn deduping_new(mut pts: Vec<Pt2D>) -> Result<Ring> {
        pts.dedup();
        if pts.len() >= 2 && pts[0] != *pts.last().unwrap() {
            pts.push(pts[0]);
        }
        Ring::new(pts)
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.pts
    }

    pub fn into_points(self) -> Vec<Pt2D> {
        self.pts
    }

    /// The edges of the ring, in order.
    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        self.pts.windows(2).map(|pair| Line::must_new(pair[0], pair[1]))
    }

    pub fn num_segments(&self) -> usize {
        self.pts.len() - 1
    }

    pub fn signed_area(&self) -> f64 {
        signed_area(&self.pts)
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    pub fn reversed(&self) -> Ring {
        let mut pts = self.pts.clone();
        pts.reverse();
        Ring { pts }
    }

    pub fn to_clockwise(self) -> Ring {
        if self.is_clockwise() {
            self
        } else {
            self.reversed()
        }
    }

    pub fn to_counter_clockwise(self) -> Ring {
        if self.is_clockwise() {
            self.reversed()
        } else {
            self
        }
    }

    pub fn get_bounds(&self) -> Bounds {
        Bounds::from(&self.pts)
    }

    /// Is the point on one of the ring's edges?
    pub fn is_on_boundary(&self, pt: Pt2D) -> bool {
        self.lines().any(|l| l.contains_pt(pt))
    }

    /// Is the point strictly inside the ring? Points on the boundary are not.
    pub fn contains_pt(&self, pt: Pt2D) -> bool {
        if !self.get_bounds().contains(pt) || self.is_on_boundary(pt) {
            return false;
        }
        // Crossing number
        let mut inside = false;
        for pair in self.pts.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if (a.z() > pt.z()) != (b.z() > pt.z()) {
                let x_cross = a.x() + (pt.z() - a.z()) / (b.z() - a.z()) * (b.x() - a.x());
                if pt.x() < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Does this ring cover the other one? The other ring may touch this one's boundary, but has
    /// to reach strictly inside somewhere. Identical rings don't contain each other.
    pub fn contains_ring(&self, other: &Ring) -> bool {
        if !self.get_bounds().contains_bounds(&other.get_bounds()) {
            return false;
        }
        let mut strictly_inside = false;
        let check_pts = other
            .pts
            .iter()
            .cloned()
            .chain(other.lines().map(|l| l.middle()));
        for pt in check_pts {
            if self.contains_pt(pt) {
                strictly_inside = true;
            } else if !self.is_on_boundary(pt) {
                return false;
            }
        }
        if !strictly_inside {
            return false;
        }
        !self.crosses(other)
    }

    /// Do the edges of the two rings properly cross each other somewhere? Touching doesn't count.
    pub fn crosses(&self, other: &Ring) -> bool {
        if !self.get_bounds().intersects(&other.get_bounds()) {
            return false;
        }
        for l1 in self.lines() {
            for l2 in other.lines() {
                if proper_crossing(&l1, &l2) {
                    return true;
                }
            }
        }
        false
    }

    /// Do the areas enclosed by the two rings overlap? Sharing only boundary points or edges
    /// doesn't count.
    pub fn overlaps(&self, other: &Ring) -> bool {
        if !self.get_bounds().intersects(&other.get_bounds()) {
            return false;
        }
        if self.crosses(other) {
            return true;
        }
        let probe = |a: &Ring, b: &Ring| {
            a.pts
                .iter()
                .cloned()
                .chain(a.lines().map(|l| l.middle()))
                .any(|pt| b.contains_pt(pt))
        };
        probe(self, other) || probe(other, self) || self.same_points(other)
    }

    fn same_points(&self, other: &Ring) -> bool {
        let mut pts1: Vec<_> = self.pts.iter().skip(1).map(|pt| pt.to_hashable()).collect();
        let mut pts2: Vec<_> = other.pts.iter().skip(1).map(|pt| pt.to_hashable()).collect();
        pts1.sort();
        pts2.sort();
        pts1 == pts2
    }

    /// Every crossing between the segment and this ring, along with the index of the crossed
    /// ring edge. Touching at a shared endpoint isn't a crossing.
    pub fn all_intersections(&self, line: &Line) -> Vec<(Pt2D, usize)> {
        if !self.get_bounds().intersects(&line.get_bounds()) {
            return Vec::new();
        }
        let mut hits = Vec::new();
        for (idx, edge) in self.lines().enumerate() {
            if let Some(pt) = line.true_intersection(&edge) {
                // A crossing exactly at a ring vertex shows up on both edges
                if !hits.iter().any(|(hit, _)| *hit == pt) {
                    hits.push((pt, idx));
                }
            }
        }
        hits
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Ring::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  {},", pt)?;
        }
        write!(f, "])")
    }
}

/// The shoelace formula over a closed loop (first point repeated at the end). Negative means
/// clockwise. This is the only place orientation is decided.
pub fn signed_area(pts: &[Pt2D]) -> f64 {
    let mut sum = 0.0;
    for pair in pts.windows(2) {
        sum += pair[0].x() * pair[1].z() - pair[1].x() * pair[0].z();
    }
    sum / 2.0
}

fn proper_crossing(l1: &Line, l2: &Line) -> bool {
    let d1 = orientation(l2.pt1(), l2.pt2(), l1.pt1());
    let d2 = orientation(l2.pt1(), l2.pt2(), l1.pt2());
    let d3 = orientation(l1.pt1(), l1.pt2(), l2.pt1());
    let d4 = orientation(l1.pt1(), l1.pt2(), l2.pt2());
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// Sweeps the loop's edges in order of their minimum x, only comparing edges whose x ranges
/// overlap. Consecutive edges may share their common vertex, but nothing else. Returns a point
/// where the loop touches or crosses itself.
fn find_self_intersection(pts: &[Pt2D]) -> Option<Pt2D> {
    let num_edges = pts.len() - 1;
    let edges: Vec<(Pt2D, Pt2D)> = pts.windows(2).map(|pair| (pair[0], pair[1])).collect();
    let min_x = |idx: usize| edges[idx].0.x().min(edges[idx].1.x());
    let max_x = |idx: usize| edges[idx].0.x().max(edges[idx].1.x());

    let mut order: Vec<usize> = (0..num_edges).collect();
    order.sort_by(|a, b| min_x(*a).total_cmp(&min_x(*b)));

    // Edges whose x range still overlaps the sweep position
    let mut active: Vec<usize> = Vec::new();
    for idx in order {
        let sweep_x = min_x(idx);
        active.retain(|other| max_x(*other) >= sweep_x);

        for other in &active {
            if let Some(pt) = edges_conflict(&edges, idx, *other, num_edges) {
                return Some(pt);
            }
        }
        active.push(idx);
    }
    None
}

fn edges_conflict(
    edges: &[(Pt2D, Pt2D)],
    i: usize,
    j: usize,
    num_edges: usize,
) -> Option<Pt2D> {
    let (p1, p2) = edges[i];
    let (q1, q2) = edges[j];
    let adjacent = (i + 1) % num_edges == j || (j + 1) % num_edges == i;

    if adjacent {
        // Consecutive edges share one vertex. They conflict only if they fold back over each
        // other.
        let (shared, a, b) = if p2 == q1 {
            (p2, p1, q2)
        } else {
            (p1, p2, q1)
        };
        if orientation(a, shared, b) == 0.0 {
            let same_direction = (a.x() - shared.x()) * (b.x() - shared.x())
                + (a.z() - shared.z()) * (b.z() - shared.z())
                > 0.0;
            if same_direction {
                return Some(shared);
            }
        }
        return None;
    }

    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);
    if (d1 > 0.0 && d2 > 0.0) || (d1 < 0.0 && d2 < 0.0) {
        return None;
    }
    if (d3 > 0.0 && d4 > 0.0) || (d3 < 0.0 && d4 < 0.0) {
        return None;
    }
    if d1 == 0.0 && d2 == 0.0 {
        // Collinear; only a problem if the segments overlap
        let l1 = Line::must_new(p1, p2);
        for pt in [q1, q2] {
            if on_collinear_segment(&l1, pt) {
                return Some(pt);
            }
        }
        let l2 = Line::must_new(q1, q2);
        for pt in [p1, p2] {
            if on_collinear_segment(&l2, pt) {
                return Some(pt);
            }
        }
        return None;
    }
    Some(if d1 == 0.0 {
        p1
    } else if d2 == 0.0 {
        p2
    } else if d3 == 0.0 {
        q1
    } else if d4 == 0.0 {
        q2
    } else {
        p1.lerp(p2, d1 / (d1 - d2))
    })
}

fn on_collinear_segment(line: &Line, pt: Pt2D) -> bool {
    let (a, b) = (line.pt1(), line.pt2());
    pt.x() >= a.x().min(b.x())
        && pt.x() <= a.x().max(b.x())
        && pt.z() >= a.z().min(b.z())
        && pt.z() <= a.z().max(b.z())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(raw: Vec<(f64, f64)>) -> Result<Ring> {
        Ring::new(raw.into_iter().map(|(x, z)| Pt2D::new(x, z)).collect())
    }

    fn square(x: f64, z: f64, size: f64) -> Ring {
        ring(vec![
            (x, z),
            (x + size, z),
            (x + size, z + size),
            (x, z + size),
            (x, z),
        ])
        .unwrap()
    }

    #[test]
    fn validity() {
        assert!(ring(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]).is_err());
        assert!(ring(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]).is_err());
        // Zero area
        assert!(ring(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)]).is_err());
        // Bowtie
        assert!(ring(vec![(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)]).is_err());
        // Touches itself at a repeated vertex
        assert!(ring(vec![
            (0.0, 0.0),
            (2.0, 0.0),
            (1.0, 1.0),
            (2.0, 2.0),
            (0.0, 2.0),
            (1.0, 1.0),
            (0.0, 0.0)
        ])
        .is_err());
        // Spike folding back on the previous edge
        assert!(ring(vec![(0.0, 0.0), (2.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]).is_err());
        assert!(ring(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 0.0)]).is_ok());
    }

    #[test]
    fn orientation_and_containment_agree() {
        let ccw = square(0.0, 0.0, 10.0);
        assert!(ccw.signed_area() > 0.0);
        assert!(!ccw.is_clockwise());
        let cw = ccw.reversed();
        assert!(cw.is_clockwise());
        assert_eq!(cw.area(), 100.0);
        assert_eq!(cw.clone().to_counter_clockwise(), ccw);

        for r in [&ccw, &cw] {
            assert!(r.contains_pt(Pt2D::new(0.01, 5.0)));
            assert!(!r.contains_pt(Pt2D::new(-0.01, 5.0)));
            assert!(!r.contains_pt(Pt2D::new(0.0, 5.0)));
            assert!(r.is_on_boundary(Pt2D::new(0.0, 5.0)));
        }
    }

    #[test]
    fn ring_containment() {
        let big = square(0.0, 0.0, 10.0);
        let small = square(2.0, 2.0, 3.0);
        let touching = square(0.0, 0.0, 5.0);
        let outside = square(20.0, 0.0, 1.0);
        let straddling = square(8.0, 8.0, 5.0);

        assert!(big.contains_ring(&small));
        assert!(!small.contains_ring(&big));
        assert!(big.contains_ring(&touching));
        assert!(!big.contains_ring(&outside));
        assert!(!big.contains_ring(&straddling));
        assert!(!big.contains_ring(&big.clone()));

        assert!(big.overlaps(&straddling));
        assert!(big.overlaps(&small));
        assert!(!big.overlaps(&outside));
        // Sharing an edge isn't overlapping
        assert!(!square(0.0, 0.0, 1.0).overlaps(&square(1.0, 0.0, 1.0)));
    }

    #[test]
    fn crossings_with_a_line() {
        let r = square(0.0, 0.0, 10.0);
        let through = Line::must_new(Pt2D::new(-5.0, 5.0), Pt2D::new(15.0, 5.0));
        let hits = r.all_intersections(&through);
        assert_eq!(hits.len(), 2);
        let mut edges: Vec<usize> = hits.iter().map(|(_, idx)| *idx).collect();
        edges.sort();
        assert_eq!(edges, vec![1, 3]);

        let inside = Line::must_new(Pt2D::new(1.0, 1.0), Pt2D::new(2.0, 2.0));
        assert!(r.all_intersections(&inside).is_empty());
    }
}
