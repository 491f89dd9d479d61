use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{Bounds, Line, Pt2D, Ring};

/// An outer ring with zero or more holes. Every hole lies inside the outer ring (touching its
/// boundary is fine), and no two holes overlap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    outer: Ring,
    holes: Vec<Ring>,
}

/// Identifies one edge of a polygon. Ring 0 is the outer ring, ring `i + 1` is hole `i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RingSegment {
    pub ring: usize,
    pub segment: usize,
}

impl Polygon {
    pub fn new(outer: Ring, holes: Vec<Ring>) -> Result<Polygon> {
        for (idx, hole) in holes.iter().enumerate() {
            if !outer.contains_ring(hole) {
                bail!("Hole {} isn't inside the outer ring", idx);
            }
        }
        for (idx1, h1) in holes.iter().enumerate() {
            for (idx2, h2) in holes.iter().enumerate().skip(idx1 + 1) {
                if h1.overlaps(h2) {
                    bail!("Holes {} and {} overlap", idx1, idx2);
                }
            }
        }
        Ok(Polygon { outer, holes })
    }

    pub fn from_ring(outer: Ring) -> Polygon {
        Polygon {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn outer(&self) -> &Ring {
        &self.outer
    }

    pub fn holes(&self) -> &Vec<Ring> {
        &self.holes
    }

    /// The outer ring first, then all of the holes.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }

    pub fn get_ring(&self, idx: usize) -> &Ring {
        if idx == 0 {
            &self.outer
        } else {
            &self.holes[idx - 1]
        }
    }

    pub fn get_segment(&self, seg: RingSegment) -> Line {
        let pts = self.get_ring(seg.ring).points();
        Line::must_new(pts[seg.segment], pts[seg.segment + 1])
    }

    pub fn into_rings(self) -> (Ring, Vec<Ring>) {
        (self.outer, self.holes)
    }

    pub fn get_bounds(&self) -> Bounds {
        self.outer.get_bounds()
    }

    pub fn area(&self) -> f64 {
        self.outer.area() - self.holes.iter().map(|h| h.area()).sum::<f64>()
    }

    pub fn is_on_boundary(&self, pt: Pt2D) -> bool {
        self.rings().any(|r| r.is_on_boundary(pt))
    }

    /// Is the point strictly inside the polygon? Points on the outline of the outer ring or any
    /// hole aren't.
    pub fn contains_pt(&self, pt: Pt2D) -> bool {
        self.outer.contains_pt(pt)
            && !self
                .holes
                .iter()
                .any(|h| h.contains_pt(pt) || h.is_on_boundary(pt))
    }

    /// Does this polygon cover the ring entirely? The ring may touch the outline, but can't cross
    /// it or enclose any hole.
    pub fn contains_ring(&self, ring: &Ring) -> bool {
        if !self.outer.contains_ring(ring) {
            return false;
        }
        for hole in &self.holes {
            if hole.overlaps(ring) || ring.contains_ring(hole) {
                return false;
            }
        }
        true
    }

    /// Do the two polygons share any interior? Touching outlines don't count.
    pub fn intersects(&self, other: &Polygon) -> bool {
        if !self.get_bounds().intersects(&other.get_bounds()) {
            return false;
        }
        for r1 in self.rings() {
            for r2 in other.rings() {
                if r1.crosses(r2) {
                    return true;
                }
            }
        }
        let probe = |a: &Polygon, b: &Polygon| {
            a.outer
                .points()
                .iter()
                .cloned()
                .chain(a.outer.lines().map(|l| l.middle()))
                .any(|pt| b.contains_pt(pt))
        };
        probe(self, other) || probe(other, self) || self.contains_ring(other.outer())
    }

    /// Every point where the segment crosses the outline of this polygon (the outer ring or any
    /// hole), along with the crossed edge.
    pub fn intersection_positions(&self, line: &Line) -> Vec<(Pt2D, RingSegment)> {
        let mut hits = Vec::new();
        for (ring_idx, ring) in self.rings().enumerate() {
            for (pt, segment) in ring.all_intersections(line) {
                hits.push((
                    pt,
                    RingSegment {
                        ring: ring_idx,
                        segment,
                    },
                ));
            }
        }
        hits
    }

    /// Every point where the outlines of the two polygons cross, along with the edges involved.
    pub fn outline_intersections(&self, other: &Polygon) -> Vec<(Pt2D, RingSegment, RingSegment)> {
        let mut hits = Vec::new();
        if !self.get_bounds().intersects(&other.get_bounds()) {
            return hits;
        }
        for (ring1, r1) in self.rings().enumerate() {
            for (seg1, l1) in r1.lines().enumerate() {
                for (ring2, r2) in other.rings().enumerate() {
                    if !l1.get_bounds().intersects(&r2.get_bounds()) {
                        continue;
                    }
                    for (seg2, l2) in r2.lines().enumerate() {
                        if let Some(pt) = l1.true_intersection(&l2) {
                            if !hits.iter().any(|(hit, _, _)| *hit == pt) {
                                hits.push((
                                    pt,
                                    RingSegment {
                                        ring: ring1,
                                        segment: seg1,
                                    },
                                    RingSegment {
                                        ring: ring2,
                                        segment: seg2,
                                    },
                                ));
                            }
                        }
                    }
                }
            }
        }
        hits
    }

    pub(crate) fn to_geo(&self) -> geo::Polygon<f64> {
        self.clone().into()
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Polygon with {} holes", self.holes.len())?;
        writeln!(f, "outer: {}", self.outer)?;
        for hole in &self.holes {
            writeln!(f, "hole: {}", hole)?;
        }
        Ok(())
    }
}

impl From<Ring> for geo::LineString<f64> {
    fn from(ring: Ring) -> Self {
        let coords: Vec<geo::Coordinate<f64>> =
            ring.into_points().into_iter().map(|pt| pt.into()).collect();
        geo::LineString(coords)
    }
}

impl From<Polygon> for geo::Polygon<f64> {
    fn from(poly: Polygon) -> Self {
        let interiors: Vec<geo::LineString<f64>> =
            poly.holes.into_iter().map(geo::LineString::from).collect();
        geo::Polygon::new(poly.outer.into(), interiors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, z: f64, size: f64) -> Ring {
        Ring::must_new(vec![
            Pt2D::new(x, z),
            Pt2D::new(x + size, z),
            Pt2D::new(x + size, z + size),
            Pt2D::new(x, z + size),
            Pt2D::new(x, z),
        ])
    }

    #[test]
    fn hole_validation() {
        let outer = square(0.0, 0.0, 10.0);
        assert!(Polygon::new(outer.clone(), vec![square(1.0, 1.0, 2.0), square(5.0, 5.0, 2.0)])
            .is_ok());
        // Holes touching along an edge are tolerated
        assert!(Polygon::new(outer.clone(), vec![square(1.0, 1.0, 2.0), square(3.0, 1.0, 2.0)])
            .is_ok());
        // Overlapping holes aren't
        assert!(Polygon::new(outer.clone(), vec![square(1.0, 1.0, 3.0), square(2.0, 2.0, 3.0)])
            .is_err());
        // Neither are holes sticking out
        assert!(Polygon::new(outer, vec![square(8.0, 8.0, 3.0)]).is_err());
    }

    #[test]
    fn containment_respects_holes() {
        let poly = Polygon::new(square(0.0, 0.0, 10.0), vec![square(4.0, 4.0, 2.0)]).unwrap();
        assert!(poly.contains_pt(Pt2D::new(1.0, 1.0)));
        assert!(!poly.contains_pt(Pt2D::new(5.0, 5.0)));
        assert!(!poly.contains_pt(Pt2D::new(4.0, 5.0)));
        assert_eq!(poly.area(), 96.0);

        assert!(poly.contains_ring(&square(1.0, 1.0, 2.0)));
        assert!(!poly.contains_ring(&square(3.0, 3.0, 4.0)));
    }

    #[test]
    fn segment_crossings_include_holes() {
        let poly = Polygon::new(square(0.0, 0.0, 10.0), vec![square(4.0, 4.0, 2.0)]).unwrap();
        let line = Line::must_new(Pt2D::new(-1.0, 5.0), Pt2D::new(11.0, 5.0));
        let hits = poly.intersection_positions(&line);
        assert_eq!(hits.len(), 4);
        assert_eq!(hits.iter().filter(|(_, seg)| seg.ring == 1).count(), 2);
    }

    #[test]
    fn polygon_intersects() {
        let a = Polygon::from_ring(square(0.0, 0.0, 10.0));
        let b = Polygon::from_ring(square(5.0, 5.0, 10.0));
        let c = Polygon::from_ring(square(10.0, 0.0, 10.0));
        let inner = Polygon::from_ring(square(2.0, 2.0, 1.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.intersects(&inner));
        assert!(inner.intersects(&a));
        assert_eq!(a.outline_intersections(&b).len(), 2);
        assert!(a.outline_intersections(&c).is_empty());
    }
}
