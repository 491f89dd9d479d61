use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{Bounds, Pt2D, EPSILON_DIST};

/// A line segment between two distinct points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

impl Line {
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Result<Line> {
        if pt1 == pt2 {
            bail!("Line from {} to itself has no length", pt1);
        }
        Ok(Line(pt1, pt2))
    }

    /// Panics if the points are the same. Only use this when the caller has already established
    /// the points differ.
    pub fn must_new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line::new(pt1, pt2).unwrap()
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn points(&self) -> Vec<Pt2D> {
        vec![self.0, self.1]
    }

    pub fn length(&self) -> f64 {
        self.0.dist_to(self.1)
    }

    pub fn reversed(&self) -> Line {
        Line(self.1, self.0)
    }

    pub fn middle(&self) -> Pt2D {
        self.0.lerp(self.1, 0.5)
    }

    /// In radians, counter-clockwise from the x axis.
    pub fn angle(&self) -> f64 {
        self.0.angle_to(self.1)
    }

    pub fn get_bounds(&self) -> Bounds {
        Bounds::from(&[self.0, self.1])
    }

    /// Do the two segments share an endpoint?
    pub fn is_connected_to(&self, other: &Line) -> bool {
        self.0 == other.0 || self.0 == other.1 || self.1 == other.0 || self.1 == other.1
    }

    /// A crossing between the two segments, ignoring the case where they only touch at an
    /// endpoint they both have. Useful when adjacent elements share a node.
    pub fn true_intersection(&self, other: &Line) -> Option<Pt2D> {
        true_intersection(self.0, self.1, other.0, other.1)
    }

    /// Any single point the two segments have in common, including shared endpoints. Collinear
    /// overlaps don't count.
    pub fn intersection(&self, other: &Line) -> Option<Pt2D> {
        segment_intersection(self.0, self.1, other.0, other.1)
    }

    /// Is the point on this segment, within `EPSILON_DIST`?
    pub fn contains_pt(&self, pt: Pt2D) -> bool {
        self.dist_to_pt(pt) <= EPSILON_DIST
    }

    pub fn dist_to_pt(&self, pt: Pt2D) -> f64 {
        let dx = self.1.x() - self.0.x();
        let dz = self.1.z() - self.0.z();
        let len_squared = dx * dx + dz * dz;
        let t = (((pt.x() - self.0.x()) * dx + (pt.z() - self.0.z()) * dz) / len_squared)
            .max(0.0)
            .min(1.0);
        let proj_x = self.0.x() + t * dx;
        let proj_z = self.0.z() + t * dz;
        ((pt.x() - proj_x).powi(2) + (pt.z() - proj_z).powi(2)).sqrt()
    }

    /// How far along the segment is the projection of this point, in [0, 1]?
    pub fn percent_along(&self, pt: Pt2D) -> f64 {
        let dx = self.1.x() - self.0.x();
        let dz = self.1.z() - self.0.z();
        let t = ((pt.x() - self.0.x()) * dx + (pt.z() - self.0.z()) * dz) / (dx * dx + dz * dz);
        t.max(0.0).min(1.0)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Line::must_new({}, {})", self.0, self.1)
    }
}

/// Twice the signed area of the triangle. Positive if `c` is to the left of the directed line
/// from `a` to `b`, negative if to the right, 0 if collinear.
pub fn orientation(a: Pt2D, b: Pt2D, c: Pt2D) -> f64 {
    (b.x() - a.x()) * (c.z() - a.z()) - (b.z() - a.z()) * (c.x() - a.x())
}

/// The point where segment p1-p2 crosses segment q1-q2. Returns None when the segments don't
/// meet, are collinear, or merely touch at a point that's an endpoint of both of them. An
/// endpoint of one segment lying in the middle of the other still counts.
pub fn true_intersection(p1: Pt2D, p2: Pt2D, q1: Pt2D, q2: Pt2D) -> Option<Pt2D> {
    let pt = segment_intersection(p1, p2, q1, q2)?;
    if (pt == p1 || pt == p2) && (pt == q1 || pt == q2) {
        return None;
    }
    Some(pt)
}

fn segment_intersection(p1: Pt2D, p2: Pt2D, q1: Pt2D, q2: Pt2D) -> Option<Pt2D> {
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
    // Parallel or collinear
    if d1 == d2 {
        return None;
    }

    // Exact endpoint hits don't need the division
    if d1 == 0.0 {
        return Some(p1);
    }
    if d2 == 0.0 {
        return Some(p2);
    }
    if d3 == 0.0 {
        return Some(q1);
    }
    if d4 == 0.0 {
        return Some(q2);
    }

    let t = d1 / (d1 - d2);
    Some(p1.lerp(p2, t))
}
