use serde::{Deserialize, Serialize};

use crate::{Pt2D, Ring};

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_z: f64,
}

impl Bounds {
    /// A boundary including no points.
    pub fn new() -> Bounds {
        Bounds {
            min_x: f64::MAX,
            min_z: f64::MAX,
            max_x: f64::MIN,
            max_z: f64::MIN,
        }
    }

    pub fn from(pts: &[Pt2D]) -> Bounds {
        let mut b = Bounds::new();
        for pt in pts {
            b.update(*pt);
        }
        b
    }

    pub fn from_corners(min_x: f64, min_z: f64, max_x: f64, max_z: f64) -> Bounds {
        Bounds {
            min_x: min_x.min(max_x),
            min_z: min_z.min(max_z),
            max_x: min_x.max(max_x),
            max_z: min_z.max(max_z),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_z > self.max_z
    }

    pub fn update(&mut self, pt: Pt2D) {
        self.min_x = self.min_x.min(pt.x());
        self.max_x = self.max_x.max(pt.x());
        self.min_z = self.min_z.min(pt.z());
        self.max_z = self.max_z.max(pt.z());
    }

    pub fn union(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.update(Pt2D::new(other.min_x, other.min_z));
        self.update(Pt2D::new(other.max_x, other.max_z));
    }

    /// Grow the box by the margin on every side.
    pub fn padded(&self, margin: f64) -> Bounds {
        Bounds {
            min_x: self.min_x - margin,
            min_z: self.min_z - margin,
            max_x: self.max_x + margin,
            max_z: self.max_z + margin,
        }
    }

    /// Inclusive of the edges.
    pub fn contains(&self, pt: Pt2D) -> bool {
        pt.x() >= self.min_x && pt.x() <= self.max_x && pt.z() >= self.min_z && pt.z() <= self.max_z
    }

    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_z >= self.min_z
            && other.max_z <= self.max_z
    }

    /// Touching edges count.
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(other.min_x > self.max_x
            || other.max_x < self.min_x
            || other.min_z > self.max_z
            || other.max_z < self.min_z)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_z - self.min_z
    }

    pub fn center(&self) -> Pt2D {
        Pt2D::new(
            self.min_x + self.width() / 2.0,
            self.min_z + self.height() / 2.0,
        )
    }

    /// The four corners in clockwise order, starting from the north-west one.
    pub fn corners_clockwise(&self) -> [Pt2D; 4] {
        [
            Pt2D::new(self.min_x, self.max_z),
            Pt2D::new(self.max_x, self.max_z),
            Pt2D::new(self.max_x, self.min_z),
            Pt2D::new(self.min_x, self.min_z),
        ]
    }

    /// The outline as a counter-clockwise ring. Fails if the box has no area.
    pub fn get_rectangle(&self) -> anyhow::Result<Ring> {
        let mut pts: Vec<Pt2D> = self.corners_clockwise().to_vec();
        pts.reverse();
        pts.push(pts[0]);
        Ring::new(pts)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::new()
    }
}
