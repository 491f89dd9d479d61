use std::fmt;

use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::{deserialize_f64, serialize_f64, trim_f64};

/// A position in the local planar coordinate system, in meters. Equality is exact; both
/// coordinates are snapped to millimeters on construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt2D {
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    x: f64,
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    z: f64,
}

impl Pt2D {
    pub fn new(x: f64, z: f64) -> Pt2D {
        if !x.is_finite() || !z.is_finite() {
            panic!("Bad Pt2D {}, {}", x, z);
        }

        Pt2D {
            x: trim_f64(x),
            z: trim_f64(z),
        }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn z(self) -> f64 {
        self.z
    }

    pub fn dist_to(self, to: Pt2D) -> f64 {
        ((self.x - to.x).powi(2) + (self.z - to.z).powi(2)).sqrt()
    }

    pub fn offset(self, dx: f64, dz: f64) -> Pt2D {
        Pt2D::new(self.x + dx, self.z + dz)
    }

    /// The direction from this point to another, in radians counter-clockwise from the x axis.
    pub fn angle_to(self, to: Pt2D) -> f64 {
        (to.z - self.z).atan2(to.x - self.x)
    }

    /// Linear interpolation; 0 is this point, 1 is `to`.
    pub fn lerp(self, to: Pt2D, pct: f64) -> Pt2D {
        Pt2D::new(
            self.x + pct * (to.x - self.x),
            self.z + pct * (to.z - self.z),
        )
    }

    pub fn center(pts: &[Pt2D]) -> Pt2D {
        if pts.is_empty() {
            panic!("Can't find the center of zero points");
        }
        let mut x = 0.0;
        let mut z = 0.0;
        for pt in pts {
            x += pt.x;
            z += pt.z;
        }
        let len = pts.len() as f64;
        Pt2D::new(x / len, z / len)
    }

    pub fn approx_eq(self, other: Pt2D, threshold: f64) -> bool {
        self.dist_to(other) <= threshold
    }

    pub fn to_hashable(self) -> HashablePt2D {
        HashablePt2D {
            x_nan: NotNan::new(self.x).unwrap(),
            z_nan: NotNan::new(self.z).unwrap(),
        }
    }
}

impl fmt::Display for Pt2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt2D::new({}, {})", self.x, self.z)
    }
}

impl From<Pt2D> for geo::Coordinate<f64> {
    fn from(pt: Pt2D) -> Self {
        geo::Coordinate { x: pt.x, y: pt.z }
    }
}

impl From<Pt2D> for geo::Point<f64> {
    fn from(pt: Pt2D) -> Self {
        geo::Point::new(pt.x, pt.z)
    }
}

/// Since Pt2D is snapped to a fixed precision and never NaN, it can be hashed and ordered. Use
/// this to deduplicate points or look up nodes by position.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HashablePt2D {
    x_nan: NotNan<f64>,
    z_nan: NotNan<f64>,
}

impl HashablePt2D {
    pub fn to_pt2d(self) -> Pt2D {
        Pt2D::new(self.x_nan.into_inner(), self.z_nan.into_inner())
    }
}

impl From<Pt2D> for HashablePt2D {
    fn from(pt: Pt2D) -> Self {
        pt.to_hashable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_to_millimeters() {
        let pt = Pt2D::new(1.23449, -0.0001);
        assert_eq!(pt.x(), 1.234);
        assert_eq!(pt.z(), 0.0);
        assert_eq!(Pt2D::new(1.2344, 2.0), Pt2D::new(1.2341, 2.0004));
        assert_ne!(Pt2D::new(1.234, 2.0), Pt2D::new(1.235, 2.0));
    }

    #[test]
    fn loading_snaps_to_millimeters() {
        let pt: Pt2D = serde_json::from_str(r#"{"x": 1.23456789, "z": -0.0004}"#).unwrap();
        assert_eq!(pt, Pt2D::new(1.235, 0.0));
        assert_eq!(pt.x(), 1.235);
        assert_eq!(pt.z(), 0.0);
    }

    #[test]
    fn hashable_roundtrip_dedupes() {
        let mut pts = vec![
            Pt2D::new(1.0, 2.0).to_hashable(),
            Pt2D::new(1.0001, 2.0).to_hashable(),
            Pt2D::new(3.0, 4.0).to_hashable(),
        ];
        pts.sort();
        pts.dedup();
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[1].to_pt2d(), Pt2D::new(3.0, 4.0));
    }

    #[test]
    fn interpolation() {
        let a = Pt2D::new(0.0, 0.0);
        let b = Pt2D::new(10.0, 20.0);
        assert_eq!(a.lerp(b, 0.5), Pt2D::new(5.0, 10.0));
        assert_eq!(a.dist_to(Pt2D::new(3.0, 4.0)), 5.0);
        assert_eq!(Pt2D::center(&[a, b]), Pt2D::new(5.0, 10.0));
    }
}
