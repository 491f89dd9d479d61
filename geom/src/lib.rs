//! Planar geometry for building the map data model. Everything here works in a local coordinate
//! system measured in meters, with `x` pointing east and `z` pointing north. Positions are snapped
//! to millimeters when they're created, so exact equality between points is meaningful.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use serde::{Deserialize, Deserializer, Serializer};

mod boolean;
mod bounds;
mod faces;
mod grid;
mod hull;
mod line;
mod polygon;
mod pt;
mod ring;

pub use crate::bounds::Bounds;
pub use crate::faces::faces_from_segment_graph;
pub use crate::grid::SpatialGrid;
pub use crate::hull::{convex_hull, minimum_rotated_bounding_box};
pub use crate::line::{orientation, true_intersection, Line};
pub use crate::polygon::{Polygon, RingSegment};
pub use crate::pt::{HashablePt2D, Pt2D};
pub use crate::ring::{signed_area, Ring};

/// Points closer than this are the same point. Matches the millimeter snapping of `Pt2D`.
pub const EPSILON_DIST: f64 = 0.001;

/// Snaps to millimeter resolution. Losing sub-millimeter precision keeps exact node matching and
/// the self-intersection tests stable.
pub fn trim_f64(x: f64) -> f64 {
    let result = (x * 1000.0).round() / 1000.0;
    // Avoid -0.0, which would hash differently than 0.0
    if result == 0.0 {
        0.0
    } else {
        result
    }
}

/// Serializes a trimmed f64. Use with `#[serde(serialize_with = "serialize_f64")]`.
pub fn serialize_f64<S: Serializer>(x: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(trim_f64(*x))
}

/// Deserializes and trims an f64, so values loaded from a file follow the same precision as ones
/// created in code.
pub fn deserialize_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let x = <f64>::deserialize(d)?;
    if !x.is_finite() {
        return Err(serde::de::Error::custom(format!("{} isn't finite", x)));
    }
    Ok(trim_f64(x))
}
