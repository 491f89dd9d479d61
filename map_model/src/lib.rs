//! The finished map: nodes, way segments, areas with holes, and relations, plus every geometric
//! overlap between them. Objects live in arenas and refer to each other by index, so the whole
//! thing is plain data. It's built once by `MapBuilder` (driven by the convert_osm crate) and is
//! read-only afterwards.

#[macro_use]
extern crate anyhow;

mod make;
mod map;
mod objects;
mod overlap;

pub use raw_map::osm;

pub use crate::make::MapBuilder;
pub use crate::map::MapData;
pub use crate::objects::area::{Area, AreaBasis, AreaID};
pub use crate::objects::node::{Node, NodeID};
pub use crate::objects::relation::{Relation, RelationID, RelationMember};
pub use crate::objects::way::{Way, WayID, WaySegment, WaySegmentID};
pub use crate::overlap::{Crossing, Element, ElementID, Overlap, OverlapKind};
