use std::fmt;

use serde::{Deserialize, Serialize};

use abstutil::Tags;
use geom::Line;

use crate::{osm, Crossing, NodeID, Overlap, OverlapKind};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WayID(pub usize);

impl fmt::Display for WayID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Way #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaySegmentID(pub usize);

impl fmt::Display for WaySegmentID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Way segment #{}", self.0)
    }
}

/// A tagged way that didn't become an area. A way with N nodes owns N - 1 segments.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Way {
    pub id: WayID,
    pub osm_id: osm::WayID,
    pub tags: Tags,
    pub nodes: Vec<NodeID>,
    pub segments: Vec<WaySegmentID>,
}

/// One edge of a way.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WaySegment {
    pub id: WaySegmentID,
    pub way: WayID,
    /// Position within the way
    pub idx: usize,
    pub start: NodeID,
    pub end: NodeID,
    pub line: Line,
    pub overlaps: Vec<Overlap>,
}

impl WaySegment {
    pub fn has_node(&self, n: NodeID) -> bool {
        self.start == n || self.end == n
    }

    /// Is this segment the edge between the two nodes, in either direction?
    pub fn same_endpoints(&self, n1: NodeID, n2: NodeID) -> bool {
        (self.start == n1 && self.end == n2) || (self.start == n2 && self.end == n1)
    }

    /// Every crossing found with other segments or with area outlines.
    pub fn intersections(&self) -> impl Iterator<Item = &Crossing> {
        self.overlaps
            .iter()
            .filter_map(|o| match o.kind {
                OverlapKind::Intersects(ref crossings) => Some(crossings.iter()),
                _ => None,
            })
            .flatten()
    }
}
