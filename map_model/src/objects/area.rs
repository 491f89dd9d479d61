use std::fmt;

use serde::{Deserialize, Serialize};

use abstutil::Tags;
use geom::{Bounds, Polygon};

use crate::{osm, NodeID, Overlap};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaID(pub usize);

impl fmt::Display for AreaID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Area #{}", self.0)
    }
}

/// Where an area came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaBasis {
    /// A single closed way
    Way(osm::WayID),
    /// One outer ring of a multipolygon relation
    Relation(osm::RelationID),
    /// Sea synthesized from coastlines and the tile boundary
    Coastline,
    /// Filler covering space no mapped area claims
    EmptyTerrain,
}

/// A polygon with holes. The outer ring runs counter-clockwise and the holes clockwise. Every
/// ring is a closed list of nodes (the first node is repeated at the end), and the polygon's rings
/// follow the same order, so edge `i` of a ring is always the pair of nodes `i` and `i + 1`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaID,
    pub basis: AreaBasis,
    pub tags: Tags,
    pub outer: Vec<NodeID>,
    pub holes: Vec<Vec<NodeID>>,
    pub polygon: Polygon,
    pub overlaps: Vec<Overlap>,
}

impl Area {
    /// The outer ring first, then the holes. Ring indices match `geom::RingSegment`.
    pub fn rings(&self) -> impl Iterator<Item = &Vec<NodeID>> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }

    pub fn get_bounds(&self) -> Bounds {
        self.polygon.get_bounds()
    }

    /// Every node on any ring, without duplicates.
    pub fn all_nodes(&self) -> Vec<NodeID> {
        let mut nodes: Vec<NodeID> = self.rings().flatten().cloned().collect();
        nodes.sort();
        nodes.dedup();
        nodes
    }

    /// Do both areas use the same edge (in either direction) somewhere on their rings? Returns
    /// all such edges.
    pub fn shared_edges(&self, other: &Area) -> Vec<(NodeID, NodeID)> {
        let mut mine: Vec<(NodeID, NodeID)> = self
            .rings()
            .flat_map(|r| r.windows(2).map(|pair| sorted_pair(pair[0], pair[1])))
            .collect();
        mine.sort();
        let mut shared: Vec<(NodeID, NodeID)> = other
            .rings()
            .flat_map(|r| r.windows(2).map(|pair| sorted_pair(pair[0], pair[1])))
            .filter(|pair| mine.binary_search(pair).is_ok())
            .collect();
        shared.sort();
        shared.dedup();
        shared
    }

    /// Does this area have the edge (in either direction) on one of its rings?
    pub fn has_edge(&self, n1: NodeID, n2: NodeID) -> bool {
        let edge = sorted_pair(n1, n2);
        self.rings()
            .any(|r| r.windows(2).any(|pair| sorted_pair(pair[0], pair[1]) == edge))
    }
}

fn sorted_pair(a: NodeID, b: NodeID) -> (NodeID, NodeID) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}
