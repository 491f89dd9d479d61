use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use abstutil::Tags;
use geom::{Pt2D, RingSegment};

use crate::{osm, Area, AreaID, Overlap, WaySegmentID};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeID(pub usize);

impl fmt::Display for NodeID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Node #{}", self.0)
    }
}

/// A position shared by any number of ways and areas. Most come from input points, but some are
/// synthetic: where coastlines cross the tile boundary, tile corners, and empty terrain corners.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeID,
    /// None for synthetic nodes
    pub osm_id: Option<osm::NodeID>,
    pub pt: Pt2D,
    pub tags: Tags,
    /// Areas with this node somewhere on their outer ring or a hole
    pub adjacent_areas: BTreeSet<AreaID>,
    /// Way segments starting or ending here
    pub connected_segments: BTreeSet<WaySegmentID>,
    /// For every adjacent area, the ring edges touching this node. Filled out by
    /// `calculate_adjacent_area_segments` once all areas exist.
    pub adjacent_area_segments: Vec<(AreaID, RingSegment)>,
    pub overlaps: Vec<Overlap>,
}

impl Node {
    pub fn is_synthetic(&self) -> bool {
        self.osm_id.is_none()
    }

    /// Records which edges of the adjacent areas meet at this node. Run after every area has been
    /// built; the overlap pass relies on it to tell a real crossing apart from a shared corner.
    pub fn calculate_adjacent_area_segments(&mut self, areas: &[Area]) {
        self.adjacent_area_segments.clear();
        for a in &self.adjacent_areas {
            let area = &areas[a.0];
            for (ring, nodes) in area.rings().enumerate() {
                for (segment, pair) in nodes.windows(2).enumerate() {
                    if pair[0] == self.id || pair[1] == self.id {
                        self.adjacent_area_segments
                            .push((*a, RingSegment { ring, segment }));
                    }
                }
            }
        }
    }

    pub fn is_adjacent_to(&self, area: AreaID) -> bool {
        self.adjacent_areas.contains(&area)
    }
}
