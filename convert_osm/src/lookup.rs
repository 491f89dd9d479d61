use std::collections::{BTreeMap, HashMap};

use abstutil::Tags;
use geom::{HashablePt2D, Pt2D};
use map_model::{osm, MapBuilder, MapData, NodeID};
use raw_map::RawMap;

use crate::ConversionIssue;

/// Translates input node references into the nodes already built.
pub struct NodeLookup<'a> {
    pub raw: &'a RawMap,
    ids: BTreeMap<osm::NodeID, NodeID>,
}

impl<'a> NodeLookup<'a> {
    pub fn new(raw: &'a RawMap) -> NodeLookup<'a> {
        NodeLookup {
            raw,
            ids: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, osm_id: osm::NodeID, id: NodeID) {
        self.ids.insert(osm_id, id);
    }

    pub fn get(&self, osm_id: osm::NodeID) -> Option<NodeID> {
        self.ids.get(&osm_id).cloned()
    }

    /// The nodes along a way. `element` is whatever needs the way, and is blamed if the way or any
    /// of its nodes is missing.
    pub fn way_nodes(
        &self,
        element: osm::OsmID,
        way: osm::WayID,
    ) -> Result<Vec<NodeID>, ConversionIssue> {
        let raw_way = self
            .raw
            .ways
            .get(&way)
            .ok_or(ConversionIssue::UnresolvedReference {
                element,
                missing: osm::OsmID::Way(way),
            })?;
        raw_way
            .nodes
            .iter()
            .map(|n| {
                self.get(*n).ok_or(ConversionIssue::UnresolvedReference {
                    element,
                    missing: osm::OsmID::Node(*n),
                })
            })
            .collect()
    }
}

/// Finds nodes by exact position, creating synthetic ones where nothing exists yet. Geometry
/// computed from scratch (tile corners, boundary crossings, boolean op output) is tied back into
/// the shared node arena this way.
pub struct PositionLookup {
    nodes: HashMap<HashablePt2D, NodeID>,
}

impl PositionLookup {
    /// When several nodes sit at the same spot, the first one wins.
    pub fn new(map: &MapData) -> PositionLookup {
        let mut nodes = HashMap::new();
        for n in map.all_nodes() {
            nodes.entry(n.pt.to_hashable()).or_insert(n.id);
        }
        PositionLookup { nodes }
    }

    pub fn get(&self, pt: Pt2D) -> Option<NodeID> {
        self.nodes.get(&pt.to_hashable()).cloned()
    }

    pub fn get_or_add(&mut self, builder: &mut MapBuilder, pt: Pt2D) -> NodeID {
        *self
            .nodes
            .entry(pt.to_hashable())
            .or_insert_with(|| builder.add_node(None, pt, Tags::empty()))
    }

    pub fn get_or_add_all(&mut self, builder: &mut MapBuilder, pts: &[Pt2D]) -> Vec<NodeID> {
        pts.iter().map(|pt| self.get_or_add(builder, *pt)).collect()
    }
}
