use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use abstutil::{prettyprint_usize, Timer};
use geom::Bounds;

use crate::{
    Area, AreaID, Element, ElementID, Node, NodeID, Overlap, OverlapKind, Relation, RelationID,
    Way, WayID, WaySegment, WaySegmentID,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapData {
    pub(crate) nodes: Vec<Node>,
    pub(crate) ways: Vec<Way>,
    pub(crate) way_segments: Vec<WaySegment>,
    pub(crate) areas: Vec<Area>,
    pub(crate) relations: Vec<Relation>,

    /// The tile this map covers
    pub(crate) file_bounds: Bounds,
    /// The extent of everything actually in the map
    pub(crate) data_bounds: Bounds,
}

impl MapData {
    pub fn all_nodes(&self) -> &Vec<Node> {
        &self.nodes
    }

    pub fn all_ways(&self) -> &Vec<Way> {
        &self.ways
    }

    pub fn all_way_segments(&self) -> &Vec<WaySegment> {
        &self.way_segments
    }

    pub fn all_areas(&self) -> &Vec<Area> {
        &self.areas
    }

    pub fn all_relations(&self) -> &Vec<Relation> {
        &self.relations
    }

    pub fn get_n(&self, id: NodeID) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_w(&self, id: WayID) -> &Way {
        &self.ways[id.0]
    }

    pub fn get_ws(&self, id: WaySegmentID) -> &WaySegment {
        &self.way_segments[id.0]
    }

    pub fn get_a(&self, id: AreaID) -> &Area {
        &self.areas[id.0]
    }

    pub fn get_r(&self, id: RelationID) -> &Relation {
        &self.relations[id.0]
    }

    pub fn get(&self, id: ElementID) -> Element {
        match id {
            ElementID::Node(n) => Element::Node(self.get_n(n)),
            ElementID::WaySegment(s) => Element::WaySegment(self.get_ws(s)),
            ElementID::Area(a) => Element::Area(self.get_a(a)),
        }
    }

    pub fn overlaps_of(&self, id: ElementID) -> &Vec<Overlap> {
        self.get(id).overlaps()
    }

    pub fn get_file_bounds(&self) -> &Bounds {
        &self.file_bounds
    }

    pub fn get_data_bounds(&self) -> &Bounds {
        &self.data_bounds
    }

    /// Every node, way segment, and area, in a fixed order: all nodes, then segments, then areas.
    pub fn all_elements(&self) -> impl Iterator<Item = Element> {
        self.nodes
            .iter()
            .map(Element::Node)
            .chain(self.way_segments.iter().map(Element::WaySegment))
            .chain(self.areas.iter().map(Element::Area))
    }

    /// Elements whose bounding box touches the query.
    pub fn elements_in(&self, bounds: &Bounds) -> Vec<ElementID> {
        self.all_elements()
            .filter(|e| e.get_bounds().intersects(bounds))
            .map(|e| e.id())
            .collect()
    }

    /// How many overlaps of each kind exist. Each overlap is counted once, not once per
    /// participant.
    pub fn count_overlaps(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for e in self.all_elements() {
            for o in e.overlaps() {
                // Every overlap is stored twice
                if o.e1 != e.id() {
                    continue;
                }
                let key = match o.kind {
                    OverlapKind::SharesSegment(_) => "shares segment",
                    OverlapKind::Contains => "contains",
                    OverlapKind::Intersects(_) => "intersects",
                };
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn describe(&self, timer: &mut Timer) {
        timer.note(format!(
            "{} nodes, {} ways ({} segments), {} areas, {} relations",
            prettyprint_usize(self.nodes.len()),
            prettyprint_usize(self.ways.len()),
            prettyprint_usize(self.way_segments.len()),
            prettyprint_usize(self.areas.len()),
            prettyprint_usize(self.relations.len())
        ));
        for (kind, count) in self.count_overlaps() {
            timer.note(format!("{} overlaps: {}", kind, prettyprint_usize(count)));
        }
    }

    pub fn to_json(&self) -> String {
        abstutil::to_json(self)
    }

    pub fn from_json(raw: &str) -> Result<MapData> {
        abstutil::from_json(raw)
    }
}
