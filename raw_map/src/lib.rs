//! The input to map conversion: raw points, ways, and relations, already projected into the local
//! planar coordinate system. Some external reader fills this in; nothing here validates geometry
//! or resolves references. That's the job of convert_osm.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use abstutil::{deserialize_btreemap, serialize_btreemap, Tags};
use geom::{Bounds, Pt2D};

pub mod osm;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawMap {
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    pub nodes: BTreeMap<osm::NodeID, RawNode>,
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    pub ways: BTreeMap<osm::WayID, RawWay>,
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    pub relations: BTreeMap<osm::RelationID, RawRelation>,
    /// The extent of the tile this data was cut from. When missing, the extent of the nodes is
    /// used.
    pub boundary: Option<Bounds>,
    /// Set when the whole tile is known to be open water. Coastline handling needs this when no
    /// coastline crosses the tile.
    #[serde(default)]
    pub at_sea: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub pt: Pt2D,
    pub tags: Tags,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawWay {
    pub nodes: Vec<osm::NodeID>,
    pub tags: Tags,
}

impl RawWay {
    pub fn is_closed(&self) -> bool {
        self.nodes.len() >= 2 && self.nodes[0] == *self.nodes.last().unwrap()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawRelation {
    pub tags: Tags,
    /// (role, member)
    pub members: Vec<(String, osm::OsmID)>,
}

impl RawMap {
    pub fn blank() -> RawMap {
        RawMap::default()
    }

    pub fn add_node(&mut self, id: i64, pt: Pt2D, tags: Tags) -> osm::NodeID {
        let id = osm::NodeID(id);
        self.nodes.insert(id, RawNode { pt, tags });
        id
    }

    pub fn add_way(&mut self, id: i64, nodes: Vec<osm::NodeID>, tags: Tags) -> osm::WayID {
        let id = osm::WayID(id);
        self.ways.insert(id, RawWay { nodes, tags });
        id
    }

    pub fn add_relation(
        &mut self,
        id: i64,
        tags: Tags,
        members: Vec<(String, osm::OsmID)>,
    ) -> osm::RelationID {
        let id = osm::RelationID(id);
        self.relations.insert(id, RawRelation { tags, members });
        id
    }

    /// The extent of every node. Empty if there are no nodes.
    pub fn data_bounds(&self) -> Bounds {
        let mut b = Bounds::new();
        for node in self.nodes.values() {
            b.update(node.pt);
        }
        b
    }

    /// The explicit boundary if there is one, otherwise the extent of the data.
    pub fn file_bounds(&self) -> Bounds {
        self.boundary.unwrap_or_else(|| self.data_bounds())
    }

    /// Looks up the position of every node along a way, failing on the first missing node.
    pub fn way_pts(&self, id: osm::WayID) -> Result<Vec<Pt2D>> {
        let way = match self.ways.get(&id) {
            Some(w) => w,
            None => anyhow::bail!("{} doesn't exist", id),
        };
        way.nodes
            .iter()
            .map(|n| match self.nodes.get(n) {
                Some(node) => Ok(node.pt),
                None => anyhow::bail!("{} references missing {}", id, n),
            })
            .collect()
    }

    pub fn to_json(&self) -> String {
        abstutil::to_json(self)
    }

    pub fn from_json(raw: &str) -> Result<RawMap> {
        abstutil::from_json(raw)
    }
}
