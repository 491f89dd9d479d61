use std::fmt;

use serde::{Deserialize, Serialize};

use abstutil::Tags;

use crate::{osm, AreaID, NodeID, WayID};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationID(pub usize);

impl fmt::Display for RelationID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Relation #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationMember {
    Node(NodeID),
    Way(WayID),
    Area(AreaID),
    Relation(RelationID),
}

/// A group of other objects. Multipolygons with more than one outer ring also become one of these,
/// linking together the areas built from them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationID,
    pub osm_id: osm::RelationID,
    pub tags: Tags,
    /// (role, member), in the original order
    pub members: Vec<(String, RelationMember)>,
}
