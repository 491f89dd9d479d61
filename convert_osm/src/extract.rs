//! The simpler stages of the conversion: areas from single closed ways, way segments from
//! everything else that's tagged, and relations. Each returns what it built along with the
//! problems it ran into.

use std::collections::{BTreeMap, BTreeSet};

use map_model::{osm, AreaBasis, AreaID, MapBuilder, RelationID, RelationMember, WayID};

use crate::lookup::NodeLookup;
use crate::{ConversionIssue, TagClassifier};

/// Closed ways tagged as areas that no multipolygon covers already. Every way attempted is
/// reported as consumed, even if it turns out to be invalid.
pub fn closed_way_areas(
    builder: &mut MapBuilder,
    lookup: &NodeLookup,
    classifier: &dyn TagClassifier,
    covered: &BTreeSet<osm::WayID>,
) -> (
    BTreeMap<osm::WayID, AreaID>,
    BTreeSet<osm::WayID>,
    Vec<ConversionIssue>,
) {
    let mut areas = BTreeMap::new();
    let mut consumed = BTreeSet::new();
    let mut issues = Vec::new();
    for (id, way) in &lookup.raw.ways {
        if covered.contains(id) || !way.is_closed() || !classifier.is_area(&way.tags) {
            continue;
        }
        consumed.insert(*id);
        let element = osm::OsmID::Way(*id);
        let nodes = match lookup.way_nodes(element, *id) {
            Ok(nodes) => nodes,
            Err(issue) => {
                issues.push(issue);
                continue;
            }
        };
        match builder.add_area(AreaBasis::Way(*id), way.tags.clone(), nodes, Vec::new()) {
            Ok(area) => {
                areas.insert(*id, area);
            }
            Err(err) => issues.push(ConversionIssue::invalid(element, err)),
        }
    }
    (areas, consumed, issues)
}

/// Every tagged way that didn't become part of an area.
pub fn way_segments(
    builder: &mut MapBuilder,
    lookup: &NodeLookup,
    consumed: &BTreeSet<osm::WayID>,
) -> (BTreeMap<osm::WayID, WayID>, Vec<ConversionIssue>) {
    let mut ways = BTreeMap::new();
    let mut issues = Vec::new();
    for (id, way) in &lookup.raw.ways {
        if way.tags.is_empty() || consumed.contains(id) {
            continue;
        }
        let element = osm::OsmID::Way(*id);
        let nodes = match lookup.way_nodes(element, *id) {
            Ok(nodes) => nodes,
            Err(issue) => {
                issues.push(issue);
                continue;
            }
        };
        match builder.add_way(*id, way.tags.clone(), nodes) {
            Ok(w) => {
                ways.insert(*id, w);
            }
            Err(err) => issues.push(ConversionIssue::invalid(element, err)),
        }
    }
    (ways, issues)
}

/// Everything relations can point to, by input ID.
pub struct Resolved<'a> {
    pub ways: &'a BTreeMap<osm::WayID, WayID>,
    pub way_areas: &'a BTreeMap<osm::WayID, AreaID>,
    /// Areas built from each multipolygon
    pub multipolygons: &'a BTreeMap<osm::RelationID, Vec<AreaID>>,
}

/// Tagged relations, other than multipolygons that became a single area (or nothing). A
/// multipolygon with several outer rings is kept to tie its areas together. Members that can't be
/// found are dropped; relations left with no members at all are removed. Returns the relations
/// kept with only some of their members.
pub fn relations(
    builder: &mut MapBuilder,
    lookup: &NodeLookup,
    classifier: &dyn TagClassifier,
    resolved: Resolved,
) -> (Vec<osm::RelationID>, Vec<ConversionIssue>) {
    let mut issues = Vec::new();
    let mut partial = Vec::new();

    // Relations can refer to each other, so hand out all the IDs first
    let mut ids: BTreeMap<osm::RelationID, RelationID> = BTreeMap::new();
    for (id, rel) in &lookup.raw.relations {
        if rel.tags.is_empty() {
            continue;
        }
        if classifier.is_multipolygon(&rel.tags)
            && resolved.multipolygons.get(id).map(|a| a.len()).unwrap_or(0) < 2
        {
            continue;
        }
        ids.insert(*id, builder.add_relation(*id, rel.tags.clone()));
    }

    for (osm_id, id) in &ids {
        if let Some(areas) = resolved.multipolygons.get(osm_id) {
            builder.set_relation_members(
                *id,
                areas
                    .iter()
                    .map(|a| (osm::OUTER.to_string(), RelationMember::Area(*a)))
                    .collect(),
            );
            continue;
        }

        let element = osm::OsmID::Relation(*osm_id);
        let mut members = Vec::new();
        let mut missing = false;
        for (role, member) in &lookup.raw.relations[osm_id].members {
            let found = match member {
                osm::OsmID::Node(n) => lookup.get(*n).map(RelationMember::Node),
                osm::OsmID::Way(w) => resolved
                    .ways
                    .get(w)
                    .map(|w| RelationMember::Way(*w))
                    .or_else(|| resolved.way_areas.get(w).map(|a| RelationMember::Area(*a))),
                osm::OsmID::Relation(r) => ids.get(r).map(|r| RelationMember::Relation(*r)),
            };
            match found {
                Some(m) => members.push((role.clone(), m)),
                None => {
                    missing = true;
                    issues.push(ConversionIssue::UnresolvedReference {
                        element,
                        missing: *member,
                    });
                }
            }
        }
        if missing {
            if members.is_empty() {
                debug!("Dropping {}, since none of its members exist", osm_id);
            } else {
                partial.push(*osm_id);
            }
        }
        builder.set_relation_members(*id, members);
    }

    let dropped = builder.remove_empty_relations();
    if dropped > 0 {
        info!("Dropped {} relations with no members", dropped);
    }
    (partial, issues)
}
