//! Turns multipolygon relations into areas. Member ways are either paired up directly (one closed
//! outer way plus closed inner ways) or glued end to end into rings, then every hole is matched to
//! the outer ring it belongs in.

use itertools::Itertools;

use abstutil::Tags;
use geom::{Polygon, Ring};
use map_model::{osm, AreaBasis, AreaID, MapBuilder, NodeID};
use raw_map::RawRelation;

use crate::lookup::NodeLookup;
use crate::rings::assemble_rings;
use crate::ConversionIssue;

/// What one relation turned into.
pub struct Multipolygon {
    pub areas: Vec<AreaID>,
    /// Outer member ways that lent their tags to the relation's areas, so they shouldn't also
    /// become areas or way segments on their own.
    pub covered_ways: Vec<osm::WayID>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Role {
    Outer,
    Inner,
}

struct Member {
    role: Role,
    way: osm::WayID,
    nodes: Vec<NodeID>,
}

impl Member {
    fn is_closed(&self) -> bool {
        self.nodes.len() >= 2 && self.nodes[0] == self.nodes[self.nodes.len() - 1]
    }
}

/// Nothing is added to the map unless the whole relation works out.
pub fn build_multipolygon(
    builder: &mut MapBuilder,
    lookup: &NodeLookup,
    id: osm::RelationID,
    rel: &RawRelation,
) -> Result<Multipolygon, ConversionIssue> {
    let element = osm::OsmID::Relation(id);
    let mut members = Vec::new();
    for (role, member) in &rel.members {
        let role = match role.as_str() {
            osm::OUTER | "" => Role::Outer,
            osm::INNER => Role::Inner,
            _ => {
                debug!("Ignoring {} with role {} in {}", member, role, id);
                continue;
            }
        };
        if let osm::OsmID::Way(way) = member {
            members.push(Member {
                role,
                way: *way,
                nodes: lookup.way_nodes(element, *way)?,
            });
        }
    }

    let outers: Vec<&Member> = members.iter().filter(|m| m.role == Role::Outer).collect();
    if outers.is_empty() {
        return Err(ConversionIssue::invalid(element, "no outer ways"));
    }
    // The relation usually carries the meaningful tags, but old-style multipolygons leave them on
    // the outer way. Only then is the outer way represented by the relation's areas.
    let (tags, covered_ways) = if rel.tags.len() > 1 {
        (
            Tags::new(rel.tags.iter().filter(|(k, _)| k.as_str() != osm::TYPE)),
            Vec::new(),
        )
    } else {
        let tags = lookup
            .raw
            .ways
            .get(&outers[0].way)
            .map(|w| w.tags.clone())
            .unwrap_or_else(Tags::empty);
        (tags, outers.iter().map(|m| m.way).collect())
    };

    if outers.len() == 1 && members.iter().all(|m| m.is_closed()) {
        let holes = members
            .iter()
            .filter(|m| m.role == Role::Inner)
            .map(|m| m.nodes.clone())
            .collect();
        let area = builder
            .add_area(AreaBasis::Relation(id), tags, outers[0].nodes.clone(), holes)
            .map_err(|err| ConversionIssue::invalid(element, err))?;
        return Ok(Multipolygon {
            areas: vec![area],
            covered_ways,
        });
    }

    let assembled = assemble_rings(
        members
            .iter()
            .enumerate()
            .map(|(idx, m)| (idx, m.nodes.clone()))
            .collect(),
        false,
    )
    .map_err(|stuck| {
        ConversionIssue::invalid(
            element,
            format!(
                "can't close a ring from {}",
                stuck.iter().map(|idx| members[*idx].way).join(", ")
            ),
        )
    })?;

    let mut rings = Vec::new();
    for ring in assembled {
        let pts = ring
            .nodes
            .iter()
            .map(|n| builder.map().get_n(*n).pt)
            .collect();
        let polygon = Ring::new(pts).map_err(|err| ConversionIssue::invalid(element, err))?;
        let roles: Vec<Role> = ring
            .sources
            .iter()
            .map(|idx| members[*idx].role)
            .dedup()
            .collect();
        let role = if roles.len() == 1 { Some(roles[0]) } else { None };
        rings.push((ring.nodes, polygon, role));
    }

    // Rings glued from both outer and inner ways don't say what they are. Alternate by depth.
    let mut outer_rings = Vec::new();
    let mut hole_rings = Vec::new();
    for (idx, (nodes, polygon, role)) in rings.iter().enumerate() {
        let role = role.unwrap_or_else(|| {
            let depth = rings
                .iter()
                .enumerate()
                .filter(|(other, (_, p, _))| *other != idx && p.contains_ring(polygon))
                .count();
            if depth % 2 == 0 {
                Role::Outer
            } else {
                Role::Inner
            }
        });
        match role {
            Role::Outer => outer_rings.push((nodes.clone(), polygon.clone())),
            Role::Inner => hole_rings.push((nodes.clone(), polygon.clone())),
        }
    }

    let assignment = assign_holes(
        &outer_rings.iter().map(|(_, r)| r.clone()).collect::<Vec<_>>(),
        &hole_rings.iter().map(|(_, r)| r.clone()).collect::<Vec<_>>(),
    );
    let assigned = assignment.iter().filter(|a| a.is_some()).count();
    if assigned != hole_rings.len() {
        return Err(ConversionIssue::AmbiguousMultipolygon {
            relation: id,
            assigned,
            candidates: hole_rings.len(),
        });
    }

    // Validate everything before adding anything
    let mut pending = Vec::new();
    for (outer_idx, (outer_nodes, outer_ring)) in outer_rings.into_iter().enumerate() {
        let mut holes = Vec::new();
        let mut cancelled = false;
        for (hole_idx, (hole_nodes, hole_ring)) in hole_rings.iter().enumerate() {
            if assignment[hole_idx] != Some(outer_idx) {
                continue;
            }
            if same_outline(&outer_ring, hole_ring) {
                cancelled = true;
            } else {
                holes.push((hole_nodes.clone(), hole_ring.clone()));
            }
        }
        if cancelled {
            debug!(
                "An inner ring of {} exactly cancels out one of the outer rings",
                id
            );
            continue;
        }
        Polygon::new(
            outer_ring,
            holes.iter().map(|(_, ring)| ring.clone()).collect(),
        )
        .map_err(|err| ConversionIssue::invalid(element, err))?;
        pending.push((outer_nodes, holes.into_iter().map(|(nodes, _)| nodes).collect()));
    }

    let mut areas = Vec::new();
    for (outer, holes) in pending {
        areas.push(
            builder
                .add_area(AreaBasis::Relation(id), tags.clone(), outer, holes)
                .map_err(|err| ConversionIssue::invalid(element, err))?,
        );
    }
    Ok(Multipolygon {
        areas,
        covered_ways,
    })
}

/// Matches every hole to the outer ring it belongs in: the smallest one that contains it or has
/// exactly the same outline. Ties go to the outer listed first. Holes that fit nowhere are None.
pub fn assign_holes(outers: &[Ring], holes: &[Ring]) -> Vec<Option<usize>> {
    holes
        .iter()
        .map(|hole| {
            outers
                .iter()
                .enumerate()
                .filter(|(_, outer)| same_outline(outer, hole) || outer.contains_ring(hole))
                .min_by(|(_, o1), (_, o2)| o1.area().total_cmp(&o2.area()))
                .map(|(idx, _)| idx)
        })
        .collect()
}

/// The same points, regardless of starting point or direction.
fn same_outline(r1: &Ring, r2: &Ring) -> bool {
    let sorted = |r: &Ring| -> Vec<(f64, f64)> {
        r.points()[1..]
            .iter()
            .map(|pt| (pt.x(), pt.z()))
            .sorted_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)))
            .collect()
    };
    r1.num_segments() == r2.num_segments() && sorted(r1) == sorted(r2)
}

#[cfg(test)]
mod tests {
    use geom::Pt2D;

    use super::*;

    fn rect(x1: f64, z1: f64, x2: f64, z2: f64) -> Ring {
        Ring::must_new(vec![
            Pt2D::new(x1, z1),
            Pt2D::new(x2, z1),
            Pt2D::new(x2, z2),
            Pt2D::new(x1, z2),
            Pt2D::new(x1, z1),
        ])
    }

    #[test]
    fn smallest_enclosing_outer_wins() {
        let outers = vec![
            // Areas 100, 50, and a disjoint 30
            rect(0.0, 0.0, 10.0, 10.0),
            rect(1.0, 2.5, 9.0, 8.75),
            rect(20.0, 0.0, 25.0, 6.0),
        ];
        let holes = vec![
            // Exactly the middle one, but reversed
            rect(1.0, 2.5, 9.0, 8.75).reversed(),
            // Outside everything
            rect(30.0, 30.0, 31.0, 31.0),
            // In the biggest outer, but not the middle one
            rect(0.5, 0.5, 1.5, 1.5),
            // In the middle, so also in the biggest
            rect(4.0, 4.0, 5.0, 5.0),
        ];
        assert_eq!(
            assign_holes(&outers, &holes),
            vec![Some(1), None, Some(0), Some(1)]
        );
    }

    #[test]
    fn outlines() {
        let r = rect(0.0, 0.0, 2.0, 1.0);
        assert!(same_outline(&r, &r.reversed()));
        assert!(!same_outline(&r, &rect(0.0, 0.0, 2.0, 2.0)));
    }
}
