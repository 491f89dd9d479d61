//! Everything needed to assemble a `MapData` one object at a time. Objects must be added in
//! dependency order (nodes, then areas, then ways, then relations) since each step refers to
//! objects that already exist.

use std::collections::BTreeSet;

use anyhow::Result;

use abstutil::Tags;
use geom::{Bounds, Line, Polygon, Pt2D, Ring};

use crate::{
    osm, Area, AreaBasis, AreaID, ElementID, MapData, Node, NodeID, Overlap, Relation,
    RelationID, RelationMember, Way, WayID, WaySegment, WaySegmentID,
};

pub struct MapBuilder {
    map: MapData,
}

impl MapBuilder {
    pub fn new(file_bounds: Bounds) -> MapBuilder {
        MapBuilder {
            map: MapData {
                nodes: Vec::new(),
                ways: Vec::new(),
                way_segments: Vec::new(),
                areas: Vec::new(),
                relations: Vec::new(),
                file_bounds,
                data_bounds: Bounds::new(),
            },
        }
    }

    /// A read-only view of everything built so far.
    pub fn map(&self) -> &MapData {
        &self.map
    }

    pub fn add_node(&mut self, osm_id: Option<osm::NodeID>, pt: Pt2D, tags: Tags) -> NodeID {
        let id = NodeID(self.map.nodes.len());
        self.map.data_bounds.update(pt);
        self.map.nodes.push(Node {
            id,
            osm_id,
            pt,
            tags,
            adjacent_areas: BTreeSet::new(),
            connected_segments: BTreeSet::new(),
            adjacent_area_segments: Vec::new(),
            overlaps: Vec::new(),
        });
        id
    }

    /// Validates and adds an area. Each ring is a list of nodes; the closing node may be repeated
    /// at the end or left out. The outer ring is stored counter-clockwise and the holes clockwise,
    /// regardless of the input orientation.
    pub fn add_area(
        &mut self,
        basis: AreaBasis,
        tags: Tags,
        outer: Vec<NodeID>,
        holes: Vec<Vec<NodeID>>,
    ) -> Result<AreaID> {
        let (outer, outer_ring) = self.make_ring(outer, false)?;
        let mut hole_nodes = Vec::new();
        let mut hole_rings = Vec::new();
        for hole in holes {
            let (nodes, ring) = self.make_ring(hole, true)?;
            hole_nodes.push(nodes);
            hole_rings.push(ring);
        }
        let polygon = Polygon::new(outer_ring, hole_rings)?;

        let id = AreaID(self.map.areas.len());
        for n in outer.iter().chain(hole_nodes.iter().flatten()) {
            self.map.nodes[n.0].adjacent_areas.insert(id);
        }
        self.map.areas.push(Area {
            id,
            basis,
            tags,
            outer,
            holes: hole_nodes,
            polygon,
            overlaps: Vec::new(),
        });
        Ok(id)
    }

    fn make_ring(&self, mut nodes: Vec<NodeID>, clockwise: bool) -> Result<(Vec<NodeID>, Ring)> {
        nodes.dedup();
        if nodes.len() >= 2 && nodes[0] != nodes[nodes.len() - 1] {
            nodes.push(nodes[0]);
        }
        if let Some(n) = nodes.iter().find(|n| n.0 >= self.map.nodes.len()) {
            bail!("Ring refers to unknown {}", n);
        }
        let ring = Ring::new(nodes.iter().map(|n| self.map.nodes[n.0].pt).collect())?;
        if ring.is_clockwise() != clockwise {
            nodes.reverse();
            return Ok((nodes, ring.reversed()));
        }
        Ok((nodes, ring))
    }

    /// Adds a way and one segment per consecutive pair of nodes. Repeated consecutive nodes are
    /// collapsed. Fails if fewer than two distinct nodes remain, or if two consecutive nodes sit at
    /// the same position.
    pub fn add_way(&mut self, osm_id: osm::WayID, tags: Tags, mut nodes: Vec<NodeID>) -> Result<WayID> {
        nodes.dedup();
        if nodes.len() < 2 {
            bail!("{} has fewer than 2 distinct nodes", osm_id);
        }
        let mut lines = Vec::new();
        for pair in nodes.windows(2) {
            lines.push(Line::new(
                self.map.nodes[pair[0].0].pt,
                self.map.nodes[pair[1].0].pt,
            )?);
        }

        let id = WayID(self.map.ways.len());
        let mut segments = Vec::new();
        for (idx, (pair, line)) in nodes.windows(2).zip(lines).enumerate() {
            let seg = WaySegmentID(self.map.way_segments.len());
            self.map.way_segments.push(WaySegment {
                id: seg,
                way: id,
                idx,
                start: pair[0],
                end: pair[1],
                line,
                overlaps: Vec::new(),
            });
            self.map.nodes[pair[0].0].connected_segments.insert(seg);
            self.map.nodes[pair[1].0].connected_segments.insert(seg);
            segments.push(seg);
        }
        self.map.ways.push(Way {
            id,
            osm_id,
            tags,
            nodes,
            segments,
        });
        Ok(id)
    }

    /// Relations may refer to each other, so IDs are handed out before members are known. Fill
    /// them in later with `set_relation_members`.
    pub fn add_relation(&mut self, osm_id: osm::RelationID, tags: Tags) -> RelationID {
        let id = RelationID(self.map.relations.len());
        self.map.relations.push(Relation {
            id,
            osm_id,
            tags,
            members: Vec::new(),
        });
        id
    }

    pub fn set_relation_members(&mut self, id: RelationID, members: Vec<(String, RelationMember)>) {
        self.map.relations[id.0].members = members;
    }

    /// Drops relations that ended up with no members. Only call this before anything else refers
    /// to relations by ID, since IDs of later relations shift down.
    pub fn remove_empty_relations(&mut self) -> usize {
        let before = self.map.relations.len();
        let mut remap = Vec::new();
        let mut kept = Vec::new();
        for rel in self.map.relations.drain(..) {
            if rel.members.is_empty() {
                remap.push(None);
            } else {
                remap.push(Some(RelationID(kept.len())));
                kept.push(rel);
            }
        }
        for rel in &mut kept {
            if let Some(new_id) = remap[rel.id.0] {
                rel.id = new_id;
            }
            rel.members.retain(|(_, m)| match m {
                RelationMember::Relation(r) => remap[r.0].is_some(),
                _ => true,
            });
            for (_, m) in &mut rel.members {
                if let RelationMember::Relation(r) = m {
                    if let Some(new_id) = remap[r.0] {
                        *r = new_id;
                    }
                }
            }
        }
        self.map.relations = kept;
        before - self.map.relations.len()
    }

    /// Run once every area exists.
    pub fn finalize_adjacency(&mut self) {
        let areas = &self.map.areas;
        for node in &mut self.map.nodes {
            node.calculate_adjacent_area_segments(areas);
        }
    }

    /// Stores the overlap on both participants.
    pub fn add_overlap(&mut self, overlap: Overlap) {
        for id in [overlap.e1, overlap.e2] {
            let list = match id {
                ElementID::Node(n) => &mut self.map.nodes[n.0].overlaps,
                ElementID::WaySegment(s) => &mut self.map.way_segments[s.0].overlaps,
                ElementID::Area(a) => &mut self.map.areas[a.0].overlaps,
            };
            list.push(overlap.clone());
        }
    }

    pub fn finish(mut self) -> MapData {
        for a in &self.map.areas {
            self.map.data_bounds.union(&a.get_bounds());
        }
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OverlapKind;
    use geom::RingSegment;

    fn square(b: &mut MapBuilder, x: f64, z: f64, size: f64) -> Vec<NodeID> {
        vec![
            b.add_node(None, Pt2D::new(x, z), Tags::empty()),
            b.add_node(None, Pt2D::new(x, z + size), Tags::empty()),
            b.add_node(None, Pt2D::new(x + size, z + size), Tags::empty()),
            b.add_node(None, Pt2D::new(x + size, z), Tags::empty()),
        ]
    }

    #[test]
    fn areas_are_normalized() {
        let mut b = MapBuilder::new(Bounds::from_corners(0.0, 0.0, 100.0, 100.0));
        // Given clockwise, without the closing node
        let outer = square(&mut b, 0.0, 0.0, 10.0);
        let mut hole = square(&mut b, 2.0, 2.0, 2.0);
        hole.reverse();
        let id = b
            .add_area(AreaBasis::EmptyTerrain, Tags::empty(), outer.clone(), vec![hole])
            .unwrap();
        let map = b.finish();
        let area = map.get_a(id);
        assert_eq!(area.outer.len(), 5);
        assert_eq!(area.outer[0], area.outer[4]);
        assert!(!area.polygon.outer().is_clockwise());
        assert!(area.polygon.holes()[0].is_clockwise());
        // Polygon rings follow the node lists
        for (nodes, ring) in area.rings().zip(area.polygon.rings()) {
            let pts: Vec<Pt2D> = nodes.iter().map(|n| map.get_n(*n).pt).collect();
            assert_eq!(&pts, ring.points());
        }
        assert!(map.get_n(outer[0]).adjacent_areas.contains(&id));
    }

    #[test]
    fn bad_areas_are_rejected() {
        let mut b = MapBuilder::new(Bounds::new());
        let outer = square(&mut b, 0.0, 0.0, 10.0);
        let hole = square(&mut b, 8.0, 8.0, 5.0);
        assert!(b
            .add_area(AreaBasis::EmptyTerrain, Tags::empty(), outer.clone(), vec![hole])
            .is_err());
        assert!(b
            .add_area(AreaBasis::EmptyTerrain, Tags::empty(), outer[0..2].to_vec(), Vec::new())
            .is_err());
        assert!(b.map().all_areas().is_empty());
        assert!(b.map().get_n(outer[0]).adjacent_areas.is_empty());
    }

    #[test]
    fn ways_and_adjacency() {
        let mut b = MapBuilder::new(Bounds::new());
        let sq = square(&mut b, 0.0, 0.0, 10.0);
        let a = b
            .add_area(AreaBasis::EmptyTerrain, Tags::empty(), sq.clone(), Vec::new())
            .unwrap();
        let w = b
            .add_way(osm::WayID(5), Tags::empty(), vec![sq[0], sq[0], sq[2]])
            .unwrap();
        assert!(b.add_way(osm::WayID(6), Tags::empty(), vec![sq[1]]).is_err());
        b.finalize_adjacency();
        b.add_overlap(Overlap {
            e1: ElementID::Area(a),
            e2: ElementID::WaySegment(WaySegmentID(0)),
            kind: OverlapKind::Contains,
        });
        let map = b.finish();

        assert_eq!(map.get_w(w).segments.len(), 1);
        let seg = map.get_ws(map.get_w(w).segments[0]);
        assert!(seg.same_endpoints(sq[2], sq[0]));
        assert!(map.get_n(sq[0]).connected_segments.contains(&seg.id));

        // The first node of a closed ring touches the first and last edge
        let mut touching: Vec<RingSegment> = map
            .get_n(sq[0])
            .adjacent_area_segments
            .iter()
            .map(|(_, s)| *s)
            .collect();
        touching.sort();
        assert_eq!(
            touching,
            vec![
                RingSegment {
                    ring: 0,
                    segment: 0
                },
                RingSegment {
                    ring: 0,
                    segment: 3
                }
            ]
        );

        assert_eq!(map.overlaps_of(ElementID::Area(a)).len(), 1);
        assert_eq!(map.overlaps_of(ElementID::WaySegment(seg.id)).len(), 1);
        assert_eq!(map.count_overlaps()["contains"], 1);
        assert_eq!(
            map.elements_in(&Bounds::from_corners(9.0, 9.0, 20.0, 20.0)),
            vec![ElementID::Node(sq[2]), ElementID::WaySegment(seg.id), ElementID::Area(a)]
        );
    }

    #[test]
    fn empty_relations_are_dropped() {
        let mut b = MapBuilder::new(Bounds::new());
        let n = b.add_node(None, Pt2D::new(1.0, 1.0), Tags::empty());
        let r1 = b.add_relation(osm::RelationID(1), Tags::empty());
        let r2 = b.add_relation(osm::RelationID(2), Tags::empty());
        let r3 = b.add_relation(osm::RelationID(3), Tags::empty());
        b.set_relation_members(r2, vec![("".to_string(), RelationMember::Node(n))]);
        b.set_relation_members(
            r3,
            vec![
                ("".to_string(), RelationMember::Relation(r1)),
                ("".to_string(), RelationMember::Relation(r2)),
            ],
        );
        assert_eq!(b.remove_empty_relations(), 1);
        let map = b.finish();
        assert_eq!(map.all_relations().len(), 2);
        assert_eq!(map.get_r(RelationID(0)).osm_id, osm::RelationID(2));
        assert_eq!(
            map.get_r(RelationID(1)).members,
            vec![("".to_string(), RelationMember::Relation(RelationID(0)))]
        );
    }
}
