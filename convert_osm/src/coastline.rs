//! Sea areas from coastlines. Coastline ways run with land on their right. They're chained
//! together, clipped to the tile, and closed into land rings by walking clockwise along the tile
//! boundary from every place a coastline leaves the tile to the next place one enters. The sea is
//! whatever part of the tile isn't land.

use abstutil::Tags;
use geom::{Bounds, Polygon, Pt2D, Ring, EPSILON_DIST};
use map_model::{osm, AreaBasis, AreaID, MapBuilder, NodeID};
use raw_map::RawMap;

use crate::lookup::{NodeLookup, PositionLookup};
use crate::rings::assemble_rings;
use crate::{ConversionIssue, TagClassifier};

/// Coastline ways glued together end to start.
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    pub ways: Vec<osm::WayID>,
    pub nodes: Vec<NodeID>,
}

#[derive(Debug, Default)]
pub struct LandRings {
    /// Closed clockwise rings with land inside
    pub rings: Vec<(Vec<NodeID>, Ring)>,
    /// Stretches of the tile boundary added to close the rings, each running clockwise from
    /// where a coastline leaves the tile to where the next one enters
    pub arcs: Vec<Vec<NodeID>>,
    pub crosses_boundary: bool,
    /// Pieces that were skipped
    pub issues: Vec<ConversionIssue>,
}

/// Adds sea areas covering the parts of the tile that coastlines say aren't land.
pub fn build_sea(
    builder: &mut MapBuilder,
    lookup: &NodeLookup,
    positions: &mut PositionLookup,
    classifier: &dyn TagClassifier,
    tile: &Bounds,
    at_sea: bool,
) -> (Vec<AreaID>, Vec<ConversionIssue>) {
    let mut issues = Vec::new();
    let mut ways = Vec::new();
    for (id, way) in &lookup.raw.ways {
        if !classifier.is_coastline(&way.tags) {
            continue;
        }
        match lookup.way_nodes(osm::OsmID::Way(*id), *id) {
            Ok(nodes) => ways.push((*id, nodes)),
            Err(issue) => issues.push(issue),
        }
    }

    let tile_ring = match tile.get_rectangle() {
        Ok(ring) => ring,
        Err(err) => {
            debug!("No sea, because the tile is degenerate: {}", err);
            return (Vec::new(), issues);
        }
    };

    let land = match close_land(builder, positions, chain_coastlines(ways), tile) {
        Ok(land) => land,
        Err(issue) => {
            issues.push(issue);
            return (Vec::new(), issues);
        }
    };
    issues.extend(land.issues);

    let any_sea = land.crosses_boundary
        || !land.rings.is_empty()
        || at_sea
        || only_sea_tags(lookup.raw, classifier);
    if !any_sea {
        return (Vec::new(), issues);
    }

    let land_polygons: Vec<Polygon> = land
        .rings
        .into_iter()
        .map(|(_, ring)| Polygon::from_ring(ring.to_counter_clockwise()))
        .collect();
    let mut areas = Vec::new();
    for sea in Polygon::from_ring(tile_ring).subtract(&land_polygons) {
        let (outer, holes) = sea.into_rings();
        let outer = positions.get_or_add_all(builder, outer.points());
        let holes = holes
            .iter()
            .map(|h| positions.get_or_add_all(builder, h.points()))
            .collect();
        match builder.add_area(AreaBasis::Coastline, sea_tags(), outer, holes) {
            Ok(id) => areas.push(id),
            Err(err) => warn!("Couldn't build a sea area: {}", err),
        }
    }
    (areas, issues)
}

fn sea_tags() -> Tags {
    Tags::new(vec![(osm::NATURAL, "water"), ("water", "sea")])
}

/// With no coastline crossing the tile, the only hint is what's mapped in it.
fn only_sea_tags(raw: &RawMap, classifier: &dyn TagClassifier) -> bool {
    let mut sea = false;
    for tags in raw
        .nodes
        .values()
        .map(|n| &n.tags)
        .chain(raw.ways.values().map(|w| &w.tags))
        .chain(raw.relations.values().map(|r| &r.tags))
    {
        if classifier.is_land(tags) {
            return false;
        }
        sea |= classifier.is_sea(tags);
    }
    sea
}

/// Glues ways into maximal chains where one ends exactly where the next starts. Direction is
/// never changed.
pub fn chain_coastlines(ways: Vec<(osm::WayID, Vec<NodeID>)>) -> Vec<Chain> {
    let mut remaining: Vec<(osm::WayID, Vec<NodeID>)> = ways
        .into_iter()
        .map(|(id, mut nodes)| {
            nodes.dedup();
            (id, nodes)
        })
        .filter(|(_, nodes)| nodes.len() >= 2)
        .collect();
    remaining.reverse();

    let mut chains = Vec::new();
    while let Some((id, mut nodes)) = remaining.pop() {
        let mut ways = vec![id];
        while !is_closed(&nodes) {
            let first = nodes[0];
            let last = nodes[nodes.len() - 1];
            if let Some(idx) = remaining.iter().rposition(|(_, next)| next[0] == last) {
                let (next_id, next) = remaining.remove(idx);
                nodes.pop();
                nodes.extend(next);
                ways.push(next_id);
            } else if let Some(idx) = remaining
                .iter()
                .rposition(|(_, prev)| prev[prev.len() - 1] == first)
            {
                let (prev_id, mut prev) = remaining.remove(idx);
                prev.pop();
                prev.extend(nodes);
                nodes = prev;
                ways.insert(0, prev_id);
            } else {
                break;
            }
        }
        chains.push(Chain { ways, nodes });
    }
    chains
}

/// Clips chains to the tile and closes them into land rings. Only fails if the pieces crossing
/// the tile boundary can't be connected up at all.
pub fn close_land(
    builder: &mut MapBuilder,
    positions: &mut PositionLookup,
    chains: Vec<Chain>,
    tile: &Bounds,
) -> Result<LandRings, ConversionIssue> {
    let mut result = LandRings::default();
    let fallback_way = match chains.first() {
        Some(chain) => chain.ways[0],
        None => return Ok(result),
    };

    let mut pieces: Vec<(osm::WayID, Vec<NodeID>)> = Vec::new();
    for chain in chains {
        let element = osm::OsmID::Way(chain.ways[0]);
        let pts: Vec<Pt2D> = chain
            .nodes
            .iter()
            .map(|n| builder.map().get_n(*n).pt)
            .collect();
        let closed = is_closed(&chain.nodes);

        if closed && pts.iter().all(|pt| tile.contains(*pt)) {
            match Ring::new(pts) {
                Ok(ring) => {
                    if ring.is_clockwise() {
                        result.rings.push((chain.nodes, ring));
                    } else {
                        result.issues.push(ConversionIssue::invalid(
                            element,
                            "closed coastline runs counter-clockwise, putting land outside",
                        ));
                    }
                }
                Err(err) => result.issues.push(ConversionIssue::invalid(element, err)),
            }
            continue;
        }

        let mut chain_pieces = clip_to_tile(builder, positions, &chain.nodes, &pts, tile);
        // A closed chain starting inside the tile gets cut at its start. Rejoin there.
        if closed
            && chain_pieces.len() >= 2
            && !on_boundary(tile, builder.map().get_n(chain_pieces[0][0]).pt)
        {
            let first = chain_pieces.remove(0);
            if let Some(last) = chain_pieces.last_mut() {
                last.pop();
                last.extend(first);
            }
        }
        for piece in chain_pieces {
            let start = builder.map().get_n(piece[0]).pt;
            let end = builder.map().get_n(piece[piece.len() - 1]).pt;
            if !on_boundary(tile, start) || !on_boundary(tile, end) {
                result.issues.push(ConversionIssue::invalid(
                    element,
                    "coastline stops inside the tile",
                ));
                continue;
            }
            pieces.push((chain.ways[0], piece));
        }
    }
    result.crosses_boundary = !pieces.is_empty();

    let perimeter = 2.0 * (tile.width() + tile.height());
    let clockwise_dist = |from: f64, to: f64| (to - from).rem_euclid(perimeter);
    let entries: Vec<(f64, NodeID)> = pieces
        .iter()
        .map(|(_, piece)| {
            (
                position_along(tile, builder.map().get_n(piece[0]).pt),
                piece[0],
            )
        })
        .collect();
    let corners: Vec<(f64, Pt2D)> = tile
        .corners_clockwise()
        .into_iter()
        .zip([
            0.0,
            tile.width(),
            tile.width() + tile.height(),
            2.0 * tile.width() + tile.height(),
        ])
        .map(|(pt, pos)| (pos, pt))
        .collect();

    for (_, piece) in &pieces {
        let exit = piece[piece.len() - 1];
        let from = position_along(tile, builder.map().get_n(exit).pt);
        let (to, entry) = match entries
            .iter()
            .min_by(|a, b| clockwise_dist(from, a.0).total_cmp(&clockwise_dist(from, b.0)))
        {
            Some(next) => *next,
            None => continue,
        };
        if entry == exit {
            continue;
        }
        let span = clockwise_dist(from, to);
        let mut passed: Vec<(f64, Pt2D)> = corners
            .iter()
            .map(|(pos, pt)| (clockwise_dist(from, *pos), *pt))
            .filter(|(dist, _)| *dist > 0.0 && *dist < span)
            .collect();
        passed.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut arc = vec![exit];
        for (_, pt) in passed {
            arc.push(positions.get_or_add(builder, pt));
        }
        arc.push(entry);
        result.arcs.push(arc);
    }

    let mut sequences: Vec<(Option<osm::WayID>, Vec<NodeID>)> = pieces
        .into_iter()
        .map(|(way, piece)| (Some(way), piece))
        .collect();
    sequences.extend(result.arcs.iter().map(|arc| (None, arc.clone())));
    let assembled = assemble_rings(sequences, true).map_err(|stuck| {
        let way = stuck.into_iter().flatten().next().unwrap_or(fallback_way);
        ConversionIssue::invalid(
            osm::OsmID::Way(way),
            "coastline pieces don't close up along the tile boundary",
        )
    })?;

    for ring in assembled {
        let way = ring.sources.iter().flatten().next().cloned();
        let element = osm::OsmID::Way(way.unwrap_or(fallback_way));
        let pts = ring
            .nodes
            .iter()
            .map(|n| builder.map().get_n(*n).pt)
            .collect();
        match Ring::new(pts) {
            Ok(polygon) => result.rings.push((ring.nodes, polygon)),
            Err(err) => result.issues.push(ConversionIssue::invalid(element, err)),
        }
    }
    Ok(result)
}

/// Splits a chain into the pieces inside the tile. Where a segment crosses the boundary, a node is
/// placed at the crossing.
fn clip_to_tile(
    builder: &mut MapBuilder,
    positions: &mut PositionLookup,
    nodes: &[NodeID],
    pts: &[Pt2D],
    tile: &Bounds,
) -> Vec<Vec<NodeID>> {
    let mut pieces = Vec::new();
    let mut current: Vec<NodeID> = Vec::new();
    for i in 0..nodes.len() - 1 {
        let (t0, t1) = match clip_segment(pts[i], pts[i + 1], tile) {
            Some(range) => range,
            None => {
                flush(&mut current, &mut pieces);
                continue;
            }
        };
        let mut crossing = |t: f64, existing: NodeID| {
            if t == 0.0 || t == 1.0 {
                existing
            } else {
                let pt = pts[i].lerp(pts[i + 1], t);
                let pt = Pt2D::new(
                    pt.x().clamp(tile.min_x, tile.max_x),
                    pt.z().clamp(tile.min_z, tile.max_z),
                );
                positions.get_or_add(builder, pt)
            }
        };
        let entry = crossing(t0, nodes[i]);
        let exit = crossing(t1, nodes[i + 1]);

        if current.last() != Some(&entry) {
            flush(&mut current, &mut pieces);
            current.push(entry);
        }
        if exit != entry {
            current.push(exit);
        }
        if t1 < 1.0 {
            flush(&mut current, &mut pieces);
        }
    }
    flush(&mut current, &mut pieces);
    pieces
}

fn flush(current: &mut Vec<NodeID>, pieces: &mut Vec<Vec<NodeID>>) {
    let piece = std::mem::take(current);
    if piece.len() >= 2 {
        pieces.push(piece);
    }
}

/// The part of the segment inside the tile, as a range of fractions along it.
fn clip_segment(a: Pt2D, b: Pt2D, tile: &Bounds) -> Option<(f64, f64)> {
    let dx = b.x() - a.x();
    let dz = b.z() - a.z();
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for (p, q) in [
        (-dx, a.x() - tile.min_x),
        (dx, tile.max_x - a.x()),
        (-dz, a.z() - tile.min_z),
        (dz, tile.max_z - a.z()),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
    }
    if t0 < t1 {
        Some((t0, t1))
    } else {
        None
    }
}

fn on_boundary(tile: &Bounds, pt: Pt2D) -> bool {
    (pt.x() - tile.min_x).abs() < EPSILON_DIST
        || (pt.x() - tile.max_x).abs() < EPSILON_DIST
        || (pt.z() - tile.min_z).abs() < EPSILON_DIST
        || (pt.z() - tile.max_z).abs() < EPSILON_DIST
}

/// How far along the tile boundary a point is, walking clockwise from the north-west corner.
fn position_along(tile: &Bounds, pt: Pt2D) -> f64 {
    let w = tile.width();
    let h = tile.height();
    // (distance to the side, position if on that side)
    let sides = [
        ((pt.z() - tile.max_z).abs(), pt.x() - tile.min_x),
        ((pt.x() - tile.max_x).abs(), w + tile.max_z - pt.z()),
        ((pt.z() - tile.min_z).abs(), w + h + tile.max_x - pt.x()),
        ((pt.x() - tile.min_x).abs(), 2.0 * w + h + pt.z() - tile.min_z),
    ];
    sides
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, pos)| pos)
        .unwrap_or(0.0)
}

fn is_closed(nodes: &[NodeID]) -> bool {
    nodes.len() >= 3 && nodes[0] == nodes[nodes.len() - 1]
}

#[cfg(test)]
mod tests {
    use map_model::MapBuilder;

    use super::*;

    fn tile() -> Bounds {
        Bounds::from_corners(0.0, 0.0, 100.0, 100.0)
    }

    fn setup(pts: Vec<(f64, f64)>) -> (MapBuilder, PositionLookup, Vec<NodeID>) {
        let mut b = MapBuilder::new(tile());
        let nodes = pts
            .into_iter()
            .map(|(x, z)| b.add_node(None, Pt2D::new(x, z), Tags::empty()))
            .collect();
        let positions = PositionLookup::new(b.map());
        (b, positions, nodes)
    }

    #[test]
    fn one_crossing_closes_with_one_arc() {
        // Heading east through the middle of the tile, so land is to the south
        let (mut b, mut positions, nodes) =
            setup(vec![(-10.0, 50.0), (50.0, 50.0), (110.0, 50.0)]);
        let chains = vec![Chain {
            ways: vec![osm::WayID(1)],
            nodes,
        }];
        let land = close_land(&mut b, &mut positions, chains, &tile()).unwrap();
        assert!(land.issues.is_empty());
        assert!(land.crosses_boundary);
        assert_eq!(land.arcs.len(), 1);
        // Exit on the east side, around the two southern corners, then back in on the west side
        let arc_pts: Vec<Pt2D> = land.arcs[0].iter().map(|n| b.map().get_n(*n).pt).collect();
        assert_eq!(
            arc_pts,
            vec![
                Pt2D::new(100.0, 50.0),
                Pt2D::new(100.0, 0.0),
                Pt2D::new(0.0, 0.0),
                Pt2D::new(0.0, 50.0)
            ]
        );

        assert_eq!(land.rings.len(), 1);
        let (ring_nodes, ring) = &land.rings[0];
        assert_eq!(ring_nodes[0], ring_nodes[ring_nodes.len() - 1]);
        assert!(ring.is_clockwise());
        assert_eq!(ring.area(), 5000.0);
        assert!(ring.contains_pt(Pt2D::new(50.0, 25.0)));
        assert!(!ring.contains_pt(Pt2D::new(50.0, 75.0)));
        // Both crossings are new nodes, and so are the two corners
        assert_eq!(b.map().all_nodes().len(), 3 + 4);
    }

    #[test]
    fn chains_and_islands() {
        let (mut b, mut positions, n) = setup(vec![
            (10.0, 10.0),
            (10.0, 20.0),
            (20.0, 20.0),
            (20.0, 10.0),
            (60.0, 60.0),
            (70.0, 60.0),
            (70.0, 70.0),
        ]);
        let chains = chain_coastlines(vec![
            (osm::WayID(1), vec![n[0], n[1], n[2]]),
            (osm::WayID(2), vec![n[3], n[0]]),
            (osm::WayID(3), vec![n[2], n[3]]),
            // Counter-clockwise, so the land would be outside
            (osm::WayID(4), vec![n[4], n[5], n[6], n[4]]),
        ]);
        assert_eq!(chains.len(), 2);
        assert_eq!(
            chains[0],
            Chain {
                ways: vec![osm::WayID(1), osm::WayID(3), osm::WayID(2)],
                nodes: vec![n[0], n[1], n[2], n[3], n[0]],
            }
        );

        let land = close_land(&mut b, &mut positions, chains, &tile()).unwrap();
        assert!(!land.crosses_boundary);
        assert_eq!(land.rings.len(), 1);
        assert_eq!(land.issues.len(), 1);
        assert_eq!(land.issues[0].element(), osm::OsmID::Way(osm::WayID(4)));
    }

    #[test]
    fn dangling_ends() {
        let (mut b, mut positions, nodes) = setup(vec![(-10.0, 50.0), (50.0, 50.0)]);
        let chains = vec![Chain {
            ways: vec![osm::WayID(1)],
            nodes,
        }];
        let land = close_land(&mut b, &mut positions, chains, &tile()).unwrap();
        assert!(land.rings.is_empty());
        assert_eq!(land.issues.len(), 1);
    }

    #[test]
    fn boundary_positions() {
        let t = tile();
        assert_eq!(position_along(&t, Pt2D::new(0.0, 100.0)), 0.0);
        assert_eq!(position_along(&t, Pt2D::new(30.0, 100.0)), 30.0);
        assert_eq!(position_along(&t, Pt2D::new(100.0, 40.0)), 160.0);
        assert_eq!(position_along(&t, Pt2D::new(40.0, 0.0)), 260.0);
        assert_eq!(position_along(&t, Pt2D::new(0.0, 10.0)), 310.0);
        assert_eq!(
            clip_segment(Pt2D::new(-10.0, 50.0), Pt2D::new(10.0, 50.0), &t),
            Some((0.5, 1.0))
        );
        assert_eq!(
            clip_segment(Pt2D::new(-10.0, 50.0), Pt2D::new(-5.0, 50.0), &t),
            None
        );
    }
}
