//! Finds every geometric relationship between pairs of elements. Candidate pairs come from a grid
//! index; classifying them is independent work, so it runs on a thread pool against the read-only
//! map, and the results are merged in afterwards.

use abstutil::Timer;
use geom::{Pt2D, SpatialGrid};
use map_model::{
    Area, Crossing, Element, ElementID, MapBuilder, MapData, Node, Overlap, OverlapKind,
    WaySegment,
};

use crate::{Options, OverlapNodes};

// Crossings this close to a node shared by two areas are just the areas touching there
const SHARED_NODE_TOLERANCE: f64 = 0.01;
// Relative to the length of a segment, crossings this close to a node it shares with an area
// don't count
const SHARED_ENDPOINT_FRACTION: f64 = 0.01;
const PAIRS_PER_TASK: usize = 1000;

/// Records every overlap on both participants.
pub fn find_overlaps(builder: &mut MapBuilder, opts: &Options, timer: &mut Timer) {
    timer.start("find candidate pairs");
    let pairs = candidate_pairs(builder.map(), opts);
    timer.stop("find candidate pairs");
    timer.note(format!("{} candidate pairs", abstutil::prettyprint_usize(pairs.len())));

    let map = builder.map();
    let overlaps: Vec<Overlap> = if opts.parallel_overlaps {
        let batches: Vec<Vec<(ElementID, ElementID)>> =
            pairs.chunks(PAIRS_PER_TASK).map(|c| c.to_vec()).collect();
        timer
            .parallelize("classify overlaps", batches, |batch| {
                batch
                    .into_iter()
                    .filter_map(|(e1, e2)| classify(map, e1, e2))
                    .collect::<Vec<_>>()
            })
            .into_iter()
            .flatten()
            .collect()
    } else {
        timer.start_iter("classify overlaps", pairs.len());
        pairs
            .into_iter()
            .filter_map(|(e1, e2)| {
                timer.next();
                classify(map, e1, e2)
            })
            .collect()
    };

    timer.note(format!("{} overlaps", abstutil::prettyprint_usize(overlaps.len())));
    for overlap in overlaps {
        builder.add_overlap(overlap);
    }
}

/// Every pair of elements whose bounding boxes might touch and whose types can overlap at all.
/// The earlier element comes first, and the order only depends on the map.
pub fn candidate_pairs(map: &MapData, opts: &Options) -> Vec<(ElementID, ElementID)> {
    let bounds = map.get_data_bounds().padded(opts.index_margin);
    if bounds.is_empty() {
        return Vec::new();
    }
    let mut grid = SpatialGrid::new(&bounds, opts.index_cell_size);

    let mut pairs = Vec::new();
    for element in map.all_elements() {
        if let Element::Node(n) = element {
            let included = match opts.overlap_nodes {
                OverlapNodes::None => false,
                OverlapNodes::Tagged => !n.tags.is_empty(),
                OverlapNodes::All => true,
            };
            if !included {
                continue;
            }
        }
        let id = element.id();
        let element_bounds = element.get_bounds();
        for other in grid.insert_and_probe(id, &element_bounds) {
            if can_overlap(other, id) && map.get(other).get_bounds().intersects(&element_bounds) {
                pairs.push((other, id));
            }
        }
    }
    pairs
}

fn can_overlap(e1: ElementID, e2: ElementID) -> bool {
    !matches!(
        (e1, e2),
        (ElementID::Node(_), ElementID::Node(_))
            | (ElementID::Node(_), ElementID::WaySegment(_))
            | (ElementID::WaySegment(_), ElementID::Node(_))
    )
}

/// How two elements relate, if at all. Swapping the arguments describes the same overlap.
pub fn classify(map: &MapData, id1: ElementID, id2: ElementID) -> Option<Overlap> {
    match (map.get(id1), map.get(id2)) {
        (Element::Node(_), Element::Node(_))
        | (Element::Node(_), Element::WaySegment(_))
        | (Element::WaySegment(_), Element::Node(_)) => None,
        (Element::Node(n), Element::Area(a)) | (Element::Area(a), Element::Node(n)) => {
            node_area(n, a)
        }
        (Element::WaySegment(s1), Element::WaySegment(s2)) => segment_segment(s1, s2),
        (Element::WaySegment(s), Element::Area(a)) | (Element::Area(a), Element::WaySegment(s)) => {
            segment_area(map, s, a)
        }
        (Element::Area(a1), Element::Area(a2)) => area_area(map, a1, a2),
    }
}

fn node_area(n: &Node, a: &Area) -> Option<Overlap> {
    if a.polygon.contains_pt(n.pt) {
        Some(Overlap {
            e1: ElementID::Area(a.id),
            e2: ElementID::Node(n.id),
            kind: OverlapKind::Contains,
        })
    } else {
        None
    }
}

fn segment_segment(s1: &WaySegment, s2: &WaySegment) -> Option<Overlap> {
    // Connected segments only ever touch
    if s1.has_node(s2.start) || s1.has_node(s2.end) {
        return None;
    }
    let pt = s1.line.true_intersection(&s2.line)?;
    Some(Overlap {
        e1: ElementID::WaySegment(s1.id),
        e2: ElementID::WaySegment(s2.id),
        kind: OverlapKind::Intersects(vec![Crossing {
            pt,
            segment1: None,
            segment2: None,
        }]),
    })
}

fn segment_area(map: &MapData, s: &WaySegment, a: &Area) -> Option<Overlap> {
    let seg_id = ElementID::WaySegment(s.id);
    let area_id = ElementID::Area(a.id);

    if a.has_edge(s.start, s.end) || same_edge_position(s, a) {
        return Some(Overlap {
            e1: seg_id,
            e2: area_id,
            kind: OverlapKind::SharesSegment(vec![(s.start, s.end)]),
        });
    }

    let shared: Vec<Pt2D> = [s.start, s.end]
        .into_iter()
        .filter(|n| map.get_n(*n).is_adjacent_to(a.id))
        .map(|n| map.get_n(n).pt)
        .collect();
    let tolerance = SHARED_ENDPOINT_FRACTION * s.line.length();
    let mut crossings: Vec<Crossing> = Vec::new();
    for (pt, ring_segment) in a.polygon.intersection_positions(&s.line) {
        if shared.iter().any(|n| n.dist_to(pt) <= tolerance) {
            continue;
        }
        // Passing exactly through a ring vertex hits two edges
        if crossings.iter().any(|c| c.pt == pt) {
            continue;
        }
        crossings.push(Crossing {
            pt,
            segment1: None,
            segment2: Some(ring_segment),
        });
    }

    if !crossings.is_empty() {
        Some(Overlap {
            e1: seg_id,
            e2: area_id,
            kind: OverlapKind::Intersects(crossings),
        })
    } else if a.polygon.contains_pt(s.line.middle()) {
        Some(Overlap {
            e1: area_id,
            e2: seg_id,
            kind: OverlapKind::Contains,
        })
    } else {
        None
    }
}

// Different nodes at the same spots as one of the area's edges
fn same_edge_position(s: &WaySegment, a: &Area) -> bool {
    let (pt1, pt2) = (s.line.pt1(), s.line.pt2());
    a.polygon.rings().any(|ring| {
        ring.lines().any(|l| {
            (l.pt1() == pt1 && l.pt2() == pt2) || (l.pt1() == pt2 && l.pt2() == pt1)
        })
    })
}

fn area_area(map: &MapData, a1: &Area, a2: &Area) -> Option<Overlap> {
    let id1 = ElementID::Area(a1.id);
    let id2 = ElementID::Area(a2.id);

    let shared = a1.shared_edges(a2);
    if !shared.is_empty() {
        return Some(Overlap {
            e1: id1,
            e2: id2,
            kind: OverlapKind::SharesSegment(shared),
        });
    }

    let common: Vec<Pt2D> = a1
        .all_nodes()
        .into_iter()
        .filter(|n| map.get_n(*n).is_adjacent_to(a2.id))
        .map(|n| map.get_n(n).pt)
        .collect();
    let crossings: Vec<Crossing> = a1
        .polygon
        .outline_intersections(&a2.polygon)
        .into_iter()
        .filter(|(pt, _, _)| !common.iter().any(|n| n.dist_to(*pt) <= SHARED_NODE_TOLERANCE))
        .map(|(pt, r1, r2)| Crossing {
            pt,
            segment1: Some(r1),
            segment2: Some(r2),
        })
        .collect();

    // A corner of one area lying partway along the other's edge meets the outline without
    // entering it, so containment and touching come before crossings.
    if a1.polygon.contains_ring(a2.polygon.outer()) {
        return Some(Overlap {
            e1: id1,
            e2: id2,
            kind: OverlapKind::Contains,
        });
    }
    if a2.polygon.contains_ring(a1.polygon.outer()) {
        return Some(Overlap {
            e1: id2,
            e2: id1,
            kind: OverlapKind::Contains,
        });
    }
    if crossings.is_empty() || !a1.polygon.intersects(&a2.polygon) {
        return None;
    }
    Some(Overlap {
        e1: id1,
        e2: id2,
        kind: OverlapKind::Intersects(crossings),
    })
}
