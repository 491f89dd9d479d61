use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use abstutil::{Tags, Timer};
use convert_osm::{DefaultClassifier, Options};
use geom::{Bounds, Pt2D};
use map_model::{osm, Element, ElementID, MapData, OverlapKind};
use raw_map::RawMap;

// A jumble of buildings, parks, footpaths, and a coastline, all overlapping each other in every
// possible way.
fn random_input(seed: u64) -> RawMap {
    let mut rng = XorShiftRng::seed_from_u64(seed);
    let mut raw = RawMap::blank();
    raw.boundary = Some(Bounds::from_corners(0.0, 0.0, 300.0, 200.0));
    let mut next_id = 1;
    let mut node = |raw: &mut RawMap, pt: Pt2D, tags: Tags| {
        next_id += 1;
        raw.add_node(next_id, pt, tags)
    };

    let mut way_id = 1;
    for i in 0..40 {
        let corner = random_pt(&mut rng);
        let w = rng.gen_range(2..40) as f64;
        let h = rng.gen_range(2..40) as f64;
        let mut nodes: Vec<osm::NodeID> = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)]
            .into_iter()
            .map(|(dx, dz)| node(&mut raw, corner.offset(dx, dz), Tags::empty()))
            .collect();
        nodes.push(nodes[0]);
        let tags = if i % 3 == 0 {
            Tags::new(vec![("leisure", "park")])
        } else {
            Tags::new(vec![("building", "yes")])
        };
        raw.add_way(way_id, nodes, tags);
        way_id += 1;
    }
    for _ in 0..30 {
        let num_pts = rng.gen_range(2..5);
        let nodes = (0..num_pts)
            .map(|_| {
                let pt = random_pt(&mut rng);
                node(&mut raw, pt, Tags::empty())
            })
            .collect();
        raw.add_way(way_id, nodes, Tags::new(vec![("highway", "footway")]));
        way_id += 1;
    }
    for _ in 0..20 {
        let pt = random_pt(&mut rng);
        node(&mut raw, pt, Tags::new(vec![("natural", "tree")]));
    }
    let coast = vec![
        node(&mut raw, Pt2D::new(-10.0, 150.0), Tags::empty()),
        node(&mut raw, Pt2D::new(150.0, 170.0), Tags::empty()),
        node(&mut raw, Pt2D::new(310.0, 150.0), Tags::empty()),
    ];
    raw.add_way(way_id, coast, Tags::new(vec![("natural", "coastline")]));
    raw
}

// Somewhere in the tile, to the nearest decimeter
fn random_pt(rng: &mut XorShiftRng) -> Pt2D {
    Pt2D::new(
        rng.gen_range(0..3000) as f64 / 10.0,
        rng.gen_range(0..2000) as f64 / 10.0,
    )
}

fn convert(raw: &RawMap, parallel: bool) -> MapData {
    abstutil::logger::setup();
    let opts = Options {
        parallel_overlaps: parallel,
        index_cell_size: 50.0,
        ..Default::default()
    };
    convert_osm::convert(raw, &opts, &DefaultClassifier, &mut Timer::throwaway()).0
}

#[test]
fn convert_twice() {
    let raw = random_input(42);
    let map1 = convert(&raw, true);
    let map2 = convert(&raw, true);
    let sequential = convert(&raw, false);

    let json = map1.to_json();
    assert!(json == map2.to_json(), "converting twice gave different maps");
    assert!(
        json == sequential.to_json(),
        "parallel and sequential overlap detection disagree"
    );
}

#[test]
fn invariants_hold() {
    for seed in [1, 2, 3] {
        let map = convert(&random_input(seed), true);
        check_rings(&map);
        check_overlaps(&map);
        check_segment_crossings(&map);
    }
}

fn check_rings(map: &MapData) {
    for area in map.all_areas() {
        for (idx, ring) in area.rings().enumerate() {
            assert!(ring.len() >= 4, "{} has a tiny ring", area.id);
            assert_eq!(ring[0], ring[ring.len() - 1], "{} has an open ring", area.id);
            assert!(
                ring.windows(2).all(|pair| pair[0] != pair[1]),
                "{} repeats a node",
                area.id
            );
            // Node order and polygon order agree
            let pts: Vec<Pt2D> = ring.iter().map(|n| map.get_n(*n).pt).collect();
            assert_eq!(&pts, area.polygon.get_ring(idx).points());
            assert!(ring.iter().all(|n| map.get_n(*n).adjacent_areas.contains(&area.id)));
        }
        assert!(!area.polygon.outer().is_clockwise());
        for hole in area.polygon.holes() {
            assert!(hole.is_clockwise());
            assert!(area.polygon.outer().contains_ring(hole));
        }
        let holes = area.polygon.holes();
        for (idx, h1) in holes.iter().enumerate() {
            for h2 in &holes[idx + 1..] {
                assert!(!h1.overlaps(h2), "{} has overlapping holes", area.id);
            }
        }
    }
}

fn check_overlaps(map: &MapData) {
    for e in map.all_elements() {
        let me = e.id();
        for o in e.overlaps() {
            assert!(o.involves(me));
            assert_ne!(o.e1, o.e2);
            // Nodes are only ever contained in areas
            if let Element::Node(n) = e {
                assert_eq!(o.contained(), Some(ElementID::Node(n.id)));
            }
            if let Some(container) = o.container() {
                assert!(matches!(container, ElementID::Area(_)));
            }
            if let OverlapKind::Intersects(ref crossings) = o.kind {
                assert!(!crossings.is_empty());
            }

            // The other side has exactly the same overlap
            let other = map.get(o.other(me));
            let matching = other.overlaps().iter().filter(|x| *x == o).count();
            assert_eq!(matching, 1, "{} and {} disagree", me, other.id());
        }
    }
}

// Every pair of unconnected way segments that truly cross has to be found, no matter how the index
// split things up.
fn check_segment_crossings(map: &MapData) {
    let segments = map.all_way_segments();
    for (i, s1) in segments.iter().enumerate() {
        for s2 in &segments[i + 1..] {
            if s1.has_node(s2.start) || s1.has_node(s2.end) {
                continue;
            }
            if s1.line.true_intersection(&s2.line).is_none() {
                continue;
            }
            let found = s1.overlaps.iter().any(|o| {
                o.involves(ElementID::WaySegment(s2.id))
                    && matches!(o.kind, OverlapKind::Intersects(_))
            });
            assert!(found, "missed the crossing between {} and {}", s1.id, s2.id);
        }
    }
}
