use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::{HashablePt2D, Line, Polygon, Pt2D, Ring};

/// Intersections this close to an existing endpoint are moved onto it.
const SNAP_DIST: f64 = 1e-5;

/// Splits an arbitrary network of line segments, which may cross or overlap each other, into the
/// bounded faces it encloses. Faces traced counter-clockwise become polygons; faces traced
/// clockwise are the outlines of nested networks, and become holes of the smallest polygon around
/// them. Dangling edges don't enclose anything and are ignored.
pub fn faces_from_segment_graph(segments: &[Line]) -> Vec<Polygon> {
    let graph = Graph::new(segments);

    let mut outers: Vec<Ring> = Vec::new();
    let mut holes: Vec<Ring> = Vec::new();
    for face in graph.trace_faces() {
        let mut pts = face;
        pts.push(pts[0]);
        match Ring::new(pts) {
            Ok(ring) => {
                if ring.is_clockwise() {
                    holes.push(ring);
                } else {
                    outers.push(ring);
                }
            }
            Err(err) => debug!("Skipping a degenerate face: {}", err),
        }
    }

    let mut holes_per_outer: Vec<Vec<Ring>> = vec![Vec::new(); outers.len()];
    for hole in holes {
        // No enclosing face means this is the outline of a whole network, not a hole
        if let Some(idx) = smallest_enclosing(&outers, &hole) {
            holes_per_outer[idx].push(hole.to_counter_clockwise());
        }
    }

    outers
        .into_iter()
        .zip(holes_per_outer)
        .map(|(outer, holes)| match Polygon::new(outer.clone(), holes) {
            Ok(p) => p,
            Err(err) => {
                warn!("Face has bad holes, keeping only the outline: {}", err);
                Polygon::from_ring(outer)
            }
        })
        .collect()
}

fn smallest_enclosing(outers: &[Ring], ring: &Ring) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, outer) in outers.iter().enumerate() {
        if outer.contains_ring(ring) {
            let area = outer.area();
            if best.map(|(_, a)| area < a).unwrap_or(true) {
                best = Some((idx, area));
            }
        }
    }
    best.map(|(idx, _)| idx)
}

struct Graph {
    vertices: Vec<Pt2D>,
    // Sorted counter-clockwise by angle
    outgoing: Vec<Vec<usize>>,
}

impl Graph {
    fn new(segments: &[Line]) -> Graph {
        let mut endpoints: Vec<Pt2D> = Vec::new();
        let mut seen: HashSet<HashablePt2D> = HashSet::new();
        for l in segments {
            for pt in [l.pt1(), l.pt2()] {
                if seen.insert(pt.to_hashable()) {
                    endpoints.push(pt);
                }
            }
        }

        let mut all_pts = endpoints.clone();
        for (idx1, l1) in segments.iter().enumerate() {
            for l2 in segments.iter().skip(idx1 + 1) {
                if let Some(hit) = l1.intersection(l2) {
                    let hit = snap(hit, &endpoints);
                    if seen.insert(hit.to_hashable()) {
                        all_pts.push(hit);
                    }
                }
            }
        }

        // Split every segment at every point lying on it. This also catches collinear overlaps,
        // since the endpoints of one segment lie on the other.
        let mut edges: BTreeSet<(HashablePt2D, HashablePt2D)> = BTreeSet::new();
        for l in segments {
            let bounds = l.get_bounds().padded(SNAP_DIST);
            let mut on_line: Vec<(f64, Pt2D)> = all_pts
                .iter()
                .filter(|pt| bounds.contains(**pt) && l.dist_to_pt(**pt) <= SNAP_DIST)
                .map(|pt| (l.pt1().dist_to(*pt), *pt))
                .collect();
            on_line.sort_by(|a, b| a.0.total_cmp(&b.0));
            for pair in on_line.windows(2) {
                let (a, b) = (pair[0].1.to_hashable(), pair[1].1.to_hashable());
                if a != b {
                    edges.insert(if a < b { (a, b) } else { (b, a) });
                }
            }
        }

        prune_dangling(&mut edges);

        let mut ids: BTreeMap<HashablePt2D, usize> = BTreeMap::new();
        let mut vertices = Vec::new();
        let mut outgoing: Vec<Vec<usize>> = Vec::new();
        let mut id_of = |pt: HashablePt2D, vertices: &mut Vec<Pt2D>, outgoing: &mut Vec<Vec<usize>>| {
            *ids.entry(pt).or_insert_with(|| {
                vertices.push(pt.to_pt2d());
                outgoing.push(Vec::new());
                vertices.len() - 1
            })
        };
        for (a, b) in &edges {
            let v1 = id_of(*a, &mut vertices, &mut outgoing);
            let v2 = id_of(*b, &mut vertices, &mut outgoing);
            outgoing[v1].push(v2);
            outgoing[v2].push(v1);
        }
        for (v, list) in outgoing.iter_mut().enumerate() {
            let from = vertices[v];
            list.sort_by(|a, b| {
                from.angle_to(vertices[*a])
                    .total_cmp(&from.angle_to(vertices[*b]))
            });
        }

        Graph { vertices, outgoing }
    }

    /// Walks every directed edge once. At each vertex, continue along the next edge clockwise
    /// from the one leading back. Bounded faces come out counter-clockwise; the outline of each
    /// connected network comes out clockwise.
    fn trace_faces(&self) -> Vec<Vec<Pt2D>> {
        let mut visited: HashSet<(usize, usize)> = HashSet::new();
        let mut faces = Vec::new();
        for start in 0..self.vertices.len() {
            for next in &self.outgoing[start] {
                if visited.contains(&(start, *next)) {
                    continue;
                }
                let mut face = Vec::new();
                let (mut from, mut to) = (start, *next);
                while visited.insert((from, to)) {
                    face.push(self.vertices[from]);
                    let list = &self.outgoing[to];
                    let back = match list.iter().position(|v| *v == from) {
                        Some(idx) => idx,
                        None => break,
                    };
                    let turn = list[(back + list.len() - 1) % list.len()];
                    from = to;
                    to = turn;
                }
                if face.len() >= 3 {
                    faces.push(face);
                }
            }
        }
        faces
    }
}

fn snap(pt: Pt2D, endpoints: &[Pt2D]) -> Pt2D {
    endpoints
        .iter()
        .find(|e| e.approx_eq(pt, SNAP_DIST))
        .cloned()
        .unwrap_or(pt)
}

fn prune_dangling(edges: &mut BTreeSet<(HashablePt2D, HashablePt2D)>) {
    loop {
        let mut degree: BTreeMap<HashablePt2D, usize> = BTreeMap::new();
        for (a, b) in edges.iter() {
            *degree.entry(*a).or_insert(0) += 1;
            *degree.entry(*b).or_insert(0) += 1;
        }
        let before = edges.len();
        edges.retain(|(a, b)| degree[a] > 1 && degree[b] > 1);
        if edges.len() == before {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l(x1: f64, z1: f64, x2: f64, z2: f64) -> Line {
        Line::must_new(Pt2D::new(x1, z1), Pt2D::new(x2, z2))
    }

    fn square_lines(x: f64, z: f64, size: f64) -> Vec<Line> {
        vec![
            l(x, z, x + size, z),
            l(x + size, z, x + size, z + size),
            l(x + size, z + size, x, z + size),
            l(x, z + size, x, z),
        ]
    }

    #[test]
    fn single_square() {
        let faces = faces_from_segment_graph(&square_lines(0.0, 0.0, 10.0));
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].area(), 100.0);
        assert!(!faces[0].outer().is_clockwise());
    }

    #[test]
    fn crossing_lines_split_faces() {
        let mut lines = square_lines(0.0, 0.0, 10.0);
        // A cross through the middle, sticking out on both sides
        lines.push(l(-5.0, 5.0, 15.0, 5.0));
        lines.push(l(5.0, -5.0, 5.0, 15.0));
        let faces = faces_from_segment_graph(&lines);
        assert_eq!(faces.len(), 4);
        for f in &faces {
            assert_eq!(f.area(), 25.0);
        }
    }

    #[test]
    fn collinear_overlap_is_merged() {
        let mut lines = square_lines(0.0, 0.0, 10.0);
        lines.extend(square_lines(10.0, 0.0, 10.0));
        // Overlapping part of the shared edge again
        lines.push(l(10.0, 2.0, 10.0, 8.0));
        let faces = faces_from_segment_graph(&lines);
        assert_eq!(faces.len(), 2);
        assert_eq!(faces.iter().map(|f| f.area()).sum::<f64>(), 200.0);
    }

    #[test]
    fn nested_network_becomes_a_hole() {
        let mut lines = square_lines(0.0, 0.0, 10.0);
        lines.extend(square_lines(3.0, 3.0, 2.0));
        // A dangling edge doesn't matter
        lines.push(l(10.0, 10.0, 12.0, 12.0));
        let mut faces = faces_from_segment_graph(&lines);
        faces.sort_by(|a, b| a.area().total_cmp(&b.area()));
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].area(), 4.0);
        assert_eq!(faces[1].holes().len(), 1);
        assert_eq!(faces[1].area(), 96.0);
    }
}
