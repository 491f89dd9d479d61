use crate::line::orientation;
use crate::{Pt2D, Ring};

/// The convex hull of the points, counter-clockwise and without repeating the first point.
/// Collinear points along the hull are left out. Quickhull: split the points by the line between
/// the two extremes in x, then recursively keep the farthest point on each side.
pub fn convex_hull(pts: &[Pt2D]) -> Vec<Pt2D> {
    let mut pts = pts.to_vec();
    pts.sort_by(|a, b| a.x().total_cmp(&b.x()).then(a.z().total_cmp(&b.z())));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let leftmost = pts[0];
    let rightmost = pts[pts.len() - 1];
    let (mut below, mut above) = (Vec::new(), Vec::new());
    for pt in &pts[1..pts.len() - 1] {
        let side = orientation(leftmost, rightmost, *pt);
        if side < 0.0 {
            below.push(*pt);
        } else if side > 0.0 {
            above.push(*pt);
        }
    }

    let mut hull = vec![leftmost];
    // Walking counter-clockwise, the part below the split line comes first
    hull_side(leftmost, rightmost, &below, &mut hull);
    hull.push(rightmost);
    hull_side(rightmost, leftmost, &above, &mut hull);
    hull
}

// Appends the hull points strictly to the right of a->b, in order from a to b.
fn hull_side(a: Pt2D, b: Pt2D, candidates: &[Pt2D], hull: &mut Vec<Pt2D>) {
    let farthest = candidates
        .iter()
        .map(|pt| (orientation(a, b, *pt).abs(), *pt))
        .max_by(|x, y| x.0.total_cmp(&y.0));
    let far = match farthest {
        Some((_, pt)) => pt,
        None => return,
    };

    let right_of = |from: Pt2D, to: Pt2D| -> Vec<Pt2D> {
        candidates
            .iter()
            .filter(|pt| orientation(from, to, **pt) < 0.0)
            .cloned()
            .collect()
    };
    let first = right_of(a, far);
    let second = right_of(far, b);
    hull_side(a, far, &first, hull);
    hull.push(far);
    hull_side(far, b, &second, hull);
}

/// The smallest-area rectangle, at any rotation, that covers all of the points. One of its sides
/// always lies along an edge of the convex hull. None if the points are all collinear.
pub fn minimum_rotated_bounding_box(pts: &[Pt2D]) -> Option<Ring> {
    let hull = convex_hull(pts);
    if hull.len() < 3 {
        return None;
    }

    let mut best: Option<(f64, [Pt2D; 4])> = None;
    for idx in 0..hull.len() {
        let p1 = hull[idx];
        let p2 = hull[(idx + 1) % hull.len()];
        let len = p1.dist_to(p2);
        let (ux, uz) = ((p2.x() - p1.x()) / len, (p2.z() - p1.z()) / len);
        // The normal, pointing into the hull
        let (nx, nz) = (-uz, ux);

        let (mut min_u, mut max_u, mut max_n) = (f64::MAX, f64::MIN, f64::MIN);
        for pt in &hull {
            let (dx, dz) = (pt.x() - p1.x(), pt.z() - p1.z());
            let along = dx * ux + dz * uz;
            let across = dx * nx + dz * nz;
            min_u = min_u.min(along);
            max_u = max_u.max(along);
            max_n = max_n.max(across);
        }
        let area = (max_u - min_u) * max_n;
        if best.map(|(a, _)| area < a).unwrap_or(true) {
            let corner = |along: f64, across: f64| {
                Pt2D::new(
                    p1.x() + along * ux + across * nx,
                    p1.z() + along * uz + across * nz,
                )
            };
            best = Some((
                area,
                [
                    corner(min_u, 0.0),
                    corner(max_u, 0.0),
                    corner(max_u, max_n),
                    corner(min_u, max_n),
                ],
            ));
        }
    }

    let (_, corners) = best?;
    let mut pts = corners.to_vec();
    pts.push(corners[0]);
    Ring::deduping_new(pts).ok()
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    use super::*;
    use crate::signed_area;

    #[test]
    fn square_with_interior_points() {
        let pts = vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(10.0, 0.0),
            Pt2D::new(5.0, 5.0),
            Pt2D::new(10.0, 10.0),
            Pt2D::new(5.0, 0.0),
            Pt2D::new(0.0, 10.0),
            Pt2D::new(2.0, 7.0),
        ];
        let hull = convex_hull(&pts);
        assert_eq!(
            hull,
            vec![
                Pt2D::new(0.0, 0.0),
                Pt2D::new(10.0, 0.0),
                Pt2D::new(10.0, 10.0),
                Pt2D::new(0.0, 10.0),
            ]
        );
    }

    #[test]
    fn random_points_are_inside_hull() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        let pts: Vec<Pt2D> = (0..200)
            .map(|_| Pt2D::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)))
            .collect();
        let mut hull = convex_hull(&pts);
        hull.push(hull[0]);
        assert!(signed_area(&hull) > 0.0);
        let ring = Ring::must_new(hull);
        for pt in pts {
            assert!(ring.contains_pt(pt) || ring.is_on_boundary(pt));
        }
    }

    #[test]
    fn rotated_box() {
        // A diamond; the best box is the diamond itself
        let pts = vec![
            Pt2D::new(0.0, 5.0),
            Pt2D::new(5.0, 0.0),
            Pt2D::new(10.0, 5.0),
            Pt2D::new(5.0, 10.0),
        ];
        let rect = minimum_rotated_bounding_box(&pts).unwrap();
        assert!((rect.area() - 50.0).abs() < 0.01);
        assert!(minimum_rotated_bounding_box(&[Pt2D::new(0.0, 0.0), Pt2D::new(1.0, 1.0)]).is_none());
    }
}
