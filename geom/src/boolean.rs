use geo::BooleanOps;

use crate::{Polygon, Pt2D, Ring};

impl Polygon {
    /// Everything covered by this polygon but none of the others. The result may be empty, or
    /// split into several pieces with holes.
    pub fn subtract(&self, subtractors: &[Polygon]) -> Vec<Polygon> {
        let mut result = geo::MultiPolygon(vec![self.to_geo()]);
        for p in subtractors {
            if !self.get_bounds().intersects(&p.get_bounds()) {
                continue;
            }
            result = result.difference(&geo::MultiPolygon(vec![p.to_geo()]));
            if result.0.is_empty() {
                break;
            }
        }
        from_multi(result)
    }

    /// The area covered by every one of the polygons.
    pub fn intersect_all(list: &[Polygon]) -> Vec<Polygon> {
        let mut iter = list.iter();
        let first = match iter.next() {
            Some(p) => p,
            None => return Vec::new(),
        };
        let mut result = geo::MultiPolygon(vec![first.to_geo()]);
        for p in iter {
            result = result.intersection(&geo::MultiPolygon(vec![p.to_geo()]));
            if result.0.is_empty() {
                break;
            }
        }
        from_multi(result)
    }

    pub fn intersection(&self, other: &Polygon) -> Vec<Polygon> {
        Polygon::intersect_all(&[self.clone(), other.clone()])
    }
}

// Snapping the output back to millimeters can collapse slivers; those pieces are dropped.
fn from_multi(multi: geo::MultiPolygon<f64>) -> Vec<Polygon> {
    let mut result = Vec::new();
    for poly in multi {
        let (exterior, interiors) = poly.into_inner();
        let outer = match to_ring(exterior) {
            Some(ring) => ring,
            None => continue,
        };
        let holes: Vec<Ring> = interiors
            .into_iter()
            .filter_map(to_ring)
            .filter(|hole| outer.contains_ring(hole))
            .collect();
        match Polygon::new(outer, holes) {
            Ok(p) => result.push(p),
            Err(err) => debug!("Dropping a boolean op result: {}", err),
        }
    }
    result
}

fn to_ring(ls: geo::LineString<f64>) -> Option<Ring> {
    let pts: Vec<Pt2D> = ls.0.into_iter().map(|c| Pt2D::new(c.x, c.y)).collect();
    match Ring::deduping_new(pts) {
        Ok(ring) => Some(ring),
        Err(err) => {
            debug!("Dropping a ring from a boolean op result: {}", err);
            None
        }
    }
}
