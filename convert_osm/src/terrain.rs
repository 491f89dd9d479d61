use abstutil::{Tags, Timer};
use geom::{Bounds, Polygon, SpatialGrid};
use map_model::{AreaBasis, AreaID, MapBuilder};

use crate::lookup::PositionLookup;

// Smaller pieces left over from subtraction aren't worth an area
const MIN_PATCH_AREA: f64 = 0.01;

/// Covers every part of the tile that no area claims yet with square patches, so consumers never
/// have to handle "no data". Patches are cut from a grid of `cell_size` squares, minus all
/// existing areas.
pub fn fill_empty_terrain(
    builder: &mut MapBuilder,
    positions: &mut PositionLookup,
    tile: &Bounds,
    cell_size: f64,
    timer: &mut Timer,
) -> Vec<AreaID> {
    if tile.is_empty() || tile.width() <= 0.0 || tile.height() <= 0.0 || cell_size <= 0.0 {
        return Vec::new();
    }

    let mut grid = SpatialGrid::new(tile, cell_size);
    let polygons: Vec<Polygon> = builder
        .map()
        .all_areas()
        .iter()
        .map(|a| a.polygon.clone())
        .collect();
    for (idx, polygon) in polygons.iter().enumerate() {
        grid.insert(idx, &polygon.get_bounds());
    }

    let columns = (tile.width() / cell_size).ceil().max(1.0) as usize;
    let rows = (tile.height() / cell_size).ceil().max(1.0) as usize;
    let mut results = Vec::new();
    timer.start_iter("fill empty terrain", columns * rows);
    for row in 0..rows {
        for col in 0..columns {
            timer.next();
            let cell = Bounds::from_corners(
                tile.min_x + (col as f64) * cell_size,
                tile.min_z + (row as f64) * cell_size,
                (tile.min_x + ((col + 1) as f64) * cell_size).min(tile.max_x),
                (tile.min_z + ((row + 1) as f64) * cell_size).min(tile.max_z),
            );
            let square = match cell.get_rectangle() {
                Ok(ring) => Polygon::from_ring(ring),
                Err(_) => continue,
            };
            let nearby: Vec<Polygon> = grid
                .query(&cell)
                .into_iter()
                .map(|idx| polygons[idx].clone())
                .collect();

            for patch in square.subtract(&nearby) {
                if patch.area() < MIN_PATCH_AREA {
                    debug!("Dropping a sliver of empty terrain near {}", cell.center());
                    continue;
                }
                let (outer, holes) = patch.into_rings();
                let outer = positions.get_or_add_all(builder, outer.points());
                let holes = holes
                    .iter()
                    .map(|h| positions.get_or_add_all(builder, h.points()))
                    .collect();
                match builder.add_area(AreaBasis::EmptyTerrain, Tags::empty(), outer, holes) {
                    Ok(id) => results.push(id),
                    Err(err) => debug!("Dropping a piece of empty terrain: {}", err),
                }
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use geom::Pt2D;
    use map_model::NodeID;

    use super::*;

    #[test]
    fn fills_around_existing_areas() {
        let tile = Bounds::from_corners(0.0, 0.0, 200.0, 100.0);
        let mut b = MapBuilder::new(tile);
        let corners: Vec<NodeID> = [(10.0, 10.0), (30.0, 10.0), (30.0, 30.0), (10.0, 30.0)]
            .into_iter()
            .map(|(x, z)| b.add_node(None, Pt2D::new(x, z), Tags::empty()))
            .collect();
        b.add_area(AreaBasis::EmptyTerrain, Tags::empty(), corners, Vec::new())
            .unwrap();
        let mut positions = PositionLookup::new(b.map());

        let patches = fill_empty_terrain(
            &mut b,
            &mut positions,
            &tile,
            100.0,
            &mut Timer::throwaway(),
        );
        assert_eq!(patches.len(), 2);
        let map = b.finish();
        // The first patch has the existing area punched out of it
        let first = map.get_a(patches[0]);
        assert_eq!(first.holes.len(), 1);
        assert_eq!(first.polygon.area(), 100.0 * 100.0 - 20.0 * 20.0);
        assert!(first.holes[0].contains(&node_at(&map, Pt2D::new(10.0, 10.0))));
        // Neighboring patches share the nodes along their common side
        assert_eq!(map.get_a(patches[1]).shared_edges(first).len(), 1);
    }

    fn node_at(map: &map_model::MapData, pt: Pt2D) -> NodeID {
        map.all_nodes().iter().find(|n| n.pt == pt).unwrap().id
    }
}
