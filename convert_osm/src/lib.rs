//! Builds the map data model from a batch of raw input. Nodes come first, then areas (from
//! multipolygon relations, coastlines, closed ways, and empty terrain filling the gaps), then way
//! segments and relations. Finally every pair of nearby elements is checked for overlaps.
//!
//! Problems with individual elements never stop the conversion. They're collected in
//! `Diagnostics` and returned alongside the map.

#[macro_use]
extern crate log;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use abstutil::Timer;
use geom::Bounds;
use map_model::{MapBuilder, MapData};
use raw_map::RawMap;

pub use self::classify::{DefaultClassifier, TagClassifier};
pub use self::issues::{ConversionIssue, Diagnostics, Stage};
pub use self::multipolygon::assign_holes;
pub use self::overlaps::classify as classify_overlap;
pub use self::rings::{assemble_rings, AssembledRing};

mod classify;
mod coastline;
mod extract;
mod issues;
mod lookup;
mod multipolygon;
mod overlaps;
mod rings;
mod terrain;

/// Configures the conversion. Every field has a sensible default, so a JSON file only needs to
/// mention what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// The tile to clip coastlines to and fill with empty terrain. If missing, the input's
    /// boundary is used, or failing that, the extent of its nodes.
    pub boundary: Option<Bounds>,
    /// Treat the tile as open water when no coastline crosses it. The input can also say this.
    pub at_sea: bool,
    /// Size of the cells in the index used to find overlap candidates, in meters
    pub index_cell_size: f64,
    /// The index covers everything in the map, padded by this many meters
    pub index_margin: f64,
    pub empty_terrain: EmptyTerrainOptions,
    /// Classify overlaps on a thread pool. The result is the same either way.
    pub parallel_overlaps: bool,
    pub overlap_nodes: OverlapNodes,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            boundary: None,
            at_sea: false,
            index_cell_size: 1000.0,
            index_margin: 10.0,
            empty_terrain: EmptyTerrainOptions::default(),
            parallel_overlaps: true,
            overlap_nodes: OverlapNodes::Tagged,
        }
    }
}

impl Options {
    pub fn from_json(raw: &str) -> Result<Options> {
        abstutil::from_json(raw)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmptyTerrainOptions {
    pub enabled: bool,
    /// Patches are squares this many meters wide, minus anything already mapped
    pub cell_size: f64,
}

impl Default for EmptyTerrainOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            cell_size: 100.0,
        }
    }
}

/// Which nodes are checked for containment in areas. Way segments and areas always are.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapNodes {
    None,
    /// Only nodes carrying tags of their own, like trees or shops. Untagged nodes are just corners
    /// of ways and areas.
    Tagged,
    All,
}

/// Converts everything in `raw`. Always returns a consistent map; elements that couldn't be
/// converted are described in the diagnostics.
pub fn convert(
    raw: &RawMap,
    opts: &Options,
    classifier: &dyn TagClassifier,
    timer: &mut Timer,
) -> (MapData, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let tile = opts.boundary.unwrap_or_else(|| raw.file_bounds());
    let mut builder = MapBuilder::new(tile);

    timer.start("create nodes");
    let mut lookup = lookup::NodeLookup::new(raw);
    for (id, node) in &raw.nodes {
        lookup.insert(*id, builder.add_node(Some(*id), node.pt, node.tags.clone()));
    }
    timer.stop("create nodes");

    timer.start("assemble multipolygons");
    let mut covered = BTreeSet::new();
    let mut multipolygons = BTreeMap::new();
    for (id, rel) in &raw.relations {
        if !classifier.is_multipolygon(&rel.tags) {
            continue;
        }
        match multipolygon::build_multipolygon(&mut builder, &lookup, *id, rel) {
            Ok(result) => {
                covered.extend(result.covered_ways);
                multipolygons.insert(*id, result.areas);
            }
            Err(issue) => diagnostics.record(Stage::Multipolygons, issue),
        }
    }
    timer.stop("assemble multipolygons");

    timer.start("synthesize sea from coastlines");
    let mut positions = lookup::PositionLookup::new(builder.map());
    let (sea, issues) = coastline::build_sea(
        &mut builder,
        &lookup,
        &mut positions,
        classifier,
        &tile,
        opts.at_sea || raw.at_sea,
    );
    diagnostics.extend(Stage::Coastlines, issues);
    timer.note(format!("{} sea areas", sea.len()));
    timer.stop("synthesize sea from coastlines");

    timer.start("areas from closed ways");
    let (way_areas, mut consumed, issues) =
        extract::closed_way_areas(&mut builder, &lookup, classifier, &covered);
    diagnostics.extend(Stage::ClosedWays, issues);
    consumed.extend(covered);
    timer.stop("areas from closed ways");

    if opts.empty_terrain.enabled {
        timer.start("fill empty terrain");
        let patches = terrain::fill_empty_terrain(
            &mut builder,
            &mut positions,
            &tile,
            opts.empty_terrain.cell_size,
            timer,
        );
        timer.note(format!("{} patches of empty terrain", patches.len()));
        timer.stop("fill empty terrain");
    }

    timer.start("finalize adjacency");
    builder.finalize_adjacency();
    timer.stop("finalize adjacency");

    timer.start("create way segments");
    let (ways, issues) = extract::way_segments(&mut builder, &lookup, &consumed);
    diagnostics.extend(Stage::WaySegments, issues);
    timer.stop("create way segments");

    timer.start("create relations");
    let (partial, issues) = extract::relations(
        &mut builder,
        &lookup,
        classifier,
        extract::Resolved {
            ways: &ways,
            way_areas: &way_areas,
            multipolygons: &multipolygons,
        },
    );
    diagnostics.extend(Stage::Relations, issues);
    diagnostics.partial_relations = partial;
    timer.stop("create relations");

    timer.start("find overlaps");
    overlaps::find_overlaps(&mut builder, opts, timer);
    timer.stop("find overlaps");

    let map = builder.finish();
    map.describe(timer);
    for (kind, count) in diagnostics.count_by_kind() {
        timer.warn(format!("{}: {} problems", kind, count));
    }
    (map, diagnostics)
}
