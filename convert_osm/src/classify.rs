use abstutil::Tags;
use map_model::osm;

/// Decides what tagged input means. The conversion only asks these questions; swap in another
/// implementation for data that doesn't follow OpenStreetMap conventions.
pub trait TagClassifier {
    /// Should a closed way with these tags become an area rather than a loop of way segments?
    fn is_area(&self, tags: &Tags) -> bool;
    /// Do these tags describe dry land?
    fn is_land(&self, tags: &Tags) -> bool;
    /// Do these tags describe open sea?
    fn is_sea(&self, tags: &Tags) -> bool;
    fn is_coastline(&self, tags: &Tags) -> bool;
    /// Should a relation with these tags be assembled into areas?
    fn is_multipolygon(&self, tags: &Tags) -> bool;
}

/// The usual OpenStreetMap interpretation.
pub struct DefaultClassifier;

const AREA_KEYS: [&str; 11] = [
    "amenity", "building", "building:part", "landuse", "leisure", "man_made", "military",
    "place", "shop", "tourism", "water",
];

// Values of natural=* that are lines, not areas
const LINEAR_NATURAL: [&str; 5] = ["coastline", "cliff", "ridge", "arete", "tree_row"];

const LAND_NATURAL: [&str; 10] = [
    "wood", "scrub", "heath", "grassland", "bare_rock", "sand", "beach", "scree", "wetland",
    "fell",
];

impl TagClassifier for DefaultClassifier {
    fn is_area(&self, tags: &Tags) -> bool {
        if tags.is("area", "yes") {
            return true;
        }
        if tags.is("area", "no") || self.is_coastline(tags) {
            return false;
        }
        if let Some(natural) = tags.get(osm::NATURAL) {
            return !LINEAR_NATURAL.contains(&natural.as_str());
        }
        if tags.is_any("waterway", &["riverbank", "dock", "boatyard"]) {
            return true;
        }
        // Ways tagged like this are lines unless they say otherwise
        if tags.has_any(&["highway", "barrier", "railway", "power"]) {
            return false;
        }
        tags.has_any(&AREA_KEYS)
    }

    fn is_land(&self, tags: &Tags) -> bool {
        tags.contains_key("landuse")
            || tags.is_any("place", &["island", "islet"])
            || tags.is_any(osm::NATURAL, &LAND_NATURAL)
    }

    fn is_sea(&self, tags: &Tags) -> bool {
        tags.is_any("place", &["sea", "ocean"])
            || tags.is_any(osm::NATURAL, &["bay", "strait"])
            || (tags.is(osm::NATURAL, "water") && tags.is_any("water", &["sea", "ocean"]))
    }

    fn is_coastline(&self, tags: &Tags) -> bool {
        tags.is(osm::NATURAL, osm::COASTLINE)
    }

    fn is_multipolygon(&self, tags: &Tags) -> bool {
        tags.is(osm::TYPE, osm::MULTIPOLYGON)
    }
}
