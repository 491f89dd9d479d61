use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use map_model::osm;

/// Something wrong with one input element. None of these stop the conversion; the element is
/// skipped (or kept partially) and the problem is recorded.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConversionIssue {
    #[error("invalid geometry for {element}: {reason}")]
    InvalidGeometry { element: osm::OsmID, reason: String },
    #[error("ambiguous multipolygon {relation}: only {assigned} of {candidates} holes fit inside an outer ring")]
    AmbiguousMultipolygon {
        relation: osm::RelationID,
        assigned: usize,
        candidates: usize,
    },
    #[error("{element} references missing {missing}")]
    UnresolvedReference {
        element: osm::OsmID,
        missing: osm::OsmID,
    },
}

impl ConversionIssue {
    pub fn invalid<E: fmt::Display>(element: osm::OsmID, err: E) -> ConversionIssue {
        ConversionIssue::InvalidGeometry {
            element,
            reason: err.to_string(),
        }
    }

    pub fn element(&self) -> osm::OsmID {
        match self {
            ConversionIssue::InvalidGeometry { element, .. } => *element,
            ConversionIssue::AmbiguousMultipolygon { relation, .. } => {
                osm::OsmID::Relation(*relation)
            }
            ConversionIssue::UnresolvedReference { element, .. } => *element,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ConversionIssue::InvalidGeometry { .. } => "invalid geometry",
            ConversionIssue::AmbiguousMultipolygon { .. } => "ambiguous multipolygon",
            ConversionIssue::UnresolvedReference { .. } => "unresolved reference",
        }
    }
}

/// The steps of the conversion, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Multipolygons,
    Coastlines,
    ClosedWays,
    WaySegments,
    Relations,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Stage::Multipolygons => "multipolygons",
            Stage::Coastlines => "coastlines",
            Stage::ClosedWays => "closed ways",
            Stage::WaySegments => "way segments",
            Stage::Relations => "relations",
        };
        write!(f, "{}", name)
    }
}

/// Everything skipped or only partially converted, returned next to the map.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    issues: Vec<(Stage, ConversionIssue)>,
    /// Relations kept even though some members couldn't be resolved
    pub partial_relations: Vec<osm::RelationID>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn record(&mut self, stage: Stage, issue: ConversionIssue) {
        warn!("{}: {}", stage, issue);
        self.issues.push((stage, issue));
    }

    pub fn extend(&mut self, stage: Stage, issues: Vec<ConversionIssue>) {
        for issue in issues {
            self.record(stage, issue);
        }
    }

    pub fn issues(&self) -> &Vec<(Stage, ConversionIssue)> {
        &self.issues
    }

    pub fn issues_for(&self, element: osm::OsmID) -> Vec<&ConversionIssue> {
        self.issues
            .iter()
            .filter(|(_, issue)| issue.element() == element)
            .map(|(_, issue)| issue)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty() && self.partial_relations.is_empty()
    }

    pub fn count_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for (_, issue) in &self.issues {
            *counts.entry(issue.kind()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let issue = ConversionIssue::UnresolvedReference {
            element: osm::OsmID::Way(osm::WayID(5)),
            missing: osm::OsmID::Node(osm::NodeID(7)),
        };
        assert_eq!(
            issue.to_string(),
            "https://www.openstreetmap.org/way/5 references missing https://www.openstreetmap.org/node/7"
        );

        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());
        diagnostics.record(Stage::ClosedWays, issue);
        diagnostics.record(
            Stage::Multipolygons,
            ConversionIssue::AmbiguousMultipolygon {
                relation: osm::RelationID(1),
                assigned: 1,
                candidates: 2,
            },
        );
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics
                .issues_for(osm::OsmID::Relation(osm::RelationID(1)))
                .len(),
            1
        );
        assert_eq!(diagnostics.count_by_kind()["unresolved reference"], 1);
    }
}
