use std::fmt;

use serde::{Deserialize, Serialize};

use geom::{Bounds, Pt2D, RingSegment};

use crate::{Area, AreaID, Node, NodeID, WaySegment, WaySegmentID};

/// Anything that takes part in overlap detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementID {
    Node(NodeID),
    WaySegment(WaySegmentID),
    Area(AreaID),
}

impl fmt::Display for ElementID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ElementID::Node(id) => write!(f, "{}", id),
            ElementID::WaySegment(id) => write!(f, "{}", id),
            ElementID::Area(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Element<'a> {
    Node(&'a Node),
    WaySegment(&'a WaySegment),
    Area(&'a Area),
}

impl<'a> Element<'a> {
    pub fn id(&self) -> ElementID {
        match self {
            Element::Node(n) => ElementID::Node(n.id),
            Element::WaySegment(s) => ElementID::WaySegment(s.id),
            Element::Area(a) => ElementID::Area(a.id),
        }
    }

    pub fn get_bounds(&self) -> Bounds {
        match self {
            Element::Node(n) => Bounds::from(&[n.pt]),
            Element::WaySegment(s) => s.line.get_bounds(),
            Element::Area(a) => a.get_bounds(),
        }
    }

    pub fn overlaps(&self) -> &'a Vec<Overlap> {
        match self {
            Element::Node(n) => &n.overlaps,
            Element::WaySegment(s) => &s.overlaps,
            Element::Area(a) => &a.overlaps,
        }
    }
}

/// One point where two elements cross. When a participant is an area, the crossed edge of that
/// area is recorded too; `segment1` belongs to `e1` of the overlap and `segment2` to `e2`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Crossing {
    pub pt: Pt2D,
    pub segment1: Option<RingSegment>,
    pub segment2: Option<RingSegment>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OverlapKind {
    /// Both use the same edges, listed here as node pairs
    SharesSegment(Vec<(NodeID, NodeID)>),
    /// `e1` completely covers `e2`
    Contains,
    /// The outlines truly cross; touching at a shared node doesn't count
    Intersects(Vec<Crossing>),
}

/// A relationship between two elements. The same value is stored on both of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    pub e1: ElementID,
    pub e2: ElementID,
    pub kind: OverlapKind,
}

impl Overlap {
    pub fn involves(&self, id: ElementID) -> bool {
        self.e1 == id || self.e2 == id
    }

    /// The participant that isn't `me`. Panics if `me` isn't part of this overlap.
    pub fn other(&self, me: ElementID) -> ElementID {
        if self.e1 == me {
            self.e2
        } else if self.e2 == me {
            self.e1
        } else {
            panic!("{} isn't part of the overlap between {} and {}", me, self.e1, self.e2);
        }
    }

    pub fn container(&self) -> Option<ElementID> {
        match self.kind {
            OverlapKind::Contains => Some(self.e1),
            _ => None,
        }
    }

    pub fn contained(&self) -> Option<ElementID> {
        match self.kind {
            OverlapKind::Contains => Some(self.e2),
            _ => None,
        }
    }

    /// The same overlap, described from the other side. Containment can't be flipped, since the
    /// order says who's the container.
    pub fn swapped(&self) -> Overlap {
        let kind = match self.kind {
            OverlapKind::Intersects(ref crossings) => OverlapKind::Intersects(
                crossings
                    .iter()
                    .map(|c| Crossing {
                        pt: c.pt,
                        segment1: c.segment2,
                        segment2: c.segment1,
                    })
                    .collect(),
            ),
            ref other => other.clone(),
        };
        match kind {
            OverlapKind::Contains => self.clone(),
            kind => Overlap {
                e1: self.e2,
                e2: self.e1,
                kind,
            },
        }
    }
}

impl fmt::Display for Overlap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            OverlapKind::SharesSegment(ref edges) => write!(
                f,
                "{} and {} share {} segments",
                self.e1,
                self.e2,
                edges.len()
            ),
            OverlapKind::Contains => write!(f, "{} contains {}", self.e1, self.e2),
            OverlapKind::Intersects(ref crossings) => write!(
                f,
                "{} and {} cross {} times",
                self.e1,
                self.e2,
                crossings.len()
            ),
        }
    }
}
