use crate::geometry::{Point, Segment};
use serde::{Deserialize, Serialize};

/// Who owns a segment stored in the spatial index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SegmentOwner {
    Walk(usize),
    /// Fixed segment seeded directly into the index.
    Obstacle,
}

/// Back-reference from the index to the owner of a segment: the owner plus the
/// segment's position in the owner's sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId {
    pub owner: SegmentOwner,
    pub seq: usize,
}

/// One growing path. Append-only: `segments[i].end() == segments[i + 1].start()`
/// and the first segment starts at `origin`.
#[derive(Clone, Debug, Serialize)]
pub struct Walk {
    id: usize,
    origin: Point,
    segments: Vec<Segment>,
    stuck_ticks: usize,
}

impl Walk {
    pub fn new(id: usize, origin: Point) -> Self {
        Self {
            id,
            origin,
            segments: Vec::new(),
            stuck_ticks: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Where the next step starts: the last end point, or the origin for an empty walk.
    pub fn head(&self) -> Point {
        self.segments
            .last()
            .map(Segment::end)
            .unwrap_or(self.origin)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of ticks on which this walk failed to find a step.
    pub fn stuck_ticks(&self) -> usize {
        self.stuck_ticks
    }

    pub(crate) fn push(&mut self, segment: Segment) -> SegmentId {
        debug_assert_eq!(
            segment.start(),
            self.head(),
            "a walk step must start at the walk head"
        );
        let id = SegmentId {
            owner: SegmentOwner::Walk(self.id),
            seq: self.segments.len(),
        };
        self.segments.push(segment);
        id
    }

    pub(crate) fn record_stuck(&mut self) {
        self.stuck_ticks += 1;
    }
}
