//! Whole-run self-avoidance check, independent of the bucket grid.
//!
//! Candidate pairs come from an R*-tree over segment bounding boxes, and each
//! segment's candidates are tested in parallel.

use crate::geometry::{intersects, Segment};
use crate::spatial::IndexedSegment;
use crate::walk::SegmentId;
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// Two stored segments that cross. `first < second`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Crossing {
    pub first: SegmentId,
    pub second: SegmentId,
}

#[derive(Clone, Copy, Debug)]
struct BoundedSegment {
    slot: usize,
    segment: Segment,
}

impl RTreeObject for BoundedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        bounding_box(&self.segment)
    }
}

fn bounding_box(segment: &Segment) -> AABB<[f64; 2]> {
    let (start, end) = (segment.start(), segment.end());
    AABB::from_corners([start.x, start.y], [end.x, end.y])
}

/// All crossing pairs among `segments`, sorted. Pairs joined at a shared
/// endpoint are not reported.
pub fn find_crossings(segments: &[IndexedSegment]) -> Vec<Crossing> {
    let tree = RTree::bulk_load(
        segments
            .iter()
            .enumerate()
            .map(|(slot, stored)| BoundedSegment {
                slot,
                segment: stored.segment,
            })
            .collect(),
    );

    let mut crossings: Vec<Crossing> = segments
        .par_iter()
        .enumerate()
        .flat_map_iter(|(slot, stored)| {
            tree.locate_in_envelope_intersecting(&bounding_box(&stored.segment))
                .filter(|other| other.slot > slot)
                .filter(|other| !stored.segment.shares_endpoint(&other.segment))
                .filter(|other| intersects(&stored.segment, &other.segment))
                .map(|other| {
                    let (a, b) = (stored.id, segments[other.slot].id);
                    Crossing {
                        first: a.min(b),
                        second: a.max(b),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect();
    crossings.sort_unstable();
    crossings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::SegmentOwner;

    fn stored(walk: usize, seq: usize, segment: Segment) -> IndexedSegment {
        IndexedSegment {
            id: SegmentId {
                owner: SegmentOwner::Walk(walk),
                seq,
            },
            segment,
        }
    }

    #[test]
    fn reports_each_crossing_pair_once() {
        let segments = vec![
            stored(0, 0, Segment::from_coords(0.0, 0.0, 10.0, 0.0)),
            stored(1, 0, Segment::from_coords(5.0, -5.0, 5.0, 5.0)),
            stored(2, 0, Segment::from_coords(100.0, 100.0, 110.0, 100.0)),
        ];
        let crossings = find_crossings(&segments);
        assert_eq!(
            crossings,
            vec![Crossing {
                first: segments[0].id,
                second: segments[1].id,
            }]
        );
    }

    #[test]
    fn consecutive_steps_sharing_an_endpoint_are_ignored() {
        let segments = vec![
            stored(0, 0, Segment::from_coords(0.0, 0.0, 10.0, 0.0)),
            stored(0, 1, Segment::from_coords(10.0, 0.0, 10.0, 10.0)),
            stored(0, 2, Segment::from_coords(10.0, 10.0, 0.0, 10.0)),
        ];
        assert!(find_crossings(&segments).is_empty());
    }

    #[test]
    fn empty_input_has_no_crossings() {
        assert!(find_crossings(&[]).is_empty());
    }
}
