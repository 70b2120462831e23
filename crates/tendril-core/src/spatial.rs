use crate::geometry::{Point, Segment};
use crate::walk::SegmentId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Grid cell holding every segment whose midpoint falls inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    pub cell_x: i64,
    pub cell_y: i64,
}

impl BucketKey {
    pub const fn new(cell_x: i64, cell_y: i64) -> Self {
        Self { cell_x, cell_y }
    }

    pub fn containing(point: Point, cell_size: f64) -> Self {
        Self {
            cell_x: (point.x / cell_size).floor() as i64,
            cell_y: (point.y / cell_size).floor() as i64,
        }
    }

    /// This cell and its 8 grid neighbours.
    pub fn neighborhood(self) -> [BucketKey; 9] {
        let mut keys = [self; 9];
        let mut slot = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                keys[slot] = BucketKey::new(
                    self.cell_x.saturating_add(dx),
                    self.cell_y.saturating_add(dy),
                );
                slot += 1;
            }
        }
        keys
    }
}

impl Ord for BucketKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cell_y
            .cmp(&other.cell_y)
            .then(self.cell_x.cmp(&other.cell_x))
    }
}

impl PartialOrd for BucketKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A stored segment: the owner back-reference plus an immutable copy of the geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexedSegment {
    pub id: SegmentId,
    pub segment: Segment,
}

/// Hashed uniform grid over segment midpoints.
///
/// The cell size equals the longest segment ever inserted (the walk step
/// length). Two segments of at most that length which touch have midpoints
/// less than one cell apart on each axis, so the 3×3 neighbourhood of a
/// candidate's cell holds every stored segment that can cross it.
/// Append-only: entries are never removed or re-bucketed.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    cell_size: f64,
    buckets: HashMap<BucketKey, Vec<IndexedSegment>>,
    len: usize,
}

impl SpatialIndex {
    pub fn new(cell_size: f64) -> Self {
        debug_assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell_size must be positive and finite"
        );
        Self {
            cell_size,
            buckets: HashMap::new(),
            len: 0,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn bucket_of(&self, segment: &Segment) -> BucketKey {
        BucketKey::containing(segment.midpoint(), self.cell_size)
    }

    pub fn neighbors_of(&self, segment: &Segment) -> [BucketKey; 9] {
        self.bucket_of(segment).neighborhood()
    }

    /// Store `segment` under its midpoint bucket. Returns `false` (and stores
    /// nothing) when `id` is already present.
    pub fn insert(&mut self, id: SegmentId, segment: Segment) -> bool {
        let key = self.bucket_of(&segment);
        let bucket = self.buckets.entry(key).or_default();
        if bucket.iter().any(|stored| stored.id == id) {
            return false;
        }
        bucket.push(IndexedSegment { id, segment });
        self.len += 1;
        true
    }

    /// Every stored segment whose bucket lies in `neighbors_of(segment)`.
    pub fn segments_near(&self, segment: &Segment) -> impl Iterator<Item = &IndexedSegment> + '_ {
        self.neighbors_of(segment)
            .into_iter()
            .filter_map(move |key| self.buckets.get(&key))
            .flatten()
    }

    pub fn bucket(&self, key: BucketKey) -> &[IndexedSegment] {
        self.buckets.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Occupied bucket keys in `(cell_y, cell_x)` order.
    pub fn keys(&self) -> Vec<BucketKey> {
        let mut keys: Vec<BucketKey> = self.buckets.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedSegment> + '_ {
        self.buckets.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
