//! Growth engine for self-avoiding random walks on a continuous plane.
//!
//! Every walk extends by one fixed-length step per tick. A step is accepted
//! only if it crosses no previously placed segment. Collision candidates come
//! from a hashed grid keyed on segment midpoints.

pub mod audit;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod render;
pub mod spatial;
pub mod walk;

pub use audit::Crossing;
pub use config::{ConfigError, WalkConfig};
pub use engine::{
    initialize, EngineSnapshot, GrowthEngine, GrowthError, RunError, RunSummary, TickMetrics,
    TickReport, TickTimings, WalkOutcome,
};
pub use geometry::{intersects, Point, Segment};
pub use render::{JsonLinesSink, RecordingSink, RenderCommand, RenderError, RenderSink, RenderWorker};
pub use spatial::{BucketKey, IndexedSegment, SpatialIndex};
pub use walk::{SegmentId, SegmentOwner, Walk};
