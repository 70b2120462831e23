use super::{TickReport, WalkOutcome};
use crate::geometry::Segment;
use crate::walk::Walk;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TickTimings {
    pub lock_wait_us: u64,
    pub sampling_us: u64,
    pub total_us: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TickMetrics {
    pub tick: u64,
    pub accepted: usize,
    pub stuck: usize,
    pub total_segments: usize,
    pub occupied_buckets: usize,
    /// Mean samples drawn per walk this tick, stuck walks included.
    pub mean_attempts: f64,
    pub max_attempts: u64,
    /// Mean stored segments per occupied bucket.
    pub bucket_load: f64,
    pub sampling_us: u64,
}

impl From<&TickReport> for TickMetrics {
    fn from(report: &TickReport) -> Self {
        let walks = report.outcomes.len();
        let stuck = report.stuck_walks().count();
        let attempt_sum: u64 = report.outcomes.iter().map(WalkOutcome::attempts).sum();
        let max_attempts = report
            .outcomes
            .iter()
            .map(WalkOutcome::attempts)
            .max()
            .unwrap_or(0);
        Self {
            tick: report.tick,
            accepted: walks - stuck,
            stuck,
            total_segments: report.total_segments,
            occupied_buckets: report.occupied_buckets,
            mean_attempts: attempt_sum as f64 / walks.max(1) as f64,
            max_attempts,
            bucket_load: report.total_segments as f64 / report.occupied_buckets.max(1) as f64,
            sampling_us: report.timings.sampling_us,
        }
    }
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub ticks: usize,
    pub sample_every: usize,
    #[serde(default)]
    pub stuck_events: usize,
    #[serde(default)]
    pub final_walk_lengths: Vec<usize>,
    pub samples: Vec<TickMetrics>,
}

/// Every walk and obstacle as of the end of tick `tick`.
#[derive(Clone, Debug, Serialize)]
pub struct EngineSnapshot {
    pub tick: u64,
    pub step_size: f64,
    pub walks: Vec<Walk>,
    pub obstacles: Vec<Segment>,
}

impl EngineSnapshot {
    /// Obstacles first, then each walk's segments in walk order.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = self.obstacles.clone();
        for walk in &self.walks {
            segments.extend_from_slice(walk.segments());
        }
        segments
    }

    pub fn segment_count(&self) -> usize {
        self.obstacles.len() + self.walks.iter().map(Walk::len).sum::<usize>()
    }
}
