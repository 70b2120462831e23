pub mod metrics;

pub use metrics::*;

use crate::audit::{self, Crossing};
use crate::config::{ConfigError, WalkConfig};
use crate::geometry::{self, Point, Segment};
use crate::spatial::{IndexedSegment, SpatialIndex};
use crate::walk::{SegmentId, SegmentOwner, Walk};
use parking_lot::Mutex;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use std::f64::consts::TAU;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrowthError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("obstacle length ({length}) exceeds step_size ({max})")]
    ObstacleTooLong { length: f64, max: f64 },
    #[error("obstacle coordinates must be finite")]
    NonFiniteObstacle,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("sample_every must be positive")]
    InvalidSampleEvery,
    #[error("ticks ({actual}) exceed supported maximum ({max})")]
    TooManyTicks { max: usize, actual: usize },
    #[error("sample count ({actual}) exceeds supported maximum ({max})")]
    TooManySamples { max: usize, actual: usize },
}

/// What happened to one walk during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum WalkOutcome {
    Accepted {
        walk: usize,
        segment: Segment,
        attempts: u64,
    },
    /// No non-crossing direction was found within `max_attempts` samples.
    Stuck { walk: usize, attempts: u64 },
}

impl WalkOutcome {
    pub fn walk(&self) -> usize {
        match *self {
            WalkOutcome::Accepted { walk, .. } | WalkOutcome::Stuck { walk, .. } => walk,
        }
    }

    pub fn attempts(&self) -> u64 {
        match *self {
            WalkOutcome::Accepted { attempts, .. } | WalkOutcome::Stuck { attempts, .. } => {
                attempts
            }
        }
    }

    pub fn segment(&self) -> Option<Segment> {
        match *self {
            WalkOutcome::Accepted { segment, .. } => Some(segment),
            WalkOutcome::Stuck { .. } => None,
        }
    }
}

/// Result of one `tick()`: one outcome per walk, in walk order.
#[derive(Clone, Debug, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub outcomes: Vec<WalkOutcome>,
    pub total_segments: usize,
    pub occupied_buckets: usize,
    pub timings: TickTimings,
}

impl TickReport {
    /// Newly accepted segments in walk order; stuck walks contribute nothing.
    pub fn accepted_segments(&self) -> Vec<Segment> {
        self.outcomes.iter().filter_map(WalkOutcome::segment).collect()
    }

    pub fn stuck_walks(&self) -> impl Iterator<Item = usize> + '_ {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, WalkOutcome::Stuck { .. }))
            .map(WalkOutcome::walk)
    }

    pub fn is_complete(&self) -> bool {
        self.stuck_walks().next().is_none()
    }
}

struct EngineState {
    walks: Vec<Walk>,
    obstacles: Vec<Segment>,
    index: SpatialIndex,
    rng: ChaCha12Rng,
    tick_index: u64,
    total_stuck_events: u64,
}

/// Owns every walk and the shared spatial index.
///
/// All state sits behind one mutex and a tick holds it for its full duration,
/// so readers (snapshots, audits, redraws) only ever observe whole ticks.
pub struct GrowthEngine {
    config: WalkConfig,
    state: Mutex<EngineState>,
}

/// Build an engine from the three core parameters and defaults for the rest.
pub fn initialize(
    num_walks: usize,
    origin: Point,
    step_size: f64,
) -> Result<GrowthEngine, ConfigError> {
    GrowthEngine::try_new(WalkConfig {
        num_walks,
        origin,
        step_size,
        ..WalkConfig::default()
    })
}

impl GrowthEngine {
    pub const MAX_RUN_TICKS: usize = 1_000_000;
    pub const MAX_RUN_SAMPLES: usize = 50_000;

    pub fn try_new(config: WalkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let walks = (0..config.num_walks)
            .map(|id| Walk::new(id, config.origin))
            .collect();
        info!(
            walks = config.num_walks,
            step_size = config.step_size,
            origin_x = config.origin.x,
            origin_y = config.origin.y,
            max_attempts = ?config.max_attempts,
            seed = config.seed,
            "growth engine initialized"
        );
        Ok(Self {
            state: Mutex::new(EngineState {
                walks,
                obstacles: Vec::new(),
                index: SpatialIndex::new(config.step_size),
                rng: ChaCha12Rng::seed_from_u64(config.seed),
                tick_index: 0,
                total_stuck_events: 0,
            }),
            config,
        })
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Advance every walk by one step inside a single critical section.
    pub fn tick(&self) -> TickReport {
        let total_start = Instant::now();
        let mut guard = self.state.lock();
        let lock_wait_us = total_start.elapsed().as_micros() as u64;

        let state = &mut *guard;
        state.tick_index += 1;
        let tick = state.tick_index;

        let t0 = Instant::now();
        let mut outcomes = Vec::with_capacity(state.walks.len());
        for walk in &mut state.walks {
            let outcome = advance_walk(
                walk,
                &mut state.index,
                &mut state.rng,
                self.config.step_size,
                self.config.max_attempts,
            );
            if let WalkOutcome::Stuck { walk, attempts } = outcome {
                state.total_stuck_events += 1;
                warn!(tick, walk, attempts, "walk stuck: no free direction found");
            }
            outcomes.push(outcome);
        }
        let sampling_us = t0.elapsed().as_micros() as u64;
        let total_segments = state.index.len();
        let occupied_buckets = state.index.bucket_count();
        drop(guard);

        let report = TickReport {
            tick,
            outcomes,
            total_segments,
            occupied_buckets,
            timings: TickTimings {
                lock_wait_us,
                sampling_us,
                total_us: total_start.elapsed().as_micros() as u64,
            },
        };
        debug!(
            tick,
            accepted = report.outcomes.len() - report.stuck_walks().count(),
            total_segments,
            occupied_buckets,
            "tick complete"
        );
        report
    }

    /// Seed the index with a fixed segment owned by no walk. Placed unchecked:
    /// it may cross segments that already exist.
    pub fn insert_obstacle(&self, segment: Segment) -> Result<SegmentId, GrowthError> {
        if !segment.is_finite() {
            return Err(GrowthError::NonFiniteObstacle);
        }
        let length = segment.length();
        if length > self.config.step_size {
            return Err(GrowthError::ObstacleTooLong {
                length,
                max: self.config.step_size,
            });
        }
        let mut state = self.state.lock();
        let id = SegmentId {
            owner: SegmentOwner::Obstacle,
            seq: state.obstacles.len(),
        };
        state.obstacles.push(segment);
        state.index.insert(id, segment);
        Ok(id)
    }

    /// Whether `candidate` would be rejected as a next step from its start point.
    pub fn crosses_existing(&self, candidate: &Segment) -> bool {
        let state = self.state.lock();
        find_blocker(&state.index, candidate).is_some()
    }

    pub fn tick_count(&self) -> u64 {
        self.state.lock().tick_index
    }

    pub fn total_stuck_events(&self) -> u64 {
        self.state.lock().total_stuck_events
    }

    pub fn walk_lengths(&self) -> Vec<usize> {
        self.state.lock().walks.iter().map(Walk::len).collect()
    }

    pub fn index_len(&self) -> usize {
        self.state.lock().index.len()
    }

    /// Every stored segment with its owner, sorted by id.
    pub fn indexed_segments(&self) -> Vec<IndexedSegment> {
        let mut segments: Vec<IndexedSegment> = self.state.lock().index.iter().copied().collect();
        segments.sort_unstable_by_key(|s| s.id);
        segments
    }

    /// Consistent copy of all walks and obstacles, taken between ticks.
    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.state.lock();
        EngineSnapshot {
            tick: state.tick_index,
            step_size: self.config.step_size,
            walks: state.walks.clone(),
            obstacles: state.obstacles.clone(),
        }
    }

    /// Independent all-pairs check that no two stored segments cross, other
    /// than pairs joined at a shared endpoint.
    pub fn audit(&self) -> Vec<Crossing> {
        let segments = self.indexed_segments();
        audit::find_crossings(&segments)
    }

    /// Run `ticks` ticks, sampling metrics every `sample_every` ticks and on the last one.
    pub fn try_run(&self, ticks: usize, sample_every: usize) -> Result<RunSummary, RunError> {
        if sample_every == 0 {
            return Err(RunError::InvalidSampleEvery);
        }
        if ticks > Self::MAX_RUN_TICKS {
            return Err(RunError::TooManyTicks {
                max: Self::MAX_RUN_TICKS,
                actual: ticks,
            });
        }
        let estimated_samples = if ticks == 0 {
            0
        } else {
            ((ticks - 1) / sample_every) + 1
        };
        if estimated_samples > Self::MAX_RUN_SAMPLES {
            return Err(RunError::TooManySamples {
                max: Self::MAX_RUN_SAMPLES,
                actual: estimated_samples,
            });
        }

        let mut samples = Vec::with_capacity(estimated_samples);
        let mut stuck_events = 0;
        for step in 1..=ticks {
            let report = self.tick();
            stuck_events += report.stuck_walks().count();
            if step % sample_every == 0 || step == ticks {
                samples.push(TickMetrics::from(&report));
            }
        }
        Ok(RunSummary {
            schema_version: 1,
            ticks,
            sample_every,
            stuck_events,
            final_walk_lengths: self.walk_lengths(),
            samples,
        })
    }
}

/// First stored segment near `candidate` that it crosses.
///
/// Stored segments anchored at the candidate's start point are skipped: the
/// walk's own previous step, and sibling walks leaving a shared origin. They can
/// only meet the candidate at that point.
pub(crate) fn find_blocker<'a>(
    index: &'a SpatialIndex,
    candidate: &Segment,
) -> Option<&'a IndexedSegment> {
    let head = candidate.start();
    index
        .segments_near(candidate)
        .filter(|stored| !stored.segment.has_endpoint(head))
        .find(|stored| geometry::intersects(&stored.segment, candidate))
}

/// Rejection-sample one step for `walk`, storing it on success.
fn advance_walk<R: Rng + ?Sized>(
    walk: &mut Walk,
    index: &mut SpatialIndex,
    rng: &mut R,
    step_size: f64,
    max_attempts: Option<u64>,
) -> WalkOutcome {
    let head = walk.head();
    let mut attempts = 0u64;
    loop {
        if max_attempts.is_some_and(|max| attempts >= max) {
            walk.record_stuck();
            return WalkOutcome::Stuck {
                walk: walk.id(),
                attempts,
            };
        }
        attempts += 1;

        let angle = rng.random_range(0.0..TAU);
        let candidate = Segment::from_polar(head, angle, step_size);
        if find_blocker(index, &candidate).is_some() {
            continue;
        }

        let id = walk.push(candidate);
        index.insert(id, candidate);
        return WalkOutcome::Accepted {
            walk: walk.id(),
            segment: candidate,
            attempts,
        };
    }
}
