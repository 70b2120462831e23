use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    pub num_walks: usize,
    /// Shared starting point of every walk.
    pub origin: Point,
    /// Length of every step, and the edge length of an index bucket.
    pub step_size: f64,
    /// Resample bound per walk per tick. `None` retries forever.
    pub max_attempts: Option<u64>,
    pub seed: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            num_walks: 3,
            origin: Point::new(500.0, 500.0),
            step_size: 20.0,
            max_attempts: Some(10_000),
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("num_walks must be positive")]
    NoWalks,
    #[error("num_walks ({actual}) exceeds supported maximum ({max})")]
    TooManyWalks { max: usize, actual: usize },
    #[error("step_size must be positive and finite, got {0}")]
    InvalidStepSize(f64),
    #[error("origin must be finite, got ({x}, {y})")]
    NonFiniteOrigin { x: f64, y: f64 },
    #[error("max_attempts must be positive when set")]
    ZeroMaxAttempts,
    #[error("origin ({x}, {y}) is too far from zero for step_size {step_size}")]
    OriginOutOfRange { x: f64, y: f64, step_size: f64 },
    #[error("step_size {step_size} vanishes against origin ({x}, {y})")]
    StepBelowPrecision { x: f64, y: f64, step_size: f64 },
}

impl WalkConfig {
    pub const MAX_WALKS: usize = 65_536;
    /// Largest `|origin / step_size|` accepted; keeps bucket keys far from the i64 limits.
    pub const MAX_ORIGIN_CELLS: f64 = 1e15;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_walks == 0 {
            return Err(ConfigError::NoWalks);
        }
        if self.num_walks > Self::MAX_WALKS {
            return Err(ConfigError::TooManyWalks {
                max: Self::MAX_WALKS,
                actual: self.num_walks,
            });
        }
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(ConfigError::InvalidStepSize(self.step_size));
        }
        if !self.origin.is_finite() {
            return Err(ConfigError::NonFiniteOrigin {
                x: self.origin.x,
                y: self.origin.y,
            });
        }
        let (x, y, step_size) = (self.origin.x, self.origin.y, self.step_size);
        if x + step_size == x || y + step_size == y {
            return Err(ConfigError::StepBelowPrecision { x, y, step_size });
        }
        if (x / step_size).abs() > Self::MAX_ORIGIN_CELLS
            || (y / step_size).abs() > Self::MAX_ORIGIN_CELLS
        {
            return Err(ConfigError::OriginOutOfRange { x, y, step_size });
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        Ok(())
    }
}
