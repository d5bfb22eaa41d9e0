use std::{thread, time::Duration};

use serde::{Deserialize, Serialize};

use crate::errors::DenseGraphError;

pub const DEFAULT_DENSITY_PERCENT: u8 = 20;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphMode {
    #[default]
    Directed,
    Undirected,
}

/// Edge probability on the byte scale: a cell becomes an edge when its random
/// byte is strictly below the threshold. Valid range is `0..=256`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeThreshold(u16);

impl EdgeThreshold {
    pub const NONE: EdgeThreshold = EdgeThreshold(0);
    pub const ALL: EdgeThreshold = EdgeThreshold(256);

    pub fn new(raw: u16) -> Result<Self, DenseGraphError> {
        if raw > Self::ALL.0 {
            return Err(DenseGraphError::config(format!(
                "edge threshold {raw} exceeds 256"
            )));
        }
        Ok(Self(raw))
    }

    pub fn get(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn admits(self, byte: u8) -> bool {
        u16::from(byte) < self.0
    }
}

/// Edge density as a percentage in `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDensity(u8);

impl EdgeDensity {
    pub fn from_percent(percent: u8) -> Result<Self, DenseGraphError> {
        if percent > 100 {
            return Err(DenseGraphError::config(format!(
                "density {percent}% is outside 0-100"
            )));
        }
        Ok(Self(percent))
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// Rescales the percentage onto the byte scale, rounding up: `ceil(pct * 2.56)`.
    pub fn threshold(self) -> EdgeThreshold {
        EdgeThreshold((u16::from(self.0) * 256).div_ceil(100))
    }
}

impl Default for EdgeDensity {
    fn default() -> Self {
        Self(DEFAULT_DENSITY_PERCENT)
    }
}

/// Maps a requested worker count to an effective one; `0` means one worker per core.
pub fn resolve_threads(requested: usize) -> usize {
    if requested != 0 {
        return requested;
    }
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub vertices: usize,
    pub threads: usize,
    pub density: EdgeDensity,
    pub mode: GraphMode,
    pub seed: Option<u64>,
    pub round_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vertices: 0,
            threads: resolve_threads(0),
            density: EdgeDensity::default(),
            mode: GraphMode::Directed,
            seed: None,
            round_timeout: None,
        }
    }
}

impl EngineConfig {
    pub fn new(vertices: usize) -> Self {
        Self {
            vertices,
            ..Self::default()
        }
    }

    pub fn with_threads(mut self, requested: usize) -> Self {
        self.threads = resolve_threads(requested);
        self
    }

    pub fn with_density(mut self, density: EdgeDensity) -> Self {
        self.density = density;
        self
    }

    pub fn with_mode(mut self, mode: GraphMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), DenseGraphError> {
        if self.threads == 0 {
            return Err(DenseGraphError::config("thread count resolved to zero"));
        }
        if self.density.percent() > 100 {
            return Err(DenseGraphError::config("density must be within 0-100"));
        }
        if let Some(timeout) = self.round_timeout {
            if timeout.is_zero() {
                return Err(DenseGraphError::config("round timeout must be positive"));
            }
        }
        Ok(())
    }
}
