//! Phase timing collaborators handed to [`crate::engine::GraphEngine`].

use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Allocation,
    Generation,
    Traversal,
    Encode,
    Decode,
    ParentWrite,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub phase: Phase,
    pub elapsed_ms: f64,
}

pub trait TelemetrySink: Send + Sync {
    fn phase_finished(&self, phase: Phase, elapsed: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn phase_finished(&self, _phase: Phase, _elapsed: Duration) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn phase_finished(&self, phase: Phase, elapsed: Duration) {
        info!(?phase, ?elapsed, "phase finished");
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    timings: Mutex<Vec<PhaseTiming>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<PhaseTiming> {
        self.timings.lock().clone()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.timings.lock().iter().map(|t| t.phase).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.timings.lock())
    }
}

impl TelemetrySink for RecordingSink {
    fn phase_finished(&self, phase: Phase, elapsed: Duration) {
        self.timings.lock().push(PhaseTiming {
            phase,
            elapsed_ms: elapsed.as_secs_f64() * 1_000.0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.phase_finished(Phase::Generation, Duration::from_millis(2));
        sink.phase_finished(Phase::Traversal, Duration::from_millis(1));
        assert_eq!(sink.phases(), vec![Phase::Generation, Phase::Traversal]);
        let json = sink.to_json().unwrap();
        assert!(json.contains("\"Generation\""));
        let parsed: Vec<PhaseTiming> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
    }
}
