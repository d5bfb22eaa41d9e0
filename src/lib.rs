//! Dense adjacency-matrix graphs: parallel generation, level-synchronized
//! parallel BFS and an ordered, seekable fixed-width text codec.
//! Run Criterion benchmarks with `cargo bench` to inspect reports under `target/criterion`.

pub mod bfs;
pub mod claim_pass;
pub mod codec;
pub mod config;
pub mod engine;
pub mod errors;
pub mod generator;
pub mod matrix;
mod partition;
pub mod telemetry;

pub use crate::bfs::{LevelSyncBfs, NO_PARENT, ParentArray, serial_bfs};
pub use crate::claim_pass::single_pass_claim;
pub use crate::codec::{
    ReorderBuffer, RowLayout, decode_bytes, decode_file, decode_with, encode_file, encode_to,
};
pub use crate::config::{EdgeDensity, EdgeThreshold, EngineConfig, GraphMode, resolve_threads};
pub use crate::engine::GraphEngine;
pub use crate::errors::DenseGraphError;
pub use crate::generator::MatrixGenerator;
pub use crate::matrix::AdjacencyMatrix;
pub use crate::telemetry::{NullSink, Phase, PhaseTiming, RecordingSink, TelemetrySink, TracingSink};
