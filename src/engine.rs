use std::{path::Path, sync::Arc, time::Instant};

use tracing::info;

use crate::{
    bfs::{LevelSyncBfs, ParentArray},
    codec::{decode_file, encode_file},
    config::EngineConfig,
    errors::DenseGraphError,
    generator::MatrixGenerator,
    matrix::AdjacencyMatrix,
    telemetry::{NullSink, Phase, TelemetrySink},
};

/// Drives generation, persistence and traversal for one configuration.
pub struct GraphEngine {
    config: EngineConfig,
    telemetry: Arc<dyn TelemetrySink>,
}

impl GraphEngine {
    pub fn new(config: EngineConfig) -> Result<Self, DenseGraphError> {
        config.validate()?;
        Ok(Self {
            config,
            telemetry: Arc::new(NullSink),
        })
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn generate(&self) -> Result<AdjacencyMatrix, DenseGraphError> {
        let mut matrix = self.timed(Phase::Allocation, || {
            AdjacencyMatrix::new(self.config.vertices)
        })?;
        let mut generator = MatrixGenerator::new(self.config.threads)?
            .with_threshold(self.config.density.threshold())
            .with_mode(self.config.mode);
        if let Some(seed) = self.config.seed {
            generator = generator.with_seed(seed);
        }
        self.timed(Phase::Generation, || generator.fill(&mut matrix))?;
        Ok(matrix)
    }

    pub fn traverse(&self, graph: &AdjacencyMatrix) -> Result<ParentArray, DenseGraphError> {
        let mut bfs = LevelSyncBfs::new(self.config.threads)?;
        if let Some(timeout) = self.config.round_timeout {
            bfs = bfs.with_round_timeout(timeout);
        }
        self.timed(Phase::Traversal, || bfs.run(graph))
    }

    pub fn save_graph<P: AsRef<Path>>(
        &self,
        graph: &AdjacencyMatrix,
        path: P,
    ) -> Result<(), DenseGraphError> {
        let path = path.as_ref();
        self.timed(Phase::Encode, || encode_file(graph, path, self.config.threads))?;
        info!(path = %path.display(), "graph saved");
        Ok(())
    }

    pub fn load_graph<P: AsRef<Path>>(&self, path: P) -> Result<AdjacencyMatrix, DenseGraphError> {
        let path = path.as_ref();
        let graph = self.timed(Phase::Decode, || decode_file(path, self.config.threads))?;
        info!(path = %path.display(), vertices = graph.vertices(), "graph loaded");
        Ok(graph)
    }

    pub fn save_parents<P: AsRef<Path>>(
        &self,
        parents: &ParentArray,
        path: P,
    ) -> Result<(), DenseGraphError> {
        let path = path.as_ref();
        self.timed(Phase::ParentWrite, || parents.save(path))?;
        info!(path = %path.display(), "parent array saved");
        Ok(())
    }

    fn timed<T, F>(&self, phase: Phase, op: F) -> Result<T, DenseGraphError>
    where
        F: FnOnce() -> Result<T, DenseGraphError>,
    {
        let started = Instant::now();
        let value = op()?;
        self.telemetry.phase_finished(phase, started.elapsed());
        Ok(value)
    }
}
