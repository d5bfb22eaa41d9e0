use std::{
    thread,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use crossbeam::channel;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::{
    config::{EdgeThreshold, GraphMode},
    errors::DenseGraphError,
    matrix::AdjacencyMatrix,
    partition::{join_workers, require_workers, stripe},
};

const SEED_SPREAD: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Clone, Debug)]
pub struct MatrixGenerator {
    threads: usize,
    threshold: EdgeThreshold,
    mode: GraphMode,
    seed: Option<u64>,
}

impl MatrixGenerator {
    pub fn new(threads: usize) -> Result<Self, DenseGraphError> {
        require_workers(threads, "matrix generation")?;
        Ok(Self {
            threads,
            threshold: EdgeThreshold::NONE,
            mode: GraphMode::Directed,
            seed: None,
        })
    }

    pub fn with_threshold(mut self, threshold: EdgeThreshold) -> Self {
        self.threshold = threshold;
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

    pub fn generate(&self, vertices: usize) -> Result<AdjacencyMatrix, DenseGraphError> {
        let mut matrix = AdjacencyMatrix::new(vertices)?;
        self.fill(&mut matrix)?;
        Ok(matrix)
    }

    /// Overwrites every cell of `matrix` with fresh random edges.
    pub fn fill(&self, matrix: &mut AdjacencyMatrix) -> Result<(), DenseGraphError> {
        let base_seed = self.seed.unwrap_or_else(clock_seed);
        let started = Instant::now();
        match self.mode {
            GraphMode::Directed => self.fill_directed(matrix, base_seed)?,
            GraphMode::Undirected => {
                self.fill_upper_triangle(matrix, base_seed)?;
                self.mirror_upper_triangle(matrix)?;
            }
        }
        info!(
            vertices = matrix.vertices(),
            threads = self.threads,
            mode = ?self.mode,
            threshold = self.threshold.get(),
            elapsed = ?started.elapsed(),
            "graph generated"
        );
        Ok(())
    }

    fn fill_directed(
        &self,
        matrix: &mut AdjacencyMatrix,
        base_seed: u64,
    ) -> Result<(), DenseGraphError> {
        let threshold = self.threshold;
        let stripes = stripe(matrix.rows_mut(), self.threads);
        thread::scope(|scope| {
            let handles = stripes
                .into_iter()
                .enumerate()
                .filter(|(_, rows)| !rows.is_empty())
                .map(|(worker, rows)| {
                    scope.spawn(move || {
                        let started = Instant::now();
                        let mut rng = worker_rng(base_seed, worker);
                        let row_count = rows.len();
                        let mut bytes = Vec::new();
                        for row in rows {
                            bytes.resize(row.len(), 0);
                            rng.fill_bytes(&mut bytes);
                            for (cell, &byte) in row.iter_mut().zip(&bytes) {
                                *cell = threshold.admits(byte);
                            }
                        }
                        debug!(
                            worker,
                            rows = row_count,
                            elapsed = ?started.elapsed(),
                            "generating worker finished"
                        );
                    })
                })
                .collect();
            join_workers(handles).map(|_| ())
        })
    }

    /// Rows are pulled from a shared queue since row `i` only draws the
    /// `V - i - 1` cells right of the diagonal.
    fn fill_upper_triangle(
        &self,
        matrix: &mut AdjacencyMatrix,
        base_seed: u64,
    ) -> Result<(), DenseGraphError> {
        let threshold = self.threshold;
        let (sender, receiver) = channel::unbounded();
        for (idx, row) in matrix.rows_mut().into_iter().enumerate() {
            let (_, upper) = row.split_at_mut(idx);
            sender
                .send(upper)
                .map_err(|_| DenseGraphError::worker("row queue closed"))?;
        }
        drop(sender);
        thread::scope(|scope| {
            let handles = (0..self.threads)
                .map(|worker| {
                    let queue = receiver.clone();
                    scope.spawn(move || {
                        let started = Instant::now();
                        let mut rng = worker_rng(base_seed, worker);
                        let mut bytes = Vec::new();
                        let mut rows = 0usize;
                        for upper in queue.iter() {
                            let (diagonal, rest) = upper.split_at_mut(1);
                            diagonal[0] = true;
                            bytes.resize(rest.len(), 0);
                            rng.fill_bytes(&mut bytes);
                            for (cell, &byte) in rest.iter_mut().zip(&bytes) {
                                *cell = threshold.admits(byte);
                            }
                            rows += 1;
                        }
                        debug!(worker, rows, elapsed = ?started.elapsed(), "upper triangle worker finished");
                    })
                })
                .collect();
            join_workers(handles).map(|_| ())
        })
    }

    /// Copies cell `(i, j)` into `(j, i)` for every `i < j`.
    fn mirror_upper_triangle(&self, matrix: &mut AdjacencyMatrix) -> Result<(), DenseGraphError> {
        let mut lowers = Vec::with_capacity(matrix.vertices());
        let mut uppers: Vec<&[bool]> = Vec::with_capacity(matrix.vertices());
        for (idx, row) in matrix.rows_mut().into_iter().enumerate() {
            let (lower, upper) = row.split_at_mut(idx);
            lowers.push((idx, lower));
            uppers.push(upper);
        }
        let (sender, receiver) = channel::unbounded();
        for entry in lowers.into_iter().rev() {
            sender
                .send(entry)
                .map_err(|_| DenseGraphError::worker("mirror queue closed"))?;
        }
        drop(sender);
        let uppers = &uppers;
        thread::scope(|scope| {
            let handles = (0..self.threads)
                .map(|_| {
                    let queue = receiver.clone();
                    scope.spawn(move || {
                        for (row, lower) in queue.iter() {
                            for (col, cell) in lower.iter_mut().enumerate() {
                                *cell = uppers[col][row - col];
                            }
                        }
                    })
                })
                .collect();
            join_workers(handles).map(|_| ())
        })
    }
}

pub(crate) fn worker_rng(base_seed: u64, worker: usize) -> StdRng {
    StdRng::seed_from_u64(base_seed.wrapping_add((worker as u64).wrapping_mul(SEED_SPREAD)))
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(SEED_SPREAD)
}
