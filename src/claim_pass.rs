//! Single-pass neighbor claim.
//!
//! Vertices are striped across workers and every worker claims the unclaimed
//! out-neighbors of the vertices it owns. Each vertex receives at most one
//! parent and never itself, but only one hop is ever explored: the result is
//! generally not a BFS forest and its hop distances are not shortest paths.
//! Kept as a throughput baseline next to [`crate::bfs::LevelSyncBfs`].

use std::{
    sync::atomic::{AtomicI64, Ordering},
    thread,
    time::Instant,
};

use tracing::{debug, info};

use crate::{
    bfs::{NO_PARENT, ParentArray, VertexFlags},
    errors::DenseGraphError,
    matrix::AdjacencyMatrix,
    partition::{join_workers, require_workers, stripe},
};

pub fn single_pass_claim(
    graph: &AdjacencyMatrix,
    threads: usize,
) -> Result<ParentArray, DenseGraphError> {
    require_workers(threads, "single-pass claim")?;
    let started = Instant::now();
    let vertices = graph.vertices();
    let claimed = VertexFlags::new(vertices);
    let parents: Vec<AtomicI64> = (0..vertices).map(|_| AtomicI64::new(NO_PARENT)).collect();
    let stripes = stripe(0..vertices, threads);
    thread::scope(|scope| {
        let claimed = &claimed;
        let parents = &parents;
        let handles = stripes
            .into_iter()
            .enumerate()
            .filter(|(_, owned)| !owned.is_empty())
            .map(|(worker, owned)| {
                scope.spawn(move || {
                    let mut claims = 0usize;
                    for vertex in owned {
                        for neighbor in graph.neighbors(vertex) {
                            if neighbor != vertex && claimed.try_claim(neighbor) {
                                parents[neighbor].store(vertex as i64, Ordering::Relaxed);
                                claims += 1;
                            }
                        }
                    }
                    debug!(worker, claims, "claim worker finished");
                })
            })
            .collect();
        join_workers(handles)
    })?;
    let parents = parents.into_iter().map(AtomicI64::into_inner).collect();
    info!(vertices, threads, elapsed = ?started.elapsed(), "single-pass claim finished");
    Ok(ParentArray::from_raw(parents))
}
