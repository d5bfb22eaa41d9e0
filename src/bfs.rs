//! Breadth-first traversal producing parent forests over an [`AdjacencyMatrix`].
//!
//! [`serial_bfs`] is the single-threaded reference. [`LevelSyncBfs`] explores one
//! BFS level at a time with a fixed worker pool; every level is fully drained
//! before the next begins, so each parent pointer lies on a shortest path.

use std::{
    collections::VecDeque,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info};

use crate::{
    errors::DenseGraphError,
    matrix::AdjacencyMatrix,
    partition::{join_workers, require_workers},
};

/// Parent value of roots and of vertices no traversal reached.
pub const NO_PARENT: i64 = -1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentArray {
    parents: Vec<i64>,
}

impl ParentArray {
    pub(crate) fn unassigned(vertices: usize) -> Self {
        Self {
            parents: vec![NO_PARENT; vertices],
        }
    }

    pub(crate) fn from_raw(parents: Vec<i64>) -> Self {
        Self { parents }
    }

    pub(crate) fn assign(&mut self, vertex: usize, parent: usize) {
        debug_assert_eq!(self.parents[vertex], NO_PARENT, "parent written twice");
        self.parents[vertex] = parent as i64;
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.parents
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn parent_of(&self, vertex: usize) -> Option<usize> {
        match self.parents.get(vertex) {
            Some(&parent) if parent != NO_PARENT => Some(parent as usize),
            _ => None,
        }
    }

    /// Number of parent hops from each vertex to the root of its tree. A
    /// vertex whose chain loops back on itself counts as a root.
    pub fn hop_distances(&self) -> Vec<usize> {
        const UNKNOWN: usize = usize::MAX;
        let len = self.parents.len();
        let mut distances = vec![UNKNOWN; len];
        let mut on_chain = vec![false; len];
        let mut chain = Vec::new();
        for start in 0..len {
            let mut current = start;
            let mut depth = loop {
                if distances[current] != UNKNOWN {
                    break Some(distances[current]);
                }
                on_chain[current] = true;
                chain.push(current);
                match self.parent_of(current) {
                    Some(parent) if parent < len && !on_chain[parent] => current = parent,
                    _ => break None,
                }
            };
            while let Some(vertex) = chain.pop() {
                let distance = depth.map_or(0, |d| d + 1);
                distances[vertex] = distance;
                on_chain[vertex] = false;
                depth = Some(distance);
            }
        }
        distances
    }

    /// Vertices from the root of `vertex`'s tree down to `vertex`.
    pub fn path_to(&self, vertex: usize) -> Vec<usize> {
        if vertex >= self.parents.len() {
            return Vec::new();
        }
        let mut path = vec![vertex];
        let mut current = vertex;
        while let Some(parent) = self.parent_of(current) {
            if path.len() > self.parents.len() {
                break;
            }
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Writes one `"<vertex> <parent>"` line per vertex.
    pub fn write_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        for (vertex, parent) in self.parents.iter().enumerate() {
            writeln!(out, "{vertex} {parent}")?;
        }
        out.flush()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DenseGraphError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| DenseGraphError::io(path, e))?;
        self.write_to(BufWriter::new(file))
            .map_err(|e| DenseGraphError::io(path, e))
    }
}

pub fn serial_bfs(graph: &AdjacencyMatrix) -> ParentArray {
    let vertices = graph.vertices();
    let mut parents = ParentArray::unassigned(vertices);
    let mut visited = vec![false; vertices];
    let mut queue = VecDeque::new();
    for root in 0..vertices {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        queue.push_back(root);
        while let Some(vertex) = queue.pop_front() {
            for next in graph.neighbors(vertex) {
                if !visited[next] {
                    visited[next] = true;
                    parents.assign(next, vertex);
                    queue.push_back(next);
                }
            }
        }
    }
    parents
}

/// One flag per vertex, set at most once through [`VertexFlags::try_claim`].
pub(crate) struct VertexFlags {
    flags: Vec<AtomicBool>,
}

impl VertexFlags {
    pub(crate) fn new(vertices: usize) -> Self {
        Self {
            flags: (0..vertices).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    #[inline]
    pub(crate) fn is_set(&self, vertex: usize) -> bool {
        self.flags[vertex].load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn set(&self, vertex: usize) {
        self.flags[vertex].store(true, Ordering::Release);
    }

    /// True for exactly one caller per vertex.
    #[inline]
    pub(crate) fn try_claim(&self, vertex: usize) -> bool {
        self.flags[vertex]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

struct Round {
    jobs: Receiver<usize>,
    claimed: Arc<VertexFlags>,
}

enum Report {
    Discovered { vertex: usize, parent: usize },
    Done,
    Failed { worker: usize },
}

type LevelWorker = fn(usize, &AdjacencyMatrix, &VertexFlags, Receiver<Round>, Sender<Report>);

/// Tells the coordinator a worker is unwinding so the barrier does not wait on it.
struct PanicReporter {
    worker: usize,
    reports: Sender<Report>,
}

impl Drop for PanicReporter {
    fn drop(&mut self) {
        if thread::panicking() {
            let report = Report::Failed {
                worker: self.worker,
            };
            if self.reports.send(report).is_err() {
                debug!(worker = self.worker, "coordinator gone before panic report");
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct TraversalStats {
    roots: usize,
    levels: usize,
    reached: usize,
}

#[derive(Clone, Debug)]
pub struct LevelSyncBfs {
    threads: usize,
    round_timeout: Option<Duration>,
}

impl LevelSyncBfs {
    pub fn new(threads: usize) -> Result<Self, DenseGraphError> {
        require_workers(threads, "level-synchronized BFS")?;
        Ok(Self {
            threads,
            round_timeout: None,
        })
    }

    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = Some(timeout);
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Traverses every component, taking the lowest unvisited index as the next root.
    pub fn run(&self, graph: &AdjacencyMatrix) -> Result<ParentArray, DenseGraphError> {
        let roots: Vec<usize> = (0..graph.vertices()).collect();
        self.traverse(graph, &roots)
    }

    /// Traverses only from `roots`, in order; vertices they cannot reach keep [`NO_PARENT`].
    pub fn run_from(
        &self,
        graph: &AdjacencyMatrix,
        roots: &[usize],
    ) -> Result<ParentArray, DenseGraphError> {
        if let Some(&root) = roots.iter().find(|&&root| root >= graph.vertices()) {
            return Err(DenseGraphError::contract(format!(
                "root {root} outside {} vertices",
                graph.vertices()
            )));
        }
        self.traverse(graph, roots)
    }

    fn traverse(
        &self,
        graph: &AdjacencyMatrix,
        roots: &[usize],
    ) -> Result<ParentArray, DenseGraphError> {
        self.traverse_with(graph, roots, level_worker)
    }

    fn traverse_with(
        &self,
        graph: &AdjacencyMatrix,
        roots: &[usize],
        worker_fn: LevelWorker,
    ) -> Result<ParentArray, DenseGraphError> {
        let started = Instant::now();
        let mut parents = ParentArray::unassigned(graph.vertices());
        if graph.is_empty() {
            return Ok(parents);
        }
        let visited = VertexFlags::new(graph.vertices());
        let (report_tx, report_rx) = channel::unbounded();
        let stats = thread::scope(|scope| {
            let mut controls = Vec::with_capacity(self.threads);
            let mut handles = Vec::with_capacity(self.threads);
            for worker in 0..self.threads {
                let (control_tx, control_rx) = channel::bounded(1);
                let reports = report_tx.clone();
                let visited = &visited;
                controls.push(control_tx);
                handles.push(
                    scope.spawn(move || worker_fn(worker, graph, visited, control_rx, reports)),
                );
            }
            drop(report_tx);
            let outcome = self.coordinate(roots, &visited, &controls, &report_rx, &mut parents);
            drop(controls);
            let joined = join_workers(handles);
            let stats = outcome?;
            joined?;
            Ok::<_, DenseGraphError>(stats)
        })?;
        info!(
            vertices = graph.vertices(),
            threads = self.threads,
            roots = stats.roots,
            levels = stats.levels,
            reached = stats.reached,
            elapsed = ?started.elapsed(),
            "level-synchronized traversal finished"
        );
        Ok(parents)
    }

    fn coordinate(
        &self,
        roots: &[usize],
        visited: &VertexFlags,
        controls: &[Sender<Round>],
        reports: &Receiver<Report>,
        parents: &mut ParentArray,
    ) -> Result<TraversalStats, DenseGraphError> {
        let vertices = parents.len();
        let mut stats = TraversalStats::default();
        for &root in roots {
            if visited.is_set(root) {
                continue;
            }
            visited.set(root);
            stats.roots += 1;
            stats.reached += 1;
            let mut frontier = vec![root];
            let mut level = 0usize;
            while !frontier.is_empty() {
                let claimed = Arc::new(VertexFlags::new(vertices));
                let (job_tx, job_rx) = channel::unbounded();
                let width = frontier.len();
                for vertex in frontier.drain(..) {
                    job_tx
                        .send(vertex)
                        .map_err(|_| DenseGraphError::worker("level job queue closed"))?;
                }
                drop(job_tx);
                for control in controls {
                    control
                        .send(Round {
                            jobs: job_rx.clone(),
                            claimed: Arc::clone(&claimed),
                        })
                        .map_err(|_| DenseGraphError::worker("traversal worker exited early"))?;
                }
                drop(job_rx);
                let next = self.await_level(level, reports, parents)?;
                for &vertex in &next {
                    visited.set(vertex);
                }
                debug!(root, level, width, discovered = next.len(), "level complete");
                stats.reached += next.len();
                frontier = next;
                level += 1;
            }
            stats.levels = stats.levels.max(level);
        }
        Ok(stats)
    }

    /// Collects discoveries until every worker has reported `Done` for this level.
    fn await_level(
        &self,
        level: usize,
        reports: &Receiver<Report>,
        parents: &mut ParentArray,
    ) -> Result<Vec<usize>, DenseGraphError> {
        let deadline = self.round_timeout.map(|timeout| (Instant::now() + timeout, timeout));
        let mut next = Vec::new();
        let mut done = 0usize;
        while done < self.threads {
            let report = match deadline {
                Some((deadline, timeout)) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    reports.recv_timeout(remaining).map_err(|err| match err {
                        RecvTimeoutError::Timeout => DenseGraphError::RoundTimeout {
                            level,
                            pending: self.threads - done,
                            waited: timeout,
                        },
                        RecvTimeoutError::Disconnected => {
                            DenseGraphError::worker("traversal workers disconnected")
                        }
                    })?
                }
                None => reports
                    .recv()
                    .map_err(|_| DenseGraphError::worker("traversal workers disconnected"))?,
            };
            match report {
                Report::Discovered { vertex, parent } => {
                    parents.assign(vertex, parent);
                    next.push(vertex);
                }
                Report::Done => done += 1,
                Report::Failed { worker } => {
                    return Err(DenseGraphError::worker(format!(
                        "traversal worker-{worker} panicked during level {level}"
                    )));
                }
            }
        }
        Ok(next)
    }
}

fn level_worker(
    worker: usize,
    graph: &AdjacencyMatrix,
    visited: &VertexFlags,
    rounds: Receiver<Round>,
    reports: Sender<Report>,
) {
    debug!(worker, "starting traversal worker");
    let _reporter = PanicReporter {
        worker,
        reports: reports.clone(),
    };
    let mut explored = 0usize;
    for round in rounds.iter() {
        for vertex in round.jobs.iter() {
            visited.set(vertex);
            explored += 1;
            for neighbor in graph.neighbors(vertex) {
                if visited.is_set(neighbor) || !round.claimed.try_claim(neighbor) {
                    continue;
                }
                let report = Report::Discovered {
                    vertex: neighbor,
                    parent: vertex,
                };
                if reports.send(report).is_err() {
                    return;
                }
            }
        }
        if reports.send(Report::Done).is_err() {
            return;
        }
    }
    debug!(worker, explored, "traversal worker finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_claim_is_exclusive() {
        let flags = VertexFlags::new(2);
        assert!(flags.try_claim(1));
        assert!(!flags.try_claim(1));
        assert!(flags.is_set(1));
        assert!(!flags.is_set(0));
    }

    #[test]
    fn test_hop_distances_follow_chain() {
        let parents = ParentArray::from_raw(vec![NO_PARENT, 0, 1, 0, NO_PARENT]);
        assert_eq!(parents.hop_distances(), vec![0, 1, 2, 1, 0]);
        assert_eq!(parents.path_to(2), vec![0, 1, 2]);
    }

    #[test]
    fn test_hop_distances_terminate_on_cycles() {
        let parents = ParentArray::from_raw(vec![1, 0, 0]);
        let distances = parents.hop_distances();
        assert_eq!(distances.len(), 3);
        assert!(distances.iter().all(|&d| d <= 2));
    }

    fn panicking_worker(
        worker: usize,
        _graph: &AdjacencyMatrix,
        _visited: &VertexFlags,
        rounds: Receiver<Round>,
        reports: Sender<Report>,
    ) {
        let _reporter = PanicReporter { worker, reports };
        if rounds.recv().is_ok() && worker == 1 {
            panic!("worker {worker} lost its row");
        }
    }

    #[test]
    fn test_worker_panic_fails_level_instead_of_hanging() {
        let graph = AdjacencyMatrix::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        let bfs = LevelSyncBfs::new(3).unwrap();
        let err = bfs.traverse_with(&graph, &[0], panicking_worker).unwrap_err();
        match err {
            DenseGraphError::Worker(msg) => assert!(msg.contains("worker-1"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_write_to_emits_vertex_parent_lines() {
        let parents = ParentArray::from_raw(vec![NO_PARENT, 0]);
        let mut out = Vec::new();
        parents.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 -1\n1 0\n");
    }
}
