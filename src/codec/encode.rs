use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    thread,
    time::Instant,
};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, info};

use super::{RowLayout, SEPARATOR, TERMINATOR, reorder::ReorderBuffer};
use crate::{
    errors::DenseGraphError,
    matrix::AdjacencyMatrix,
    partition::{join_workers, require_workers},
};

/// Renders one matrix row as `('0'|'1') ' '` per cell followed by `'\n'`.
pub fn render_row(row: &[bool], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(row.len() * 2 + 1);
    for &cell in row {
        out.push(if cell { b'1' } else { b'0' });
        out.push(SEPARATOR);
    }
    out.push(TERMINATOR);
}

/// Encodes `graph` into `writer` and hands the writer back once flushed.
pub fn encode_to<W: Write>(
    graph: &AdjacencyMatrix,
    writer: W,
    threads: usize,
) -> Result<W, DenseGraphError> {
    encode_stream(graph, writer, threads, DenseGraphError::stream)
}

pub fn encode_file<P: AsRef<Path>>(
    graph: &AdjacencyMatrix,
    path: P,
    threads: usize,
) -> Result<(), DenseGraphError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| DenseGraphError::io(path, e))?;
    encode_stream(graph, BufWriter::new(file), threads, |e| {
        DenseGraphError::io(path, e)
    })?;
    Ok(())
}

fn encode_stream<W, F>(
    graph: &AdjacencyMatrix,
    mut writer: W,
    threads: usize,
    io_error: F,
) -> Result<W, DenseGraphError>
where
    W: Write,
    F: Fn(io::Error) -> DenseGraphError,
{
    require_workers(threads, "matrix encoding")?;
    let started = Instant::now();
    let rows = graph.vertices();
    let layout = RowLayout::for_vertices(rows);
    writer
        .write_all(layout.header().as_bytes())
        .map_err(&io_error)?;
    if rows > 0 {
        let (job_tx, job_rx) = channel::unbounded();
        for row in 0..rows {
            job_tx
                .send(row)
                .map_err(|_| DenseGraphError::worker("row job queue closed"))?;
        }
        drop(job_tx);
        let workers = threads.min(rows);
        thread::scope(|scope| {
            let (ready_tx, ready_rx) = channel::bounded(workers * 2);
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let jobs = job_rx.clone();
                    let ready = ready_tx.clone();
                    scope.spawn(move || render_worker(worker, graph, jobs, ready))
                })
                .collect();
            drop(ready_tx);
            let flushed = flush_in_order(&mut writer, rows, &ready_rx, &io_error);
            drop(ready_rx);
            join_workers(handles)?;
            flushed
        })?;
    }
    writer.flush().map_err(&io_error)?;
    info!(vertices = rows, threads, elapsed = ?started.elapsed(), "graph encoded");
    Ok(writer)
}

/// Sole owner of the output stream: rows are written strictly in ascending
/// order, parking early completions until the gap before them closes.
fn flush_in_order<W, F>(
    writer: &mut W,
    rows: usize,
    ready: &Receiver<(usize, Vec<u8>)>,
    io_error: &F,
) -> Result<(), DenseGraphError>
where
    W: Write,
    F: Fn(io::Error) -> DenseGraphError,
{
    let mut reorder = ReorderBuffer::new();
    let mut peak_pending = 0usize;
    while reorder.next_index() < rows {
        let (row, buffer) = ready.recv().map_err(|_| {
            DenseGraphError::worker("encoding workers exited before every row was rendered")
        })?;
        reorder.insert(row, buffer)?;
        peak_pending = peak_pending.max(reorder.pending());
        while let Some(buffer) = reorder.pop_ready() {
            writer.write_all(&buffer).map_err(io_error)?;
        }
    }
    debug!(rows, peak_pending, "ordered flush complete");
    Ok(())
}

fn render_worker(
    worker: usize,
    graph: &AdjacencyMatrix,
    jobs: Receiver<usize>,
    ready: Sender<(usize, Vec<u8>)>,
) {
    let started = Instant::now();
    let mut rendered = 0usize;
    for row in jobs.iter() {
        let mut buffer = Vec::new();
        render_row(graph.row(row), &mut buffer);
        if ready.send((row, buffer)).is_err() {
            return;
        }
        rendered += 1;
    }
    debug!(worker, rows = rendered, elapsed = ?started.elapsed(), "encoding worker finished");
}
