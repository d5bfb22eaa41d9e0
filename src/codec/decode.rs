use std::{
    fs::File,
    io::{self, BufReader, Cursor, Read, Seek, SeekFrom},
    path::Path,
    thread,
    time::Instant,
};

use tracing::{debug, info};

use super::{RowLayout, SEPARATOR, TERMINATOR};
use crate::{
    errors::DenseGraphError,
    matrix::AdjacencyMatrix,
    partition::{join_workers, require_workers, stripe},
};

/// Longest accepted header body: the digits of `u64::MAX`.
const MAX_HEADER_DIGITS: usize = 20;

pub fn decode_bytes(bytes: &[u8], threads: usize) -> Result<AdjacencyMatrix, DenseGraphError> {
    decode_with(|| Ok(Cursor::new(bytes)), "buffer", threads)
}

pub fn decode_file<P: AsRef<Path>>(
    path: P,
    threads: usize,
) -> Result<AdjacencyMatrix, DenseGraphError> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    decode_with(|| File::open(path), &origin, threads)
}

/// Decodes from any seekable source. `open` is called once for the header and
/// once per worker, so every worker owns an independent cursor.
pub fn decode_with<F, R>(
    open: F,
    origin: &str,
    threads: usize,
) -> Result<AdjacencyMatrix, DenseGraphError>
where
    F: Fn() -> io::Result<R> + Sync,
    R: Read + Seek,
{
    require_workers(threads, "matrix decoding")?;
    let started = Instant::now();
    let layout = {
        let mut source = open().map_err(|e| DenseGraphError::io(origin, e))?;
        let layout = read_header(&mut source, origin)?;
        let expected = layout
            .total_len()
            .map_err(|_| DenseGraphError::format(origin, "vertex count too large"))?;
        let actual = source
            .seek(SeekFrom::End(0))
            .map_err(|e| DenseGraphError::io(origin, e))?;
        if actual != expected {
            return Err(DenseGraphError::format(
                origin,
                format!(
                    "expected {expected} bytes for {} vertices, found {actual}",
                    layout.vertices
                ),
            ));
        }
        layout
    };

    let mut matrix = AdjacencyMatrix::new(layout.vertices)?;
    let stripes = stripe(matrix.rows_mut().into_iter().enumerate(), threads);
    thread::scope(|scope| {
        let open = &open;
        let handles: Vec<_> = stripes
            .into_iter()
            .enumerate()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(worker, rows)| {
                scope.spawn(move || read_rows(worker, open, origin, layout, threads, rows))
            })
            .collect();
        join_workers(handles)?
            .into_iter()
            .collect::<Result<Vec<()>, DenseGraphError>>()
    })?;
    info!(
        vertices = layout.vertices,
        threads,
        elapsed = ?started.elapsed(),
        "graph decoded"
    );
    Ok(matrix)
}

fn read_header<R: Read>(source: &mut R, origin: &str) -> Result<RowLayout, DenseGraphError> {
    let mut digits = Vec::with_capacity(MAX_HEADER_DIGITS);
    let mut byte = [0u8; 1];
    loop {
        source.read_exact(&mut byte).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                DenseGraphError::format(origin, "header line is not terminated")
            }
            _ => DenseGraphError::io(origin, e),
        })?;
        if byte[0] == TERMINATOR {
            break;
        }
        if digits.len() == MAX_HEADER_DIGITS {
            return Err(DenseGraphError::format(origin, "header line too long"));
        }
        digits.push(byte[0]);
    }
    let canonical = !digits.is_empty()
        && digits.iter().all(u8::is_ascii_digit)
        && (digits.len() == 1 || digits[0] != b'0');
    if !canonical {
        return Err(DenseGraphError::format(
            origin,
            format!("header {:?} is not a vertex count", String::from_utf8_lossy(&digits)),
        ));
    }
    let vertices = std::str::from_utf8(&digits)
        .ok()
        .and_then(|text| text.parse::<usize>().ok())
        .ok_or_else(|| DenseGraphError::format(origin, "vertex count does not fit in memory"))?;
    Ok(RowLayout::for_vertices(vertices))
}

/// Reads the rows of one stripe: seek to the first, then skip the rows owned
/// by the other workers between consecutive reads.
fn read_rows<F, R>(
    worker: usize,
    open: &F,
    origin: &str,
    layout: RowLayout,
    threads: usize,
    rows: Vec<(usize, &mut [bool])>,
) -> Result<(), DenseGraphError>
where
    F: Fn() -> io::Result<R>,
    R: Read + Seek,
{
    let Some(first) = rows.first().map(|(row, _)| *row) else {
        return Ok(());
    };
    let started = Instant::now();
    let io_error = |e| DenseGraphError::io(origin, e);
    let mut reader = BufReader::new(open().map_err(io_error)?);
    reader
        .seek(SeekFrom::Start(layout.row_offset(first)))
        .map_err(io_error)?;
    let stride = i64::try_from(layout.stride(threads))
        .map_err(|_| DenseGraphError::format(origin, "row stride exceeds seek range"))?;
    let mut line = vec![0u8; layout.row_width as usize];
    let count = rows.len();
    for (idx, (row, cells)) in rows.into_iter().enumerate() {
        reader.read_exact(&mut line).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                DenseGraphError::format(origin, format!("row {row} is truncated"))
            }
            _ => DenseGraphError::io(origin, e),
        })?;
        parse_row(&line, cells)
            .map_err(|reason| DenseGraphError::format(origin, format!("row {row}: {reason}")))?;
        if idx + 1 < count && stride > 0 {
            reader.seek_relative(stride).map_err(io_error)?;
        }
    }
    debug!(worker, rows = count, elapsed = ?started.elapsed(), "decoding worker finished");
    Ok(())
}

fn parse_row(line: &[u8], cells: &mut [bool]) -> Result<(), String> {
    let (body, terminator) = line.split_at(line.len() - 1);
    if terminator[0] != TERMINATOR {
        return Err(format!(
            "expected newline at byte {}, found {:#04x}",
            body.len(),
            terminator[0]
        ));
    }
    for (col, (pair, cell)) in body.chunks_exact(2).zip(cells.iter_mut()).enumerate() {
        *cell = match pair[0] {
            b'1' => true,
            b'0' => false,
            other => return Err(format!("expected '0' or '1' at column {col}, found {other:#04x}")),
        };
        if pair[1] != SEPARATOR {
            return Err(format!(
                "expected separator after column {col}, found {:#04x}",
                pair[1]
            ));
        }
    }
    Ok(())
}
