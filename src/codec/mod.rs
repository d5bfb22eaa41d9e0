//! Fixed-width text codec for [`crate::AdjacencyMatrix`].
//!
//! ```text
//! <V>\n
//! <c00> <c01> ... <c0,V-1> \n
//! ...
//! ```
//!
//! Every row is `2V + 1` bytes, so row `k` starts at `header_len + k * row_width`
//! and workers can seek straight to the rows they own.

mod decode;
mod encode;
mod reorder;

pub use decode::{decode_bytes, decode_file, decode_with};
pub use encode::{encode_file, encode_to, render_row};
pub use reorder::ReorderBuffer;

use crate::errors::DenseGraphError;

pub const SEPARATOR: u8 = b' ';
pub const TERMINATOR: u8 = b'\n';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowLayout {
    pub vertices: usize,
    pub header_len: u64,
    pub row_width: u64,
}

impl RowLayout {
    pub fn for_vertices(vertices: usize) -> Self {
        Self {
            vertices,
            header_len: vertices.to_string().len() as u64 + 1,
            row_width: vertices as u64 * 2 + 1,
        }
    }

    pub fn header(&self) -> String {
        format!("{}\n", self.vertices)
    }

    pub fn row_offset(&self, row: usize) -> u64 {
        self.header_len + row as u64 * self.row_width
    }

    /// Bytes a worker skips between two of its rows when `threads` workers interleave.
    pub fn stride(&self, threads: usize) -> u64 {
        self.row_width * threads.saturating_sub(1) as u64
    }

    pub fn total_len(&self) -> Result<u64, DenseGraphError> {
        (self.vertices as u64)
            .checked_mul(self.row_width)
            .and_then(|rows| rows.checked_add(self.header_len))
            .ok_or_else(|| {
                DenseGraphError::contract(format!(
                    "{} vertices exceed the addressable file size",
                    self.vertices
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_offsets() {
        let layout = RowLayout::for_vertices(4);
        assert_eq!(layout.header_len, 2);
        assert_eq!(layout.row_width, 9);
        assert_eq!(layout.row_offset(0), 2);
        assert_eq!(layout.row_offset(3), 29);
        assert_eq!(layout.stride(3), 18);
        assert_eq!(layout.total_len().unwrap(), 38);
    }

    #[test]
    fn test_layout_for_multi_digit_header() {
        let layout = RowLayout::for_vertices(1000);
        assert_eq!(layout.header_len, 5);
        assert_eq!(layout.header(), "1000\n");
        assert_eq!(layout.row_width, 2001);
    }

    #[test]
    fn test_empty_layout() {
        let layout = RowLayout::for_vertices(0);
        assert_eq!(layout.header(), "0\n");
        assert_eq!(layout.total_len().unwrap(), 2);
        assert_eq!(layout.stride(1), 0);
    }
}
