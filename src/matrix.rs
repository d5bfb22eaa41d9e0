use crate::errors::DenseGraphError;

/// Dense V×V adjacency matrix stored row-major. Cell `(i, j)` is a directed
/// edge `i -> j`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjacencyMatrix {
    vertices: usize,
    cells: Vec<bool>,
}

impl AdjacencyMatrix {
    pub fn new(vertices: usize) -> Result<Self, DenseGraphError> {
        let len = vertices
            .checked_mul(vertices)
            .ok_or(DenseGraphError::Allocation { vertices })?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| DenseGraphError::Allocation { vertices })?;
        cells.resize(len, false);
        Ok(Self { vertices, cells })
    }

    pub fn from_edges(vertices: usize, edges: &[(usize, usize)]) -> Result<Self, DenseGraphError> {
        let mut matrix = Self::new(vertices)?;
        for &(from, to) in edges {
            if from >= vertices || to >= vertices {
                return Err(DenseGraphError::contract(format!(
                    "edge {from}->{to} outside {vertices} vertices"
                )));
            }
            matrix.set_edge(from, to, true);
        }
        Ok(matrix)
    }

    pub fn vertices(&self) -> usize {
        self.vertices
    }

    pub fn is_empty(&self) -> bool {
        self.vertices == 0
    }

    #[inline]
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.cells[from * self.vertices + to]
    }

    pub fn set_edge(&mut self, from: usize, to: usize, present: bool) {
        self.cells[from * self.vertices + to] = present;
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[bool] {
        let start = row * self.vertices;
        &self.cells[start..start + self.vertices]
    }

    /// Out-neighbors of `vertex` in ascending order.
    pub fn neighbors(&self, vertex: usize) -> impl Iterator<Item = usize> + '_ {
        self.row(vertex)
            .iter()
            .enumerate()
            .filter_map(|(col, &edge)| edge.then_some(col))
    }

    pub fn out_degree(&self, vertex: usize) -> usize {
        self.row(vertex).iter().filter(|&&edge| edge).count()
    }

    pub fn edge_count(&self) -> usize {
        self.cells.iter().filter(|&&edge| edge).count()
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.vertices)
            .all(|i| (i + 1..self.vertices).all(|j| self.has_edge(i, j) == self.has_edge(j, i)))
    }

    /// Disjoint mutable row slices, one per vertex.
    pub(crate) fn rows_mut(&mut self) -> Vec<&mut [bool]> {
        if self.vertices == 0 {
            return Vec::new();
        }
        self.cells.chunks_mut(self.vertices).collect()
    }
}
