use ahash::AHashMap;

use crate::errors::DenseGraphError;

/// Restores index order over items that complete out of order.
///
/// Items are parked in a sparse table until every lower index has been
/// popped; the cursor only ever moves forward.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: usize,
    pending: AHashMap<usize, T>,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(next: usize) -> Self {
        Self {
            next,
            pending: AHashMap::new(),
        }
    }

    pub fn insert(&mut self, index: usize, item: T) -> Result<(), DenseGraphError> {
        if index < self.next || self.pending.contains_key(&index) {
            return Err(DenseGraphError::contract(format!(
                "index {index} already delivered or pending"
            )));
        }
        self.pending.insert(index, item);
        Ok(())
    }

    /// Removes the item at the cursor, if it has arrived, and advances.
    pub fn pop_ready(&mut self) -> Option<T> {
        let item = self.pending.remove(&self.next)?;
        self.next += 1;
        Some(item)
    }

    pub fn next_index(&self) -> usize {
        self.next
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_order_items_released_in_order() {
        let mut buffer = ReorderBuffer::new();
        buffer.insert(2, "c").unwrap();
        buffer.insert(1, "b").unwrap();
        assert_eq!(buffer.pop_ready(), None);
        buffer.insert(0, "a").unwrap();
        let drained: Vec<_> = std::iter::from_fn(|| buffer.pop_ready()).collect();
        assert_eq!(drained, vec!["a", "b", "c"]);
        assert_eq!(buffer.next_index(), 3);
        assert!(buffer.is_drained());
    }

    #[test]
    fn test_stale_and_duplicate_indices_rejected() {
        let mut buffer = ReorderBuffer::new();
        buffer.insert(0, 10).unwrap();
        assert_eq!(buffer.pop_ready(), Some(10));
        assert!(buffer.insert(0, 11).is_err());
        buffer.insert(5, 50).unwrap();
        assert!(buffer.insert(5, 51).is_err());
        assert_eq!(buffer.pending(), 1);
    }

    #[test]
    fn test_gap_holds_back_later_items() {
        let mut buffer = ReorderBuffer::starting_at(4);
        buffer.insert(5, ()).unwrap();
        assert_eq!(buffer.pop_ready(), None);
        assert_eq!(buffer.next_index(), 4);
    }
}
