//! Blocked-cell registry.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Cells rendered impassable by a blocking event, keyed by cell key with the
/// block's expiry timestamp.
///
/// Written by the event manager, read on every contested move. Expired
/// entries are cleared lazily on lookup and wholesale at snapshot time.
#[derive(Debug, Default)]
pub struct BlockedCells {
    cells: Mutex<HashMap<usize, u64>>,
}

impl BlockedCells {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` impassable until `expiry_ms`.
    pub fn block(&self, key: usize, expiry_ms: u64) {
        self.cells.lock().insert(key, expiry_ms);
    }

    /// Whether `key` is blocked at `now_ms`. A block whose expiry has just
    /// passed is removed here rather than waiting for the next purge.
    pub fn is_blocked(&self, key: usize, now_ms: u64) -> bool {
        let mut cells = self.cells.lock();
        match cells.get(&key) {
            Some(&expiry) if now_ms < expiry => true,
            Some(_) => {
                cells.remove(&key);
                false
            }
            None => false,
        }
    }

    /// Drop every block whose expiry has passed.
    pub fn purge_expired(&self, now_ms: u64) {
        self.cells.lock().retain(|_, &mut expiry| now_ms < expiry);
    }

    pub fn len(&self) -> usize {
        self.cells.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.lock().is_empty()
    }

    pub fn clear(&self) {
        self.cells.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_and_lazy_clear() {
        let blocked = BlockedCells::new();
        blocked.block(42, 1_000);

        assert!(blocked.is_blocked(42, 500));
        assert!(blocked.is_blocked(42, 999));
        // Expiry reached: unblocked and entry removed.
        assert!(!blocked.is_blocked(42, 1_000));
        assert!(blocked.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let blocked = BlockedCells::new();
        blocked.block(1, 1_000);
        blocked.block(2, 5_000);

        blocked.purge_expired(2_000);
        assert_eq!(blocked.len(), 1);
        assert!(blocked.is_blocked(2, 2_000));
        assert!(!blocked.is_blocked(1, 2_000));
    }

    #[test]
    fn test_unknown_cell_not_blocked() {
        let blocked = BlockedCells::new();
        assert!(!blocked.is_blocked(7, 0));
    }
}
