//! Active index: the single cursor deciding which line is in focus.
//!
//! All input channels (keyboard, pointer) go through [`reduce`], which keeps
//! the index saturated inside `[0, len - 1]`. There is no wraparound at the
//! ends and no error for out-of-range proposals.

/// A proposed change to the active line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next,
    Previous,
    /// Select a specific line (pointer click).
    JumpTo(usize),
}

/// Pure transition function. With `len == 0` the index is returned as-is.
pub fn reduce(current: usize, len: usize, transition: Transition) -> usize {
    if len == 0 {
        return current;
    }
    let last = len - 1;
    match transition {
        Transition::Next => current.saturating_add(1).min(last),
        Transition::Previous => current.saturating_sub(1).min(last),
        Transition::JumpTo(target) => target.min(last),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveIndex {
    index: usize,
    len: usize,
}

impl ActiveIndex {
    /// Start at the first line of a store with `len` lines.
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    /// The active line, or `None` for an empty store.
    pub fn get(&self) -> Option<usize> {
        (self.len > 0).then_some(self.index)
    }

    /// Apply a transition. Returns the new index only if it actually moved,
    /// which is what callers use to decide whether to scroll.
    pub fn apply(&mut self, transition: Transition) -> Option<usize> {
        let next = reduce(self.index, self.len, transition);
        if next == self.index {
            return None;
        }
        self.index = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn next_clamps_at_last_line() {
        // ["A","B","C","D","E"]
        let mut cursor = ActiveIndex::new(5);
        for _ in 0..3 {
            cursor.apply(Transition::Next);
        }
        assert_eq!(cursor.get(), Some(3));
        assert_eq!(cursor.apply(Transition::Next), Some(4));
        assert_eq!(cursor.apply(Transition::Next), None);
        assert_eq!(cursor.get(), Some(4));
    }

    #[test]
    fn previous_holds_at_zero() {
        let mut cursor = ActiveIndex::new(3);
        assert_eq!(cursor.apply(Transition::Previous), None);
        assert_eq!(cursor.get(), Some(0));
    }

    #[test]
    fn jump_is_direct_and_idempotent() {
        let mut cursor = ActiveIndex::new(5);
        cursor.apply(Transition::JumpTo(4));
        assert_eq!(cursor.apply(Transition::JumpTo(1)), Some(1));
        assert_eq!(cursor.apply(Transition::JumpTo(1)), None);
        assert_eq!(cursor.get(), Some(1));
    }

    #[test]
    fn out_of_range_jump_saturates() {
        assert_eq!(reduce(0, 4, Transition::JumpTo(99)), 3);
    }

    #[test]
    fn empty_store_has_no_active_line() {
        let mut cursor = ActiveIndex::new(0);
        assert_eq!(cursor.get(), None);
        assert_eq!(cursor.apply(Transition::Next), None);
        assert_eq!(cursor.apply(Transition::JumpTo(2)), None);
        assert_eq!(reduce(0, 0, Transition::Previous), 0);
    }

    #[test]
    fn any_walk_stays_in_bounds() {
        // Deterministic pseudo-random walk over several lengths.
        let mut seed: u32 = 0x2545_f491;
        for len in 1..=9 {
            let mut cursor = ActiveIndex::new(len);
            for _ in 0..200 {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                let t = if seed % 2 == 0 {
                    Transition::Next
                } else {
                    Transition::Previous
                };
                cursor.apply(t);
                let i = cursor.get().unwrap();
                assert!(i < len, "index {i} escaped len {len}");
            }
        }
    }
}
