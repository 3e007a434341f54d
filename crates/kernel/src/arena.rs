use swarm_common::MAX_ENTITIES;

/// A contiguous run of slots granted by [`SlotArena::reserve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    pub start: u32,
    pub count: u32,
}

impl SlotRange {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// One past the last slot.
    pub fn end(&self) -> u32 {
        self.start + self.count
    }

    /// Byte offset of the first slot in an array with `stride` bytes per row.
    pub fn byte_offset(&self, stride: u64) -> u64 {
        self.start as u64 * stride
    }
}

/// Append-only, capacity-bounded slot allocator.
///
/// Owns the free-slot cursor for the fixed-capacity entity arrays. There is
/// no release path: once granted, a slot stays allocated for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotArena {
    capacity: u32,
    next_free: u32,
}

impl Default for SlotArena {
    fn default() -> Self {
        Self::new(MAX_ENTITIES)
    }
}

impl SlotArena {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            next_free: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of populated slots.
    pub fn next_free(&self) -> u32 {
        self.next_free
    }

    pub fn remaining(&self) -> u32 {
        self.capacity - self.next_free
    }

    pub fn is_full(&self) -> bool {
        self.next_free == self.capacity
    }

    /// Grant up to `requested` slots starting at the cursor.
    ///
    /// Requests beyond the remaining capacity are truncated; a full arena
    /// grants an empty range. Truncation is an expected steady state, not an error.
    pub fn reserve(&mut self, requested: usize) -> SlotRange {
        let granted = requested.min(self.remaining() as usize) as u32;
        if (granted as usize) < requested {
            tracing::debug!(
                requested,
                granted,
                capacity = self.capacity,
                "slot arena truncated request"
            );
        }
        let range = SlotRange {
            start: self.next_free,
            count: granted,
        };
        self.next_free += granted;
        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_advances_cursor() {
        let mut arena = SlotArena::new(10);
        let a = arena.reserve(3);
        let b = arena.reserve(4);
        assert_eq!(a, SlotRange { start: 0, count: 3 });
        assert_eq!(b, SlotRange { start: 3, count: 4 });
        assert_eq!(arena.next_free(), 7);
        assert_eq!(arena.remaining(), 3);
    }

    #[test]
    fn reserve_truncates_at_capacity() {
        let mut arena = SlotArena::new(5);
        arena.reserve(3);
        let r = arena.reserve(10);
        assert_eq!(r, SlotRange { start: 3, count: 2 });
        assert!(arena.is_full());
        assert!(arena.reserve(1).is_empty());
        assert_eq!(arena.next_free(), 5);
    }

    #[test]
    fn cursor_follows_min_rule() {
        let mut arena = SlotArena::new(100);
        for count in [0usize, 7, 40, 1, 90, 3] {
            let before = arena.next_free();
            arena.reserve(count);
            let expected = (before as usize + count).min(100) as u32;
            assert_eq!(arena.next_free(), expected);
        }
    }

    #[test]
    fn full_capacity_then_one_more_is_dropped() {
        let mut arena = SlotArena::default();
        let r = arena.reserve(MAX_ENTITIES as usize);
        assert_eq!(r.count, MAX_ENTITIES);
        let extra = arena.reserve(1);
        assert!(extra.is_empty());
        assert_eq!(arena.next_free(), 1_000_000);
    }

    #[test]
    fn oversized_request_does_not_wrap() {
        let mut arena = SlotArena::new(8);
        let r = arena.reserve(usize::MAX);
        assert_eq!(r.count, 8);
        assert_eq!(arena.next_free(), 8);
    }

    #[test]
    fn byte_offsets_use_row_stride() {
        let r = SlotRange { start: 5, count: 2 };
        assert_eq!(r.byte_offset(16), 80);
        assert_eq!(r.byte_offset(4), 20);
        assert_eq!(r.end(), 7);
    }
}
