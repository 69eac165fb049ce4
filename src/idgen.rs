/// Monotonic id source owned by a single store. Zero is never handed out.
#[derive(Debug, Clone)]
pub struct IdGen {
    next: u64,
}

impl Default for IdGen {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn next(&mut self) -> u64 {
        let id = self.next.max(1);
        self.next = id.wrapping_add(1);
        id
    }

    /// Make sure future ids come after `max_seen`, e.g. after importing a snapshot.
    #[inline]
    pub fn seed_from_max(&mut self, max_seen: u64) {
        let next = max_seen.saturating_add(1).max(1);
        if next > self.next {
            self.next = next;
        }
    }
}
