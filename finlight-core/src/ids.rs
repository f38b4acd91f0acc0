//! Record id generation.
//!
//! Ids are millisecond clock readings, like the ids already found in stored
//! documents, but forced to be strictly increasing so two records created in
//! the same millisecond never share an id.

use chrono::Utc;

/// Source of wall-clock milliseconds.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock frozen at a fixed reading.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Monotonic id source: `next = max(now, last + 1)`.
#[derive(Debug, Clone)]
pub struct IdGenerator<C: Clock = SystemClock> {
    clock: C,
    last: i64,
}

impl IdGenerator<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for IdGenerator<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> IdGenerator<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock, last: i64::MIN }
    }

    /// Never hand out an id at or below `floor` (e.g. the largest stored id).
    pub fn seeded(mut self, floor: Option<i64>) -> Self {
        if let Some(floor) = floor {
            self.last = self.last.max(floor);
        }
        self
    }

    /// Strictly above every earlier id, until `i64::MAX` is reached; from
    /// there on the generator keeps returning `i64::MAX`.
    pub fn next_id(&mut self) -> i64 {
        let now = self.clock.now_millis();
        let id = if now > self.last {
            now
        } else {
            self.last.saturating_add(1)
        };
        self.last = id;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_tick_ids_are_distinct() {
        let mut ids = IdGenerator::with_clock(FixedClock(1_700_000_000_000));
        let a = ids.next_id();
        let b = ids.next_id();
        let c = ids.next_id();
        assert_eq!(a, 1_700_000_000_000);
        assert_eq!(b, a + 1);
        assert_eq!(c, a + 2);
    }

    #[test]
    fn test_seed_above_clock() {
        let mut ids = IdGenerator::with_clock(FixedClock(100)).seeded(Some(500));
        assert_eq!(ids.next_id(), 501);
    }

    #[test]
    fn test_seed_below_clock() {
        let mut ids = IdGenerator::with_clock(FixedClock(100)).seeded(Some(5));
        assert_eq!(ids.next_id(), 100);
    }

    #[test]
    fn test_seed_at_max_saturates() {
        let mut ids = IdGenerator::with_clock(FixedClock(100)).seeded(Some(i64::MAX));
        assert_eq!(ids.next_id(), i64::MAX);
        assert_eq!(ids.next_id(), i64::MAX);
    }

    #[test]
    fn test_system_clock_monotonic() {
        let mut ids = IdGenerator::new();
        let mut prev = ids.next_id();
        for _ in 0..1000 {
            let id = ids.next_id();
            assert!(id > prev);
            prev = id;
        }
    }
}
