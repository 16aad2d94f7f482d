//! Thread-safe sequence counter for query correlation.
//!
//! # What is the sequence field for? (for beginners)
//!
//! Every frame header carries a 32-bit `sequence` field.  Commands leave it
//! at 0.  Queries are stamped with a fresh, non-zero value so that a server
//! which echoes the field back lets the client match a reply to the exact
//! query that caused it.  A reply carrying 0 means "not echoed" and the
//! dispatcher falls back to first-in-first-out matching per reply kind.
//!
//! Because 0 is reserved for "uncorrelated", the counter never hands it out:
//! it starts at 1 and skips 0 when it wraps around.
//!
//! # Thread safety
//!
//! The counter uses `AtomicU32` internally, so several tasks can mint
//! sequence numbers at the same time without a lock and without ever
//! receiving the same value twice (until the 32-bit space wraps).

use std::sync::atomic::{AtomicU32, Ordering};

/// A thread-safe, monotonically increasing counter for query sequence numbers.
///
/// Sequence numbers start at 1 and increment by 1 with each call to [`next`].
/// After `u32::MAX` the counter continues at 1, never yielding 0.
///
/// [`next`]: SequenceCounter::next
///
/// # Examples
///
/// ```rust
/// use icm_core::protocol::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 1);
/// assert_eq!(counter.next(), 2);
/// ```
#[derive(Debug)]
pub struct SequenceCounter {
    inner: AtomicU32,
}

impl SequenceCounter {
    /// Creates a new counter whose first value is 1.
    pub fn new() -> Self {
        Self {
            inner: AtomicU32::new(1),
        }
    }

    /// Returns the next non-zero sequence number and atomically advances the
    /// counter.
    ///
    /// `Ordering::Relaxed` is enough: the value only labels a frame and is
    /// never used to publish other memory.
    pub fn next(&self) -> u32 {
        loop {
            let value = self.inner.fetch_add(1, Ordering::Relaxed);
            if value != 0 {
                return value;
            }
        }
    }

    /// Returns the value the next call to [`next`](Self::next) will try to
    /// hand out, without advancing.
    pub fn current(&self) -> u32 {
        self.inner.load(Ordering::Relaxed)
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn counter_at(value: u32) -> SequenceCounter {
        SequenceCounter {
            inner: AtomicU32::new(value),
        }
    }

    #[test]
    fn test_first_query_gets_one() {
        assert_eq!(SequenceCounter::default().next(), 1);
    }

    #[test]
    fn test_consecutive_queries_differ_by_one() {
        // Arrange
        let counter = counter_at(41);

        // Act
        let (a, b, c) = (counter.next(), counter.next(), counter.next());

        // Assert
        assert_eq!((a, b, c), (41, 42, 43));
    }

    #[test]
    fn test_wrap_never_yields_zero() {
        let counter = counter_at(u32::MAX);
        assert_eq!(counter.next(), u32::MAX);
        assert_eq!(counter.next(), 1, "0 is reserved for uncorrelated frames");
    }

    #[test]
    fn test_concurrent_callers_never_share_a_value() {
        // Arrange
        let counter = SequenceCounter::new();

        // Act – four threads mint 500 numbers each
        let minted: Vec<u32> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| (0..500).map(|_| counter.next()).collect::<Vec<_>>()))
                .collect();
            workers
                .into_iter()
                .flat_map(|w| w.join().unwrap())
                .collect()
        });

        // Assert
        let unique: HashSet<u32> = minted.iter().copied().collect();
        assert_eq!(unique.len(), 2000);
        assert!(!unique.contains(&0));
    }

    #[test]
    fn test_current_peeks_without_advancing() {
        let counter = counter_at(7);
        assert_eq!(counter.current(), 7);
        assert_eq!(counter.current(), 7);
        assert_eq!(counter.next(), 7);
        assert_eq!(counter.current(), 8);
    }
}
