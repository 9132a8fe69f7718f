//! Bounded per-entity usage history for sparkline rendering
//!
//! Providers normalize each sample to `[0, 1]` before recording it; the
//! buffers only keep order and capacity. The store is shared between
//! concurrent polls, so it sits on a `DashMap`.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::num::NonZeroUsize;

use crate::domain::Trend;

/// Type-safe trend capacity (non-zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrendCapacity(NonZeroUsize);

impl TrendCapacity {
    /// 90 samples, one per poll
    pub const DEFAULT: Self = Self(NonZeroUsize::new(90).unwrap());

    /// Create a new capacity
    ///
    /// # Panics
    /// Panics if size is zero
    #[must_use]
    pub const fn new(size: usize) -> Self {
        match NonZeroUsize::new(size) {
            Some(non_zero) => Self(non_zero),
            None => panic!("TrendCapacity must be non-zero"),
        }
    }

    /// Checked constructor for values coming from configuration
    #[must_use]
    pub fn try_new(size: usize) -> Option<Self> {
        NonZeroUsize::new(size).map(Self)
    }

    #[must_use]
    #[inline]
    pub const fn get(&self) -> usize {
        self.0.get()
    }
}

impl Default for TrendCapacity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Sliding window of samples, oldest dropped first
#[derive(Debug, Clone)]
pub struct TrendBuffer {
    samples: VecDeque<f64>,
    capacity: TrendCapacity,
}

impl TrendBuffer {
    #[must_use]
    pub fn new(capacity: TrendCapacity) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full
    pub fn push(&mut self, sample: f64) {
        if self.samples.len() == self.capacity.get() {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> TrendCapacity {
        self.capacity
    }

    /// Copy the current window out for rendering
    #[must_use]
    pub fn snapshot(&self) -> Trend {
        Trend::new(self.samples.iter().copied().collect::<Vec<_>>())
    }
}

/// Trend buffers keyed by entity (`"<namespace>/<pod>"`, `"cpu-<node>"`, ...)
#[derive(Debug, Default)]
pub struct TrendStore {
    buffers: DashMap<String, TrendBuffer>,
    capacity: TrendCapacity,
}

impl TrendStore {
    #[must_use]
    pub fn new(capacity: TrendCapacity) -> Self {
        Self {
            buffers: DashMap::new(),
            capacity,
        }
    }

    /// Append one sample under `key` and return the resulting window
    pub fn record(&self, key: &str, sample: f64) -> Trend {
        let mut buffer = self
            .buffers
            .entry(key.to_string())
            .or_insert_with(|| TrendBuffer::new(self.capacity));
        buffer.push(sample);
        buffer.snapshot()
    }

    /// Current window for `key`, if anything was recorded
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Trend> {
        self.buffers.get(key).map(|buffer| buffer.snapshot())
    }

    /// Number of tracked entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
