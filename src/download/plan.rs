//! Partitioning a known length into per-worker byte ranges.

use std::fmt;

/// A half-open byte range `[start, end)` assigned to one worker index.
///
/// Assignments are never mutated; a retry works on a
/// [`remainder`](ChunkAssignment::remainder), a new, strictly smaller
/// assignment under the same index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkAssignment {
    index: usize,
    start: u64,
    end: u64,
}

impl ChunkAssignment {
    /// Creates an assignment. `end` is clamped to be at least `start`.
    #[must_use]
    pub fn new(index: usize, start: u64, end: u64) -> Self {
        Self {
            index,
            start,
            end: end.max(start),
        }
    }

    /// Worker index this range belongs to.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// First byte of the range.
    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// One past the last byte of the range.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes in the range.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Whether the range covers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The unwritten tail after `written` bytes landed, or `None` when the
    /// range is fully written.
    #[must_use]
    pub fn remainder(&self, written: u64) -> Option<Self> {
        let start = self.start.saturating_add(written);
        (start < self.end).then_some(Self {
            index: self.index,
            start,
            end: self.end,
        })
    }

    /// `Range` header value for this assignment (inclusive end), or `None`
    /// for an empty range, which cannot be expressed.
    #[must_use]
    pub fn range_header(&self) -> Option<String> {
        (!self.is_empty()).then(|| format!("bytes={}-{}", self.start, self.end - 1))
    }
}

impl fmt::Display for ChunkAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} [{}, {})", self.index, self.start, self.end)
    }
}

/// Partitions `[0, total_len)` into `workers` contiguous ranges.
///
/// The first `workers - 1` ranges get `total_len / workers` bytes each and
/// the last one absorbs the remainder. When `total_len < workers` the
/// leading ranges are empty. A `workers` value of zero is treated as one.
#[must_use]
pub fn plan_ranges(total_len: u64, workers: usize) -> Vec<ChunkAssignment> {
    let workers = workers.max(1);
    let count = workers as u64;
    let base = total_len / count;

    (0..workers)
        .map(|index| {
            let start = base * index as u64;
            let end = if index + 1 == workers {
                total_len
            } else {
                start + base
            };
            ChunkAssignment::new(index, start, end)
        })
        .collect()
}
