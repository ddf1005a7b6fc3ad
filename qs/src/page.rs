//! Pagination over loaded result lists

use crate::error::{StoreError, StoreResult};

/// A validated pagination request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
    pub full: bool,
}

impl PageRequest {
    /// Validate pagination input; `limit` must be positive
    pub fn new(offset: usize, limit: usize, full: bool) -> StoreResult<Self> {
        if limit == 0 {
            return Err(StoreError::InvalidArgument("limit must be at least 1".to_string()));
        }
        Ok(Self { offset, limit, full })
    }

    /// Slice `results` into the requested window
    pub fn apply<'a, T>(&self, results: &'a [T]) -> Page<'a, T> {
        let total = results.len();
        let start = self.offset.min(total);

        if self.full {
            return Page {
                window: &results[start..],
                start,
                end: total,
                total,
                remaining: 0,
            };
        }

        let end = self.offset.saturating_add(self.limit).min(total);
        let end = end.max(start);
        Page {
            window: &results[start..end],
            start,
            end,
            total,
            remaining: total - end,
        }
    }
}

/// One window of a result list
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub window: &'a [T],
    /// First index shown (0-based)
    pub start: usize,
    /// One past the last index shown
    pub end: usize,
    pub total: usize,
    /// Entries after the window
    pub remaining: usize,
}

impl<T> Page<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Offset to request for the following window, if anything remains
    pub fn next_offset(&self) -> Option<usize> {
        (self.remaining > 0).then_some(self.end)
    }
}

/// Convenience wrapper: validate and slice in one call
pub fn page<T>(results: &[T], offset: usize, limit: usize, full: bool) -> StoreResult<Page<'_, T>> {
    Ok(PageRequest::new(offset, limit, full)?.apply(results))
}
