//! Client-side pagination over the already-filtered post list.

use std::{num::NonZeroUsize, ops::Range};

use serde::Serialize;

/// One page of a fully materialized list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total: usize,
}

impl PageWindow {
    /// Clamp `requested` into `[1, page_count]`. An empty list still has one (empty) page.
    pub fn new(total: usize, requested: usize, page_size: NonZeroUsize) -> Self {
        let page_size = page_size.get();
        let page_count = total.div_ceil(page_size).max(1);
        let page = requested.clamp(1, page_count);
        Self {
            page,
            page_count,
            page_size,
            total,
        }
    }

    pub fn range(&self) -> Range<usize> {
        let start = (self.page - 1) * self.page_size;
        let end = (start + self.page_size).min(self.total);
        start.min(end)..end
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.range();
        let end = range.end.min(items.len());
        &items[range.start.min(end)..end]
    }

    pub fn previous(&self) -> Option<usize> {
        (self.page > 1).then(|| self.page - 1)
    }

    pub fn next(&self) -> Option<usize> {
        (self.page < self.page_count).then(|| self.page + 1)
    }

    pub fn pages(&self) -> impl Iterator<Item = usize> {
        1..=self.page_count
    }
}
