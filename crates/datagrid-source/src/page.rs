//! Page state and record windows.

use serde::Serialize;

use crate::ordering::SortState;
use crate::record::Record;

/// One-indexed page number plus page size.
///
/// A page size of `0` means "no paging": the whole set is one page.
///
/// ```
/// use datagrid_source::PageState;
///
/// let page = PageState::new(2, 4);
/// assert_eq!(page.offset(), 4);
/// assert_eq!(page.page_count(5), 2);
///
/// // Out-of-range pages clamp to the last valid page
/// assert_eq!(PageState::new(99, 4).clamp(5), PageState::new(2, 4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageState {
    page: usize,
    size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        PageState::unbounded()
    }
}

impl PageState {
    /// Creates a page state. Page `0` is normalized to `1`.
    pub fn new(page: usize, size: usize) -> Self {
        PageState {
            page: page.max(1),
            size,
        }
    }

    /// A single page holding every row.
    pub fn unbounded() -> Self {
        PageState { page: 1, size: 0 }
    }

    /// The 1-indexed page number.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Rows per page; `0` means no paging.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_paged(&self) -> bool {
        self.size > 0
    }

    /// Zero-based index of the first row on this page.
    pub fn offset(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            (self.page - 1).saturating_mul(self.size)
        }
    }

    /// Row limit for this page, or `None` when unbounded.
    pub fn limit(&self) -> Option<usize> {
        self.is_paged().then_some(self.size)
    }

    /// Number of pages needed for `total` rows. Always at least 1.
    pub fn page_count(&self, total: usize) -> usize {
        if self.size == 0 || total == 0 {
            1
        } else {
            total.div_ceil(self.size)
        }
    }

    /// Clamps the page number into `1..=page_count(total)`.
    pub fn clamp(self, total: usize) -> PageState {
        PageState {
            page: self.page.min(self.page_count(total)),
            size: self.size,
        }
    }

    /// The same page size at a different page.
    pub fn with_page(self, page: usize) -> PageState {
        PageState::new(page, self.size)
    }
}

/// One page of records plus paging metadata.
///
/// Invariants (upheld by [`Binding`](crate::Binding)):
/// - `len() <= page.size()` when paging is on
/// - `start() + len() <= total()`
/// - `len() == 0` only when `total() == 0`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordWindow {
    records: Vec<Record>,
    total: usize,
    start: usize,
    #[serde(skip)]
    sort: SortState,
    #[serde(skip)]
    page: PageState,
}

impl RecordWindow {
    /// Assembles a window. `page` must already be clamped against `total`.
    pub fn new(records: Vec<Record>, total: usize, sort: SortState, page: PageState) -> Self {
        RecordWindow {
            records,
            total,
            start: page.offset().min(total),
            sort,
            page,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total rows in the unbounded (but filtered) set.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Zero-based index of the window's first row in the full set.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The sort this window was fetched with.
    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    /// The effective (clamped) page this window represents.
    pub fn page(&self) -> PageState {
        self.page
    }

    /// Number of pages for this window's total and page size.
    pub fn page_count(&self) -> usize {
        self.page.page_count(self.total)
    }
}

impl<'a> IntoIterator for &'a RecordWindow {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_zero_normalizes_to_one() {
        assert_eq!(PageState::new(0, 10).page(), 1);
    }

    #[test]
    fn offsets() {
        assert_eq!(PageState::new(1, 4).offset(), 0);
        assert_eq!(PageState::new(3, 4).offset(), 8);
        assert_eq!(PageState::new(3, 0).offset(), 0);
    }

    #[test]
    fn page_count_edges() {
        assert_eq!(PageState::new(1, 4).page_count(0), 1);
        assert_eq!(PageState::new(1, 4).page_count(4), 1);
        assert_eq!(PageState::new(1, 4).page_count(5), 2);
        assert_eq!(PageState::new(1, 0).page_count(500), 1);
    }

    #[test]
    fn clamp_to_last_page() {
        assert_eq!(PageState::new(99, 4).clamp(5).page(), 2);
        assert_eq!(PageState::new(99, 4).clamp(0).page(), 1);
        assert_eq!(PageState::new(7, 0).clamp(100).page(), 1);
        assert_eq!(PageState::new(2, 4).clamp(5).page(), 2);
    }

    #[test]
    fn limit_is_none_when_unbounded() {
        assert_eq!(PageState::unbounded().limit(), None);
        assert_eq!(PageState::new(1, 20).limit(), Some(20));
    }
}
