//! Fixed-size pagination with forgiving page resolution.

use serde::Serialize;

/// Shirts per showcase page.
pub const PAGE_SIZE: u32 = 9;

/// Page arithmetic over a known result count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: u64,
    per_page: u32,
}

impl Paginator {
    pub fn new(total: u64, per_page: u32) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    /// Total number of matching rows.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of pages. An empty result still has one (empty) page.
    pub fn num_pages(&self) -> u32 {
        let pages = self.total.div_ceil(u64::from(self.per_page));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    /// Resolve the raw `page` parameter to a valid 1-indexed page.
    ///
    /// Missing or non-integer input gives page 1. Integers outside
    /// `1..=num_pages` give the last page.
    pub fn resolve_page(&self, raw: Option<&str>) -> u32 {
        let Some(requested) = raw.and_then(|r| r.trim().parse::<i64>().ok()) else {
            return 1;
        };

        let last = self.num_pages();
        if requested < 1 || requested > i64::from(last) {
            return last;
        }
        u32::try_from(requested).unwrap_or(last)
    }

    /// Row offset of the first entry on `page`.
    pub fn offset(&self, page: u32) -> u64 {
        u64::from(page.saturating_sub(1)) * u64::from(self.per_page)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Navigation metadata for a resolved page.
    pub fn meta(&self, page: u32) -> PageMeta {
        let num_pages = self.num_pages();
        PageMeta {
            page,
            num_pages,
            total: self.total,
            has_previous: page > 1,
            has_next: page < num_pages,
            previous_page: page.saturating_sub(1).max(1),
            next_page: (page + 1).min(num_pages),
        }
    }
}

/// Pager state exposed to templates.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageMeta {
    pub page: u32,
    pub num_pages: u32,
    pub total: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page: u32,
    pub next_page: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(Paginator::new(9, PAGE_SIZE).num_pages(), 1);
        assert_eq!(Paginator::new(10, PAGE_SIZE).num_pages(), 2);
        assert_eq!(Paginator::new(27, PAGE_SIZE).num_pages(), 3);
        assert_eq!(Paginator::new(28, PAGE_SIZE).num_pages(), 4);
    }

    #[test]
    fn empty_result_has_one_page() {
        let paginator = Paginator::new(0, PAGE_SIZE);
        assert_eq!(paginator.num_pages(), 1);
        assert_eq!(paginator.resolve_page(Some("3")), 1);
        assert_eq!(paginator.offset(1), 0);
    }

    #[test]
    fn missing_or_non_numeric_page_is_first() {
        let paginator = Paginator::new(40, PAGE_SIZE);
        assert_eq!(paginator.resolve_page(None), 1);
        assert_eq!(paginator.resolve_page(Some("abc")), 1);
        assert_eq!(paginator.resolve_page(Some("2.5")), 1);
        assert_eq!(paginator.resolve_page(Some("")), 1);
    }

    #[test]
    fn page_past_the_end_is_last() {
        let paginator = Paginator::new(40, PAGE_SIZE);
        assert_eq!(paginator.num_pages(), 5);
        assert_eq!(paginator.resolve_page(Some("999")), 5);
        assert_eq!(paginator.resolve_page(Some("99999999999999999")), 5);
    }

    #[test]
    fn zero_or_negative_page_is_last() {
        let paginator = Paginator::new(40, PAGE_SIZE);
        assert_eq!(paginator.resolve_page(Some("0")), 5);
        assert_eq!(paginator.resolve_page(Some("-2")), 5);
    }

    #[test]
    fn in_range_page_is_kept() {
        let paginator = Paginator::new(40, PAGE_SIZE);
        assert_eq!(paginator.resolve_page(Some("3")), 3);
        assert_eq!(paginator.resolve_page(Some(" 4 ")), 4);
        assert_eq!(paginator.offset(3), 18);
    }

    #[test]
    fn meta_navigation_flags() {
        let paginator = Paginator::new(20, PAGE_SIZE);
        let first = paginator.meta(1);
        assert!(!first.has_previous);
        assert!(first.has_next);
        assert_eq!(first.next_page, 2);

        let last = paginator.meta(3);
        assert!(last.has_previous);
        assert!(!last.has_next);
        assert_eq!(last.previous_page, 2);
        assert_eq!(last.next_page, 3);
    }
}
