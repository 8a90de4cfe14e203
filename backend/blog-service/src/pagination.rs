/// Fixed-size pagination with clamping
///
/// `?page=` is 1-based. Anything that does not parse is page 1; numbers
/// below 1 clamp to the first page and numbers past the end clamp to the
/// last. An empty listing has exactly one (empty) page.
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;

pub const PAGE_SIZE: i64 = 10;

/// `?page=` as received; kept as text so junk does not fail extraction
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Page number and window for a listing of `total` items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl PageWindow {
    pub fn resolve(requested: Option<&str>, total: i64) -> Self {
        let num_pages = num_pages(total);
        let number = requested
            .and_then(parse_page_number)
            .unwrap_or(1)
            .clamp(1, num_pages);

        Self {
            number,
            num_pages,
            total,
        }
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * PAGE_SIZE
    }
}

/// Overflowing numbers saturate so they still clamp to the nearest end
fn parse_page_number(raw: &str) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(n) => Some(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

fn num_pages(total: i64) -> i64 {
    if total <= 0 {
        1
    } else {
        (total + PAGE_SIZE - 1) / PAGE_SIZE
    }
}

/// One page of a listing, as handed to templates
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_number: Option<i64>,
    pub next_number: Option<i64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        let has_previous = window.number > 1;
        let has_next = window.number < window.num_pages;
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total: window.total,
            has_previous,
            has_next,
            previous_number: has_previous.then(|| window.number - 1),
            next_number: has_next.then(|| window.number + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twenty_five_items() {
        let first = PageWindow::resolve(Some("1"), 25);
        assert_eq!(first.num_pages, 3);
        assert_eq!(first.offset(), 0);

        let third = PageWindow::resolve(Some("3"), 25);
        assert_eq!(third.number, 3);
        assert_eq!(third.offset(), 20);
        // 25 - 20 rows remain for the last page
        assert_eq!(25 - third.offset(), 5);

        let past_end = PageWindow::resolve(Some("4"), 25);
        assert_eq!(past_end, third);
    }

    #[test]
    fn test_non_numeric_means_first_page() {
        assert_eq!(PageWindow::resolve(Some("abc"), 25).number, 1);
        assert_eq!(PageWindow::resolve(Some(""), 25).number, 1);
        assert_eq!(PageWindow::resolve(None, 25).number, 1);
    }

    #[test]
    fn test_below_one_clamps_to_first() {
        assert_eq!(PageWindow::resolve(Some("0"), 25).number, 1);
        assert_eq!(PageWindow::resolve(Some("-7"), 25).number, 1);
    }

    #[test]
    fn test_huge_page_number_clamps_to_last() {
        assert_eq!(PageWindow::resolve(Some("99999999999999999999"), 25).number, 3);
        assert_eq!(PageWindow::resolve(Some("-99999999999999999999"), 25).number, 1);
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let window = PageWindow::resolve(Some("5"), 0);
        assert_eq!(window.number, 1);
        assert_eq!(window.num_pages, 1);
        assert_eq!(window.offset(), 0);
    }

    #[test]
    fn test_exact_multiple() {
        assert_eq!(PageWindow::resolve(Some("9"), 20).number, 2);
    }

    #[test]
    fn test_page_navigation_flags() {
        let window = PageWindow::resolve(Some("2"), 25);
        let page = Page::new(vec![1, 2, 3], window);
        assert!(page.has_previous);
        assert!(page.has_next);
        assert_eq!(page.previous_number, Some(1));
        assert_eq!(page.next_number, Some(3));

        let last = Page::new(Vec::<i32>::new(), PageWindow::resolve(Some("3"), 25));
        assert!(!last.has_next);
        assert_eq!(last.next_number, None);
    }
}
