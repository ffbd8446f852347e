//! This module defines the common functionality for paging data.

use maud::{Markup, html};

use crate::html::LINK_STYLE;

/// The config for pagination.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum transactions to display per page when not specified in a request.
    pub default_page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_pages: 5,
        }
    }
}

/// A 1-indexed page of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: u64,
}

impl Page {
    /// The SQL OFFSET for this page.
    pub fn offset(self) -> u64 {
        (self.number.max(1) - 1) * self.size
    }

    /// How many pages `row_count` rows span. At least 1, so that an empty
    /// table still renders page 1.
    pub fn count_pages(self, row_count: u64) -> u64 {
        row_count.div_ceil(self.size).max(1)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let half_window = max_pages / 2;

    let window = if page_count <= max_pages {
        1..=page_count
    } else if curr_page <= half_window {
        1..=max_pages
    } else if curr_page > page_count - half_window {
        (page_count - max_pages + 1)..=page_count
    } else {
        (curr_page - half_window)..=(curr_page + half_window)
    };

    let mut indicators: Vec<PaginationIndicator> = window
        .map(|page| {
            if page == curr_page {
                PaginationIndicator::CurrPage(page)
            } else {
                PaginationIndicator::Page(page)
            }
        })
        .collect();

    if page_count > max_pages {
        if curr_page > half_window + 1 {
            indicators.insert(0, PaginationIndicator::Page(1));
            indicators.insert(1, PaginationIndicator::Ellipsis);
        }

        if curr_page < page_count - half_window {
            indicators.push(PaginationIndicator::Ellipsis);
            indicators.push(PaginationIndicator::Page(page_count));
        }
    }

    if curr_page > 1 {
        indicators.insert(0, PaginationIndicator::BackButton(curr_page - 1));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

/// Render pagination controls as a row of links.
///
/// `page_url` maps a page number to the URL that displays that page.
pub fn pagination_controls(
    indicators: &[PaginationIndicator],
    page_url: impl Fn(u64) -> String,
) -> Markup {
    html!(
        nav aria-label="Pagination" class="flex items-center justify-center gap-2 py-4"
        {
            @for indicator in indicators {
                @match indicator {
                    PaginationIndicator::BackButton(page) => {
                        a href=(page_url(*page)) class=(LINK_STYLE) { "Previous" }
                    }
                    PaginationIndicator::NextButton(page) => {
                        a href=(page_url(*page)) class=(LINK_STYLE) { "Next" }
                    }
                    PaginationIndicator::Page(page) => {
                        a href=(page_url(*page)) class=(LINK_STYLE) { (page) }
                    }
                    PaginationIndicator::CurrPage(page) => {
                        span class="font-bold" aria-current="page" { (page) }
                    }
                    PaginationIndicator::Ellipsis => {
                        span { "…" }
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod page_tests {
    use super::Page;

    #[test]
    fn computes_offsets() {
        let cases = [(1, 0), (2, 20), (5, 80)];

        for (number, want_offset) in cases {
            let page = Page { number, size: 20 };

            assert_eq!(want_offset, page.offset());
        }
    }

    #[test]
    fn counts_pages() {
        let page = Page {
            number: 1,
            size: 20,
        };

        assert_eq!(1, page.count_pages(0));
        assert_eq!(1, page.count_pages(20));
        assert_eq!(2, page.count_pages(21));
        assert_eq!(5, page.count_pages(100));
    }
}

#[cfg(test)]
mod indicator_tests {
    use crate::pagination::{PaginationIndicator, create_pagination_indicators};

    #[test]
    fn shows_all_pages() {
        let max_pages = 5;
        let page_count = 5;
        let curr_page = 1;
        let want = [
            PaginationIndicator::CurrPage(1),
            PaginationIndicator::Page(2),
            PaginationIndicator::Page(3),
            PaginationIndicator::Page(4),
            PaginationIndicator::Page(5),
            PaginationIndicator::NextButton(2),
        ];

        let got = create_pagination_indicators(curr_page, page_count, max_pages);

        assert_eq!(want, got.as_slice());
    }

    #[test]
    fn shows_page_subset_on_left() {
        let max_pages = 5;
        let page_count = 10;
        let curr_page = 1;
        let want = [
            PaginationIndicator::CurrPage(1),
            PaginationIndicator::Page(2),
            PaginationIndicator::Page(3),
            PaginationIndicator::Page(4),
            PaginationIndicator::Page(5),
            PaginationIndicator::Ellipsis,
            PaginationIndicator::Page(10),
            PaginationIndicator::NextButton(2),
        ];

        let got = create_pagination_indicators(curr_page, page_count, max_pages);

        assert_eq!(want, got.as_slice());
    }

    #[test]
    fn shows_both_buttons_and_trailing_ellipsis() {
        let max_pages = 5;
        let page_count = 10;
        let curr_page = 3;
        let want = [
            PaginationIndicator::BackButton(2),
            PaginationIndicator::Page(1),
            PaginationIndicator::Page(2),
            PaginationIndicator::CurrPage(3),
            PaginationIndicator::Page(4),
            PaginationIndicator::Page(5),
            PaginationIndicator::Ellipsis,
            PaginationIndicator::Page(10),
            PaginationIndicator::NextButton(4),
        ];

        let got = create_pagination_indicators(curr_page, page_count, max_pages);

        assert_eq!(want, got.as_slice());
    }

    #[test]
    fn shows_page_subset_on_right() {
        let max_pages = 5;
        let page_count = 10;
        let curr_page = 10;
        let want = [
            PaginationIndicator::BackButton(9),
            PaginationIndicator::Page(1),
            PaginationIndicator::Ellipsis,
            PaginationIndicator::Page(6),
            PaginationIndicator::Page(7),
            PaginationIndicator::Page(8),
            PaginationIndicator::Page(9),
            PaginationIndicator::CurrPage(10),
        ];

        let got = create_pagination_indicators(curr_page, page_count, max_pages);

        assert_eq!(want, got.as_slice());
    }

    #[test]
    fn shows_page_subset_in_center() {
        let max_pages = 5;
        let page_count = 10;
        let curr_page = 5;
        let want = [
            PaginationIndicator::BackButton(4),
            PaginationIndicator::Page(1),
            PaginationIndicator::Ellipsis,
            PaginationIndicator::Page(3),
            PaginationIndicator::Page(4),
            PaginationIndicator::CurrPage(5),
            PaginationIndicator::Page(6),
            PaginationIndicator::Page(7),
            PaginationIndicator::Ellipsis,
            PaginationIndicator::Page(10),
            PaginationIndicator::NextButton(6),
        ];

        let got = create_pagination_indicators(curr_page, page_count, max_pages);

        assert_eq!(want, got.as_slice());
    }
}
