//! Page slicing for list views.
//!
//! Page requests never fail: missing or non-numeric input and page numbers
//! below one select the first page, numbers past the end select the last page.

use serde::Serialize;

/// One page of a list, plus enough metadata to render pager controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// 1-based index of the first item on this page (0 for an empty list).
    #[must_use]
    pub fn start_index(&self) -> usize {
        if self.total_items == 0 {
            0
        } else {
            (self.number - 1) * self.per_page + 1
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            per_page: self.per_page,
            total_items: self.total_items,
        }
    }
}

/// A requested page number as it arrives from a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    First,
    Number(i64),
}

impl PageRequest {
    /// Interprets raw query input; anything that is not an integer means the first page.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<i64>().ok())
            .map_or(PageRequest::First, PageRequest::Number)
    }
}

impl From<Option<&str>> for PageRequest {
    fn from(raw: Option<&str>) -> Self {
        Self::parse(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: usize,
}

impl Paginator {
    /// Creates a paginator; a zero page size is treated as one.
    #[must_use]
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    #[must_use]
    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Number of pages for `total` items. An empty list still has one page.
    #[must_use]
    pub fn num_pages(&self, total: usize) -> usize {
        total.div_ceil(self.per_page).max(1)
    }

    /// Clamps a request into `1..=num_pages`.
    #[must_use]
    pub fn resolve(&self, request: PageRequest, total: usize) -> usize {
        let last = self.num_pages(total);
        match request {
            PageRequest::First => 1,
            PageRequest::Number(n) if n < 1 => 1,
            PageRequest::Number(n) => usize::try_from(n).map_or(last, |n| n.min(last)),
        }
    }

    pub fn page<T>(&self, items: Vec<T>, request: PageRequest) -> Page<T> {
        let total_items = items.len();
        let num_pages = self.num_pages(total_items);
        let number = self.resolve(request, total_items);
        let start = (number - 1) * self.per_page;
        let items = items
            .into_iter()
            .skip(start)
            .take(self.per_page)
            .collect();

        Page {
            items,
            number,
            num_pages,
            per_page: self.per_page,
            total_items,
        }
    }
}
