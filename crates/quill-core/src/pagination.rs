//! Page-number pagination over ordered result sets.
//!
//! Page numbers are 1-based. The first page always exists, even when there is
//! nothing to show on it; any other page past the end is an error.

use serde::Serialize;

use crate::error::DomainError;

/// Fixed page size for every post listing.
pub const POSTS_PER_PAGE: u64 = 4;

/// Which page the client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(i64),
    Last,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::Number(1)
    }
}

impl PageRequest {
    /// Parse the raw `page` query value. Absent or empty means page 1.
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some("last") => Ok(Self::Last),
            Some(value) => value.parse::<i64>().map(Self::Number).map_err(|_| {
                DomainError::InvalidPage("page is not 'last', nor can it be converted to an int".into())
            }),
        }
    }
}

/// The slice of the result set a resolved page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Page arithmetic for a result set of known size.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total_items: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(total_items: u64, per_page: u64) -> Self {
        Self {
            total_items,
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self) -> u64 {
        if self.total_items == 0 {
            1
        } else {
            self.total_items.div_ceil(self.per_page)
        }
    }

    /// Validate a page request against the result size.
    pub fn resolve(&self, request: PageRequest) -> Result<PageWindow, DomainError> {
        let number = match request {
            PageRequest::Last => self.num_pages(),
            PageRequest::Number(n) if n < 1 => {
                return Err(DomainError::InvalidPage(
                    "that page number is less than 1".into(),
                ));
            }
            PageRequest::Number(n) => n as u64,
        };

        if number > self.num_pages() {
            return Err(DomainError::InvalidPage(
                "that page contains no results".into(),
            ));
        }

        Ok(PageWindow {
            number,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        })
    }

    pub fn page<T>(&self, window: PageWindow, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: window.number,
            per_page: self.per_page,
            total_items: self.total_items,
            num_pages: self.num_pages(),
        }
    }
}

/// One page of results plus the numbers needed to render navigation.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub num_pages: u64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            total_items: self.total_items,
            num_pages: self.num_pages,
        }
    }
}
