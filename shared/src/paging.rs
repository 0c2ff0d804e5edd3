//! Bounded page cursor for vendor listing and search endpoints.
//!
//! The cursor hands out page numbers one at a time and is told how many items each page
//! returned. It finishes on the first of: an empty page, the reported total reached, the
//! item maximum reached, or the page cap reached.

use crate::imports::*;

/// One fetched page and the total the vendor reported alongside it, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: Option<usize>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pages {
    first: u32,
    max_items: Option<usize>,
    max_pages: Option<u32>,
    current: u32,
    fetched: usize,
    done: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: Option<usize>) -> Page<T> {
        Page { items, total }
    }
}

impl Pages {
    /// Cursor whose first page is numbered `first` (vendors count from 0 or 1).
    pub fn starting_at(first: u32) -> Pages {
        Pages { first, max_items: None, max_pages: None, current: first, fetched: 0, done: false }
    }

    pub fn max_items(self, max_items: usize) -> Pages {
        Pages { max_items: Some(max_items), ..self }
    }

    pub fn max_pages(self, max_pages: u32) -> Pages {
        Pages { max_pages: Some(max_pages), ..self }
    }

    pub fn fetched(&self) -> usize {
        self.fetched
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn restart(&mut self) {
        self.current = self.first;
        self.fetched = 0;
        self.done = self.max_items == Some(0) || self.max_pages == Some(0);
    }

    /// Page number to fetch next, or `None` once the cursor is exhausted.
    pub fn next_page(&mut self) -> Option<u32> {
        if self.max_items == Some(0) || self.max_pages == Some(0) {
            self.done = true;
        }
        (!self.done).then_some(self.current)
    }

    /// Records the page just fetched and returns it cut down to the item maximum.
    pub fn record<T>(&mut self, mut page: Page<T>) -> Vec<T> {
        if page.items.is_empty() {
            self.done = true;
            return page.items;
        }
        if let Some(max_items) = self.max_items {
            page.items.truncate(max_items.saturating_sub(self.fetched));
        }
        self.fetched += page.items.len();
        let pages_fetched = self.current - self.first + 1;
        self.done = self.max_items.map_or(false, |max| self.fetched >= max)
            || page.total.map_or(false, |total| self.fetched >= total)
            || self.max_pages.map_or(false, |max| pages_fetched >= max);
        self.current += 1;
        debug!("Fetched page {} ({} items so far, done: {})", self.current - 1, self.fetched, self.done);
        page.items
    }
}
