//! Page-number pagination for feeds.
//!
//! Page lookup is lenient: a missing or non-numeric page number gives the
//! first page, anything out of range gives the last page, and an empty list
//! still has one (empty) page.

use serde::Serialize;

/// Posts shown per feed page
pub const POSTS_PER_PAGE: i64 = 10;

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: i64,
    per_page: i64,
}

impl Paginator {
    pub fn new(count: i64, per_page: i64) -> Self {
        Self {
            count: count.max(0),
            per_page: per_page.max(1),
        }
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    pub fn num_pages(&self) -> i64 {
        if self.count == 0 {
            1
        } else {
            (self.count + self.per_page - 1) / self.per_page
        }
    }

    /// Resolve a raw `?page=` value to an existing page number
    pub fn page_number(&self, raw: Option<&str>) -> i64 {
        let requested = match raw.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(number)) => number,
            Some(Err(_)) | None => return 1,
        };

        if requested < 1 || requested > self.num_pages() {
            self.num_pages()
        } else {
            requested
        }
    }

    /// Row offset of the first item on `number`
    pub fn offset(&self, number: i64) -> i64 {
        (number - 1) * self.per_page
    }

    pub fn page<T>(&self, number: i64, object_list: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        let has_next = number < num_pages;
        let has_previous = number > 1;

        Page {
            number,
            num_pages,
            count: self.count,
            has_next,
            has_previous,
            next_page_number: has_next.then_some(number + 1),
            previous_page_number: has_previous.then_some(number - 1),
            object_list,
        }
    }
}

/// One page of results as handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<i64>,
    pub previous_page_number: Option<i64>,
    pub object_list: Vec<T>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.has_next,
            has_previous: self.has_previous,
            next_page_number: self.next_page_number,
            previous_page_number: self.previous_page_number,
            object_list: self.object_list.into_iter().map(f).collect(),
        }
    }
}
