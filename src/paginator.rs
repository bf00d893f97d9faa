use serde::{Deserialize, Serialize};

/// Posts per listing page.
pub const PAGE_SIZE: i64 = 10;

/// `?page=` as it arrives; anything unparsable counts as missing.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: i64,
    count: i64,
}

/// Window into an ordered listing, resolved against a total count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<i64>,
    pub previous_page_number: Option<i64>,
}

impl Paginator {
    pub fn new(count: i64, per_page: i64) -> Self {
        Self {
            per_page: per_page.max(1),
            count: count.max(0),
        }
    }

    /// An empty listing still has one (empty) page.
    pub fn num_pages(&self) -> i64 {
        if self.count == 0 {
            1
        } else {
            (self.count + self.per_page - 1) / self.per_page
        }
    }

    /// Missing or non-integer input gives page 1; integers outside
    /// `1..=num_pages` give the last page.
    pub fn resolve(&self, requested: Option<&str>) -> PageWindow {
        let last = self.num_pages();
        let number = match requested.map(str::trim).and_then(|raw| raw.parse::<i64>().ok()) {
            None => 1,
            Some(n) if n >= 1 && n <= last => n,
            Some(_) => last,
        };
        PageWindow {
            number,
            limit: self.per_page,
            offset: (number - 1) * self.per_page,
        }
    }

    pub fn page<T>(&self, window: PageWindow, object_list: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        let has_next = window.number < num_pages;
        let has_previous = window.number > 1;
        Page {
            object_list,
            number: window.number,
            num_pages,
            count: self.count,
            has_next,
            has_previous,
            next_page_number: has_next.then(|| window.number + 1),
            previous_page_number: has_previous.then(|| window.number - 1),
        }
    }
}
