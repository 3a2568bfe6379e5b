use serde::Serialize;

/// Page size used when the caller does not pick one.
pub const DEFAULT_PER_PAGE: i64 = 10;

/// Largest page a caller may request.
pub const MAX_PER_PAGE: i64 = 100;

/// A 1-indexed page request with a bounded page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Clamps `page` to at least 1 and `per_page` to `1..=MAX_PER_PAGE`.
    /// A non-positive `per_page` falls back to the default.
    pub fn new(page: i64, per_page: i64) -> Self {
        let per_page = if per_page < 1 {
            DEFAULT_PER_PAGE
        } else {
            per_page.min(MAX_PER_PAGE)
        };
        Self {
            page: page.max(1),
            per_page,
        }
    }

    /// Lenient parse of raw query-string values; anything non-numeric
    /// falls back to the defaults.
    pub fn from_params(page: Option<&str>, per_page: Option<&str>, default_per_page: i64) -> Self {
        let page = page.and_then(|p| p.trim().parse().ok()).unwrap_or(1);
        let per_page = per_page
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(default_per_page);
        Self::new(page, per_page)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// Pagination metadata, serialized as the `pagination` object of list
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub pages: i64,
    pub per_page: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let pages = if total <= 0 {
            0
        } else {
            (total + request.per_page - 1) / request.per_page
        };
        Self {
            page: request.page,
            pages,
            per_page: request.per_page,
            total: total.max(0),
            has_next: request.page < pages,
            has_prev: request.page > 1,
        }
    }
}

/// One slice of an ordered, filtered result set.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
