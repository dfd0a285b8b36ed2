//! Page request validation and paginated response envelopes.
//!
//! List endpoints accept a 1-based `page` number and a `limit`. This crate
//! keeps the arithmetic (offsets, page counts, link construction) in one
//! place so handlers only translate query parameters and wrap results.
//!
//! ```
//! use pagination::{PageLimits, PageRequest, Paginated};
//! use url::Url;
//!
//! let limits = PageLimits::new(20, 100).expect("valid limits");
//! let request = PageRequest::new(Some(2), Some(10), limits).expect("valid request");
//! assert_eq!(request.offset(), 10);
//!
//! let base = Url::parse("http://localhost/api/v1/patients?query=ram").expect("url");
//! let page = Paginated::new(vec!["a", "b"], 25, request, &base);
//! assert_eq!(page.total_pages, 3);
//! assert!(page.links.next.is_some());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Query parameter carrying the 1-based page number.
pub const PAGE_PARAM: &str = "page";
/// Query parameter carrying the page size.
pub const LIMIT_PARAM: &str = "limit";

/// Errors raised while validating pagination inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// Page numbers start at 1.
    #[error("page must be at least 1")]
    ZeroPage,
    /// Limits must allow at least one item per page.
    #[error("page limits must be positive and default must not exceed max")]
    InvalidLimits,
}

/// Default and maximum page sizes applied to incoming requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    default_limit: u32,
    max_limit: u32,
}

impl PageLimits {
    /// Build limits, rejecting zero sizes or a default above the maximum.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError::InvalidLimits`] when either size is zero or
    /// `default_limit > max_limit`.
    pub const fn new(default_limit: u32, max_limit: u32) -> Result<Self, PageRequestError> {
        if default_limit == 0 || max_limit == 0 || default_limit > max_limit {
            return Err(PageRequestError::InvalidLimits);
        }
        Ok(Self {
            default_limit,
            max_limit,
        })
    }

    /// Page size used when the client omits `limit`.
    #[must_use]
    pub const fn default_limit(&self) -> u32 {
        self.default_limit
    }

    /// Largest page size a client may request.
    #[must_use]
    pub const fn max_limit(&self) -> u32 {
        self.max_limit
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// Validated page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Validate raw query values against the configured limits.
    ///
    /// A missing page selects page 1. The limit is clamped into
    /// `1..=max_limit`, falling back to the default when absent.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError::ZeroPage`] when `page` is `Some(0)`.
    pub fn new(
        page: Option<u32>,
        limit: Option<u32>,
        limits: PageLimits,
    ) -> Result<Self, PageRequestError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(PageRequestError::ZeroPage);
        }
        let limit = limit
            .unwrap_or(limits.default_limit)
            .clamp(1, limits.max_limit);
        Ok(Self { page, limit })
    }

    /// The 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of items on this page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items preceding this page.
    #[must_use]
    pub fn offset(&self) -> usize {
        let skipped = u64::from(self.page - 1) * u64::from(self.limit);
        usize::try_from(skipped).unwrap_or(usize::MAX)
    }

    /// Select this page from an already ordered collection.
    #[must_use]
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset())
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

/// Navigation links for a page, built from the request URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    /// Link to the current page.
    #[serde(rename = "self")]
    pub self_link: String,
    /// Link to the following page, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Link to the preceding page, absent on the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

/// Paginated response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on the requested page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// The 1-based page number.
    pub page: u32,
    /// Page size used for this response.
    pub limit: u32,
    /// Number of pages needed to cover `total`.
    pub total_pages: u32,
    /// Navigation links.
    pub links: PageLinks,
}

impl<T> Paginated<T> {
    /// Wrap one page of items, computing page counts and links.
    ///
    /// Query parameters already present on `base` are preserved; `page` and
    /// `limit` are replaced.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest, base: &Url) -> Self {
        let total_pages =
            u32::try_from(total.div_ceil(u64::from(request.limit))).unwrap_or(u32::MAX);
        let next = (request.page < total_pages)
            .then(|| page_url(base, request.page + 1, request.limit));
        let prev = (request.page > 1).then(|| page_url(base, request.page - 1, request.limit));
        Self {
            items,
            total,
            page: request.page,
            limit: request.limit,
            total_pages,
            links: PageLinks {
                self_link: page_url(base, request.page, request.limit),
                next,
                prev,
            },
        }
    }

    /// Convert every item while keeping the envelope intact.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            links: self.links,
        }
    }
}

fn page_url(base: &Url, page: u32, limit: u32) -> String {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM && key != LIMIT_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let mut url = base.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(PAGE_PARAM, &page.to_string());
        pairs.append_pair(LIMIT_PARAM, &limit.to_string());
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    //! Unit coverage for page validation and link construction.

    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn limits() -> PageLimits {
        PageLimits::new(20, 50).expect("valid limits")
    }

    #[fixture]
    fn base() -> Url {
        Url::parse("http://localhost/api/v1/products?search=para&page=9").expect("url")
    }

    #[rstest]
    #[case(None, None, 1, 20)]
    #[case(Some(3), Some(10), 3, 10)]
    #[case(Some(1), Some(0), 1, 1)]
    #[case(Some(1), Some(500), 1, 50)]
    fn page_request_applies_defaults_and_clamps(
        limits: PageLimits,
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] expected_page: u32,
        #[case] expected_limit: u32,
    ) {
        let request = PageRequest::new(page, limit, limits).expect("valid request");
        assert_eq!(request.page(), expected_page);
        assert_eq!(request.limit(), expected_limit);
    }

    #[rstest]
    fn page_zero_is_rejected(limits: PageLimits) {
        let err = PageRequest::new(Some(0), None, limits).expect_err("page 0");
        assert_eq!(err, PageRequestError::ZeroPage);
    }

    #[rstest]
    #[case(0, 10)]
    #[case(10, 0)]
    #[case(20, 10)]
    fn invalid_limits_are_rejected(#[case] default_limit: u32, #[case] max_limit: u32) {
        assert_eq!(
            PageLimits::new(default_limit, max_limit),
            Err(PageRequestError::InvalidLimits)
        );
    }

    #[rstest]
    fn slice_returns_requested_window(limits: PageLimits) {
        let items: Vec<u32> = (1..=25).collect();
        let request = PageRequest::new(Some(2), Some(10), limits).expect("valid request");
        assert_eq!(request.slice(&items), (11..=20).collect::<Vec<_>>());

        let past_end = PageRequest::new(Some(4), Some(10), limits).expect("valid request");
        assert!(past_end.slice(&items).is_empty());
    }

    #[rstest]
    fn middle_page_links_both_directions(limits: PageLimits, base: Url) {
        let request = PageRequest::new(Some(2), Some(10), limits).expect("valid request");
        let page = Paginated::new(vec![1, 2, 3], 25, request, &base);

        assert_eq!(page.total_pages, 3);
        assert_eq!(
            page.links.self_link,
            "http://localhost/api/v1/products?search=para&page=2&limit=10"
        );
        assert_eq!(
            page.links.next.as_deref(),
            Some("http://localhost/api/v1/products?search=para&page=3&limit=10")
        );
        assert_eq!(
            page.links.prev.as_deref(),
            Some("http://localhost/api/v1/products?search=para&page=1&limit=10")
        );
    }

    #[rstest]
    fn edge_pages_omit_missing_links(limits: PageLimits, base: Url) {
        let first = PageRequest::new(Some(1), Some(10), limits).expect("valid request");
        let page = Paginated::new(vec![1], 5, first, &base);
        assert_eq!(page.total_pages, 1);
        assert!(page.links.next.is_none());
        assert!(page.links.prev.is_none());

        let empty = Paginated::<u32>::new(Vec::new(), 0, first, &base);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.links.next.is_none());
    }

    #[rstest]
    fn envelope_serialises_with_camel_case_and_self_link(limits: PageLimits, base: Url) {
        let request = PageRequest::new(None, None, limits).expect("valid request");
        let page = Paginated::new(vec!["x"], 1, request, &base).map(str::to_uppercase);
        let value = serde_json::to_value(&page).expect("serialise");

        assert_eq!(value["items"][0], "X");
        assert_eq!(value["totalPages"], 1);
        assert!(value["links"]["self"].is_string());
        assert!(value["links"].get("next").is_none());
    }
}
