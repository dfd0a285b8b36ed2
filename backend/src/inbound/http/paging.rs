//! Translation between list query strings and the `pagination` crate.

use actix_web::HttpRequest;
use pagination::{PageLimits, PageRequest, PageRequestError, Paginated};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::domain::Error;
use crate::domain::ports::ListSlice;

/// `page` and `limit` query parameters shared by every list endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number. Defaults to 1.
    pub page: Option<u32>,
    /// Page size, clamped to the configured maximum.
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Validate against the configured limits.
    pub fn to_request(self, limits: PageLimits) -> Result<PageRequest, Error> {
        PageRequest::new(self.page, self.limit, limits).map_err(|err| match err {
            PageRequestError::ZeroPage => Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "page", "code": "invalid_page", "value": 0 })),
            PageRequestError::InvalidLimits => Error::internal(err.to_string()),
        })
    }
}

/// Wrap a repository slice in the paginated envelope, linking from the
/// request URL.
pub fn paginate<T>(slice: ListSlice<T>, page: PageRequest, req: &HttpRequest) -> Paginated<T> {
    Paginated::new(slice.items, slice.total, page, &req.full_url())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use rstest::rstest;

    #[rstest]
    fn zero_page_is_a_field_error() {
        let query = PageQuery {
            page: Some(0),
            limit: None,
        };
        let err = query
            .to_request(PageLimits::default())
            .expect_err("page zero");
        assert_eq!(err.details().expect("details")["field"], "page");
    }

    #[rstest]
    fn envelope_links_keep_filters() {
        let req = TestRequest::get()
            .uri("/api/v1/bills?status=unpaid&page=1&limit=1")
            .to_http_request();
        let page = PageQuery {
            page: Some(1),
            limit: Some(1),
        }
        .to_request(PageLimits::default())
        .expect("valid page");
        let slice = ListSlice {
            items: vec!["BILL-000001"],
            total: 2,
        };

        let envelope = paginate(slice, page, &req);
        let next = envelope.links.next.expect("next link");
        assert!(next.contains("status=unpaid"));
        assert!(next.contains("page=2"));
    }
}
