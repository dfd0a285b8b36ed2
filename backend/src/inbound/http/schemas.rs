//! OpenAPI schema definitions for types that do not derive `ToSchema`.
//!
//! Entities derive their schemas next to their definitions. The error
//! payload keeps private fields and the pagination envelope lives in a
//! framework-free crate, so both are mirrored here for documentation.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with the current state of a resource.
    #[schema(rename = "conflict")]
    Conflict,
    /// A dependency is temporarily unavailable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "phone must contain 10 digits")]
    message: String,
    /// Correlation identifier matching the `trace-id` response header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Field-level context: `field`, `code` and sometimes `value`.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`pagination::PageLinks`].
#[derive(ToSchema)]
#[schema(as = PageLinks)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PageLinksSchema {
    /// Link to the current page.
    #[schema(rename = "self")]
    self_link: String,
    /// Link to the following page, absent on the last page.
    next: Option<String>,
    /// Link to the preceding page, absent on the first page.
    prev: Option<String>,
}

/// OpenAPI schema for [`pagination::Paginated`].
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PaginatedSchema<T> {
    /// Items on the requested page.
    items: Vec<T>,
    /// Total number of items across all pages.
    total: u64,
    /// The 1-based page number.
    page: u32,
    /// Page size used for this response.
    limit: u32,
    /// Number of pages needed to cover `total`.
    total_pages: u32,
    /// Navigation links.
    links: PageLinksSchema,
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[test]
    fn error_code_schema_variants_match_domain() {
        let schema_json = schema_to_json::<ErrorCodeSchema>();
        for code in [
            crate::domain::ErrorCode::InvalidRequest,
            crate::domain::ErrorCode::NotFound,
            crate::domain::ErrorCode::Conflict,
            crate::domain::ErrorCode::ServiceUnavailable,
            crate::domain::ErrorCode::InternalError,
        ] {
            assert!(schema_json.contains(code.as_str()), "missing {}", code.as_str());
        }
    }

    #[test]
    fn error_schema_uses_wire_names() {
        assert_eq!(ErrorSchema::name(), "Error");
        let schema_json = schema_to_json::<ErrorSchema>();
        assert!(schema_json.contains("traceId"));
        assert!(!schema_json.contains("trace_id"));
    }

    #[test]
    fn page_links_expose_self() {
        let schema_json = schema_to_json::<PageLinksSchema>();
        assert!(schema_json.contains("\"self\""));
    }
}
