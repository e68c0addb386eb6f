//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Endpoints that report
//! sync status add sibling fields next to `data` (see the handler modules).

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
