//! Client identity extractor for engagement handlers.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Header carrying the caller's client id.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Id used when the header is missing or unusable.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

const MAX_CLIENT_ID_LEN: usize = 128;

/// The client a request acts on behalf of, read from `x-client-id`.
///
/// ```ignore
/// async fn my_handler(client: ClientId) -> AppResult<Json<()>> {
///     tracing::info!(client = %client.0, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_header(raw: Option<&str>) -> Self {
        let id = raw
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_CLIENT_ID_LEN)
            .unwrap_or(ANONYMOUS_CLIENT);
        Self(id.to_string())
    }
}

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CLIENT_ID_HEADER)
            .and_then(|v| v.to_str().ok());
        Ok(Self::from_header(raw))
    }
}
