//! Custom Axum extractors

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::deadline::RequestContext;

/// Header a caller may use to bound its own request, in milliseconds.
pub const TIMEOUT_HEADER: &str = "x-request-timeout-ms";

/// Caller deadline taken from [`TIMEOUT_HEADER`].
///
/// A missing or malformed header means the caller set no deadline.
pub struct CallerDeadline(pub RequestContext);

impl<S> FromRequestParts<S> for CallerDeadline
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let timeout = parts
            .headers
            .get(TIMEOUT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_millis);

        Ok(Self(match timeout {
            Some(timeout) => RequestContext::with_timeout(timeout),
            None => RequestContext::new(),
        }))
    }
}
