//! Bearer-token middleware for session endpoints.
//!
//! Rejects with 403 before any handler runs when the `Authorization` header is
//! missing, is not `Bearer <token>`, or the token fails introspection.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

pub async fn introspect_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(request.headers())?;
    state
        .introspector
        .introspect(token)
        .await
        .map_err(|e| Error::Forbidden(format!("introspection failure: {e}")))?;
    debug!(target: "kvs_quiz", path = %request.uri().path(), "Token accepted");
    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let raw = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::Forbidden("authorization header not set".into()))?;
    let value = raw
        .to_str()
        .map_err(|_| Error::Forbidden("authorization header invalid".into()))?;
    match value.strip_prefix(BEARER_PREFIX).map(str::trim) {
        Some(token) if !token.is_empty() && !token.contains(' ') => Ok(token),
        _ => Err(Error::Forbidden("authorization header invalid".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use axum::http::HeaderValue;

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(v) = value {
            h.insert(AUTHORIZATION, HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers(Some("Bearer abc.def"))).unwrap(), "abc.def");
    }

    #[test]
    fn rejects_missing_and_malformed() {
        for h in [None, Some("abc"), Some("Bearer "), Some("Basic abc"), Some("Bearer a b")] {
            let err = bearer_token(&headers(h)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Forbidden, "header {h:?}");
        }
    }
}
