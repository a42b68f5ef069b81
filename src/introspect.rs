//! Bearer token introspection against the identity service.
//!
//! Two adapters:
//!   - `HttpIntrospector` asks the identity service over HTTP.
//!   - `StaticTokenIntrospector` accepts a fixed token list (local/dev setups).
//!
//! NOTE: tokens are never logged.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{error, instrument, warn};

use crate::error::{Error, Result};

#[async_trait]
pub trait Introspector: Send + Sync {
    /// Ok if `token` is valid and authorizes the caller.
    async fn introspect(&self, token: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct HttpIntrospector {
    client: reqwest::Client,
    url: String,
}

/// Optional body of a successful introspection reply.
#[derive(Deserialize)]
struct IntrospectReply {
    #[serde(default)]
    active: Option<bool>,
}

impl HttpIntrospector {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("introspection client: {e}")))?;
        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl Introspector for HttpIntrospector {
    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    async fn introspect(&self, token: &str) -> Result<()> {
        let res = self
            .client
            .post(&self.url)
            .header(USER_AGENT, "kvs-quiz/0.1")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| {
                error!(target: "kvs_quiz", error = %e, "Introspection request failed");
                Error::Internal(format!("introspection request: {e}"))
            })?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Forbidden(format!("identity service rejected token ({status})")));
        }
        if !status.is_success() {
            warn!(target: "kvs_quiz", %status, "Unexpected introspection status");
            return Err(Error::Internal(format!("introspection HTTP {status}")));
        }

        // An empty 2xx body counts as active. Anything else must be a well-formed reply.
        let body = res.text().await.map_err(|e| {
            error!(target: "kvs_quiz", error = %e, "Introspection reply unreadable");
            Error::Internal(format!("introspection reply: {e}"))
        })?;
        if body.trim().is_empty() {
            return Ok(());
        }
        let reply: IntrospectReply = serde_json::from_str(&body).map_err(|e| {
            warn!(target: "kvs_quiz", error = %e, "Malformed introspection reply");
            Error::Internal(format!("malformed introspection reply: {e}"))
        })?;
        if reply.active == Some(false) {
            return Err(Error::Forbidden("token is not active".into()));
        }
        Ok(())
    }
}

/// Accepts exactly the configured tokens. With an empty list every token is denied.
#[derive(Clone, Default)]
pub struct StaticTokenIntrospector {
    tokens: HashSet<String>,
}

impl StaticTokenIntrospector {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self { tokens: tokens.into_iter().collect() }
    }
}

#[async_trait]
impl Introspector for StaticTokenIntrospector {
    async fn introspect(&self, token: &str) -> Result<()> {
        if self.tokens.contains(token) {
            Ok(())
        } else {
            Err(Error::Forbidden("unknown token".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn static_tokens() {
        let intro = StaticTokenIntrospector::new(vec!["good".to_string()]);
        assert!(intro.introspect("good").await.is_ok());
        assert_eq!(intro.introspect("bad").await.unwrap_err().kind(), ErrorKind::Forbidden);

        let empty = StaticTokenIntrospector::default();
        assert!(empty.introspect("good").await.is_err());
    }

    async fn identity_service(status: u16, body: Option<serde_json::Value>, raw: Option<&str>) -> MockServer {
        let server = MockServer::start().await;
        let mut reply = ResponseTemplate::new(status);
        if let Some(body) = body {
            reply = reply.set_body_json(body);
        }
        if let Some(raw) = raw {
            reply = reply.set_body_string(raw);
        }
        Mock::given(method("POST"))
            .and(path("/introspect"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(reply)
            .mount(&server)
            .await;
        server
    }

    async fn introspect_against(server: &MockServer) -> Result<()> {
        let intro = HttpIntrospector::new(format!("{}/introspect", server.uri()), Duration::from_secs(2)).unwrap();
        intro.introspect("tok").await
    }

    #[tokio::test]
    async fn http_accepts_empty_or_active_reply() {
        let server = identity_service(200, None, None).await;
        assert!(introspect_against(&server).await.is_ok());

        let server = identity_service(200, Some(json!({ "active": true })), None).await;
        assert!(introspect_against(&server).await.is_ok());

        let server = identity_service(200, Some(json!({ "sub": "u1" })), None).await;
        assert!(introspect_against(&server).await.is_ok());
    }

    #[tokio::test]
    async fn http_rejections_are_forbidden() {
        let server = identity_service(200, Some(json!({ "active": false })), None).await;
        assert_eq!(introspect_against(&server).await.unwrap_err().kind(), ErrorKind::Forbidden);

        for status in [401, 403] {
            let server = identity_service(status, None, None).await;
            assert_eq!(introspect_against(&server).await.unwrap_err().kind(), ErrorKind::Forbidden, "status {status}");
        }
    }

    #[tokio::test]
    async fn http_server_error_is_internal() {
        let server = identity_service(500, None, None).await;
        assert_eq!(introspect_against(&server).await.unwrap_err().kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn http_malformed_reply_is_internal_not_accepted() {
        let server = identity_service(200, None, Some("<html>token expired</html>")).await;
        assert_eq!(introspect_against(&server).await.unwrap_err().kind(), ErrorKind::Internal);

        let server = identity_service(200, Some(json!({ "active": "false" })), None).await;
        assert_eq!(introspect_against(&server).await.unwrap_err().kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn http_transport_failure_is_internal() {
        // bind then release an ephemeral port so nothing is listening on it
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/introspect", listener.local_addr().unwrap());
        drop(listener);

        let intro = HttpIntrospector::new(url, Duration::from_millis(500)).unwrap();
        let err = intro.introspect("tok").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
