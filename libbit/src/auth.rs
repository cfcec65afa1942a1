//! The auth callback port a caller plugs in to answer for credentials
//! without the transport layer holding onto them any longer than a single
//! request: [`crate::transport::http::HttpTransport`] calls [`AuthCallback`]
//! on a 401/203 and retries exactly once, reporting the outcome back via
//! [`AuthCallback::auth_success`]/[`AuthCallback::auth_failure`] the same way
//! a caller would want to know to update a stored credential.

use async_trait::async_trait;

/// Credentials offered to, or returned from, an [`AuthCallback`].
#[derive(Debug, Clone, Default)]
pub struct AuthInfo {
    pub username: Option<String>,
    pub password: Option<String>,
    /// extra headers to attach verbatim (e.g. a bearer token), in addition
    /// to or instead of HTTP basic auth derived from `username`/`password`.
    pub headers: Vec<(String, String)>,
}

impl AuthInfo {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.headers.is_empty()
    }
}

/// What [`AuthCallback::auth_fill`] hands back: either something to retry
/// the request with, or a request to give up cleanly.
#[derive(Debug, Clone, Default)]
pub struct AuthFill {
    pub info: AuthInfo,
    pub cancel: bool,
}

#[async_trait]
pub trait AuthCallback: Send + Sync {
    /// called on the first 401/203; `prior` is `Some` on the retry after an
    /// earlier `auth_fill` turned out to be rejected.
    async fn auth_fill(&self, url: &str, prior: Option<&AuthInfo>) -> AuthFill;

    /// the retried request succeeded with `auth`.
    async fn auth_success(&self, _url: &str, _auth: &AuthInfo) {}

    /// the retried request was rejected again; no further retry is attempted.
    async fn auth_failure(&self, _url: &str, _auth: &AuthInfo) {}
}

/// Always declines, i.e. the behaviour of a transport with no callback
/// configured: the original 401/203 is reported as-is.
pub struct NoAuth;

#[async_trait]
impl AuthCallback for NoAuth {
    async fn auth_fill(&self, _url: &str, _prior: Option<&AuthInfo>) -> AuthFill {
        AuthFill { info: AuthInfo::default(), cancel: true }
    }
}
