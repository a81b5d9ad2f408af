//! Reqwest-backed client for the hosted platform's REST, RPC and auth APIs.
//!
//! The client owns transport details only: URL building, headers, HTTP status
//! mapping and JSON decoding. Table and procedure names live in the adapters.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::{AuthUserDto, RefreshedSessionDto};
use crate::domain::UserId;
use crate::domain::ports::RemoteError;

/// Credentials a client presents on every request.
#[derive(Debug, Clone)]
pub struct PlatformCredentials {
    /// Project API key sent in the `apikey` header.
    pub api_key: String,
    /// Bearer token: a user's access token or the service key.
    pub access_token: String,
    /// Refresh token for user sessions; `None` for service clients.
    pub refresh_token: Option<String>,
}

impl PlatformCredentials {
    /// Credentials for privileged server-side calls.
    pub fn service(api_key: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            access_token: service_key.into(),
            refresh_token: None,
        }
    }
}

#[derive(Debug)]
struct SessionTokens {
    access_token: String,
    refresh_token: Option<String>,
}

/// HTTP client for one platform project.
#[derive(Debug)]
pub struct PlatformClient {
    http: Client,
    base_url: Url,
    api_key: String,
    tokens: RwLock<SessionTokens>,
}

/// A filter or modifier appended to a table query, e.g. `("user_id", "eq.…")`.
pub type QueryParam<'a> = (&'a str, String);

impl PlatformClient {
    /// Build a client using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        credentials: PlatformCredentials,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: with_trailing_slash(base_url),
            api_key: credentials.api_key,
            tokens: RwLock::new(SessionTokens {
                access_token: credentials.access_token,
                refresh_token: credentials.refresh_token,
            }),
        })
    }

    /// Rows of `table` matching `query`, decoded as `T`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[QueryParam<'_>],
    ) -> Result<Vec<T>, RemoteError> {
        let url = self.url(&format!("rest/v1/{table}"), query)?;
        let body = self.send(self.request(Method::GET, url)).await?;
        decode(&body, table)
    }

    /// Insert `row` into `table`.
    pub async fn insert<B: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &B,
    ) -> Result<(), RemoteError> {
        let url = self.url(&format!("rest/v1/{table}"), &[])?;
        let request = self
            .request(Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(row);
        self.send(request).await.map(drop)
    }

    /// Insert `row` or merge it into the row sharing `on_conflict`.
    pub async fn upsert<B: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &B,
        on_conflict: &str,
    ) -> Result<(), RemoteError> {
        let url = self.url(
            &format!("rest/v1/{table}"),
            &[("on_conflict", on_conflict.to_owned())],
        )?;
        let request = self
            .request(Method::POST, url)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row);
        self.send(request).await.map(drop)
    }

    /// Call remote procedure `function` and decode its result.
    pub async fn rpc<B, T>(&self, function: &str, args: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.call_rpc(function, args).await?;
        decode(&body, function)
    }

    /// Call remote procedure `function`, ignoring whatever it returns.
    pub async fn rpc_void<B: Serialize + ?Sized>(
        &self,
        function: &str,
        args: &B,
    ) -> Result<(), RemoteError> {
        self.call_rpc(function, args).await.map(drop)
    }

    /// Exchange the stored refresh token for a new session.
    pub async fn refresh_session(&self) -> Result<(), RemoteError> {
        let refresh_token = self
            .read_tokens(|tokens| tokens.refresh_token.clone())
            .ok_or_else(|| RemoteError::unauthorized("no refresh token in session"))?;
        let url = self.url("auth/v1/token", &[("grant_type", "refresh_token".to_owned())])?;
        let request = self
            .request(Method::POST, url)
            .json(&serde_json::json!({ "refresh_token": refresh_token }));
        let body = self.send(request).await?;
        let session: RefreshedSessionDto = decode(&body, "token")?;
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        tokens.access_token = session.access_token;
        tokens.refresh_token = Some(session.refresh_token);
        debug!("platform session refreshed");
        Ok(())
    }

    /// Resolve the user an access token belongs to.
    pub async fn user_for_token(&self, access_token: &str) -> Result<UserId, RemoteError> {
        let url = self.url("auth/v1/user", &[])?;
        let request = self
            .http
            .get(url)
            .header("apikey", self.api_key.as_str())
            .header(AUTHORIZATION, format!("Bearer {access_token}"));
        let body = self.send(request).await?;
        let user: AuthUserDto = decode(&body, "user")?;
        user.into_domain_user_id().map_err(RemoteError::malformed)
    }

    /// Delete an account through the admin API.
    pub async fn delete_auth_user(&self, user_id: &UserId) -> Result<(), RemoteError> {
        let url = self.url(&format!("auth/v1/admin/users/{user_id}"), &[])?;
        self.send(self.request(Method::DELETE, url)).await.map(drop)
    }

    async fn call_rpc<B: Serialize + ?Sized>(
        &self,
        function: &str,
        args: &B,
    ) -> Result<Vec<u8>, RemoteError> {
        let url = self.url(&format!("rest/v1/rpc/{function}"), &[])?;
        self.send(self.request(Method::POST, url).json(args)).await
    }

    fn url(&self, path: &str, query: &[QueryParam<'_>]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.join(path).map_err(|error| {
            RemoteError::rejected(0_u16, format!("invalid platform path {path}: {error}"))
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self.read_tokens(|tokens| format!("Bearer {}", tokens.access_token));
        self.http
            .request(method, url)
            .header("apikey", self.api_key.as_str())
            .header(AUTHORIZATION, bearer)
            .header(CONTENT_TYPE, "application/json")
    }

    fn read_tokens<T>(&self, read: impl FnOnce(&SessionTokens) -> T) -> T {
        let tokens = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
        read(&tokens)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, RemoteError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

pub(super) fn decode<T: DeserializeOwned>(body: &[u8], source: &str) -> Result<T, RemoteError> {
    serde_json::from_slice(body).map_err(|error| {
        RemoteError::malformed(format!("invalid {source} payload: {error}"))
    })
}

fn map_transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::transport(format!("timed out: {error}"))
    } else {
        RemoteError::transport(error.to_string())
    }
}

pub(super) fn map_status_error(status: StatusCode, body: &[u8]) -> RemoteError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::UNAUTHORIZED => RemoteError::unauthorized(message),
        StatusCode::FORBIDDEN => RemoteError::forbidden(message),
        StatusCode::NOT_FOUND => RemoteError::not_found(message),
        _ if status.is_client_error() => RemoteError::rejected(status.as_u16(), message),
        _ => RemoteError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for the non-network helpers.

    use super::*;
    use rstest::rstest;

    fn client(base: &str) -> PlatformClient {
        PlatformClient::new(
            Url::parse(base).expect("valid url"),
            PlatformCredentials::service("anon", "service"),
            Duration::from_secs(5),
        )
        .expect("client builds")
    }

    #[rstest]
    #[case("https://project.example.test")]
    #[case("https://project.example.test/")]
    fn urls_are_rooted_at_the_project(#[case] base: &str) {
        let url = client(base)
            .url(
                "rest/v1/reward_grants",
                &[("user_id", "eq.abc".to_owned()), ("limit", "1".to_owned())],
            )
            .expect("url builds");
        assert_eq!(
            url.as_str(),
            "https://project.example.test/rest/v1/reward_grants?user_id=eq.abc&limit=1"
        );
    }

    #[rstest]
    fn base_paths_are_preserved() {
        let url = client("https://gateway.example.test/platform")
            .url("rest/v1/rpc/has_role", &[])
            .expect("url builds");
        assert_eq!(
            url.as_str(),
            "https://gateway.example.test/platform/rest/v1/rpc/has_role"
        );
    }

    #[rstest]
    fn timestamps_in_filters_are_escaped() {
        let url = client("https://project.example.test")
            .url(
                "rest/v1/reward_grants",
                &[("created_at", "gte.2026-05-01T10:00:00+00:00".to_owned())],
            )
            .expect("url builds");
        assert_eq!(url.query(), Some("created_at=gte.2026-05-01T10%3A00%3A00%2B00%3A00"));
    }

    #[rstest]
    #[case::unauthorized(StatusCode::UNAUTHORIZED, "Unauthorized")]
    #[case::forbidden(StatusCode::FORBIDDEN, "Forbidden")]
    #[case::not_found(StatusCode::NOT_FOUND, "NotFound")]
    #[case::conflict(StatusCode::CONFLICT, "Rejected")]
    #[case::server_error(StatusCode::BAD_GATEWAY, "Transport")]
    fn maps_http_statuses_to_remote_errors(#[case] status: StatusCode, #[case] expected: &str) {
        let error = map_status_error(status, b"{\"message\":\"nope\"}");
        let matched = match expected {
            "Unauthorized" => matches!(error, RemoteError::Unauthorized { .. }),
            "Forbidden" => matches!(error, RemoteError::Forbidden { .. }),
            "NotFound" => matches!(error, RemoteError::NotFound { .. }),
            "Rejected" => matches!(error, RemoteError::Rejected { status: 409, .. }),
            "Transport" => matches!(error, RemoteError::Transport { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} mapped to {error:?}");
    }

    #[rstest]
    fn long_bodies_are_truncated_in_messages() {
        let body = "x ".repeat(400);
        let error = map_status_error(StatusCode::INTERNAL_SERVER_ERROR, body.as_bytes());
        let message = error.to_string();
        assert!(message.ends_with("..."), "message: {message}");
        assert!(message.len() < 260);
    }

    #[rstest]
    fn undecodable_bodies_are_malformed() {
        let error = decode::<Vec<u32>>(b"{\"oops\":true}", "feature_flags")
            .expect_err("decode fails");
        assert!(matches!(error, RemoteError::Malformed { .. }));
        assert!(error.to_string().contains("feature_flags"));
    }
}
