#![forbid(unsafe_code)]

//! API request and response policy.
//!
//! [`ApiClient`] turns calls into [`PreparedRequest`]s and interprets the
//! responses the host hands back. Every request gets the base URL, JSON
//! content type, timeout, and (when signed in) a bearer token. Every
//! response with status 401 signs the session out before the error is
//! returned.

use std::fmt;
use std::time::Duration;

use pnl_runtime::AppConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::auth::{AuthSession, LoginPayload, LoginResponse, TokenPersistence};
use crate::mapper::Mapper;
use crate::user::{User, UserDto, UserMapper};

/// API call failures.
#[derive(Debug)]
pub enum ApiError {
    /// Request body could not be serialized.
    Encode(serde_json::Error),
    /// Response body did not match the expected shape.
    Decode(serde_json::Error),
    /// Non-success HTTP status.
    Status(u16),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Encode(e) => write!(f, "failed to encode request: {e}"),
            ApiError::Decode(e) => write!(f, "failed to decode response: {e}"),
            ApiError::Status(code) => write!(f, "request failed with status {code}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Encode(e) | ApiError::Decode(e) => Some(e),
            ApiError::Status(_) => None,
        }
    }
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully decorated request, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl PreparedRequest {
    /// First header named `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Request/response policy bound to one [`AuthSession`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    session: AuthSession,
}

impl ApiClient {
    /// Client using `config.api_url` and `config.request_timeout`.
    #[must_use]
    pub fn new(config: &AppConfig, session: AuthSession) -> Self {
        Self {
            base_url: config.api_url.clone(),
            timeout: config.request_timeout,
            session,
        }
    }

    #[must_use]
    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Join `path` onto the base URL with exactly one slash between them.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Decorate a request with the base URL, headers and timeout.
    #[must_use]
    pub fn prepare(&self, method: Method, path: &str, body: Option<String>) -> PreparedRequest {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(auth) = self.session.authorization_header() {
            headers.push(("Authorization".to_string(), auth));
        }
        let request = PreparedRequest {
            method,
            url: self.url(path),
            headers,
            body,
            timeout: self.timeout,
        };
        tracing::debug!(method = %request.method, url = %request.url, "request prepared");
        request
    }

    /// [`prepare`](Self::prepare) with a JSON body.
    pub fn prepare_json<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &T,
    ) -> Result<PreparedRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(ApiError::Encode)?;
        Ok(self.prepare(method, path, Some(body)))
    }

    /// Interpret a response: 401 signs out, other failures map to
    /// [`ApiError::Status`], success bodies decode as `T`.
    pub fn handle_response<T: DeserializeOwned>(
        &self,
        status: u16,
        body: &str,
    ) -> Result<T, ApiError> {
        self.session.handle_response_status(status);
        if !(200..300).contains(&status) {
            tracing::debug!(status, "request failed");
            return Err(ApiError::Status(status));
        }
        serde_json::from_str(body).map_err(ApiError::Decode)
    }

    // --- Endpoints ---

    /// `POST /auth/login`.
    pub fn login_request(&self, payload: &LoginPayload) -> Result<PreparedRequest, ApiError> {
        self.prepare_json(Method::Post, "/auth/login", payload)
    }

    /// Store the token from a login response.
    pub fn finish_login(
        &self,
        status: u16,
        body: &str,
        persistence: TokenPersistence,
    ) -> Result<(), ApiError> {
        let response: LoginResponse = self.handle_response(status, body)?;
        self.session.apply_login(response, persistence);
        Ok(())
    }

    /// `GET /users/{id}`.
    #[must_use]
    pub fn user_request(&self, id: &str) -> PreparedRequest {
        self.prepare(Method::Get, &format!("/users/{id}"), None)
    }

    /// Decode a user response into the domain model.
    pub fn parse_user(&self, status: u16, body: &str) -> Result<User, ApiError> {
        let dto: UserDto = self.handle_response(status, body)?;
        Ok(UserMapper.to_domain(dto))
    }
}
