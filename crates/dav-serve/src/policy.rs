//! Access policy applied to every request before it reaches the WebDAV engine.
//!
//! Two independent checks run in order: Basic authentication (only when
//! credentials are configured), then the read-only method filter (only when
//! read-only mode is on). The first failing check answers the request.

use crate::config::{Credentials, ServerConfig};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use dav_server::body::Body;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use log::debug;

/// Challenge sent with every 401.
const AUTH_CHALLENGE: &str = r#"Basic realm="Restricted""#;

/// Methods refused in read-only mode. Anything else passes, LOCK included.
const READ_ONLY_BLOCKED: [&str; 6] = ["PUT", "DELETE", "PROPPATCH", "MKCOL", "COPY", "MOVE"];

/// Credentials decoded from an `Authorization: Basic` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    /// Decode the `Authorization` header.
    ///
    /// Returns `None` when the header is missing, uses another scheme, or is
    /// not valid base64 `user:password`.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        Self::parse(value)
    }

    fn parse(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn matches(&self, expected: &Credentials) -> bool {
        self.username == expected.username && self.password == expected.password
    }
}

/// The parts of a request the policy looks at.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub credentials: Option<BasicCredentials>,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            credentials: BasicCredentials::from_headers(req.headers()),
        }
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No usable Basic credentials were supplied.
    MissingCredentials,
    /// Credentials were supplied but do not match.
    InvalidCredentials,
    /// The method modifies the tree and the server is read-only.
    ReadOnly,
}

impl Rejection {
    pub fn status(self) -> StatusCode {
        match self {
            Rejection::MissingCredentials | Rejection::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Rejection::ReadOnly => StatusCode::FORBIDDEN,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Rejection::MissingCredentials | Rejection::InvalidCredentials => {
                "WebDAV: need authorized!"
            }
            Rejection::ReadOnly => "WebDAV: Read Only!!!",
        }
    }

    /// Plain-text error response for this rejection.
    pub fn into_response(self) -> Response<Body> {
        let mut resp = plain_text(self.status(), self.message());
        if self.status() == StatusCode::UNAUTHORIZED {
            resp.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(AUTH_CHALLENGE),
            );
        }
        resp
    }
}

/// Outcome of [`AccessPolicy::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Rejection),
}

/// Authentication and read-only gate.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    credentials: Option<Credentials>,
    read_only: bool,
}

impl AccessPolicy {
    pub fn new(credentials: Option<Credentials>, read_only: bool) -> Self {
        Self {
            credentials,
            read_only,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.credentials(), config.read_only)
    }

    /// Whether Basic authentication is enforced.
    pub fn requires_auth(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Run the authentication check, then the read-only check.
    pub fn check(&self, ctx: &RequestContext) -> Decision {
        if let Some(expected) = &self.credentials {
            match &ctx.credentials {
                None => return self.deny(ctx, Rejection::MissingCredentials),
                Some(given) if !given.matches(expected) => {
                    return self.deny(ctx, Rejection::InvalidCredentials)
                }
                Some(_) => {}
            }
        }

        if self.read_only && is_write_method(&ctx.method) {
            return self.deny(ctx, Rejection::ReadOnly);
        }

        Decision::Allow
    }

    fn deny(&self, ctx: &RequestContext, rejection: Rejection) -> Decision {
        debug!(
            "Rejected {} {}: {:?} ({})",
            ctx.method,
            ctx.path,
            rejection,
            rejection.status()
        );
        Decision::Deny(rejection)
    }
}

/// Whether read-only mode refuses this method.
pub fn is_write_method(method: &Method) -> bool {
    READ_ONLY_BLOCKED.contains(&method.as_str())
}

fn plain_text(status: StatusCode, message: &str) -> Response<Body> {
    let mut resp = Response::new(Body::from(format!("{}\n", message)));
    *resp.status_mut() = status;
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    resp
}
