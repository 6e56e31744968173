//! The per-request authentication decision.
//!
//! [`SessionGate::authorize`] is pure: it returns instructions (redirect,
//! clear a cookie) and leaves carrying them out to the HTTP layer.

use crate::auth::cookie::AUTH_COOKIE_NAME;
use crate::auth::jwt::{Claims, GateError, TokenVerifier};

/// Instruction to expire a cookie on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearCookie {
    pub name: String,
    pub http_only: bool,
    pub secure: bool,
    pub domain: String,
}

impl ClearCookie {
    /// Render as a `Set-Cookie` header value.
    pub fn header_value(&self) -> String {
        let mut value = format!(
            "{}=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; Path=/",
            self.name
        );
        if !self.domain.is_empty() {
            value.push_str("; Domain=");
            value.push_str(&self.domain);
        }
        if self.http_only {
            value.push_str("; HttpOnly");
        }
        if self.secure {
            value.push_str("; Secure");
        }
        value
    }
}

/// Outcome of gating one request.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Caller holds a valid session.
    Authenticated(Claims),
    /// Send the caller to log in; leave cookies alone.
    Redirect { target: String },
    /// Expire the stale session cookie, then send the caller to log in.
    ClearAndRedirect { target: String, cookie: ClearCookie },
}

/// Decides whether a request may proceed based on its session token.
#[derive(Clone)]
pub struct SessionGate {
    verifier: TokenVerifier,
    login_url: String,
    cookie_domain: String,
}

impl SessionGate {
    /// Create a gate from the shared secret, the identity service base URL
    /// and the domain session cookies are scoped to.
    pub fn new(secret: &str, auth_service_url: &str, cookie_domain: &str) -> Self {
        Self {
            verifier: TokenVerifier::new(secret),
            login_url: format!("{}/login", auth_service_url.trim_end_matches('/')),
            cookie_domain: cookie_domain.to_string(),
        }
    }

    /// Where unauthenticated callers are sent.
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Decide the fate of a request carrying `token` (if any).
    pub fn authorize(&self, token: Option<&str>) -> GateDecision {
        let outcome = match token {
            Some(token) => self.verifier.verify(token),
            None => Err(GateError::NoCredential),
        };
        self.decide(outcome)
    }

    fn decide(&self, outcome: Result<Claims, GateError>) -> GateDecision {
        match outcome {
            Ok(claims) => GateDecision::Authenticated(claims),
            Err(GateError::ExpiredCredential) => {
                tracing::debug!("Session token expired, clearing cookie");
                GateDecision::ClearAndRedirect {
                    target: self.login_url.clone(),
                    cookie: ClearCookie {
                        name: AUTH_COOKIE_NAME.to_string(),
                        http_only: true,
                        secure: true,
                        domain: self.cookie_domain.clone(),
                    },
                }
            }
            Err(GateError::NoCredential) => self.redirect(),
            Err(GateError::MalformedOrInvalidCredential(reason)) => {
                tracing::debug!(reason = %reason, "Session token rejected");
                self.redirect()
            }
            Err(GateError::UnexpectedVerificationError(reason)) => {
                // Fail closed
                tracing::error!(error = %reason, "Unexpected session verification failure");
                self.redirect()
            }
        }
    }

    fn redirect(&self) -> GateDecision {
        GateDecision::Redirect {
            target: self.login_url.clone(),
        }
    }
}
