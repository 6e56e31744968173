//! Session middleware for axum.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{LOCATION, SET_COOKIE},
        StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{
    cookie_value, ClearCookie, CookieSigner, GateDecision, SessionGate, AUTH_COOKIE_NAME,
};

/// Everything the session middleware needs, built once at startup.
#[derive(Clone)]
pub struct SessionAuth {
    pub gate: SessionGate,
    pub signer: CookieSigner,
}

impl SessionAuth {
    pub fn new(gate: SessionGate, signer: CookieSigner) -> Self {
        Self { gate, signer }
    }

    /// Pull the session token out of the signed `auth` cookie.
    ///
    /// A cookie whose envelope does not verify counts as no cookie.
    fn session_token(&self, request: &Request<Body>) -> Option<String> {
        let raw = cookie_value(request.headers(), AUTH_COOKIE_NAME)?;
        self.signer
            .unsign(AUTH_COOKIE_NAME, raw)
            .map_err(|e| {
                tracing::debug!(error = %e, "Ignoring session cookie with bad envelope");
            })
            .ok()
    }
}

/// Require a valid session cookie.
///
/// On success the caller's [`Claims`](crate::auth::Claims) are added to the
/// request extensions. Otherwise the caller is redirected to the login page,
/// with the stale cookie cleared when the token had expired.
pub async fn require_session(
    State(auth): State<SessionAuth>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = auth.session_token(&request);

    match auth.gate.authorize(token.as_deref()) {
        GateDecision::Authenticated(claims) => {
            // Add claims to request extensions for handlers to access
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        GateDecision::Redirect { target } => {
            tracing::info!(path = %request.uri().path(), status = 401, "Unauthenticated request");
            login_redirect(&target, None)
        }
        GateDecision::ClearAndRedirect { target, cookie } => {
            tracing::info!(path = %request.uri().path(), status = 401, "Expired session");
            login_redirect(&target, Some(&cookie))
        }
    }
}

fn login_redirect(target: &str, clear: Option<&ClearCookie>) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, target);
    if let Some(cookie) = clear {
        builder = builder.header(SET_COOKIE, cookie.header_value());
    }

    builder.body(Body::empty()).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build login redirect");
        StatusCode::UNAUTHORIZED.into_response()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_tokens::{claims_expiring_in, sign, SECRET};
    use crate::auth::Claims;
    use axum::{http::header::COOKIE, middleware, routing::get, Extension, Router};
    use chrono::{Duration, Utc};
    use jsonwebtoken::Algorithm;
    use tower::ServiceExt;

    const COOKIE_SECRET: &str = "test-cookie-secret";

    fn app() -> Router {
        let auth = SessionAuth::new(
            SessionGate::new(SECRET, "https://auth.example.com", "example.com"),
            CookieSigner::new(COOKIE_SECRET),
        );

        async fn whoami(Extension(claims): Extension<Claims>) -> String {
            claims.subject().unwrap_or_default().to_string()
        }

        Router::new()
            .route("/", get(whoami))
            .layer(middleware::from_fn_with_state(auth, require_session))
    }

    fn cookie_header(token: &str) -> String {
        let signed = CookieSigner::new(COOKIE_SECRET).sign_at(
            AUTH_COOKIE_NAME,
            token,
            Utc::now().timestamp(),
        );
        format!("{}=\"{}\"", AUTH_COOKIE_NAME, signed)
    }

    async fn send(cookie: Option<String>) -> Response {
        let mut builder = Request::builder().uri("/");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_cookie_redirects() {
        let response = send(None).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[LOCATION],
            "https://auth.example.com/login"
        );
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_expired_token_clears_cookie() {
        let token = sign(&claims_expiring_in(Duration::hours(-2)), SECRET, Algorithm::HS256);
        let response = send(Some(cookie_header(&token))).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("auth=;"));
        assert!(set_cookie.contains("Domain=example.com"));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn test_forged_token_redirects_without_clearing() {
        let token = sign(&claims_expiring_in(Duration::hours(1)), "forged", Algorithm::HS256);
        let response = send(Some(cookie_header(&token))).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_unsigned_cookie_is_ignored() {
        let token = sign(&claims_expiring_in(Duration::hours(1)), SECRET, Algorithm::HS256);
        let response = send(Some(format!("auth={token}"))).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_valid_session_reaches_handler() {
        let token = sign(&claims_expiring_in(Duration::hours(1)), SECRET, Algorithm::HS256);
        let response = send(Some(cookie_header(&token))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(&body[..], b"employee-42");
    }
}
