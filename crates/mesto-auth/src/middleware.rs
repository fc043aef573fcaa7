//! Authentication middleware for Axum

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;
use crate::jwt::{JwtManager, RejectReason};

/// Identity resolved by the gate for the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// This is the only place a token is read from a request.
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, RejectReason> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(RejectReason::MissingToken)?
        .to_str()
        .map_err(|_| RejectReason::MalformedHeader)?;

    // The auth scheme is case-insensitive
    let (scheme, token) = header
        .split_once(' ')
        .ok_or(RejectReason::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(RejectReason::MalformedHeader);
    }
    let token = token.trim();

    if token.is_empty() {
        return Err(RejectReason::MalformedHeader);
    }
    Ok(token)
}

/// Resolve the caller's identity from request headers as of `now`
pub fn authorize(
    headers: &HeaderMap,
    jwt: &JwtManager,
    now: DateTime<Utc>,
) -> Result<AuthUser, AuthError> {
    let resolved = extract_bearer_token(headers)
        .and_then(|token| jwt.check(token, now))
        .and_then(|claims| claims.user_id().ok_or(RejectReason::InvalidSubject));

    match resolved {
        Ok(id) => Ok(AuthUser { id }),
        Err(reason) => {
            debug!("Request rejected by auth gate: {}", reason);
            metrics::counter!("mesto_auth_rejections_total").increment(1);
            Err(AuthError::Unauthorized)
        }
    }
}

/// Authentication middleware
///
/// Rejects the request with 401 unless it carries a valid bearer token;
/// otherwise adds the [`AuthUser`] to the request extensions.
pub async fn require_auth(
    State(jwt): State<Arc<JwtManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authorize(request.headers(), &jwt, Utc::now())?;

    debug!("Authenticated user: {}", user.id);

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AuthError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::StaticSecret;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{HeaderValue, StatusCode},
        routing::get,
    };
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn jwt() -> Arc<JwtManager> {
        Arc::new(JwtManager::new(Arc::new(StaticSecret::new("test-secret-key"))))
    }

    /// Router whose only handler counts its invocations
    fn spy_app(jwt: Arc<JwtManager>) -> (Router, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = Router::new()
            .route(
                "/users/me",
                get(move |user: AuthUser| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        user.id.to_string()
                    }
                }),
            )
            .layer(axum::middleware::from_fn_with_state(jwt, require_auth));
        (app, calls)
    }

    fn request(authorization: Option<String>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/users/me");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(app: Router, request: Request) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_missing_token_never_reaches_handler() {
        let (app, calls) = spy_app(jwt());

        let (status, body) = send(app, request(None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Authorization required"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_token_resolves_identity() {
        let jwt = jwt();
        let user_id = Uuid::new_v4();
        let token = jwt.generate_token(user_id).unwrap().token;
        let (app, calls) = spy_app(jwt);

        let (status, body) = send(app, request(Some(format!("Bearer {}", token)))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user_id.to_string());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_token_rejected_like_missing_token() {
        let jwt = jwt();
        let issued_at = Utc::now() - Duration::days(8);
        let token = jwt.issue(Uuid::new_v4(), issued_at).unwrap().token;

        let (app, calls) = spy_app(jwt.clone());
        let expired = send(app, request(Some(format!("Bearer {}", token)))).await;
        let (app, _) = spy_app(jwt);
        let missing = send(app, request(None)).await;

        assert_eq!(expired, missing);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_foreign_and_malformed_tokens_rejected() {
        let foreign = JwtManager::new(Arc::new(StaticSecret::new("other-secret")))
            .generate_token(Uuid::new_v4())
            .unwrap()
            .token;

        for header in [
            format!("Bearer {}", foreign),
            "Bearer not-a-jwt".to_string(),
            "Bearer ".to_string(),
            format!("Basic {}", foreign),
        ] {
            let (app, calls) = spy_app(jwt());
            let (status, _) = send(app, request(Some(header))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), Err(RejectReason::MissingToken));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers), Ok("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers), Ok("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("BEARER abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers), Ok("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert_eq!(extract_bearer_token(&headers), Err(RejectReason::MalformedHeader));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(extract_bearer_token(&headers), Err(RejectReason::MalformedHeader));
    }

    #[test]
    fn test_authorize_is_pure_over_time() {
        let jwt = jwt();
        let user_id = Uuid::new_v4();
        let issued_at = Utc::now();
        let token = jwt.issue(user_id, issued_at).unwrap().token;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        let within = issued_at + Duration::days(6);
        assert_eq!(authorize(&headers, &jwt, within).unwrap(), AuthUser { id: user_id });

        let after = issued_at + Duration::days(7) + Duration::seconds(1);
        assert!(matches!(
            authorize(&headers, &jwt, after),
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_extractor_without_gate_rejects() {
        let app = Router::new().route(
            "/open",
            get(|user: AuthUser| async move { user.id.to_string() }),
        );

        let request = axum::http::Request::builder()
            .uri("/open")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
