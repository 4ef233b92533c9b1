//! Session authentication middleware
//!
//! Gates every mutating endpoint. The session token comes from the
//! `session_token` cookie or an `Authorization: Bearer` header; once verified,
//! the acting [`OperatorIdentity`] is placed in the request extensions.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use roster_auth::SessionSigner;
use roster_core::OperatorIdentity;
use std::sync::Arc;
use tracing::debug;

use crate::models::ErrorResponse;

pub const SESSION_COOKIE: &str = "session_token";

fn unauthorized(error: impl Into<String>, code: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: error.into(),
            code: Some(code.to_string()),
        }),
    )
}

/// Session token from the cookie header, if present
fn token_from_cookie(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{}=", SESSION_COOKIE);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .map(str::trim)
        .find_map(|c| c.strip_prefix(prefix.as_str()))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Require a valid operator session.
///
/// Responds 401 when the token is missing, malformed, expired, signed with a
/// different secret or not a session token.
pub async fn require_auth(
    State(signer): State<Arc<SessionSigner>>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let token = match token_from_cookie(request.headers()) {
        Some(token) => token,
        None => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| {
                    unauthorized(
                        "Missing authentication token (cookie or Authorization header)",
                        "MISSING_AUTH",
                    )
                })?;

            auth_header
                .strip_prefix("Bearer ")
                .ok_or_else(|| {
                    unauthorized(
                        "Invalid Authorization header format. Expected 'Bearer <token>'",
                        "INVALID_AUTH_FORMAT",
                    )
                })?
                .to_string()
        }
    };

    let claims = signer.verify(&token).map_err(|e| {
        debug!(error = %e, "Rejected session token");
        unauthorized(format!("Invalid or expired token: {}", e), "INVALID_TOKEN")
    })?;

    let operator_id = claims
        .operator_id()
        .map_err(|_| unauthorized("Token subject is not an operator id", "INVALID_TOKEN"))?;

    request
        .extensions_mut()
        .insert(OperatorIdentity::new(operator_id, claims.username));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, middleware, routing::get, Router};
    use chrono::Duration;
    use roster_auth::SessionClaims;
    use tower::ServiceExt; // For oneshot()
    use uuid::Uuid;

    const SECRET: &[u8] = b"test-secret-key";

    async fn whoami(
        axum::Extension(operator): axum::Extension<OperatorIdentity>,
    ) -> Json<OperatorIdentity> {
        Json(operator)
    }

    fn signer() -> Arc<SessionSigner> {
        Arc::new(SessionSigner::new(SECRET, Duration::hours(1)))
    }

    fn create_test_app() -> Router {
        let signer = signer();
        Router::new()
            .route("/protected", get(whoami))
            .layer(middleware::from_fn_with_state(signer.clone(), require_auth))
            .with_state(signer)
    }

    async fn error_body(response: Response) -> ErrorResponse {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_bearer_token_injects_operator() {
        let operator_id = Uuid::new_v4();
        let token = signer().issue(operator_id, "admin").unwrap();

        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let identity: OperatorIdentity = serde_json::from_slice(&body).unwrap();
        assert_eq!(identity.operator_id, operator_id);
        assert_eq!(identity.username, "admin");
    }

    #[tokio::test]
    async fn test_cookie_token_accepted() {
        let token = signer().issue(Uuid::new_v4(), "admin").unwrap();

        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("Cookie", format!("theme=dark; session_token={}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let error = error_body(response).await;
        assert_eq!(error.code.as_deref(), Some("MISSING_AUTH"));
    }

    #[tokio::test]
    async fn test_invalid_bearer_format() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("Authorization", "Token abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let error = error_body(response).await;
        assert_eq!(error.code.as_deref(), Some("INVALID_AUTH_FORMAT"));
    }

    #[tokio::test]
    async fn test_expired_and_foreign_tokens_rejected() {
        let expired = signer()
            .encode(&SessionClaims::new(
                Uuid::new_v4(),
                "admin",
                Duration::seconds(-10),
            ))
            .unwrap();
        let foreign = SessionSigner::new(b"other-secret", Duration::hours(1))
            .issue(Uuid::new_v4(), "admin")
            .unwrap();

        for token in [expired, foreign] {
            let response = create_test_app()
                .oneshot(
                    Request::builder()
                        .uri("/protected")
                        .header("Authorization", format!("Bearer {}", token))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let error = error_body(response).await;
            assert_eq!(error.code.as_deref(), Some("INVALID_TOKEN"));
        }
    }

    #[test]
    fn test_token_from_cookie_ignores_empty_value() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "session_token=; other=1".parse().unwrap());
        assert_eq!(token_from_cookie(&headers), None);

        headers.insert(header::COOKIE, "a=1; session_token=abc".parse().unwrap());
        assert_eq!(token_from_cookie(&headers).as_deref(), Some("abc"));
    }
}
