//! Account creation, sign-in and sign-out routes

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::IntoResponse,
    routing::{get, post},
};
use mesto_auth::{AuthError, AuthUser, hash_password};
use mesto_db::{DEFAULT_USER_ABOUT, DEFAULT_USER_AVATAR, DEFAULT_USER_NAME, NewUser};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

use super::types::{MessageResponse, SigninRequest, SigninResponse, SignupRequest, UserResponse};
use super::validation::{
    validate_email, validate_new_password, validate_password_length, validate_text, validate_url,
};

/// Cookie a browser client may hold the token in
const TOKEN_COOKIE: &str = "jwt";

/// POST /signup
async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_email(&request.email)?;
    validate_new_password(&request.password)?;
    if let Some(name) = &request.name {
        validate_text("name", name)?;
    }
    if let Some(about) = &request.about {
        validate_text("about", about)?;
    }
    if let Some(avatar) = &request.avatar {
        validate_url("avatar", avatar)?;
    }

    debug!("Creating account for a new user");

    let password_hash = hash_password(&request.password)?;

    let user = state
        .db
        .insert_user(NewUser {
            name: request.name.unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            about: request.about.unwrap_or_else(|| DEFAULT_USER_ABOUT.to_string()),
            avatar: request.avatar.unwrap_or_else(|| DEFAULT_USER_AVATAR.to_string()),
            email: request.email,
            password_hash,
        })
        .await?;

    metrics::counter!("mesto_signups_total").increment(1);
    info!("Created user {}", user.id);

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /signin
async fn signin(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SigninRequest>,
) -> Result<Json<SigninResponse>, ApiError> {
    // Shape checks only; anything else is decided by the credential check
    if request.email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }
    validate_password_length(&request.password)?;

    let user = match state
        .credentials
        .verify_credentials(&request.email, &request.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            metrics::counter!("mesto_logins_total", "outcome" => "failure").increment(1);
            warn!("Failed sign-in attempt");
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    let issued = state.jwt.generate_token(user.id)?;

    metrics::counter!("mesto_logins_total", "outcome" => "success").increment(1);
    info!("User {} signed in", user.id);

    Ok(Json(SigninResponse {
        user: UserResponse::from(user),
        token: issued.token,
        expires_in: state.jwt.ttl().num_seconds(),
    }))
}

/// GET /signout
///
/// Tokens are stateless, so this only tells the browser to drop its cookie.
/// A token the client keeps stays valid until it expires.
async fn signout(user: AuthUser) -> impl IntoResponse {
    debug!("User {} signed out", user.id);

    let clear_cookie = format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Strict",
        TOKEN_COOKIE
    );
    (
        [(SET_COOKIE, clear_cookie)],
        Json(MessageResponse {
            message: "Signed out".to_string(),
        }),
    )
}

/// Routes reachable without a token
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}

/// Routes behind the auth gate
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/signout", get(signout))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{TestApp, signup_body};
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn test_signup_returns_public_profile_only() {
        let app = TestApp::new().await;

        let (status, body) = app.post("/signup", None, signup_body("a@b.com", "correct123")).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["email"], "a@b.com");
        assert_eq!(body["name"], "Jacques-Yves Cousteau");
        assert!(body.get("password").is_none());
        assert!(body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let app = TestApp::new().await;
        app.post("/signup", None, signup_body("a@b.com", "correct123")).await;

        let (status, _) = app.post("/signup", None, signup_body("a@b.com", "other1234")).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let app = TestApp::new().await;

        let (status, _) = app.post("/signup", None, signup_body("not-an-email", "correct123")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .post(
                "/signup",
                None,
                json!({ "email": "a@b.com", "password": "correct123", "avatar": "nope" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app.post("/signup", None, json!({ "email": "a@b.com" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_signin_issues_seven_day_token() {
        let app = TestApp::new().await;
        let user_id = app.create_user("a@b.com", "correct123").await;

        let (status, body) = app
            .post("/signin", None, json!({ "email": "a@b.com", "password": "correct123" }))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["_id"], user_id.to_string());
        assert_eq!(body["expires_in"], 7 * 24 * 3600);

        let token = body["token"].as_str().unwrap();
        let claims = app.state.jwt.validate_token(token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let app = TestApp::new().await;
        app.create_user("a@b.com", "correct123").await;

        let wrong_password = app
            .post("/signin", None, json!({ "email": "a@b.com", "password": "wrong" }))
            .await;
        let unknown_email = app
            .post("/signin", None, json!({ "email": "x@b.com", "password": "correct123" }))
            .await;

        assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
        assert!(wrong_password.1.get("token").is_none());
        assert_eq!(wrong_password, unknown_email);
    }

    #[tokio::test]
    async fn test_concurrent_signins_yield_distinct_tokens() {
        let app = TestApp::new().await;
        let first_id = app.create_user("a@b.com", "correct123").await;
        let second_id = app.create_user("c@d.com", "correct456").await;

        let (first, second) = tokio::join!(
            app.post("/signin", None, json!({ "email": "a@b.com", "password": "correct123" })),
            app.post("/signin", None, json!({ "email": "c@d.com", "password": "correct456" })),
        );

        assert_eq!(first.0, StatusCode::OK);
        assert_eq!(second.0, StatusCode::OK);
        assert_ne!(first.1["token"], second.1["token"]);
        assert_eq!(first.1["_id"], first_id.to_string());
        assert_eq!(second.1["_id"], second_id.to_string());
    }

    #[tokio::test]
    async fn test_login_scenario_within_and_after_seven_days() {
        let app = TestApp::new().await;
        let user_id = app.create_user("a@b.com", "correct123").await;

        let (_, body) = app
            .post("/signin", None, json!({ "email": "a@b.com", "password": "correct123" }))
            .await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, me) = app.get("/users/me", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["_id"], user_id.to_string());

        // The same subject, issued more than seven days ago
        let stale = app
            .state
            .jwt
            .issue(user_id, Utc::now() - Duration::days(7) - Duration::seconds(1))
            .unwrap()
            .token;
        let (status, body) = app.get("/users/me", Some(&stale)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Authorization required");
    }

    #[tokio::test]
    async fn test_signout_clears_cookie_but_token_survives() {
        let app = TestApp::new().await;
        let user_id = app.create_user("a@b.com", "correct123").await;
        let token = app.token_for(user_id);

        let response = app.raw_get("/signout", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()["set-cookie"].to_str().unwrap();
        assert!(cookie.starts_with("jwt=;"));
        assert!(cookie.contains("Max-Age=0"));

        let (status, _) = app.get("/users/me", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
    }
}
