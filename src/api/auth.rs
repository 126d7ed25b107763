use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState};
use crate::services::LoginResult;

const SESSION_USER_KEY: &str = "user_id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// The authenticated caller, placed in request extensions by the middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller from, in order:
/// 1. Session cookie (from login)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Token <key>` or `Authorization: Bearer <key>` header
async fn identify(
    state: &AppState,
    headers: &HeaderMap,
    session: &Session,
) -> Result<Option<CurrentUser>, ApiError> {
    if let Ok(Some(user_id)) = session.get::<i32>(SESSION_USER_KEY).await {
        match state.auth_service().get_user(user_id).await {
            Ok(user) => {
                return Ok(Some(CurrentUser {
                    id: user.id,
                    username: user.username,
                }));
            }
            Err(crate::services::AuthError::UserNotFound) => {
                let _ = session.flush().await;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(key) = extract_api_key(headers)
        && let Some(user) = state.auth_service().verify_api_key(&key).await?
    {
        return Ok(Some(CurrentUser {
            id: user.id,
            username: user.username,
        }));
    }

    Ok(None)
}

/// Rejects the request with 401 unless the caller is authenticated.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(user) = identify(&state, &headers, &session).await? else {
        return Err(ApiError::unauthorized());
    };

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Attaches the caller when credentials are present; anonymous requests
/// pass through untouched.
pub async fn identify_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(user) = identify(&state, &headers, &session).await? {
        tracing::Span::current().record("user_id", user.id);
        request.extensions_mut().insert(user);
    }
    Ok(next.run(request).await)
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.trim().to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str
            .strip_prefix("Token ")
            .or_else(|| auth_str.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with email and password, returns the auth token on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResult>, ApiError> {
    let result = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    session
        .insert(SESSION_USER_KEY, result.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(result))
}

/// POST /auth/logout
/// Ends the session and invalidates the current token
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
) -> Result<impl IntoResponse, ApiError> {
    let _ = session.flush().await;
    state.auth_service().rotate_api_key(user.id).await?;

    tracing::info!(user_id = user.id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_api_key_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_api_key(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Token abc"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("abc"));

        headers.insert("Authorization", HeaderValue::from_static("Bearer def"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("def"));

        headers.insert("X-Api-Key", HeaderValue::from_static("ghi"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("ghi"));
    }

    #[test]
    fn test_extract_api_key_ignores_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(extract_api_key(&headers), None);
    }
}
