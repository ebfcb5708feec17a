use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::{AuthContext, Identity, UserRole};
use shared_models::error::AppError;

use crate::jwt::validate_token;

#[derive(Debug, Deserialize)]
struct RoleRow {
    role: UserRole,
}

/// Builds the request's `AuthContext`. Requests without an `Authorization`
/// header proceed anonymously; a header that fails validation is rejected.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let context = match bearer_token(request.headers())? {
        None => AuthContext::anonymous(),
        Some(token) => {
            let user = validate_token(&token, &config.supabase_jwt_secret)
                .map_err(AppError::Auth)?;

            let user_id = Uuid::parse_str(&user.id)
                .map_err(|_| AppError::Auth("Token subject is not a user id".to_string()))?;

            let role = lookup_role(&config, user_id, &token).await?;
            debug!("Request authenticated for user {} (role: {:?})", user_id, role);

            AuthContext::authenticated(Identity {
                user_id,
                email: user.email,
                token,
                role,
            })
        }
    };

    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    if !headers.contains_key(AUTHORIZATION) {
        return Ok(None);
    }

    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| Some(auth.token().to_string()))
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

/// The role lives on the caller's profile row; it is read once per request.
async fn lookup_role(config: &AppConfig, user_id: Uuid, token: &str) -> Result<Option<UserRole>, AppError> {
    let supabase = SupabaseClient::new(config);
    let path = format!("/rest/v1/user_profiles?user_id=eq.{}&select=role", user_id);

    match supabase.select_one::<RoleRow>(&path, Some(token)).await {
        Ok(row) => Ok(row.map(|row| row.role)),
        Err(e) => {
            warn!("Failed to load role for user {}: {}", user_id, e);
            Err(AppError::from(e))
        }
    }
}
