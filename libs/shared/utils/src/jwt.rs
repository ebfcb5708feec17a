use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use chrono::{Utc, TimeZone};
use tracing::debug;
use shared_models::auth::{JwtClaims, User};

type HmacSha256 = Hmac<Sha256>;

/// Validates an HS256 Supabase access token and returns the asserted user.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        "Invalid signature encoding".to_string()
    })?;

    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| "Invalid claims encoding".to_string())?;

    let claims: JwtClaims = serde_json::from_str(&claims_json).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        "Invalid claims format".to_string()
    })?;

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let created_at = claims.iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
        metadata: claims.user_metadata,
        created_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}
