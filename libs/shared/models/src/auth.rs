use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

/// Identity as asserted by a validated token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Doctor,
    Patient,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Doctor => write!(f, "doctor"),
            UserRole::Patient => write!(f, "patient"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    Forbidden(String),
}

/// Authenticated caller. `role` is `None` until the user has created a profile.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub token: String,
    pub role: Option<UserRole>,
}

/// Per-request authorization capability, built once by the auth middleware
/// and handed to every handler.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    identity: Option<Identity>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self { identity: Some(identity) }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.identity.as_ref().map(|identity| identity.user_id)
    }

    pub fn role(&self) -> Option<UserRole> {
        self.identity.as_ref().and_then(|identity| identity.role)
    }

    /// Bearer token forwarded to the store so row-level policies apply.
    pub fn token(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.token.as_str())
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.role() == Some(role)
    }

    pub fn require_identity(&self) -> Result<&Identity, AccessError> {
        self.identity.as_ref().ok_or(AccessError::NotAuthenticated)
    }

    pub fn require_role(&self, role: UserRole, action: &str) -> Result<&Identity, AccessError> {
        let identity = self.require_identity()?;
        if identity.role != Some(role) {
            return Err(AccessError::Forbidden(format!("Only {}s can {}", role, action)));
        }
        Ok(identity)
    }

    /// Succeeds only when the caller is `owner`.
    pub fn ensure_is(&self, owner: Uuid) -> Result<&Identity, AccessError> {
        let identity = self.require_identity()?;
        if identity.user_id != owner {
            return Err(AccessError::Forbidden("Unauthorized".to_string()));
        }
        Ok(identity)
    }
}
