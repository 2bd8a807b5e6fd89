//! Authentication, session tokens and the role-scoped read filter.
//!
//! Login checks a bcrypt hash and issues a signed HS256 token carrying
//! the user's id, username and role. The [`AuthUser`] extractor decodes
//! the bearer token on every protected route and hands handlers a
//! [`RoleScope`]: elevated roles see everything, any other role value is
//! a sub-unit (RW) identifier restricting every read to that RW. This
//! scope is the sole authorization mechanism for reads.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::{ApiError, AuthError, AuthResult};

/// Roles with unrestricted read access across all RWs.
pub const ELEVATED_ROLES: [&str; 3] = ["kelurahan", "admin", "superadmin"];

/// Token lifetime.
const TOKEN_HOURS: i64 = 24;

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password for storage.
pub fn hash_password(password: &str) -> AuthResult<String> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

/// Check a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    Ok(bcrypt::verify(password, hash)?)
}

// =============================================================================
// Session tokens
// =============================================================================

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i32,
    pub username: String,
    pub role: String,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for a logged-in user.
    pub fn issue(&self, id: i32, username: &str, role: &str) -> AuthResult<String> {
        let claims = Claims {
            sub: id,
            username: username.to_string(),
            role: role.to_string(),
            exp: (Utc::now() + Duration::hours(TOKEN_HOURS)).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding,
        )?)
    }

    /// Decode and verify a token.
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

// =============================================================================
// Role scope
// =============================================================================

/// Visibility scope derived from a caller's role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleScope {
    /// Elevated role: no restriction.
    Full,
    /// Any other role value is the RW the caller may see.
    Rw(String),
}

impl RoleScope {
    pub fn from_role(role: &str) -> Self {
        if ELEVATED_ROLES.contains(&role) {
            RoleScope::Full
        } else {
            RoleScope::Rw(role.to_string())
        }
    }

    /// The RW restriction as an optional SQL bind: `None` means no
    /// restriction. Every scoped query binds this against
    /// `($n::text IS NULL OR rw = $n)`.
    pub fn rw(&self) -> Option<&str> {
        match self {
            RoleScope::Full => None,
            RoleScope::Rw(rw) => Some(rw),
        }
    }
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller, decoded from the `Authorization: Bearer`
/// header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub role: String,
}

impl AuthUser {
    pub fn scope(&self) -> RoleScope {
        RoleScope::from_role(&self.role)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MissingToken)?;

        let claims = state.jwt.verify(token)?;
        Ok(AuthUser {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevated_roles_are_unrestricted() {
        assert_eq!(RoleScope::from_role("kelurahan"), RoleScope::Full);
        assert_eq!(RoleScope::from_role("admin"), RoleScope::Full);
        assert_eq!(RoleScope::from_role("superadmin"), RoleScope::Full);
    }

    #[test]
    fn test_other_roles_scope_to_their_rw() {
        assert_eq!(RoleScope::from_role("5"), RoleScope::Rw("5".to_string()));
        assert_eq!(RoleScope::from_role("12"), RoleScope::Rw("12".to_string()));
        // The role string is matched exactly, not parsed
        assert_eq!(
            RoleScope::from_role("kader"),
            RoleScope::Rw("kader".to_string())
        );
    }

    #[test]
    fn test_rw_bind_value() {
        assert_eq!(RoleScope::Full.rw(), None);
        assert_eq!(RoleScope::Rw("7".into()).rw(), Some("7"));
    }

    #[test]
    fn test_token_round_trip() {
        let keys = JwtKeys::new("test-secret");
        let token = keys.issue(42, "kader01", "5").unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "kader01");
        assert_eq!(claims.role, "5");
    }

    #[test]
    fn test_token_wrong_secret_rejected() {
        let keys = JwtKeys::new("secret-a");
        let other = JwtKeys::new("secret-b");
        let token = keys.issue(1, "u", "admin").unwrap();
        assert!(matches!(
            other.verify(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_password_hash_round_trip() {
        // Low cost keeps the test quick
        let hash = bcrypt::hash("rahasia", 4).unwrap();
        assert!(verify_password("rahasia", &hash).unwrap());
        assert!(!verify_password("salah", &hash).unwrap());
    }
}
