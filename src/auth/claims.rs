use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_EMPLOYEE: &str = "employee";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

pub fn issue_token(
    user_id: Uuid,
    email: Option<String>,
    role: Option<String>,
    secret: &str,
    ttl_minutes: i64,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        email,
        role,
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Database(format!("token encoding: {e}")))
}

pub fn validate_token(token: &str, secret: &str) -> Result<TokenClaims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["sub", "exp"]);
    decode::<TokenClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|_| ApiError::InvalidToken)
}

/// Authenticated caller, extracted from the `Authorization: Bearer <token>`
/// header. Handlers take this as an argument; absence or an invalid token
/// rejects the request before the handler body runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    pub fn is_manager(&self) -> bool {
        self.has_role(ROLE_ADMIN) || self.has_role(ROLE_MANAGER)
    }

    pub fn is_employee(&self) -> bool {
        self.has_role(ROLE_EMPLOYEE)
    }

    /// Admin or manager, otherwise 403.
    pub fn require_manager(&self, action: &str) -> Result<(), ApiError> {
        if self.is_manager() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "Only admins and managers can {action}"
            )))
        }
    }

    /// Admin only, otherwise 403.
    pub fn require_admin(&self, action: &str) -> Result<(), ApiError> {
        if self.has_role(ROLE_ADMIN) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("Only admins can {action}")))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

        let claims = validate_token(token, &state.config.jwt_secret)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::InvalidToken)?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trip_preserves_claims() {
        let id = Uuid::new_v4();
        let token = issue_token(
            id,
            Some("a@b.c".into()),
            Some(ROLE_MANAGER.into()),
            SECRET,
            60,
        )
        .unwrap();

        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
        assert_eq!(claims.role.as_deref(), Some(ROLE_MANAGER));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(Uuid::new_v4(), None, None, SECRET, -5).unwrap();
        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), None, None, SECRET, 60).unwrap();
        assert!(validate_token(&token, "other-secret").is_err());
    }

    #[test]
    fn role_checks() {
        let admin = AuthUser {
            user_id: Uuid::new_v4(),
            email: None,
            role: Some(ROLE_ADMIN.into()),
        };
        let employee = AuthUser {
            user_id: Uuid::new_v4(),
            email: None,
            role: Some(ROLE_EMPLOYEE.into()),
        };
        let anonymous_role = AuthUser {
            user_id: Uuid::new_v4(),
            email: None,
            role: None,
        };

        assert!(admin.is_manager());
        assert!(admin.require_admin("delete campaigns").is_ok());
        assert!(employee.require_manager("delete leads").is_err());
        assert!(employee.is_employee());
        assert!(!anonymous_role.is_manager());
    }
}
