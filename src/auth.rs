use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use model::entities::{auth_token, user, user_profile};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::{debug, error, trace, warn};
use uuid::Uuid;

use crate::schemas::{internal_error, unauthorized, ApiError, AppState};

/// Authenticated caller, resolved from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: user::Model,
    pub profile: user_profile::Model,
}

impl CurrentUser {
    pub fn is_business(&self) -> bool {
        self.profile.profile_type == user_profile::ProfileType::Business
    }

    pub fn is_customer(&self) -> bool {
        self.profile.profile_type == user_profile::ProfileType::Customer
    }

    pub fn is_staff(&self) -> bool {
        self.user.is_staff
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        trace!("Resolving current user from Authorization header");

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                warn!("Request without Authorization header");
                unauthorized("Authentication credentials were not provided", "MISSING_TOKEN")
            })?;

        let key = header
            .strip_prefix("Token ")
            .or_else(|| header.strip_prefix("Bearer "))
            .unwrap_or(header)
            .trim();

        let token = auth_token::Entity::find()
            .filter(auth_token::Column::Key.eq(key))
            .one(&state.db)
            .await
            .map_err(|db_error| {
                error!("Failed to look up auth token: {}", db_error);
                internal_error("Internal server error while authenticating")
            })?
            .ok_or_else(|| {
                warn!("Unknown auth token presented");
                unauthorized("Invalid token", "INVALID_TOKEN")
            })?;

        let user_model = user::Entity::find_by_id(token.user_id)
            .one(&state.db)
            .await
            .map_err(|db_error| {
                error!("Failed to load user {}: {}", token.user_id, db_error);
                internal_error("Internal server error while authenticating")
            })?
            .ok_or_else(|| {
                warn!("Auth token {} points at missing user {}", token.id, token.user_id);
                unauthorized("Invalid token", "INVALID_TOKEN")
            })?;

        let profile = user_profile::Entity::find()
            .filter(user_profile::Column::UserId.eq(user_model.id))
            .one(&state.db)
            .await
            .map_err(|db_error| {
                error!("Failed to load profile for user {}: {}", user_model.id, db_error);
                internal_error("Internal server error while authenticating")
            })?
            .ok_or_else(|| {
                warn!("User {} has no profile", user_model.id);
                unauthorized("Invalid token", "INVALID_TOKEN")
            })?;

        debug!(
            "Authenticated user {} ({})",
            user_model.id,
            profile.profile_type.as_str()
        );
        Ok(CurrentUser {
            user: user_model,
            profile,
        })
    }
}

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(parse_error) => {
            error!("Stored password hash is malformed: {}", parse_error);
            false
        }
    }
}

/// Generate an opaque token key.
pub fn generate_token_key() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("examplePassword").unwrap();
        assert!(verify_password("examplePassword", &hash));
        assert!(!verify_password("wrongPassword", &hash));
    }

    #[test]
    fn test_token_keys_are_unique() {
        let a = generate_token_key();
        let b = generate_token_key();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }
}
