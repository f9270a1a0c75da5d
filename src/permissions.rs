use axum::http::StatusCode;
use axum::response::Json;
use thiserror::Error;
use tracing::warn;

use crate::auth::CurrentUser;
use crate::schemas::{ApiError, ErrorResponse};

/// Guarded operations. Each variant carries the ownership context the
/// check needs; staff accounts pass every check.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    CreateOffer,
    ModifyOffer { owner_id: i32 },
    CreateOrder,
    ModifyOrder { business_user_id: i32 },
    DeleteOrder,
    CreateReview,
    ModifyReview { reviewer_id: i32 },
    ModifyProfile { owner_id: i32 },
    ViewOrder {
        customer_user_id: i32,
        business_user_id: i32,
    },
}

#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("Only business users may perform this action")]
    BusinessOnly,
    #[error("Only customer users may perform this action")]
    CustomerOnly,
    #[error("Only the owner may perform this action")]
    OwnerOnly,
    #[error("Only staff may perform this action")]
    StaffOnly,
    #[error("Not a participant of this order")]
    NotParticipant,
}

impl PermissionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::BusinessOnly => "BUSINESS_ONLY",
            Self::CustomerOnly => "CUSTOMER_ONLY",
            Self::OwnerOnly => "OWNER_ONLY",
            Self::StaffOnly => "STAFF_ONLY",
            Self::NotParticipant => "NOT_PARTICIPANT",
        }
    }

    pub fn into_api_error(self) -> ApiError {
        (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(self.to_string(), self.code())),
        )
    }
}

/// Check whether `actor` may perform `action`.
pub fn authorize(actor: &CurrentUser, action: Action) -> Result<(), PermissionError> {
    if actor.is_staff() {
        return Ok(());
    }

    let result = match action {
        Action::CreateOffer => {
            if actor.is_business() {
                Ok(())
            } else {
                Err(PermissionError::BusinessOnly)
            }
        }
        Action::ModifyOffer { owner_id } => {
            if actor.user.id == owner_id {
                Ok(())
            } else {
                Err(PermissionError::OwnerOnly)
            }
        }
        Action::CreateOrder => {
            if actor.is_customer() {
                Ok(())
            } else {
                Err(PermissionError::CustomerOnly)
            }
        }
        Action::ModifyOrder { business_user_id } => {
            if actor.is_business() && actor.user.id == business_user_id {
                Ok(())
            } else {
                Err(PermissionError::OwnerOnly)
            }
        }
        Action::DeleteOrder => Err(PermissionError::StaffOnly),
        Action::CreateReview => {
            if actor.is_customer() {
                Ok(())
            } else {
                Err(PermissionError::CustomerOnly)
            }
        }
        Action::ModifyReview { reviewer_id } => {
            if actor.user.id == reviewer_id {
                Ok(())
            } else {
                Err(PermissionError::OwnerOnly)
            }
        }
        Action::ModifyProfile { owner_id } => {
            if actor.user.id == owner_id {
                Ok(())
            } else {
                Err(PermissionError::OwnerOnly)
            }
        }
        Action::ViewOrder {
            customer_user_id,
            business_user_id,
        } => {
            if actor.user.id == customer_user_id || actor.user.id == business_user_id {
                Ok(())
            } else {
                Err(PermissionError::NotParticipant)
            }
        }
    };

    if let Err(ref denied) = result {
        warn!(
            "User {} denied for {:?}: {}",
            actor.user.id, action, denied
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use model::entities::{user, user_profile};

    fn make_actor(id: i32, profile_type: user_profile::ProfileType, is_staff: bool) -> CurrentUser {
        CurrentUser {
            user: user::Model {
                id,
                username: format!("user{id}"),
                email: format!("user{id}@example.com"),
                password_hash: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                is_staff,
            },
            profile: user_profile::Model {
                id,
                user_id: id,
                location: String::new(),
                email: format!("user{id}@example.com"),
                file: String::new(),
                description: String::new(),
                tel: String::new(),
                working_hours: String::new(),
                profile_type,
                created_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_customer_cannot_create_offer() {
        let customer = make_actor(1, user_profile::ProfileType::Customer, false);
        assert!(matches!(
            authorize(&customer, Action::CreateOffer),
            Err(PermissionError::BusinessOnly)
        ));
    }

    #[test]
    fn test_business_cannot_create_order() {
        let business = make_actor(2, user_profile::ProfileType::Business, false);
        assert!(matches!(
            authorize(&business, Action::CreateOrder),
            Err(PermissionError::CustomerOnly)
        ));
    }

    #[test]
    fn test_owner_may_modify_own_offer() {
        let business = make_actor(3, user_profile::ProfileType::Business, false);
        assert!(authorize(&business, Action::ModifyOffer { owner_id: 3 }).is_ok());
        assert!(authorize(&business, Action::ModifyOffer { owner_id: 4 }).is_err());
    }

    #[test]
    fn test_staff_passes_everything() {
        let staff = make_actor(5, user_profile::ProfileType::Staff, true);
        assert!(authorize(&staff, Action::CreateOffer).is_ok());
        assert!(authorize(&staff, Action::DeleteOrder).is_ok());
        assert!(authorize(&staff, Action::ModifyReview { reviewer_id: 99 }).is_ok());
    }

    #[test]
    fn test_only_participants_view_order() {
        let customer = make_actor(6, user_profile::ProfileType::Customer, false);
        let action = Action::ViewOrder {
            customer_user_id: 6,
            business_user_id: 7,
        };
        assert!(authorize(&customer, action).is_ok());

        let outsider = make_actor(8, user_profile::ProfileType::Customer, false);
        assert!(matches!(
            authorize(&outsider, action),
            Err(PermissionError::NotParticipant)
        ));
    }

    #[test]
    fn test_order_delete_is_staff_only() {
        let business = make_actor(9, user_profile::ProfileType::Business, false);
        assert!(matches!(
            authorize(&business, Action::DeleteOrder),
            Err(PermissionError::StaffOnly)
        ));
    }
}
