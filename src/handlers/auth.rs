use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use model::entities::{auth_token, user, user_profile};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::auth::{generate_token_key, hash_password, verify_password};
use crate::schemas::{
    bad_request, internal_error, unauthorized, validation_error, ApiError, ApiResponse, AppState,
    ErrorResponse,
};

/// Request body for account registration
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegistrationRequest {
    /// Username (must be unique)
    pub username: String,
    /// Email address (must be unique)
    pub email: String,
    pub password: String,
    /// Must match `password`
    pub repeated_password: String,
    /// Profile type: `customer` or `business`
    #[serde(rename = "type")]
    pub profile_type: String,
}

/// Response body for a successful registration
#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationResponse {
    pub token: String,
    pub username: String,
    pub email: String,
    pub user_id: i32,
}

/// Request body for login
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response body for a successful login
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_id: i32,
}

fn validate_registration(request: &RegistrationRequest) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    if request.username.trim().is_empty() {
        fields.insert("username".to_string(), "Username must not be empty".to_string());
    }
    if request.email.trim().is_empty() || !request.email.contains('@') {
        fields.insert("email".to_string(), "Enter a valid email address".to_string());
    }
    if request.password.is_empty() {
        fields.insert("password".to_string(), "Password must not be empty".to_string());
    }
    if request.password != request.repeated_password {
        fields.insert(
            "repeated_password".to_string(),
            "Passwords do not match".to_string(),
        );
    }
    match user_profile::ProfileType::parse(&request.profile_type) {
        Some(user_profile::ProfileType::Customer) | Some(user_profile::ProfileType::Business) => {}
        _ => {
            fields.insert(
                "type".to_string(),
                "Type must be 'customer' or 'business'".to_string(),
            );
        }
    }

    fields
}

/// Register a new account with its profile and first token
#[utoipa::path(
    post,
    path = "/api/v1/registration",
    tag = "auth",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Account created successfully", body = ApiResponse<RegistrationResponse>),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(request))]
pub async fn registration(
    State(state): State<AppState>,
    Json(request): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegistrationResponse>>), ApiError> {
    trace!("Entering registration function");
    debug!("Registering new account with username: {}", request.username);

    let mut fields = validate_registration(&request);

    let txn = state.db.begin().await.map_err(|db_error| {
        error!("Failed to open registration transaction: {}", db_error);
        internal_error("Internal server error during registration")
    })?;

    // Uniqueness checks inside the same transaction as the insert
    let username_taken = user::Entity::find()
        .filter(user::Column::Username.eq(request.username.as_str()))
        .one(&txn)
        .await
        .map_err(|db_error| {
            error!("Failed to check username uniqueness: {}", db_error);
            internal_error("Internal server error during registration")
        })?
        .is_some();
    if username_taken {
        fields.insert(
            "username".to_string(),
            "This username is already taken".to_string(),
        );
    }

    let email_taken = user::Entity::find()
        .filter(user::Column::Email.eq(request.email.as_str()))
        .one(&txn)
        .await
        .map_err(|db_error| {
            error!("Failed to check email uniqueness: {}", db_error);
            internal_error("Internal server error during registration")
        })?
        .is_some();
    if email_taken {
        fields.insert(
            "email".to_string(),
            "This email address is already registered".to_string(),
        );
    }

    if !fields.is_empty() {
        warn!(
            "Registration rejected for '{}': {:?}",
            request.username,
            fields.keys().collect::<Vec<_>>()
        );
        // Dropping the transaction rolls it back
        return Err(validation_error(fields));
    }

    // Validated above
    let profile_type = user_profile::ProfileType::parse(&request.profile_type)
        .ok_or_else(|| bad_request("Invalid profile type", "VALIDATION_ERROR"))?;

    let password_hash = hash_password(&request.password).map_err(|hash_error| {
        error!("Failed to hash password: {}", hash_error);
        internal_error("Internal server error during registration")
    })?;

    let new_user = user::ActiveModel {
        username: Set(request.username.clone()),
        email: Set(request.email.clone()),
        password_hash: Set(password_hash),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        is_staff: Set(false),
        ..Default::default()
    };
    let user_model = new_user.insert(&txn).await.map_err(|db_error| {
        error!("Failed to insert user '{}': {}", request.username, db_error);
        internal_error("Internal server error during registration")
    })?;

    let new_profile = user_profile::ActiveModel {
        user_id: Set(user_model.id),
        location: Set(String::new()),
        email: Set(request.email.clone()),
        file: Set(String::new()),
        description: Set(String::new()),
        tel: Set(String::new()),
        working_hours: Set(String::new()),
        profile_type: Set(profile_type),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    new_profile.insert(&txn).await.map_err(|db_error| {
        error!(
            "Failed to insert profile for user {}: {}",
            user_model.id, db_error
        );
        internal_error("Internal server error during registration")
    })?;

    let new_token = auth_token::ActiveModel {
        user_id: Set(user_model.id),
        key: Set(generate_token_key()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let token_model = new_token.insert(&txn).await.map_err(|db_error| {
        error!(
            "Failed to insert token for user {}: {}",
            user_model.id, db_error
        );
        internal_error("Internal server error during registration")
    })?;

    txn.commit().await.map_err(|db_error| {
        error!("Failed to commit registration transaction: {}", db_error);
        internal_error("Internal server error during registration")
    })?;

    info!(
        "Account created successfully with ID: {}, username: {}, type: {}",
        user_model.id,
        user_model.username,
        profile_type.as_str()
    );
    let response = ApiResponse {
        data: RegistrationResponse {
            token: token_model.key,
            username: user_model.username,
            email: user_model.email,
            user_id: user_model.id,
        },
        message: "Account created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/api/v1/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    trace!("Entering login function");
    debug!("Login attempt for username: {}", request.username);

    if request.username.trim().is_empty() || request.password.is_empty() {
        let mut fields = BTreeMap::new();
        if request.username.trim().is_empty() {
            fields.insert("username".to_string(), "Username must not be empty".to_string());
        }
        if request.password.is_empty() {
            fields.insert("password".to_string(), "Password must not be empty".to_string());
        }
        return Err(validation_error(fields));
    }

    let user_model = user::Entity::find()
        .filter(user::Column::Username.eq(request.username.as_str()))
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to look up user '{}': {}", request.username, db_error);
            internal_error("Internal server error during login")
        })?;

    let user_model = match user_model {
        Some(model) if verify_password(&request.password, &model.password_hash) => model,
        _ => {
            warn!("Invalid credentials for username: {}", request.username);
            return Err(unauthorized("Invalid username or password", "INVALID_CREDENTIALS"));
        }
    };

    // Reuse an existing token if one exists, mint one otherwise
    let existing_token = auth_token::Entity::find()
        .filter(auth_token::Column::UserId.eq(user_model.id))
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!(
                "Failed to look up token for user {}: {}",
                user_model.id, db_error
            );
            internal_error("Internal server error during login")
        })?;

    let token_key = match existing_token {
        Some(token) => {
            debug!("Reusing existing token for user {}", user_model.id);
            token.key
        }
        None => {
            debug!("Minting new token for user {}", user_model.id);
            let new_token = auth_token::ActiveModel {
                user_id: Set(user_model.id),
                key: Set(generate_token_key()),
                created_at: Set(Utc::now()),
                ..Default::default()
            };
            new_token
                .insert(&state.db)
                .await
                .map_err(|db_error| {
                    error!(
                        "Failed to insert token for user {}: {}",
                        user_model.id, db_error
                    );
                    internal_error("Internal server error during login")
                })?
                .key
        }
    };

    info!("User {} logged in successfully", user_model.id);
    let response = ApiResponse {
        data: LoginResponse {
            token: token_key,
            username: user_model.username,
            email: user_model.email,
            first_name: user_model.first_name,
            last_name: user_model.last_name,
            user_id: user_model.id,
        },
        message: "Login successful".to_string(),
        success: true,
    };
    Ok(Json(response))
}
