use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::{user, user_profile};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::auth::CurrentUser;
use crate::permissions::{authorize, Action};
use crate::schemas::{internal_error, not_found, ApiError, ApiResponse, AppState, ErrorResponse};

/// Full profile shape, served to authenticated callers
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    /// Owning user ID
    pub user: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub file: String,
    pub location: String,
    pub tel: String,
    pub description: String,
    pub working_hours: String,
    #[serde(rename = "type")]
    pub profile_type: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Public shape of a business profile (no email)
#[derive(Debug, Serialize, ToSchema)]
pub struct BusinessProfileResponse {
    pub user: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub file: String,
    pub location: String,
    pub tel: String,
    pub description: String,
    pub working_hours: String,
    #[serde(rename = "type")]
    pub profile_type: String,
}

/// Public shape of a customer profile
#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerProfileResponse {
    pub user: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub file: String,
    #[serde(rename = "type")]
    pub profile_type: String,
}

/// Request body for updating a profile. `type` is not writable.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Updates both the account and the profile copy
    pub email: Option<String>,
    pub location: Option<String>,
    pub file: Option<String>,
    pub description: Option<String>,
    pub tel: Option<String>,
    pub working_hours: Option<String>,
}

fn full_profile(user_model: &user::Model, profile: user_profile::Model) -> ProfileResponse {
    ProfileResponse {
        user: user_model.id,
        username: user_model.username.clone(),
        first_name: user_model.first_name.clone(),
        last_name: user_model.last_name.clone(),
        file: profile.file,
        location: profile.location,
        tel: profile.tel,
        description: profile.description,
        working_hours: profile.working_hours,
        profile_type: profile.profile_type.as_str().to_string(),
        email: profile.email,
        created_at: profile.created_at,
    }
}

fn business_profile(user_model: &user::Model, profile: user_profile::Model) -> BusinessProfileResponse {
    BusinessProfileResponse {
        user: user_model.id,
        username: user_model.username.clone(),
        first_name: user_model.first_name.clone(),
        last_name: user_model.last_name.clone(),
        file: profile.file,
        location: profile.location,
        tel: profile.tel,
        description: profile.description,
        working_hours: profile.working_hours,
        profile_type: profile.profile_type.as_str().to_string(),
    }
}

fn customer_profile(user_model: &user::Model, profile: user_profile::Model) -> CustomerProfileResponse {
    CustomerProfileResponse {
        user: user_model.id,
        username: user_model.username.clone(),
        first_name: user_model.first_name.clone(),
        last_name: user_model.last_name.clone(),
        file: profile.file,
        profile_type: profile.profile_type.as_str().to_string(),
    }
}

async fn load_profile_with_user(
    state: &AppState,
    user_id: i32,
) -> Result<(user::Model, user_profile::Model), ApiError> {
    let profile = user_profile::Entity::find()
        .filter(user_profile::Column::UserId.eq(user_id))
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load profile for user {}: {}", user_id, db_error);
            internal_error("Internal server error while loading profile")
        })?
        .ok_or_else(|| {
            warn!("Profile for user {} not found", user_id);
            not_found("Profile not found", "PROFILE_NOT_FOUND")
        })?;

    let user_model = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load user {}: {}", user_id, db_error);
            internal_error("Internal server error while loading profile")
        })?
        .ok_or_else(|| {
            warn!("User {} not found for profile lookup", user_id);
            not_found("Profile not found", "PROFILE_NOT_FOUND")
        })?;

    Ok((user_model, profile))
}

/// Get a single profile by user ID
#[utoipa::path(
    get,
    path = "/api/v1/profile/{user_id}",
    tag = "profiles",
    params(
        ("user_id" = i32, Path, description = "Owning user ID"),
    ),
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<ProfileResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user))]
pub async fn get_profile(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    trace!("Entering get_profile function for user_id: {}", user_id);

    let (user_model, profile) = load_profile_with_user(&state, user_id).await?;

    info!("Profile for user {} retrieved by user {}", user_id, current_user.user.id);
    Ok(Json(ApiResponse {
        data: full_profile(&user_model, profile),
        message: "Profile retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update a profile (owner or staff)
#[utoipa::path(
    patch,
    path = "/api/v1/profile/{user_id}",
    tag = "profiles",
    params(
        ("user_id" = i32, Path, description = "Owning user ID"),
    ),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<ProfileResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user, request))]
pub async fn update_profile(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    trace!("Entering update_profile function for user_id: {}", user_id);

    authorize(&current_user, Action::ModifyProfile { owner_id: user_id })
        .map_err(|denied| denied.into_api_error())?;

    let (user_model, profile) = load_profile_with_user(&state, user_id).await?;

    let txn = state.db.begin().await.map_err(|db_error| {
        error!("Failed to open profile update transaction: {}", db_error);
        internal_error("Internal server error while updating profile")
    })?;

    let mut user_active: user::ActiveModel = user_model.into();
    let mut profile_active: user_profile::ActiveModel = profile.into();
    let mut updated_fields = Vec::new();

    if let Some(first_name) = request.first_name {
        user_active.first_name = Set(first_name);
        updated_fields.push("first_name");
    }
    if let Some(last_name) = request.last_name {
        user_active.last_name = Set(last_name);
        updated_fields.push("last_name");
    }
    if let Some(email) = request.email {
        // Keep the account and profile copies in sync
        user_active.email = Set(email.clone());
        profile_active.email = Set(email);
        updated_fields.push("email");
    }
    if let Some(location) = request.location {
        profile_active.location = Set(location);
        updated_fields.push("location");
    }
    if let Some(file) = request.file {
        profile_active.file = Set(file);
        updated_fields.push("file");
    }
    if let Some(description) = request.description {
        profile_active.description = Set(description);
        updated_fields.push("description");
    }
    if let Some(tel) = request.tel {
        profile_active.tel = Set(tel);
        updated_fields.push("tel");
    }
    if let Some(working_hours) = request.working_hours {
        profile_active.working_hours = Set(working_hours);
        updated_fields.push("working_hours");
    }

    debug!("Updating profile fields for user {}: {:?}", user_id, updated_fields);

    let updated_user = user_active.update(&txn).await.map_err(|db_error| {
        error!("Failed to update user {}: {}", user_id, db_error);
        internal_error("Internal server error while updating profile")
    })?;
    let updated_profile = profile_active.update(&txn).await.map_err(|db_error| {
        error!("Failed to update profile for user {}: {}", user_id, db_error);
        internal_error("Internal server error while updating profile")
    })?;

    txn.commit().await.map_err(|db_error| {
        error!("Failed to commit profile update transaction: {}", db_error);
        internal_error("Internal server error while updating profile")
    })?;

    info!(
        "Profile for user {} updated by user {}. Updated fields: {:?}",
        user_id, current_user.user.id, updated_fields
    );
    Ok(Json(ApiResponse {
        data: full_profile(&updated_user, updated_profile),
        message: "Profile updated successfully".to_string(),
        success: true,
    }))
}

async fn load_profiles_of_type(
    state: &AppState,
    profile_type: user_profile::ProfileType,
) -> Result<Vec<(user_profile::Model, user::Model)>, ApiError> {
    let profiles = user_profile::Entity::find()
        .filter(user_profile::Column::ProfileType.eq(profile_type))
        .order_by_asc(user_profile::Column::UserId)
        .find_also_related(user::Entity)
        .all(&state.db)
        .await
        .map_err(|db_error| {
            error!(
                "Failed to load {} profiles: {}",
                profile_type.as_str(),
                db_error
            );
            internal_error("Internal server error while loading profiles")
        })?;

    // A profile without its user row would violate the FK; skip it
    Ok(profiles
        .into_iter()
        .filter_map(|(profile, maybe_user)| maybe_user.map(|user_model| (profile, user_model)))
        .collect())
}

/// List all business profiles (public shape)
#[utoipa::path(
    get,
    path = "/api/v1/profiles/business",
    tag = "profiles",
    responses(
        (status = 200, description = "Business profiles retrieved successfully", body = ApiResponse<Vec<BusinessProfileResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user))]
pub async fn list_business_profiles(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<BusinessProfileResponse>>>, ApiError> {
    trace!("Entering list_business_profiles function");

    let rows = load_profiles_of_type(&state, user_profile::ProfileType::Business).await?;
    let count = rows.len();
    let responses: Vec<BusinessProfileResponse> = rows
        .into_iter()
        .map(|(profile, user_model)| business_profile(&user_model, profile))
        .collect();

    info!("Retrieved {} business profiles for user {}", count, current_user.user.id);
    Ok(Json(ApiResponse {
        data: responses,
        message: "Business profiles retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a single business profile (public shape)
#[utoipa::path(
    get,
    path = "/api/v1/profiles/business/{user_id}",
    tag = "profiles",
    params(
        ("user_id" = i32, Path, description = "Owning user ID"),
    ),
    responses(
        (status = 200, description = "Business profile retrieved successfully", body = ApiResponse<BusinessProfileResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(_current_user))]
pub async fn get_business_profile(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> Result<Json<ApiResponse<BusinessProfileResponse>>, ApiError> {
    trace!("Entering get_business_profile function for user_id: {}", user_id);

    let (user_model, profile) = load_profile_with_user(&state, user_id).await?;
    if profile.profile_type != user_profile::ProfileType::Business {
        warn!("Profile for user {} is not a business profile", user_id);
        return Err(not_found("Profile not found", "PROFILE_NOT_FOUND"));
    }

    Ok(Json(ApiResponse {
        data: business_profile(&user_model, profile),
        message: "Business profile retrieved successfully".to_string(),
        success: true,
    }))
}

/// List all customer profiles (public shape)
#[utoipa::path(
    get,
    path = "/api/v1/profiles/customer",
    tag = "profiles",
    responses(
        (status = 200, description = "Customer profiles retrieved successfully", body = ApiResponse<Vec<CustomerProfileResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user))]
pub async fn list_customer_profiles(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<CustomerProfileResponse>>>, ApiError> {
    trace!("Entering list_customer_profiles function");

    let rows = load_profiles_of_type(&state, user_profile::ProfileType::Customer).await?;
    let count = rows.len();
    let responses: Vec<CustomerProfileResponse> = rows
        .into_iter()
        .map(|(profile, user_model)| customer_profile(&user_model, profile))
        .collect();

    info!("Retrieved {} customer profiles for user {}", count, current_user.user.id);
    Ok(Json(ApiResponse {
        data: responses,
        message: "Customer profiles retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a single customer profile (public shape)
#[utoipa::path(
    get,
    path = "/api/v1/profiles/customer/{user_id}",
    tag = "profiles",
    params(
        ("user_id" = i32, Path, description = "Owning user ID"),
    ),
    responses(
        (status = 200, description = "Customer profile retrieved successfully", body = ApiResponse<CustomerProfileResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(_current_user))]
pub async fn get_customer_profile(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> Result<Json<ApiResponse<CustomerProfileResponse>>, ApiError> {
    trace!("Entering get_customer_profile function for user_id: {}", user_id);

    let (user_model, profile) = load_profile_with_user(&state, user_id).await?;
    if profile.profile_type != user_profile::ProfileType::Customer {
        warn!("Profile for user {} is not a customer profile", user_id);
        return Err(not_found("Profile not found", "PROFILE_NOT_FOUND"));
    }

    Ok(Json(ApiResponse {
        data: customer_profile(&user_model, profile),
        message: "Customer profile retrieved successfully".to_string(),
        success: true,
    }))
}
