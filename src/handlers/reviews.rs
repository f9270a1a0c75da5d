use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::{review, user_profile};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::auth::CurrentUser;
use crate::permissions::{authorize, Action};
use crate::schemas::{
    bad_request, internal_error, not_found, validation_error, ApiError, ApiResponse, AppState,
    ErrorResponse, ReviewListQuery,
};

/// Request body for leaving a review
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateReviewRequest {
    /// Business user the review is about
    pub business_user: i32,
    /// Integer in 1..=5
    pub rating: i32,
    #[serde(default)]
    pub description: String,
}

/// Request body for updating a review
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub description: Option<String>,
}

/// Full review shape
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: i32,
    pub business_user: i32,
    pub reviewer: i32,
    pub rating: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<review::Model> for ReviewResponse {
    fn from(model: review::Model) -> Self {
        Self {
            id: model.id,
            business_user: model.business_user_id,
            reviewer: model.customer_user_id,
            rating: model.rating,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn rating_in_bounds(rating: i32) -> bool {
    (1..=5).contains(&rating)
}

async fn load_review(state: &AppState, review_id: i32) -> Result<review::Model, ApiError> {
    review::Entity::find_by_id(review_id)
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load review {}: {}", review_id, db_error);
            internal_error("Internal server error while loading review")
        })?
        .ok_or_else(|| {
            warn!("Review {} not found", review_id);
            not_found("Review not found", "REVIEW_NOT_FOUND")
        })
}

/// List reviews with filtering and ordering (open endpoint)
#[utoipa::path(
    get,
    path = "/api/v1/reviews",
    tag = "reviews",
    params(
        ("business_user_id" = Option<i32>, Query, description = "Only reviews about this business user"),
        ("reviewer_id" = Option<i32>, Query, description = "Only reviews written by this customer"),
        ("ordering" = Option<String>, Query, description = "rating, -rating, updated_at or -updated_at"),
    ),
    responses(
        (status = 200, description = "Reviews retrieved successfully", body = ApiResponse<Vec<ReviewResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Json<ApiResponse<Vec<ReviewResponse>>>, ApiError> {
    trace!("Entering list_reviews function");
    debug!("Listing reviews with query: {:?}", query);

    let mut select = review::Entity::find();
    if let Some(business_user_id) = query.business_user_id {
        select = select.filter(review::Column::BusinessUserId.eq(business_user_id));
    }
    if let Some(reviewer_id) = query.reviewer_id {
        select = select.filter(review::Column::CustomerUserId.eq(reviewer_id));
    }
    select = match query.ordering.as_deref() {
        Some("rating") => select.order_by_asc(review::Column::Rating),
        Some("-rating") => select.order_by_desc(review::Column::Rating),
        Some("updated_at") => select.order_by_asc(review::Column::UpdatedAt),
        Some("-updated_at") => select.order_by_desc(review::Column::UpdatedAt),
        _ => select.order_by_desc(review::Column::UpdatedAt),
    };

    let reviews = select.all(&state.db).await.map_err(|db_error| {
        error!("Failed to list reviews: {}", db_error);
        internal_error("Internal server error while listing reviews")
    })?;

    info!("Retrieved {} reviews", reviews.len());
    Ok(Json(ApiResponse {
        data: reviews.into_iter().map(ReviewResponse::from).collect(),
        message: "Reviews retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a single review (open endpoint)
#[utoipa::path(
    get,
    path = "/api/v1/reviews/{review_id}",
    tag = "reviews",
    params(
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "Review retrieved successfully", body = ApiResponse<ReviewResponse>),
        (status = 404, description = "Review not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_review(
    Path(review_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ReviewResponse>>, ApiError> {
    trace!("Entering get_review function for review_id: {}", review_id);

    let review_model = load_review(&state, review_id).await?;

    info!("Review {} retrieved successfully", review_id);
    Ok(Json(ApiResponse {
        data: ReviewResponse::from(review_model),
        message: "Review retrieved successfully".to_string(),
        success: true,
    }))
}

/// Leave a review for a business user (customers only, one per pair)
#[utoipa::path(
    post,
    path = "/api/v1/reviews",
    tag = "reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created successfully", body = ApiResponse<ReviewResponse>),
        (status = 400, description = "Validation failed or duplicate review", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a customer", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user))]
pub async fn create_review(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewResponse>>), ApiError> {
    trace!("Entering create_review function");
    debug!(
        "User {} reviewing business user {} with rating {}",
        current_user.user.id, request.business_user, request.rating
    );

    authorize(&current_user, Action::CreateReview).map_err(|denied| denied.into_api_error())?;

    let mut fields = BTreeMap::new();
    if !rating_in_bounds(request.rating) {
        fields.insert(
            "rating".to_string(),
            "Rating must be between 1 and 5".to_string(),
        );
    }

    let target_profile = user_profile::Entity::find()
        .filter(user_profile::Column::UserId.eq(request.business_user))
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!(
                "Failed to load profile for user {}: {}",
                request.business_user, db_error
            );
            internal_error("Internal server error while creating review")
        })?;
    match target_profile {
        Some(profile) if profile.profile_type == user_profile::ProfileType::Business => {}
        _ => {
            fields.insert(
                "business_user".to_string(),
                "Target user does not have a business profile".to_string(),
            );
        }
    }

    if !fields.is_empty() {
        warn!(
            "Review creation rejected for user {}: {:?}",
            current_user.user.id,
            fields.keys().collect::<Vec<_>>()
        );
        return Err(validation_error(fields));
    }

    // Existence check and insert in one transaction
    let txn = state.db.begin().await.map_err(|db_error| {
        error!("Failed to open review transaction: {}", db_error);
        internal_error("Internal server error while creating review")
    })?;

    let duplicate = review::Entity::find()
        .filter(review::Column::BusinessUserId.eq(request.business_user))
        .filter(review::Column::CustomerUserId.eq(current_user.user.id))
        .one(&txn)
        .await
        .map_err(|db_error| {
            error!("Failed to check for duplicate review: {}", db_error);
            internal_error("Internal server error while creating review")
        })?;
    if duplicate.is_some() {
        warn!(
            "Duplicate review by user {} for business user {}",
            current_user.user.id, request.business_user
        );
        return Err(bad_request(
            "You have already reviewed this business user",
            "DUPLICATE_REVIEW",
        ));
    }

    let now = Utc::now();
    let new_review = review::ActiveModel {
        business_user_id: Set(request.business_user),
        customer_user_id: Set(current_user.user.id),
        rating: Set(request.rating),
        description: Set(request.description.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let review_model = new_review.insert(&txn).await.map_err(|db_error| {
        error!("Failed to insert review: {}", db_error);
        internal_error("Internal server error while creating review")
    })?;

    txn.commit().await.map_err(|db_error| {
        error!("Failed to commit review transaction: {}", db_error);
        internal_error("Internal server error while creating review")
    })?;

    info!(
        "Review created successfully with ID: {}, reviewer: {}, business: {}",
        review_model.id, review_model.customer_user_id, review_model.business_user_id
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ReviewResponse::from(review_model),
            message: "Review created successfully".to_string(),
            success: true,
        }),
    ))
}

/// Update a review's rating or description (reviewer or staff)
#[utoipa::path(
    patch,
    path = "/api/v1/reviews/{review_id}",
    tag = "reviews",
    params(
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated successfully", body = ApiResponse<ReviewResponse>),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not the reviewer", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user))]
pub async fn update_review(
    Path(review_id): Path<i32>,
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UpdateReviewRequest>,
) -> Result<Json<ApiResponse<ReviewResponse>>, ApiError> {
    trace!("Entering update_review function for review_id: {}", review_id);

    let review_model = load_review(&state, review_id).await?;
    authorize(
        &current_user,
        Action::ModifyReview {
            reviewer_id: review_model.customer_user_id,
        },
    )
    .map_err(|denied| denied.into_api_error())?;

    if let Some(rating) = request.rating {
        if !rating_in_bounds(rating) {
            let mut fields = BTreeMap::new();
            fields.insert(
                "rating".to_string(),
                "Rating must be between 1 and 5".to_string(),
            );
            return Err(validation_error(fields));
        }
    }

    let mut review_active: review::ActiveModel = review_model.into();
    if let Some(rating) = request.rating {
        review_active.rating = Set(rating);
    }
    if let Some(description) = request.description {
        review_active.description = Set(description);
    }
    review_active.updated_at = Set(Utc::now());

    let updated_review = review_active.update(&state.db).await.map_err(|db_error| {
        error!("Failed to update review {}: {}", review_id, db_error);
        internal_error("Internal server error while updating review")
    })?;

    info!("Review {} updated by user {}", review_id, current_user.user.id);
    Ok(Json(ApiResponse {
        data: ReviewResponse::from(updated_review),
        message: "Review updated successfully".to_string(),
        success: true,
    }))
}

/// Delete a review (reviewer or staff)
#[utoipa::path(
    delete,
    path = "/api/v1/reviews/{review_id}",
    tag = "reviews",
    params(
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "Review deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not the reviewer", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user))]
pub async fn delete_review(
    Path(review_id): Path<i32>,
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_review function for review_id: {}", review_id);

    let review_model = load_review(&state, review_id).await?;
    authorize(
        &current_user,
        Action::ModifyReview {
            reviewer_id: review_model.customer_user_id,
        },
    )
    .map_err(|denied| denied.into_api_error())?;

    review_model.delete(&state.db).await.map_err(|db_error| {
        error!("Failed to delete review {}: {}", review_id, db_error);
        internal_error("Internal server error while deleting review")
    })?;

    info!("Review {} deleted by user {}", review_id, current_user.user.id);
    Ok(Json(ApiResponse {
        data: format!("Review {} deleted", review_id),
        message: "Review deleted successfully".to_string(),
        success: true,
    }))
}
