use axum::{extract::State, response::Json};
use model::entities::{offer, review, user_profile};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::{debug, error, info, instrument, trace};

use crate::helpers::aggregates::round_rating;
use crate::schemas::{
    internal_error, ApiError, ApiResponse, AppState, BaseInfo, CachedData, ErrorResponse,
};

const CACHE_KEY: &str = "base_info";

async fn compute_base_info(state: &AppState) -> Result<BaseInfo, ApiError> {
    let reviews = review::Entity::find()
        .all(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load reviews for base info: {}", db_error);
            internal_error("Internal server error while computing base info")
        })?;
    let review_count = reviews.len() as u64;
    let rating_sum: i64 = reviews.iter().map(|r| r.rating as i64).sum();

    let business_profile_count = user_profile::Entity::find()
        .filter(user_profile::Column::ProfileType.eq(user_profile::ProfileType::Business))
        .count(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to count business profiles: {}", db_error);
            internal_error("Internal server error while computing base info")
        })?;

    let offer_count = offer::Entity::find()
        .count(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to count offers: {}", db_error);
            internal_error("Internal server error while computing base info")
        })?;

    Ok(BaseInfo {
        review_count,
        average_rating: round_rating(rating_sum, review_count),
        business_profile_count,
        offer_count,
    })
}

/// Platform-wide aggregate numbers (open endpoint, cached)
#[utoipa::path(
    get,
    path = "/api/v1/base-info",
    tag = "base-info",
    responses(
        (status = 200, description = "Base info retrieved successfully", body = ApiResponse<BaseInfo>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_base_info(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BaseInfo>>, ApiError> {
    trace!("Entering get_base_info function");

    if let Some(CachedData::BaseInfo(cached)) = state.cache.get(CACHE_KEY).await {
        debug!("Serving base info from cache");
        return Ok(Json(ApiResponse {
            data: cached,
            message: "Base info retrieved successfully".to_string(),
            success: true,
        }));
    }

    debug!("Base info cache miss, computing from database");
    let base_info = compute_base_info(&state).await?;
    state
        .cache
        .insert(CACHE_KEY.to_string(), CachedData::BaseInfo(base_info.clone()))
        .await;

    info!(
        "Base info computed: {} reviews, avg {}, {} business profiles, {} offers",
        base_info.review_count,
        base_info.average_rating,
        base_info.business_profile_count,
        base_info.offer_count
    );
    Ok(Json(ApiResponse {
        data: base_info,
        message: "Base info retrieved successfully".to_string(),
        success: true,
    }))
}
