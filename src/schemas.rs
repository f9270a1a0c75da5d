use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::Json;
use moka::future::Cache;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for expensive operations
    pub cache: Cache<String, CachedData>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    BaseInfo(BaseInfo),
}

/// Platform-wide aggregate numbers served by the base-info endpoint
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct BaseInfo {
    /// Total number of reviews
    pub review_count: u64,
    /// Average review rating rounded to one decimal place (0.0 when no reviews exist)
    pub average_rating: f64,
    /// Number of business profiles
    pub business_profile_count: u64,
    /// Total number of offers
    pub offer_count: u64,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
    /// Per-field validation messages, present for validation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            success: false,
            fields: None,
        }
    }

    pub fn with_fields(
        error: impl Into<String>,
        code: &str,
        fields: BTreeMap<String, String>,
    ) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            success: false,
            fields: Some(fields),
        }
    }
}

/// Shorthand for the error half of handler results.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn bad_request(error: impl Into<String>, code: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(error, code)))
}

pub fn validation_error(fields: BTreeMap<String, String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::with_fields(
            "Validation failed",
            "VALIDATION_ERROR",
            fields,
        )),
    )
}

pub fn unauthorized(error: impl Into<String>, code: &str) -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(error, code)),
    )
}

pub fn forbidden(error: impl Into<String>, code: &str) -> ApiError {
    (StatusCode::FORBIDDEN, Json(ErrorResponse::new(error, code)))
}

pub fn not_found(error: impl Into<String>, code: &str) -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new(error, code)))
}

pub fn internal_error(error: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(error, "DATABASE_ERROR")),
    )
}

/// Page of results with pagination metadata
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    /// Total number of matching items across all pages
    pub count: u64,
    /// Current page number (1-based)
    pub page: u64,
    /// Page size used for this response
    pub page_size: u64,
    /// Total number of pages
    pub total_pages: u64,
    /// Items on this page
    pub results: Vec<T>,
}

/// Query parameters for the offer list endpoint
#[derive(Debug, Deserialize, ToSchema)]
pub struct OfferListQuery {
    /// Only offers created by this user
    pub creator_id: Option<i32>,
    /// Only offers whose cheapest tier costs at least this much
    pub min_price: Option<Decimal>,
    /// Only offers with at least one tier delivering within this many days
    pub max_delivery_time: Option<i32>,
    /// Ordering: `updated_at`, `-updated_at`, `min_price` or `-min_price`
    pub ordering: Option<String>,
    /// Case-insensitive substring match on title and description
    pub search: Option<String>,
    /// Page number (1-based)
    pub page: Option<u64>,
    /// Items per page (default 6)
    pub page_size: Option<u64>,
}

/// Query parameters for the review list endpoint
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewListQuery {
    /// Only reviews about this business user
    pub business_user_id: Option<i32>,
    /// Only reviews written by this customer user
    pub reviewer_id: Option<i32>,
    /// Ordering: `rating`, `-rating`, `updated_at` or `-updated_at`
    pub ordering: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::registration,
        crate::handlers::auth::login,
        crate::handlers::profiles::get_profile,
        crate::handlers::profiles::update_profile,
        crate::handlers::profiles::list_business_profiles,
        crate::handlers::profiles::get_business_profile,
        crate::handlers::profiles::list_customer_profiles,
        crate::handlers::profiles::get_customer_profile,
        crate::handlers::offers::list_offers,
        crate::handlers::offers::create_offer,
        crate::handlers::offers::get_offer,
        crate::handlers::offers::update_offer,
        crate::handlers::offers::delete_offer,
        crate::handlers::offers::get_offer_detail,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::create_order,
        crate::handlers::orders::update_order,
        crate::handlers::orders::delete_order,
        crate::handlers::orders::order_count,
        crate::handlers::orders::completed_order_count,
        crate::handlers::reviews::list_reviews,
        crate::handlers::reviews::create_review,
        crate::handlers::reviews::get_review,
        crate::handlers::reviews::update_review,
        crate::handlers::reviews::delete_review,
        crate::handlers::base_info::get_base_info,
    ),
    components(
        schemas(
            ApiResponse<crate::handlers::auth::RegistrationResponse>,
            ApiResponse<crate::handlers::auth::LoginResponse>,
            ApiResponse<crate::handlers::profiles::ProfileResponse>,
            ApiResponse<Vec<crate::handlers::profiles::BusinessProfileResponse>>,
            ApiResponse<crate::handlers::profiles::BusinessProfileResponse>,
            ApiResponse<Vec<crate::handlers::profiles::CustomerProfileResponse>>,
            ApiResponse<crate::handlers::profiles::CustomerProfileResponse>,
            ApiResponse<Paginated<crate::handlers::offers::OfferListItem>>,
            ApiResponse<crate::handlers::offers::OfferResponse>,
            ApiResponse<crate::handlers::offers::OfferWithDetailsResponse>,
            ApiResponse<crate::handlers::offers::OfferDetailResponse>,
            ApiResponse<Vec<crate::handlers::orders::OrderResponse>>,
            ApiResponse<crate::handlers::orders::OrderResponse>,
            ApiResponse<crate::handlers::orders::OrderCountResponse>,
            ApiResponse<crate::handlers::orders::CompletedOrderCountResponse>,
            ApiResponse<Vec<crate::handlers::reviews::ReviewResponse>>,
            ApiResponse<crate::handlers::reviews::ReviewResponse>,
            ApiResponse<BaseInfo>,
            ApiResponse<String>,
            ErrorResponse,
            HealthResponse,
            BaseInfo,
            OfferListQuery,
            ReviewListQuery,
            crate::handlers::auth::RegistrationRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::profiles::UpdateProfileRequest,
            crate::handlers::offers::CreateOfferRequest,
            crate::handlers::offers::UpdateOfferRequest,
            crate::handlers::offers::OfferDetailPayload,
            crate::handlers::orders::CreateOrderRequest,
            crate::handlers::orders::UpdateOrderRequest,
            crate::handlers::reviews::CreateReviewRequest,
            crate::handlers::reviews::UpdateReviewRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and login"),
        (name = "profiles", description = "User profile endpoints"),
        (name = "offers", description = "Offer and offer detail endpoints"),
        (name = "orders", description = "Order endpoints"),
        (name = "reviews", description = "Review endpoints"),
        (name = "base-info", description = "Platform statistics"),
    ),
    info(
        title = "GigMarket API",
        description = "Service marketplace backend - offers, orders and reviews between business and customer users",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
