use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::{offer, offer_detail, orders, user_profile};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::auth::CurrentUser;
use crate::permissions::{authorize, Action};
use crate::schemas::{
    bad_request, forbidden, internal_error, not_found, ApiError, ApiResponse, AppState,
    ErrorResponse,
};

/// Request body for placing an order
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Pricing tier to order
    pub offer_detail_id: i32,
}

/// Request body for updating an order; `status` is the only writable field
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateOrderRequest {
    /// `in_progress`, `completed` or `cancelled`
    pub status: String,
}

/// Full order shape, including the frozen tier snapshot
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i32,
    pub customer_user: i32,
    pub business_user: i32,
    pub title: String,
    pub revisions: i32,
    pub delivery_time_in_days: i32,
    pub price: Decimal,
    #[schema(value_type = Object)]
    pub features: serde_json::Value,
    pub offer_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for OrderResponse {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            customer_user: model.customer_user_id,
            business_user: model.business_user_id,
            title: model.title,
            revisions: model.revisions,
            delivery_time_in_days: model.delivery_time_in_days,
            price: model.price,
            features: model.features,
            offer_type: model.offer_type.as_str().to_string(),
            status: model.status.as_str().to_string(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Count of in-progress orders for a business user
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCountResponse {
    pub order_count: u64,
}

/// Count of completed orders for a business user
#[derive(Debug, Serialize, ToSchema)]
pub struct CompletedOrderCountResponse {
    pub completed_order_count: u64,
}

async fn load_order(state: &AppState, order_id: i32) -> Result<orders::Model, ApiError> {
    orders::Entity::find_by_id(order_id)
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load order {}: {}", order_id, db_error);
            internal_error("Internal server error while loading order")
        })?
        .ok_or_else(|| {
            warn!("Order {} not found", order_id);
            not_found("Order not found", "ORDER_NOT_FOUND")
        })
}

/// List orders the caller participates in (staff sees all)
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    tag = "orders",
    responses(
        (status = 200, description = "Orders retrieved successfully", body = ApiResponse<Vec<OrderResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user))]
pub async fn list_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ApiError> {
    trace!("Entering list_orders function");

    let mut select = orders::Entity::find().order_by_desc(orders::Column::CreatedAt);
    if !current_user.is_staff() {
        // Customer and business sides of the same visibility rule
        select = select.filter(
            Condition::any()
                .add(orders::Column::CustomerUserId.eq(current_user.user.id))
                .add(orders::Column::BusinessUserId.eq(current_user.user.id)),
        );
    }

    let order_models = select.all(&state.db).await.map_err(|db_error| {
        error!("Failed to list orders: {}", db_error);
        internal_error("Internal server error while listing orders")
    })?;

    info!(
        "Retrieved {} orders for user {}",
        order_models.len(),
        current_user.user.id
    );
    Ok(Json(ApiResponse {
        data: order_models.into_iter().map(OrderResponse::from).collect(),
        message: "Orders retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a single order (participant or staff)
#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_id}",
    tag = "orders",
    params(
        ("order_id" = i32, Path, description = "Order ID"),
    ),
    responses(
        (status = 200, description = "Order retrieved successfully", body = ApiResponse<OrderResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user))]
pub async fn get_order(
    Path(order_id): Path<i32>,
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    trace!("Entering get_order function for order_id: {}", order_id);

    let order_model = load_order(&state, order_id).await?;
    authorize(
        &current_user,
        Action::ViewOrder {
            customer_user_id: order_model.customer_user_id,
            business_user_id: order_model.business_user_id,
        },
    )
    .map_err(|denied| denied.into_api_error())?;

    info!("Order {} retrieved by user {}", order_id, current_user.user.id);
    Ok(Json(ApiResponse {
        data: OrderResponse::from(order_model),
        message: "Order retrieved successfully".to_string(),
        success: true,
    }))
}

/// Place an order for a pricing tier (customers only)
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    tag = "orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = ApiResponse<OrderResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a customer", body = ErrorResponse),
        (status = 404, description = "Offer detail not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user))]
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ApiError> {
    trace!("Entering create_order function");
    debug!(
        "User {} ordering offer detail {}",
        current_user.user.id, request.offer_detail_id
    );

    authorize(&current_user, Action::CreateOrder).map_err(|denied| denied.into_api_error())?;

    let detail = offer_detail::Entity::find_by_id(request.offer_detail_id)
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!(
                "Failed to load offer detail {}: {}",
                request.offer_detail_id, db_error
            );
            internal_error("Internal server error while creating order")
        })?
        .ok_or_else(|| {
            warn!("Offer detail {} not found for order", request.offer_detail_id);
            not_found("Offer detail not found", "OFFER_DETAIL_NOT_FOUND")
        })?;

    let parent_offer = offer::Entity::find_by_id(detail.offer_id)
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load offer {}: {}", detail.offer_id, db_error);
            internal_error("Internal server error while creating order")
        })?
        .ok_or_else(|| {
            warn!("Parent offer {} of detail {} missing", detail.offer_id, detail.id);
            not_found("Offer detail not found", "OFFER_DETAIL_NOT_FOUND")
        })?;

    // Freeze the tier at order time
    let now = Utc::now();
    let new_order = orders::ActiveModel {
        customer_user_id: Set(current_user.user.id),
        business_user_id: Set(parent_offer.user_id),
        offer_id: Set(parent_offer.id),
        offer_detail_id: Set(detail.id),
        status: Set(orders::OrderStatus::InProgress),
        title: Set(detail.title.clone()),
        price: Set(detail.price),
        delivery_time_in_days: Set(detail.delivery_time_in_days),
        revisions: Set(detail.revisions),
        features: Set(detail.features.clone()),
        offer_type: Set(detail.offer_type),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let order_model = new_order.insert(&state.db).await.map_err(|db_error| {
        error!("Failed to insert order: {}", db_error);
        internal_error("Internal server error while creating order")
    })?;

    info!(
        "Order created successfully with ID: {}, customer: {}, business: {}",
        order_model.id, order_model.customer_user_id, order_model.business_user_id
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: OrderResponse::from(order_model),
            message: "Order created successfully".to_string(),
            success: true,
        }),
    ))
}

/// Update an order's status (business party or staff)
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{order_id}",
    tag = "orders",
    params(
        ("order_id" = i32, Path, description = "Order ID"),
    ),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated successfully", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid status", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not the business party", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user))]
pub async fn update_order(
    Path(order_id): Path<i32>,
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    trace!("Entering update_order function for order_id: {}", order_id);
    debug!("Updating order {} status to '{}'", order_id, request.status);

    let order_model = load_order(&state, order_id).await?;
    authorize(
        &current_user,
        Action::ModifyOrder {
            business_user_id: order_model.business_user_id,
        },
    )
    .map_err(|denied| denied.into_api_error())?;

    let new_status = orders::OrderStatus::parse(&request.status).ok_or_else(|| {
        warn!("Invalid order status '{}' for order {}", request.status, order_id);
        bad_request(
            "Status must be 'in_progress', 'completed' or 'cancelled'",
            "INVALID_STATUS",
        )
    })?;

    let mut order_active: orders::ActiveModel = order_model.into();
    order_active.status = Set(new_status);
    order_active.updated_at = Set(Utc::now());

    let updated_order = order_active.update(&state.db).await.map_err(|db_error| {
        error!("Failed to update order {}: {}", order_id, db_error);
        internal_error("Internal server error while updating order")
    })?;

    info!(
        "Order {} status set to {} by user {}",
        order_id,
        new_status.as_str(),
        current_user.user.id
    );
    Ok(Json(ApiResponse {
        data: OrderResponse::from(updated_order),
        message: "Order updated successfully".to_string(),
        success: true,
    }))
}

/// Delete an order (staff only)
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{order_id}",
    tag = "orders",
    params(
        ("order_id" = i32, Path, description = "Order ID"),
    ),
    responses(
        (status = 200, description = "Order deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not staff", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user))]
pub async fn delete_order(
    Path(order_id): Path<i32>,
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_order function for order_id: {}", order_id);

    authorize(&current_user, Action::DeleteOrder).map_err(|denied| denied.into_api_error())?;

    let delete_result = orders::Entity::delete_by_id(order_id)
        .exec(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to delete order {}: {}", order_id, db_error);
            internal_error("Internal server error while deleting order")
        })?;

    if delete_result.rows_affected == 0 {
        warn!("Order {} not found for deletion", order_id);
        return Err(not_found("Order not found", "ORDER_NOT_FOUND"));
    }

    info!("Order {} deleted by staff user {}", order_id, current_user.user.id);
    Ok(Json(ApiResponse {
        data: format!("Order {} deleted", order_id),
        message: "Order deleted successfully".to_string(),
        success: true,
    }))
}

async fn check_business_target(state: &AppState, business_user_id: i32) -> Result<(), ApiError> {
    let profile = user_profile::Entity::find()
        .filter(user_profile::Column::UserId.eq(business_user_id))
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!(
                "Failed to load profile for user {}: {}",
                business_user_id, db_error
            );
            internal_error("Internal server error while counting orders")
        })?
        .ok_or_else(|| {
            warn!("No profile for user {} in order count", business_user_id);
            not_found("Business user not found", "PROFILE_NOT_FOUND")
        })?;

    if profile.profile_type != user_profile::ProfileType::Business {
        warn!(
            "Order count requested for non-business user {} ({})",
            business_user_id,
            profile.profile_type.as_str()
        );
        return Err(forbidden(
            "User is not a business user",
            "NOT_A_BUSINESS_USER",
        ));
    }
    Ok(())
}

/// Count in-progress orders of a business user
#[utoipa::path(
    get,
    path = "/api/v1/order-count/{business_user_id}",
    tag = "orders",
    params(
        ("business_user_id" = i32, Path, description = "Business user ID"),
    ),
    responses(
        (status = 200, description = "Order count retrieved successfully", body = ApiResponse<OrderCountResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a business user", body = ErrorResponse),
        (status = 404, description = "Business user not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(_current_user))]
pub async fn order_count(
    Path(business_user_id): Path<i32>,
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> Result<Json<ApiResponse<OrderCountResponse>>, ApiError> {
    trace!("Entering order_count function for business_user_id: {}", business_user_id);

    check_business_target(&state, business_user_id).await?;

    let count = orders::Entity::find()
        .filter(orders::Column::BusinessUserId.eq(business_user_id))
        .filter(orders::Column::Status.eq(orders::OrderStatus::InProgress))
        .count(&state.db)
        .await
        .map_err(|db_error| {
            error!(
                "Failed to count orders for business user {}: {}",
                business_user_id, db_error
            );
            internal_error("Internal server error while counting orders")
        })?;

    info!("Business user {} has {} in-progress orders", business_user_id, count);
    Ok(Json(ApiResponse {
        data: OrderCountResponse { order_count: count },
        message: "Order count retrieved successfully".to_string(),
        success: true,
    }))
}

/// Count completed orders of a business user
#[utoipa::path(
    get,
    path = "/api/v1/completed-order-count/{business_user_id}",
    tag = "orders",
    params(
        ("business_user_id" = i32, Path, description = "Business user ID"),
    ),
    responses(
        (status = 200, description = "Completed order count retrieved successfully", body = ApiResponse<CompletedOrderCountResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a business user", body = ErrorResponse),
        (status = 404, description = "Business user not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(_current_user))]
pub async fn completed_order_count(
    Path(business_user_id): Path<i32>,
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> Result<Json<ApiResponse<CompletedOrderCountResponse>>, ApiError> {
    trace!(
        "Entering completed_order_count function for business_user_id: {}",
        business_user_id
    );

    check_business_target(&state, business_user_id).await?;

    let count = orders::Entity::find()
        .filter(orders::Column::BusinessUserId.eq(business_user_id))
        .filter(orders::Column::Status.eq(orders::OrderStatus::Completed))
        .count(&state.db)
        .await
        .map_err(|db_error| {
            error!(
                "Failed to count completed orders for business user {}: {}",
                business_user_id, db_error
            );
            internal_error("Internal server error while counting orders")
        })?;

    info!("Business user {} has {} completed orders", business_user_id, count);
    Ok(Json(ApiResponse {
        data: CompletedOrderCountResponse {
            completed_order_count: count,
        },
        message: "Completed order count retrieved successfully".to_string(),
        success: true,
    }))
}
