use crate::handlers::{
    auth::{login, registration},
    base_info::get_base_info,
    health::health_check,
    offers::{
        create_offer, delete_offer, get_offer, get_offer_detail, list_offers, update_offer,
    },
    orders::{
        completed_order_count, create_order, delete_order, get_order, list_orders, order_count,
        update_order,
    },
    profiles::{
        get_business_profile, get_customer_profile, get_profile, list_business_profiles,
        list_customer_profiles, update_profile,
    },
    reviews::{create_review, delete_review, get_review, list_reviews, update_review},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Registration and login
        .route("/api/v1/registration", post(registration))
        .route("/api/v1/login", post(login))
        // Profile routes
        .route("/api/v1/profile/:user_id", get(get_profile))
        .route("/api/v1/profile/:user_id", patch(update_profile))
        .route("/api/v1/profiles/business", get(list_business_profiles))
        .route("/api/v1/profiles/business/:user_id", get(get_business_profile))
        .route("/api/v1/profiles/customer", get(list_customer_profiles))
        .route("/api/v1/profiles/customer/:user_id", get(get_customer_profile))
        // Offer routes
        .route("/api/v1/offers", get(list_offers))
        .route("/api/v1/offers", post(create_offer))
        .route("/api/v1/offers/:offer_id", get(get_offer))
        .route("/api/v1/offers/:offer_id", patch(update_offer))
        .route("/api/v1/offers/:offer_id", delete(delete_offer))
        .route("/api/v1/offerdetails/:detail_id", get(get_offer_detail))
        // Order routes
        .route("/api/v1/orders", get(list_orders))
        .route("/api/v1/orders", post(create_order))
        .route("/api/v1/orders/:order_id", get(get_order))
        .route("/api/v1/orders/:order_id", patch(update_order))
        .route("/api/v1/orders/:order_id", delete(delete_order))
        .route("/api/v1/order-count/:business_user_id", get(order_count))
        .route(
            "/api/v1/completed-order-count/:business_user_id",
            get(completed_order_count),
        )
        // Review routes
        .route("/api/v1/reviews", get(list_reviews))
        .route("/api/v1/reviews", post(create_review))
        .route("/api/v1/reviews/:review_id", get(get_review))
        .route("/api/v1/reviews/:review_id", patch(update_review))
        .route("/api/v1/reviews/:review_id", delete(delete_review))
        // Platform statistics
        .route("/api/v1/base-info", get(get_base_info))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
