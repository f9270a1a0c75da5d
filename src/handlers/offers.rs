use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::{offer, offer_detail, user};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::auth::CurrentUser;
use crate::helpers::aggregates::OfferAggregates;
use crate::permissions::{authorize, Action};
use crate::schemas::{
    internal_error, not_found, validation_error, ApiError, ApiResponse, AppState, ErrorResponse,
    OfferListQuery, Paginated,
};

const DEFAULT_PAGE_SIZE: u64 = 6;

/// One pricing tier in an offer create/update request
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct OfferDetailPayload {
    pub title: String,
    /// -1 means unlimited
    pub revisions: i32,
    pub delivery_time_in_days: i32,
    /// Non-negative decimal, serialized as a string
    pub price: Decimal,
    /// Free-form list of feature strings
    #[schema(value_type = Object)]
    pub features: serde_json::Value,
    /// `basic`, `standard` or `premium`
    pub offer_type: String,
    #[serde(default)]
    pub additional_information: Option<String>,
}

/// Full shape of a single pricing tier
#[derive(Debug, Serialize, ToSchema)]
pub struct OfferDetailResponse {
    pub id: i32,
    pub title: String,
    pub revisions: i32,
    pub delivery_time_in_days: i32,
    pub price: Decimal,
    #[schema(value_type = Object)]
    pub features: serde_json::Value,
    pub offer_type: String,
    pub additional_information: String,
}

impl From<offer_detail::Model> for OfferDetailResponse {
    fn from(model: offer_detail::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            revisions: model.revisions,
            delivery_time_in_days: model.delivery_time_in_days,
            price: model.price,
            features: model.features,
            offer_type: model.offer_type.as_str().to_string(),
            additional_information: model.additional_information,
        }
    }
}

/// Lazy reference to a pricing tier
#[derive(Debug, Serialize, ToSchema)]
pub struct OfferDetailRef {
    pub id: i32,
    pub url: String,
}

impl From<&offer_detail::Model> for OfferDetailRef {
    fn from(model: &offer_detail::Model) -> Self {
        Self {
            id: model.id,
            url: format!("/api/v1/offerdetails/{}", model.id),
        }
    }
}

/// Creator summary attached to offer list rows
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetails {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

/// One row of the offer list
#[derive(Debug, Serialize, ToSchema)]
pub struct OfferListItem {
    pub id: i32,
    /// Creator user ID
    pub user: i32,
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub details: Vec<OfferDetailRef>,
    /// Cheapest tier price; null for an offer without tiers
    pub min_price: Option<Decimal>,
    pub min_delivery_time: Option<i32>,
    pub max_delivery_time: Option<i32>,
    pub user_details: UserDetails,
}

/// Full offer shape with expanded tiers
#[derive(Debug, Serialize, ToSchema)]
pub struct OfferResponse {
    pub id: i32,
    pub user: i32,
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub details: Vec<OfferDetailResponse>,
    pub min_price: Option<Decimal>,
    pub min_delivery_time: Option<i32>,
    pub max_delivery_time: Option<i32>,
}

/// Offer shape returned from create and update
#[derive(Debug, Serialize, ToSchema)]
pub struct OfferWithDetailsResponse {
    pub id: i32,
    pub user: i32,
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub details: Vec<OfferDetailResponse>,
}

/// Request body for creating an offer with its tiers
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateOfferRequest {
    pub title: String,
    pub image: Option<String>,
    #[serde(default)]
    pub description: String,
    pub details: Vec<OfferDetailPayload>,
}

/// Request body for updating an offer. A present `details` array
/// replaces ALL existing tiers.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateOfferRequest {
    pub title: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub details: Option<Vec<OfferDetailPayload>>,
}

fn validate_details(details: &[OfferDetailPayload]) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for (index, payload) in details.iter().enumerate() {
        if offer_detail::OfferType::parse(&payload.offer_type).is_none() {
            fields.insert(
                format!("details[{index}].offer_type"),
                "Offer type must be 'basic', 'standard' or 'premium'".to_string(),
            );
        }
        if payload.price < Decimal::ZERO {
            fields.insert(
                format!("details[{index}].price"),
                "Price must not be negative".to_string(),
            );
        }
        if payload.delivery_time_in_days <= 0 {
            fields.insert(
                format!("details[{index}].delivery_time_in_days"),
                "Delivery time must be a positive number of days".to_string(),
            );
        }
        if payload.title.trim().is_empty() {
            fields.insert(
                format!("details[{index}].title"),
                "Title must not be empty".to_string(),
            );
        }
    }
    fields
}

fn detail_active_model(offer_id: i32, payload: &OfferDetailPayload) -> offer_detail::ActiveModel {
    offer_detail::ActiveModel {
        offer_id: Set(offer_id),
        title: Set(payload.title.clone()),
        price: Set(payload.price),
        delivery_time_in_days: Set(payload.delivery_time_in_days),
        revisions: Set(payload.revisions),
        additional_information: Set(payload.additional_information.clone().unwrap_or_default()),
        features: Set(payload.features.clone()),
        // Validated before this point
        offer_type: Set(offer_detail::OfferType::parse(&payload.offer_type)
            .unwrap_or(offer_detail::OfferType::Basic)),
        ..Default::default()
    }
}

async fn load_offer(state: &AppState, offer_id: i32) -> Result<offer::Model, ApiError> {
    offer::Entity::find_by_id(offer_id)
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load offer {}: {}", offer_id, db_error);
            internal_error("Internal server error while loading offer")
        })?
        .ok_or_else(|| {
            warn!("Offer {} not found", offer_id);
            not_found("Offer not found", "OFFER_NOT_FOUND")
        })
}

async fn load_details_of(
    state: &AppState,
    offer_id: i32,
) -> Result<Vec<offer_detail::Model>, ApiError> {
    offer_detail::Entity::find()
        .filter(offer_detail::Column::OfferId.eq(offer_id))
        .order_by_asc(offer_detail::Column::Id)
        .all(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load details of offer {}: {}", offer_id, db_error);
            internal_error("Internal server error while loading offer details")
        })
}

/// List offers with per-offer aggregates, filtering and pagination
#[utoipa::path(
    get,
    path = "/api/v1/offers",
    tag = "offers",
    params(
        ("creator_id" = Option<i32>, Query, description = "Only offers created by this user"),
        ("min_price" = Option<String>, Query, description = "Only offers whose cheapest tier costs at least this much"),
        ("max_delivery_time" = Option<i32>, Query, description = "Only offers with a tier delivering within this many days"),
        ("ordering" = Option<String>, Query, description = "updated_at, -updated_at, min_price or -min_price"),
        ("search" = Option<String>, Query, description = "Substring match on title and description"),
        ("page" = Option<u64>, Query, description = "Page number (1-based)"),
        ("page_size" = Option<u64>, Query, description = "Items per page (default 6)"),
    ),
    responses(
        (status = 200, description = "Offers retrieved successfully", body = ApiResponse<Paginated<OfferListItem>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn list_offers(
    State(state): State<AppState>,
    Query(query): Query<OfferListQuery>,
) -> Result<Json<ApiResponse<Paginated<OfferListItem>>>, ApiError> {
    trace!("Entering list_offers function");
    debug!("Listing offers with query: {:?}", query);

    let mut select = offer::Entity::find();
    if let Some(creator_id) = query.creator_id {
        select = select.filter(offer::Column::UserId.eq(creator_id));
    }
    if let Some(ref search) = query.search {
        select = select.filter(
            Condition::any()
                .add(offer::Column::Title.contains(search))
                .add(offer::Column::Description.contains(search)),
        );
    }
    select = match query.ordering.as_deref() {
        Some("-updated_at") => select.order_by_desc(offer::Column::UpdatedAt),
        // min_price orderings are applied after aggregation below
        _ => select.order_by_asc(offer::Column::UpdatedAt),
    };

    let offers = select.all(&state.db).await.map_err(|db_error| {
        error!("Failed to list offers: {}", db_error);
        internal_error("Internal server error while listing offers")
    })?;
    debug!("Fetched {} offers before aggregate filtering", offers.len());

    let offer_ids: Vec<i32> = offers.iter().map(|o| o.id).collect();
    let all_details = if offer_ids.is_empty() {
        Vec::new()
    } else {
        offer_detail::Entity::find()
            .filter(offer_detail::Column::OfferId.is_in(offer_ids.clone()))
            .order_by_asc(offer_detail::Column::Id)
            .all(&state.db)
            .await
            .map_err(|db_error| {
                error!("Failed to batch-load offer details: {}", db_error);
                internal_error("Internal server error while listing offers")
            })?
    };
    let mut details_by_offer: HashMap<i32, Vec<offer_detail::Model>> = HashMap::new();
    for detail in all_details {
        details_by_offer.entry(detail.offer_id).or_default().push(detail);
    }

    let user_ids: Vec<i32> = offers.iter().map(|o| o.user_id).collect();
    let users = if user_ids.is_empty() {
        Vec::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(&state.db)
            .await
            .map_err(|db_error| {
                error!("Failed to batch-load offer creators: {}", db_error);
                internal_error("Internal server error while listing offers")
            })?
    };
    let users_by_id: HashMap<i32, user::Model> =
        users.into_iter().map(|u| (u.id, u)).collect();

    // Annotate, then filter on the aggregates
    let mut rows: Vec<(Option<OfferAggregates>, offer::Model)> = offers
        .into_iter()
        .map(|offer_model| {
            let aggregates = details_by_offer
                .get(&offer_model.id)
                .and_then(|details| OfferAggregates::from_details(details));
            (aggregates, offer_model)
        })
        .collect();

    if let Some(floor) = query.min_price {
        rows.retain(|(aggregates, _)| {
            aggregates
                .as_ref()
                .map(|a| a.min_price >= floor)
                .unwrap_or(false)
        });
    }
    if let Some(ceiling) = query.max_delivery_time {
        rows.retain(|(aggregates, _)| {
            aggregates
                .as_ref()
                .map(|a| a.min_delivery_time <= ceiling)
                .unwrap_or(false)
        });
    }

    match query.ordering.as_deref() {
        Some("min_price") => rows.sort_by(|(a, _), (b, _)| {
            let a = a.as_ref().map(|x| x.min_price);
            let b = b.as_ref().map(|x| x.min_price);
            a.cmp(&b)
        }),
        Some("-min_price") => rows.sort_by(|(a, _), (b, _)| {
            let a = a.as_ref().map(|x| x.min_price);
            let b = b.as_ref().map(|x| x.min_price);
            b.cmp(&a)
        }),
        _ => {}
    }

    let count = rows.len() as u64;
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let page = query.page.unwrap_or(1).max(1);
    let total_pages = count.div_ceil(page_size);
    let start = ((page - 1) * page_size) as usize;

    let page_rows: Vec<OfferListItem> = rows
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .map(|(aggregates, offer_model)| {
            let details = details_by_offer.remove(&offer_model.id).unwrap_or_default();
            let user_details = users_by_id
                .get(&offer_model.user_id)
                .map(|u| UserDetails {
                    first_name: u.first_name.clone(),
                    last_name: u.last_name.clone(),
                    username: u.username.clone(),
                })
                .unwrap_or(UserDetails {
                    first_name: String::new(),
                    last_name: String::new(),
                    username: String::new(),
                });
            OfferListItem {
                id: offer_model.id,
                user: offer_model.user_id,
                title: offer_model.title,
                image: offer_model.image,
                description: offer_model.description,
                created_at: offer_model.created_at,
                updated_at: offer_model.updated_at,
                details: details.iter().map(OfferDetailRef::from).collect(),
                min_price: aggregates.as_ref().map(|a| a.min_price),
                min_delivery_time: aggregates.as_ref().map(|a| a.min_delivery_time),
                max_delivery_time: aggregates.as_ref().map(|a| a.max_delivery_time),
                user_details,
            }
        })
        .collect();

    info!("Listed {} offers (page {} of {})", page_rows.len(), page, total_pages);
    Ok(Json(ApiResponse {
        data: Paginated {
            count,
            page,
            page_size,
            total_pages,
            results: page_rows,
        },
        message: "Offers retrieved successfully".to_string(),
        success: true,
    }))
}

/// Create an offer with its pricing tiers (business users only)
#[utoipa::path(
    post,
    path = "/api/v1/offers",
    tag = "offers",
    request_body = CreateOfferRequest,
    responses(
        (status = 201, description = "Offer created successfully", body = ApiResponse<OfferWithDetailsResponse>),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a business user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user, request))]
pub async fn create_offer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CreateOfferRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OfferWithDetailsResponse>>), ApiError> {
    trace!("Entering create_offer function");
    debug!(
        "User {} creating offer '{}' with {} tiers",
        current_user.user.id,
        request.title,
        request.details.len()
    );

    authorize(&current_user, Action::CreateOffer).map_err(|denied| denied.into_api_error())?;

    let mut fields = validate_details(&request.details);
    if request.title.trim().is_empty() {
        fields.insert("title".to_string(), "Title must not be empty".to_string());
    }
    if !fields.is_empty() {
        warn!(
            "Offer creation rejected for user {}: {:?}",
            current_user.user.id,
            fields.keys().collect::<Vec<_>>()
        );
        return Err(validation_error(fields));
    }

    let txn = state.db.begin().await.map_err(|db_error| {
        error!("Failed to open offer creation transaction: {}", db_error);
        internal_error("Internal server error while creating offer")
    })?;

    let now = Utc::now();
    let new_offer = offer::ActiveModel {
        user_id: Set(current_user.user.id),
        title: Set(request.title.clone()),
        image: Set(request.image.clone()),
        description: Set(request.description.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let offer_model = new_offer.insert(&txn).await.map_err(|db_error| {
        error!("Failed to insert offer: {}", db_error);
        internal_error("Internal server error while creating offer")
    })?;

    let mut detail_models = Vec::with_capacity(request.details.len());
    for payload in &request.details {
        let inserted = detail_active_model(offer_model.id, payload)
            .insert(&txn)
            .await
            .map_err(|db_error| {
                error!(
                    "Failed to insert detail for offer {}: {}",
                    offer_model.id, db_error
                );
                internal_error("Internal server error while creating offer")
            })?;
        detail_models.push(inserted);
    }

    txn.commit().await.map_err(|db_error| {
        error!("Failed to commit offer creation transaction: {}", db_error);
        internal_error("Internal server error while creating offer")
    })?;

    info!(
        "Offer created successfully with ID: {}, {} tiers, owner: {}",
        offer_model.id,
        detail_models.len(),
        current_user.user.id
    );
    let response = ApiResponse {
        data: OfferWithDetailsResponse {
            id: offer_model.id,
            user: offer_model.user_id,
            title: offer_model.title,
            image: offer_model.image,
            description: offer_model.description,
            details: detail_models.into_iter().map(OfferDetailResponse::from).collect(),
        },
        message: "Offer created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a single offer with expanded tiers
#[utoipa::path(
    get,
    path = "/api/v1/offers/{offer_id}",
    tag = "offers",
    params(
        ("offer_id" = i32, Path, description = "Offer ID"),
    ),
    responses(
        (status = 200, description = "Offer retrieved successfully", body = ApiResponse<OfferResponse>),
        (status = 404, description = "Offer not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_offer(
    Path(offer_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OfferResponse>>, ApiError> {
    trace!("Entering get_offer function for offer_id: {}", offer_id);

    let offer_model = load_offer(&state, offer_id).await?;
    let details = load_details_of(&state, offer_id).await?;
    let aggregates = OfferAggregates::from_details(&details);

    info!("Offer {} retrieved successfully", offer_id);
    Ok(Json(ApiResponse {
        data: OfferResponse {
            id: offer_model.id,
            user: offer_model.user_id,
            title: offer_model.title,
            image: offer_model.image,
            description: offer_model.description,
            created_at: offer_model.created_at,
            updated_at: offer_model.updated_at,
            details: details.into_iter().map(OfferDetailResponse::from).collect(),
            min_price: aggregates.as_ref().map(|a| a.min_price),
            min_delivery_time: aggregates.as_ref().map(|a| a.min_delivery_time),
            max_delivery_time: aggregates.as_ref().map(|a| a.max_delivery_time),
        },
        message: "Offer retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update an offer (owner or staff). A present `details` array replaces
/// all existing tiers wholesale.
#[utoipa::path(
    patch,
    path = "/api/v1/offers/{offer_id}",
    tag = "offers",
    params(
        ("offer_id" = i32, Path, description = "Offer ID"),
    ),
    request_body = UpdateOfferRequest,
    responses(
        (status = 200, description = "Offer updated successfully", body = ApiResponse<OfferWithDetailsResponse>),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Offer not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user, request))]
pub async fn update_offer(
    Path(offer_id): Path<i32>,
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UpdateOfferRequest>,
) -> Result<Json<ApiResponse<OfferWithDetailsResponse>>, ApiError> {
    trace!("Entering update_offer function for offer_id: {}", offer_id);

    let offer_model = load_offer(&state, offer_id).await?;
    authorize(&current_user, Action::ModifyOffer { owner_id: offer_model.user_id })
        .map_err(|denied| denied.into_api_error())?;

    if let Some(ref details) = request.details {
        let fields = validate_details(details);
        if !fields.is_empty() {
            warn!(
                "Offer update rejected for offer {}: {:?}",
                offer_id,
                fields.keys().collect::<Vec<_>>()
            );
            return Err(validation_error(fields));
        }
    }

    let txn = state.db.begin().await.map_err(|db_error| {
        error!("Failed to open offer update transaction: {}", db_error);
        internal_error("Internal server error while updating offer")
    })?;

    let mut offer_active: offer::ActiveModel = offer_model.into();
    if let Some(title) = request.title {
        offer_active.title = Set(title);
    }
    if let Some(image) = request.image {
        offer_active.image = Set(Some(image));
    }
    if let Some(description) = request.description {
        offer_active.description = Set(description);
    }
    offer_active.updated_at = Set(Utc::now());

    let updated_offer = offer_active.update(&txn).await.map_err(|db_error| {
        error!("Failed to update offer {}: {}", offer_id, db_error);
        internal_error("Internal server error while updating offer")
    })?;

    let detail_models = if let Some(ref payloads) = request.details {
        debug!(
            "Replacing all tiers of offer {} with {} new tiers",
            offer_id,
            payloads.len()
        );
        offer_detail::Entity::delete_many()
            .filter(offer_detail::Column::OfferId.eq(offer_id))
            .exec(&txn)
            .await
            .map_err(|db_error| {
                error!("Failed to delete old tiers of offer {}: {}", offer_id, db_error);
                internal_error("Internal server error while updating offer")
            })?;

        let mut inserted_models = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let inserted = detail_active_model(offer_id, payload)
                .insert(&txn)
                .await
                .map_err(|db_error| {
                    error!(
                        "Failed to insert replacement tier for offer {}: {}",
                        offer_id, db_error
                    );
                    internal_error("Internal server error while updating offer")
                })?;
            inserted_models.push(inserted);
        }
        inserted_models
    } else {
        offer_detail::Entity::find()
            .filter(offer_detail::Column::OfferId.eq(offer_id))
            .order_by_asc(offer_detail::Column::Id)
            .all(&txn)
            .await
            .map_err(|db_error| {
                error!("Failed to load tiers of offer {}: {}", offer_id, db_error);
                internal_error("Internal server error while updating offer")
            })?
    };

    txn.commit().await.map_err(|db_error| {
        error!("Failed to commit offer update transaction: {}", db_error);
        internal_error("Internal server error while updating offer")
    })?;

    info!("Offer {} updated by user {}", offer_id, current_user.user.id);
    Ok(Json(ApiResponse {
        data: OfferWithDetailsResponse {
            id: updated_offer.id,
            user: updated_offer.user_id,
            title: updated_offer.title,
            image: updated_offer.image,
            description: updated_offer.description,
            details: detail_models.into_iter().map(OfferDetailResponse::from).collect(),
        },
        message: "Offer updated successfully".to_string(),
        success: true,
    }))
}

/// Delete an offer (owner or staff); cascades to tiers and orders
#[utoipa::path(
    delete,
    path = "/api/v1/offers/{offer_id}",
    tag = "offers",
    params(
        ("offer_id" = i32, Path, description = "Offer ID"),
    ),
    responses(
        (status = 200, description = "Offer deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Offer not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(current_user))]
pub async fn delete_offer(
    Path(offer_id): Path<i32>,
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_offer function for offer_id: {}", offer_id);

    let offer_model = load_offer(&state, offer_id).await?;
    authorize(&current_user, Action::ModifyOffer { owner_id: offer_model.user_id })
        .map_err(|denied| denied.into_api_error())?;

    offer::Entity::delete_by_id(offer_id)
        .exec(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to delete offer {}: {}", offer_id, db_error);
            internal_error("Internal server error while deleting offer")
        })?;

    info!("Offer {} deleted by user {}", offer_id, current_user.user.id);
    Ok(Json(ApiResponse {
        data: format!("Offer {} deleted", offer_id),
        message: "Offer deleted successfully".to_string(),
        success: true,
    }))
}

/// Get a single pricing tier
#[utoipa::path(
    get,
    path = "/api/v1/offerdetails/{detail_id}",
    tag = "offers",
    params(
        ("detail_id" = i32, Path, description = "Offer detail ID"),
    ),
    responses(
        (status = 200, description = "Offer detail retrieved successfully", body = ApiResponse<OfferDetailResponse>),
        (status = 404, description = "Offer detail not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_offer_detail(
    Path(detail_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OfferDetailResponse>>, ApiError> {
    trace!("Entering get_offer_detail function for detail_id: {}", detail_id);

    let detail = offer_detail::Entity::find_by_id(detail_id)
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load offer detail {}: {}", detail_id, db_error);
            internal_error("Internal server error while loading offer detail")
        })?
        .ok_or_else(|| {
            warn!("Offer detail {} not found", detail_id);
            not_found("Offer detail not found", "OFFER_DETAIL_NOT_FOUND")
        })?;

    info!("Offer detail {} retrieved successfully", detail_id);
    Ok(Json(ApiResponse {
        data: OfferDetailResponse::from(detail),
        message: "Offer detail retrieved successfully".to_string(),
        success: true,
    }))
}
