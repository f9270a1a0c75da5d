use sea_orm::entity::prelude::*;

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(12))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Purchase of a single offer detail. The `title` through `features`
/// columns are a snapshot taken at creation time; later edits to the
/// offer never touch existing orders.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_user_id: i32,
    pub business_user_id: i32,
    pub offer_id: i32,
    pub offer_detail_id: i32,
    pub status: OrderStatus,
    pub title: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    pub delivery_time_in_days: i32,
    pub revisions: i32,
    pub features: Json,
    pub offer_type: super::offer_detail::OfferType,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CustomerUserId",
        to = "super::user::Column::Id"
    )]
    CustomerUser,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::BusinessUserId",
        to = "super::user::Column::Id"
    )]
    BusinessUser,
}

impl ActiveModelBehavior for ActiveModel {}
