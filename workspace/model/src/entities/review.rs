use sea_orm::entity::prelude::*;

/// Customer rating of a business user. One review per
/// (business, customer) pair, enforced by a unique index.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub business_user_id: i32,
    pub customer_user_id: i32,
    /// Integer in 1..=5, validated before insert.
    pub rating: i32,
    pub description: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::BusinessUserId",
        to = "super::user::Column::Id"
    )]
    BusinessUser,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CustomerUserId",
        to = "super::user::Column::Id"
    )]
    CustomerUser,
}

impl ActiveModelBehavior for ActiveModel {}
