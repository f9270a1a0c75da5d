use sea_orm::entity::prelude::*;

/// Role of a marketplace profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum ProfileType {
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "business")]
    Business,
    #[sea_orm(string_value = "staff")]
    Staff,
}

impl ProfileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Business => "business",
            Self::Staff => "staff",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(Self::Customer),
            "business" => Some(Self::Business),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }
}

/// Marketplace profile extending a [`super::user`] account.
/// `profile_type` is fixed at registration; no update path writes it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub location: String,
    pub email: String,
    /// Opaque reference into the media-storage collaborator.
    pub file: String,
    pub description: String,
    pub tel: String,
    pub working_hours: String,
    pub profile_type: ProfileType,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
