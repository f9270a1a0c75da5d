use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(string(Users::FirstName).default(""))
                    .col(string(Users::LastName).default(""))
                    .col(boolean(Users::IsStaff).default(false))
                    .to_owned(),
            )
            .await?;

        // Create user_profiles table
        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    .col(pk_auto(UserProfiles::Id))
                    .col(integer(UserProfiles::UserId).unique_key())
                    .col(string(UserProfiles::Location).default(""))
                    .col(string(UserProfiles::Email).default(""))
                    .col(string(UserProfiles::File).default(""))
                    .col(string(UserProfiles::Description).default(""))
                    .col(string(UserProfiles::Tel).default(""))
                    .col(string(UserProfiles::WorkingHours).default(""))
                    .col(string_len(UserProfiles::ProfileType, 10))
                    .col(timestamp_with_time_zone(UserProfiles::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_profile_user")
                            .from(UserProfiles::Table, UserProfiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create auth_tokens table
        manager
            .create_table(
                Table::create()
                    .table(AuthTokens::Table)
                    .if_not_exists()
                    .col(pk_auto(AuthTokens::Id))
                    .col(integer(AuthTokens::UserId))
                    .col(string(AuthTokens::Key).unique_key())
                    .col(timestamp_with_time_zone(AuthTokens::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_token_user")
                            .from(AuthTokens::Table, AuthTokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create offers table
        manager
            .create_table(
                Table::create()
                    .table(Offers::Table)
                    .if_not_exists()
                    .col(pk_auto(Offers::Id))
                    .col(integer(Offers::UserId))
                    .col(string(Offers::Title))
                    .col(string_null(Offers::Image))
                    .col(string(Offers::Description).default(""))
                    .col(timestamp_with_time_zone(Offers::CreatedAt))
                    .col(timestamp_with_time_zone(Offers::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_offer_user")
                            .from(Offers::Table, Offers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create offer_details table
        manager
            .create_table(
                Table::create()
                    .table(OfferDetails::Table)
                    .if_not_exists()
                    .col(pk_auto(OfferDetails::Id))
                    .col(integer(OfferDetails::OfferId))
                    .col(string(OfferDetails::Title))
                    .col(decimal_len(OfferDetails::Price, 10, 2))
                    .col(integer(OfferDetails::DeliveryTimeInDays))
                    .col(integer(OfferDetails::Revisions))
                    .col(string(OfferDetails::AdditionalInformation).default(""))
                    .col(json(OfferDetails::Features))
                    .col(string_len(OfferDetails::OfferType, 10))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_offer_detail_offer")
                            .from(OfferDetails::Table, OfferDetails::OfferId)
                            .to(Offers::Table, Offers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create orders table
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(pk_auto(Orders::Id))
                    .col(integer(Orders::CustomerUserId))
                    .col(integer(Orders::BusinessUserId))
                    .col(integer(Orders::OfferId))
                    .col(integer(Orders::OfferDetailId))
                    .col(string_len(Orders::Status, 12))
                    .col(string(Orders::Title))
                    .col(decimal_len(Orders::Price, 10, 2))
                    .col(integer(Orders::DeliveryTimeInDays))
                    .col(integer(Orders::Revisions))
                    .col(json(Orders::Features))
                    .col(string_len(Orders::OfferType, 10))
                    .col(timestamp_with_time_zone(Orders::CreatedAt))
                    .col(timestamp_with_time_zone(Orders::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_customer_user")
                            .from(Orders::Table, Orders::CustomerUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_business_user")
                            .from(Orders::Table, Orders::BusinessUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_offer")
                            .from(Orders::Table, Orders::OfferId)
                            .to(Offers::Table, Offers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create reviews table
        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(pk_auto(Reviews::Id))
                    .col(integer(Reviews::BusinessUserId))
                    .col(integer(Reviews::CustomerUserId))
                    .col(integer(Reviews::Rating))
                    .col(string(Reviews::Description).default(""))
                    .col(timestamp_with_time_zone(Reviews::CreatedAt))
                    .col(timestamp_with_time_zone(Reviews::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_business_user")
                            .from(Reviews::Table, Reviews::BusinessUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_customer_user")
                            .from(Reviews::Table, Reviews::CustomerUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One review per (business, customer) pair
        manager
            .create_index(
                Index::create()
                    .name("idx_review_business_customer")
                    .table(Reviews::Table)
                    .col(Reviews::BusinessUserId)
                    .col(Reviews::CustomerUserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reviews::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(OfferDetails::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Offers::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AuthTokens::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    IsStaff,
}

#[derive(DeriveIden)]
enum UserProfiles {
    Table,
    Id,
    UserId,
    Location,
    Email,
    File,
    Description,
    Tel,
    WorkingHours,
    ProfileType,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AuthTokens {
    Table,
    Id,
    UserId,
    Key,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Offers {
    Table,
    Id,
    UserId,
    Title,
    Image,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OfferDetails {
    Table,
    Id,
    OfferId,
    Title,
    Price,
    DeliveryTimeInDays,
    Revisions,
    AdditionalInformation,
    Features,
    OfferType,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    CustomerUserId,
    BusinessUserId,
    OfferId,
    OfferDetailId,
    Status,
    Title,
    Price,
    DeliveryTimeInDays,
    Revisions,
    Features,
    OfferType,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    BusinessUserId,
    CustomerUserId,
    Rating,
    Description,
    CreatedAt,
    UpdatedAt,
}
