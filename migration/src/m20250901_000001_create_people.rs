use sea_orm_migration::prelude::*;

/// Students, keyed by phone number
#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    PhoneNumber,
    FirstName,
    LastName,
    Email,
    IsActive,
    #[sea_orm(iden = "phone_2_number")]
    Phone2Number,
    Sex,
    Birthday,
    Country,
    StateProvince,
    City,
    FullAddress,
    PostalCode,
    Photo,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

/// Staff members (teachers, sales, support)
#[derive(DeriveIden)]
enum Apollonyars {
    Table,
    Id,
    FirstName,
    LastName,
    PhoneNumber,
    PasswordHash,
    TelegramId,
    IsAdmin,
    IsBlocked,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OtpCodes {
    Table,
    Id,
    PhoneNumber,
    Code,
    ExpiresAt,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::PhoneNumber)
                            .string_len(15)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::FirstName).string_len(150).not_null().default(""))
                    .col(ColumnDef::new(Users::LastName).string_len(150).not_null().default(""))
                    .col(ColumnDef::new(Users::Email).string_len(254).not_null().default(""))
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Users::Phone2Number).string_len(15).null())
                    .col(ColumnDef::new(Users::Sex).string_len(10).null())
                    .col(ColumnDef::new(Users::Birthday).date().null())
                    .col(ColumnDef::new(Users::Country).string_len(50).null())
                    .col(ColumnDef::new(Users::StateProvince).string_len(50).null())
                    .col(ColumnDef::new(Users::City).string_len(50).null())
                    .col(ColumnDef::new(Users::FullAddress).text().null())
                    .col(ColumnDef::new(Users::PostalCode).string_len(20).null())
                    .col(ColumnDef::new(Users::Photo).string_len(255).null())
                    .col(ColumnDef::new(Users::PasswordHash).string_len(128).null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Apollonyars::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Apollonyars::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Apollonyars::FirstName).string_len(100).not_null())
                    .col(ColumnDef::new(Apollonyars::LastName).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Apollonyars::PhoneNumber)
                            .string_len(15)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Apollonyars::PasswordHash).string_len(128).not_null())
                    .col(ColumnDef::new(Apollonyars::TelegramId).string_len(100).null())
                    .col(
                        ColumnDef::new(Apollonyars::IsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Apollonyars::IsBlocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Apollonyars::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Apollonyars::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OtpCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OtpCodes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OtpCodes::PhoneNumber).string_len(15).not_null())
                    .col(ColumnDef::new(OtpCodes::Code).string_len(6).not_null())
                    .col(
                        ColumnDef::new(OtpCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_otp_codes_phone_number")
                    .table(OtpCodes::Table)
                    .col(OtpCodes::PhoneNumber)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OtpCodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Apollonyars::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
