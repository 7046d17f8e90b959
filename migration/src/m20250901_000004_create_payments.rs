use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Apollonyars {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
}

/// Money movements, verified manually by staff
#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    TargetUserId,
    Amount,
    Type,
    Timestamp,
    ReferenceNumber,
    PaymentMethod,
    VerificationStatus,
    VerificationTimestamp,
    ReceiptImage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TransactionNotes {
    Table,
    Id,
    TransactionId,
    AuthorApollonyarId,
    Note,
    Timestamp,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Installments {
    Table,
    Id,
    ProfileId,
    TransactionId,
    DueAmount,
    DueDate,
    Status,
    IsSplited,
    CreatedAt,
    UpdatedAt,
}

fn id_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn timestamp_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(&mut id_col(Transactions::Id))
                    .col(ColumnDef::new(Transactions::TargetUserId).integer().not_null())
                    .col(ColumnDef::new(Transactions::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::Type).string_len(20).not_null())
                    .col(&mut timestamp_col(Transactions::Timestamp))
                    .col(ColumnDef::new(Transactions::ReferenceNumber).string_len(100).null())
                    .col(ColumnDef::new(Transactions::PaymentMethod).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Transactions::VerificationStatus)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Transactions::VerificationTimestamp)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Transactions::ReceiptImage).string_len(255).null())
                    .col(&mut timestamp_col(Transactions::CreatedAt))
                    .col(&mut timestamp_col(Transactions::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_target_user")
                            .from(Transactions::Table, Transactions::TargetUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TransactionNotes::Table)
                    .if_not_exists()
                    .col(&mut id_col(TransactionNotes::Id))
                    .col(
                        ColumnDef::new(TransactionNotes::TransactionId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionNotes::AuthorApollonyarId)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(TransactionNotes::Note).text().not_null())
                    .col(&mut timestamp_col(TransactionNotes::Timestamp))
                    .col(&mut timestamp_col(TransactionNotes::CreatedAt))
                    .col(&mut timestamp_col(TransactionNotes::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_notes_transaction")
                            .from(TransactionNotes::Table, TransactionNotes::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_notes_author")
                            .from(
                                TransactionNotes::Table,
                                TransactionNotes::AuthorApollonyarId,
                            )
                            .to(Apollonyars::Table, Apollonyars::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // installments keep their row when the paying transaction goes away
        manager
            .create_table(
                Table::create()
                    .table(Installments::Table)
                    .if_not_exists()
                    .col(&mut id_col(Installments::Id))
                    .col(ColumnDef::new(Installments::ProfileId).integer().not_null())
                    .col(ColumnDef::new(Installments::TransactionId).integer().null())
                    .col(ColumnDef::new(Installments::DueAmount).big_integer().not_null())
                    .col(ColumnDef::new(Installments::DueDate).date().not_null())
                    .col(
                        ColumnDef::new(Installments::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Installments::IsSplited)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(&mut timestamp_col(Installments::CreatedAt))
                    .col(&mut timestamp_col(Installments::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_installments_profile")
                            .from(Installments::Table, Installments::ProfileId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_installments_transaction")
                            .from(Installments::Table, Installments::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_installments_profile")
                    .table(Installments::Table)
                    .col(Installments::ProfileId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Installments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionNotes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        Ok(())
    }
}
