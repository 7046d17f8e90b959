use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Terms {
    Table,
    Id,
    CourseId,
    Name,
    Price,
    StartDate,
    EndDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Groups {
    Table,
    Id,
    TermId,
    Title,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AssignmentDefs {
    Table,
    Id,
    TermId,
    Title,
    Deadline,
    IsRequired,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AssignmentDefTemplates {
    Table,
    Id,
    AssignmentDefId,
    Title,
    File,
    IsHelpFile,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CallDefs {
    Table,
    Id,
    TermId,
    Title,
    StartDueDate,
    EndDueDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum MedalDefs {
    Table,
    Id,
    Title,
    Description,
    Icon,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DiscountCodes {
    Table,
    Id,
    Code,
    CashPrice,
    InstallmentPrice,
    MaxUsage,
    UsageCount,
    ExpirationDate,
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
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(&mut id_col(Courses::Id))
                    .col(ColumnDef::new(Courses::Name).string_len(100).not_null())
                    .col(&mut timestamp_col(Courses::CreatedAt))
                    .col(&mut timestamp_col(Courses::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // terms -> courses (cascade)
        manager
            .create_table(
                Table::create()
                    .table(Terms::Table)
                    .if_not_exists()
                    .col(&mut id_col(Terms::Id))
                    .col(ColumnDef::new(Terms::CourseId).integer().not_null())
                    .col(ColumnDef::new(Terms::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Terms::Price).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Terms::StartDate).date().not_null())
                    .col(ColumnDef::new(Terms::EndDate).date().not_null())
                    .col(&mut timestamp_col(Terms::CreatedAt))
                    .col(&mut timestamp_col(Terms::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_terms_course")
                            .from(Terms::Table, Terms::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(&mut id_col(Groups::Id))
                    .col(ColumnDef::new(Groups::TermId).integer().not_null())
                    .col(ColumnDef::new(Groups::Title).string_len(100).not_null())
                    .col(&mut timestamp_col(Groups::CreatedAt))
                    .col(&mut timestamp_col(Groups::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_groups_term")
                            .from(Groups::Table, Groups::TermId)
                            .to(Terms::Table, Terms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AssignmentDefs::Table)
                    .if_not_exists()
                    .col(&mut id_col(AssignmentDefs::Id))
                    .col(ColumnDef::new(AssignmentDefs::TermId).integer().not_null())
                    .col(ColumnDef::new(AssignmentDefs::Title).string_len(200).not_null())
                    .col(
                        ColumnDef::new(AssignmentDefs::Deadline)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentDefs::IsRequired)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(&mut timestamp_col(AssignmentDefs::CreatedAt))
                    .col(&mut timestamp_col(AssignmentDefs::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_defs_term")
                            .from(AssignmentDefs::Table, AssignmentDefs::TermId)
                            .to(Terms::Table, Terms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AssignmentDefTemplates::Table)
                    .if_not_exists()
                    .col(&mut id_col(AssignmentDefTemplates::Id))
                    .col(
                        ColumnDef::new(AssignmentDefTemplates::AssignmentDefId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentDefTemplates::Title)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentDefTemplates::File)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentDefTemplates::IsHelpFile)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(&mut timestamp_col(AssignmentDefTemplates::CreatedAt))
                    .col(&mut timestamp_col(AssignmentDefTemplates::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_def_templates_def")
                            .from(
                                AssignmentDefTemplates::Table,
                                AssignmentDefTemplates::AssignmentDefId,
                            )
                            .to(AssignmentDefs::Table, AssignmentDefs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CallDefs::Table)
                    .if_not_exists()
                    .col(&mut id_col(CallDefs::Id))
                    .col(ColumnDef::new(CallDefs::TermId).integer().not_null())
                    .col(ColumnDef::new(CallDefs::Title).string_len(200).not_null())
                    .col(
                        ColumnDef::new(CallDefs::StartDueDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CallDefs::EndDueDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(&mut timestamp_col(CallDefs::CreatedAt))
                    .col(&mut timestamp_col(CallDefs::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_call_defs_term")
                            .from(CallDefs::Table, CallDefs::TermId)
                            .to(Terms::Table, Terms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MedalDefs::Table)
                    .if_not_exists()
                    .col(&mut id_col(MedalDefs::Id))
                    .col(ColumnDef::new(MedalDefs::Title).string_len(100).not_null())
                    .col(ColumnDef::new(MedalDefs::Description).text().not_null())
                    .col(ColumnDef::new(MedalDefs::Icon).string_len(255).null())
                    .col(&mut timestamp_col(MedalDefs::CreatedAt))
                    .col(&mut timestamp_col(MedalDefs::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DiscountCodes::Table)
                    .if_not_exists()
                    .col(&mut id_col(DiscountCodes::Id))
                    .col(
                        ColumnDef::new(DiscountCodes::Code)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(DiscountCodes::CashPrice).big_integer().null())
                    .col(
                        ColumnDef::new(DiscountCodes::InstallmentPrice)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DiscountCodes::MaxUsage)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(DiscountCodes::UsageCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DiscountCodes::ExpirationDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut timestamp_col(DiscountCodes::CreatedAt))
                    .col(&mut timestamp_col(DiscountCodes::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DiscountCodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MedalDefs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CallDefs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssignmentDefTemplates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssignmentDefs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Terms::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;
        Ok(())
    }
}
