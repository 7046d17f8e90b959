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
enum Courses {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Terms {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Groups {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum MedalDefs {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum AssignmentDefs {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum AssignmentDefTemplates {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum CallDefs {
    Table,
    Id,
}

/// Enrollment of a student in a course/term
#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    UserId,
    CourseId,
    TermId,
    GroupId,
    ApollonyarId,
    SalesRepresentativeId,
    Type,
    Status,
    Hearts,
    Stars,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Medals {
    Table,
    Id,
    ProfileId,
    MedalDefId,
    GiverApollonyarId,
    Description,
    AwardedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Assignments {
    Table,
    Id,
    ProfileId,
    AssignmentDefId,
    Deadline,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AssignmentSubmissions {
    Table,
    Id,
    AssignmentId,
    AssessorApollonyarId,
    SubmittedAt,
    Grade,
    Feedback,
    AssessedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AssignmentSubmissionFiles {
    Table,
    Id,
    SubmissionId,
    TemplateId,
    File,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Calls {
    Table,
    Id,
    ProfileId,
    CallDefId,
    CallerId,
    Type,
    Status,
    CallTimestamp,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Notes {
    Table,
    Id,
    ProfileId,
    AuthorApollonyarId,
    Note,
    Timestamp,
    CreatedAt,
    UpdatedAt,
}

/// Audit trail of staff actions
#[derive(DeriveIden)]
enum Logs {
    Table,
    Id,
    Action,
    IssuerApollonyarId,
    ProfileId,
    Description,
    Timestamp,
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
        // term, group and staff links are nulled out rather than cascading
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(&mut id_col(Profiles::Id))
                    .col(ColumnDef::new(Profiles::UserId).integer().not_null())
                    .col(ColumnDef::new(Profiles::CourseId).integer().not_null())
                    .col(ColumnDef::new(Profiles::TermId).integer().null())
                    .col(ColumnDef::new(Profiles::GroupId).integer().null())
                    .col(ColumnDef::new(Profiles::ApollonyarId).integer().null())
                    .col(ColumnDef::new(Profiles::SalesRepresentativeId).integer().null())
                    .col(
                        ColumnDef::new(Profiles::Type)
                            .string_len(20)
                            .not_null()
                            .default("term-based"),
                    )
                    .col(
                        ColumnDef::new(Profiles::Status)
                            .string_len(20)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Profiles::Hearts)
                            .small_integer()
                            .not_null()
                            .default(3),
                    )
                    .col(ColumnDef::new(Profiles::Stars).double().not_null().default(0.0))
                    .col(&mut timestamp_col(Profiles::CreatedAt))
                    .col(&mut timestamp_col(Profiles::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profiles_user")
                            .from(Profiles::Table, Profiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profiles_course")
                            .from(Profiles::Table, Profiles::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profiles_term")
                            .from(Profiles::Table, Profiles::TermId)
                            .to(Terms::Table, Terms::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profiles_group")
                            .from(Profiles::Table, Profiles::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profiles_apollonyar")
                            .from(Profiles::Table, Profiles::ApollonyarId)
                            .to(Apollonyars::Table, Apollonyars::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profiles_sales_representative")
                            .from(Profiles::Table, Profiles::SalesRepresentativeId)
                            .to(Apollonyars::Table, Apollonyars::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_profiles_user")
                    .table(Profiles::Table)
                    .col(Profiles::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Medals::Table)
                    .if_not_exists()
                    .col(&mut id_col(Medals::Id))
                    .col(ColumnDef::new(Medals::ProfileId).integer().not_null())
                    .col(ColumnDef::new(Medals::MedalDefId).integer().not_null())
                    .col(ColumnDef::new(Medals::GiverApollonyarId).integer().null())
                    .col(ColumnDef::new(Medals::Description).text().null())
                    .col(&mut timestamp_col(Medals::AwardedAt))
                    .col(&mut timestamp_col(Medals::CreatedAt))
                    .col(&mut timestamp_col(Medals::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_medals_profile")
                            .from(Medals::Table, Medals::ProfileId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_medals_medal_def")
                            .from(Medals::Table, Medals::MedalDefId)
                            .to(MedalDefs::Table, MedalDefs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_medals_giver")
                            .from(Medals::Table, Medals::GiverApollonyarId)
                            .to(Apollonyars::Table, Apollonyars::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // one award per (profile, medal_def)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_medals_profile_medal_def")
                    .table(Medals::Table)
                    .col(Medals::ProfileId)
                    .col(Medals::MedalDefId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(&mut id_col(Assignments::Id))
                    .col(ColumnDef::new(Assignments::ProfileId).integer().not_null())
                    .col(ColumnDef::new(Assignments::AssignmentDefId).integer().not_null())
                    .col(
                        ColumnDef::new(Assignments::Deadline)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(&mut timestamp_col(Assignments::CreatedAt))
                    .col(&mut timestamp_col(Assignments::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignments_profile")
                            .from(Assignments::Table, Assignments::ProfileId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignments_def")
                            .from(Assignments::Table, Assignments::AssignmentDefId)
                            .to(AssignmentDefs::Table, AssignmentDefs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AssignmentSubmissions::Table)
                    .if_not_exists()
                    .col(&mut id_col(AssignmentSubmissions::Id))
                    .col(
                        ColumnDef::new(AssignmentSubmissions::AssignmentId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::AssessorApollonyarId)
                            .integer()
                            .null(),
                    )
                    .col(&mut timestamp_col(AssignmentSubmissions::SubmittedAt))
                    .col(ColumnDef::new(AssignmentSubmissions::Grade).small_integer().null())
                    .col(ColumnDef::new(AssignmentSubmissions::Feedback).text().null())
                    .col(
                        ColumnDef::new(AssignmentSubmissions::AssessedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut timestamp_col(AssignmentSubmissions::CreatedAt))
                    .col(&mut timestamp_col(AssignmentSubmissions::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_submissions_assignment")
                            .from(
                                AssignmentSubmissions::Table,
                                AssignmentSubmissions::AssignmentId,
                            )
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_submissions_assessor")
                            .from(
                                AssignmentSubmissions::Table,
                                AssignmentSubmissions::AssessorApollonyarId,
                            )
                            .to(Apollonyars::Table, Apollonyars::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AssignmentSubmissionFiles::Table)
                    .if_not_exists()
                    .col(&mut id_col(AssignmentSubmissionFiles::Id))
                    .col(
                        ColumnDef::new(AssignmentSubmissionFiles::SubmissionId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissionFiles::TemplateId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissionFiles::File)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissionFiles::Description)
                            .text()
                            .null(),
                    )
                    .col(&mut timestamp_col(AssignmentSubmissionFiles::CreatedAt))
                    .col(&mut timestamp_col(AssignmentSubmissionFiles::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submission_files_submission")
                            .from(
                                AssignmentSubmissionFiles::Table,
                                AssignmentSubmissionFiles::SubmissionId,
                            )
                            .to(AssignmentSubmissions::Table, AssignmentSubmissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submission_files_template")
                            .from(
                                AssignmentSubmissionFiles::Table,
                                AssignmentSubmissionFiles::TemplateId,
                            )
                            .to(AssignmentDefTemplates::Table, AssignmentDefTemplates::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Calls::Table)
                    .if_not_exists()
                    .col(&mut id_col(Calls::Id))
                    .col(ColumnDef::new(Calls::ProfileId).integer().not_null())
                    .col(ColumnDef::new(Calls::CallDefId).integer().null())
                    .col(ColumnDef::new(Calls::CallerId).integer().null())
                    .col(ColumnDef::new(Calls::Type).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Calls::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Calls::CallTimestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Calls::Description).text().null())
                    .col(&mut timestamp_col(Calls::CreatedAt))
                    .col(&mut timestamp_col(Calls::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_calls_profile")
                            .from(Calls::Table, Calls::ProfileId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_calls_call_def")
                            .from(Calls::Table, Calls::CallDefId)
                            .to(CallDefs::Table, CallDefs::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_calls_caller")
                            .from(Calls::Table, Calls::CallerId)
                            .to(Apollonyars::Table, Apollonyars::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notes::Table)
                    .if_not_exists()
                    .col(&mut id_col(Notes::Id))
                    .col(ColumnDef::new(Notes::ProfileId).integer().not_null())
                    .col(ColumnDef::new(Notes::AuthorApollonyarId).integer().null())
                    .col(ColumnDef::new(Notes::Note).text().not_null())
                    .col(&mut timestamp_col(Notes::Timestamp))
                    .col(&mut timestamp_col(Notes::CreatedAt))
                    .col(&mut timestamp_col(Notes::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notes_profile")
                            .from(Notes::Table, Notes::ProfileId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notes_author")
                            .from(Notes::Table, Notes::AuthorApollonyarId)
                            .to(Apollonyars::Table, Apollonyars::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Logs::Table)
                    .if_not_exists()
                    .col(&mut id_col(Logs::Id))
                    .col(ColumnDef::new(Logs::Action).string_len(255).not_null())
                    .col(ColumnDef::new(Logs::IssuerApollonyarId).integer().null())
                    .col(ColumnDef::new(Logs::ProfileId).integer().null())
                    .col(ColumnDef::new(Logs::Description).text().null())
                    .col(&mut timestamp_col(Logs::Timestamp))
                    .col(&mut timestamp_col(Logs::CreatedAt))
                    .col(&mut timestamp_col(Logs::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_logs_issuer")
                            .from(Logs::Table, Logs::IssuerApollonyarId)
                            .to(Apollonyars::Table, Apollonyars::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_logs_profile")
                            .from(Logs::Table, Logs::ProfileId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Logs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Calls::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssignmentSubmissionFiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssignmentSubmissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Medals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;
        Ok(())
    }
}
