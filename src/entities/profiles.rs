use super::choice::{Choice, choice_enum};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

choice_enum! {
    ProfileType {
        TermBased => ("term-based", "ترمی"),
        SelfStudy => ("self-study", "خودخوان"),
    }
}

choice_enum! {
    ProfileStatus {
        Active => ("active", "فعال"),
        Suspended => ("suspended", "معلق"),
        Optout => ("optout", "انصراف"),
    }
}

impl ProfileStatus {
    pub fn enrollment_label(&self) -> &'static str {
        match self {
            ProfileStatus::Active => "آزاد",
            ProfileStatus::Suspended => "مسدود",
            ProfileStatus::Optout => "انصراف",
        }
    }

    /// Also accepts the enrollment labels (آزاد / مسدود / انصراف).
    pub fn parse_status(input: &str) -> Option<Self> {
        Self::parse_choice(input).or_else(|| {
            let input = input.trim();
            Self::ALL
                .iter()
                .copied()
                .find(|s| s.enrollment_label() == input)
        })
    }

    pub fn access_label(&self) -> &'static str {
        match self {
            ProfileStatus::Active => "فعال",
            _ => "غیرفعال",
        }
    }

    /// Shown next to installments
    pub fn course_status_label(&self) -> &'static str {
        match self {
            ProfileStatus::Active => "فعال",
            ProfileStatus::Suspended => "مسدود",
            ProfileStatus::Optout => super::choice::UNKNOWN_LABEL,
        }
    }
}

pub const DEFAULT_HEARTS: i16 = 3;

/// Enrollment of a user in a course, optionally pinned to a term and group
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub course_id: i32,
    pub term_id: Option<i32>,
    pub group_id: Option<i32>,
    pub apollonyar_id: Option<i32>,
    pub sales_representative_id: Option<i32>,
    #[sea_orm(column_name = "type")]
    pub profile_type: ProfileType,
    pub status: ProfileStatus,
    pub hearts: i16,
    pub stars: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
