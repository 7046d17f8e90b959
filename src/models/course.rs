use crate::entities::{course_entity, group_entity, term_entity};
use crate::utils::format_date;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    pub id: i32,
    pub name: String,
    pub term_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseResponse {
    pub fn new(course: course_entity::Model, term_count: u64) -> Self {
        Self {
            id: course.id,
            name: course.name,
            term_count,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseSummary {
    pub id: i32,
    pub name: String,
}

impl From<&course_entity::Model> for CourseSummary {
    fn from(c: &course_entity::Model) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    pub name: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCourseRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TermResponse {
    pub id: i32,
    pub course_id: i32,
    pub name: String,
    pub price: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_date_formatted: String,
    pub end_date_formatted: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<term_entity::Model> for TermResponse {
    fn from(t: term_entity::Model) -> Self {
        Self {
            start_date_formatted: format_date(t.start_date),
            end_date_formatted: format_date(t.end_date),
            id: t.id,
            course_id: t.course_id,
            name: t.name,
            price: t.price,
            start_date: t.start_date,
            end_date: t.end_date,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Term block nested in the profile view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TermSummary {
    pub id: i32,
    pub name: String,
    pub price: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub course: Option<CourseSummary>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTermRequest {
    pub course_id: i32,
    pub name: String,
    #[serde(default)]
    pub price: i64,
    #[schema(example = "2025-09-01")]
    pub start_date: NaiveDate,
    #[schema(example = "2025-12-01")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTermRequest {
    pub course_id: Option<i32>,
    pub name: Option<String>,
    pub price: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub id: i32,
    pub term_id: i32,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<group_entity::Model> for GroupResponse {
    fn from(g: group_entity::Model) -> Self {
        Self {
            id: g.id,
            term_id: g.term_id,
            title: g.title,
            created_at: g.created_at,
            updated_at: g.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupSummary {
    pub id: i32,
    pub title: String,
}

impl From<&group_entity::Model> for GroupSummary {
    fn from(g: &group_entity::Model) -> Self {
        Self {
            id: g.id,
            title: g.title.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub term_id: i32,
    pub title: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateGroupRequest {
    pub term_id: Option<i32>,
    pub title: Option<String>,
}

/// Shared query for catalog listings
#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub course_id: Option<i32>,
    pub term_id: Option<i32>,
    pub search: Option<String>,
}
