//! Records around a profile that most list views display, loaded in batches.

use crate::entities::{
    UNKNOWN_LABEL, apollonyar_entity, course_entity, profile_entity, term_entity, user_entity,
};
use crate::error::{AppError, AppResult};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct ProfileContext {
    pub profile: profile_entity::Model,
    pub user: Option<user_entity::Model>,
    pub course: Option<course_entity::Model>,
    pub term: Option<term_entity::Model>,
    pub apollonyar: Option<apollonyar_entity::Model>,
}

impl ProfileContext {
    pub fn student_name(&self) -> String {
        self.user
            .as_ref()
            .map(|u| u.full_name())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    pub fn phone(&self) -> String {
        self.user
            .as_ref()
            .map(|u| u.phone_number.clone())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    pub fn course_name(&self) -> String {
        self.course
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    pub fn term_name(&self) -> String {
        self.term
            .as_ref()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    pub fn apollonyar_name(&self) -> String {
        self.apollonyar
            .as_ref()
            .map(|a| a.full_name())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    /// `"<name> (<phone>)"`, the way audit descriptions refer to a student
    pub fn student_ref(&self) -> String {
        format!("{} ({})", self.student_name(), self.phone())
    }
}

pub async fn load_profile_contexts<C: ConnectionTrait>(
    db: &C,
    profile_ids: impl IntoIterator<Item = i32>,
) -> AppResult<HashMap<i32, ProfileContext>> {
    let ids: Vec<i32> = profile_ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let profiles = profile_entity::Entity::find()
        .filter(profile_entity::Column::Id.is_in(ids))
        .all(db)
        .await?;

    let user_ids: BTreeSet<i32> = profiles.iter().map(|p| p.user_id).collect();
    let course_ids: BTreeSet<i32> = profiles.iter().map(|p| p.course_id).collect();
    let term_ids: BTreeSet<i32> = profiles.iter().filter_map(|p| p.term_id).collect();
    let staff_ids: BTreeSet<i32> = profiles.iter().filter_map(|p| p.apollonyar_id).collect();

    let users: HashMap<i32, user_entity::Model> = user_entity::Entity::find()
        .filter(user_entity::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let courses: HashMap<i32, course_entity::Model> = course_entity::Entity::find()
        .filter(course_entity::Column::Id.is_in(course_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let terms: HashMap<i32, term_entity::Model> = term_entity::Entity::find()
        .filter(term_entity::Column::Id.is_in(term_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();
    let staff: HashMap<i32, apollonyar_entity::Model> = apollonyar_entity::Entity::find()
        .filter(apollonyar_entity::Column::Id.is_in(staff_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    Ok(profiles
        .into_iter()
        .map(|profile| {
            let ctx = ProfileContext {
                user: users.get(&profile.user_id).cloned(),
                course: courses.get(&profile.course_id).cloned(),
                term: profile.term_id.and_then(|id| terms.get(&id).cloned()),
                apollonyar: profile.apollonyar_id.and_then(|id| staff.get(&id).cloned()),
                profile,
            };
            (ctx.profile.id, ctx)
        })
        .collect())
}

pub async fn load_profile_context<C: ConnectionTrait>(
    db: &C,
    profile_id: i32,
) -> AppResult<ProfileContext> {
    load_profile_contexts(db, [profile_id])
        .await?
        .remove(&profile_id)
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

/// Staff members keyed by id, for issuer/author/assessor names
pub async fn load_apollonyars<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i32>,
) -> AppResult<HashMap<i32, apollonyar_entity::Model>> {
    let ids: BTreeSet<i32> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(apollonyar_entity::Entity::find()
        .filter(apollonyar_entity::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect())
}

/// The only view built from a one-row batch
pub fn single<T>(mut views: Vec<T>) -> AppResult<T> {
    views
        .pop()
        .ok_or_else(|| AppError::InternalError("View assembly returned nothing".to_string()))
}
