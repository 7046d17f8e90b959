use crate::entities::medal_def_entity as medal_defs;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::course_service::required;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryOrder, QuerySelect, Set,
};

/// Medal definitions. Awarding happens on the profile.
#[derive(Clone)]
pub struct MedalService {
    pool: DatabaseConnection,
}

impl MedalService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_medal_defs(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<MedalDefResponse>> {
        let total = medal_defs::Entity::find().count(&self.pool).await?;
        let items = medal_defs::Entity::find()
            .order_by_asc(medal_defs::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(MedalDefResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn get_medal_def(&self, id: i32) -> AppResult<MedalDefResponse> {
        Ok(self.find(id).await?.into())
    }

    pub async fn create_medal_def(&self, request: CreateMedalDefRequest) -> AppResult<MedalDefResponse> {
        let title = required("title", &request.title)?;
        let now = Utc::now();
        let def = medal_defs::ActiveModel {
            title: Set(title),
            description: Set(request.description.trim().to_string()),
            icon: Set(request.icon),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(def.into())
    }

    pub async fn update_medal_def(
        &self,
        id: i32,
        request: UpdateMedalDefRequest,
    ) -> AppResult<MedalDefResponse> {
        let mut model = self.find(id).await?.into_active_model();
        if let Some(title) = request.title.as_deref() {
            model.title = Set(required("title", title)?);
        }
        if let Some(description) = request.description {
            model.description = Set(description.trim().to_string());
        }
        if request.icon.is_some() {
            model.icon = Set(request.icon);
        }
        model.updated_at = Set(Utc::now());
        Ok(model.update(&self.pool).await?.into())
    }

    /// Awarded medals of this kind are removed with it.
    pub async fn delete_medal_def(&self, id: i32) -> AppResult<()> {
        let result = medal_defs::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Medal definition not found".to_string()));
        }
        Ok(())
    }

    async fn find(&self, id: i32) -> AppResult<medal_defs::Model> {
        medal_defs::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Medal definition not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_medal_def_crud() {
        let db = setup_test_db().await;
        let service = MedalService::new(db);

        assert!(matches!(
            service
                .create_medal_def(CreateMedalDefRequest {
                    title: "  ".into(),
                    description: String::new(),
                    icon: None,
                })
                .await,
            Err(AppError::FieldValidation(_))
        ));

        let def = service
            .create_medal_def(CreateMedalDefRequest {
                title: "Early bird".into(),
                description: "Submitted before the deadline".into(),
                icon: Some("fa-solid fa-award".into()),
            })
            .await
            .unwrap();
        let renamed = service
            .update_medal_def(
                def.id,
                UpdateMedalDefRequest {
                    title: Some("Punctual".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.title, "Punctual");
        assert_eq!(renamed.icon.as_deref(), Some("fa-solid fa-award"));

        service.delete_medal_def(def.id).await.unwrap();
        assert!(matches!(service.get_medal_def(def.id).await, Err(AppError::NotFound(_))));
    }
}
