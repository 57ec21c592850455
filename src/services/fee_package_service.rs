use crate::database::DbPool;
use crate::entities::fee_package_entity as fee_packages;
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

#[derive(Clone)]
pub struct FeePackageService {
    pool: DbPool,
}

impl FeePackageService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, active_only: bool) -> AppResult<Vec<FeePackageResponse>> {
        let mut select = fee_packages::Entity::find();
        if active_only {
            select = select.filter(fee_packages::Column::IsActive.eq(true));
        }
        let rows = select
            .order_by_asc(fee_packages::Column::DurationDays)
            .all(self.pool.as_ref())
            .await?;
        Ok(rows.into_iter().map(FeePackageResponse::from).collect())
    }

    pub async fn create(&self, req: CreateFeePackageRequest) -> AppResult<FeePackageResponse> {
        validate(&req.name, req.duration_days, req.price)?;

        let now = Utc::now();
        let created = fee_packages::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(req.name.trim().to_string()),
            description: Set(req.description),
            duration_days: Set(req.duration_days),
            price: Set(req.price),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.pool.as_ref())
        .await?;

        log::info!("Created fee package {} ({})", created.name, created.id);
        Ok(FeePackageResponse::from(created))
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: UpdateFeePackageRequest,
    ) -> AppResult<FeePackageResponse> {
        let current = self.find(id).await?;
        validate(
            req.name.as_deref().unwrap_or(&current.name),
            req.duration_days.unwrap_or(current.duration_days),
            req.price.unwrap_or(current.price),
        )?;

        let mut active: fee_packages::ActiveModel = current.into();
        if let Some(name) = req.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = req.description {
            active.description = Set(Some(description));
        }
        if let Some(duration_days) = req.duration_days {
            active.duration_days = Set(duration_days);
        }
        if let Some(price) = req.price {
            active.price = Set(price);
        }
        if let Some(is_active) = req.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(self.pool.as_ref()).await?;
        Ok(FeePackageResponse::from(updated))
    }

    /// 停用而不删除，历史账单仍引用该套餐
    pub async fn deactivate(&self, id: Uuid) -> AppResult<FeePackageResponse> {
        let current = self.find(id).await?;
        let mut active: fee_packages::ActiveModel = current.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.pool.as_ref()).await?;
        log::info!("Deactivated fee package {}", updated.id);
        Ok(FeePackageResponse::from(updated))
    }

    async fn find(&self, id: Uuid) -> AppResult<fee_packages::Model> {
        fee_packages::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Fee package not found".to_string()))
    }
}

fn validate(name: &str, duration_days: i32, price: i64) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Package name is required".to_string(),
        ));
    }
    if duration_days <= 0 {
        return Err(AppError::ValidationError(
            "Package duration must be positive".to_string(),
        ));
    }
    if price < 0 {
        return Err(AppError::ValidationError(
            "Package price cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::statements;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn package() -> fee_packages::Model {
        let now = Utc::now();
        fee_packages::Model {
            id: Uuid::new_v4(),
            name: "Monthly".into(),
            description: None,
            duration_days: 30,
            price: 4500,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_validate() {
        assert!(validate("Monthly", 30, 0).is_ok());
        assert!(validate(" ", 30, 100).is_err());
        assert!(validate("Monthly", 0, 100).is_err());
        assert!(validate("Monthly", 30, -1).is_err());
    }

    #[tokio::test]
    async fn test_create_inserts_active_package() {
        let row = package();
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row.clone()]])
            .into_connection()
            .into();

        let created = FeePackageService::new(db)
            .create(CreateFeePackageRequest {
                name: "Monthly".into(),
                description: None,
                duration_days: 30,
                price: 4500,
            })
            .await
            .unwrap();
        assert_eq!(created.id, row.id);
        assert!(created.is_active);
    }

    #[tokio::test]
    async fn test_deactivate_unknown_package_is_not_found() {
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<fee_packages::Model>::new()])
            .into_connection()
            .into();
        let err = FeePackageService::new(db)
            .deactivate(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_duration() {
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![package()]])
            .into_connection()
            .into();
        let err = FeePackageService::new(db.clone())
            .update(
                Uuid::new_v4(),
                UpdateFeePackageRequest {
                    name: None,
                    description: None,
                    duration_days: Some(-5),
                    price: None,
                    is_active: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let log = statements(db);
        assert!(!log.contains("UPDATE"));
    }
}
