use crate::entities::fee_package_entity as fee_packages;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeePackageResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub duration_days: i32,
    pub price: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<fee_packages::Model> for FeePackageResponse {
    fn from(m: fee_packages::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            duration_days: m.duration_days,
            price: m.price,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateFeePackageRequest {
    #[schema(example = "Quarterly")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 90)]
    pub duration_days: i32,
    /// 价格（美分）
    #[schema(example = 12000)]
    pub price: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateFeePackageRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_days: Option<i32>,
    pub price: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeePackageQuery {
    pub active_only: Option<bool>,
}
