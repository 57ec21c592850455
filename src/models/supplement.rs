use crate::entities::supplement_entity as supplements;
use crate::models::{BillResponse, MemberResponse, NotificationResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SupplementResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub category: String,
    pub stock_quantity: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl From<supplements::Model> for SupplementResponse {
    fn from(m: supplements::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            price: m.price,
            category: m.category,
            stock_quantity: m.stock_quantity,
            is_available: m.is_available,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSupplementRequest {
    #[schema(example = "Whey Protein 2kg")]
    pub name: String,
    pub description: Option<String>,
    /// 单价（美分）
    #[schema(example = 4599)]
    pub price: i64,
    #[schema(example = "protein")]
    pub category: String,
    pub stock_quantity: i32,
    pub is_available: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateSupplementRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub stock_quantity: Option<i32>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SupplementQuery {
    pub available_only: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseSupplementRequest {
    #[schema(example = 1)]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseSupplementResponse {
    pub member: MemberResponse,
    pub member_created: bool,
    pub bill: BillResponse,
    pub notification: NotificationResponse,
}
