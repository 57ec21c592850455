use crate::entities::{BillStatus, bill_entity as bills};
use crate::models::MemberSummary;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillResponse {
    pub id: Uuid,
    pub member_id: Uuid,
    pub package_id: Option<Uuid>,
    pub amount: i64,
    pub currency: String,
    pub status: BillStatus,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub generated_date: DateTime<Utc>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberSummary>,
}

impl From<bills::Model> for BillResponse {
    fn from(m: bills::Model) -> Self {
        Self {
            id: m.id,
            member_id: m.member_id,
            package_id: m.package_id,
            amount: m.amount,
            currency: m.currency,
            status: m.status,
            due_date: m.due_date,
            paid_date: m.paid_date,
            generated_date: m.generated_date,
            payment_method: m.payment_method,
            notes: m.notes,
            member: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BillQuery {
    pub status: Option<BillStatus>,
    pub member_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessPaymentRequest {
    #[schema(example = "cash")]
    pub payment_method: String,
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateBillRequest {
    pub member_id: Uuid,
    /// 距今多少天到期，默认 7 天，取值 0..=3650
    pub due_in_days: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BillingStats {
    /// 已支付账单金额合计（美分）
    pub total_revenue: i64,
    /// 本月已支付金额（美分）
    pub monthly_revenue: i64,
    pub total_bills: i64,
    pub pending_bills: i64,
    pub paid_bills: i64,
    pub overdue_bills: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GeneratedBillResponse {
    pub bill: BillResponse,
    pub notification_id: Uuid,
}
