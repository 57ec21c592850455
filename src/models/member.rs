use crate::entities::{MemberStatus, member_entity as members};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// 列表/通知/账单中附带的会员展示字段
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MemberSummary {
    pub membership_number: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl MemberSummary {
    /// 左连接全部为空时视为没有关联数据
    pub fn from_parts(
        membership_number: Option<String>,
        full_name: Option<String>,
        email: Option<String>,
    ) -> Option<Self> {
        if membership_number.is_none() && full_name.is_none() && email.is_none() {
            return None;
        }
        Some(Self {
            membership_number,
            full_name,
            email,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub membership_number: String,
    pub status: MemberStatus,
    pub join_date: NaiveDate,
    pub membership_start_date: Option<NaiveDate>,
    pub membership_end_date: Option<NaiveDate>,
    pub current_package_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<members::Model> for MemberResponse {
    fn from(m: members::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            membership_number: m.membership_number,
            status: m.status,
            join_date: m.join_date,
            membership_start_date: m.membership_start_date,
            membership_end_date: m.membership_end_date,
            current_package_id: m.current_package_id,
            current_package_name: None,
            full_name: None,
            email: None,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberQuery {
    pub status: Option<MemberStatus>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMemberRequest {
    pub user_id: Uuid,
    pub status: Option<MemberStatus>,
    #[schema(example = "2025-09-01")]
    pub join_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateMemberStatusRequest {
    pub status: MemberStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignPackageRequest {
    pub package_id: Uuid,
    #[schema(example = "2025-09-01")]
    pub start_date: Option<NaiveDate>,
}
