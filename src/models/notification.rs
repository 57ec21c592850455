use crate::entities::{NotificationType, notification_entity as notifications};
use crate::models::MemberSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub member_id: Uuid,
    pub bill_id: Option<Uuid>,
    pub package_name: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberSummary>,
}

impl From<notifications::Model> for NotificationResponse {
    fn from(m: notifications::Model) -> Self {
        Self {
            id: m.id,
            member_id: m.member_id,
            bill_id: m.bill_id,
            package_name: m.package_name,
            notification_type: m.r#type,
            title: m.title,
            message: m.message,
            is_read: m.is_read,
            created_at: m.created_at,
            member: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateNotificationRequest {
    pub member_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[schema(example = "Gym closed on Monday")]
    pub title: String,
    pub message: String,
    pub bill_id: Option<Uuid>,
    pub package_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BroadcastNotificationRequest {
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default = "default_broadcast_type")]
    pub notification_type: NotificationType,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendToMembersRequest {
    pub member_ids: Vec<Uuid>,
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default = "default_broadcast_type")]
    pub notification_type: NotificationType,
}

fn default_broadcast_type() -> NotificationType {
    NotificationType::General
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationQuery {
    pub member_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct NotificationTypeCounts {
    pub general: i64,
    pub bill_pending: i64,
    pub membership_expiring: i64,
    pub membership_activated: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct NotificationStats {
    pub total: i64,
    pub unread: i64,
    pub by_type: NotificationTypeCounts,
    /// 最近 24 小时内创建的数量
    pub recent: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AffectedRowsResponse {
    pub affected: u64,
}
