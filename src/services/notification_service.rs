use crate::database::DbPool;
use crate::entities::{
    MemberStatus, NotificationType, fee_package_entity as fee_packages,
    member_entity as members, notification_entity as notifications,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::realtime::{ChangeFeed, FeedFilter, Subscription};
use crate::services::MemberService;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

/// 会员到期提醒的提前天数
pub const EXPIRY_WARNING_DAYS: i64 = 7;

#[derive(Clone)]
pub struct NotificationService {
    pool: DbPool,
    feed: ChangeFeed,
}

impl NotificationService {
    pub fn new(pool: DbPool, feed: ChangeFeed) -> Self {
        Self { pool, feed }
    }

    pub async fn list_all(&self) -> AppResult<Vec<NotificationResponse>> {
        let rows = notifications::Entity::find()
            .order_by_desc(notifications::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;
        self.with_members(rows).await
    }

    pub async fn list_by_member(&self, member_id: Uuid) -> AppResult<Vec<NotificationResponse>> {
        let rows = notifications::Entity::find()
            .filter(notifications::Column::MemberId.eq(member_id))
            .order_by_desc(notifications::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;
        self.with_members(rows).await
    }

    pub async fn list_by_type(
        &self,
        notification_type: NotificationType,
    ) -> AppResult<Vec<NotificationResponse>> {
        let rows = notifications::Entity::find()
            .filter(notifications::Column::Type.eq(notification_type))
            .order_by_desc(notifications::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;
        self.with_members(rows).await
    }

    pub async fn create(&self, req: CreateNotificationRequest) -> AppResult<NotificationResponse> {
        let mut created = self.create_bulk(vec![req]).await?;
        created
            .pop()
            .ok_or_else(|| AppError::InternalError("Notification was not created".to_string()))
    }

    /// 批量创建，单条 INSERT 完成
    pub async fn create_bulk(
        &self,
        reqs: Vec<CreateNotificationRequest>,
    ) -> AppResult<Vec<NotificationResponse>> {
        if reqs.is_empty() {
            return Ok(Vec::new());
        }
        for req in &reqs {
            validate_content(&req.title, &req.message)?;
        }

        let now = Utc::now();
        let rows: Vec<notifications::Model> = reqs.into_iter().map(|r| draft(r, now)).collect();
        Self::insert_rows(self.pool.as_ref(), &rows).await?;
        self.publish(&rows);

        log::info!("Created {} notification(s)", rows.len());
        Ok(rows.into_iter().map(NotificationResponse::from).collect())
    }

    /// 返回受影响行数，id 不存在时为 0
    pub async fn mark_read(&self, id: Uuid) -> AppResult<u64> {
        let res = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::Id.eq(id))
            .exec(self.pool.as_ref())
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn mark_all_read_for_member(&self, member_id: Uuid) -> AppResult<u64> {
        let res = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::MemberId.eq(member_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(self.pool.as_ref())
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<u64> {
        let res = notifications::Entity::delete_by_id(id)
            .exec(self.pool.as_ref())
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn delete_all_for_member(&self, member_id: Uuid) -> AppResult<u64> {
        let res = notifications::Entity::delete_many()
            .filter(notifications::Column::MemberId.eq(member_id))
            .exec(self.pool.as_ref())
            .await?;
        Ok(res.rows_affected)
    }

    /// 给所有 ACTIVE 会员各发一条；没有活跃会员时返回空列表
    pub async fn send_to_all_active(
        &self,
        title: String,
        message: String,
        notification_type: NotificationType,
    ) -> AppResult<Vec<NotificationResponse>> {
        validate_content(&title, &message)?;
        let active = members::Entity::find()
            .filter(members::Column::Status.eq(MemberStatus::Active))
            .all(self.pool.as_ref())
            .await?;
        if active.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = active.iter().map(|m| m.id).collect();
        self.send_to_members(ids, title, message, notification_type)
            .await
    }

    /// 每个传入的会员 id 生成一条通知，重复 id 也会重复生成
    pub async fn send_to_members(
        &self,
        member_ids: Vec<Uuid>,
        title: String,
        message: String,
        notification_type: NotificationType,
    ) -> AppResult<Vec<NotificationResponse>> {
        let reqs = member_ids
            .into_iter()
            .map(|member_id| CreateNotificationRequest {
                member_id,
                notification_type,
                title: title.clone(),
                message: message.clone(),
                bill_id: None,
                package_name: None,
            })
            .collect();
        self.create_bulk(reqs).await
    }

    /// 全表扫描 (type, is_read, created_at) 后在进程内汇总
    pub async fn stats(&self, now: DateTime<Utc>) -> AppResult<NotificationStats> {
        let rows: Vec<(NotificationType, bool, DateTime<Utc>)> = notifications::Entity::find()
            .select_only()
            .column(notifications::Column::Type)
            .column(notifications::Column::IsRead)
            .column(notifications::Column::CreatedAt)
            .into_tuple()
            .all(self.pool.as_ref())
            .await?;
        Ok(aggregate_stats(&rows, now))
    }

    /// 为 [today, today + 7] 内到期的 ACTIVE 会员生成到期提醒
    ///
    /// 不会与之前生成的提醒去重，重复调用会产生重复通知。
    pub async fn create_expiry_warnings(
        &self,
        today: NaiveDate,
    ) -> AppResult<Vec<NotificationResponse>> {
        let (from, to) = expiry_window(today);
        let expiring = members::Entity::find()
            .filter(members::Column::Status.eq(MemberStatus::Active))
            .filter(members::Column::MembershipEndDate.between(from, to))
            .all(self.pool.as_ref())
            .await?;
        if expiring.is_empty() {
            return Ok(Vec::new());
        }

        let package_ids: Vec<Uuid> = expiring
            .iter()
            .filter_map(|m| m.current_package_id)
            .collect();
        let package_names: HashMap<Uuid, String> = if package_ids.is_empty() {
            HashMap::new()
        } else {
            fee_packages::Entity::find()
                .filter(fee_packages::Column::Id.is_in(package_ids))
                .all(self.pool.as_ref())
                .await?
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect()
        };

        let reqs = expiring
            .iter()
            .map(|m| {
                let end = m
                    .membership_end_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                CreateNotificationRequest {
                    member_id: m.id,
                    notification_type: NotificationType::MembershipExpiring,
                    title: "Membership expiring soon".to_string(),
                    message: format!(
                        "Membership {} expires on {end}. Renew to keep your access.",
                        m.membership_number
                    ),
                    bill_id: None,
                    package_name: m
                        .current_package_id
                        .and_then(|id| package_names.get(&id).cloned()),
                }
            })
            .collect();
        self.create_bulk(reqs).await
    }

    pub fn subscribe_member<F>(&self, member_id: Uuid, handler: F) -> Subscription
    where
        F: FnMut(notifications::Model) + Send + 'static,
    {
        self.feed.subscribe(FeedFilter::Member(member_id), handler)
    }

    pub fn subscribe_all<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(notifications::Model) + Send + 'static,
    {
        self.feed.subscribe(FeedFilter::All, handler)
    }

    /// 事务内写入通知；提交后由调用方 `publish`
    pub(crate) async fn insert_rows<C: ConnectionTrait>(
        db: &C,
        rows: &[notifications::Model],
    ) -> Result<(), DbErr> {
        if rows.is_empty() {
            return Ok(());
        }
        notifications::Entity::insert_many(rows.iter().map(to_active_model))
            .exec_without_returning(db)
            .await?;
        Ok(())
    }

    pub(crate) fn publish(&self, rows: &[notifications::Model]) {
        self.feed.publish(rows);
    }

    async fn with_members(
        &self,
        rows: Vec<notifications::Model>,
    ) -> AppResult<Vec<NotificationResponse>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.member_id).collect();
        let summaries = MemberService::load_summaries(self.pool.as_ref(), &ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let member = summaries.get(&row.member_id).cloned();
                let mut resp = NotificationResponse::from(row);
                resp.member = member;
                resp
            })
            .collect())
    }
}

fn validate_content(title: &str, message: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Notification title is required".to_string(),
        ));
    }
    if message.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Notification message is required".to_string(),
        ));
    }
    Ok(())
}

/// 到期提醒窗口，两端都包含
pub fn expiry_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today, today + Duration::days(EXPIRY_WARNING_DAYS))
}

pub(crate) fn draft(req: CreateNotificationRequest, now: DateTime<Utc>) -> notifications::Model {
    notifications::Model {
        id: Uuid::new_v4(),
        member_id: req.member_id,
        bill_id: req.bill_id,
        package_name: req.package_name,
        r#type: req.notification_type,
        title: req.title,
        message: req.message,
        is_read: false,
        created_at: now,
    }
}

fn to_active_model(m: &notifications::Model) -> notifications::ActiveModel {
    notifications::ActiveModel {
        id: Set(m.id),
        member_id: Set(m.member_id),
        bill_id: Set(m.bill_id),
        package_name: Set(m.package_name.clone()),
        r#type: Set(m.r#type),
        title: Set(m.title.clone()),
        message: Set(m.message.clone()),
        is_read: Set(m.is_read),
        created_at: Set(m.created_at),
    }
}

pub fn aggregate_stats(
    rows: &[(NotificationType, bool, DateTime<Utc>)],
    now: DateTime<Utc>,
) -> NotificationStats {
    let since = now - Duration::hours(24);
    let mut stats = NotificationStats::default();
    for (notification_type, is_read, created_at) in rows {
        stats.total += 1;
        if !is_read {
            stats.unread += 1;
        }
        if *created_at >= since {
            stats.recent += 1;
        }
        match notification_type {
            NotificationType::General => stats.by_type.general += 1,
            NotificationType::BillPending => stats.by_type.bill_pending += 1,
            NotificationType::MembershipExpiring => stats.by_type.membership_expiring += 1,
            NotificationType::MembershipActivated => stats.by_type.membership_activated += 1,
        }
    }
    stats
}
