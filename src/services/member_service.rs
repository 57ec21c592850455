use crate::database::DbPool;
use crate::entities::{
    MemberStatus, NotificationType, fee_package_entity as fee_packages,
    member_entity as members, profile_entity as profiles,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::NotificationService;
use crate::services::notification_service::draft;
use crate::utils::generate_membership_number;
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct MemberService {
    pool: DbPool,
    notification_service: NotificationService,
}

impl MemberService {
    pub fn new(pool: DbPool, notification_service: NotificationService) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    /// 分页查询会员，附带资料姓名、邮箱与当前套餐名
    pub async fn list(&self, query: MemberQuery) -> AppResult<PaginatedResponse<MemberResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select = members::Entity::find();
        if let Some(status) = query.status {
            select = select.filter(members::Column::Status.eq(status));
        }

        let total = select.clone().count(self.pool.as_ref()).await?;
        let rows = select
            .order_by_desc(members::Column::CreatedAt)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(self.pool.as_ref())
            .await?;

        let data = self.enrich(rows).await?;
        Ok(PaginatedResponse::new(data, &params, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<MemberResponse> {
        let member = members::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;
        let mut enriched = self.enrich(vec![member]).await?;
        enriched
            .pop()
            .ok_or_else(|| AppError::InternalError("Member lookup returned nothing".to_string()))
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<members::Model>> {
        Ok(Self::find_by_user_in(self.pool.as_ref(), user_id).await?)
    }

    pub async fn create(&self, req: CreateMemberRequest) -> AppResult<MemberResponse> {
        if profiles::Entity::find_by_id(req.user_id)
            .one(self.pool.as_ref())
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Profile not found".to_string()));
        }
        if self.find_by_user(req.user_id).await?.is_some() {
            return Err(AppError::ValidationError(
                "User already has a member record".to_string(),
            ));
        }

        let join_date = req.join_date.unwrap_or_else(|| Utc::now().date_naive());
        let status = req.status.unwrap_or(MemberStatus::Inactive);
        let member = Self::insert_member(self.pool.as_ref(), req.user_id, status, join_date).await?;

        log::info!(
            "Created member {} for user {}",
            member.membership_number,
            member.user_id
        );
        Ok(MemberResponse::from(member))
    }

    pub async fn update_status(&self, id: Uuid, status: MemberStatus) -> AppResult<MemberResponse> {
        let member = members::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

        let mut active: members::ActiveModel = member.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.pool.as_ref()).await?;
        Ok(MemberResponse::from(updated))
    }

    /// 绑定套餐并激活会员，同一事务内写入 MEMBERSHIP_ACTIVATED 通知
    pub async fn assign_package(
        &self,
        id: Uuid,
        req: AssignPackageRequest,
    ) -> AppResult<MemberResponse> {
        let txn = self.pool.begin().await?;

        let member = members::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;
        let package = fee_packages::Entity::find_by_id(req.package_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Fee package not found".to_string()))?;
        if !package.is_active {
            return Err(AppError::ValidationError(
                "Fee package is not active".to_string(),
            ));
        }

        let now = Utc::now();
        let start = req.start_date.unwrap_or_else(|| now.date_naive());
        let end = membership_end(start, package.duration_days).ok_or_else(|| {
            AppError::ValidationError("Membership end date is out of range".to_string())
        })?;

        let mut active: members::ActiveModel = member.into();
        active.current_package_id = Set(Some(package.id));
        active.membership_start_date = Set(Some(start));
        active.membership_end_date = Set(Some(end));
        active.status = Set(MemberStatus::Active);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        let notification = draft(
            CreateNotificationRequest {
                member_id: updated.id,
                notification_type: NotificationType::MembershipActivated,
                title: "Membership activated".to_string(),
                message: format!(
                    "Your {} membership is active until {}.",
                    package.name,
                    end.format("%Y-%m-%d")
                ),
                bill_id: None,
                package_name: Some(package.name.clone()),
            },
            now,
        );
        NotificationService::insert_rows(&txn, std::slice::from_ref(&notification)).await?;

        txn.commit().await?;
        self.notification_service.publish(&[notification]);

        log::info!(
            "Assigned package {} to member {} until {}",
            package.id,
            updated.id,
            end
        );
        let mut resp = MemberResponse::from(updated);
        resp.current_package_name = Some(package.name);
        Ok(resp)
    }

    /// ACTIVE 且结束日期早于 today 的会员批量置为 EXPIRED
    pub async fn expire_lapsed(&self, today: NaiveDate) -> AppResult<u64> {
        let res = members::Entity::update_many()
            .set(members::ActiveModel {
                status: Set(MemberStatus::Expired),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(members::Column::Status.eq(MemberStatus::Active))
            .filter(members::Column::MembershipEndDate.lt(today))
            .exec(self.pool.as_ref())
            .await?;
        if res.rows_affected > 0 {
            log::info!("Expired {} lapsed member(s)", res.rows_affected);
        }
        Ok(res.rows_affected)
    }

    /// 按会员 id 批量取展示字段，未找到的 id 不出现在结果中
    pub async fn load_summaries<C: ConnectionTrait>(
        db: &C,
        member_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, MemberSummary>> {
        let mut ids = member_ids.to_vec();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = members::Entity::find()
            .find_also_related(profiles::Entity)
            .filter(members::Column::Id.is_in(ids))
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(member, profile)| {
                let (full_name, email) = profile
                    .map(|p| (p.full_name, p.email))
                    .unwrap_or((None, None));
                MemberSummary::from_parts(Some(member.membership_number), full_name, email)
                    .map(|summary| (member.id, summary))
            })
            .collect())
    }

    pub(crate) async fn find_by_user_in<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Option<members::Model>, DbErr> {
        members::Entity::find()
            .filter(members::Column::UserId.eq(user_id))
            .one(db)
            .await
    }

    pub(crate) async fn insert_member<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        status: MemberStatus,
        join_date: NaiveDate,
    ) -> Result<members::Model, DbErr> {
        let now = Utc::now();
        members::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            membership_number: Set(generate_membership_number(join_date)),
            status: Set(status),
            join_date: Set(join_date),
            membership_start_date: Set(None),
            membership_end_date: Set(None),
            current_package_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    async fn enrich(&self, rows: Vec<members::Model>) -> AppResult<Vec<MemberResponse>> {
        let user_ids: Vec<Uuid> = rows.iter().map(|m| m.user_id).collect();
        let package_ids: Vec<Uuid> = rows.iter().filter_map(|m| m.current_package_id).collect();

        let profiles: HashMap<Uuid, profiles::Model> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            profiles::Entity::find()
                .filter(profiles::Column::Id.is_in(user_ids))
                .all(self.pool.as_ref())
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };
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

        Ok(rows
            .into_iter()
            .map(|m| {
                let profile = profiles.get(&m.user_id);
                let package_name = m
                    .current_package_id
                    .and_then(|id| package_names.get(&id).cloned());
                let mut resp = MemberResponse::from(m);
                resp.full_name = profile.and_then(|p| p.full_name.clone());
                resp.email = profile.and_then(|p| p.email.clone());
                resp.current_package_name = package_name;
                resp
            })
            .collect())
    }
}

/// 超出日期范围时为 None
pub fn membership_end(start: NaiveDate, duration_days: i32) -> Option<NaiveDate> {
    start.checked_add_signed(Duration::days(i64::from(duration_days)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::statements;
    use crate::entities::UserRole;
    use crate::realtime::ChangeFeed;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn service(db: DbPool) -> MemberService {
        let notifications = NotificationService::new(db.clone(), ChangeFeed::new(16));
        MemberService::new(db, notifications)
    }

    fn member(status: MemberStatus) -> members::Model {
        let now = Utc::now();
        members::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            membership_number: "GYM-20250901-ABC234".into(),
            status,
            join_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            membership_start_date: None,
            membership_end_date: None,
            current_package_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn package(is_active: bool) -> fee_packages::Model {
        let now = Utc::now();
        fee_packages::Model {
            id: Uuid::new_v4(),
            name: "Quarterly".into(),
            description: None,
            duration_days: 90,
            price: 12000,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_pages_newest_first_with_profile_and_package() {
        let pkg = package(true);
        let mut newer = member(MemberStatus::Active);
        newer.current_package_id = Some(pkg.id);
        let older = member(MemberStatus::Active);
        let profile = profiles::Model {
            id: newer.user_id,
            full_name: Some("Ada Lovelace".into()),
            email: Some("ada@example.com".into()),
            role: UserRole::Member,
            created_at: Utc::now(),
        };

        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([(
                "num_items",
                Value::BigInt(Some(12)),
            )])]])
            .append_query_results([vec![newer.clone(), older.clone()]])
            .append_query_results([vec![profile]])
            .append_query_results([vec![pkg.clone()]])
            .into_connection()
            .into();

        let page = service(db.clone())
            .list(MemberQuery {
                status: Some(MemberStatus::Active),
                page: Some(2),
                page_size: Some(5),
            })
            .await
            .unwrap();

        assert_eq!(page.total, 12);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].id, newer.id);
        assert_eq!(page.data[0].full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(page.data[0].email.as_deref(), Some("ada@example.com"));
        assert_eq!(page.data[0].current_package_name.as_deref(), Some("Quarterly"));
        assert_eq!(page.data[1].id, older.id);
        assert!(page.data[1].full_name.is_none());
        assert!(page.data[1].current_package_name.is_none());

        let log = statements(db);
        assert!(log.contains("\\\"created_at\\\" DESC"));
        assert!(log.contains("LIMIT"));
        assert!(log.contains("OFFSET"));
    }

    #[test]
    fn test_membership_end_adds_duration() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(
            membership_end(start, 90),
            NaiveDate::from_ymd_opt(2025, 4, 1)
        );
        assert_eq!(
            membership_end(start, 30),
            NaiveDate::from_ymd_opt(2025, 1, 31)
        );
        assert_eq!(membership_end(NaiveDate::MAX, 1), None);
    }

    #[tokio::test]
    async fn test_assign_package_activates_and_notifies() {
        let start = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let before = member(MemberStatus::Inactive);
        let pkg = package(true);
        let mut after = before.clone();
        after.status = MemberStatus::Active;
        after.current_package_id = Some(pkg.id);
        after.membership_start_date = Some(start);
        after.membership_end_date = membership_end(start, pkg.duration_days);

        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![before.clone()]])
            .append_query_results([vec![pkg.clone()]])
            .append_query_results([vec![after.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection()
            .into();
        let svc = service(db.clone());

        let resp = svc
            .assign_package(
                before.id,
                AssignPackageRequest {
                    package_id: pkg.id,
                    start_date: Some(start),
                },
            )
            .await
            .unwrap();

        assert_eq!(resp.status, MemberStatus::Active);
        assert_eq!(resp.current_package_name.as_deref(), Some("Quarterly"));
        assert_eq!(
            resp.membership_end_date,
            NaiveDate::from_ymd_opt(2025, 11, 30)
        );

        drop(svc);
        let log = statements(db);
        let update = log.find("UPDATE \\\"members\\\"").unwrap();
        let insert = log.find("INSERT INTO \\\"notifications\\\"").unwrap();
        assert!(update < insert);
        assert!(log.contains("membership_activated"));
    }

    #[tokio::test]
    async fn test_assign_inactive_package_is_rejected() {
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![member(MemberStatus::Inactive)]])
            .append_query_results([vec![package(false)]])
            .into_connection()
            .into();
        let svc = service(db.clone());

        let err = svc
            .assign_package(
                Uuid::new_v4(),
                AssignPackageRequest {
                    package_id: Uuid::new_v4(),
                    start_date: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        drop(svc);
        let log = statements(db);
        assert!(!log.contains("INSERT INTO"));
    }

    #[tokio::test]
    async fn test_create_rejects_user_with_existing_member() {
        let existing = member(MemberStatus::Active);
        let profile = profiles::Model {
            id: existing.user_id,
            full_name: Some("Ada".into()),
            email: None,
            role: UserRole::Member,
            created_at: Utc::now(),
        };
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![profile]])
            .append_query_results([vec![existing.clone()]])
            .into_connection()
            .into();

        let err = service(db)
            .create(CreateMemberRequest {
                user_id: existing.user_id,
                status: None,
                join_date: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_get_unknown_member_is_not_found() {
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<members::Model>::new()])
            .into_connection()
            .into();
        let err = service(db).get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_expire_lapsed_reports_affected_rows() {
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 4,
            }])
            .into_connection()
            .into();
        let today = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        assert_eq!(service(db).expire_lapsed(today).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_load_summaries_skips_query_for_empty_ids() {
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres).into_connection().into();
        let map = MemberService::load_summaries(db.as_ref(), &[]).await.unwrap();
        assert!(map.is_empty());
        assert_eq!(statements(db), "[]");
    }
}
