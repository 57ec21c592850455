use crate::database::DbPool;
use crate::entities::{
    BillStatus, NotificationType, bill_entity as bills, fee_package_entity as fee_packages,
    member_entity as members,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::notification_service::draft;
use crate::services::{MemberService, NotificationService};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

pub const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_DUE_IN_DAYS: i64 = 7;
/// 账单到期天数上限，约十年
pub const MAX_DUE_IN_DAYS: i64 = 3650;

#[derive(Clone)]
pub struct BillingService {
    pool: DbPool,
    notification_service: NotificationService,
}

impl BillingService {
    pub fn new(pool: DbPool, notification_service: NotificationService) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    pub async fn list_all(&self) -> AppResult<Vec<BillResponse>> {
        let rows = bills::Entity::find()
            .order_by_desc(bills::Column::GeneratedDate)
            .all(self.pool.as_ref())
            .await?;
        self.with_members(rows).await
    }

    pub async fn list_by_status(&self, status: BillStatus) -> AppResult<Vec<BillResponse>> {
        let rows = bills::Entity::find()
            .filter(bills::Column::Status.eq(status))
            .order_by_desc(bills::Column::GeneratedDate)
            .all(self.pool.as_ref())
            .await?;
        self.with_members(rows).await
    }

    pub async fn list_by_member(&self, member_id: Uuid) -> AppResult<Vec<BillResponse>> {
        let rows = bills::Entity::find()
            .filter(bills::Column::MemberId.eq(member_id))
            .order_by_desc(bills::Column::GeneratedDate)
            .all(self.pool.as_ref())
            .await?;
        self.with_members(rows).await
    }

    pub async fn stats(&self, today: NaiveDate) -> AppResult<BillingStats> {
        let rows: Vec<(BillStatus, i64, Option<NaiveDate>)> = bills::Entity::find()
            .select_only()
            .column(bills::Column::Status)
            .column(bills::Column::Amount)
            .column(bills::Column::PaidDate)
            .into_tuple()
            .all(self.pool.as_ref())
            .await?;
        Ok(aggregate_billing_stats(&rows, today))
    }

    /// 到期日早于 today 的 PENDING 账单批量置为 OVERDUE
    pub async fn mark_overdue(&self, today: NaiveDate) -> AppResult<u64> {
        let res = bills::Entity::update_many()
            .set(bills::ActiveModel {
                status: Set(BillStatus::Overdue),
                ..Default::default()
            })
            .filter(bills::Column::Status.eq(BillStatus::Pending))
            .filter(bills::Column::DueDate.lt(today))
            .exec(self.pool.as_ref())
            .await?;
        if res.rows_affected > 0 {
            log::info!("Marked {} bill(s) overdue", res.rows_affected);
        }
        Ok(res.rows_affected)
    }

    pub async fn process_payment(
        &self,
        bill_id: Uuid,
        req: ProcessPaymentRequest,
    ) -> AppResult<BillResponse> {
        if req.payment_method.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Payment method is required".to_string(),
            ));
        }

        let bill = bills::Entity::find_by_id(bill_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Bill not found".to_string()))?;
        if bill.status == BillStatus::Paid {
            return Err(AppError::ValidationError(
                "Bill is already paid".to_string(),
            ));
        }

        let paid_date = req.paid_date.unwrap_or_else(|| Utc::now().date_naive());
        let mut active: bills::ActiveModel = bill.into();
        active.status = Set(BillStatus::Paid);
        active.paid_date = Set(Some(paid_date));
        active.payment_method = Set(Some(req.payment_method.trim().to_string()));
        let updated = active.update(self.pool.as_ref()).await?;

        log::info!(
            "Bill {} paid via {:?} on {}",
            updated.id,
            updated.payment_method,
            paid_date
        );
        Ok(BillResponse::from(updated))
    }

    /// 按会员当前套餐出账，账单与 BILL_PENDING 通知同一事务写入
    pub async fn generate_package_bill(
        &self,
        req: GenerateBillRequest,
    ) -> AppResult<GeneratedBillResponse> {
        let due_in_days = req.due_in_days.unwrap_or(DEFAULT_DUE_IN_DAYS);
        if !(0..=MAX_DUE_IN_DAYS).contains(&due_in_days) {
            return Err(AppError::ValidationError(format!(
                "due_in_days must be between 0 and {MAX_DUE_IN_DAYS}"
            )));
        }

        let txn = self.pool.begin().await?;

        let member = members::Entity::find_by_id(req.member_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;
        let package_id = member.current_package_id.ok_or_else(|| {
            AppError::ValidationError("Member has no fee package assigned".to_string())
        })?;
        let package = fee_packages::Entity::find_by_id(package_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Fee package not found".to_string()))?;

        let now = Utc::now();
        let due_date = now
            .date_naive()
            .checked_add_signed(Duration::days(due_in_days))
            .ok_or_else(|| AppError::ValidationError("Due date is out of range".to_string()))?;
        let bill = Self::insert_bill(
            &txn,
            member.id,
            Some(package.id),
            package.price,
            due_date,
            Some(format!("{} membership fee", package.name)),
        )
        .await?;

        let notification = draft(
            CreateNotificationRequest {
                member_id: member.id,
                notification_type: NotificationType::BillPending,
                title: "New bill".to_string(),
                message: format!(
                    "A bill of {} for {} is due on {}.",
                    format_cents(bill.amount, &bill.currency),
                    package.name,
                    due_date.format("%Y-%m-%d")
                ),
                bill_id: Some(bill.id),
                package_name: Some(package.name.clone()),
            },
            now,
        );
        NotificationService::insert_rows(&txn, std::slice::from_ref(&notification)).await?;

        txn.commit().await?;
        self.notification_service
            .publish(std::slice::from_ref(&notification));

        log::info!("Generated bill {} for member {}", bill.id, member.id);
        Ok(GeneratedBillResponse {
            bill: BillResponse::from(bill),
            notification_id: notification.id,
        })
    }

    pub(crate) async fn insert_bill<C: ConnectionTrait>(
        db: &C,
        member_id: Uuid,
        package_id: Option<Uuid>,
        amount: i64,
        due_date: NaiveDate,
        notes: Option<String>,
    ) -> Result<bills::Model, DbErr> {
        bills::ActiveModel {
            id: Set(Uuid::new_v4()),
            member_id: Set(member_id),
            package_id: Set(package_id),
            amount: Set(amount),
            currency: Set(DEFAULT_CURRENCY.to_string()),
            status: Set(BillStatus::Pending),
            due_date: Set(due_date),
            paid_date: Set(None),
            generated_date: Set(Utc::now()),
            payment_method: Set(None),
            notes: Set(notes),
        }
        .insert(db)
        .await
    }

    async fn with_members(&self, rows: Vec<bills::Model>) -> AppResult<Vec<BillResponse>> {
        let ids: Vec<Uuid> = rows.iter().map(|b| b.member_id).collect();
        let summaries = MemberService::load_summaries(self.pool.as_ref(), &ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let member = summaries.get(&row.member_id).cloned();
                let mut resp = BillResponse::from(row);
                resp.member = member;
                resp
            })
            .collect())
    }
}

/// 金额以美分存储，展示时换算
pub fn format_cents(amount: i64, currency: &str) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02} {currency}", abs / 100, abs % 100)
}

pub fn aggregate_billing_stats(
    rows: &[(BillStatus, i64, Option<NaiveDate>)],
    today: NaiveDate,
) -> BillingStats {
    let mut stats = BillingStats::default();
    for (status, amount, paid_date) in rows {
        stats.total_bills += 1;
        match status {
            BillStatus::Pending => stats.pending_bills += 1,
            BillStatus::Overdue => stats.overdue_bills += 1,
            BillStatus::Paid => {
                stats.paid_bills += 1;
                stats.total_revenue += amount;
                if paid_date
                    .is_some_and(|d| d.year() == today.year() && d.month() == today.month())
                {
                    stats.monthly_revenue += amount;
                }
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::statements;
    use crate::entities::{MemberStatus, UserRole, profile_entity as profiles};
    use crate::realtime::ChangeFeed;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn service(db: DbPool) -> BillingService {
        let notifications = NotificationService::new(db.clone(), ChangeFeed::new(16));
        BillingService::new(db, notifications)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member(package_id: Option<Uuid>) -> members::Model {
        let now = Utc::now();
        members::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            membership_number: "GYM-20250901-ABC234".into(),
            status: MemberStatus::Active,
            join_date: date(2025, 9, 1),
            membership_start_date: None,
            membership_end_date: None,
            current_package_id: package_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn bill(member_id: Uuid, status: BillStatus) -> bills::Model {
        bills::Model {
            id: Uuid::new_v4(),
            member_id,
            package_id: None,
            amount: 4500,
            currency: DEFAULT_CURRENCY.into(),
            status,
            due_date: date(2025, 9, 8),
            paid_date: None,
            generated_date: Utc::now(),
            payment_method: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_list_all_is_newest_first_with_member_summary() {
        let owner = member(None);
        let profile = profiles::Model {
            id: owner.user_id,
            full_name: Some("Grace Hopper".into()),
            email: Some("grace@example.com".into()),
            role: UserRole::Member,
            created_at: Utc::now(),
        };
        let newer = bill(owner.id, BillStatus::Pending);
        let older = bill(owner.id, BillStatus::Paid);
        let orphan = bill(Uuid::new_v4(), BillStatus::Overdue);

        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![newer.clone(), older.clone(), orphan.clone()]])
            .append_query_results([vec![(owner.clone(), Some(profile))]])
            .into_connection()
            .into();

        let list = service(db.clone()).list_all().await.unwrap();
        let ids: Vec<Uuid> = list.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![newer.id, older.id, orphan.id]);

        let expected = MemberSummary {
            membership_number: Some(owner.membership_number.clone()),
            full_name: Some("Grace Hopper".into()),
            email: Some("grace@example.com".into()),
        };
        assert_eq!(list[0].member.as_ref(), Some(&expected));
        assert_eq!(list[1].member.as_ref(), Some(&expected));
        assert!(list[2].member.is_none());

        let log = statements(db);
        assert!(log.contains("\\\"generated_date\\\" DESC"));
        assert!(log.contains("LEFT JOIN \\\"profiles\\\""));
    }

    #[tokio::test]
    async fn test_list_by_status_filters_and_orders() {
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<bills::Model>::new()])
            .into_connection()
            .into();

        let list = service(db.clone())
            .list_by_status(BillStatus::Overdue)
            .await
            .unwrap();
        assert!(list.is_empty());

        let log = statements(db);
        assert!(log.contains("\\\"status\\\" ="));
        assert!(log.contains("\\\"generated_date\\\" DESC"));
        assert!(!log.contains("\\\"members\\\""));
    }

    #[test]
    fn test_aggregate_billing_stats() {
        let today = date(2025, 9, 15);
        let rows = vec![
            (BillStatus::Paid, 1000, Some(date(2025, 9, 1))),
            (BillStatus::Paid, 2500, Some(date(2025, 8, 31))),
            (BillStatus::Paid, 700, Some(date(2024, 9, 10))),
            (BillStatus::Pending, 9999, None),
            (BillStatus::Overdue, 300, None),
        ];

        let stats = aggregate_billing_stats(&rows, today);
        assert_eq!(stats.total_revenue, 4200);
        assert_eq!(stats.monthly_revenue, 1000);
        assert_eq!(stats.total_bills, 5);
        assert_eq!(
            stats.pending_bills + stats.paid_bills + stats.overdue_bills,
            stats.total_bills
        );
        assert_eq!(stats.paid_bills, 3);
        assert_eq!(stats.overdue_bills, 1);
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(4599, "USD"), "45.99 USD");
        assert_eq!(format_cents(5, "USD"), "0.05 USD");
        assert_eq!(format_cents(-120, "USD"), "-1.20 USD");
    }

    #[tokio::test]
    async fn test_process_payment_unknown_bill_is_not_found() {
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<bills::Model>::new()])
            .into_connection()
            .into();
        let err = service(db)
            .process_payment(
                Uuid::new_v4(),
                ProcessPaymentRequest {
                    payment_method: "cash".into(),
                    paid_date: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_process_payment_marks_paid() {
        let pending = bill(Uuid::new_v4(), BillStatus::Pending);
        let mut paid = pending.clone();
        paid.status = BillStatus::Paid;
        paid.paid_date = Some(date(2025, 9, 9));
        paid.payment_method = Some("card".into());

        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending.clone()]])
            .append_query_results([vec![paid]])
            .into_connection()
            .into();
        let resp = service(db.clone())
            .process_payment(
                pending.id,
                ProcessPaymentRequest {
                    payment_method: "card".into(),
                    paid_date: Some(date(2025, 9, 9)),
                },
            )
            .await
            .unwrap();

        assert_eq!(resp.status, BillStatus::Paid);
        assert_eq!(resp.paid_date, Some(date(2025, 9, 9)));
        let log = statements(db);
        assert!(log.contains("UPDATE \\\"bills\\\""));
    }

    #[tokio::test]
    async fn test_generate_bill_without_package_is_rejected() {
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![member(None)]])
            .into_connection()
            .into();
        let err = service(db.clone())
            .generate_package_bill(GenerateBillRequest {
                member_id: Uuid::new_v4(),
                due_in_days: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let log = statements(db);
        assert!(!log.contains("INSERT INTO"));
    }

    #[tokio::test]
    async fn test_generate_bill_rejects_due_in_days_out_of_range() {
        for due_in_days in [-1, MAX_DUE_IN_DAYS + 1, 1_000_000_000_000] {
            let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
                .into_connection()
                .into();
            let err = service(db.clone())
                .generate_package_bill(GenerateBillRequest {
                    member_id: Uuid::new_v4(),
                    due_in_days: Some(due_in_days),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
            assert_eq!(statements(db), "[]");
        }
    }

    #[tokio::test]
    async fn test_generate_bill_writes_bill_then_notification() {
        let now = Utc::now();
        let package = fee_packages::Model {
            id: Uuid::new_v4(),
            name: "Monthly".into(),
            description: None,
            duration_days: 30,
            price: 4500,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let owner = member(Some(package.id));
        let mut inserted = bill(owner.id, BillStatus::Pending);
        inserted.package_id = Some(package.id);

        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![owner.clone()]])
            .append_query_results([vec![package]])
            .append_query_results([vec![inserted.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection()
            .into();

        let resp = service(db.clone())
            .generate_package_bill(GenerateBillRequest {
                member_id: owner.id,
                due_in_days: Some(7),
            })
            .await
            .unwrap();
        assert_eq!(resp.bill.id, inserted.id);
        assert_eq!(resp.bill.status, BillStatus::Pending);

        let log = statements(db);
        let bill_at = log.find("INSERT INTO \\\"bills\\\"").unwrap();
        let notification_at = log.find("INSERT INTO \\\"notifications\\\"").unwrap();
        assert!(bill_at < notification_at);
        assert!(log.contains("bill_pending"));
    }

    #[tokio::test]
    async fn test_mark_overdue_reports_affected_rows() {
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection()
            .into();
        assert_eq!(
            service(db).mark_overdue(date(2025, 9, 10)).await.unwrap(),
            2
        );
    }
}
