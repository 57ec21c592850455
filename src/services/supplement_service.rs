use crate::database::DbPool;
use crate::entities::{
    MemberStatus, NotificationType, supplement_entity as supplements,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::notification_service::draft;
use crate::services::{BillingService, MemberService, NotificationService};
use crate::services::billing_service::format_cents;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct SupplementService {
    pool: DbPool,
    notification_service: NotificationService,
}

impl SupplementService {
    pub fn new(pool: DbPool, notification_service: NotificationService) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    pub async fn list(&self, available_only: bool) -> AppResult<Vec<SupplementResponse>> {
        let mut select = supplements::Entity::find();
        if available_only {
            select = select.filter(supplements::Column::IsAvailable.eq(true));
        }
        let rows = select
            .order_by_asc(supplements::Column::Category)
            .order_by_asc(supplements::Column::Name)
            .all(self.pool.as_ref())
            .await?;
        Ok(rows.into_iter().map(SupplementResponse::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<SupplementResponse> {
        Ok(SupplementResponse::from(self.find(id).await?))
    }

    pub async fn create(&self, req: CreateSupplementRequest) -> AppResult<SupplementResponse> {
        validate(&req.name, &req.category, req.price, req.stock_quantity)?;

        let now = Utc::now();
        let created = supplements::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(req.name.trim().to_string()),
            description: Set(req.description),
            price: Set(req.price),
            category: Set(req.category.trim().to_string()),
            stock_quantity: Set(req.stock_quantity),
            is_available: Set(req.is_available.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.pool.as_ref())
        .await?;

        log::info!("Created supplement {} ({})", created.name, created.id);
        Ok(SupplementResponse::from(created))
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: UpdateSupplementRequest,
    ) -> AppResult<SupplementResponse> {
        let current = self.find(id).await?;
        validate(
            req.name.as_deref().unwrap_or(&current.name),
            req.category.as_deref().unwrap_or(&current.category),
            req.price.unwrap_or(current.price),
            req.stock_quantity.unwrap_or(current.stock_quantity),
        )?;

        let mut active: supplements::ActiveModel = current.into();
        if let Some(name) = req.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = req.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = req.price {
            active.price = Set(price);
        }
        if let Some(category) = req.category {
            active.category = Set(category.trim().to_string());
        }
        if let Some(stock_quantity) = req.stock_quantity {
            active.stock_quantity = Set(stock_quantity);
        }
        if let Some(is_available) = req.is_available {
            active.is_available = Set(is_available);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(self.pool.as_ref()).await?;
        Ok(SupplementResponse::from(updated))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let res = supplements::Entity::delete_by_id(id)
            .exec(self.pool.as_ref())
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Supplement not found".to_string()));
        }
        log::info!("Deleted supplement {id}");
        Ok(())
    }

    /// 会员购买补剂：扣库存、出账、发通知，全部在一个事务中完成
    ///
    /// 调用方没有会员记录时先以 INACTIVE 状态创建。提交成功后才向实时流发布通知。
    pub async fn purchase_supplement(
        &self,
        user_id: Uuid,
        supplement_id: Uuid,
        quantity: i32,
    ) -> AppResult<PurchaseSupplementResponse> {
        if quantity < 1 {
            return Err(AppError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;

        let supplement = supplements::Entity::find_by_id(supplement_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Supplement not found".to_string()))?;
        if !supplement.is_available {
            return Err(AppError::ValidationError(
                "Supplement is not available".to_string(),
            ));
        }
        if supplement.stock_quantity < quantity {
            return Err(AppError::ValidationError("Insufficient stock".to_string()));
        }

        let now = Utc::now();
        let today = now.date_naive();

        let (member, member_created) = match MemberService::find_by_user_in(&txn, user_id).await? {
            Some(member) => (member, false),
            None => {
                let member =
                    MemberService::insert_member(&txn, user_id, MemberStatus::Inactive, today)
                        .await?;
                log::info!(
                    "Created member {} for user {user_id} on first purchase",
                    member.membership_number
                );
                (member, true)
            }
        };

        let total = supplement
            .price
            .checked_mul(i64::from(quantity))
            .ok_or_else(|| AppError::ValidationError("Order total is too large".to_string()))?;

        // 条件扣减，并发下库存不足时影响 0 行
        let res = supplements::Entity::update_many()
            .col_expr(
                supplements::Column::StockQuantity,
                Expr::col(supplements::Column::StockQuantity).sub(quantity),
            )
            .col_expr(supplements::Column::UpdatedAt, Expr::value(now))
            .filter(supplements::Column::Id.eq(supplement.id))
            .filter(supplements::Column::StockQuantity.gte(quantity))
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::ValidationError("Insufficient stock".to_string()));
        }

        let bill = BillingService::insert_bill(
            &txn,
            member.id,
            None,
            total,
            today,
            Some(format!("Supplement purchase: {} x{quantity}", supplement.name)),
        )
        .await?;

        let notification = draft(
            CreateNotificationRequest {
                member_id: member.id,
                notification_type: NotificationType::BillPending,
                title: "Supplement purchase".to_string(),
                message: format!(
                    "You bought {quantity} x {} for {}. Please pay at the front desk.",
                    supplement.name,
                    format_cents(total, &bill.currency)
                ),
                bill_id: Some(bill.id),
                package_name: None,
            },
            now,
        );
        NotificationService::insert_rows(&txn, std::slice::from_ref(&notification)).await?;

        txn.commit().await?;
        self.notification_service
            .publish(std::slice::from_ref(&notification));

        log::info!(
            "Member {} purchased {quantity} x {} (bill {})",
            member.id,
            supplement.id,
            bill.id
        );
        Ok(PurchaseSupplementResponse {
            member: MemberResponse::from(member),
            member_created,
            bill: BillResponse::from(bill),
            notification: NotificationResponse::from(notification),
        })
    }

    async fn find(&self, id: Uuid) -> AppResult<supplements::Model> {
        supplements::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Supplement not found".to_string()))
    }
}

fn validate(name: &str, category: &str, price: i64, stock_quantity: i32) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Supplement name is required".to_string(),
        ));
    }
    if category.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Supplement category is required".to_string(),
        ));
    }
    if price < 0 {
        return Err(AppError::ValidationError(
            "Supplement price cannot be negative".to_string(),
        ));
    }
    if stock_quantity < 0 {
        return Err(AppError::ValidationError(
            "Stock quantity cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::statements;
    use crate::entities::{BillStatus, bill_entity as bills, member_entity as members};
    use crate::realtime::ChangeFeed;
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn service(db: DbPool) -> SupplementService {
        let notifications = NotificationService::new(db.clone(), ChangeFeed::new(16));
        SupplementService::new(db, notifications)
    }

    fn supplement(stock_quantity: i32, is_available: bool) -> supplements::Model {
        let now = Utc::now();
        supplements::Model {
            id: Uuid::new_v4(),
            name: "Whey Protein".into(),
            description: None,
            price: 4599,
            category: "protein".into(),
            stock_quantity,
            is_available,
            created_at: now,
            updated_at: now,
        }
    }

    fn member(user_id: Uuid, status: MemberStatus) -> members::Model {
        let now = Utc::now();
        members::Model {
            id: Uuid::new_v4(),
            user_id,
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

    fn pending_bill(member_id: Uuid, amount: i64) -> bills::Model {
        bills::Model {
            id: Uuid::new_v4(),
            member_id,
            package_id: None,
            amount,
            currency: "USD".into(),
            status: BillStatus::Pending,
            due_date: Utc::now().date_naive(),
            paid_date: None,
            generated_date: Utc::now(),
            payment_method: None,
            notes: Some("Supplement purchase: Whey Protein x2".into()),
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn count(log: &str, needle: &str) -> usize {
        log.matches(needle).count()
    }

    const INSERT_MEMBERS: &str = "INSERT INTO \\\"members\\\"";
    const INSERT_BILLS: &str = "INSERT INTO \\\"bills\\\"";
    const INSERT_NOTIFICATIONS: &str = "INSERT INTO \\\"notifications\\\"";

    #[tokio::test]
    async fn test_purchase_rejects_zero_quantity() {
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres).into_connection().into();
        let err = service(db.clone())
            .purchase_supplement(Uuid::new_v4(), Uuid::new_v4(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(statements(db), "[]");
    }

    #[tokio::test]
    async fn test_purchase_out_of_stock_writes_nothing() {
        let item = supplement(0, true);
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![item.clone()]])
            .into_connection()
            .into();

        let err = service(db.clone())
            .purchase_supplement(Uuid::new_v4(), item.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == "Insufficient stock"));

        let log = statements(db);
        assert_eq!(count(&log, INSERT_BILLS), 0);
        assert_eq!(count(&log, INSERT_NOTIFICATIONS), 0);
        assert!(!log.contains("UPDATE"));
    }

    #[tokio::test]
    async fn test_purchase_unknown_supplement_is_not_found() {
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<supplements::Model>::new()])
            .into_connection()
            .into();

        let err = service(db.clone())
            .purchase_supplement(Uuid::new_v4(), Uuid::new_v4(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!statements(db).contains("INSERT INTO"));
    }

    #[tokio::test]
    async fn test_purchase_unavailable_supplement_is_rejected() {
        let item = supplement(10, false);
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![item.clone()]])
            .into_connection()
            .into();

        let err = service(db)
            .purchase_supplement(Uuid::new_v4(), item.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_purchase_without_member_creates_member_bill_and_notification() {
        let user_id = Uuid::new_v4();
        let item = supplement(5, true);
        let created = member(user_id, MemberStatus::Inactive);
        let bill = pending_bill(created.id, item.price * 2);

        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![item.clone()]])
            .append_query_results([Vec::<members::Model>::new()])
            .append_query_results([vec![created.clone()]])
            .append_query_results([vec![bill.clone()]])
            .append_exec_results([exec(1), exec(1)])
            .into_connection()
            .into();
        let svc = service(db.clone());

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _sub = svc.notification_service.subscribe_all(move |row| {
            let _ = tx.send(row);
        });

        let resp = svc
            .purchase_supplement(user_id, item.id, 2)
            .await
            .unwrap();

        assert!(resp.member_created);
        assert_eq!(resp.member.status, MemberStatus::Inactive);
        assert_eq!(resp.bill.amount, 9198);
        assert_eq!(resp.bill.status, BillStatus::Pending);
        assert_eq!(resp.notification.bill_id, Some(bill.id));
        assert_eq!(
            resp.notification.notification_type,
            NotificationType::BillPending
        );

        let published = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(published.id, resp.notification.id);

        drop(svc);
        let log = statements(db);
        assert_eq!(count(&log, INSERT_MEMBERS), 1);
        assert_eq!(count(&log, INSERT_BILLS), 1);
        assert_eq!(count(&log, INSERT_NOTIFICATIONS), 1);
        let member_at = log.find(INSERT_MEMBERS).unwrap();
        let stock_at = log.find("UPDATE \\\"supplements\\\"").unwrap();
        let bill_at = log.find(INSERT_BILLS).unwrap();
        let notification_at = log.find(INSERT_NOTIFICATIONS).unwrap();
        assert!(member_at < stock_at);
        assert!(stock_at < bill_at);
        assert!(bill_at < notification_at);
    }

    #[tokio::test]
    async fn test_purchase_losing_stock_race_writes_no_bill() {
        let user_id = Uuid::new_v4();
        let item = supplement(1, true);
        let existing = member(user_id, MemberStatus::Active);

        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![item.clone()]])
            .append_query_results([vec![existing]])
            .append_exec_results([exec(0)])
            .into_connection()
            .into();

        let err = service(db.clone())
            .purchase_supplement(user_id, item.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == "Insufficient stock"));

        let log = statements(db);
        assert_eq!(count(&log, INSERT_MEMBERS), 0);
        assert_eq!(count(&log, INSERT_BILLS), 0);
        assert_eq!(count(&log, INSERT_NOTIFICATIONS), 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_supplement_is_not_found() {
        let db: DbPool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .into_connection()
            .into();
        let err = service(db).delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_validate() {
        assert!(validate("Creatine", "strength", 1999, 0).is_ok());
        assert!(validate("", "strength", 1999, 0).is_err());
        assert!(validate("Creatine", " ", 1999, 0).is_err());
        assert!(validate("Creatine", "strength", -1, 0).is_err());
        assert!(validate("Creatine", "strength", 1999, -3).is_err());
    }
}
