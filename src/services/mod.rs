pub mod billing_service;
pub mod fee_package_service;
pub mod member_service;
pub mod notification_service;
pub mod profile_service;
pub mod supplement_service;

pub use billing_service::BillingService;
pub use fee_package_service::FeePackageService;
pub use member_service::MemberService;
pub use notification_service::NotificationService;
pub use profile_service::ProfileService;
pub use supplement_service::SupplementService;

#[cfg(test)]
pub(crate) mod testing {
    use crate::database::DbPool;
    use std::sync::Arc;

    /// mock 连接上记录的全部语句；持有连接的服务须先释放
    pub fn statements(pool: DbPool) -> String {
        let db = Arc::try_unwrap(pool)
            .ok()
            .expect("connection still held by a service");
        format!("{:?}", db.into_transaction_log())
    }
}
