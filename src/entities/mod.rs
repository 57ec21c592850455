pub mod bills;
pub mod fee_packages;
pub mod members;
pub mod notifications;
pub mod profiles;
pub mod supplements;

pub use bills::BillStatus;
pub use members::MemberStatus;
pub use notifications::NotificationType;
pub use profiles::UserRole;

pub use bills as bill_entity;
pub use fee_packages as fee_package_entity;
pub use members as member_entity;
pub use notifications as notification_entity;
pub use profiles as profile_entity;
pub use supplements as supplement_entity;
