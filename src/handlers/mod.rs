pub mod admin;
pub mod bills;
pub mod fee_packages;
pub mod me;
pub mod members;
pub mod notifications;
pub mod stream;
pub mod supplements;

pub use admin::admin_config;
pub use me::me_config;
