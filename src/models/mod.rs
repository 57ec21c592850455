pub mod bill;
pub mod common;
pub mod fee_package;
pub mod member;
pub mod notification;
pub mod pagination;
pub mod profile;
pub mod supplement;

pub use bill::*;
pub use common::*;
pub use fee_package::*;
pub use member::*;
pub use notification::*;
pub use pagination::*;
pub use profile::*;
pub use supplement::*;
