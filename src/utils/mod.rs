pub mod jwt;
pub mod membership_number;

pub use jwt::*;
pub use membership_number::generate_membership_number;
