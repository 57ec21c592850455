pub mod auth;
pub mod cors;
pub mod route_guard;

pub use auth::{AuthMiddleware, current_user};
pub use cors::create_cors;
pub use route_guard::{GuardInput, GuardOutcome, RouteGuard};
