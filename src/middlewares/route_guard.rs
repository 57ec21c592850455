//! 路由守卫的纯判定逻辑，HTTP 层见 `auth.rs`

use crate::config::AuthConfig;
use crate::entities::UserRole;
use crate::error::AppError;
use crate::utils::AuthUser;

pub const ALL_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Member];
pub const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// 身份仍在加载，调用方应等待
    Loading,
    Unauthenticated { redirect_to: String, from: String },
    /// 已登录但资料尚未加载，不能立即判定角色
    ProfilePending,
    Authorized,
    Forbidden { redirect_to: String },
}

impl GuardOutcome {
    /// 放行时返回 None
    pub fn into_error(self) -> Option<AppError> {
        match self {
            GuardOutcome::Authorized => None,
            GuardOutcome::Loading | GuardOutcome::ProfilePending => Some(AppError::ProfilePending),
            GuardOutcome::Unauthenticated { redirect_to, from } => {
                Some(AppError::Unauthenticated { redirect_to, from })
            }
            GuardOutcome::Forbidden { redirect_to } => Some(AppError::Forbidden { redirect_to }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GuardInput<'a> {
    pub loading: bool,
    pub user: Option<&'a AuthUser>,
    pub role: Option<UserRole>,
    /// 为空表示只要求登录
    pub required: &'a [UserRole],
    /// 原始访问路径（含查询串），未登录时回传给前端
    pub location: &'a str,
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    login_path: String,
    unauthorized_path: String,
}

impl RouteGuard {
    pub fn new(login_path: impl Into<String>, unauthorized_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
            unauthorized_path: unauthorized_path.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.login_path, &config.unauthorized_path)
    }

    pub fn evaluate(&self, input: &GuardInput<'_>) -> GuardOutcome {
        if input.loading {
            return GuardOutcome::Loading;
        }
        if input.user.is_none() {
            return GuardOutcome::Unauthenticated {
                redirect_to: self.login_path.clone(),
                from: input.location.to_string(),
            };
        }
        if input.required.is_empty() {
            return GuardOutcome::Authorized;
        }
        match input.role {
            None => GuardOutcome::ProfilePending,
            Some(role) if input.required.contains(&role) => GuardOutcome::Authorized,
            Some(_) => GuardOutcome::Forbidden {
                redirect_to: self.unauthorized_path.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn guard() -> RouteGuard {
        RouteGuard::new("/login", "/unauthorized")
    }

    fn user() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: None,
        }
    }

    fn input<'a>(
        user: Option<&'a AuthUser>,
        role: Option<UserRole>,
        required: &'a [UserRole],
    ) -> GuardInput<'a> {
        GuardInput {
            loading: false,
            user,
            role,
            required,
            location: "/admin/bills?status=PENDING",
        }
    }

    #[test]
    fn test_loading_wins_over_everything() {
        let u = user();
        let mut i = input(Some(&u), Some(UserRole::Member), ADMIN_ONLY);
        i.loading = true;
        assert_eq!(guard().evaluate(&i), GuardOutcome::Loading);
    }

    #[test]
    fn test_missing_user_redirects_to_login_with_origin() {
        let outcome = guard().evaluate(&input(None, None, ADMIN_ONLY));
        assert_eq!(
            outcome,
            GuardOutcome::Unauthenticated {
                redirect_to: "/login".into(),
                from: "/admin/bills?status=PENDING".into(),
            }
        );
    }

    #[test]
    fn test_profile_not_loaded_is_pending() {
        let u = user();
        assert_eq!(
            guard().evaluate(&input(Some(&u), None, ADMIN_ONLY)),
            GuardOutcome::ProfilePending
        );
    }

    #[test]
    fn test_role_checks() {
        let u = user();
        let g = guard();
        assert_eq!(
            g.evaluate(&input(Some(&u), Some(UserRole::Admin), ADMIN_ONLY)),
            GuardOutcome::Authorized
        );
        assert_eq!(
            g.evaluate(&input(Some(&u), Some(UserRole::Member), ALL_ROLES)),
            GuardOutcome::Authorized
        );
        assert_eq!(
            g.evaluate(&input(Some(&u), Some(UserRole::Member), ADMIN_ONLY)),
            GuardOutcome::Forbidden {
                redirect_to: "/unauthorized".into()
            }
        );
    }

    #[test]
    fn test_no_required_roles_only_needs_login() {
        let u = user();
        assert_eq!(
            guard().evaluate(&input(Some(&u), None, &[])),
            GuardOutcome::Authorized
        );
    }

    #[test]
    fn test_into_error() {
        assert!(GuardOutcome::Authorized.into_error().is_none());
        assert!(matches!(
            GuardOutcome::ProfilePending.into_error(),
            Some(AppError::ProfilePending)
        ));
        assert!(matches!(
            GuardOutcome::Forbidden {
                redirect_to: "/unauthorized".into()
            }
            .into_error(),
            Some(AppError::Forbidden { .. })
        ));
    }
}
