use crate::error::{AppError, AppResult};
use crate::middlewares::route_guard::{ADMIN_ONLY, ALL_ROLES, GuardInput, RouteGuard};
use crate::services::ProfileService;
use crate::utils::{AuthUser, JwtService};
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;

/// 路径对应的访问级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    AnyProfile,
    Admin,
}

const PUBLIC_EXACT: &[&str] = &["/swagger-ui", "/api-docs/openapi.json"];
const PUBLIC_PREFIXES: &[&str] = &["/swagger-ui/", "/api-docs/"];
const SELF_SERVICE_PREFIX: &str = "/api/v1/me";

fn access_for(path: &str) -> Access {
    if PUBLIC_EXACT.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return Access::Public;
    }
    if path == SELF_SERVICE_PREFIX || path.starts_with("/api/v1/me/") {
        return Access::AnyProfile;
    }
    // 其余接口（含 /api/v1/admin/**）只对管理员开放
    Access::Admin
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
    profile_service: ProfileService,
    guard: RouteGuard,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService, profile_service: ProfileService, guard: RouteGuard) -> Self {
        Self {
            jwt_service,
            profile_service,
            guard,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_service: self.jwt_service.clone(),
            profile_service: self.profile_service.clone(),
            guard: self.guard.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_service: JwtService,
    profile_service: ProfileService,
    guard: RouteGuard,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        let required = match access_for(req.path()) {
            Access::Public => return Box::pin(self.service.call(req)),
            Access::AnyProfile => ALL_ROLES,
            Access::Admin => ADMIN_ONLY,
        };

        // 令牌缺失或无效都按未登录处理
        let user = bearer_token(&req).and_then(|token| match self.jwt_service.authenticate(token) {
            Ok(user) => Some(user),
            Err(e) => {
                log::warn!("Rejected access token: {e}");
                None
            }
        });
        let location = match req.uri().query() {
            Some(query) => format!("{}?{query}", req.path()),
            None => req.path().to_string(),
        };

        let service = Rc::clone(&self.service);
        let profile_service = self.profile_service.clone();
        let guard = self.guard.clone();

        Box::pin(async move {
            let role = match &user {
                Some(u) => profile_service.find_role(u.user_id).await?,
                None => None,
            };

            let outcome = guard.evaluate(&GuardInput {
                loading: false,
                user: user.as_ref(),
                role,
                required,
                location: &location,
            });
            if let Some(err) = outcome.into_error() {
                return Err(err.into());
            }

            if let Some(user) = user {
                req.extensions_mut().insert(user);
            }
            service.call(req).await
        })
    }
}

/// 处理器中获取当前调用者
pub fn current_user(req: &HttpRequest) -> AppResult<AuthUser> {
    req.extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::AuthError("Missing authenticated user".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{UserRole, profile_entity as profiles};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, ResponseError, test, web};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;
    use uuid::Uuid;

    const SECRET: &str = "test-secret";

    fn profile(id: Uuid, role: UserRole) -> profiles::Model {
        profiles::Model {
            id,
            full_name: Some("Test User".into()),
            email: None,
            role,
            created_at: Utc::now(),
        }
    }

    fn middleware(db: DatabaseConnection) -> AuthMiddleware {
        AuthMiddleware::new(
            JwtService::new(SECRET, None),
            ProfileService::new(Arc::new(db)),
            RouteGuard::new("/login", "/unauthorized"),
        )
    }

    fn token(user_id: Uuid) -> String {
        JwtService::new(SECRET, None)
            .issue_token(user_id, None, 3600)
            .unwrap()
    }

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match current_user(&req) {
            Ok(user) => HttpResponse::Ok().body(user.user_id.to_string()),
            Err(e) => e.error_response(),
        }
    }

    #[::core::prelude::v1::test]
    fn test_access_levels() {
        assert_eq!(access_for("/swagger-ui/index.html"), Access::Public);
        assert_eq!(access_for("/api-docs/openapi.json"), Access::Public);
        assert_eq!(access_for("/api/v1/me"), Access::AnyProfile);
        assert_eq!(access_for("/api/v1/me/notifications"), Access::AnyProfile);
        assert_eq!(access_for("/api/v1/members"), Access::Admin);
        assert_eq!(access_for("/api/v1/admin/bills"), Access::Admin);
    }

    #[actix_web::test]
    async fn test_missing_token_is_unauthenticated_with_origin() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .wrap(middleware(db))
                .route("/api/v1/admin/bills", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/admin/bills?status=PENDING")
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["redirect_to"], "/login");
        assert_eq!(body["error"]["from"], "/api/v1/admin/bills?status=PENDING");
    }

    #[actix_web::test]
    async fn test_member_on_admin_route_is_forbidden() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![profile(user_id, UserRole::Member)]])
            .into_connection();
        let app = test::init_service(
            App::new()
                .wrap(middleware(db))
                .route("/api/v1/admin/bills", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/admin/bills")
            .insert_header(("Authorization", format!("Bearer {}", token(user_id))))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_admin_is_forwarded_with_identity() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![profile(user_id, UserRole::Admin)]])
            .into_connection();
        let app = test::init_service(
            App::new()
                .wrap(middleware(db))
                .route("/api/v1/admin/bills", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/admin/bills")
            .insert_header(("Authorization", format!("Bearer {}", token(user_id))))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, user_id.to_string());
    }

    #[actix_web::test]
    async fn test_missing_profile_is_pending() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<profiles::Model>::new()])
            .into_connection();
        let app = test::init_service(
            App::new()
                .wrap(middleware(db))
                .route("/api/v1/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/me")
            .insert_header(("Authorization", format!("Bearer {}", token(user_id))))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.headers().get("Retry-After").unwrap(), "1");
    }

    #[actix_web::test]
    async fn test_invalid_token_is_treated_as_anonymous() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .wrap(middleware(db))
                .route("/api/v1/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/me")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_public_paths_skip_auth() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .wrap(middleware(db))
                .route(
                    "/api-docs/openapi.json",
                    web::get().to(|| async { HttpResponse::Ok().finish() }),
                ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api-docs/openapi.json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
