use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{BillStatus, MemberStatus, NotificationType, UserRole};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::members::list_members,
        handlers::members::get_member,
        handlers::members::create_member,
        handlers::members::update_member_status,
        handlers::members::assign_package,
        handlers::members::expire_lapsed,
        handlers::fee_packages::list_packages,
        handlers::fee_packages::create_package,
        handlers::fee_packages::update_package,
        handlers::fee_packages::deactivate_package,
        handlers::bills::list_bills,
        handlers::bills::billing_stats,
        handlers::bills::mark_overdue,
        handlers::bills::process_payment,
        handlers::bills::generate_bill,
        handlers::notifications::list_notifications,
        handlers::notifications::create_notification,
        handlers::notifications::broadcast,
        handlers::notifications::send_to_members,
        handlers::notifications::notification_stats,
        handlers::notifications::create_expiry_warnings,
        handlers::notifications::mark_read,
        handlers::notifications::delete_notification,
        handlers::notifications::mark_all_read_for_member,
        handlers::notifications::delete_all_for_member,
        handlers::notifications::stream_all,
        handlers::supplements::list_supplements,
        handlers::supplements::get_supplement,
        handlers::supplements::create_supplement,
        handlers::supplements::update_supplement,
        handlers::supplements::delete_supplement,
        handlers::me::get_me,
        handlers::me::my_notifications,
        handlers::me::read_all_my_notifications,
        handlers::me::stream_my_notifications,
        handlers::me::my_bills,
        handlers::me::available_supplements,
        handlers::me::purchase_supplement,
    ),
    components(
        schemas(
            UserRole,
            MemberStatus,
            BillStatus,
            NotificationType,
            ApiError,
            PaginationParams,
            MemberSummary,
            MemberResponse,
            MemberQuery,
            CreateMemberRequest,
            UpdateMemberStatusRequest,
            AssignPackageRequest,
            FeePackageResponse,
            CreateFeePackageRequest,
            UpdateFeePackageRequest,
            FeePackageQuery,
            BillResponse,
            BillQuery,
            ProcessPaymentRequest,
            GenerateBillRequest,
            GeneratedBillResponse,
            BillingStats,
            NotificationResponse,
            CreateNotificationRequest,
            BroadcastNotificationRequest,
            SendToMembersRequest,
            NotificationQuery,
            NotificationTypeCounts,
            NotificationStats,
            AffectedRowsResponse,
            SupplementResponse,
            CreateSupplementRequest,
            UpdateSupplementRequest,
            SupplementQuery,
            PurchaseSupplementRequest,
            PurchaseSupplementResponse,
            ProfileResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "member", description = "Member administration API"),
        (name = "fee_package", description = "Fee package API"),
        (name = "billing", description = "Billing API"),
        (name = "notification", description = "Notification API"),
        (name = "supplement", description = "Supplement catalog API"),
        (name = "me", description = "Member self-service API"),
    ),
    info(
        title = "Gymdesk Backend API",
        version = "1.0.0",
        description = "Gym membership administration REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
