use crate::models::*;
use crate::services::BillingService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/admin/bills",
    tag = "billing",
    params(
        ("status" = Option<String>, Query, description = "账单状态 PENDING/PAID/OVERDUE"),
        ("member_id" = Option<Uuid>, Query, description = "会员ID")
    ),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "获取账单列表成功"))
)]
pub async fn list_bills(
    billing_service: web::Data<BillingService>,
    query: web::Query<BillQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    // member_id 优先于 status
    let result = match (query.member_id, query.status) {
        (Some(member_id), _) => billing_service.list_by_member(member_id).await,
        (None, Some(status)) => billing_service.list_by_status(status).await,
        (None, None) => billing_service.list_all().await,
    };
    match result {
        Ok(bills) => Ok(ApiResponse::success(bills).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/bills/stats",
    tag = "billing",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "账单统计", body = BillingStats))
)]
pub async fn billing_stats(billing_service: web::Data<BillingService>) -> Result<HttpResponse> {
    match billing_service.stats(Utc::now().date_naive()).await {
        Ok(stats) => Ok(ApiResponse::success(stats).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/bills/mark-overdue",
    tag = "billing",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "逾期账单已标记", body = AffectedRowsResponse))
)]
pub async fn mark_overdue(billing_service: web::Data<BillingService>) -> Result<HttpResponse> {
    match billing_service.mark_overdue(Utc::now().date_naive()).await {
        Ok(affected) => Ok(ApiResponse::success(AffectedRowsResponse { affected }).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/bills/{id}/pay",
    tag = "billing",
    params(("id" = Uuid, Path, description = "账单ID")),
    request_body = ProcessPaymentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "支付已登记", body = BillResponse),
        (status = 400, description = "账单已支付"),
        (status = 404, description = "账单不存在")
    )
)]
pub async fn process_payment(
    billing_service: web::Data<BillingService>,
    path: web::Path<Uuid>,
    body: web::Json<ProcessPaymentRequest>,
) -> Result<HttpResponse> {
    match billing_service
        .process_payment(path.into_inner(), body.into_inner())
        .await
    {
        Ok(bill) => Ok(ApiResponse::success_with_message(bill, "Payment recorded").ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/bills/generate",
    tag = "billing",
    request_body = GenerateBillRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "账单已生成", body = GeneratedBillResponse),
        (status = 400, description = "会员未绑定套餐"),
        (status = 404, description = "会员不存在")
    )
)]
pub async fn generate_bill(
    billing_service: web::Data<BillingService>,
    body: web::Json<GenerateBillRequest>,
) -> Result<HttpResponse> {
    match billing_service.generate_package_bill(body.into_inner()).await {
        Ok(generated) => Ok(ApiResponse::success(generated).created()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn bill_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bills")
            .route("", web::get().to(list_bills))
            .route("/stats", web::get().to(billing_stats))
            .route("/mark-overdue", web::post().to(mark_overdue))
            .route("/generate", web::post().to(generate_bill))
            .route("/{id}/pay", web::post().to(process_payment)),
    );
}
