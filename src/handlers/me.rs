//! 会员自助接口，调用者身份来自认证中间件

use crate::error::AppError;
use crate::handlers::stream::notification_stream;
use crate::middlewares::current_user;
use crate::models::*;
use crate::realtime::FeedFilter;
use crate::services::{
    BillingService, MemberService, NotificationService, ProfileService, SupplementService,
};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use uuid::Uuid;

/// 当前调用者的会员 id；尚未建立会员记录时为 None
async fn own_member_id(
    req: &HttpRequest,
    member_service: &MemberService,
) -> Result<Option<Uuid>, AppError> {
    let user = current_user(req)?;
    Ok(member_service
        .find_by_user(user.user_id)
        .await?
        .map(|m| m.id))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "当前用户资料", body = ProfileResponse),
        (status = 401, description = "未登录"),
        (status = 503, description = "资料尚未加载")
    )
)]
pub async fn get_me(
    profile_service: web::Data<ProfileService>,
    member_service: web::Data<MemberService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match profile_service.get_me(user.user_id, &member_service).await {
        Ok(profile) => Ok(ApiResponse::success(profile).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me/notifications",
    tag = "me",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "我的通知"))
)]
pub async fn my_notifications(
    notification_service: web::Data<NotificationService>,
    member_service: web::Data<MemberService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let member_id = match own_member_id(&req, &member_service).await {
        Ok(Some(id)) => id,
        Ok(None) => return Ok(ApiResponse::success(Vec::<NotificationResponse>::new()).ok()),
        Err(e) => return Ok(e.error_response()),
    };
    match notification_service.list_by_member(member_id).await {
        Ok(list) => Ok(ApiResponse::success(list).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/me/notifications/read-all",
    tag = "me",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "全部标记为已读", body = AffectedRowsResponse))
)]
pub async fn read_all_my_notifications(
    notification_service: web::Data<NotificationService>,
    member_service: web::Data<MemberService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let member_id = match own_member_id(&req, &member_service).await {
        Ok(Some(id)) => id,
        Ok(None) => return Ok(ApiResponse::success(AffectedRowsResponse { affected: 0 }).ok()),
        Err(e) => return Ok(e.error_response()),
    };
    match notification_service
        .mark_all_read_for_member(member_id)
        .await
    {
        Ok(affected) => Ok(ApiResponse::success(AffectedRowsResponse { affected }).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me/notifications/stream",
    tag = "me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "text/event-stream，推送我的新通知"),
        (status = 404, description = "尚无会员记录")
    )
)]
pub async fn stream_my_notifications(
    notification_service: web::Data<NotificationService>,
    member_service: web::Data<MemberService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    match own_member_id(&req, &member_service).await {
        Ok(Some(member_id)) => Ok(notification_stream(
            &notification_service,
            FeedFilter::Member(member_id),
        )),
        Ok(None) => Ok(AppError::NotFound("Member record not found".to_string()).error_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me/bills",
    tag = "me",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "我的账单"))
)]
pub async fn my_bills(
    billing_service: web::Data<BillingService>,
    member_service: web::Data<MemberService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let member_id = match own_member_id(&req, &member_service).await {
        Ok(Some(id)) => id,
        Ok(None) => return Ok(ApiResponse::success(Vec::<BillResponse>::new()).ok()),
        Err(e) => return Ok(e.error_response()),
    };
    match billing_service.list_by_member(member_id).await {
        Ok(bills) => Ok(ApiResponse::success(bills).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me/supplements",
    tag = "me",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "在售补剂"))
)]
pub async fn available_supplements(
    supplement_service: web::Data<SupplementService>,
) -> Result<HttpResponse> {
    match supplement_service.list(true).await {
        Ok(items) => Ok(ApiResponse::success(items).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/me/supplements/{id}/purchase",
    tag = "me",
    params(("id" = Uuid, Path, description = "补剂ID")),
    request_body = PurchaseSupplementRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "购买成功，已生成待支付账单", body = PurchaseSupplementResponse),
        (status = 400, description = "库存不足或补剂不可购买"),
        (status = 404, description = "补剂不存在")
    )
)]
pub async fn purchase_supplement(
    supplement_service: web::Data<SupplementService>,
    path: web::Path<Uuid>,
    body: web::Json<PurchaseSupplementRequest>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match supplement_service
        .purchase_supplement(user.user_id, path.into_inner(), body.quantity)
        .await
    {
        Ok(purchase) => Ok(ApiResponse::success_with_message(purchase, "Purchase recorded").created()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn me_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/me")
            .route("", web::get().to(get_me))
            .route("/notifications", web::get().to(my_notifications))
            .route(
                "/notifications/read-all",
                web::post().to(read_all_my_notifications),
            )
            .route("/notifications/stream", web::get().to(stream_my_notifications))
            .route("/bills", web::get().to(my_bills))
            .route("/supplements", web::get().to(available_supplements))
            .route("/supplements/{id}/purchase", web::post().to(purchase_supplement)),
    );
}
