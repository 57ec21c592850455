use crate::error::AppError;
use crate::handlers::stream::notification_stream;
use crate::models::*;
use crate::realtime::FeedFilter;
use crate::services::NotificationService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/admin/notifications",
    tag = "notification",
    params(
        ("member_id" = Option<Uuid>, Query, description = "按会员筛选"),
        ("type" = Option<String>, Query, description = "按类型筛选 GENERAL/BILL_PENDING/MEMBERSHIP_EXPIRING/MEMBERSHIP_ACTIVATED")
    ),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "获取通知列表成功"))
)]
pub async fn list_notifications(
    notification_service: web::Data<NotificationService>,
    query: web::Query<NotificationQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let result = match (query.member_id, query.notification_type) {
        (Some(member_id), _) => notification_service.list_by_member(member_id).await,
        (None, Some(t)) => notification_service.list_by_type(t).await,
        (None, None) => notification_service.list_all().await,
    };
    match result {
        Ok(list) => Ok(ApiResponse::success(list).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/notifications",
    tag = "notification",
    request_body = CreateNotificationRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "通知已创建", body = NotificationResponse),
        (status = 400, description = "标题或内容为空")
    )
)]
pub async fn create_notification(
    notification_service: web::Data<NotificationService>,
    body: web::Json<CreateNotificationRequest>,
) -> Result<HttpResponse> {
    match notification_service.create(body.into_inner()).await {
        Ok(n) => Ok(ApiResponse::success(n).created()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/notifications/broadcast",
    tag = "notification",
    request_body = BroadcastNotificationRequest,
    security(("bearer_auth" = [])),
    responses((status = 201, description = "已发送给所有活跃会员"))
)]
pub async fn broadcast(
    notification_service: web::Data<NotificationService>,
    body: web::Json<BroadcastNotificationRequest>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    match notification_service
        .send_to_all_active(req.title, req.message, req.notification_type)
        .await
    {
        Ok(list) => Ok(ApiResponse::success(list).created()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/notifications/send",
    tag = "notification",
    request_body = SendToMembersRequest,
    security(("bearer_auth" = [])),
    responses((status = 201, description = "已发送给指定会员"))
)]
pub async fn send_to_members(
    notification_service: web::Data<NotificationService>,
    body: web::Json<SendToMembersRequest>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    match notification_service
        .send_to_members(req.member_ids, req.title, req.message, req.notification_type)
        .await
    {
        Ok(list) => Ok(ApiResponse::success(list).created()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/notifications/stats",
    tag = "notification",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "通知统计", body = NotificationStats))
)]
pub async fn notification_stats(
    notification_service: web::Data<NotificationService>,
) -> Result<HttpResponse> {
    match notification_service.stats(Utc::now()).await {
        Ok(stats) => Ok(ApiResponse::success(stats).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/notifications/expiry-warnings",
    tag = "notification",
    security(("bearer_auth" = [])),
    responses((status = 201, description = "已为 7 天内到期的会员生成提醒"))
)]
pub async fn create_expiry_warnings(
    notification_service: web::Data<NotificationService>,
) -> Result<HttpResponse> {
    match notification_service
        .create_expiry_warnings(Utc::now().date_naive())
        .await
    {
        Ok(list) => Ok(ApiResponse::success(list).created()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/notifications/{id}/read",
    tag = "notification",
    params(("id" = Uuid, Path, description = "通知ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已标记为已读", body = AffectedRowsResponse),
        (status = 404, description = "通知不存在")
    )
)]
pub async fn mark_read(
    notification_service: web::Data<NotificationService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match notification_service.mark_read(path.into_inner()).await {
        Ok(0) => Ok(AppError::NotFound("Notification not found".to_string()).error_response()),
        Ok(affected) => Ok(ApiResponse::success(AffectedRowsResponse { affected }).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/notifications/{id}",
    tag = "notification",
    params(("id" = Uuid, Path, description = "通知ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "通知已删除", body = AffectedRowsResponse),
        (status = 404, description = "通知不存在")
    )
)]
pub async fn delete_notification(
    notification_service: web::Data<NotificationService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match notification_service.delete(path.into_inner()).await {
        Ok(0) => Ok(AppError::NotFound("Notification not found".to_string()).error_response()),
        Ok(affected) => Ok(ApiResponse::success(AffectedRowsResponse { affected }).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/notifications/member/{member_id}/read-all",
    tag = "notification",
    params(("member_id" = Uuid, Path, description = "会员ID")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "会员通知全部已读", body = AffectedRowsResponse))
)]
pub async fn mark_all_read_for_member(
    notification_service: web::Data<NotificationService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match notification_service
        .mark_all_read_for_member(path.into_inner())
        .await
    {
        Ok(affected) => Ok(ApiResponse::success(AffectedRowsResponse { affected }).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/notifications/member/{member_id}",
    tag = "notification",
    params(("member_id" = Uuid, Path, description = "会员ID")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "会员通知已全部删除", body = AffectedRowsResponse))
)]
pub async fn delete_all_for_member(
    notification_service: web::Data<NotificationService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match notification_service
        .delete_all_for_member(path.into_inner())
        .await
    {
        Ok(affected) => Ok(ApiResponse::success(AffectedRowsResponse { affected }).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/notifications/stream",
    tag = "notification",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "text/event-stream，推送所有新通知"))
)]
pub async fn stream_all(notification_service: web::Data<NotificationService>) -> HttpResponse {
    notification_stream(&notification_service, FeedFilter::All)
}

pub fn notification_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(list_notifications))
            .route("", web::post().to(create_notification))
            .route("/broadcast", web::post().to(broadcast))
            .route("/send", web::post().to(send_to_members))
            .route("/stats", web::get().to(notification_stats))
            .route("/expiry-warnings", web::post().to(create_expiry_warnings))
            .route("/stream", web::get().to(stream_all))
            .route(
                "/member/{member_id}/read-all",
                web::patch().to(mark_all_read_for_member),
            )
            .route("/member/{member_id}", web::delete().to(delete_all_for_member))
            .route("/{id}/read", web::patch().to(mark_read))
            .route("/{id}", web::delete().to(delete_notification)),
    );
}
