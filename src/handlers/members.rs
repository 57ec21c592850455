use crate::models::*;
use crate::services::MemberService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/admin/members",
    tag = "member",
    params(
        ("status" = Option<String>, Query, description = "会员状态 ACTIVE/INACTIVE/EXPIRED/SUSPENDED"),
        ("page" = Option<u64>, Query, description = "页码"),
        ("page_size" = Option<u64>, Query, description = "每页数量")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取会员列表成功"),
        (status = 401, description = "未登录"),
        (status = 403, description = "无权限")
    )
)]
pub async fn list_members(
    member_service: web::Data<MemberService>,
    query: web::Query<MemberQuery>,
) -> Result<HttpResponse> {
    match member_service.list(query.into_inner()).await {
        Ok(page) => Ok(ApiResponse::success(page).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/members/{id}",
    tag = "member",
    params(("id" = Uuid, Path, description = "会员ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取会员成功", body = MemberResponse),
        (status = 404, description = "会员不存在")
    )
)]
pub async fn get_member(
    member_service: web::Data<MemberService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match member_service.get(path.into_inner()).await {
        Ok(member) => Ok(ApiResponse::success(member).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/members",
    tag = "member",
    request_body = CreateMemberRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "创建会员成功", body = MemberResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn create_member(
    member_service: web::Data<MemberService>,
    body: web::Json<CreateMemberRequest>,
) -> Result<HttpResponse> {
    match member_service.create(body.into_inner()).await {
        Ok(member) => Ok(ApiResponse::success(member).created()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/members/{id}/status",
    tag = "member",
    params(("id" = Uuid, Path, description = "会员ID")),
    request_body = UpdateMemberStatusRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "更新状态成功", body = MemberResponse),
        (status = 404, description = "会员不存在")
    )
)]
pub async fn update_member_status(
    member_service: web::Data<MemberService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateMemberStatusRequest>,
) -> Result<HttpResponse> {
    match member_service
        .update_status(path.into_inner(), body.into_inner().status)
        .await
    {
        Ok(member) => Ok(ApiResponse::success(member).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/members/{id}/package",
    tag = "member",
    params(("id" = Uuid, Path, description = "会员ID")),
    request_body = AssignPackageRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "套餐已绑定，会员已激活", body = MemberResponse),
        (status = 400, description = "套餐已停用"),
        (status = 404, description = "会员或套餐不存在")
    )
)]
pub async fn assign_package(
    member_service: web::Data<MemberService>,
    path: web::Path<Uuid>,
    body: web::Json<AssignPackageRequest>,
) -> Result<HttpResponse> {
    match member_service
        .assign_package(path.into_inner(), body.into_inner())
        .await
    {
        Ok(member) => Ok(ApiResponse::success_with_message(member, "Membership activated").ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/members/expire-lapsed",
    tag = "member",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "过期会员处理完成", body = AffectedRowsResponse))
)]
pub async fn expire_lapsed(member_service: web::Data<MemberService>) -> Result<HttpResponse> {
    match member_service.expire_lapsed(Utc::now().date_naive()).await {
        Ok(affected) => Ok(ApiResponse::success(AffectedRowsResponse { affected }).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn member_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/members")
            .route("", web::get().to(list_members))
            .route("", web::post().to(create_member))
            .route("/expire-lapsed", web::post().to(expire_lapsed))
            .route("/{id}", web::get().to(get_member))
            .route("/{id}/status", web::patch().to(update_member_status))
            .route("/{id}/package", web::post().to(assign_package)),
    );
}
