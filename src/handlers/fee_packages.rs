use crate::models::*;
use crate::services::FeePackageService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/admin/fee-packages",
    tag = "fee_package",
    params(("active_only" = Option<bool>, Query, description = "只返回启用中的套餐")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "获取套餐列表成功"))
)]
pub async fn list_packages(
    package_service: web::Data<FeePackageService>,
    query: web::Query<FeePackageQuery>,
) -> Result<HttpResponse> {
    match package_service
        .list(query.active_only.unwrap_or(false))
        .await
    {
        Ok(packages) => Ok(ApiResponse::success(packages).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/fee-packages",
    tag = "fee_package",
    request_body = CreateFeePackageRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "创建套餐成功", body = FeePackageResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn create_package(
    package_service: web::Data<FeePackageService>,
    body: web::Json<CreateFeePackageRequest>,
) -> Result<HttpResponse> {
    match package_service.create(body.into_inner()).await {
        Ok(package) => Ok(ApiResponse::success(package).created()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/fee-packages/{id}",
    tag = "fee_package",
    params(("id" = Uuid, Path, description = "套餐ID")),
    request_body = UpdateFeePackageRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "更新套餐成功", body = FeePackageResponse),
        (status = 404, description = "套餐不存在")
    )
)]
pub async fn update_package(
    package_service: web::Data<FeePackageService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateFeePackageRequest>,
) -> Result<HttpResponse> {
    match package_service
        .update(path.into_inner(), body.into_inner())
        .await
    {
        Ok(package) => Ok(ApiResponse::success(package).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/fee-packages/{id}",
    tag = "fee_package",
    params(("id" = Uuid, Path, description = "套餐ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "套餐已停用", body = FeePackageResponse),
        (status = 404, description = "套餐不存在")
    )
)]
pub async fn deactivate_package(
    package_service: web::Data<FeePackageService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match package_service.deactivate(path.into_inner()).await {
        Ok(package) => Ok(ApiResponse::success_with_message(package, "Fee package deactivated").ok()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn fee_package_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/fee-packages")
            .route("", web::get().to(list_packages))
            .route("", web::post().to(create_package))
            .route("/{id}", web::put().to(update_package))
            .route("/{id}", web::delete().to(deactivate_package)),
    );
}
