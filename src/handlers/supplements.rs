use crate::models::*;
use crate::services::SupplementService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/admin/supplements",
    tag = "supplement",
    params(("available_only" = Option<bool>, Query, description = "只返回在售商品")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "获取补剂列表成功"))
)]
pub async fn list_supplements(
    supplement_service: web::Data<SupplementService>,
    query: web::Query<SupplementQuery>,
) -> Result<HttpResponse> {
    match supplement_service
        .list(query.available_only.unwrap_or(false))
        .await
    {
        Ok(items) => Ok(ApiResponse::success(items).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/supplements/{id}",
    tag = "supplement",
    params(("id" = Uuid, Path, description = "补剂ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取补剂成功", body = SupplementResponse),
        (status = 404, description = "补剂不存在")
    )
)]
pub async fn get_supplement(
    supplement_service: web::Data<SupplementService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match supplement_service.get(path.into_inner()).await {
        Ok(item) => Ok(ApiResponse::success(item).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/supplements",
    tag = "supplement",
    request_body = CreateSupplementRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "创建补剂成功", body = SupplementResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn create_supplement(
    supplement_service: web::Data<SupplementService>,
    body: web::Json<CreateSupplementRequest>,
) -> Result<HttpResponse> {
    match supplement_service.create(body.into_inner()).await {
        Ok(item) => Ok(ApiResponse::success(item).created()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/supplements/{id}",
    tag = "supplement",
    params(("id" = Uuid, Path, description = "补剂ID")),
    request_body = UpdateSupplementRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "更新补剂成功", body = SupplementResponse),
        (status = 404, description = "补剂不存在")
    )
)]
pub async fn update_supplement(
    supplement_service: web::Data<SupplementService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateSupplementRequest>,
) -> Result<HttpResponse> {
    match supplement_service
        .update(path.into_inner(), body.into_inner())
        .await
    {
        Ok(item) => Ok(ApiResponse::success(item).ok()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/supplements/{id}",
    tag = "supplement",
    params(("id" = Uuid, Path, description = "补剂ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "删除补剂成功"),
        (status = 404, description = "补剂不存在")
    )
)]
pub async fn delete_supplement(
    supplement_service: web::Data<SupplementService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    match supplement_service.delete(id).await {
        Ok(()) => Ok(ApiResponse::success_with_message(id, "Supplement deleted").ok()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn supplement_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/supplements")
            .route("", web::get().to(list_supplements))
            .route("", web::post().to(create_supplement))
            .route("/{id}", web::get().to(get_supplement))
            .route("/{id}", web::put().to(update_supplement))
            .route("/{id}", web::delete().to(delete_supplement)),
    );
}
