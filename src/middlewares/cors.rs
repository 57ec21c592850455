use actix_cors::Cors;

/// 管理后台与会员端前端共用的跨域配置
pub fn create_cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_, _req_head| true)
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allow_any_header()
        // 前端需要读取守卫返回的重试提示
        .expose_headers(vec!["Retry-After"])
        .supports_credentials()
        .max_age(3600)
}
