use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use gymdesk_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, RouteGuard, create_cors},
    realtime::ChangeFeed,
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.auth.jwt_secret, config.auth.audience.clone());
    let guard = RouteGuard::from_config(&config.auth);
    let feed = ChangeFeed::new(config.realtime.channel_capacity);

    // 创建服务
    let notification_service = NotificationService::new(pool.clone(), feed);
    let member_service = MemberService::new(pool.clone(), notification_service.clone());
    let billing_service = BillingService::new(pool.clone(), notification_service.clone());
    let supplement_service = SupplementService::new(pool.clone(), notification_service.clone());
    let fee_package_service = FeePackageService::new(pool.clone());
    let profile_service = ProfileService::new(pool.clone());

    tasks::spawn_all(
        &config.tasks,
        notification_service.clone(),
        member_service.clone(),
        billing_service.clone(),
    );

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(
                jwt_service.clone(),
                profile_service.clone(),
                guard.clone(),
            ))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(notification_service.clone()))
            .app_data(web::Data::new(member_service.clone()))
            .app_data(web::Data::new(billing_service.clone()))
            .app_data(web::Data::new(supplement_service.clone()))
            .app_data(web::Data::new(fee_package_service.clone()))
            .app_data(web::Data::new(profile_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::admin_config)
                    .configure(handlers::me_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
