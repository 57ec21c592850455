use crate::handlers::{
    bills::bill_config, fee_packages::fee_package_config, members::member_config,
    notifications::notification_config, supplements::supplement_config,
};
use actix_web::web;

/// 管理端接口统一挂在 /admin 下，由认证中间件限制为 ADMIN
pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .configure(member_config)
            .configure(fee_package_config)
            .configure(bill_config)
            .configure(notification_config)
            .configure(supplement_config),
    );
}
