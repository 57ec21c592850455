//! 后台定时任务
//!
//! 启动时调用一次 `spawn_all`，各任务通过 `tokio::spawn` 脱离运行，按各自间隔循环。

use crate::config::TasksConfig;
use crate::services::{BillingService, MemberService, NotificationService};
use chrono::Utc;
use std::time::Duration;

pub fn spawn_all(
    config: &TasksConfig,
    notification_service: NotificationService,
    member_service: MemberService,
    billing_service: BillingService,
) {
    if !config.enabled {
        log::info!("Background tasks disabled");
        return;
    }

    // 到期提醒；同一天重复运行会产生重复提醒，间隔默认一天
    {
        let svc = notification_service;
        let interval = Duration::from_secs(config.expiry_scan_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                match svc.create_expiry_warnings(Utc::now().date_naive()).await {
                    Ok(created) if !created.is_empty() => {
                        log::info!("Expiry warnings created: {}", created.len())
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to create expiry warnings: {e:?}"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    // 逾期账单与过期会员
    {
        let interval = Duration::from_secs(config.overdue_scan_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                let today = Utc::now().date_naive();
                match billing_service.mark_overdue(today).await {
                    Ok(n) if n > 0 => log::info!("Overdue bills marked: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to mark overdue bills: {e:?}"),
                }
                match member_service.expire_lapsed(today).await {
                    Ok(n) if n > 0 => log::info!("Lapsed memberships expired: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to expire lapsed memberships: {e:?}"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }
}
