//! 通知实时推送（SSE）

use crate::entities::notification_entity as notifications;
use crate::error::AppResult;
use crate::models::NotificationResponse;
use crate::realtime::{FeedFilter, Subscription};
use crate::services::NotificationService;
use actix_web::HttpResponse;
use actix_web::web::Bytes;
use futures_util::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

/// 空闲时发送注释帧的间隔，写失败即可发现客户端已断开
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);
const KEEP_ALIVE_FRAME: &[u8] = b": keep-alive\n\n";

/// 单条 SSE 帧
pub fn sse_frame(notification: &NotificationResponse) -> AppResult<Bytes> {
    let payload = serde_json::to_string(notification)?;
    Ok(Bytes::from(format!("event: notification\ndata: {payload}\n\n")))
}

/// 打开订阅并把插入事件写成 SSE 流；客户端断开时流被丢弃，订阅随之释放
pub fn notification_stream(service: &NotificationService, filter: FeedFilter) -> HttpResponse {
    let (tx, rx) = mpsc::unbounded_channel::<notifications::Model>();
    let forward = move |row: notifications::Model| {
        let _ = tx.send(row);
    };
    let subscription = match filter {
        FeedFilter::All => service.subscribe_all(forward),
        FeedFilter::Member(member_id) => service.subscribe_member(member_id, forward),
    };

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(sse_body(subscription, rx, KEEP_ALIVE_INTERVAL))
}

fn sse_body(
    subscription: Subscription,
    rx: mpsc::UnboundedReceiver<notifications::Model>,
    keep_alive: Duration,
) -> impl Stream<Item = Result<Bytes, Infallible>> {
    let mut ticker = time::interval_at(Instant::now() + keep_alive, keep_alive);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    futures_util::stream::unfold(
        (subscription, rx, ticker),
        |(subscription, mut rx, mut ticker)| async move {
            loop {
                // None 表示订阅已关闭；Some(None) 表示该发心跳了
                let next = tokio::select! {
                    row = rx.recv() => row.map(Some),
                    _ = ticker.tick() => Some(None),
                };
                let frame = match next? {
                    Some(row) => match sse_frame(&NotificationResponse::from(row)) {
                        Ok(frame) => frame,
                        Err(e) => {
                            log::error!("Skipping notification frame: {e}");
                            continue;
                        }
                    },
                    None => Bytes::from_static(KEEP_ALIVE_FRAME),
                };
                return Some((Ok::<_, Infallible>(frame), (subscription, rx, ticker)));
            }
        },
    )
}
