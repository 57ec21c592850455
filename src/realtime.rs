//! 通知写入的实时变更流
//!
//! 所有通知写入成功后都会发布到 `ChangeFeed`。订阅方通过 `subscribe` 拿到
//! `Subscription`，句柄被 drop 或调用 `unsubscribe` 时转发任务即被终止，
//! 不会因为调用方忘记清理而泄漏。

use crate::entities::notification_entity as notifications;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFilter {
    All,
    Member(Uuid),
}

impl FeedFilter {
    pub fn matches(&self, row: &notifications::Model) -> bool {
        match self {
            FeedFilter::All => true,
            FeedFilter::Member(member_id) => row.member_id == *member_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<notifications::Model>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// 发布新插入的通知；没有订阅者时直接丢弃
    pub fn publish(&self, rows: &[notifications::Model]) {
        for row in rows {
            if self.tx.send(row.clone()).is_err() {
                log::debug!("No active notification subscribers, dropping feed events");
                return;
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// 打开一个订阅，每条匹配的插入事件都会调用 `handler`
    pub fn subscribe<F>(&self, filter: FeedFilter, mut handler: F) -> Subscription
    where
        F: FnMut(notifications::Model) + Send + 'static,
    {
        let mut rx = self.tx.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(row) if filter.matches(&row) => handler(row),
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("Notification subscriber lagged, skipped {skipped} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Subscription { filter, task }
    }
}

/// 订阅句柄，生命周期即订阅的生命周期
#[derive(Debug)]
pub struct Subscription {
    filter: FeedFilter,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn filter(&self) -> FeedFilter {
        self.filter
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn unsubscribe(self) {
        // Drop 负责终止转发任务
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
