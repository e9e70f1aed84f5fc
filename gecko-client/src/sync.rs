use std::sync::atomic::{AtomicUsize, Ordering};

use log::error;
use tokio::sync::Notify;

/// 计数等待器：记录尚未完成的任务数量，计数归零时唤醒所有等待者
#[derive(Debug, Default)]
pub(crate) struct WaitGroup {
    count: AtomicUsize,
    notify: Notify,
}

impl WaitGroup {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, n: usize) {
        self.count.fetch_add(n, Ordering::AcqRel);
    }

    /// 计数减一，不会减到零以下
    pub(crate) fn done(&self) {
        let prev = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match prev {
            Ok(1) => self.notify.notify_waiters(),
            Ok(_) => {}
            Err(_) => error!("wait group done called with zero pending"),
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// 等待计数归零
    /// 以实时计数为准，开始等待之后新增的任务同样需要等待
    pub(crate) async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // 先注册再检查计数，避免丢失唤醒
            notified.as_mut().enable();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}
