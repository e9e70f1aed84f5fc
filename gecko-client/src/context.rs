//! 请求上下文
//! 携带可选的截止时间与取消信号，在一次请求的调用链上传递

use std::{future::Future, time::Duration};

use tokio::{select, time::Instant};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::Error;

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl Context {
    /// 没有截止时间、不会被取消的根上下文
    pub fn background() -> Self {
        Self::default()
    }

    /// 派生子上下文，截止时间取父子中更早的一个
    /// 返回的 guard 被丢弃时取消子上下文
    pub fn with_deadline(&self, deadline: Instant) -> (Self, DropGuard) {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        self.child(Some(deadline))
    }

    /// 超时过大、无法表示为时间点时，子上下文沿用父上下文的截止时间
    pub fn with_timeout(&self, timeout: Duration) -> (Self, DropGuard) {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.child(self.deadline),
        }
    }

    fn child(&self, deadline: Option<Instant>) -> (Self, DropGuard) {
        let token = self.token.child_token();
        let guard = token.clone().drop_guard();
        (Self { deadline, token }, guard)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// 距离截止时间的剩余时长，已过期返回零
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.token.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// 在上下文约束下执行 future
    /// * 被取消返回 `Error::Cancelled`
    /// * 超过截止时间返回 `Error::DeadlineExceeded`
    /// * 否则原样返回 future 的结果
    pub async fn run<F, T>(&self, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        select! {
            biased;
            _ = self.token.cancelled() => Err(Error::Cancelled),
            _ = sleep_until(self.deadline) => Err(Error::DeadlineExceeded),
            res = fut => res,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => futures::future::pending().await,
    }
}
