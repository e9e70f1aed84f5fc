use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::{sync::WaitGroup, Context};

use super::{Conn, Dialer, GroupConn};

/// 包装一个拨号器，跟踪它建立的每一个连接
/// 客户端关闭时，先关闭空闲连接，再调用 [`ConnGroup::wait`] 等待其余连接全部关闭
pub struct ConnGroup<D> {
    dial: D,
    pending: Arc<WaitGroup>,
}

impl<D: Dialer> ConnGroup<D> {
    pub fn new(dial: D) -> Self {
        Self {
            dial,
            pending: Arc::new(WaitGroup::new()),
        }
    }

    /// 已建立但尚未关闭的连接数
    pub fn pending(&self) -> usize {
        self.pending.count()
    }

    /// 等待所有连接关闭
    /// 没有超时，需要限时的调用方自行包一层 `tokio::time::timeout`
    pub async fn wait(&self) {
        self.pending.wait().await
    }
}

#[async_trait]
impl<D: Dialer> Dialer for ConnGroup<D> {
    async fn dial(
        &self,
        ctx: &Context,
        network: &str,
        address: &str,
    ) -> Result<Box<dyn Conn>, crate::Error> {
        // 拨号失败不计数
        let conn = self.dial.dial(ctx, network, address).await?;
        self.pending.add(1);
        debug!(
            "conn group registered {}://{}, pending {}",
            network,
            address,
            self.pending.count()
        );
        Ok(Box::new(GroupConn::new(conn, self.pending.clone())))
    }
}
