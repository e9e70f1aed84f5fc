//! 请求分发
//! 解析请求地址，计算本次请求的超时预算，交给传输层完成往返

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use log::debug;

use crate::{
    config::ClientConfig, default_transport, network::Addr, Context, Error, RoundTripper,
};

/// 为请求超时预留的余量策略
/// 余量 = min(超时 / divisor, max)，保证客户端的截止时间严格早于调用方自己的截止时间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Headroom {
    pub divisor: u32,
    pub max: Duration,
}

impl Default for Headroom {
    fn default() -> Self {
        Self {
            divisor: 4,
            max: Duration::from_secs(1),
        }
    }
}

impl Headroom {
    pub fn buffer(&self, timeout: Duration) -> Duration {
        if self.divisor == 0 {
            return Duration::ZERO;
        }
        (timeout / self.divisor).min(self.max)
    }
}

/// 与 broker 集群交互的客户端
///
/// 构建完成后只能通过共享引用使用，可以在多个任务间并发调用
#[derive(Clone, Default)]
pub struct Client {
    /// 请求未指定地址时使用的集群地址，请求地址优先
    addr: Option<Addr>,
    /// 请求的时间上限，为零表示不限时
    timeout: Duration,
    headroom: Headroom,
    /// 未设置时使用进程级默认传输
    transport: Option<Arc<dyn RoundTripper>>,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &ClientConfig) -> Self {
        Self {
            addr: cfg.addr.as_ref().map(Addr::tcp),
            timeout: Duration::from_millis(cfg.timeout_ms),
            headroom: cfg.headroom.into(),
            transport: None,
        }
    }

    pub fn with_addr(mut self, addr: Addr) -> Self {
        self.addr = Some(addr);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_headroom(mut self, headroom: Headroom) -> Self {
        self.headroom = headroom;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn RoundTripper>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn addr(&self) -> Option<&Addr> {
        self.addr.as_ref()
    }

    /// 完成一次请求往返
    /// * 地址：请求地址 > 客户端地址，都没有返回 `Error::NoAddress`
    /// * 配置了超时则派生带截止时间的子上下文，请求结束时释放
    /// * 传输层错误原样返回，不做重试
    pub async fn round_trip(
        &self,
        ctx: &Context,
        addr: Option<&Addr>,
        msg: Bytes,
    ) -> Result<Bytes, Error> {
        let addr = addr.or(self.addr.as_ref()).ok_or(Error::NoAddress)?;
        let transport = self.transport();

        match self.timeout(ctx) {
            Some(timeout) => {
                debug!("round trip to {} with timeout {:?}", addr, timeout);
                let (ctx, _guard) = ctx.with_timeout(timeout);
                ctx.run(transport.round_trip(&ctx, addr, msg)).await
            }
            None => ctx.run(transport.round_trip(ctx, addr, msg)).await,
        }
    }

    pub fn transport(&self) -> Arc<dyn RoundTripper> {
        match &self.transport {
            Some(transport) => transport.clone(),
            None => default_transport(),
        }
    }

    /// 本次请求实际可用的超时时间
    /// 取客户端超时与调用方剩余时间中的较小者，再扣除余量；客户端未配置超时返回 None
    pub fn timeout(&self, ctx: &Context) -> Option<Duration> {
        if self.timeout.is_zero() {
            return None;
        }

        let mut timeout = self.timeout;
        if let Some(remain) = ctx.remaining() {
            timeout = timeout.min(remain);
        }

        Some(timeout - self.headroom.buffer(timeout))
    }

    /// 以毫秒表示的超时，用于需要携带服务端超时字段的请求
    pub fn timeout_ms(&self, ctx: &Context) -> i32 {
        self.timeout(ctx).map(milliseconds).unwrap_or(0)
    }
}

fn milliseconds(d: Duration) -> i32 {
    d.as_millis().min(i32::MAX as u128) as i32
}
