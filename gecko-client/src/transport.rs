//! 传输层
//! 负责把一次请求送到指定的 broker 并取回响应，连接按地址池化复用

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};

use crate::{
    network::{
        frame::{self, DEFAULT_MAX_FRAME_BYTES},
        Addr, Conn, Dialer, TcpDialer,
    },
    Context, Error,
};

const DEFAULT_MAX_IDLE_PER_ADDR: usize = 2;

/// 一次请求/响应往返
#[async_trait]
pub trait RoundTripper: Send + Sync + 'static {
    async fn round_trip(&self, ctx: &Context, addr: &Addr, msg: Bytes) -> Result<Bytes, Error>;
}

/// 默认传输实现
/// 每个连接上同一时刻只有一个请求在途，请求结束后连接放回空闲池
pub struct Transport {
    dialer: Arc<dyn Dialer>,
    idle: Mutex<HashMap<Addr, Vec<Box<dyn Conn>>>>,
    max_idle_per_addr: usize,
    max_frame_bytes: usize,
}

impl Transport {
    pub fn new(dialer: Arc<dyn Dialer>) -> Self {
        Self {
            dialer,
            idle: Mutex::new(HashMap::new()),
            max_idle_per_addr: DEFAULT_MAX_IDLE_PER_ADDR,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    pub fn with_max_idle_per_addr(mut self, n: usize) -> Self {
        self.max_idle_per_addr = n;
        self
    }

    pub fn with_max_frame_bytes(mut self, n: usize) -> Self {
        self.max_frame_bytes = n;
        self
    }

    /// 关闭所有空闲连接，正在使用中的连接不受影响
    pub fn close_idle_connections(&self) {
        let idle = std::mem::take(&mut *self.lock_idle());
        for (addr, conns) in idle {
            for conn in conns {
                if let Err(e) = conn.close() {
                    warn!("close idle conn to {} error: {}", addr, e);
                }
            }
        }
    }

    /// 空闲连接数
    pub fn idle_connections(&self) -> usize {
        self.lock_idle().values().map(Vec::len).sum()
    }

    fn lock_idle(&self) -> MutexGuard<'_, HashMap<Addr, Vec<Box<dyn Conn>>>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn get_conn(&self, ctx: &Context, addr: &Addr) -> Result<Box<dyn Conn>, Error> {
        let idle = self.pop_idle(addr);
        if let Some(conn) = idle {
            debug!("reuse idle conn to {}", addr);
            return Ok(conn);
        }
        ctx.run(self.dialer.dial(ctx, addr.network(), addr.address()))
            .await
    }

    /// 取出一个空闲连接，池空时移除该地址的条目
    fn pop_idle(&self, addr: &Addr) -> Option<Box<dyn Conn>> {
        let mut idle = self.lock_idle();
        let conns = idle.get_mut(addr)?;
        let conn = conns.pop();
        if conns.is_empty() {
            idle.remove(addr);
        }
        conn
    }

    /// 有空闲连接的地址数
    pub fn idle_addrs(&self) -> usize {
        self.lock_idle().len()
    }

    fn put_conn(&self, addr: &Addr, conn: Box<dyn Conn>) {
        let mut idle = self.lock_idle();
        let conns = idle.entry(addr.clone()).or_default();
        if conns.len() < self.max_idle_per_addr {
            conns.push(conn);
            return;
        }
        drop(idle);

        debug!("idle pool for {} is full, closing conn", addr);
        if let Err(e) = conn.close() {
            warn!("close conn to {} error: {}", addr, e);
        }
    }

    async fn exchange(&self, conn: &mut Box<dyn Conn>, msg: &[u8]) -> Result<Bytes, Error> {
        frame::write_frame(&mut **conn, msg, self.max_frame_bytes).await?;
        Ok(frame::read_frame(&mut **conn, self.max_frame_bytes).await?)
    }
}

#[async_trait]
impl RoundTripper for Transport {
    async fn round_trip(&self, ctx: &Context, addr: &Addr, msg: Bytes) -> Result<Bytes, Error> {
        let mut conn = self.get_conn(ctx, addr).await?;

        match ctx.run(self.exchange(&mut conn, &msg)).await {
            Ok(resp) => {
                self.put_conn(addr, conn);
                Ok(resp)
            }
            Err(e) => {
                // 连接状态未知，不再复用
                if let Err(close_err) = conn.close() {
                    debug!("close broken conn to {} error: {}", addr, close_err);
                }
                Err(e)
            }
        }
    }
}

static DEFAULT_TRANSPORT: OnceLock<Arc<Transport>> = OnceLock::new();

/// 进程级默认传输，首次使用时初始化，之后只读
pub fn default_transport() -> Arc<Transport> {
    DEFAULT_TRANSPORT
        .get_or_init(|| Arc::new(Transport::new(Arc::new(TcpDialer::default()))))
        .clone()
}
