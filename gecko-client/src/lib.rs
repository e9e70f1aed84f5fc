//! 一个 broker 集群客户端的连接生命周期与请求分发层
//!
//! * [`Client`] 负责为每次请求计算超时预算，并调用底层 [`RoundTripper`]
//! * [`network::ConnGroup`] 包装拨号函数，跟踪所有建立的连接，关闭时可以等待全部连接关闭

pub use client::{Client, Headroom};
pub use config::ClientConfig;
pub use context::Context;
pub use error::Error;
pub use network::{Addr, Conn, ConnGroup, Dialer, GroupConn, TcpDialer};
pub use transport::{default_transport, RoundTripper, Transport};

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod network;
mod sync;
pub mod transport;
