//! 网络层
//! 本层只关心连接的建立、读写与关闭，不包含任何协议相关逻辑

use std::{fmt, io};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

pub use conn::GroupConn;
pub use group::ConnGroup;
pub use tcp::TcpDialer;

use crate::Context;

mod conn;
pub(crate) mod frame;
mod group;
mod tcp;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Dial {network}://{address} error: {source}")]
    Dial {
        network: String,
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),
    #[error("I/O: {0}")]
    IO(#[from] io::Error),
    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),
    #[error("Connection closed by peer")]
    ConnectionAborted,
}

/// broker 地址
/// network 与 address 都是不透明字符串，原样传给拨号器
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Addr {
    network: String,
    address: String,
}

impl Addr {
    pub fn new(network: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            address: address.into(),
        }
    }

    pub fn tcp(address: impl Into<String>) -> Self {
        Self::new("tcp", address)
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.network, self.address)
    }
}

/// 底层连接
/// 读写由 AsyncRead/AsyncWrite 提供，关闭可以在共享引用上多次、并发调用
pub trait Conn: AsyncRead + AsyncWrite + Send + Sync + Unpin {
    fn close(&self) -> io::Result<()>;
}

impl<C: Conn + ?Sized> Conn for Box<C> {
    fn close(&self) -> io::Result<()> {
        (**self).close()
    }
}

/// 拨号能力，建立到指定地址的新连接
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    async fn dial(
        &self,
        ctx: &Context,
        network: &str,
        address: &str,
    ) -> Result<Box<dyn Conn>, crate::Error>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! 测试用的内存连接与拨号器

    use std::{
        io,
        pin::Pin,
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Arc,
        },
        task::{Context as TaskContext, Poll},
    };

    use async_trait::async_trait;
    use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

    use super::{Conn, Dialer};
    use crate::Context;

    #[derive(Default)]
    pub(crate) struct MockConn {
        pub(crate) closes: Arc<AtomicUsize>,
        pub(crate) fail_close: bool,
    }

    impl AsyncRead for MockConn {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for MockConn {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    impl Conn for MockConn {
        fn close(&self) -> io::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                return Err(io::Error::new(io::ErrorKind::Other, "close failed"));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct MockDialer {
        pub(crate) dials: AtomicUsize,
        pub(crate) closes: Arc<AtomicUsize>,
        pub(crate) fail_dial: AtomicBool,
        pub(crate) fail_close: bool,
    }

    #[async_trait]
    impl Dialer for MockDialer {
        async fn dial(
            &self,
            _ctx: &Context,
            network: &str,
            address: &str,
        ) -> Result<Box<dyn Conn>, crate::Error> {
            self.dials.fetch_add(1, Ordering::SeqCst);
            if self.fail_dial.load(Ordering::SeqCst) {
                return Err(super::Error::Dial {
                    network: network.to_owned(),
                    address: address.to_owned(),
                    source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
                }
                .into());
            }
            Ok(Box::new(MockConn {
                closes: self.closes.clone(),
                fail_close: self.fail_close,
            }))
        }
    }
}
