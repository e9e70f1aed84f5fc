use std::{io, net::Shutdown, time::Duration};

use async_trait::async_trait;
use log::{debug, warn};
use socket2::SockRef;
use tokio::{net::TcpStream, time};

use crate::Context;

use super::{Conn, Dialer, Error};

/// 基于 tokio TcpStream 的拨号器
#[derive(Debug, Clone)]
pub struct TcpDialer {
    /// 单次建连的超时时间，与上下文截止时间取更早者
    pub connect_timeout: Option<Duration>,
    pub nodelay: bool,
}

impl Default for TcpDialer {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(10)),
            nodelay: true,
        }
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(
        &self,
        ctx: &Context,
        network: &str,
        address: &str,
    ) -> Result<Box<dyn Conn>, crate::Error> {
        match network {
            "tcp" | "tcp4" | "tcp6" => {}
            _ => return Err(Error::UnsupportedNetwork(network.to_owned()).into()),
        }

        let dial_err = |source: io::Error| Error::Dial {
            network: network.to_owned(),
            address: address.to_owned(),
            source,
        };

        let connect = async {
            let res = match self.connect_timeout {
                Some(timeout) => match time::timeout(timeout, TcpStream::connect(address)).await {
                    Ok(res) => res,
                    Err(_) => Err(io::ErrorKind::TimedOut.into()),
                },
                None => TcpStream::connect(address).await,
            };
            res.map_err(|e| crate::Error::from(dial_err(e)))
        };
        let stream = ctx.run(connect).await?;

        if self.nodelay {
            if let Err(e) = stream.set_nodelay(true) {
                warn!("set nodelay on {} error: {}", address, e);
            }
        }
        debug!("dial {}://{} success", network, address);
        Ok(Box::new(stream))
    }
}

impl Conn for TcpStream {
    /// 双向关闭 socket，文件描述符在连接被丢弃时释放
    fn close(&self) -> io::Result<()> {
        match SockRef::from(self).shutdown(Shutdown::Both) {
            // 对端已经断开
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            res => res,
        }
    }
}
