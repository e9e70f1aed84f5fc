use std::{error::Error, sync::Arc, time::Duration};

use bytes::Bytes;
use clap::Parser;
use demos::EnvOverrides;
use gecko_client::{Addr, Client, ClientConfig, ConnGroup, Context, TcpDialer, Transport};
use log::{info, warn};

/// 向 broker 发送一帧请求并打印响应，然后等待所有连接关闭
#[derive(Debug, Parser)]
#[clap(name = "roundtrip")]
struct Args {
    /// toml 配置文件
    #[clap(short, long)]
    config: Option<String>,
    /// broker 地址，覆盖配置
    #[clap(short, long)]
    addr: Option<String>,
    /// 请求超时（毫秒），覆盖配置
    #[clap(long)]
    timeout_ms: Option<u64>,
    /// 关闭时等待连接全部关闭的最长时间（秒）
    #[clap(long, default_value = "10")]
    drain_secs: u64,
    payload: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")?.start()?;
    let args = Args::parse();

    // 获取配置：文件 < 环境变量 < 命令行
    let mut cfg = match &args.config {
        Some(path) => ClientConfig::from_path(path).await?,
        None => ClientConfig::default(),
    };
    EnvOverrides::from_env()?.apply(&mut cfg);
    if let Some(timeout_ms) = args.timeout_ms {
        cfg.timeout_ms = timeout_ms;
    }

    let conns = Arc::new(ConnGroup::new(TcpDialer::default()));
    let transport = Arc::new(Transport::new(conns.clone()));
    let client = Client::from_config(&cfg).with_transport(transport.clone());

    let addr = args.addr.map(Addr::tcp);
    let res = client
        .round_trip(&Context::background(), addr.as_ref(), Bytes::from(args.payload))
        .await;

    // 关闭：先关闭空闲连接，再等待其余连接关闭
    transport.close_idle_connections();
    if tokio::time::timeout(Duration::from_secs(args.drain_secs), conns.wait())
        .await
        .is_err()
    {
        warn!("{} connections still open after drain timeout", conns.pending());
    }

    let resp = res?;
    info!("response {} bytes: {:?}", resp.len(), resp);
    Ok(())
}
