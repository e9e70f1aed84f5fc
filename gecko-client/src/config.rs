use std::{str::FromStr, time::Duration};

use tokio::{fs, io::AsyncReadExt};

use crate::{client::Headroom, Error};

/// 客户端配置
///
/// ```toml
/// addr = "localhost:9092"
/// timeout_ms = 5000
///
/// [headroom]
/// divisor = 4
/// max_ms = 1000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub addr: Option<String>,
    /// 为零表示不限时
    #[serde(default)]
    pub timeout_ms: u64,
    #[serde(default)]
    pub headroom: HeadroomConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct HeadroomConfig {
    #[serde(default = "default_divisor")]
    pub divisor: u32,
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

fn default_divisor() -> u32 {
    4
}

fn default_max_ms() -> u64 {
    1000
}

impl Default for HeadroomConfig {
    fn default() -> Self {
        Self {
            divisor: default_divisor(),
            max_ms: default_max_ms(),
        }
    }
}

impl From<HeadroomConfig> for Headroom {
    fn from(cfg: HeadroomConfig) -> Self {
        Headroom {
            divisor: cfg.divisor,
            max: Duration::from_millis(cfg.max_ms),
        }
    }
}

impl FromStr for ClientConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str::<ClientConfig>(s)?)
    }
}

impl ClientConfig {
    pub async fn from_path(path: &str) -> Result<Self, Error> {
        let mut file = fs::File::open(path).await.map_err(Error::ConfigRead)?;
        let mut s = String::new();
        file.read_to_string(&mut s)
            .await
            .map_err(Error::ConfigRead)?;

        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let cfg = ClientConfig::from_str(
            r#"
            addr = "localhost:9092"
            timeout_ms = 5000

            [headroom]
            divisor = 8
            max_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(cfg.addr.as_deref(), Some("localhost:9092"));
        assert_eq!(cfg.timeout_ms, 5000);
        assert_eq!(
            Headroom::from(cfg.headroom),
            Headroom {
                divisor: 8,
                max: Duration::from_millis(250)
            }
        );
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = ClientConfig::from_str("").unwrap();
        assert_eq!(cfg, ClientConfig::default());
        assert_eq!(Headroom::from(cfg.headroom), Headroom::default());
    }

    #[test]
    fn parse_via_str() {
        let cfg: ClientConfig = "timeout_ms = 250".parse().unwrap();
        assert_eq!(cfg.timeout_ms, 250);
        assert_eq!(cfg.addr, None);
    }

    #[test]
    fn invalid_config() {
        assert!(matches!(
            ClientConfig::from_str("timeout_ms = \"soon\""),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn missing_file() {
        assert!(matches!(
            ClientConfig::from_path("/nonexistent/gecko-client.toml").await,
            Err(Error::ConfigRead(_))
        ));
    }
}
