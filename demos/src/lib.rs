use gecko_client::ClientConfig;

/// 环境变量覆盖项，前缀 `GECKO_`
/// * GECKO_ADDR
/// * GECKO_TIMEOUT_MS
#[derive(Debug, Default, serde::Deserialize)]
pub struct EnvOverrides {
    pub addr: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self, envy::Error> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed("GECKO_").from_iter(vars)
    }

    pub fn apply(self, cfg: &mut ClientConfig) {
        if let Some(addr) = self.addr {
            cfg.addr = Some(addr);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            cfg.timeout_ms = timeout_ms;
        }
    }
}
