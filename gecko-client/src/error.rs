use std::io;

use crate::network;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No address was given for the cluster in the request or on the client")]
    NoAddress,
    #[error("Network error: {0}")]
    Network(#[from] network::Error),
    #[error("Deadline exceeded")]
    DeadlineExceeded,
    #[error("Request cancelled")]
    Cancelled,
    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Read config error: {0}")]
    ConfigRead(#[source] io::Error),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Network(network::Error::IO(e))
    }
}
