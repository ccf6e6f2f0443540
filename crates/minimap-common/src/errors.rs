use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("settings file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("settings read error: {0}")]
    ReadError(String),

    #[error("settings parse error: {0}")]
    ParseError(String),

    #[error("settings write error: {0}")]
    WriteError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("connection closed: {0}")]
    ConnectionClosed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("discovery error: {0}")]
    DiscoveryError(String),

    #[error("path error: {0}")]
    PathError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MinimapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("{0}")]
    Other(String),
}
