//! Host endpoint discovery.
//!
//! The host application writes `api.json` into its roaming data directory
//! when it starts its API server:
//!
//! - Windows: `%APPDATA%\electron-spirit\api.json`
//! - macOS: `~/Library/Application Support/electron-spirit/api.json`
//! - Linux: `$XDG_DATA_HOME/electron-spirit/api.json`

use std::path::{Path, PathBuf};

use minimap_common::PlatformError;
use serde::Deserialize;

pub const HOST_APP_NAME: &str = "electron-spirit";
pub const API_FILE: &str = "api.json";

/// Where the host's API server listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HostEndpoint {
    #[serde(rename = "apiPort")]
    pub port: u16,
}

/// Path of the host discovery file.
pub fn api_file_path() -> Result<PathBuf, PlatformError> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| PlatformError::PathError("could not determine data directory".into()))?;
    Ok(data_dir.join(HOST_APP_NAME).join(API_FILE))
}

/// Parse an endpoint from a discovery file.
pub fn read_endpoint(path: &Path) -> Result<HostEndpoint, PlatformError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PlatformError::DiscoveryError(format!("failed to read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        PlatformError::DiscoveryError(format!("invalid {}: {e}", path.display()))
    })
}

/// Locate the running host.
pub fn discover() -> Result<HostEndpoint, PlatformError> {
    let path = api_file_path()?;
    let endpoint = read_endpoint(&path)?;
    tracing::debug!(path = %path.display(), port = endpoint.port, "host discovered");
    Ok(endpoint)
}
