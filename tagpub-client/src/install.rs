//! Install lookup: from one named artifact in a tag to its installer config.

use serde::Serialize;

use tagpub_core::TagKey;

use crate::error::ClientError;
use crate::registry::TagRegistry;
use crate::transport::Transport;

/// Name of the installer config stored at the root of a package repository.
pub const INSTALL_CONFIG_FILE: &str = "config.txt";

/// The installer config for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallConfig {
    pub artifact: String,
    pub repository_url: String,
    pub config_url: String,
    pub contents: String,
}

/// Look up `artifact` in the tag at `key` and fetch its repository's `config.txt`.
///
/// Returns `Ok(None)` when the tag or artifact does not exist. Artifacts
/// without a package repository (plain files) are [`ClientError::NotInstallable`].
pub fn fetch_install_config(
    registry: &TagRegistry<'_>,
    transport: &dyn Transport,
    key: &TagKey,
    artifact: &str,
) -> Result<Option<InstallConfig>, ClientError> {
    let Some(record) = registry.get_artifact(key, artifact)? else {
        return Ok(None);
    };
    let Some(repository_url) = record.repository_url() else {
        return Err(ClientError::NotInstallable {
            artifact: artifact.to_string(),
            kind: record.kind(),
        });
    };

    let config_url = format!(
        "{}/{INSTALL_CONFIG_FILE}",
        repository_url.trim_end_matches('/')
    );
    let response = transport.get(&config_url)?;
    if !response.is_success() {
        return Err(ClientError::Status {
            method: "GET",
            url: config_url,
            status: response.status,
            body: response.text(),
        });
    }

    tracing::debug!(artifact, url = %config_url, "fetched install config");
    Ok(Some(InstallConfig {
        artifact: artifact.to_string(),
        repository_url: repository_url.to_string(),
        config_url,
        contents: response.text(),
    }))
}
