//! Application identifier lookup from the project manifest.

use std::path::Path;

use lotus_common::ConfigError;
use serde::Deserialize;
use tracing::{debug, warn};

/// Manifest file looked up in the working directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Identifier used when the manifest does not provide one.
pub const DEFAULT_APP_IDENTIFIER: &str = "lotus";

/// The two manifest fields we care about. Values are kept loose so an
/// unexpected type in one field does not discard the whole manifest.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub app_id: Option<serde_json::Value>,
    #[serde(default)]
    pub name: Option<serde_json::Value>,
}

impl Manifest {
    /// `appId`, else `name`. Empty strings count as absent.
    pub fn identifier(&self) -> Option<&str> {
        fn pick(field: &Option<serde_json::Value>) -> Option<&str> {
            field
                .as_ref()
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.is_empty())
        }
        pick(&self.app_id).or_else(|| pick(&self.name))
    }
}

/// Read the manifest in `dir`. `Ok(None)` when there is no manifest.
pub fn load_manifest(dir: &Path) -> Result<Option<Manifest>, ConfigError> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::ManifestRead {
        path: path.clone(),
        source,
    })?;

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::ManifestParse(format!("{}: {e}", path.display())))
}

/// Resolve the identifier handed to the backend bridge.
///
/// Never fails: a missing, unreadable or incomplete manifest falls back to
/// [`DEFAULT_APP_IDENTIFIER`].
pub fn resolve_app_identifier(dir: &Path) -> String {
    match load_manifest(dir) {
        Ok(Some(manifest)) => match manifest.identifier() {
            Some(id) => id.to_string(),
            None => {
                debug!("manifest has no appId or name, using default app identifier");
                DEFAULT_APP_IDENTIFIER.to_string()
            }
        },
        Ok(None) => {
            debug!(dir = %dir.display(), "no manifest found, using default app identifier");
            DEFAULT_APP_IDENTIFIER.to_string()
        }
        Err(e) => {
            warn!("could not read manifest, using default app identifier: {e}");
            DEFAULT_APP_IDENTIFIER.to_string()
        }
    }
}
