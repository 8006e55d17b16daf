//! Window creation options.

use std::path::{Component, Path, PathBuf};

use lotus_common::ConfigError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Custom protocol the engine serves bundled `root` content from.
pub const RESOURCE_SCHEME: &str = "lotus-resource";

/// URL of `index` under the bundled-content protocol.
pub fn resource_url(index: &str) -> String {
    format!("{RESOURCE_SCHEME}://localhost/{index}")
}

/// Options for creating a window.
///
/// Any field left out of a partial options object keeps its default, so
/// `{"title": "Hi"}` yields a 1024x768 resizable window titled "Hi".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowOptions {
    pub width: u32,
    pub height: u32,
    pub maximized: bool,
    pub fullscreen: bool,
    pub title: String,
    pub resizable: bool,
    /// No OS decorations; the page provides its own chrome.
    pub frameless: bool,
    pub always_on_top: bool,
    /// Let the engine restore the last saved size and position.
    pub restore_state: bool,
    pub transparent: bool,
    pub visible: bool,
    /// Directory served over `lotus-resource://`. Overrides `initial_url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Entry document under `root`.
    pub index: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_url: Option<String>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            maximized: false,
            fullscreen: false,
            title: "Lotus".into(),
            resizable: true,
            frameless: false,
            always_on_top: false,
            restore_state: true,
            transparent: false,
            visible: true,
            root: None,
            index: "index.html".into(),
            initial_url: None,
        }
    }
}

impl WindowOptions {
    /// Options that open `url` with every other field at its default.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            initial_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Options that serve `index` out of the `root` directory.
    pub fn with_root(root: impl Into<PathBuf>, index: impl Into<String>) -> Self {
        Self {
            root: Some(root.into()),
            index: index.into(),
            ..Default::default()
        }
    }

    /// Build options from a loosely-typed value.
    ///
    /// A bare string is shorthand for an initial URL; an object is merged
    /// over the defaults.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ConfigError> {
        match value {
            serde_json::Value::String(url) => Ok(Self::with_url(url)),
            serde_json::Value::Null => Ok(Self::default()),
            other => serde_json::from_value(other)
                .map_err(|e| ConfigError::InvalidOptions(e.to_string())),
        }
    }

    /// Resolve `root` against the process working directory.
    pub fn resolve(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.resolve_against(&cwd),
            Err(e) => {
                warn!(error = %e, "could not read working directory, leaving root unresolved");
                self.resolve_against(Path::new(""))
            }
        }
    }

    /// Make `root` absolute (relative to `cwd`) and point `initial_url`
    /// at its index document. Without a root the options are unchanged;
    /// an empty root counts as no root.
    pub fn resolve_against(mut self, cwd: &Path) -> Self {
        let Some(root) = self.root.take().filter(|r| !r.as_os_str().is_empty()) else {
            return self;
        };

        let root = if root.is_absolute() {
            normalize(&root)
        } else {
            warn!(
                root = %root.display(),
                "'root' path should be absolute, resolving against working directory"
            );
            normalize(&cwd.join(root))
        };

        self.root = Some(root);
        self.initial_url = Some(resource_url(&self.index));
        self
    }
}

/// Lexically drop `.` and fold `..` into its parent. Does not touch the
/// filesystem, so symlinks are not resolved.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
