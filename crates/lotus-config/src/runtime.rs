//! Settings handed to the backend bridge when the runtime starts.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codec_source::{load_codec_source, CODEC_SOURCE_ENV};
use crate::manifest::{resolve_app_identifier, DEFAULT_APP_IDENTIFIER};

/// Command-line flag that turns on startup profiling.
pub const PROFILE_FLAG: &str = "--profile";

/// Environment variable that turns on startup profiling.
pub const PROFILE_ENV: &str = "LOTUS_PROFILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Log window timing milestones (ready, load status, total load time).
    pub profiling: bool,
    /// Names the app to the engine (per-app state directory, WM class).
    pub app_identifier: String,
    /// Codec script injected into rendered pages. `None` leaves the
    /// renderer without binary IPC.
    pub renderer_codec_source: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            profiling: false,
            app_identifier: DEFAULT_APP_IDENTIFIER.to_string(),
            renderer_codec_source: None,
        }
    }
}

impl RuntimeConfig {
    /// Discover settings from the current process: arguments, environment
    /// and the manifest in the working directory.
    pub fn discover() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|e| {
            warn!(error = %e, "could not read working directory");
            PathBuf::from(".")
        });
        Self::from_environment(std::env::args(), |key| std::env::var(key).ok(), &cwd)
    }

    /// Build settings from explicit inputs.
    pub fn from_environment<I, S, F>(args: I, var: F, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let profiling = args.into_iter().any(|a| a.as_ref() == PROFILE_FLAG)
            || var(PROFILE_ENV).is_some_and(|v| is_truthy(&v));

        let renderer_codec_source = var(CODEC_SOURCE_ENV).and_then(|path| {
            match load_codec_source(Path::new(&path)) {
                Ok(source) => Some(source),
                Err(e) => {
                    warn!("renderer codec unavailable, pages will not get binary IPC: {e}");
                    None
                }
            }
        });

        let config = Self {
            profiling,
            app_identifier: resolve_app_identifier(cwd),
            renderer_codec_source,
        };

        if config.profiling {
            info!(app = %config.app_identifier, "profiling enabled");
        }
        config
    }

    pub fn with_profiling(mut self, profiling: bool) -> Self {
        self.profiling = profiling;
        self
    }

    pub fn with_app_identifier(mut self, id: impl Into<String>) -> Self {
        self.app_identifier = id.into();
        self
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = RuntimeConfig::default();
        assert!(!config.profiling);
        assert_eq!(config.app_identifier, "lotus");
        assert!(config.renderer_codec_source.is_none());
    }

    #[test]
    fn profile_flag_enables_profiling() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            RuntimeConfig::from_environment(["app", "main.js", "--profile"], env(&[]), dir.path());
        assert!(config.profiling);
    }

    #[test]
    fn profile_env_enables_profiling() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            RuntimeConfig::from_environment(["app"], env(&[("LOTUS_PROFILE", "1")]), dir.path());
        assert!(config.profiling);

        let config =
            RuntimeConfig::from_environment(["app"], env(&[("LOTUS_PROFILE", "0")]), dir.path());
        assert!(!config.profiling);
    }

    #[test]
    fn app_identifier_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"name": "notes"}"#).unwrap();
        let config = RuntimeConfig::from_environment(Vec::<String>::new(), env(&[]), dir.path());
        assert_eq!(config.app_identifier, "notes");
    }

    #[test]
    fn codec_source_loaded_from_env_path() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("codec.js");
        std::fs::write(&script, "window.codec = {};").unwrap();
        let script = script.to_string_lossy().to_string();

        let config = RuntimeConfig::from_environment(
            ["app"],
            env(&[("LOTUS_RENDERER_CODEC", script.as_str())]),
            dir.path(),
        );
        assert_eq!(config.renderer_codec_source.as_deref(), Some("window.codec = {};"));
    }

    #[test]
    fn missing_codec_script_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig::from_environment(
            ["app"],
            env(&[("LOTUS_RENDERER_CODEC", "/definitely/not/here.js")]),
            dir.path(),
        );
        assert!(config.renderer_codec_source.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = RuntimeConfig::default()
            .with_profiling(true)
            .with_app_identifier("com.example.app");
        assert!(config.profiling);
        assert_eq!(config.app_identifier, "com.example.app");
    }
}
