//! Renderer-side codec script loading.
//!
//! The engine injects this script into every page so the renderer can pack
//! IPC messages in the same binary format the host decodes.

use std::path::Path;

use lotus_common::ConfigError;

/// Environment variable naming the codec script file.
pub const CODEC_SOURCE_ENV: &str = "LOTUS_RENDERER_CODEC";

/// Read the codec script at `path`.
pub fn load_codec_source(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::CodecSource {
        path: path.to_path_buf(),
        source,
    })
}
