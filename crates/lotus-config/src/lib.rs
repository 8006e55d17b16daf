//! Lotus host configuration.
//!
//! Window creation options with their documented defaults, the project
//! manifest lookup that names the application, and the runtime settings
//! handed to the backend bridge at startup. Every loader degrades to
//! defaults with a warning rather than failing startup.

pub mod codec_source;
pub mod manifest;
pub mod runtime;
pub mod schema;

pub use manifest::{resolve_app_identifier, DEFAULT_APP_IDENTIFIER, MANIFEST_FILE};
pub use runtime::RuntimeConfig;
pub use schema::{resource_url, WindowOptions, RESOURCE_SCHEME};
