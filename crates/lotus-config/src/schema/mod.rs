//! Configuration schema types.

mod window;

pub use window::{resource_url, WindowOptions, RESOURCE_SCHEME};
