//! Tracing setup for host applications.

use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;

/// Directive applied on top of `RUST_LOG` when none is given.
pub const DEFAULT_LOG_DIRECTIVE: &str = "lotus=info";

/// Install a `fmt` subscriber filtered by `RUST_LOG` plus `directive`.
///
/// Returns `false` if a global subscriber was already installed, which
/// leaves the existing one in place.
pub fn init(directive: Option<&str>) -> bool {
    let directive = directive.unwrap_or(DEFAULT_LOG_DIRECTIVE);
    let directive = directive
        .parse::<Directive>()
        .or_else(|_| DEFAULT_LOG_DIRECTIVE.parse::<Directive>())
        .unwrap_or_else(|_| LevelFilter::INFO.into());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .try_init()
        .is_ok()
}
