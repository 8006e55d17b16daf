use std::path::PathBuf;

/// Failure to turn a raw engine buffer into a decoded message.
///
/// These never reach application code: the router logs and drops them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("binary codec unavailable")]
    CodecUnavailable,

    #[error("unpack error: {0}")]
    Unpack(String),

    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("object message without an event field")]
    MissingEvent,

    #[error("unexpected message shape: {0}")]
    UnexpectedShape(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("backend bridge construction failed: {0}")]
    Construction(String),

    #[error("window creation failed: {0}")]
    WindowCreation(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("manifest read error: {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest parse error: {0}")]
    ManifestParse(String),

    #[error("invalid window options: {0}")]
    InvalidOptions(String),

    #[error("renderer codec source error: {path}: {source}")]
    CodecSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum LotusError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("serialize error: {0}")]
    Serialize(String),

    /// Bridge construction failed earlier; the runtime will not retry.
    #[error("backend bridge unavailable: {0}")]
    BridgeUnavailable(String),
}
