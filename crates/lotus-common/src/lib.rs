pub mod emitter;
pub mod errors;
pub mod id;

pub use emitter::{EventEmitter, Listener, SubscriptionId};
pub use errors::{BridgeError, ConfigError, DecodeError, LotusError};
pub use id::WindowId;

pub type Result<T> = std::result::Result<T, LotusError>;
