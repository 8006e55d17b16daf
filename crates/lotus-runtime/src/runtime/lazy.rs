use std::fmt;

use lotus_common::{BridgeError, LotusError};
use lotus_config::RuntimeConfig;
use tracing::{error, info};

use crate::bridge::{BackendBridge, BridgeConfig, BridgeFactory, EventSink};

use super::Runtime;

type BoxedConfig = Box<dyn FnOnce() -> RuntimeConfig>;
type BoxedFactory =
    Box<dyn FnOnce(BridgeConfig, EventSink) -> Result<Box<dyn BackendBridge>, BridgeError>>;

enum Slot {
    Pending {
        config: BoxedConfig,
        factory: BoxedFactory,
    },
    /// Left behind if construction unwound.
    Initializing,
    Ready(Box<Runtime>),
    Failed(String),
}

/// A [`Runtime`] built on first use.
///
/// Construction happens at most once. If it fails, the error goes to the
/// caller that triggered it and every later caller gets
/// [`LotusError::BridgeUnavailable`]; the factory is never called again.
pub struct LazyRuntime {
    slot: Slot,
}

impl LazyRuntime {
    pub fn new(
        config: impl FnOnce() -> RuntimeConfig + 'static,
        factory: impl BridgeFactory + 'static,
    ) -> Self {
        Self {
            slot: Slot::Pending {
                config: Box::new(config),
                factory: Box::new(factory),
            },
        }
    }

    /// Lazily build with [`RuntimeConfig::discover`].
    pub fn discover(factory: impl BridgeFactory + 'static) -> Self {
        Self::new(RuntimeConfig::discover, factory)
    }

    pub fn get_or_init(&mut self) -> Result<&mut Runtime, LotusError> {
        if matches!(self.slot, Slot::Pending { .. }) {
            if let Slot::Pending { config, factory } =
                std::mem::replace(&mut self.slot, Slot::Initializing)
            {
                info!("initializing runtime");
                self.slot = match Runtime::new(config(), factory) {
                    Ok(runtime) => Slot::Ready(Box::new(runtime)),
                    Err(e) => {
                        error!(error = %e, "runtime initialization failed");
                        self.slot = Slot::Failed(e.to_string());
                        return Err(e);
                    }
                };
            }
        }

        match &mut self.slot {
            Slot::Ready(runtime) => Ok(&mut **runtime),
            Slot::Failed(reason) => Err(LotusError::BridgeUnavailable(reason.clone())),
            Slot::Pending { .. } | Slot::Initializing => Err(LotusError::BridgeUnavailable(
                "runtime initialization was interrupted".into(),
            )),
        }
    }

    /// Build the runtime now instead of on first use.
    pub fn warmup(&mut self) -> Result<(), LotusError> {
        self.get_or_init().map(|_| ())
    }

    pub fn get(&self) -> Option<&Runtime> {
        match &self.slot {
            Slot::Ready(runtime) => Some(&**runtime),
            _ => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut Runtime> {
        match &mut self.slot {
            Slot::Ready(runtime) => Some(&mut **runtime),
            _ => None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.slot, Slot::Ready(_))
    }

    /// Quit the engine if it was ever started. Never triggers construction.
    pub fn quit(&mut self) {
        if let Some(runtime) = self.get_mut() {
            runtime.quit();
        }
    }
}

impl fmt::Debug for LazyRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.slot {
            Slot::Pending { .. } => "pending",
            Slot::Initializing => "initializing",
            Slot::Ready(_) => "ready",
            Slot::Failed(_) => "failed",
        };
        f.debug_struct("LazyRuntime").field("state", &state).finish()
    }
}
