//! Windows: lifecycle, the per-window object and the registry of live ones.

mod instance;
mod lifecycle;
mod registry;

pub use instance::Window;
pub use lifecycle::{transition, Transition, WindowState};
pub use registry::WindowRegistry;
