pub mod easing;
pub mod event_bus;
pub mod frame;
pub mod scheduler;
pub mod transition;

pub use easing::*;
pub use event_bus::*;
pub use frame::*;
pub use scheduler::*;
pub use transition::*;
