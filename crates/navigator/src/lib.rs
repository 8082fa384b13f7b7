pub mod animator;
pub mod config;
pub mod navigator;
pub mod path;
pub mod projection;
pub mod renderer;
pub mod view;
pub mod zoom;

pub use animator::*;
pub use config::*;
pub use navigator::*;
pub use path::*;
pub use projection::*;
pub use renderer::*;
pub use view::*;
pub use zoom::*;
