pub mod great_circle;
pub mod lonlat;
pub mod quat;
pub mod rotation;
pub mod vec;

pub use great_circle::*;
pub use lonlat::*;
pub use quat::*;
pub use rotation::*;
pub use vec::*;
