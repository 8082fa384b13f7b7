pub mod atlas;
pub mod centroid;
pub mod geojson;
pub mod topojson;
pub mod trips;

pub use atlas::*;
pub use centroid::*;
pub use geojson::*;
pub use topojson::*;
pub use trips::*;
