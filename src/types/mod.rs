pub mod value;
pub mod geometry;
pub mod dataset;

pub use value::*;
pub use geometry::*;
pub use dataset::*;
