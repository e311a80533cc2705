pub mod geodesic;
pub mod grid;
pub mod kdtree;

pub use geodesic::*;
pub use grid::RegionIndex;
pub use kdtree::KdTree;
