pub mod cell;
pub mod error;
pub mod extract;
pub mod interp;
pub mod mesh;
pub mod plugin;
pub mod tables;
pub mod types;
pub mod utils;
pub mod volume;

pub use extract::{DegenerateEdgePolicy, ExtractionConfig, marching_tetrahedra};
pub use plugin::MarchingTetrahedraPlugin;
