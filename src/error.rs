use derive_more::{Display, From};

pub type Result<T> = core::result::Result<T, MarchingTetrahedraError>;

#[derive(Debug, Display, From)]
pub enum MarchingTetrahedraError {
    /// Interpolation along the edge between voxels `a` and `b` had no finite solution,
    /// e.g. both endpoint values are equal or one of them is NaN.
    #[display("degenerate edge between voxels {a} and {b}")]
    DegenerateEdge { a: usize, b: usize },
    #[display("invalid grid shape: {_0}")]
    #[from]
    Shape(ndarray::ShapeError),
}

impl std::error::Error for MarchingTetrahedraError {}
