//! Lookup tables for decomposing a cube into tetrahedra and triangulating a tetrahedron.
//!
//! Cell corners use the local index `z * 4 + y * 2 + x`:
//!
//! ```text
//!       6----7          Z
//!      /|   /|          |  Y
//!     4----5 |          | /
//!     | 2--|-3          |/
//!     |/   |/           *---X
//!     0----1
//! ```

/// The six tetrahedra of a cell, as local corner indices.
///
/// Every tetrahedron has positive orientation (signed volume `+1/6`), so one case
/// table with a fixed winding works for all of them, and together they tile the cube.
pub const CELL_TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 1, 2, 5],
    [1, 3, 2, 5],
    [3, 2, 5, 7],
    [0, 2, 4, 5],
    [6, 4, 2, 5],
    [6, 7, 5, 2],
];

/// An edge of a tetrahedron, as a pair of local vertex indices (0..4).
pub type Edge = [usize; 2];

/// Surface produced by one tetrahedron configuration.
///
/// Edges are listed in winding order. The resulting face normals point from the corners
/// below the iso value toward the corners at or above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TetraCase {
    /// All four corners on the same side.
    Empty,
    /// One corner separated from the other three.
    Triangle([Edge; 3]),
    /// Two corners on each side. The quad `[a, b, c, d]` is split along `a–c`
    /// into `(a, b, c)` and `(a, c, d)`.
    Quad([Edge; 4]),
}

impl TetraCase {
    /// Number of triangles this case emits.
    pub const fn triangle_count(&self) -> usize {
        match self {
            TetraCase::Empty => 0,
            TetraCase::Triangle(_) => 1,
            TetraCase::Quad(_) => 2,
        }
    }
}

/// Indexed by the tetrahedron state: bit `k` is set when vertex `k` is below the iso value.
///
/// Complementary states (`k`, `15 - k`) cut the same edges with the winding reversed.
/// For quads the complement is listed as `[a, d, c, b]`, keeping the diagonal `a–c`.
pub const CASE_TABLE: [TetraCase; 16] = [
    /*  0 */ TetraCase::Empty,
    /*  1 */ TetraCase::Triangle([[0, 1], [0, 2], [0, 3]]),
    /*  2 */ TetraCase::Triangle([[1, 0], [1, 3], [1, 2]]),
    /*  3 */ TetraCase::Quad([[0, 2], [0, 3], [1, 3], [1, 2]]),
    /*  4 */ TetraCase::Triangle([[2, 0], [2, 1], [2, 3]]),
    /*  5 */ TetraCase::Quad([[0, 1], [2, 1], [2, 3], [0, 3]]),
    /*  6 */ TetraCase::Quad([[1, 0], [1, 3], [2, 3], [2, 0]]),
    /*  7 */ TetraCase::Triangle([[3, 0], [3, 1], [3, 2]]),
    /*  8 */ TetraCase::Triangle([[3, 0], [3, 2], [3, 1]]),
    /*  9 */ TetraCase::Quad([[1, 0], [2, 0], [2, 3], [1, 3]]),
    /* 10 */ TetraCase::Quad([[0, 1], [0, 3], [2, 3], [2, 1]]),
    /* 11 */ TetraCase::Triangle([[2, 0], [2, 3], [2, 1]]),
    /* 12 */ TetraCase::Quad([[0, 2], [1, 2], [1, 3], [0, 3]]),
    /* 13 */ TetraCase::Triangle([[1, 0], [1, 2], [1, 3]]),
    /* 14 */ TetraCase::Triangle([[0, 1], [0, 3], [0, 2]]),
    /* 15 */ TetraCase::Empty,
];
