use crate::{
    tables::CELL_TETRAHEDRA,
    types::{Point, Value},
    volume::ScalarGrid,
};

/// One grid sample, as seen by the marching tetrahedra pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voxel {
    /// Position in normalized `[0, 1]³` space.
    pub pos: Point,
    /// Flat index of the grid point, unique per grid point. Used to key edges.
    pub index: usize,
    /// Scalar value at the grid point.
    pub value: Value,
}

/// The 8 corner samples of one grid cube, indexed `z * 4 + y * 2 + x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub voxels: [Voxel; 8],
}

/// Four samples picked out of a [`Cell`] by one row of [`CELL_TETRAHEDRA`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tetrahedron {
    pub voxels: [Voxel; 4],
}

impl Tetrahedron {
    /// Corner values in vertex order.
    pub fn values(&self) -> [Value; 4] {
        self.voxels.map(|v| v.value)
    }
}

impl Cell {
    /// Gathers the 8 corners of the cube whose minimum corner is `origin`.
    ///
    /// `position` maps a grid index to the position stored on the [`Voxel`].
    ///
    /// # Panics
    /// Panics if `origin + 1` is outside the grid on any axis.
    pub fn new<G, P>(grid: &G, origin: [usize; 3], position: &P) -> Self
    where
        G: ScalarGrid + ?Sized,
        P: Fn([usize; 3]) -> Point,
    {
        let dims = grid.dimensions();
        let [x, y, z] = origin;

        let voxels = std::array::from_fn(|corner| {
            let at = [x + (corner & 1), y + ((corner >> 1) & 1), z + (corner >> 2)];
            Voxel {
                pos: position(at),
                index: flat_index(dims, at),
                value: grid.value_at(at[0], at[1], at[2]),
            }
        });

        Self { voxels }
    }

    /// Splits the cell into its six tetrahedra, in [`CELL_TETRAHEDRA`] order.
    pub fn tetrahedra(&self) -> [Tetrahedron; 6] {
        CELL_TETRAHEDRA.map(|corners| Tetrahedron {
            voxels: corners.map(|c| self.voxels[c]),
        })
    }
}

/// Flat index of grid point `at`: `x + nx * (y + ny * z)`.
#[inline]
pub fn flat_index(dims: [usize; 3], at: [usize; 3]) -> usize {
    at[0] + dims[0] * (at[1] + dims[1] * at[2])
}

/// Maps grid point `at` into `[0, 1]³`.
///
/// Only meaningful for axes with at least two samples, which is always the case for
/// points that belong to a cell.
#[inline]
pub fn normalized_position(dims: [usize; 3], at: [usize; 3]) -> Point {
    Point::new(
        at[0] as Value / (dims[0] as Value - 1.0),
        at[1] as Value / (dims[1] as Value - 1.0),
        at[2] as Value / (dims[2] as Value - 1.0),
    )
}

/// Number of cells in a grid, zero if any axis has fewer than two samples.
pub fn cell_count(dims: [usize; 3]) -> usize {
    dims.iter().map(|d| d.saturating_sub(1)).product()
}

/// Iterates over every cell of `grid` in `(z, y, x)` order, x fastest.
///
/// Voxel positions are normalized with [`normalized_position`].
pub fn cells<G>(grid: &G) -> impl Iterator<Item = Cell> + '_
where
    G: ScalarGrid + ?Sized,
{
    let dims = grid.dimensions();
    cells_with(grid, move |at| normalized_position(dims, at))
}

/// Like [`cells`], with a custom grid index → position mapping.
pub fn cells_with<G, P>(grid: &G, position: P) -> impl Iterator<Item = Cell> + '_
where
    G: ScalarGrid + ?Sized,
    P: Fn([usize; 3]) -> Point + 'static,
{
    let [cx, cy, cz] = grid.dimensions().map(|d| d.saturating_sub(1));

    (0..cz)
        .flat_map(move |z| (0..cy).flat_map(move |y| (0..cx).map(move |x| [x, y, z])))
        .map(move |origin| Cell::new(grid, origin, &position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vector;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn unit_cell() -> Cell {
        let grid = Array3::<Value>::from_shape_fn((2, 2, 2), |(z, y, x)| (z * 4 + y * 2 + x) as Value);
        Cell::new(&grid, [0, 0, 0], &|at| normalized_position([2, 2, 2], at))
    }

    fn signed_volume(t: &Tetrahedron) -> Value {
        let [a, b, c, d] = t.voxels.map(|v| v.pos);
        (b - a).dot(&(c - a).cross(&(d - a))) / 6.0
    }

    #[test]
    fn corner_order_matches_local_index() {
        let cell = unit_cell();
        for (i, voxel) in cell.voxels.iter().enumerate() {
            assert_eq!(voxel.value, i as Value);
            assert_eq!(voxel.index, i);
            let expected = Point::new((i & 1) as Value, ((i >> 1) & 1) as Value, (i >> 2) as Value);
            assert_eq!(voxel.pos, expected);
        }
    }

    #[test]
    fn tetrahedra_follow_table() {
        let cell = unit_cell();
        for (tetra, corners) in cell.tetrahedra().iter().zip(CELL_TETRAHEDRA) {
            assert_eq!(tetra.values(), corners.map(|c| c as Value));
        }
    }

    #[test]
    fn tetrahedra_volumes_sum_to_cube() {
        let tetrahedra = unit_cell().tetrahedra();
        for t in &tetrahedra {
            assert_relative_eq!(signed_volume(t), 1.0 / 6.0, epsilon = 1e-12);
        }
        let total: Value = tetrahedra.iter().map(signed_volume).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }

    fn contains(t: &Tetrahedron, p: Point) -> bool {
        // Barycentric coordinates via the 3x3 system on edge vectors.
        let [a, b, c, d] = t.voxels.map(|v| v.pos);
        let m = nalgebra::Matrix3::from_columns(&[b - a, c - a, d - a]);
        let Some(inv) = m.try_inverse() else {
            return false;
        };
        let l: Vector = inv * (p - a);
        let eps = 1e-9;
        l.x >= -eps && l.y >= -eps && l.z >= -eps && l.x + l.y + l.z <= 1.0 + eps
    }

    #[test]
    fn interior_samples_fall_in_exactly_one_tetrahedron() {
        let tetrahedra = unit_cell().tetrahedra();
        // Irrational-ish offsets keep samples off the shared faces.
        let steps = 9;
        for i in 0..steps {
            for j in 0..steps {
                for k in 0..steps {
                    let p = Point::new(
                        (i as Value + 0.37) / steps as Value,
                        (j as Value + 0.61) / steps as Value,
                        (k as Value + 0.23) / steps as Value,
                    );
                    let hits = tetrahedra.iter().filter(|t| contains(t, p)).count();
                    assert_eq!(hits, 1, "{p:?}");
                }
            }
        }
    }

    #[test]
    fn traversal_order_is_z_y_x() {
        let grid = Array3::<Value>::zeros((3, 2, 4));
        let origins: Vec<usize> = cells(&grid).map(|c| c.voxels[0].index).collect();

        // nx = 4, ny = 2, nz = 3 -> 3 * 1 * 2 cells
        assert_eq!(origins, vec![0, 1, 2, 8, 9, 10]);
        assert_eq!(cell_count([4, 2, 3]), 6);
    }

    #[test]
    fn thin_grids_have_no_cells() {
        for shape in [(1, 4, 4), (4, 1, 4), (4, 4, 1), (0, 0, 0)] {
            let grid = Array3::<Value>::zeros(shape);
            assert_eq!(cells(&grid).count(), 0);
        }
        assert_eq!(cell_count([0, 5, 5]), 0);
    }

    #[test]
    fn positions_are_normalized() {
        let grid = Array3::<Value>::zeros((3, 5, 2));
        let last = cells(&grid).last().unwrap();
        assert_eq!(last.voxels[7].pos, Point::new(1.0, 1.0, 1.0));
        assert_eq!(last.voxels[0].pos, Point::new(0.0, 0.75, 0.5));
    }
}
