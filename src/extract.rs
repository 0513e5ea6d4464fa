use tracing::{debug, warn};

use crate::{
    cell::cells,
    error::{MarchingTetrahedraError, Result},
    mesh::{DEFAULT_COLOR, GeneratedMesh, MeshBuilder},
    types::Value,
    utils::triangulate_tetrahedron,
    volume::ScalarGrid,
};

/// What to do when a cut edge cannot be interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegenerateEdgePolicy {
    /// Drop the tetrahedron and keep going. Skipped tetrahedra are counted and logged.
    #[default]
    Skip,
    /// Abort the extraction with [`MarchingTetrahedraError::DegenerateEdge`].
    Propagate,
}

/// Per-extraction options.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    pub degenerate_edges: DegenerateEdgePolicy,
    /// Colour assigned to every vertex.
    pub color: [f32; 4],
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            degenerate_edges: DegenerateEdgePolicy::default(),
            color: DEFAULT_COLOR,
        }
    }
}

/// Runs the marching tetrahedra algorithm over `grid` at `iso_val`.
///
/// Cells are visited in `(z, y, x)` order and each is split into six tetrahedra.
/// Vertices are welded by grid edge, so the result is a connected triangle mesh with
/// smooth per-vertex normals pointing toward increasing values.
///
/// ```text
/// Per cell:
/// 1. Cell::new          →  8 corner voxels (position, index, value)
/// 2. Cell::tetrahedra   →  6 tetrahedra from CELL_TETRAHEDRA
/// 3. per tetrahedron:
///    triangulate_tetrahedron  →  0..2 triangles into the MeshBuilder
/// Then:
/// 4. MeshBuilder::finalize    →  normalized normals, GeneratedMesh
/// ```
///
/// A grid with fewer than two samples along any axis produces an empty mesh.
pub fn marching_tetrahedra<G>(
    grid: &G,
    iso_val: Value,
    config: &ExtractionConfig,
) -> Result<GeneratedMesh>
where
    G: ScalarGrid + ?Sized,
{
    let mut mesh = MeshBuilder::new(config.color);
    let mut cell_count = 0_usize;
    let mut skipped = 0_usize;

    for cell in cells(grid) {
        cell_count += 1;
        for tetra in cell.tetrahedra() {
            match triangulate_tetrahedron(&tetra, iso_val, &mut mesh) {
                Ok(_) => {}
                Err(MarchingTetrahedraError::DegenerateEdge { a, b })
                    if config.degenerate_edges == DegenerateEdgePolicy::Skip =>
                {
                    debug!(a, b, "skipping tetrahedron with degenerate edge");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, iso_val, "dropped tetrahedra with degenerate edges");
    }

    debug!(
        dims = ?grid.dimensions(),
        iso_val,
        cells = cell_count,
        tetrahedra = cell_count * 6,
        skipped,
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "marching tetrahedra finished"
    );

    Ok(mesh.finalize())
}
