use crate::{
    cell::Tetrahedron,
    error::Result,
    interp::interpolate_edge,
    mesh::MeshBuilder,
    tables::{CASE_TABLE, Edge, TetraCase},
    types::{Point, Value, Vector},
};

/// Computes the tetrahedron state bitmask.
///
/// A bit is set when the vertex value is **strictly below** the iso value:
///
/// ```text
/// vertex index:  3  2  1  0
/// state bits:   [_][_][_][_]
///                         ^-- vertex 0 below?
/// ```
#[inline]
pub fn get_state(tetra: &Tetrahedron, iso_val: Value) -> usize {
    tetra
        .values()
        .iter()
        .enumerate()
        .filter(|(_, v)| **v < iso_val)
        .fold(0, |state, (i, _)| state | 1 << i)
}

/// Triangulates one tetrahedron into `mesh`.
///
/// ```text
/// 1. get_state             →  16-entry lookup key
/// 2. CASE_TABLE[state]     →  cut edges in winding order
/// 3. interpolate_edge (×N) →  surface points, all computed up front
/// 4. add_vertex (×N)       →  welded vertex indices
/// 5. add_triangle (×0..2)  →  zero-area triangles are left out
/// ```
///
/// A sample equal to `iso_val` pulls every cut edge ending on it onto one shared vertex,
/// which can collapse triangles. Those are not emitted, so the count returned may be
/// lower than the case's. If any cut edge is degenerate the error is returned before
/// anything is added to `mesh`.
pub fn triangulate_tetrahedron(
    tetra: &Tetrahedron,
    iso_val: Value,
    mesh: &mut MeshBuilder,
) -> Result<usize> {
    let case = &CASE_TABLE[get_state(tetra, iso_val)];

    let emitted = match case {
        TetraCase::Empty => 0,
        TetraCase::Triangle(edges) => {
            let [a, b, c] = surface_vertices(tetra, edges, iso_val, mesh)?;
            emit_triangle(mesh, a, b, c) as usize
        }
        TetraCase::Quad(edges) => {
            let [a, b, c, d] = surface_vertices(tetra, edges, iso_val, mesh)?;
            emit_triangle(mesh, a, b, c) as usize + emit_triangle(mesh, a, c, d) as usize
        }
    };

    Ok(emitted)
}

/// Adds the triangle unless it has collapsed to a segment or a point.
fn emit_triangle(mesh: &mut MeshBuilder, a: u32, b: u32, c: u32) -> bool {
    if a == b || b == c || a == c || mesh.face_normal(a, b, c) == Vector::zeros() {
        return false;
    }
    mesh.add_triangle(a, b, c);
    true
}

/// Interpolates every cut edge, then registers the points with `mesh`.
fn surface_vertices<const N: usize>(
    tetra: &Tetrahedron,
    edges: &[Edge; N],
    iso_val: Value,
    mesh: &mut MeshBuilder,
) -> Result<[u32; N]> {
    let mut points = [Point::origin(); N];
    for (point, [a, b]) in points.iter_mut().zip(edges) {
        *point = interpolate_edge(&tetra.voxels[*a], &tetra.voxels[*b], iso_val)?;
    }

    Ok(std::array::from_fn(|i| {
        let [a, b] = edges[i].map(|k| &tetra.voxels[k]);
        match [a, b].into_iter().find(|v| v.value == iso_val) {
            Some(on_iso) => mesh.add_sample_vertex(points[i], on_iso.index),
            None => mesh.add_vertex(points[i], a.index, b.index),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cell::Voxel,
        error::MarchingTetrahedraError,
        mesh::GeneratedMesh,
    };
    use approx::assert_relative_eq;

    /// The reference tetrahedron: origin plus the three unit axes.
    fn tetra(values: [Value; 4]) -> Tetrahedron {
        let positions = [
            Point::new(0., 0., 0.),
            Point::new(1., 0., 0.),
            Point::new(0., 1., 0.),
            Point::new(0., 0., 1.),
        ];
        Tetrahedron {
            voxels: std::array::from_fn(|i| Voxel {
                pos: positions[i],
                index: 10 + i,
                value: values[i],
            }),
        }
    }

    /// Values for `state` where below-iso vertices get `low[k]` and the rest `high[k]`.
    fn values_for(state: usize) -> [Value; 4] {
        let low = [0.1, 0.2, 0.3, 0.15];
        let high = [0.9, 0.7, 0.8, 0.85];
        std::array::from_fn(|k| if state & (1 << k) != 0 { low[k] } else { high[k] })
    }

    fn extract(values: [Value; 4]) -> (usize, GeneratedMesh) {
        let mut mesh = MeshBuilder::default();
        let count = triangulate_tetrahedron(&tetra(values), 0.5, &mut mesh).unwrap();
        (count, mesh.finalize())
    }

    fn triangle_points(mesh: &GeneratedMesh) -> Vec<[[f32; 3]; 3]> {
        mesh.triangles()
            .map(|t| t.map(|i| mesh.vertices[i as usize]))
            .collect()
    }

    fn face_normal(t: &[[f32; 3]; 3]) -> Vector {
        let [a, b, c] = t.map(|p| Point::new(p[0] as Value, p[1] as Value, p[2] as Value));
        (b - a).cross(&(c - a))
    }

    #[test]
    fn state_sets_bit_for_each_vertex_below() {
        assert_eq!(get_state(&tetra([1., 1., 1., 1.]), 0.5), 0);
        assert_eq!(get_state(&tetra([0., 1., 1., 1.]), 0.5), 1);
        assert_eq!(get_state(&tetra([1., 0., 0., 1.]), 0.5), 6);
        assert_eq!(get_state(&tetra([0., 0., 0., 0.]), 0.5), 15);
        // equal to iso is not below
        assert_eq!(get_state(&tetra([0.5, 0.5, 0.5, 0.4]), 0.5), 8);
    }

    #[test]
    fn uniform_tetrahedra_emit_nothing() {
        for values in [[0.; 4], [1.; 4]] {
            let (count, mesh) = extract(values);
            assert_eq!(count, 0);
            assert_eq!(mesh.vertex_count(), 0);
        }
    }

    #[test]
    fn triangle_count_matches_case() {
        for state in 0..16 {
            let (count, mesh) = extract(values_for(state));
            let expected = match (state as u32).count_ones() {
                0 | 4 => 0,
                1 | 3 => 1,
                _ => 2,
            };
            assert_eq!(count, expected, "state {state}");
            assert_eq!(mesh.triangle_count(), expected);
            assert_eq!(mesh.vertex_count(), [0, 3, 4][expected]);
        }
    }

    #[test]
    fn normals_point_toward_higher_values() {
        for state in 1..15 {
            let values = values_for(state);
            let (_, mesh) = extract(values);

            // From the centroid of the low corners to the centroid of the high corners.
            let t = tetra(values);
            let centroid = |below: bool| {
                let picked: Vec<Point> = t
                    .voxels
                    .iter()
                    .filter(|v| (v.value < 0.5) == below)
                    .map(|v| v.pos)
                    .collect();
                picked.iter().fold(Vector::zeros(), |acc, p| acc + p.coords) / picked.len() as Value
            };
            let uphill = centroid(false) - centroid(true);

            for triangle in triangle_points(&mesh) {
                assert!(face_normal(&triangle).dot(&uphill) > 0.0, "state {state}");
            }
        }
    }

    #[test]
    fn complementary_states_reverse_winding() {
        for state in 1..15 {
            let values = values_for(state);
            // Reflect every value around the iso value: below becomes above and vice versa.
            let flipped = values.map(|v| 1.0 - v);

            let (_, mesh) = extract(values);
            let (_, complement) = extract(flipped);

            let reversed: Vec<[[f32; 3]; 3]> = triangle_points(&complement)
                .into_iter()
                .map(|[a, b, c]| [a, c, b])
                .collect();
            let triangles = triangle_points(&mesh);
            assert_eq!(triangles.len(), reversed.len());

            let close = |t: &[[f32; 3]; 3], u: &[[f32; 3]; 3]| {
                t.iter()
                    .flatten()
                    .zip(u.iter().flatten())
                    .all(|(a, b)| (a - b).abs() < 1e-6)
            };
            for triangle in &triangles {
                assert!(
                    reversed.iter().any(|r| close(triangle, r)),
                    "state {state}: {triangle:?} not in {reversed:?}"
                );
            }
        }
    }

    #[test]
    fn quads_are_planar_cuts_of_a_linear_field() {
        // value = x + y: the 0.5 level set is the plane x + y = 0.5
        let (_, mesh) = extract([0., 1., 1., 0.]);
        assert_eq!(mesh.triangle_count(), 2);
        for p in &mesh.vertices {
            assert_relative_eq!(p[0] + p[1], 0.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn quad_triangles_share_a_diagonal() {
        let (_, mesh) = extract(values_for(5));
        let tris: Vec<[u32; 3]> = mesh.triangles().collect();
        assert_eq!(tris[0][0], tris[1][0]);
        assert_eq!(tris[0][2], tris[1][1]);
    }

    #[test]
    fn sample_on_iso_collapses_to_one_vertex() {
        // vertex 3 sits on the iso value, the rest are below: all three cut edges
        // end on it, so the triangle collapses and nothing is emitted
        let (count, mesh) = extract([0.1, 0.2, 0.3, 0.5]);
        assert_eq!(count, 0);
        assert!(mesh.is_empty());
        assert!(mesh.vertices.is_empty());
    }

    #[test]
    fn sample_on_iso_keeps_the_remaining_triangle() {
        // state 3: vertices 0 and 1 below, 2 on the iso value, 3 above
        let mut mesh = MeshBuilder::default();
        let count = triangulate_tetrahedron(&tetra([0.1, 0.2, 0.5, 0.9]), 0.5, &mut mesh).unwrap();
        assert_eq!(count, 1);
        assert_eq!(mesh.vertex_on_sample(12), Some(0));

        let generated = mesh.finalize();
        assert_eq!(generated.vertex_count(), 3);
        assert!(generated.vertices.contains(&[0., 1., 0.]));
        for n in &generated.normals {
            assert_relative_eq!(n[0] * n[0] + n[1] * n[1] + n[2] * n[2], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn degenerate_edge_leaves_mesh_untouched() {
        let mut mesh = MeshBuilder::default();
        let result = triangulate_tetrahedron(&tetra([0., 1., Value::NAN, 1.]), 0.5, &mut mesh);

        // vertex 2 is NaN: not below, so edge 0-2 is cut and cannot be interpolated
        assert!(matches!(
            result,
            Err(MarchingTetrahedraError::DegenerateEdge { a: 10, b: 12 })
        ));
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }
}
