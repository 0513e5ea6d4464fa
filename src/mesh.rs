use std::collections::HashMap;

use bevy::prelude::*;

use crate::types::{Point, Vector};

/// Colour given to every vertex unless configured otherwise.
pub const DEFAULT_COLOR: [f32; 4] = [0.7, 0.7, 0.7, 1.0];

/// A grid edge, identified by the flat indices of its two endpoints, smaller first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(usize, usize);

impl EdgeKey {
    /// Canonicalizes the unordered pair `(a, b)`.
    ///
    /// # Panics
    /// Panics if `a == b`; a surface vertex always lies between two distinct grid points.
    pub fn new(a: usize, b: usize) -> Self {
        assert_ne!(a, b, "edge endpoints must be distinct grid points");
        if a < b { Self(a, b) } else { Self(b, a) }
    }

    pub fn endpoints(&self) -> (usize, usize) {
        (self.0, self.1)
    }
}

/// What a surface vertex is welded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum VertexKey {
    /// Interpolated strictly between two grid points.
    Edge(EdgeKey),
    /// A grid point whose sample equals the iso value.
    Sample(usize),
}

struct SurfaceVertex {
    position: Point,
    /// Running sum of unit face normals.
    normal: Vector,
}

/// Accumulates the output of one extraction.
///
/// Vertices live in a single growable array and are referenced by index everywhere.
/// Each vertex is welded to the grid edge it was interpolated on, so neighbouring
/// tetrahedra and cells share it instead of emitting duplicates. A vertex sitting exactly
/// on a grid point is welded to that point instead, whichever edge produced it.
///
/// ```text
/// add_vertex(p, a, b)         →  EdgeKey(a, b) known?  → existing index
///                                               else   → push, new index
/// add_sample_vertex(p, i)     →  same, keyed by grid point i
/// add_triangle(i0, i1, i2)    →  indices += [i0, i1, i2]
///                                normal[i0, i1, i2] += unit face normal
/// finalize()  →  drop unreferenced vertices, normalize every normal once  →  GeneratedMesh
/// ```
pub struct MeshBuilder {
    vertices: Vec<SurfaceVertex>,
    welded: HashMap<VertexKey, u32>,
    indices: Vec<u32>,
    color: [f32; 4],
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_COLOR)
    }
}

impl MeshBuilder {
    /// Creates an empty builder whose vertices will all get `color`.
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            vertices: Vec::new(),
            welded: HashMap::new(),
            indices: Vec::new(),
            color,
        }
    }

    /// Returns the vertex on the grid edge between `a` and `b`, creating it at
    /// `position` if the edge has not been seen yet.
    ///
    /// `position` is ignored when the edge is already known: every tetrahedron touching
    /// the edge interpolates the same two samples and gets the same point.
    ///
    /// # Panics
    /// Panics if `a == b`.
    pub fn add_vertex(&mut self, position: Point, a: usize, b: usize) -> u32 {
        self.weld(VertexKey::Edge(EdgeKey::new(a, b)), position)
    }

    /// Returns the vertex on grid point `index`, creating it at `position` if needed.
    ///
    /// Used when a sample equals the iso value: every cut edge ending at that sample
    /// then shares one vertex.
    pub fn add_sample_vertex(&mut self, position: Point, index: usize) -> u32 {
        self.weld(VertexKey::Sample(index), position)
    }

    fn weld(&mut self, key: VertexKey, position: Point) -> u32 {
        let vertices = &mut self.vertices;

        *self.welded.entry(key).or_insert_with(|| {
            vertices.push(SurfaceVertex {
                position,
                normal: Vector::zeros(),
            });
            (vertices.len() - 1) as u32
        })
    }

    /// Index of the vertex already placed on the edge between `a` and `b`, if any.
    pub fn vertex_on_edge(&self, a: usize, b: usize) -> Option<u32> {
        self.welded
            .get(&VertexKey::Edge(EdgeKey::new(a, b)))
            .copied()
    }

    /// Index of the vertex already placed on grid point `index`, if any.
    pub fn vertex_on_sample(&self, index: usize) -> Option<u32> {
        self.welded.get(&VertexKey::Sample(index)).copied()
    }

    /// Appends a triangle and adds its unit face normal to each of its vertices.
    ///
    /// The normal follows the winding: `(v1 - v0) × (v2 - v0)`.
    /// Contributions are not area-weighted.
    ///
    /// # Panics
    /// Panics if two indices are equal or any index is out of bounds.
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        assert!(
            i0 != i1 && i0 != i2 && i1 != i2,
            "triangle ({i0}, {i1}, {i2}) repeats a vertex"
        );

        self.indices.extend([i0, i1, i2]);

        let normal = self.face_normal(i0, i1, i2);
        for i in [i0, i1, i2] {
            self.vertices[i as usize].normal += normal;
        }
    }

    /// Unit normal of the triangle `(i0, i1, i2)`.
    ///
    /// Returns the zero vector if the triangle is degenerate.
    pub fn face_normal(&self, i0: u32, i1: u32, i2: u32) -> Vector {
        let a = self.position(i0);
        let b = self.position(i1);
        let c = self.position(i2);

        (b - a).cross(&(c - a)).try_normalize(0.0).unwrap_or_else(Vector::zeros)
    }

    /// Position of vertex `i`.
    pub fn position(&self, i: u32) -> Point {
        self.vertices[i as usize].position
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Normalizes the accumulated normals and materializes the render buffers.
    ///
    /// Vertices no triangle references are dropped and the indices renumbered, so every
    /// remaining vertex belongs to at least one triangle.
    pub fn finalize(self) -> GeneratedMesh {
        let mut remap = vec![None; self.vertices.len()];
        for i in &self.indices {
            remap[*i as usize] = Some(0);
        }

        let mut vertices = Vec::with_capacity(self.vertices.len());
        let mut normals = Vec::with_capacity(self.vertices.len());
        for (vertex, slot) in self.vertices.into_iter().zip(remap.iter_mut()) {
            if slot.is_none() {
                continue;
            }
            *slot = Some(vertices.len() as u32);

            let normal = vertex.normal.try_normalize(0.0).unwrap_or(vertex.normal);
            vertices.push(to_f32(&vertex.position.coords));
            normals.push(to_f32(&normal));
        }

        let indices = self
            .indices
            .iter()
            .filter_map(|i| remap[*i as usize])
            .collect();

        GeneratedMesh {
            colors: vec![self.color; vertices.len()],
            vertices,
            normals,
            indices,
            transform: Transform::IDENTITY,
        }
    }
}

fn to_f32(v: &Vector) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}

/// Render-ready output of one extraction.
///
/// Inserted on the [`Volume`](crate::volume::Volume) entity while it waits to be uploaded.
#[derive(Component, Debug, Clone, Default)]
pub struct GeneratedMesh {
    /// Vertex positions in the volume's normalized `[0, 1]³` space.
    ///
    /// These are also the 3-D texture coordinates of each vertex into the volume, so no
    /// separate texture coordinate buffer is kept.
    pub vertices: Vec<[f32; 3]>,
    /// Unit vertex normals, pointing toward increasing sample values.
    pub normals: Vec<[f32; 3]>,
    /// Per-vertex colour.
    pub colors: Vec<[f32; 4]>,
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
    /// Model transform of the source grid when extraction started, copied through
    /// unchanged. The uploaded mesh is rendered with the entity's own [`Transform`].
    pub transform: Transform,
}

impl GeneratedMesh {
    /// Attaches the source grid's frame.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterates over triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}
