use std::sync::Arc;

use bevy::prelude::*;
use ndarray::Array3;
use rayon::prelude::*;

use crate::{
    cell::normalized_position,
    error::Result,
    interp::remap,
    types::{CompiledFunction, Point, Value},
};

/// Read-only access to a regular grid of scalar samples.
///
/// `dimensions` counts grid points per axis. Any dimension is tolerated; cells only
/// exist when every axis has at least two points.
pub trait ScalarGrid {
    /// Number of samples along X, Y and Z.
    fn dimensions(&self) -> [usize; 3];

    /// Sample at grid point `(x, y, z)`.
    fn value_at(&self, x: usize, y: usize, z: usize) -> Value;
}

/// Arrays are indexed `[z, y, x]`, so the shape is `(nz, ny, nx)`.
impl ScalarGrid for Array3<Value> {
    fn dimensions(&self) -> [usize; 3] {
        let (nz, ny, nx) = self.dim();
        [nx, ny, nz]
    }

    #[inline]
    fn value_at(&self, x: usize, y: usize, z: usize) -> Value {
        self[[z, y, x]]
    }
}

/// Iso value a [`Volume`] is extracted at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// Used as-is.
    Absolute(Value),
    /// Fraction of the volume's value range: `0.0` is the minimum sample, `1.0` the maximum.
    Relative(Value),
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Relative(0.5)
    }
}

impl Threshold {
    /// Resolves to an absolute iso value given the `[min, max]` range of the samples.
    ///
    /// A relative threshold on a volume with no samples resolves to its raw fraction.
    pub fn resolve(self, range: Option<[Value; 2]>) -> Value {
        match (self, range) {
            (Threshold::Absolute(iso), _) => iso,
            (Threshold::Relative(t), Some(range)) => remap(t, [0., 1.], range),
            (Threshold::Relative(t), None) => t,
        }
    }
}

/// Smallest and largest finite sample, or `None` if there are none.
pub fn value_range(values: &Array3<Value>) -> Option<[Value; 2]> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some([v, v]),
            Some([lo, hi]) => Some([lo.min(v), hi.max(v)]),
        })
}

/// A regular grid of scalar samples that produces a marching tetrahedra mesh.
///
/// The grid has `nx × ny × nz` sample points and `(nx - 1) × (ny - 1) × (nz - 1)` cells.
/// Samples are mapped into `[0, 1]³`; the entity's [`Transform`] places that unit
/// cube in the world and is passed through to the generated mesh unchanged.
///
/// Values are stored as `values[[z, y, x]]`.
///
/// `values` is wrapped in an [`Arc`] so the async extraction task can hold a reference
/// to the grid without copying it.
#[derive(Component, Clone)]
#[require(Transform)]
pub struct Volume {
    /// Scalar samples, indexed `[z, y, x]`.
    pub values: Arc<Array3<Value>>,
    /// Iso value the surface is extracted at.
    pub threshold: Threshold,
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            values: Arc::new(Array3::zeros((0, 0, 0))),
            threshold: Threshold::default(),
        }
    }
}

impl Volume {
    /// Creates a volume with `nx × ny × nz` samples, all `0.0`.
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            values: Arc::new(Array3::zeros((nz, ny, nx))),
            ..Default::default()
        }
    }

    /// Creates a volume by evaluating `function` at every sample's normalized position.
    ///
    /// Z-slabs are evaluated in parallel.
    pub fn from_fn(nx: usize, ny: usize, nz: usize, function: &CompiledFunction) -> Result<Self> {
        let dims = [nx, ny, nz];
        let slab = nx * ny;

        let mut data = vec![0.; slab * nz];
        data.par_chunks_mut(slab.max(1))
            .enumerate()
            .for_each(|(z, values)| {
                for (i, value) in values.iter_mut().enumerate() {
                    *value = function(grid_position(dims, [i % nx, i / nx, z]));
                }
            });

        let values = Array3::from_shape_vec((nz, ny, nx), data)?;
        Ok(Self {
            values: Arc::new(values),
            ..Default::default()
        })
    }

    /// Replaces the samples with a previously saved [`Arc`].
    ///
    /// Use this to respawn a volume with data retained from a prior despawn, or to share
    /// one grid between several entities extracted at different thresholds.
    pub fn with_values(mut self, values: Arc<Array3<Value>>) -> Self {
        self.values = values;
        self
    }

    /// Sets an absolute iso value.
    pub fn with_threshold(mut self, iso: Value) -> Self {
        self.threshold = Threshold::Absolute(iso);
        self
    }

    /// Sets the iso value as a fraction of the value range, see [`Threshold::Relative`].
    pub fn with_relative_threshold(mut self, t: Value) -> Self {
        self.threshold = Threshold::Relative(t);
        self
    }

    /// Returns a mutable reference to the inner samples.
    ///
    /// If the Arc is shared this will clone the data first (copy-on-write).
    pub fn values_mut(&mut self) -> &mut Array3<Value> {
        Arc::make_mut(&mut self.values)
    }

    /// Calls `f(position, &mut value)` for every sample, `position` being normalized.
    pub fn for_each_voxel<F>(&mut self, mut f: F)
    where
        F: FnMut(Point, &mut Value),
    {
        let dims = self.dimensions();
        for ((z, y, x), value) in self.values_mut().indexed_iter_mut() {
            f(grid_position(dims, [x, y, z]), value);
        }
    }

    /// Returns the sample at `(x, y, z)`.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Value {
        self.values[[z, y, x]]
    }

    /// Sets the sample at `(x, y, z)`.
    pub fn set(&mut self, x: usize, y: usize, z: usize, v: Value) {
        self.values_mut()[[z, y, x]] = v
    }

    /// See [`value_range`].
    pub fn value_range(&self) -> Option<[Value; 2]> {
        value_range(&self.values)
    }

    /// The absolute iso value this volume is extracted at.
    pub fn iso_value(&self) -> Value {
        match self.threshold {
            Threshold::Absolute(iso) => iso,
            relative => relative.resolve(self.value_range()),
        }
    }
}

impl ScalarGrid for Volume {
    fn dimensions(&self) -> [usize; 3] {
        self.values.dimensions()
    }

    #[inline]
    fn value_at(&self, x: usize, y: usize, z: usize) -> Value {
        self.get(x, y, z)
    }
}

/// Like [`normalized_position`], but a single-sample axis maps to `0.0` instead of NaN.
fn grid_position(dims: [usize; 3], at: [usize; 3]) -> Point {
    let p = normalized_position(dims, at);
    p.map(|c| if c.is_finite() { c } else { 0. })
}
