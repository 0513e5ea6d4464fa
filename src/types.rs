use nalgebra::{Point3, Vector3};

/// Scalar field value at a grid point.
pub type Value = f64;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components.
pub type Vector = Vector3<Value>;

/// A scalar field function: maps a normalized [`Point`] in `[0, 1]³` to a [`Value`].
///
/// Return values **strictly below** the iso value are considered "inside" the surface.
pub type CompiledFunction = dyn Fn(Point) -> Value + Sync;
