use crate::{
    cell::Voxel,
    error::{MarchingTetrahedraError, Result},
    types::{Point, Value},
};

/// Maps `s` from `range_in` onto `range_out`.
pub fn remap(s: Value, range_in: [Value; 2], range_out: [Value; 2]) -> Value {
    range_out[0] + (s - range_in[0]) * (range_out[1] - range_out[0]) / (range_in[1] - range_in[0])
}

// where iso_val sits between v0 (t = 0) and v1 (t = 1)
pub fn find_t(v0: Value, v1: Value, iso_val: Value) -> Value {
    (iso_val - v0) / (v1 - v0)
}

pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

pub fn interpolate_points(p0: Point, p1: Point, t: Value) -> Point {
    Point::new(
        lerp(p0.x, p1.x, t),
        lerp(p0.y, p1.y, t),
        lerp(p0.z, p1.z, t),
    )
}

/// Places the surface vertex on the edge between two voxels.
///
/// The endpoint with the smaller global index is always used as the origin, so every
/// tetrahedron that shares this grid edge computes a bit-identical position.
///
/// An endpoint whose value equals `iso_val` is returned as is, so the vertex lands
/// exactly on that grid point.
///
/// Returns [`MarchingTetrahedraError::DegenerateEdge`] if the interpolation factor is
/// not finite (equal endpoint values, or a NaN/infinite sample).
#[inline]
pub fn interpolate_edge(a: &Voxel, b: &Voxel, iso_val: Value) -> Result<Point> {
    let (lo, hi) = if a.index <= b.index { (a, b) } else { (b, a) };

    let t = find_t(lo.value, hi.value, iso_val);
    if !t.is_finite() {
        return Err(MarchingTetrahedraError::DegenerateEdge {
            a: lo.index,
            b: hi.index,
        });
    }

    if lo.value == iso_val {
        return Ok(lo.pos);
    }
    if hi.value == iso_val {
        return Ok(hi.pos);
    }

    Ok(interpolate_points(lo.pos, hi.pos, t))
}
