//! Rank-4 tensors indexed `(i, j, l, k)`.
//!
//! - `i`: source (upstream) turbine
//! - `j`: field point / destination turbine
//! - `l`: wind direction
//! - `k`: wind speed
//!
//! Quantities that do not vary along an axis keep that axis with length 1 and
//! broadcast against full tensors, so `ct_ilk` is stored as `(i, 1, l, k)` and
//! `D_src_il` as `(i, 1, l, 1)`.

use crate::error::{WakeError, WakeResult};
use crate::numeric::Real;
use ndarray::{Array2, Array3, Array4, Axis, Zip};

pub type Tensor = Array4<Real>;

/// Tensor of shape `(1, 1, 1, 1)`.
pub fn scalar(v: Real) -> Tensor {
    Tensor::from_elem((1, 1, 1, 1), v)
}

/// Lift an `(i, l, k)` array to `(i, 1, l, k)`.
pub fn from_ilk(a: Array3<Real>) -> Tensor {
    a.insert_axis(Axis(1))
}

/// Lift an `(i, l)` array to `(i, 1, l, 1)`.
pub fn from_il(a: Array2<Real>) -> Tensor {
    a.insert_axis(Axis(1)).insert_axis(Axis(3))
}

/// Lift an `(i, j, l)` array to `(i, j, l, 1)`.
pub fn from_ijl(a: Array3<Real>) -> Tensor {
    a.insert_axis(Axis(3))
}

/// Co-broadcast shape of several tensors (numpy rules, rank fixed at 4).
pub fn broadcast_shape(shapes: &[&[usize]]) -> WakeResult<[usize; 4]> {
    let mut out = [1usize; 4];
    for shape in shapes {
        if shape.len() != 4 {
            return Err(WakeError::ShapeMismatch {
                what: "tensor rank",
                left: out.to_vec(),
                right: shape.to_vec(),
            });
        }
        for (o, &s) in out.iter_mut().zip(shape.iter()) {
            if *o == 1 {
                *o = s;
            } else if s != 1 && s != *o {
                return Err(WakeError::ShapeMismatch {
                    what: "broadcast",
                    left: out.to_vec(),
                    right: shape.to_vec(),
                });
            }
        }
    }
    Ok(out)
}

/// Broadcast `a` to `shape` and return an owned tensor.
pub fn fix_shape(a: &Tensor, shape: [usize; 4]) -> WakeResult<Tensor> {
    a.broadcast(shape)
        .map(|view| view.to_owned())
        .ok_or_else(|| WakeError::ShapeMismatch {
            what: "fix_shape",
            left: a.shape().to_vec(),
            right: shape.to_vec(),
        })
}

pub fn map2(a: &Tensor, b: &Tensor, f: impl Fn(Real, Real) -> Real) -> WakeResult<Tensor> {
    let shape = broadcast_shape(&[a.shape(), b.shape()])?;
    let mut out = Tensor::zeros(shape);
    Zip::from(&mut out)
        .and_broadcast(a)
        .and_broadcast(b)
        .for_each(|o, &x, &y| *o = f(x, y));
    Ok(out)
}

pub fn map3(
    a: &Tensor,
    b: &Tensor,
    c: &Tensor,
    f: impl Fn(Real, Real, Real) -> Real,
) -> WakeResult<Tensor> {
    let shape = broadcast_shape(&[a.shape(), b.shape(), c.shape()])?;
    let mut out = Tensor::zeros(shape);
    Zip::from(&mut out)
        .and_broadcast(a)
        .and_broadcast(b)
        .and_broadcast(c)
        .for_each(|o, &x, &y, &z| *o = f(x, y, z));
    Ok(out)
}

pub fn map4(
    a: &Tensor,
    b: &Tensor,
    c: &Tensor,
    d: &Tensor,
    f: impl Fn(Real, Real, Real, Real) -> Real,
) -> WakeResult<Tensor> {
    let shape = broadcast_shape(&[a.shape(), b.shape(), c.shape(), d.shape()])?;
    let mut out = Tensor::zeros(shape);
    Zip::from(&mut out)
        .and_broadcast(a)
        .and_broadcast(b)
        .and_broadcast(c)
        .and_broadcast(d)
        .for_each(|o, &w, &x, &y, &z| *o = f(w, x, y, z));
    Ok(out)
}

/// `sqrt(a² + b²)`, used for the crosswind distance from its horizontal and vertical parts.
pub fn hypot(a: &Tensor, b: &Tensor) -> WakeResult<Tensor> {
    map2(a, b, Real::hypot)
}

/// Fail on the first NaN or infinite entry.
pub fn ensure_finite(t: &Tensor, what: &'static str) -> WakeResult<()> {
    match t.iter().find(|v| !v.is_finite()) {
        Some(&value) => Err(WakeError::NonFinite { what, value }),
        None => Ok(()),
    }
}

/// Split a stacked `(i, j, l, k)` tensor into one `(1, j, l, k)` tensor per source.
pub fn split_sources(stacked: &Tensor) -> Vec<Tensor> {
    stacked
        .axis_iter(Axis(0))
        .map(|slice| slice.to_owned().insert_axis(Axis(0)))
        .collect()
}

/// Stack per-source tensors along the source axis after broadcasting the
/// remaining axes to a common shape.
pub fn stack_sources(parts: &[Tensor]) -> WakeResult<Tensor> {
    let mut shape = [0usize, 1, 1, 1];
    for part in parts {
        let mut s = [1usize; 4];
        s[1..].copy_from_slice(&part.shape()[1..]);
        let merged = broadcast_shape(&[&[1, shape[1], shape[2], shape[3]], &s])?;
        shape[1..].copy_from_slice(&merged[1..]);
        shape[0] += part.len_of(Axis(0));
    }
    let owned = parts
        .iter()
        .map(|p| {
            let mut s = shape;
            s[0] = p.len_of(Axis(0));
            fix_shape(p, s)
        })
        .collect::<WakeResult<Vec<_>>>()?;
    let views: Vec<_> = owned.iter().map(|v| v.view()).collect();
    ndarray::concatenate(Axis(0), &views).map_err(|_| WakeError::ShapeMismatch {
        what: "stack_sources",
        left: shape.to_vec(),
        right: parts.first().map(|p| p.shape().to_vec()).unwrap_or_default(),
    })
}
