//! The MRG32k3a step, written once for every lane width.
//!
//! All state values are whole numbers held in `f64`. Every intermediate stays
//! below 2^53 in magnitude, so products, differences and the truncated quotient
//! are exact and `x - trunc(x / m) * m` is an exact remainder in `(-m, m)`.

use crate::engine::Lanes;

/// Modulus of the first component.
pub const M1: f64 = 4294967087.0;
/// Modulus of the second component.
pub const M2: f64 = 4294944443.0;

/// Maps the combined residue in `(0, m1]` into `(0, 1)`.
pub const SCALE: f64 = 1.0 / (M1 + 1.0);

const A12: f64 = 1403580.0;
const A13: f64 = 810728.0;
const B21: f64 = 527612.0;
const B23: f64 = 1370589.0;

const RM1: f64 = 1.0 / M1;
const RM2: f64 = 1.0 / M2;

/// Advances one stream group by one step and returns the scaled outputs.
///
/// `group` holds the six state components `[a0, a1, a2, b0, b1, b2]`, one lane
/// per stream. The two component reductions correct on `r < 0`; the combination
/// corrects on `z <= 0` so the result is never exactly zero.
///
/// # Safety
///
/// `L::available()` must hold.
#[inline(always)]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn recurrence<L: Lanes>(group: &mut [L; 6], scale: f64) -> L {
    let zero = L::splat(0.0);
    let m1 = L::splat(M1);
    let m2 = L::splat(M2);

    // component 1: x = a12 * s1 - a13 * s0
    let x = L::splat(A12).mul(group[1]).sub(L::splat(A13).mul(group[0]));
    group[0] = group[1];
    group[1] = group[2];

    let r = x.sub(x.mul(L::splat(RM1)).trunc().mul(m1));
    group[2] = r.add(r.lt(zero).and(m1));

    // component 2: x = b21 * s5 - b23 * s3
    let x = L::splat(B21).mul(group[5]).sub(L::splat(B23).mul(group[3]));
    group[3] = group[4];
    group[4] = group[5];

    let r = x.sub(x.mul(L::splat(RM2)).trunc().mul(m2));
    group[5] = r.add(r.lt(zero).and(m2));

    // combine
    let d = group[2].sub(group[5]);
    let z = d.sub(d.mul(L::splat(RM1)).trunc().mul(m1));
    let z = z.add(z.le(zero).and(m1));

    z.mul(L::splat(scale))
}

/// Scalar step on a single stream's state, for reference checks and tooling.
pub fn step(state: &mut [f64; 6]) -> f64 {
    let mut group = state.map(crate::engine::Scalar);

    // SAFETY: the scalar engine is available on every target.
    let out = unsafe { recurrence(&mut group, SCALE) };
    *state = group.map(|lane| lane.0);

    out.0
}
