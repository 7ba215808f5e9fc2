//! Exact modular arithmetic in `f64` and the fixed stream jump.
//!
//! Consecutive streams are 2^127 steps apart. The jump is the transition
//! matrix of each component raised to 2^127 (mod m), applied to the three
//! most recent values of that component.

use crate::kernel::{M1, M2};

const TWO17: f64 = 131072.0;

/// Component 1 transition matrix to the power 2^127, mod m1.
const A1P127: [[f64; 3]; 3] = [
    [2427906178.0, 3580155704.0, 949770784.0],
    [226153695.0, 1230515664.0, 3580155704.0],
    [1988835001.0, 986791581.0, 1230515664.0],
];

/// Component 2 transition matrix to the power 2^127, mod m2.
const A2P127: [[f64; 3]; 3] = [
    [1464411153.0, 277697599.0, 1610723613.0],
    [32183930.0, 1464411153.0, 1022607788.0],
    [2824425944.0, 32183930.0, 2093834863.0],
];

/// Computes `a * s mod m` exactly for whole numbers `0 <= a, s < m < 2^32`.
///
/// `a` is split at 2^17 so no intermediate exceeds 2^53.
#[inline]
pub fn mulmod(a: f64, s: f64, m: f64) -> f64 {
    // sanity check
    debug_assert!(a >= 0.0 && s >= 0.0 && a < m && s < m && m < 4294967296.0);

    let low = a % TWO17;
    let high = (a - low) / TWO17;

    let u = (high * s) % m * TWO17 + low * s;

    u % m
}

#[inline]
fn jump(matrix: &[[f64; 3]; 3], s: [f64; 3], m: f64) -> [f64; 3] {
    core::array::from_fn(|row| {
        let [c0, c1, c2] = matrix[row];
        (mulmod(s[0], c0, m) + mulmod(s[1], c1, m) + mulmod(s[2], c2, m)) % m
    })
}

/// Advances one stream's state by 2^127 steps in place.
pub fn rskip(state: &mut [f64; 6]) {
    let a = jump(&A1P127, [state[0], state[1], state[2]], M1);
    let b = jump(&A2P127, [state[3], state[4], state[5]], M2);

    state[..3].copy_from_slice(&a);
    state[3..].copy_from_slice(&b);
}

/// Initial state of logical stream `index` for `seed`: the seed replicated six
/// times, jumped `index` times.
pub fn stream_seed(seed: f64, index: usize) -> [f64; 6] {
    let mut state = [seed; 6];

    for _ in 0..index {
        rskip(&mut state);
    }

    state
}
