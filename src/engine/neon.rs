//! # NEON Engine
//!
//! **Only for aarch64 architectures!**
//!
//! Two streams per `float64x2_t`. NEON compare results are `uint64x2_t`; they
//! are reinterpreted back into the float register so masks share the lane type.

use super::Lanes;
use crate::simd::Backend;
use core::arch::aarch64::*;

pub(crate) const NEON_WIDTH: usize = 2;

#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
pub struct Neon(float64x2_t);

unsafe impl Lanes for Neon {
    const WIDTH: usize = NEON_WIDTH;
    const BACKEND: Backend = Backend::Neon;
    type Output = [f64; NEON_WIDTH];

    #[inline(always)]
    fn available() -> bool {
        std::arch::is_aarch64_feature_detected!("neon")
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn splat(x: f64) -> Self {
        Self(vdupq_n_f64(x))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn mul(self, rhs: Self) -> Self {
        Self(vmulq_f64(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn sub(self, rhs: Self) -> Self {
        Self(vsubq_f64(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn add(self, rhs: Self) -> Self {
        Self(vaddq_f64(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn trunc(self) -> Self {
        // fcvtzs rounds toward zero; all quotients fit well inside i32 anyway
        Self(vcvtq_f64_s64(vcvtq_s64_f64(self.0)))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn lt(self, rhs: Self) -> Self {
        Self(vreinterpretq_f64_u64(vcltq_f64(self.0, rhs.0)))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn le(self, rhs: Self) -> Self {
        Self(vreinterpretq_f64_u64(vcleq_f64(self.0, rhs.0)))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn and(self, rhs: Self) -> Self {
        let bits = vandq_u64(vreinterpretq_u64_f64(self.0), vreinterpretq_u64_f64(rhs.0));
        Self(vreinterpretq_f64_u64(bits))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn load(src: &[f64]) -> Self {
        // sanity check
        debug_assert!(src.len() >= NEON_WIDTH);

        Self(vld1q_f64(src.as_ptr()))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn store(self) -> [f64; NEON_WIDTH] {
        let mut out = [0.0f64; NEON_WIDTH];
        vst1q_f64(out.as_mut_ptr(), self.0);

        out
    }
}
