//! # SSE2 Engine
//!
//! **Only for x86_64 architectures!**
//!
//! Two streams per `__m128d`. SSE2 is part of the x86_64 baseline, so this
//! engine is always available there and needs no target feature override.

use super::Lanes;
use crate::simd::Backend;
use core::arch::x86_64::*;

pub(crate) const SSE2_WIDTH: usize = 2;

#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
pub struct Sse2(__m128d);

unsafe impl Lanes for Sse2 {
    const WIDTH: usize = SSE2_WIDTH;
    const BACKEND: Backend = Backend::Sse2;
    type Output = [f64; SSE2_WIDTH];

    #[inline(always)]
    fn available() -> bool {
        is_x86_feature_detected!("sse2")
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn splat(x: f64) -> Self {
        Self(_mm_set1_pd(x))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn mul(self, rhs: Self) -> Self {
        Self(_mm_mul_pd(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn sub(self, rhs: Self) -> Self {
        Self(_mm_sub_pd(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn add(self, rhs: Self) -> Self {
        Self(_mm_add_pd(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn trunc(self) -> Self {
        // cvtt* truncates; both lanes land in the low half of the i32 register
        Self(_mm_cvtepi32_pd(_mm_cvttpd_epi32(self.0)))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn lt(self, rhs: Self) -> Self {
        Self(_mm_cmplt_pd(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn le(self, rhs: Self) -> Self {
        Self(_mm_cmple_pd(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn and(self, rhs: Self) -> Self {
        Self(_mm_and_pd(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn load(src: &[f64]) -> Self {
        // sanity check
        debug_assert!(src.len() >= SSE2_WIDTH);

        Self(_mm_loadu_pd(src.as_ptr()))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn store(self) -> [f64; SSE2_WIDTH] {
        let mut out = [0.0f64; SSE2_WIDTH];
        _mm_storeu_pd(out.as_mut_ptr(), self.0);

        out
    }
}
