//! # AVX Engine
//!
//! **Only for x86_64 architectures!**
//!
//! Four streams per `__m256d`. AVX is not baseline, so the generator only hands
//! out this engine after `is_x86_feature_detected!("avx")` succeeded, and the
//! kernel is instantiated inside a `#[target_feature(enable = "avx")]` entry.

use super::Lanes;
use crate::simd::Backend;
use core::arch::x86_64::*;

pub(crate) const AVX_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
pub struct Avx(__m256d);

unsafe impl Lanes for Avx {
    const WIDTH: usize = AVX_WIDTH;
    const BACKEND: Backend = Backend::Avx;
    type Output = [f64; AVX_WIDTH];

    #[inline(always)]
    fn available() -> bool {
        is_x86_feature_detected!("avx")
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn splat(x: f64) -> Self {
        Self(_mm256_set1_pd(x))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn mul(self, rhs: Self) -> Self {
        Self(_mm256_mul_pd(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn sub(self, rhs: Self) -> Self {
        Self(_mm256_sub_pd(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn add(self, rhs: Self) -> Self {
        Self(_mm256_add_pd(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn trunc(self) -> Self {
        Self(_mm256_cvtepi32_pd(_mm256_cvttpd_epi32(self.0)))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn lt(self, rhs: Self) -> Self {
        Self(_mm256_cmp_pd::<_CMP_LT_OQ>(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn le(self, rhs: Self) -> Self {
        Self(_mm256_cmp_pd::<_CMP_LE_OQ>(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn and(self, rhs: Self) -> Self {
        Self(_mm256_and_pd(self.0, rhs.0))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn load(src: &[f64]) -> Self {
        // sanity check
        debug_assert!(src.len() >= AVX_WIDTH);

        Self(_mm256_loadu_pd(src.as_ptr()))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn store(self) -> [f64; AVX_WIDTH] {
        let mut out = [0.0f64; AVX_WIDTH];
        _mm256_storeu_pd(out.as_mut_ptr(), self.0);

        out
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn advance(group: &mut [Self; 6], scale: f64) -> [f64; AVX_WIDTH] {
        advance_avx(group, scale)
    }
}

#[target_feature(enable = "avx")]
#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn advance_avx(group: &mut [Avx; 6], scale: f64) -> [f64; AVX_WIDTH] {
    crate::kernel::recurrence::<Avx>(group, scale).store()
}
