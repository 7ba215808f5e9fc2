//! # Scalar Engine
//!
//! One stream per "register". Available everywhere and used as the reference
//! every vector backend must agree with bit for bit.

use super::Lanes;
use crate::simd::Backend;

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(transparent)]
pub struct Scalar(pub f64);

const ALL_ONES: u64 = u64::MAX;

unsafe impl Lanes for Scalar {
    const WIDTH: usize = 1;
    const BACKEND: Backend = Backend::Scalar;
    type Output = [f64; 1];

    #[inline(always)]
    fn available() -> bool {
        true
    }

    #[inline(always)]
    unsafe fn splat(x: f64) -> Self {
        Self(x)
    }

    #[inline(always)]
    unsafe fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }

    #[inline(always)]
    unsafe fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }

    #[inline(always)]
    unsafe fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }

    #[inline(always)]
    unsafe fn trunc(self) -> Self {
        Self(self.0 as i32 as f64)
    }

    #[inline(always)]
    unsafe fn lt(self, rhs: Self) -> Self {
        Self::mask(self.0 < rhs.0)
    }

    #[inline(always)]
    unsafe fn le(self, rhs: Self) -> Self {
        Self::mask(self.0 <= rhs.0)
    }

    #[inline(always)]
    unsafe fn and(self, rhs: Self) -> Self {
        Self(f64::from_bits(self.0.to_bits() & rhs.0.to_bits()))
    }

    #[inline(always)]
    unsafe fn load(src: &[f64]) -> Self {
        Self(src[0])
    }

    #[inline(always)]
    unsafe fn store(self) -> [f64; 1] {
        [self.0]
    }
}

impl Scalar {
    #[inline(always)]
    fn mask(hit: bool) -> Self {
        Self(f64::from_bits(if hit { ALL_ONES } else { 0 }))
    }
}

#[cfg(test)]
mod scalar_tests {
    use super::*;

    #[test]
    fn test_mask_is_all_ones_or_zero() {
        unsafe {
            assert_eq!(Scalar(1.0).lt(Scalar(2.0)).0.to_bits(), u64::MAX);
            assert_eq!(Scalar(2.0).lt(Scalar(2.0)).0.to_bits(), 0);
            assert_eq!(Scalar(2.0).le(Scalar(2.0)).0.to_bits(), u64::MAX);
        }
    }

    #[test]
    fn test_masked_and_selects_constant() {
        unsafe {
            let hit = Scalar(-1.0).lt(Scalar(0.0)).and(Scalar(4294967087.0));
            let miss = Scalar(1.0).lt(Scalar(0.0)).and(Scalar(4294967087.0));

            assert_eq!(hit.0, 4294967087.0);
            assert_eq!(miss.0, 0.0);
        }
    }

    #[test]
    fn test_trunc_rounds_toward_zero() {
        unsafe {
            assert_eq!(Scalar(1.9).trunc().0, 1.0);
            assert_eq!(Scalar(-1.9).trunc().0, -1.0);
            assert_eq!(Scalar(-0.5).trunc().0, 0.0);
        }
    }
}
