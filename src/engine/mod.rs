//! # Lane engines
//!
//! Every backend wraps one hardware register of `f64` lanes (or a bare `f64`
//! for the scalar path) and supplies the handful of lane-wise operations the
//! recurrence needs. The recurrence itself lives in [`crate::kernel`] and is
//! written once against [`Lanes`].
//!
//! Comparison results are lane masks encoded in the same register type: a lane
//! is all-ones when the predicate holds and all-zeros otherwise, so a masked
//! correction is `x + (mask & constant)`.

pub(crate) mod scalar;

#[cfg(target_arch = "x86_64")]
pub(crate) mod avx;
#[cfg(target_arch = "x86_64")]
pub(crate) mod sse2;

#[cfg(target_arch = "aarch64")]
pub(crate) mod neon;

/// Lane-wise numeric operations over `WIDTH` independent `f64` lanes.
///
/// # Safety
///
/// Implementors must be plain registers of exactly `WIDTH` `f64` values with
/// no padding (`size_of::<Self>() == WIDTH * 8`), laid out lane 0 first. The
/// state buffer reinterprets `[Self; 6]` as `6 * WIDTH` contiguous `f64`s.
///
/// Every `unsafe fn` here may only be called when [`Lanes::available`]
/// returns `true` on the running CPU.
pub unsafe trait Lanes: Copy + core::fmt::Debug + Send + Sync + 'static {
    /// Number of `f64` lanes (streams) per register.
    const WIDTH: usize;

    const BACKEND: crate::simd::Backend;

    /// Fixed size array of one output per lane.
    type Output: Copy + Default + core::fmt::Debug + PartialEq + AsRef<[f64]> + AsMut<[f64]>;

    /// Whether the running CPU supports this backend's instruction set.
    fn available() -> bool;

    unsafe fn splat(x: f64) -> Self;
    unsafe fn mul(self, rhs: Self) -> Self;
    unsafe fn sub(self, rhs: Self) -> Self;
    unsafe fn add(self, rhs: Self) -> Self;

    /// Round toward zero through a signed integer and back, per lane.
    unsafe fn trunc(self) -> Self;

    /// All-ones in lanes where `self < rhs`.
    unsafe fn lt(self, rhs: Self) -> Self;

    /// All-ones in lanes where `self <= rhs`.
    unsafe fn le(self, rhs: Self) -> Self;

    /// Bitwise AND of the raw lane bits.
    unsafe fn and(self, rhs: Self) -> Self;

    /// Unaligned load of `WIDTH` values from the front of `src`.
    unsafe fn load(src: &[f64]) -> Self;

    unsafe fn store(self) -> Self::Output;

    /// Advance one stream group by one step and return its outputs.
    ///
    /// Backends that need a target feature enabled override this so the generic
    /// kernel is compiled inside a `#[target_feature]` function.
    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn advance(group: &mut [Self; 6], scale: f64) -> Self::Output {
        crate::kernel::recurrence::<Self>(group, scale).store()
    }
}

pub use scalar::Scalar;

#[cfg(target_arch = "x86_64")]
pub use avx::Avx;
#[cfg(target_arch = "x86_64")]
pub use sse2::Sse2;

#[cfg(target_arch = "aarch64")]
pub use neon::Neon;
