use crate::engine::Lanes;
use crate::{CmrgError, Result};

/// Number of state values per stream.
pub const STATE_LEN: usize = 6;

/// Rounds `n` streams up to a whole number of `width`-lane groups.
#[inline]
pub fn round_up(n: usize, width: usize) -> Option<usize> {
    n.checked_add(width - 1).map(|v| v / width * width)
}

/// Flat buffer position of component `component` of logical stream `stream`.
///
/// The `width` lanes of one component of one group are adjacent, so a single
/// vector load covers them. With `width == 1` this is `stream * 6 + component`.
#[inline(always)]
pub fn position(stream: usize, component: usize, width: usize) -> usize {
    stream % width + STATE_LEN * width * (stream / width) + component * width
}

/// Owned stream states, one `[L; 6]` per group.
///
/// Element alignment is the register alignment of `L`, so every group and every
/// component inside it is aligned for vector loads. Memory is released on drop.
pub(crate) struct StateBuffer<L: Lanes> {
    groups: Vec<[L; STATE_LEN]>,
}

impl<L: Lanes> StateBuffer<L> {
    pub(crate) const fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    /// Allocates room for `streams` streams (already rounded to `L::WIDTH`),
    /// zero filled.
    ///
    /// # Safety
    ///
    /// `L::available()` must hold.
    #[allow(unsafe_op_in_unsafe_fn)]
    pub(crate) unsafe fn allocate(streams: usize) -> Result<Self> {
        // sanity check
        debug_assert!(streams % L::WIDTH == 0);

        let n_groups = streams / L::WIDTH;

        // reject sizes whose byte count can't be addressed
        n_groups
            .checked_mul(core::mem::size_of::<[L; STATE_LEN]>())
            .filter(|&bytes| bytes <= isize::MAX as usize)
            .ok_or(CmrgError::Allocation { streams })?;

        let mut groups = Vec::new();
        groups
            .try_reserve_exact(n_groups)
            .map_err(|_| CmrgError::Allocation { streams })?;

        groups.resize(n_groups, [L::splat(0.0); STATE_LEN]);

        Ok(Self { groups })
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline(always)]
    pub(crate) fn group_mut(&mut self, group: usize) -> &mut [L; STATE_LEN] {
        &mut self.groups[group]
    }

    #[inline(always)]
    pub(crate) fn groups_mut(&mut self) -> core::slice::IterMut<'_, [L; STATE_LEN]> {
        self.groups.iter_mut()
    }

    /// The whole buffer as `f64`s, indexed by [`position`].
    pub(crate) fn as_flat(&self) -> &[f64] {
        // SAFETY: `Lanes` guarantees `L` is exactly `WIDTH` f64s with no padding,
        // and the Vec's storage is one contiguous allocation.
        unsafe {
            core::slice::from_raw_parts(
                self.groups.as_ptr() as *const f64,
                self.groups.len() * STATE_LEN * L::WIDTH,
            )
        }
    }

    pub(crate) fn as_flat_mut(&mut self) -> &mut [f64] {
        // SAFETY: see `as_flat`; the exclusive borrow covers the whole buffer.
        unsafe {
            core::slice::from_raw_parts_mut(
                self.groups.as_mut_ptr() as *mut f64,
                self.groups.len() * STATE_LEN * L::WIDTH,
            )
        }
    }

    #[cfg(test)]
    pub(crate) fn as_ptr(&self) -> *const [L; STATE_LEN] {
        self.groups.as_ptr()
    }
}

#[cfg(test)]
mod state_tests {
    use super::*;
    use crate::engine::Scalar;

    #[test]
    fn test_round_up_to_lane_multiple() {
        assert_eq!(round_up(0, 4), Some(0));
        assert_eq!(round_up(5, 4), Some(8));
        assert_eq!(round_up(8, 4), Some(8));
        assert_eq!(round_up(3, 2), Some(4));
        assert_eq!(round_up(7, 1), Some(7));
        assert_eq!(round_up(usize::MAX, 4), None);
    }

    #[test]
    fn test_position_degenerates_to_stream_major_for_width_one() {
        for s in 0..10 {
            for c in 0..STATE_LEN {
                assert_eq!(position(s, c, 1), s * 6 + c);
            }
        }
    }

    #[test]
    fn test_position_keeps_group_components_contiguous() {
        // group 1 of width 4 covers streams 4..8
        assert_eq!(position(4, 0, 4), 24);
        assert_eq!(position(7, 0, 4), 27);
        assert_eq!(position(4, 1, 4), 28);
        assert_eq!(position(6, 5, 4), 24 + 20 + 2);
    }

    #[test]
    fn test_position_is_a_bijection() {
        for width in [1usize, 2, 4] {
            let streams = 3 * width;
            let mut seen = vec![false; streams * STATE_LEN];

            for s in 0..streams {
                for c in 0..STATE_LEN {
                    let p = position(s, c, width);
                    assert!(!seen[p], "width {width}: slot {p} used twice");
                    seen[p] = true;
                }
            }

            assert!(seen.iter().all(|&x| x));
        }
    }

    #[test]
    fn test_flat_view_matches_groups() {
        unsafe {
            let mut buf = StateBuffer::<Scalar>::allocate(3).expect("small allocation");

            assert_eq!(buf.len(), 3);
            assert_eq!(buf.as_flat().len(), 18);

            buf.as_flat_mut()[position(2, 4, 1)] = 9.0;
            assert_eq!(buf.group_mut(2)[4].0, 9.0);
        }
    }

    #[test]
    fn test_oversized_allocation_is_rejected() {
        let streams = usize::MAX / 2;

        match unsafe { StateBuffer::<Scalar>::allocate(streams) } {
            Err(CmrgError::Allocation { streams: s }) => assert_eq!(s, streams),
            _ => panic!("expected allocation failure"),
        }
    }

    #[cfg(target_arch = "x86_64")]
    mod x86 {
        use super::*;
        use crate::engine::{Avx, Sse2};

        #[test]
        fn test_buffer_base_is_register_aligned() {
            unsafe {
                let sse = StateBuffer::<Sse2>::allocate(6).expect("small allocation");
                assert_eq!(sse.as_ptr() as usize % 16, 0);

                if Avx::available() {
                    let avx = StateBuffer::<Avx>::allocate(8).expect("small allocation");
                    assert_eq!(avx.as_ptr() as usize % 32, 0);
                }
            }
        }
    }
}
