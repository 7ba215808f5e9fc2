//! Vectorized MRG32k3a: many independent uniform streams, advanced several at
//! a time in SIMD registers.
//!
//! Streams are grouped by the lane width `W` of the engine (1 scalar, 2 for
//! SSE2/NEON, 4 for AVX). One call to [`Cmrg::generate`] advances all `W` streams
//! of a group by one step. Stream `i` starts 2^127 steps after stream `i - 1`,
//! and for a given seed every stream yields the same sequence on every engine.
//!
//! ```
//! use vcmrg::{engine::Scalar, Cmrg};
//!
//! let mut rng = Cmrg::<Scalar>::new(3, 12345.0)?;
//! assert_eq!(rng.group_count(), 3);
//!
//! let [u] = rng.generate(0);
//! assert_eq!(u, 0.12701112204657714);
//! # Ok::<(), vcmrg::CmrgError>(())
//! ```
//!
//! [`AnyCmrg`] picks the widest engine the running CPU supports.

pub mod engine;
pub mod kernel;
pub mod simd;
pub mod skip;
pub mod state;

use engine::Lanes;
use state::{position, round_up, StateBuffer, STATE_LEN};
use tracing::{debug, trace};

pub use kernel::{M1, M2, SCALE};
pub use simd::{AnyCmrg, Backend};

/// Errors raised while setting up a generator.
#[derive(Debug, thiserror::Error)]
pub enum CmrgError {
    /// The aligned state buffer could not be allocated.
    #[error("failed to allocate state for {streams} streams")]
    Allocation { streams: usize },
    /// The seed is not a whole number in `(0, m2)`.
    #[error("invalid seed {0}: expected a whole number in (0, 4294944443)")]
    InvalidSeed(f64),
    /// The engine's instruction set is not available on this CPU.
    #[error("{0} engine is not supported on this CPU")]
    Unsupported(Backend),
    /// A backend name that doesn't match any engine.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),
}

pub type Result<T> = std::result::Result<T, CmrgError>;

/// Generator context for one engine `L`.
///
/// Owns the aligned state of every stream. Dropping it, or calling
/// [`Cmrg::cleanup`], releases the state.
pub struct Cmrg<L: Lanes> {
    state: StateBuffer<L>,
    streams: usize,
    scale: f64,
}

impl<L: Lanes> Cmrg<L> {
    /// Context with no streams.
    ///
    /// Fails with [`CmrgError::Unsupported`] when the CPU lacks `L`'s
    /// instruction set; every other method relies on this check.
    pub fn empty() -> Result<Self> {
        if !L::available() {
            return Err(CmrgError::Unsupported(L::BACKEND));
        }

        Ok(Self {
            state: StateBuffer::empty(),
            streams: 0,
            scale: SCALE,
        })
    }

    /// Context with `stream_count` streams (rounded up to the lane width).
    pub fn new(stream_count: usize, seed: f64) -> Result<Self> {
        let mut rng = Self::empty()?;
        rng.init(stream_count, seed)?;

        Ok(rng)
    }

    /// (Re)initializes the streams and returns the number of groups.
    ///
    /// Any previous state is released first. `stream_count == 0` returns `Ok(0)`
    /// without allocating. On error the context is left empty.
    pub fn init(&mut self, stream_count: usize, seed: f64) -> Result<usize> {
        self.cleanup();

        if stream_count == 0 {
            return Ok(0);
        }

        check_seed(seed)?;

        let streams = round_up(stream_count, L::WIDTH).ok_or(CmrgError::Allocation { streams: stream_count })?;

        // SAFETY: `L::available()` was checked when the context was built.
        let mut state = unsafe { StateBuffer::<L>::allocate(streams)? };
        debug!(streams, width = L::WIDTH, "allocated stream states");

        let flat = state.as_flat_mut();
        let mut seed_state = [seed; STATE_LEN];

        for stream in 0..streams {
            trace!(stream, "initialize stream");

            for (component, value) in seed_state.iter().enumerate() {
                flat[position(stream, component, L::WIDTH)] = *value;
            }

            skip::rskip(&mut seed_state);
        }

        self.state = state;
        self.streams = streams;

        debug!(streams, groups = streams / L::WIDTH, "initialized streams");

        Ok(streams / L::WIDTH)
    }

    /// Advances `group` by one step and returns one value in `(0, 1)` per lane.
    ///
    /// Lane `j` belongs to logical stream `group * W + j`.
    ///
    /// # Panics
    ///
    /// If `group >= self.group_count()`.
    #[inline(always)]
    pub fn generate(&mut self, group: usize) -> L::Output {
        let scale = self.scale;
        let state = self.state.group_mut(group);

        // SAFETY: `L::available()` was checked when the context was built.
        unsafe { L::advance(state, scale) }
    }

    /// Releases every stream. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        if self.state.len() > 0 {
            debug!(streams = self.streams, "freeing stream states");
        }

        self.state = StateBuffer::empty();
        self.streams = 0;
    }

    /// Mutable handle on one group.
    ///
    /// # Panics
    ///
    /// If `group >= self.group_count()`.
    pub fn group_mut(&mut self, group: usize) -> StreamGroup<'_, L> {
        StreamGroup {
            index: group,
            scale: self.scale,
            state: self.state.group_mut(group),
        }
    }

    /// Disjoint handles on every group, in order. Each handle can move to its
    /// own thread.
    pub fn groups_mut(&mut self) -> impl ExactSizeIterator<Item = StreamGroup<'_, L>> + '_ {
        let scale = self.scale;

        self.state
            .groups_mut()
            .enumerate()
            .map(move |(index, state)| StreamGroup { index, scale, state })
    }

    /// Current state of logical stream `stream`, `[a0, a1, a2, b0, b1, b2]`.
    ///
    /// # Panics
    ///
    /// If `stream >= self.stream_count()`.
    pub fn stream_state(&self, stream: usize) -> [f64; STATE_LEN] {
        assert!(stream < self.streams, "stream {stream} out of range (have {})", self.streams);

        let flat = self.state.as_flat();
        core::array::from_fn(|component| flat[position(stream, component, L::WIDTH)])
    }

    /// Lanes per group.
    #[inline(always)]
    pub fn width(&self) -> usize {
        L::WIDTH
    }

    /// Streams held, always a multiple of [`Cmrg::width`].
    #[inline(always)]
    pub fn stream_count(&self) -> usize {
        self.streams
    }

    #[inline(always)]
    pub fn group_count(&self) -> usize {
        self.state.len()
    }

    #[inline(always)]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline(always)]
    pub fn backend(&self) -> Backend {
        L::BACKEND
    }
}

impl<L: Lanes> core::fmt::Debug for Cmrg<L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cmrg")
            .field("backend", &L::BACKEND)
            .field("streams", &self.streams)
            .field("groups", &self.state.len())
            .finish()
    }
}

/// Exclusive handle on the `W` streams of one group.
pub struct StreamGroup<'a, L: Lanes> {
    index: usize,
    scale: f64,
    state: &'a mut [L; STATE_LEN],
}

impl<L: Lanes> StreamGroup<'_, L> {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Advances the group by one step.
    #[inline(always)]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> L::Output {
        // SAFETY: handles only come from a context whose engine is available.
        unsafe { L::advance(self.state, self.scale) }
    }

    /// Fills `out` with consecutive steps, lanes interleaved (`out[k * W + j]` is
    /// step `k` of lane `j`). A trailing partial step keeps its first lanes and
    /// drops the rest.
    pub fn fill(&mut self, out: &mut [f64]) {
        let mut chunks = out.chunks_exact_mut(L::WIDTH);

        for chunk in &mut chunks {
            chunk.copy_from_slice(self.next().as_ref());
        }

        let tail = chunks.into_remainder();

        if !tail.is_empty() {
            let step = self.next();
            tail.copy_from_slice(&step.as_ref()[..tail.len()]);
        }
    }
}

fn check_seed(seed: f64) -> Result<()> {
    if seed.is_finite() && seed > 0.0 && seed < M2 && seed.fract() == 0.0 {
        Ok(())
    } else {
        Err(CmrgError::InvalidSeed(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::Scalar;

    #[test]
    fn test_deterministic_for_same_seed() {
        let mut a = Cmrg::<Scalar>::new(4, 987654.0).expect("init");
        let mut b = Cmrg::<Scalar>::new(4, 987654.0).expect("init");

        for g in 0..4 {
            for _ in 0..16 {
                assert_eq!(a.generate(g), b.generate(g), "identical seeds must yield same sequence");
            }
        }
    }

    #[test]
    fn test_different_seeds_produce_different_sequences() {
        let mut a = Cmrg::<Scalar>::new(1, 1.0).expect("init");
        let mut b = Cmrg::<Scalar>::new(1, 2.0).expect("init");

        let seq_a: Vec<_> = (0..8).map(|_| a.generate(0)).collect();
        let seq_b: Vec<_> = (0..8).map(|_| b.generate(0)).collect();

        assert_ne!(seq_a, seq_b, "different seeds should yield distinct output");
    }

    #[test]
    fn test_zero_streams_allocates_nothing() {
        let mut rng = Cmrg::<Scalar>::empty().expect("scalar is always available");

        assert_eq!(rng.init(0, 12345.0).expect("zero streams"), 0);
        assert_eq!(rng.group_count(), 0);
        assert_eq!(rng.stream_count(), 0);
    }

    #[test]
    fn test_invalid_seeds_are_rejected() {
        for seed in [0.0, -1.0, 0.5, M2, f64::NAN, f64::INFINITY] {
            match Cmrg::<Scalar>::new(2, seed) {
                Err(CmrgError::InvalidSeed(_)) => {}
                other => panic!("seed {seed} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_failed_init_leaves_context_empty() {
        let mut rng = Cmrg::<Scalar>::new(3, 5.0).expect("init");
        assert!(rng.init(3, -5.0).is_err());

        assert_eq!(rng.group_count(), 0);
        assert_eq!(rng.stream_count(), 0);
    }

    #[test]
    fn test_reinit_replaces_previous_streams() {
        let mut rng = Cmrg::<Scalar>::new(5, 42.0).expect("init");
        rng.generate(0);

        assert_eq!(rng.init(2, 12345.0).expect("reinit"), 2);
        assert_eq!(rng.stream_state(0), [12345.0; 6]);
        assert_eq!(rng.generate(0), [0.12701112204657714]);
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let mut rng = Cmrg::<Scalar>::empty().expect("scalar is always available");
        rng.cleanup();

        rng.init(2, 7.0).expect("init");
        rng.cleanup();
        rng.cleanup();

        assert_eq!(rng.group_count(), 0);
    }

    #[test]
    #[should_panic]
    fn test_generate_out_of_range_panics() {
        let mut rng = Cmrg::<Scalar>::new(2, 7.0).expect("init");
        let _ = rng.generate(2);
    }

    #[test]
    fn test_stream_group_matches_generate() {
        let mut a = Cmrg::<Scalar>::new(2, 31337.0).expect("init");
        let mut b = Cmrg::<Scalar>::new(2, 31337.0).expect("init");

        let mut handle = a.group_mut(1);
        assert_eq!(handle.index(), 1);

        for _ in 0..8 {
            assert_eq!(handle.next(), b.generate(1));
        }
    }

    #[test]
    fn test_fill_matches_generate() {
        let mut a = Cmrg::<Scalar>::new(1, 99.0).expect("init");
        let mut b = Cmrg::<Scalar>::new(1, 99.0).expect("init");

        let mut buf = [0.0; 5];
        a.group_mut(0).fill(&mut buf);

        let want: Vec<f64> = (0..5).map(|_| b.generate(0)[0]).collect();
        assert_eq!(&buf[..], &want[..]);
    }

    #[test]
    fn test_can_move_groups_across_threads() {
        let mut rng = Cmrg::<Scalar>::new(4, 2024.0).expect("init");
        let mut reference = Cmrg::<Scalar>::new(4, 2024.0).expect("init");

        let outputs: Vec<Vec<f64>> = std::thread::scope(|s| {
            let handles: Vec<_> = rng
                .groups_mut()
                .map(|mut group| {
                    s.spawn(move || {
                        let mut out = vec![0.0; 32];
                        group.fill(&mut out);
                        out
                    })
                })
                .collect();

            handles.into_iter().map(|h| h.join().expect("thread should run successfully")).collect()
        });

        for (g, out) in outputs.iter().enumerate() {
            let want: Vec<f64> = (0..32).map(|_| reference.generate(g)[0]).collect();
            assert_eq!(out, &want);
        }
    }
}
