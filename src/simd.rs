use crate::engine::Scalar;
use crate::{Cmrg, CmrgError, Result};
use tracing::info;

#[cfg(target_arch = "x86_64")]
use crate::engine::{Avx, Sse2};

#[cfg(target_arch = "aarch64")]
use crate::engine::Neon;

/// Engine selector.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub enum Backend {
    /// One stream per step, available everywhere
    Scalar,

    // This ISA is default on x64 (x86_64), as it's virtually available on all x86_64 CPU's
    Sse2,

    // Upgrade over SSE2 when available at runtime
    Avx,

    // Default for aarch64
    Neon,
}

impl Backend {
    pub const ALL: [Backend; 4] = [Backend::Scalar, Backend::Sse2, Backend::Avx, Backend::Neon];

    /// Widest engine the running CPU supports.
    pub fn detect() -> Backend {
        // NOTE: On x86_64 we upgrade to AVX if available, otherwise
        // treat SSE2 as baseline
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx") {
                return Backend::Avx;
            }

            Backend::Sse2
        }

        #[cfg(target_arch = "aarch64")]
        {
            if std::arch::is_aarch64_feature_detected!("neon") {
                return Backend::Neon;
            }

            Backend::Scalar
        }

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            Backend::Scalar
        }
    }

    /// Whether this engine is compiled for the target and supported by the CPU.
    pub fn is_available(self) -> bool {
        use crate::engine::Lanes;

        match self {
            Backend::Scalar => Scalar::available(),

            #[cfg(target_arch = "x86_64")]
            Backend::Sse2 => Sse2::available(),

            #[cfg(target_arch = "x86_64")]
            Backend::Avx => Avx::available(),

            #[cfg(target_arch = "aarch64")]
            Backend::Neon => Neon::available(),

            #[allow(unreachable_patterns)]
            _ => false,
        }
    }

    /// Streams per group.
    pub const fn width(self) -> usize {
        match self {
            Backend::Scalar => 1,
            Backend::Sse2 | Backend::Neon => 2,
            Backend::Avx => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Sse2 => "sse2",
            Backend::Avx => "avx",
            Backend::Neon => "neon",
        }
    }
}

impl core::fmt::Display for Backend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.pad(self.name())
    }
}

impl core::str::FromStr for Backend {
    type Err = CmrgError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();

        Backend::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CmrgError::UnknownBackend(wanted.to_owned()))
    }
}

/// Generator whose engine is chosen at runtime.
#[derive(Debug)]
pub enum AnyCmrg {
    Scalar(Cmrg<Scalar>),

    #[cfg(target_arch = "x86_64")]
    Sse2(Cmrg<Sse2>),

    #[cfg(target_arch = "x86_64")]
    Avx(Cmrg<Avx>),

    #[cfg(target_arch = "aarch64")]
    Neon(Cmrg<Neon>),
}

macro_rules! dispatch {
    ($self:expr, $rng:ident => $body:expr) => {
        match $self {
            AnyCmrg::Scalar($rng) => $body,

            #[cfg(target_arch = "x86_64")]
            AnyCmrg::Sse2($rng) => $body,

            #[cfg(target_arch = "x86_64")]
            AnyCmrg::Avx($rng) => $body,

            #[cfg(target_arch = "aarch64")]
            AnyCmrg::Neon($rng) => $body,
        }
    };
}

impl AnyCmrg {
    /// Generator on the widest engine available, see [`Backend::detect`].
    pub fn new(stream_count: usize, seed: f64) -> Result<Self> {
        Self::with_backend(Backend::detect(), stream_count, seed)
    }

    pub fn with_backend(backend: Backend, stream_count: usize, seed: f64) -> Result<Self> {
        let rng = match backend {
            Backend::Scalar => AnyCmrg::Scalar(Cmrg::new(stream_count, seed)?),

            #[cfg(target_arch = "x86_64")]
            Backend::Sse2 => AnyCmrg::Sse2(Cmrg::new(stream_count, seed)?),

            #[cfg(target_arch = "x86_64")]
            Backend::Avx => AnyCmrg::Avx(Cmrg::new(stream_count, seed)?),

            #[cfg(target_arch = "aarch64")]
            Backend::Neon => AnyCmrg::Neon(Cmrg::new(stream_count, seed)?),

            #[allow(unreachable_patterns)]
            other => return Err(CmrgError::Unsupported(other)),
        };

        info!(backend = %backend, width = backend.width(), streams = rng.stream_count(), "generator ready");

        Ok(rng)
    }

    /// Advances `group` by one step and writes its `width()` outputs to the
    /// front of `out`. Returns the number of values written.
    ///
    /// # Panics
    ///
    /// If `group` is out of range or `out` is shorter than `width()`.
    #[inline]
    pub fn generate_into(&mut self, group: usize, out: &mut [f64]) -> usize {
        dispatch!(self, rng => {
            let values = rng.generate(group);
            let values: &[f64] = values.as_ref();

            out[..values.len()].copy_from_slice(values);
            values.len()
        })
    }

    /// Fills `out` from one group, lanes interleaved, see
    /// [`StreamGroup::fill`](crate::StreamGroup::fill).
    pub fn fill(&mut self, group: usize, out: &mut [f64]) {
        dispatch!(self, rng => rng.group_mut(group).fill(out))
    }

    pub fn init(&mut self, stream_count: usize, seed: f64) -> Result<usize> {
        dispatch!(self, rng => rng.init(stream_count, seed))
    }

    pub fn cleanup(&mut self) {
        dispatch!(self, rng => rng.cleanup())
    }

    pub fn stream_state(&self, stream: usize) -> [f64; crate::state::STATE_LEN] {
        dispatch!(self, rng => rng.stream_state(stream))
    }

    pub fn backend(&self) -> Backend {
        dispatch!(self, rng => rng.backend())
    }

    pub fn width(&self) -> usize {
        dispatch!(self, rng => rng.width())
    }

    pub fn stream_count(&self) -> usize {
        dispatch!(self, rng => rng.stream_count())
    }

    pub fn group_count(&self) -> usize {
        dispatch!(self, rng => rng.group_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod backend_detection {
        use super::*;

        #[test]
        fn test_detected_backend_is_available() {
            let backend = Backend::detect();

            assert!(backend.is_available(), "detected {backend} must be usable");

            match backend {
                #[cfg(target_arch = "x86_64")]
                Backend::Avx | Backend::Sse2 => {}

                #[cfg(target_arch = "aarch64")]
                Backend::Neon => {}

                #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
                Backend::Scalar => {}

                _ => panic!("Unknown backend detected for platform"),
            }
        }

        #[test]
        fn test_backend_names_round_trip() {
            for b in Backend::ALL {
                assert_eq!(b.name().parse::<Backend>().expect("known name"), b);
            }

            assert_eq!(" AVX ".parse::<Backend>().expect("case insensitive"), Backend::Avx);
            assert!(matches!("mmx".parse::<Backend>(), Err(CmrgError::UnknownBackend(_))));
        }

        #[test]
        fn test_scalar_always_available() {
            assert!(Backend::Scalar.is_available());
        }
    }

    mod any_cmrg {
        use super::*;

        #[test]
        fn test_detected_generator_rounds_streams() {
            let rng = AnyCmrg::new(5, 12345.0).expect("init");
            let w = rng.width();

            assert_eq!(rng.stream_count(), (5 + w - 1) / w * w);
            assert_eq!(rng.group_count(), rng.stream_count() / w);
        }

        #[test]
        fn test_unavailable_backend_is_reported() {
            for b in Backend::ALL.into_iter().filter(|b| !b.is_available()) {
                match AnyCmrg::with_backend(b, 4, 1.0) {
                    Err(CmrgError::Unsupported(got)) => assert_eq!(got, b),
                    other => panic!("{b} should be unsupported, got {other:?}"),
                }
            }
        }

        #[test]
        fn test_generate_into_matches_scalar_streams() {
            let mut rng = AnyCmrg::new(4, 12345.0).expect("init");
            let mut reference = AnyCmrg::with_backend(Backend::Scalar, 4, 12345.0).expect("init");

            let w = rng.width();
            let mut out = [0.0; 4];
            let mut one = [0.0; 1];

            for _ in 0..3 {
                for g in 0..rng.group_count() {
                    assert_eq!(rng.generate_into(g, &mut out), w);

                    for lane in 0..w {
                        reference.generate_into(g * w + lane, &mut one);
                        assert_eq!(out[lane], one[0]);
                    }
                }
            }
        }

        #[test]
        fn test_cleanup_twice() {
            let mut rng = AnyCmrg::new(3, 3.0).expect("init");

            rng.cleanup();
            rng.cleanup();

            assert_eq!(rng.group_count(), 0);
        }
    }
}
