use serde::{Deserialize, Serialize};

/// Source of choices for the workload generator.
///
/// Seeded campaigns use [`DeterministicRng`]; fuzzing feeds raw bytes through
/// [`ByteSource`].
pub trait Entropy {
    /// Next value in `[0, upper_exclusive)`; `0` when `upper_exclusive == 0`.
    fn next_bounded(&mut self, upper_exclusive: u64) -> u64;

    /// True once the source can no longer produce fresh choices.
    fn exhausted(&self) -> bool {
        false
    }

    /// Bernoulli trial with integer percent.
    fn hit_rate_percent(&mut self, percent: u8) -> bool {
        if percent == 0 {
            return false;
        }
        if percent >= 100 {
            return true;
        }
        self.next_bounded(100) < u64::from(percent)
    }

    /// Uniform index into a collection of `len` items.
    fn pick_index(&mut self, len: usize) -> usize {
        usize::try_from(self.next_bounded(len as u64)).unwrap_or(0)
    }
}

/// Tiny deterministic RNG used by the simulator.
///
/// Reproducible across platforms: the same seed always yields the same
/// workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Create a new deterministic RNG from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// Next pseudo-random `u64`.
    #[must_use]
    pub const fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state
    }
}

impl Entropy for DeterministicRng {
    fn next_bounded(&mut self, upper_exclusive: u64) -> u64 {
        if upper_exclusive == 0 {
            return 0;
        }
        // High bits of an LCG are better distributed than the low ones.
        (self.next_u64() >> 11) % upper_exclusive
    }
}

/// Entropy read from a byte slice, one byte per choice.
///
/// Once the bytes run out every choice is `0` and [`Entropy::exhausted`]
/// reports true.
#[derive(Debug, Clone)]
pub struct ByteSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteSource<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl Entropy for ByteSource<'_> {
    fn next_bounded(&mut self, upper_exclusive: u64) -> u64 {
        if upper_exclusive == 0 {
            return 0;
        }
        let Some(byte) = self.data.get(self.pos) else {
            return 0;
        };
        self.pos += 1;
        u64::from(*byte) % upper_exclusive
    }

    fn exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }
}
