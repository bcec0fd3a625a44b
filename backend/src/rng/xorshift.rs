//! xorshift64* random number generator
//!
//! Fast, high-quality PRNG with 64-bit state. Used by the extraction
//! gateway to perturb retry delays so that concurrent callers hitting
//! the same transient failure do not wake up in lockstep.
//!
//! # Determinism
//!
//! Same seed → same sequence. Jittered delays therefore stay
//! reproducible in tests, which drive the gateway with a manual clock.

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use relationship_sim_core::rng::JitterRng;
///
/// let mut rng = JitterRng::new(12345);
/// let factor = rng.jitter_factor(0.1); // [0.9, 1.1)
/// assert!(factor >= 0.9 && factor < 1.1);
/// ```
#[derive(Debug, Clone)]
pub struct JitterRng {
    /// Internal state (64-bit)
    state: u64,
}

impl JitterRng {
    /// Create a new RNG with given seed
    ///
    /// A zero seed is remapped to 1 (xorshift requires nonzero state).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u64 value
    fn next_u64(&mut self) -> u64 {
        // xorshift64* algorithm
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate random f64 in range [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next_u64();
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Multiplicative jitter factor in [1 - spread, 1 + spread)
    ///
    /// # Panics
    /// Panics if `spread` is outside [0.0, 1.0].
    pub fn jitter_factor(&mut self, spread: f64) -> f64 {
        assert!(
            (0.0..=1.0).contains(&spread),
            "spread must be within [0, 1]"
        );
        1.0 - spread + 2.0 * spread * self.next_f64()
    }
}
