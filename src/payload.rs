//! Payload generation for the blob workflows.

use bytes::Bytes;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lowest byte a generated payload contains.
pub const PAYLOAD_MIN: u8 = b'0';

/// Highest byte a generated payload contains (exclusive).
pub const PAYLOAD_MAX: u8 = b'z';

/// Produces the bytes written by a workflow.
pub trait PayloadSource: Send + Sync {
    fn generate(&self, len: usize) -> Bytes;
}

/// Printable pseudo-random bytes in `'0'..'z'`.
pub struct RandomPayload {
    rng: Mutex<StdRng>,
}

impl RandomPayload {
    /// Seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomPayload {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadSource for RandomPayload {
    fn generate(&self, len: usize) -> Bytes {
        let mut rng = self.rng.lock();
        (0..len)
            .map(|_| rng.gen_range(PAYLOAD_MIN..PAYLOAD_MAX))
            .collect::<Vec<u8>>()
            .into()
    }
}

/// Repeats a fixed pattern to the requested length.
#[derive(Debug, Clone)]
pub struct FixedPayload {
    pattern: Bytes,
}

impl FixedPayload {
    pub fn new(pattern: impl Into<Bytes>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl PayloadSource for FixedPayload {
    fn generate(&self, len: usize) -> Bytes {
        if self.pattern.is_empty() {
            return Bytes::from(vec![0u8; len]);
        }
        self.pattern.iter().copied().cycle().take(len).collect::<Vec<u8>>().into()
    }
}
