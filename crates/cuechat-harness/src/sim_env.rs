//! Simulated environment with a virtual clock and seeded RNG.
//!
//! Time only moves when a test advances it, and randomness is a ChaCha
//! stream, so the same seed replays the same correlation ids and timestamps.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use cuechat_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Wall clock at virtual time zero (2024-01-01T00:00:00Z).
const EPOCH_MILLIS: i64 = 1_704_067_200_000;

struct SimState {
    rng: ChaCha8Rng,
    elapsed: Duration,
}

/// Deterministic environment.
///
/// Clones share the same clock and RNG stream.
#[derive(Clone)]
pub struct SimEnv {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Environment seeded with zero.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment with a specific RNG seed.
    pub fn with_seed(seed: u64) -> Self {
        let state = SimState { rng: ChaCha8Rng::seed_from_u64(seed), elapsed: Duration::ZERO };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Move the virtual clock forward.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.elapsed = state.elapsed.saturating_add(duration);
    }

    /// Virtual time since creation.
    pub fn elapsed(&self) -> Duration {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).elapsed
    }
}

impl Environment for SimEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).rng.fill_bytes(buffer);
    }

    fn wall_clock_millis(&self) -> i64 {
        let elapsed = i64::try_from(self.elapsed().as_millis()).unwrap_or(i64::MAX);
        EPOCH_MILLIS.saturating_add(elapsed)
    }
}
