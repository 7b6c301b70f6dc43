//! Production Environment using the system wall clock and the OS RNG.
//!
//! The RNG only feeds message correlation ids, so an RNG failure degrades to
//! clock-derived bytes instead of aborting the client.

use cuechat_client::Environment;
use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Production environment using the system clock and OS randomness.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        if let Err(error) = getrandom::fill(buffer) {
            tracing::warn!(%error, "OS RNG unavailable, deriving bytes from the clock");
            let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
            fill_seeded(buffer, nanos.unsigned_abs());
        }
    }

    fn wall_clock_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

fn fill_seeded(buffer: &mut [u8], seed: u64) {
    StdRng::seed_from_u64(seed).fill_bytes(buffer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_bytes_differ() {
        let env = SystemEnv::new();

        let mut first = [0u8; 32];
        let mut second = [0u8; 32];
        env.random_bytes(&mut first);
        env.random_bytes(&mut second);

        assert_ne!(first, second);
    }

    #[test]
    fn fallback_is_seeded() {
        let mut first = [0u8; 13];
        let mut second = [0u8; 13];
        fill_seeded(&mut first, 7);
        fill_seeded(&mut second, 7);

        assert_eq!(first, second);
        assert!(first.iter().filter(|&&b| b != 0).count() > 6);
    }

    #[test]
    fn wall_clock_is_after_2020() {
        assert!(SystemEnv::new().wall_clock_millis() > 1_577_836_800_000);
    }
}
