//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system resources (wall clock, randomness).
//! Enables deterministic simulation (virtual clock, seeded RNG) and
//! production use with real system resources.

/// Abstract environment providing the wall clock and randomness.
///
/// Methods are infallible except in exceptional circumstances (e.g., OS
/// entropy exhaustion, incorrect simulation setup).
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    ///
    /// Given the same seed, simulation environments produce the same
    /// sequence of bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Wall-clock time in milliseconds since the Unix epoch.
    ///
    /// Used to timestamp optimistic messages before the server assigns the
    /// authoritative creation time.
    fn wall_clock_millis(&self) -> i64;

    /// Generates a random `u64`.
    ///
    /// Convenience for correlation ids and request ids.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
