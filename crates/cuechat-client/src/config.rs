//! Session configuration.

/// Default number of simultaneously visible chat windows.
pub const DEFAULT_MAX_WINDOWS: usize = 3;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum visible chat windows. Opening one more evicts the oldest.
    pub max_windows: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_windows: DEFAULT_MAX_WINDOWS }
    }
}

impl SessionConfig {
    /// Config with a custom window capacity. Zero is raised to one.
    pub fn with_max_windows(max_windows: usize) -> Self {
        Self { max_windows: max_windows.max(1) }
    }
}
