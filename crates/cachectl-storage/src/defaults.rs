//! System defaults applied when a policy leaves a limit unspecified

/// Pattern of the implicit catch-all policy
pub const DEFAULT_PATTERN: &str = "^.*$";

/// Seconds a deleted entry lingers before the engine purges it (7 days)
pub const DELETE_WAIT: i64 = 60 * 60 * 24 * 7;

/// Maximum number of entries
pub const CACHE_SIZE: i64 = 1000;

/// Maximum space in bytes (10mb)
pub const CACHE_SPACE: i64 = 1024 * 1000 * 10;

/// Maximum entry age in seconds; negative means unlimited
pub const MAX_AGE: i64 = -1;
