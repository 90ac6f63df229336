use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::{ArchiveError, Result};

/// Back-reference hops the reader follows before giving up.
///
/// The writer only ever points `Reuse` records at `New` records, so one hop
/// is always enough for archives it produced.
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 1;

/// Tunables shared by archive writer and reader sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Distinct scanlines the writer remembers for reuse. Default: 4320.
    pub cache_capacity: usize,
    /// Maximum `Reuse` hops followed while resolving one scanline. Default: 1.
    pub max_reference_depth: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }
}

impl ArchiveConfig {
    /// Reject values no session can run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(ArchiveError::InvalidConfig(
                "cache_capacity must be greater than zero".to_string(),
            ));
        }
        if self.max_reference_depth == 0 {
            return Err(ArchiveError::InvalidConfig(
                "max_reference_depth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
