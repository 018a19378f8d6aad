//! Input size guard.
//!
//! Runs before anything else in a transcode so oversized uploads are
//! rejected without spending any decode work on them.

use thiserror::Error;

const MIB: u64 = 1024 * 1024;

/// Default input ceiling: 25 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 25 * MIB;

/// The input is larger than the configured ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("File too large. Maximum size is {limit_mib}MB.")]
pub struct SizeError {
    /// The ceiling in whole MiB (rounded up).
    pub limit_mib: u64,
    /// The rejected input length in bytes.
    pub actual_bytes: u64,
}

/// Rejects inputs above a fixed byte ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeGuard {
    max_bytes: u64,
}

impl SizeGuard {
    /// Create a guard with the given ceiling in bytes.
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// The ceiling in bytes.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Check a source buffer.
    pub fn validate(&self, source: &[u8]) -> Result<(), SizeError> {
        self.check_len(source.len() as u64)
    }

    /// Check a length. Exactly `max_bytes` is still accepted.
    pub fn check_len(&self, len: u64) -> Result<(), SizeError> {
        if len > self.max_bytes {
            return Err(SizeError {
                limit_mib: self.max_bytes.div_ceil(MIB),
                actual_bytes: len,
            });
        }
        Ok(())
    }
}

impl Default for SizeGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INPUT_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ceiling() {
        assert_eq!(SizeGuard::default().max_bytes(), 26_214_400);
    }

    #[test]
    fn test_at_limit_accepted() {
        let guard = SizeGuard::default();
        assert!(guard.check_len(DEFAULT_MAX_INPUT_BYTES).is_ok());
        assert!(guard.check_len(0).is_ok());
    }

    #[test]
    fn test_over_limit_rejected() {
        let err = SizeGuard::default()
            .check_len(DEFAULT_MAX_INPUT_BYTES + 1)
            .unwrap_err();

        assert_eq!(err.limit_mib, 25);
        assert_eq!(err.actual_bytes, DEFAULT_MAX_INPUT_BYTES + 1);
        assert_eq!(err.to_string(), "File too large. Maximum size is 25MB.");
    }

    #[test]
    fn test_validate_slice() {
        let guard = SizeGuard::new(4);
        assert!(guard.validate(&[0u8; 4]).is_ok());
        assert!(guard.validate(&[0u8; 5]).is_err());
    }

    #[test]
    fn test_limit_mib_rounds_up() {
        let err = SizeGuard::new(MIB + 1).check_len(MIB * 3).unwrap_err();
        assert_eq!(err.limit_mib, 2);
    }
}
