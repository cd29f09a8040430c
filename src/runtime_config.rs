//! Environment variable-based runtime configuration.
//!
//! ## `MICROROUTER_STACK_SIZE`
//!
//! Stack size for handler coroutines, in decimal (`16384`) or hexadecimal
//! (`0x4000`). Default: `0x4000` (16 KB). Total memory is
//! `stack_size × registered handlers`, so tune based on handler complexity.

use std::env;

/// Runtime configuration loaded from environment variables.
///
/// Load this at startup with [`RuntimeConfig::from_env()`].
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for handler coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig { stack_size: 0x4000 }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = match env::var("MICROROUTER_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(0x4000)
                } else {
                    val.parse().unwrap_or(0x4000)
                }
            }
            Err(_) => 0x4000,
        };
        RuntimeConfig { stack_size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stack_size() {
        assert_eq!(RuntimeConfig::default().stack_size, 0x4000);
    }
}
