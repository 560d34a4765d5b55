/// Slide A5/1: Error Types
///
/// Configuration errors are raised before any register exists; the
/// per-cycle transition itself is total and never fails.

use thiserror::Error;

/// Rejected simulation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Key or frame value does not fit its fixed bit width.
    #[error("{field} value {value:#X} does not fit in {width} bits")]
    ValueTooWide {
        field: &'static str,
        value: u64,
        width: u32,
    },
    /// Warm-up or keystream cycle count is negative.
    #[error("{field} must be a non-negative cycle count, got {value}")]
    InvalidCycleCount { field: &'static str, value: i64 },
    /// Hex input could not be parsed.
    #[error("{field} is not a valid hex value: {input:?}")]
    InvalidHex { field: &'static str, input: String },
}

/// Failure while exporting a trace in tabular form.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_value_too_wide() {
        let err = ConfigError::ValueTooWide {
            field: "key",
            value: 0x1_0000,
            width: 16,
        };
        assert_eq!(format!("{}", err), "key value 0x10000 does not fit in 16 bits");
    }

    #[test]
    fn test_display_invalid_cycle_count() {
        let err = ConfigError::InvalidCycleCount {
            field: "warmup_cycles",
            value: -1,
        };
        assert_eq!(
            format!("{}", err),
            "warmup_cycles must be a non-negative cycle count, got -1"
        );
    }

    #[test]
    fn test_display_invalid_hex() {
        let err = ConfigError::InvalidHex {
            field: "frame",
            input: "zz".to_string(),
        };
        assert_eq!(format!("{}", err), "frame is not a valid hex value: \"zz\"");
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        let wide = ConfigError::ValueTooWide {
            field: "frame",
            value: 0x100,
            width: 8,
        };
        let count = ConfigError::InvalidCycleCount {
            field: "keystream_bits",
            value: -3,
        };
        assert_ne!(wide, count);
        assert_eq!(wide.clone(), wide);
    }
}
