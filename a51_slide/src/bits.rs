/// Slide A5/1: Bit Primitives
///
/// Single bits are carried as `u8` holding 0 or 1.
/// Multi-bit values are unpacked most-significant bit first.

use std::num::IntErrorKind;

use crate::error::ConfigError;

/// Majority vote of three bits: 1 iff at least two inputs are 1.
pub fn majority(a: u8, b: u8, c: u8) -> u8 {
    (a & b) | (a & c) | (b & c)
}

/// Unpack the low `width` bits of `value`, MSB first. `width` is at most 64.
pub fn value_to_bits(value: u64, width: u32) -> Vec<u8> {
    debug_assert!(width <= u64::BITS, "width {} exceeds 64 bits", width);
    (0..width)
        .map(|i| ((value >> (width - 1 - i)) & 1) as u8)
        .collect()
}

/// Reject values that need more than `width` bits.
pub fn check_width(field: &'static str, value: u64, width: u32) -> Result<(), ConfigError> {
    if width < 64 && value >> width != 0 {
        return Err(ConfigError::ValueTooWide { field, value, width });
    }
    Ok(())
}

/// Parse a hex string, with or without a `0x`/`0X` prefix.
///
/// Non-hex input is `InvalidHex`. Well-formed hex that overflows `u64`
/// is `ValueTooWide`, reported with the saturated value.
pub fn parse_hex(field: &'static str, text: &str) -> Result<u64, ConfigError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidHex {
            field,
            input: text.to_string(),
        });
    }
    u64::from_str_radix(digits, 16).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => ConfigError::ValueTooWide {
            field,
            value: u64::MAX,
            width: u64::BITS,
        },
        _ => ConfigError::InvalidHex {
            field,
            input: text.to_string(),
        },
    })
}

/// Concatenate bits as '0'/'1' characters.
pub fn bits_to_string(bits: &[u8]) -> String {
    bits.iter().map(|b| if *b == 0 { '0' } else { '1' }).collect()
}
