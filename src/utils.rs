//! Helpers for working with string-encoded instruction addresses.
//!
//! Crash reports carry addresses as strings, normally `0x` prefixed hex
//! (`"0x7fff5fc01000"`). A bare digit string is read as hex as well.

use std::fmt;

/// Why an address string could not be turned into a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddrError {
    /// The frame or image carried no address at all.
    Missing,
    /// The string was empty after trimming the prefix.
    Empty,
    /// The string contained characters that are not hex digits.
    Invalid(String),
    /// The value does not fit in 64 bits.
    Overflow(String),
}

impl fmt::Display for AddrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddrError::Missing => write!(f, "no address"),
            AddrError::Empty => write!(f, "empty address"),
            AddrError::Invalid(s) => write!(f, "invalid address '{s}'"),
            AddrError::Overflow(s) => write!(f, "address '{s}' does not fit in 64 bits"),
        }
    }
}

impl std::error::Error for AddrError {}

/// Parse a hex address, with or without a `0x` prefix.
///
/// # Examples
///
/// ```
/// use stackview::utils::parse_addr;
///
/// assert_eq!(parse_addr("0x2500"), Ok(0x2500));
/// assert_eq!(parse_addr("2500"), Ok(0x2500));
/// ```
pub fn parse_addr(s: &str) -> Result<u64, AddrError> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    if digits.is_empty() {
        return Err(AddrError::Empty);
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AddrError::Invalid(s.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| AddrError::Overflow(s.to_string()))
}

/// Parse an optional address field, treating `None` as [`AddrError::Missing`].
pub fn parse_opt_addr(s: Option<&str>) -> Result<u64, AddrError> {
    s.map_or(Err(AddrError::Missing), parse_addr)
}

/// Number of hex digits needed to print `value` (at least one).
#[inline(always)]
pub const fn hex_width(value: u64) -> usize {
    if value == 0 {
        1
    } else {
        ((64 - value.leading_zeros() as usize) + 3) / 4
    }
}

/// Format `value` as `0x` followed by hex digits zero padded to `width`.
pub fn format_hex_padded(value: u64, width: usize) -> String {
    format!("{value:#0width$x}", width = width + 2)
}
