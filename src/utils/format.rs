//! Byte size helpers
//!
//! Parses human-written size limits ("2M", "512K") and formats byte counts
//! for user-facing messages.

const SIZE_UNITS: &str = "bkmgtpezy";
const DISPLAY_SUFFIXES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Parses a size such as `"8M"`, `"512k"`, `"1.5G"` or `"1024"` into bytes.
///
/// The first unit letter decides the multiplier (powers of 1024). Returns
/// `None` when no number can be read.
pub fn parse_size(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let number: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: f64 = number.parse().ok()?;

    let unit = trimmed
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .find(|c| SIZE_UNITS.contains(*c));

    let exponent = unit
        .and_then(|u| SIZE_UNITS.find(u))
        .map(|idx| idx as i32)
        .unwrap_or(0);

    Some((value * 1024f64.powi(exponent)).round() as u64)
}

/// Formats a byte count with two decimals at most, e.g. `1.5 MB`.
pub fn format_bytes(size: u64) -> String {
    let mut value = size as f64;
    let mut idx = 0;
    while value >= 1024.0 && idx < DISPLAY_SUFFIXES.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, DISPLAY_SUFFIXES[idx])
}
