mod hash;

pub use hash::{compute_hash, file_record_id};

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix under which inbound files first appear.
pub const DROP_PREFIX: &str = "Drop";

/// Prefix to which consumed metadata files are moved.
pub const PROCESSED_PREFIX: &str = "Drop/processed";

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[/\\]|\s+").unwrap());

/// Sanitize a document symbol for use as a key segment.
///
/// Path separators and whitespace runs become single underscores, so
/// `A/RES/68/1` keys the package namespace `A_RES_68_1`.
pub fn sanitize_symbol(symbol: &str) -> String {
    SEPARATORS.replace_all(symbol.trim(), "_").to_string()
}

/// Get current timestamp in ISO 8601 format
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_symbol_separators() {
        assert_eq!(sanitize_symbol("A/RES/68/1"), "A_RES_68_1");
        assert_eq!(sanitize_symbol("ST/SGB 2024  Rev.1"), "ST_SGB_2024_Rev.1");
    }

    #[test]
    fn test_sanitize_symbol_trims() {
        assert_eq!(sanitize_symbol("  A/68/100 "), "A_68_100");
    }
}
