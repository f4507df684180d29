use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of a string
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stable id for a (symbol, language) file record.
///
/// The composite is hashed so the id stays a flat, key-safe token no matter
/// what characters the symbol contains.
pub fn file_record_id(symbol: &str, language: &str) -> String {
    compute_hash(&format!("{symbol} {language}"))
}
