use sha2::{Digest, Sha256};

use crate::Category;

/// Number of normalized characters taken from each end of a record's text.
pub const FINGERPRINT_EDGE_CHARS: usize = 80;

/// Collapse runs of whitespace to a single space, trim, and lowercase.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Fallback identity derived from a record's text when the source gives no id.
pub fn fingerprint(category: Category, text: &str) -> String {
    let normalized = normalize_text(text);
    let chars: Vec<char> = normalized.chars().collect();
    let head = chars.len().min(FINGERPRINT_EDGE_CHARS);
    let prefix: String = chars[..head].iter().collect();
    let suffix: String = chars[chars.len() - head..].iter().collect();
    derive_identity(category, &prefix, &suffix)
}

/// Total, deterministic key over `(category, prefix, suffix)`.
pub fn derive_identity(category: Category, prefix: &str, suffix: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(category.as_str().as_bytes());
    hasher.update([0x1f]);
    hasher.update(prefix.as_bytes());
    hasher.update([0x1f]);
    hasher.update(suffix.as_bytes());
    let digest = hasher.finalize();
    let mut key = String::with_capacity(3 + 32);
    key.push_str("fp-");
    for byte in digest.iter().take(16) {
        use std::fmt::Write;
        let _ = write!(&mut key, "{byte:02x}");
    }
    key
}
