use sha2::{Digest, Sha256};

/// Portable, deterministic output name: `{sanitized_title}--{short_hash(source)}.{extension}`.
pub fn deterministic_filename(title: Option<&str>, source: &str, extension: &str) -> String {
    let stem = sanitize_title(title.unwrap_or("transcript"));
    let extension = extension.trim_start_matches('.');
    format!("{stem}--{}.{extension}", short_hash(source))
}

fn sanitize_title(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    for c in input.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        if c == '_' && cleaned.ends_with('_') {
            continue;
        }
        cleaned.push(c);
    }
    let mut name: String = cleaned
        .trim_matches(&['_', ' ', '.'][..])
        .chars()
        .take(80)
        .collect();
    if name.is_empty() {
        name = "transcript".to_string();
    }
    if is_reserved_windows_name(&name) {
        name.push('_');
    }
    name
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}')
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().take(4).map(|byte| format!("{byte:02x}")).collect()
}
