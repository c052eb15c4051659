//! Stable island ids and custom-element tag names.

use sha2::{Digest, Sha256};

use crate::tree::SourceLocation;

/// Hex digits of the location hash kept in ids (64 bits).
pub const ID_LENGTH: usize = 16;

/// Derive the island id of a call site from its source location.
///
/// The id depends on nothing but the location, so adding or removing other
/// call sites never changes it.
pub fn island_id(location: &SourceLocation) -> String {
    let mut hasher = Sha256::new();
    hasher.update(location.file.replace('\\', "/").as_bytes());
    hasher.update([0u8]);
    hasher.update(location.line.to_le_bytes());
    hasher.update(location.column.to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..ID_LENGTH].to_string()
}

/// Custom-element tag for an island: `{prefix}-{component}-{id}`.
pub fn island_tag(prefix: &str, component: &str, id: &str) -> String {
    let name = kebab_case(component);
    if name.is_empty() {
        format!("{}-{}", prefix, id)
    } else {
        format!("{}-{}-{}", prefix, name, id)
    }
}

/// `FormIsland` → `form-island`, `HTMLView` → `html-view`.
pub fn kebab_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && i > 0 {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
                if prev.is_ascii_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_ascii_uppercase() && next_lower)
                {
                    out.push('-');
                }
            }
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }

    out.trim_end_matches('-').to_string()
}

/// Whether `name` is usable as an autonomous custom-element name.
pub fn is_valid_custom_element_name(name: &str) -> bool {
    const RESERVED: [&str; 8] = [
        "annotation-xml",
        "color-profile",
        "font-face",
        "font-face-src",
        "font-face-uri",
        "font-face-format",
        "font-face-name",
        "missing-glyph",
    ];

    name.chars().next().is_some_and(|c| c.is_ascii_lowercase())
        && name.contains('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_'))
        && !RESERVED.contains(&name)
}
