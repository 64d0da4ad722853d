// File: crates/export-core/src/filename.rs
// Summary: Filename sanitization for titles coming from arbitrary chart labels.

use crate::format::ExportFormat;

/// Base name used when a title sanitizes to nothing.
pub const FALLBACK_BASE: &str = "chart";

/// Map every character outside `[A-Za-z0-9_-]` to `_` and lowercase the rest.
///
/// One input `char` always yields one output `char`, so `"é"` becomes a single `_`.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Full download name: sanitized base plus the format's extension.
pub fn file_name(base: &str, format: ExportFormat) -> String {
    let mut stem = sanitize(base);
    if stem.is_empty() {
        stem.push_str(FALLBACK_BASE);
    }
    format!("{}.{}", stem, format.extension())
}
