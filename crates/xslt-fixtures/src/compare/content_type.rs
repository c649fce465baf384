//! Best-effort content-type detection for produced output.
//!
//! Content is sniffed first. When that is inconclusive the extension of the *expected* fixture
//! decides: the scratch output keeps the input's file name, so its own extension says nothing
//! about what the stylesheet emitted. `None` means "unknown" and leads to a byte comparison.

use std::path::Path;

/// Returns the content type for a given file extension.
pub fn content_type_for_extension(ext: &str) -> Option<&'static str> {
    let ty = match ext.to_ascii_lowercase().as_str() {
        "xml" | "xsl" | "xslt" | "xsd" | "rss" | "atom" => "application/xml",
        "svg" => "image/svg+xml",
        "xhtml" => "application/xhtml+xml",
        "json" | "geojson" => "application/json",
        "html" | "htm" => "text/html",
        "txt" | "text" => "text/plain",
        "csv" => "text/csv",
        "md" => "text/markdown",
        _ => return None,
    };
    Some(ty)
}

fn strip_leading(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// Magic-based detection.
pub fn sniff(bytes: &[u8]) -> Option<&'static str> {
    let head = strip_leading(bytes);
    match head.first()? {
        b'<' => {
            let lower: Vec<u8> = head
                .iter()
                .take(16)
                .map(|b| b.to_ascii_lowercase())
                .collect();
            if lower.starts_with(b"<!doctype html") || lower.starts_with(b"<html") {
                Some("text/html")
            } else {
                Some("application/xml")
            }
        }
        b'{' | b'[' => serde_json::from_slice::<serde::de::IgnoredAny>(bytes)
            .is_ok()
            .then_some("application/json"),
        _ => None,
    }
}

/// Sniffs `bytes`, falling back to the extension of `named_like`.
pub fn detect(named_like: &Path, bytes: &[u8]) -> Option<&'static str> {
    sniff(bytes).or_else(|| {
        named_like
            .extension()
            .and_then(|e| e.to_str())
            .and_then(content_type_for_extension)
    })
}
