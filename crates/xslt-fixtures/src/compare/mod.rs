//! Output comparison.
//!
//! The produced file's content type picks the strategy:
//! - `*xml*` types: structural diff, every difference reported ([`xml`])
//! - `*json*` types: STRICT equality, one aggregate discrepancy on mismatch ([`json`])
//! - anything else, including "unknown": exact bytes, one discrepancy on mismatch
//!
//! Mismatches are returned as data. `Err` is reserved for unreadable files and for content that
//! the chosen strategy cannot parse.

pub mod content_type;
pub mod json;
pub mod xml;

pub use xml::XmlDifference;

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Xml,
    Json,
    Bytes,
}

impl ContentKind {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(ty) = content_type.map(|t| t.trim().to_ascii_lowercase()) else {
            return Self::Bytes;
        };
        if ty.contains("xml") {
            Self::Xml
        } else if ty.contains("json") {
            Self::Json
        } else {
            Self::Bytes
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Bytes => "bytes",
        }
    }
}

/// One detected difference between an actual output and its expected fixture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Discrepancy {
    #[error(transparent)]
    Xml(#[from] XmlDifference),

    #[error("JSON in {} does not strictly match {}", actual.display(), expected.display())]
    JsonMismatch { expected: PathBuf, actual: PathBuf },

    #[error(
        "files differ: {} vs {} (first difference at byte {offset})",
        expected.display(),
        actual.display()
    )]
    FilesDiffer {
        expected: PathBuf,
        actual: PathBuf,
        offset: usize,
    },
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

fn utf8<'a>(bytes: &'a [u8], path: &Path) -> Result<&'a str> {
    let text = std::str::from_utf8(bytes).map_err(|e| Error::XmlParse {
        path: path.to_path_buf(),
        message: format!("not valid UTF-8: {e}"),
    })?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Compares the file at `actual` against the fixture at `expected`.
///
/// The strategy comes from the produced content, or from the expected fixture's extension when
/// the content is inconclusive.
pub fn compare(expected: &Path, actual: &Path) -> Result<Vec<Discrepancy>> {
    let actual_bytes = read(actual)?;
    let expected_bytes = read(expected)?;
    let content_type = content_type::detect(expected, &actual_bytes);
    let kind = ContentKind::from_content_type(content_type);
    tracing::debug!(
        actual = %actual.display(),
        content_type = content_type.unwrap_or("unknown"),
        mode = kind.as_str(),
        "comparing output"
    );
    compare_as(kind, expected, &expected_bytes, actual, &actual_bytes)
}

/// Compares already-loaded contents with an explicit strategy.
pub fn compare_as(
    kind: ContentKind,
    expected: &Path,
    expected_bytes: &[u8],
    actual: &Path,
    actual_bytes: &[u8],
) -> Result<Vec<Discrepancy>> {
    match kind {
        ContentKind::Xml => {
            let ignore_ws = xml::ignore_whitespace();
            let actual_dom = xml::parse(utf8(actual_bytes, actual)?, actual, ignore_ws)?;
            let expected_dom = xml::parse(utf8(expected_bytes, expected)?, expected, ignore_ws)?;
            Ok(xml::diff(&expected_dom, &actual_dom)
                .into_iter()
                .map(Discrepancy::from)
                .collect())
        }
        ContentKind::Json => {
            let actual_value = json::parse(actual_bytes, actual)?;
            let expected_value = json::parse(expected_bytes, expected)?;
            if json::strict_eq(&expected_value, &actual_value) {
                Ok(Vec::new())
            } else {
                Ok(vec![Discrepancy::JsonMismatch {
                    expected: expected.to_path_buf(),
                    actual: actual.to_path_buf(),
                }])
            }
        }
        ContentKind::Bytes => Ok(compare_bytes(expected, expected_bytes, actual, actual_bytes)
            .into_iter()
            .collect()),
    }
}

fn compare_bytes(
    expected: &Path,
    expected_bytes: &[u8],
    actual: &Path,
    actual_bytes: &[u8],
) -> Option<Discrepancy> {
    if expected_bytes == actual_bytes {
        return None;
    }
    let offset = expected_bytes
        .iter()
        .zip(actual_bytes)
        .position(|(e, a)| e != a)
        .unwrap_or_else(|| expected_bytes.len().min(actual_bytes.len()));
    Some(Discrepancy::FilesDiffer {
        expected: expected.to_path_buf(),
        actual: actual.to_path_buf(),
        offset,
    })
}
