use crate::XtaskError;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use xslt_fixtures::compare;

fn read(path: &Path) -> Result<String, XtaskError> {
    fs::read_to_string(path).map_err(|source| XtaskError::ReadFile {
        path: path.display().to_string(),
        source,
    })
}

pub(crate) fn canon_xml(args: Vec<String>) -> Result<(), XtaskError> {
    let mut in_path: Option<PathBuf> = None;
    let mut keep_whitespace = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--in" => {
                i += 1;
                in_path = args.get(i).map(PathBuf::from);
            }
            "--keep-whitespace" => keep_whitespace = true,
            "--help" | "-h" => return Err(XtaskError::Usage),
            _ => return Err(XtaskError::Usage),
        }
        i += 1;
    }

    let in_path = in_path.ok_or(XtaskError::Usage)?;
    let text = read(&in_path)?;
    let xml = compare::xml::canonical_xml(&text, !keep_whitespace)
        .map_err(XtaskError::CanonFailed)?;
    print!("{xml}");
    Ok(())
}

/// Diffs two files with the same strategy selection the harness uses.
pub(crate) fn compare_xml(args: Vec<String>) -> Result<(), XtaskError> {
    let mut expected: Option<PathBuf> = None;
    let mut actual: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--expected" => {
                i += 1;
                expected = args.get(i).map(PathBuf::from);
            }
            "--actual" => {
                i += 1;
                actual = args.get(i).map(PathBuf::from);
            }
            "--help" | "-h" => return Err(XtaskError::Usage),
            _ => return Err(XtaskError::Usage),
        }
        i += 1;
    }

    let expected = expected.ok_or(XtaskError::Usage)?;
    let actual = actual.ok_or(XtaskError::Usage)?;
    let discrepancies = compare::compare(&expected, &actual)?;
    if discrepancies.is_empty() {
        println!("match: {} == {}", actual.display(), expected.display());
        return Ok(());
    }

    let mut out = String::new();
    for d in &discrepancies {
        let _ = writeln!(&mut out, "- {d}");
    }
    let _ = write!(&mut out, "{} discrepancies", discrepancies.len());
    Err(XtaskError::CompareFailed(out))
}
