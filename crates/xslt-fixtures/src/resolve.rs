//! Fixture discovery.
//!
//! A stylesheet at `<stylesheet_root>/a/b/name.xsl` owns the fixture directory
//! `<fixture_root>/a/b/name/`. Every file directly in that directory whose name starts with the
//! input prefix is a test input; its expected output is the one file whose name, minus its last
//! extension, is the input's base name with the input prefix swapped for the output prefix.
//!
//! The input→expected mapping must be one-to-one. Zero or several candidates are reported as
//! [`DiscoveryFailure`]s, never resolved by picking one.

use crate::error::{Error, Result};
use crate::fs::FileListing;
use std::path::{Path, PathBuf};

/// The three mirrored roots plus the fixture naming prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureLayout {
    pub stylesheet_root: PathBuf,
    pub fixture_root: PathBuf,
    pub scratch_root: PathBuf,
    pub input_prefix: String,
    pub output_prefix: String,
}

impl FixtureLayout {
    /// Fixture directory of `stylesheet`: root substituted, trailing extension dropped.
    pub fn fixture_dir(&self, stylesheet: &Path) -> Result<PathBuf> {
        let rel = rebase(stylesheet, &self.stylesheet_root)?;
        Ok(self.fixture_root.join(rel).with_extension(""))
    }

    /// Where the transform of `input` is written: same relative path under the scratch root.
    pub fn scratch_path(&self, input: &Path) -> Result<PathBuf> {
        let rel = rebase(input, &self.fixture_root)?;
        Ok(self.scratch_root.join(rel))
    }

    fn is_input_name(&self, name: &str) -> bool {
        name.starts_with(&self.input_prefix)
    }

    /// `input12.xml` -> `output12`. Every occurrence of the input prefix in the stem is
    /// replaced, so `input_input1.xml` -> `output_output1`.
    fn expected_base(&self, input_name: &str) -> Option<String> {
        if !self.is_input_name(input_name) {
            return None;
        }
        let stem = match input_name.rsplit_once('.') {
            Some((stem, _ext)) => stem,
            None => input_name,
        };
        Some(stem.replace(&self.input_prefix, &self.output_prefix))
    }
}

fn rebase<'a>(path: &'a Path, root: &Path) -> Result<&'a Path> {
    path.strip_prefix(root).map_err(|_| Error::OutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })
}

/// Matches `base` itself or `base.<any extension>`; `output10.xml` is not a candidate for
/// `output1`.
fn is_candidate(name: &str, base: &str) -> bool {
    match name.strip_prefix(base) {
        Some("") => true,
        Some(rest) => rest.starts_with('.'),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePair {
    pub input: PathBuf,
    pub expected: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryFailure {
    #[error("missing expected output for {}", input.display())]
    MissingExpectedOutput { input: PathBuf },

    #[error(
        "multiple expected outputs for {}: [{}]",
        input.display(),
        candidates.iter().map(|c| c.display().to_string()).collect::<Vec<_>>().join(", ")
    )]
    AmbiguousExpectedOutput {
        input: PathBuf,
        candidates: Vec<PathBuf>,
    },
}

impl DiscoveryFailure {
    pub fn input(&self) -> &Path {
        match self {
            Self::MissingExpectedOutput { input } => input,
            Self::AmbiguousExpectedOutput { input, .. } => input,
        }
    }
}

/// Outcome of resolving one stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// `None` when the stylesheet has no fixture directory (an untested stylesheet).
    pub fixture_dir: Option<PathBuf>,
    pub cases: Vec<FixturePair>,
    pub failures: Vec<DiscoveryFailure>,
}

impl Resolution {
    pub fn is_untested(&self) -> bool {
        self.fixture_dir.is_none()
    }
}

pub fn resolve<L: FileListing>(
    listing: &L,
    layout: &FixtureLayout,
    stylesheet: &Path,
) -> Result<Resolution> {
    let dir = layout.fixture_dir(stylesheet)?;
    if !listing.is_dir(&dir) {
        tracing::debug!(
            stylesheet = %stylesheet.display(),
            fixture_dir = %dir.display(),
            "no fixture directory"
        );
        return Ok(Resolution::default());
    }

    let files = listing.files_in(&dir)?;
    let named: Vec<(&PathBuf, &str)> = files
        .iter()
        .filter_map(|p| Some((p, p.file_name()?.to_str()?)))
        .collect();

    let mut out = Resolution {
        fixture_dir: Some(dir.clone()),
        ..Default::default()
    };
    for &(input, name) in named.iter().filter(|(_, n)| layout.is_input_name(n)) {
        let Some(base) = layout.expected_base(name) else {
            continue;
        };
        let mut candidates: Vec<PathBuf> = named
            .iter()
            .filter(|(_, n)| is_candidate(n, &base))
            .map(|(p, _)| (*p).clone())
            .collect();

        if candidates.len() > 1 {
            out.failures.push(DiscoveryFailure::AmbiguousExpectedOutput {
                input: input.clone(),
                candidates,
            });
        } else if let Some(expected) = candidates.pop() {
            out.cases.push(FixturePair {
                input: input.clone(),
                expected,
            });
        } else {
            out.failures.push(DiscoveryFailure::MissingExpectedOutput {
                input: input.clone(),
            });
        }
    }

    tracing::debug!(
        stylesheet = %stylesheet.display(),
        cases = out.cases.len(),
        failures = out.failures.len(),
        "resolved fixtures"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryListing;

    fn layout() -> FixtureLayout {
        FixtureLayout {
            stylesheet_root: PathBuf::from("src/main/resources"),
            fixture_root: PathBuf::from("src/test/resources"),
            scratch_root: PathBuf::from("target/resources"),
            input_prefix: "input".to_string(),
            output_prefix: "output".to_string(),
        }
    }

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn fixture_dir_mirrors_the_stylesheet_path_without_extension() {
        assert_eq!(
            layout()
                .fixture_dir(Path::new("src/main/resources/a/b/name.xsl"))
                .unwrap(),
            p("src/test/resources/a/b/name")
        );
        assert_eq!(
            layout()
                .fixture_dir(Path::new("src/main/resources/v1.2/name.test.xslt"))
                .unwrap(),
            p("src/test/resources/v1.2/name.test")
        );
    }

    #[test]
    fn scratch_path_keeps_relative_path_and_file_name() {
        assert_eq!(
            layout()
                .scratch_path(Path::new("src/test/resources/a/name/input1.xml"))
                .unwrap(),
            p("target/resources/a/name/input1.xml")
        );
    }

    #[test]
    fn stylesheet_outside_the_root_is_an_error() {
        let err = layout().fixture_dir(Path::new("elsewhere/x.xsl")).unwrap_err();
        assert!(matches!(err, Error::OutsideRoot { .. }));
    }

    #[test]
    fn missing_fixture_directory_is_a_silent_skip() {
        let listing = MemoryListing::with_files(["src/test/resources/other/input1.xml"]);
        let res = resolve(&listing, &layout(), Path::new("src/main/resources/name.xsl")).unwrap();
        assert!(res.is_untested());
        assert!(res.cases.is_empty());
        assert!(res.failures.is_empty());
    }

    #[test]
    fn pairs_inputs_with_their_outputs_by_suffix() {
        let listing = MemoryListing::with_files([
            "src/test/resources/name/input1.xml",
            "src/test/resources/name/output1.json",
            "src/test/resources/name/input-b.xml",
            "src/test/resources/name/output-b.xml",
            "src/test/resources/name/README.md",
        ]);
        let res = resolve(&listing, &layout(), Path::new("src/main/resources/name.xsl")).unwrap();
        assert!(res.failures.is_empty(), "{:?}", res.failures);
        assert_eq!(
            res.cases,
            vec![
                FixturePair {
                    input: p("src/test/resources/name/input-b.xml"),
                    expected: p("src/test/resources/name/output-b.xml"),
                },
                FixturePair {
                    input: p("src/test/resources/name/input1.xml"),
                    expected: p("src/test/resources/name/output1.json"),
                },
            ]
        );
    }

    #[test]
    fn zero_candidates_is_one_failure_naming_the_input() {
        let listing = MemoryListing::with_files([
            "src/test/resources/name/input1.xml",
            "src/test/resources/name/output2.xml",
        ]);
        let res = resolve(&listing, &layout(), Path::new("src/main/resources/name.xsl")).unwrap();
        assert!(res.cases.is_empty());
        assert_eq!(
            res.failures,
            vec![DiscoveryFailure::MissingExpectedOutput {
                input: p("src/test/resources/name/input1.xml"),
            }]
        );
        assert_eq!(
            res.failures[0].to_string(),
            "missing expected output for src/test/resources/name/input1.xml"
        );
    }

    #[test]
    fn several_candidates_is_one_failure_listing_all_of_them() {
        let listing = MemoryListing::with_files([
            "src/test/resources/name/input1.xml",
            "src/test/resources/name/output1.xml",
            "src/test/resources/name/output1.json",
        ]);
        let res = resolve(&listing, &layout(), Path::new("src/main/resources/name.xsl")).unwrap();
        assert!(res.cases.is_empty());
        assert_eq!(res.failures.len(), 1);
        let DiscoveryFailure::AmbiguousExpectedOutput { input, candidates } = &res.failures[0]
        else {
            panic!("expected ambiguous failure, got {:?}", res.failures[0]);
        };
        assert_eq!(input, &p("src/test/resources/name/input1.xml"));
        assert_eq!(
            candidates,
            &vec![
                p("src/test/resources/name/output1.json"),
                p("src/test/resources/name/output1.xml"),
            ]
        );
        let msg = res.failures[0].to_string();
        assert!(msg.contains("output1.json") && msg.contains("output1.xml"), "{msg}");
    }

    #[test]
    fn candidate_match_is_anchored_on_the_base_name() {
        // `output10` shares a raw prefix with `output1` but is a different fixture, and the
        // directory name containing "output" must not make files match either.
        let listing = MemoryListing::with_files([
            "src/test/resources/output/input1.xml",
            "src/test/resources/output/output1.xml",
            "src/test/resources/output/output10.xml",
            "src/test/resources/output/input10.xml",
        ]);
        let res = resolve(&listing, &layout(), Path::new("src/main/resources/output.xsl")).unwrap();
        assert!(res.failures.is_empty(), "{:?}", res.failures);
        assert_eq!(res.cases.len(), 2);
        assert_eq!(
            res.cases[0].expected,
            p("src/test/resources/output/output1.xml")
        );
        assert_eq!(
            res.cases[1].expected,
            p("src/test/resources/output/output10.xml")
        );
    }

    #[test]
    fn nested_directories_are_not_inputs() {
        let listing = MemoryListing::with_files([
            "src/test/resources/name/input1.xml",
            "src/test/resources/name/output1.xml",
            "src/test/resources/name/inputs/input2.xml",
        ]);
        let res = resolve(&listing, &layout(), Path::new("src/main/resources/name.xsl")).unwrap();
        assert_eq!(res.cases.len(), 1);
        assert!(res.failures.is_empty());
    }

    #[test]
    fn multi_dot_and_extensionless_names() {
        let listing = MemoryListing::with_files([
            "src/test/resources/name/input2",
            "src/test/resources/name/output2.txt",
            "src/test/resources/name/input.case.xml",
            "src/test/resources/name/output.case.xml",
        ]);
        let res = resolve(&listing, &layout(), Path::new("src/main/resources/name.xsl")).unwrap();
        assert!(res.failures.is_empty(), "{:?}", res.failures);
        assert_eq!(
            res.cases,
            vec![
                FixturePair {
                    input: p("src/test/resources/name/input.case.xml"),
                    expected: p("src/test/resources/name/output.case.xml"),
                },
                FixturePair {
                    input: p("src/test/resources/name/input2"),
                    expected: p("src/test/resources/name/output2.txt"),
                },
            ]
        );
    }

    #[test]
    fn every_occurrence_of_the_prefix_is_replaced() {
        let listing = MemoryListing::with_files([
            "src/test/resources/twice/input_input1.xml",
            "src/test/resources/twice/output_output1.xml",
            "src/test/resources/twice/output_input1.xml",
        ]);
        let res = resolve(&listing, &layout(), Path::new("src/main/resources/twice.xsl")).unwrap();
        assert!(res.failures.is_empty(), "{:?}", res.failures);
        assert_eq!(
            res.cases,
            vec![FixturePair {
                input: p("src/test/resources/twice/input_input1.xml"),
                expected: p("src/test/resources/twice/output_output1.xml"),
            }]
        );
    }

    #[test]
    fn prefix_only_counts_at_the_start_of_the_name() {
        let l = layout();
        assert_eq!(l.expected_base("input3.input.xml").as_deref(), Some("output3.output"));
        assert_eq!(l.expected_base("my_input1.xml"), None);
    }
}
