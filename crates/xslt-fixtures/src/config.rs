use crate::error::{Error, Result};
use crate::resolve::FixtureLayout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Harness configuration.
///
/// The defaults reproduce the Maven-style layout the fixture convention was designed around:
/// stylesheets under `src/main/resources`, fixtures under `src/test/resources`, scratch output
/// under `target/resources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HarnessConfig {
    pub stylesheet_root: PathBuf,
    pub fixture_root: PathBuf,
    pub scratch_root: PathBuf,
    pub stylesheet_extensions: Vec<String>,
    pub input_prefix: String,
    pub output_prefix: String,
    /// Ignore whitespace-only text when comparing XML. Process-wide; the first run wins.
    pub ignore_whitespace: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            stylesheet_root: PathBuf::from("src/main/resources"),
            fixture_root: PathBuf::from("src/test/resources"),
            scratch_root: PathBuf::from("target/resources"),
            stylesheet_extensions: vec!["xsl".to_string(), "xslt".to_string()],
            input_prefix: "input".to_string(),
            output_prefix: "output".to_string(),
            ignore_whitespace: true,
        }
    }
}

impl HarnessConfig {
    /// Loads a configuration file. `.json` files are parsed as JSON, everything else as YAML.
    /// Keys missing from the file keep their default values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let cfg: Self = if is_json {
            serde_json::from_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        // An empty YAML document deserializes to `null`, which means "all defaults".
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Rebases every relative root onto `base`.
    pub fn rooted_at(mut self, base: &Path) -> Self {
        for root in [
            &mut self.stylesheet_root,
            &mut self.fixture_root,
            &mut self.scratch_root,
        ] {
            if root.is_relative() {
                *root = base.join(&*root);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_prefix.is_empty() || self.output_prefix.is_empty() {
            return Err(Error::Config(
                "inputPrefix and outputPrefix must be non-empty".to_string(),
            ));
        }
        if self.input_prefix == self.output_prefix {
            return Err(Error::Config(format!(
                "inputPrefix and outputPrefix must differ (both `{}`)",
                self.input_prefix
            )));
        }
        if self.stylesheet_extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(Error::Config(
                "stylesheetExtensions must name at least one extension".to_string(),
            ));
        }
        if self.fixture_root == self.scratch_root {
            return Err(Error::Config(format!(
                "scratchRoot must differ from fixtureRoot ({})",
                self.fixture_root.display()
            )));
        }
        Ok(())
    }

    pub fn layout(&self) -> FixtureLayout {
        FixtureLayout {
            stylesheet_root: self.stylesheet_root.clone(),
            fixture_root: self.fixture_root.clone(),
            scratch_root: self.scratch_root.clone(),
            input_prefix: self.input_prefix.clone(),
            output_prefix: self.output_prefix.clone(),
        }
    }

    pub fn is_stylesheet(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.stylesheet_extensions
            .iter()
            .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides_only_the_given_keys() {
        let cfg = HarnessConfig::from_yaml_str(
            "stylesheetRoot: xsl\nfixtureRoot: tests/xsl\ninputPrefix: in\n",
        )
        .unwrap();
        assert_eq!(cfg.stylesheet_root, PathBuf::from("xsl"));
        assert_eq!(cfg.fixture_root, PathBuf::from("tests/xsl"));
        assert_eq!(cfg.scratch_root, PathBuf::from("target/resources"));
        assert_eq!(cfg.input_prefix, "in");
        assert_eq!(cfg.output_prefix, "output");
        assert!(cfg.ignore_whitespace);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(
            HarnessConfig::from_yaml_str("  \n").unwrap(),
            HarnessConfig::default()
        );
    }

    #[test]
    fn json_config_file_is_detected_by_extension() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("harness.json");
        std::fs::write(&path, r#"{ "scratchRoot": "out", "ignoreWhitespace": false }"#).unwrap();
        let cfg = HarnessConfig::from_file(&path).unwrap();
        assert_eq!(cfg.scratch_root, PathBuf::from("out"));
        assert!(!cfg.ignore_whitespace);
    }

    #[test]
    fn validate_rejects_equal_prefixes() {
        let cfg = HarnessConfig {
            output_prefix: "input".to_string(),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn stylesheet_extension_match_is_case_insensitive() {
        let cfg = HarnessConfig::default();
        assert!(cfg.is_stylesheet(Path::new("a/b/convert.XSL")));
        assert!(cfg.is_stylesheet(Path::new("a/b/convert.xslt")));
        assert!(!cfg.is_stylesheet(Path::new("a/b/convert.xml")));
        assert!(!cfg.is_stylesheet(Path::new("a/b/xsl")));
    }

    #[test]
    fn rooted_at_keeps_absolute_roots() {
        let cfg = HarnessConfig {
            scratch_root: PathBuf::from("/tmp/scratch"),
            ..Default::default()
        }
        .rooted_at(Path::new("/work"));
        assert_eq!(cfg.stylesheet_root, PathBuf::from("/work/src/main/resources"));
        assert_eq!(cfg.scratch_root, PathBuf::from("/tmp/scratch"));
    }
}
