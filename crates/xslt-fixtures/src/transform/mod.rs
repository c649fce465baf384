//! Stylesheet execution.
//!
//! [`TransformRunner`] owns the file handling (reading the stylesheet and input, writing the
//! scratch output); the actual XSLT processing sits behind [`XsltEngine`]. Every stylesheet goes
//! through [`CompiledStylesheet::compile`] first, which rejects stylesheets that reach for
//! extension functions or elements before any engine sees them.

mod guard;
#[cfg(feature = "xrust")]
mod xrust_engine;

#[cfg(feature = "xrust")]
pub use xrust_engine::XrustEngine;

use crate::error::{Error, Result, TransformError};
use crate::resolve::FixtureLayout;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMethod {
    #[default]
    Xml,
    Html,
    Text,
}

impl OutputMethod {
    fn parse(s: &str) -> Self {
        match s.trim() {
            "text" => Self::Text,
            "html" | "xhtml" => Self::Html,
            _ => Self::Xml,
        }
    }
}

/// A stylesheet that passed the static checks, ready to hand to an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStylesheet {
    pub path: PathBuf,
    pub source: String,
    pub output_method: OutputMethod,
}

impl CompiledStylesheet {
    pub fn compile(path: &Path, source: &str) -> std::result::Result<Self, TransformError> {
        let compile_err = |message: String| TransformError::Compile {
            stylesheet: path.to_path_buf(),
            message,
        };
        let doc = roxmltree::Document::parse(source).map_err(|e| compile_err(e.to_string()))?;
        let root = doc.root_element();

        let is_xslt_root = root.tag_name().namespace() == Some(guard::XSLT_NS)
            && matches!(root.tag_name().name(), "stylesheet" | "transform");
        // A literal result element with `xsl:version` is a simplified stylesheet.
        let is_simplified = root.attribute((guard::XSLT_NS, "version")).is_some();
        if !is_xslt_root && !is_simplified {
            return Err(compile_err(format!(
                "root element <{}> is not an XSLT stylesheet",
                root.tag_name().name()
            )));
        }

        guard::check(&doc, path)?;

        let output_method = root
            .children()
            .find(|n| n.has_tag_name((guard::XSLT_NS, "output")))
            .and_then(|n| n.attribute("method"))
            .map(OutputMethod::parse)
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            source: source.to_string(),
            output_method,
        })
    }
}

/// Serialized result of one transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub bytes: Vec<u8>,
}

/// An XSLT processor.
///
/// Implementations must not expose host functions to the stylesheet and must refuse to load
/// external resources (`xsl:include`, `xsl:import`, `document()`).
pub trait XsltEngine {
    fn name(&self) -> &'static str;

    fn transform(
        &self,
        stylesheet: &CompiledStylesheet,
        input: &Path,
        input_source: &str,
    ) -> std::result::Result<TransformOutput, TransformError>;
}

impl<E: XsltEngine + ?Sized> XsltEngine for &E {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn transform(
        &self,
        stylesheet: &CompiledStylesheet,
        input: &Path,
        input_source: &str,
    ) -> std::result::Result<TransformOutput, TransformError> {
        (**self).transform(stylesheet, input, input_source)
    }
}

impl<E: XsltEngine + ?Sized> XsltEngine for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn transform(
        &self,
        stylesheet: &CompiledStylesheet,
        input: &Path,
        input_source: &str,
    ) -> std::result::Result<TransformOutput, TransformError> {
        (**self).transform(stylesheet, input, input_source)
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

pub struct TransformRunner<E> {
    engine: E,
    layout: FixtureLayout,
}

impl<E: XsltEngine> TransformRunner<E> {
    pub fn new(engine: E, layout: FixtureLayout) -> Self {
        Self { engine, layout }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn layout(&self) -> &FixtureLayout {
        &self.layout
    }

    pub fn compile(&self, stylesheet: &Path) -> Result<CompiledStylesheet> {
        let source = read_to_string(stylesheet)?;
        Ok(CompiledStylesheet::compile(stylesheet, &source)?)
    }

    /// Transforms `input` with `stylesheet` and returns the path of the written output.
    pub fn run(&self, input: &Path, stylesheet: &Path) -> Result<PathBuf> {
        let compiled = self.compile(stylesheet)?;
        self.run_compiled(input, &compiled)
    }

    pub fn run_compiled(&self, input: &Path, stylesheet: &CompiledStylesheet) -> Result<PathBuf> {
        let dest = self.layout.scratch_path(input)?;
        let input_source = read_to_string(input)?;
        let output = self
            .engine
            .transform(stylesheet, input, &input_source)?;

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&dest, &output.bytes).map_err(|source| Error::WriteFile {
            path: dest.clone(),
            source,
        })?;
        tracing::debug!(
            engine = self.engine.name(),
            input = %input.display(),
            output = %dest.display(),
            bytes = output.bytes.len(),
            "transformed"
        );
        Ok(dest)
    }
}
