//! [`XsltEngine`] backed by the pure-Rust `xrust` processor.
//!
//! `xrust` works on in-memory trees, so both documents are parsed from strings. Its resource
//! fetcher is the only way a stylesheet can reach outside the two documents; here it refuses
//! every URL.
//!
//! `xrust` stores the content of an `xsl:text` without `disable-output-escaping` already
//! escaped, which leaks `&lt;` and `&amp;` into `method="text"` output. Such elements are given
//! an explicit `disable-output-escaping="no"` before compilation, which keeps the text raw and
//! leaves escaping to the XML serializer.

use super::guard::XSLT_NS;
use super::{CompiledStylesheet, OutputMethod, TransformOutput, XsltEngine};
use crate::error::TransformError;
use std::path::Path;
use url::Url;
use xrust::item::{Item, Node as _, SequenceTrait};
use xrust::parser::xml::parse;
use xrust::transform::context::StaticContextBuilder;
use xrust::trees::smite::RNode;
use xrust::xdmerror::{Error as XrustError, ErrorKind};
use xrust::xslt::from_document;

#[derive(Debug, Clone, Copy, Default)]
pub struct XrustEngine;

fn new_document() -> RNode {
    RNode::new_document()
}

fn parse_document(text: &str) -> Result<RNode, XrustError> {
    let doc = new_document();
    parse(doc.clone(), text, None)?;
    Ok(doc)
}

/// Adds `disable-output-escaping="no"` to every `xsl:text` that does not set it.
fn unescaped_text_literals(source: &str) -> Result<String, roxmltree::Error> {
    let doc = roxmltree::Document::parse(source)?;
    let mut offsets: Vec<usize> = doc
        .descendants()
        .filter(|n| n.has_tag_name((XSLT_NS, "text")))
        .filter(|n| n.attribute("disable-output-escaping").is_none())
        .filter_map(|n| {
            let start = n.range().start + 1;
            let name_len = source[start..]
                .find(|c: char| c.is_whitespace() || c == '/' || c == '>')?;
            Some(start + name_len)
        })
        .collect();
    offsets.sort_unstable();

    let mut out = String::with_capacity(source.len() + offsets.len() * 32);
    let mut last = 0;
    for at in offsets {
        out.push_str(&source[last..at]);
        out.push_str(r#" disable-output-escaping="no""#);
        last = at;
    }
    out.push_str(&source[last..]);
    Ok(out)
}

fn refuse_fetch(url: &Url) -> Result<String, XrustError> {
    Err(XrustError::new(
        ErrorKind::Unknown,
        format!("external resource access is disabled: {url}"),
    ))
}

impl XsltEngine for XrustEngine {
    fn name(&self) -> &'static str {
        "xrust"
    }

    fn transform(
        &self,
        stylesheet: &CompiledStylesheet,
        input: &Path,
        input_source: &str,
    ) -> Result<TransformOutput, TransformError> {
        let compile_err = |e: XrustError| TransformError::Compile {
            stylesheet: stylesheet.path.clone(),
            message: e.to_string(),
        };
        let runtime_err = |e: XrustError| TransformError::Runtime {
            stylesheet: stylesheet.path.clone(),
            input: input.to_path_buf(),
            message: e.to_string(),
        };

        let prepared =
            unescaped_text_literals(&stylesheet.source).map_err(|e| TransformError::Compile {
                stylesheet: stylesheet.path.clone(),
                message: e.to_string(),
            })?;
        let style = parse_document(&prepared).map_err(compile_err)?;
        let source = parse_document(input_source).map_err(runtime_err)?;

        let mut ctxt = from_document(
            style,
            None,
            |text: &str| parse_document(text),
            refuse_fetch,
        )
        .map_err(compile_err)?;
        ctxt.context(vec![Item::Node(source)], 0);
        ctxt.result_document(new_document());

        let mut static_ctxt = StaticContextBuilder::new()
            .message(|_: &str| Ok(()))
            .fetcher(refuse_fetch)
            .parser(|text: &str| parse_document(text))
            .build();
        let result = ctxt.evaluate(&mut static_ctxt).map_err(runtime_err)?;

        let text = match stylesheet.output_method {
            OutputMethod::Text => result.to_string(),
            OutputMethod::Xml | OutputMethod::Html => result.to_xml(),
        };
        Ok(TransformOutput {
            bytes: text.into_bytes(),
        })
    }
}
