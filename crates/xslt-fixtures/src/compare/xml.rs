//! Structural XML comparison.
//!
//! Documents are reduced to a small DOM of elements and text, with names in `{namespace}local`
//! form so prefixes do not matter. Attributes compare as a map; child order is significant.
//! [`diff`] walks both trees and records every difference instead of stopping at the first one.
//!
//! Comments and processing instructions are never compared. They are dropped while the DOM is
//! built, and text on either side of one merges into a single text node. An expected output that
//! relies on a comment or a `<?pi?>` therefore passes against output that lacks it; compare such
//! fixtures byte for byte (e.g. with a `.txt` expected file) instead.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::OnceLock;

static IGNORE_WHITESPACE: OnceLock<bool> = OnceLock::new();

/// Sets the process-wide whitespace mode. Only the first call has an effect; the returned value
/// is the mode actually in force.
pub fn init_ignore_whitespace(enabled: bool) -> bool {
    *IGNORE_WHITESPACE.get_or_init(|| enabled)
}

/// Whether whitespace-only text is ignored (and text trimmed). Defaults to `true` and is frozen
/// by the first read.
pub fn ignore_whitespace() -> bool {
    *IGNORE_WHITESPACE.get_or_init(|| true)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Element {
        name: String,
        attrs: BTreeMap<String, String>,
        children: Vec<DomNode>,
    },
    Text(String),
}

impl DomNode {
    fn label(&self) -> String {
        match self {
            DomNode::Element { name, .. } => local_part(name).to_string(),
            DomNode::Text(_) => "text()".to_string(),
        }
    }

    fn describe(&self) -> String {
        match self {
            DomNode::Element { name, .. } => format!("element <{name}>"),
            DomNode::Text(t) => format!("text `{}`", truncate(t, 60)),
        }
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit_once('}').map(|(_, local)| local).unwrap_or(name)
}

fn expanded_name(namespace: Option<&str>, local: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{{{ns}}}{local}"),
        _ => local.to_string(),
    }
}

fn build_node(n: roxmltree::Node<'_, '_>, ignore_ws: bool) -> DomNode {
    let tag = n.tag_name();
    let mut attrs = BTreeMap::new();
    for a in n.attributes() {
        attrs.insert(expanded_name(a.namespace(), a.name()), a.value().to_string());
    }

    let mut children: Vec<DomNode> = Vec::new();
    let mut pending_text = String::new();
    let flush = |pending: &mut String, children: &mut Vec<DomNode>| {
        let text = if ignore_ws {
            pending.trim().to_string()
        } else {
            pending.clone()
        };
        if !text.is_empty() {
            children.push(DomNode::Text(text));
        }
        pending.clear();
    };
    // Comments and processing instructions fall through and are skipped.
    for c in n.children() {
        if c.is_text() {
            pending_text.push_str(c.text().unwrap_or_default());
        } else if c.is_element() {
            flush(&mut pending_text, &mut children);
            children.push(build_node(c, ignore_ws));
        }
    }
    flush(&mut pending_text, &mut children);

    DomNode::Element {
        name: expanded_name(tag.namespace(), tag.name()),
        attrs,
        children,
    }
}

fn parse_document(text: &str) -> std::result::Result<roxmltree::Document<'_>, String> {
    let opts = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    roxmltree::Document::parse_with_options(text, opts).map_err(|e| e.to_string())
}

/// Parses `text` (read from `path`) into a comparable DOM rooted at the document element.
pub fn parse(text: &str, path: &Path, ignore_ws: bool) -> Result<DomNode> {
    let doc = parse_document(text).map_err(|message| Error::XmlParse {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(build_node(doc.root_element(), ignore_ws))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XmlDifference {
    #[error("{path}: element name expected <{expected}> but was <{actual}>")]
    ElementName {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("{path}: expected {expected} but was {actual}")]
    NodeKind {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("{path}: missing attribute `{name}` (expected `{expected}`)")]
    MissingAttribute {
        path: String,
        name: String,
        expected: String,
    },

    #[error("{path}: unexpected attribute `{name}` = `{actual}`")]
    ExtraAttribute {
        path: String,
        name: String,
        actual: String,
    },

    #[error("{path}: attribute `{name}` expected `{expected}` but was `{actual}`")]
    AttributeValue {
        path: String,
        name: String,
        expected: String,
        actual: String,
    },

    #[error("{path}: text expected `{expected}` but was `{actual}`")]
    Text {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("{path}: child count expected {expected} but was {actual}")]
    ChildCount {
        path: String,
        expected: usize,
        actual: usize,
    },
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s
        .chars()
        .take(max_len.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn diff_path(
    expected: &DomNode,
    actual: &DomNode,
    path: &mut Vec<String>,
    out: &mut Vec<XmlDifference>,
) {
    let here = path.join("/");
    match (expected, actual) {
        (DomNode::Text(e), DomNode::Text(a)) => {
            if e != a {
                out.push(XmlDifference::Text {
                    path: here.clone(),
                    expected: truncate(e, 120),
                    actual: truncate(a, 120),
                });
            }
        }
        (
            DomNode::Element {
                name: e_name,
                attrs: e_attrs,
                children: e_children,
            },
            DomNode::Element {
                name: a_name,
                attrs: a_attrs,
                children: a_children,
            },
        ) => {
            if e_name != a_name {
                // Different elements: their contents are not comparable.
                out.push(XmlDifference::ElementName {
                    path: here.clone(),
                    expected: e_name.clone(),
                    actual: a_name.clone(),
                });
                return;
            }

            for (k, v_e) in e_attrs {
                match a_attrs.get(k) {
                    None => out.push(XmlDifference::MissingAttribute {
                        path: here.clone(),
                        name: k.clone(),
                        expected: truncate(v_e, 120),
                    }),
                    Some(v_a) if v_a != v_e => out.push(XmlDifference::AttributeValue {
                        path: here.clone(),
                        name: k.clone(),
                        expected: truncate(v_e, 120),
                        actual: truncate(v_a, 120),
                    }),
                    Some(_) => {}
                }
            }
            for (k, v_a) in a_attrs {
                if !e_attrs.contains_key(k) {
                    out.push(XmlDifference::ExtraAttribute {
                        path: here.clone(),
                        name: k.clone(),
                        actual: truncate(v_a, 120),
                    });
                }
            }

            let n = e_children.len().min(a_children.len());
            for i in 0..n {
                path.push(format!("{}[{}]", e_children[i].label(), i));
                diff_path(&e_children[i], &a_children[i], path, out);
                path.pop();
            }
            if e_children.len() != a_children.len() {
                out.push(XmlDifference::ChildCount {
                    path: here,
                    expected: e_children.len(),
                    actual: a_children.len(),
                });
            }
        }
        _ => out.push(XmlDifference::NodeKind {
            path: here.clone(),
            expected: expected.describe(),
            actual: actual.describe(),
        }),
    }
}

/// Every structural difference between `expected` and `actual`, in document order.
pub fn diff(expected: &DomNode, actual: &DomNode) -> Vec<XmlDifference> {
    let mut path = vec![expected.label()];
    let mut out = Vec::new();
    diff_path(expected, actual, &mut path, &mut out);
    out
}

fn escape(s: &str, attr: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn write_canonical(n: &DomNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match n {
        DomNode::Text(t) => {
            let _ = writeln!(out, "{indent}{}", escape(t, false));
        }
        DomNode::Element {
            name,
            attrs,
            children,
        } => {
            let _ = write!(out, "{indent}<{name}");
            for (k, v) in attrs {
                let _ = write!(out, " {k}=\"{}\"", escape(v, true));
            }
            if children.is_empty() {
                let _ = writeln!(out, "/>");
                return;
            }
            let _ = writeln!(out, ">");
            for c in children {
                write_canonical(c, depth + 1, out);
            }
            let _ = writeln!(out, "{indent}</{name}>");
        }
    }
}

/// Canonical text form: one node per line, sorted attributes, expanded names.
///
/// Two documents without [`diff`] differences have identical canonical forms, which makes this
/// useful for eyeballing mismatches with an ordinary text diff tool.
pub fn canonical_xml(text: &str, ignore_ws: bool) -> std::result::Result<String, String> {
    let doc = parse_document(text)?;
    let mut out = String::new();
    write_canonical(&build_node(doc.root_element(), ignore_ws), 0, &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dom(s: &str) -> DomNode {
        parse(s, Path::new("test.xml"), true).expect("well-formed")
    }

    #[test]
    fn whitespace_only_text_is_ignored() {
        let a = dom("<root>\n  <a x=\"1\">hi</a>\n</root>");
        let b = dom("<root><a x=\"1\">  hi </a></root>");
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn whitespace_is_significant_when_not_ignored() {
        let a = parse("<r><a> hi</a></r>", Path::new("a.xml"), false).unwrap();
        let b = parse("<r><a>hi</a></r>", Path::new("b.xml"), false).unwrap();
        assert_eq!(diff(&a, &b).len(), 1);
    }

    #[test]
    fn single_attribute_change_is_one_difference() {
        let a = dom(r#"<root><item id="1" kind="x"/><item id="2"/></root>"#);
        let b = dom(r#"<root><item kind="y" id="1"/><item id="2"/></root>"#);
        assert_eq!(
            diff(&a, &b),
            vec![XmlDifference::AttributeValue {
                path: "root/item[0]".to_string(),
                name: "kind".to_string(),
                expected: "x".to_string(),
                actual: "y".to_string(),
            }]
        );
    }

    #[test]
    fn all_differences_are_collected() {
        let a = dom(r#"<root a="1"><x>one</x><y/><z/></root>"#);
        let b = dom(r#"<root b="2"><x>two</x><w/></root>"#);
        let diffs = diff(&a, &b);
        assert_eq!(diffs.len(), 5, "{diffs:#?}");
        assert!(matches!(diffs[0], XmlDifference::MissingAttribute { ref name, .. } if name == "a"));
        assert!(matches!(diffs[1], XmlDifference::ExtraAttribute { ref name, .. } if name == "b"));
        assert!(matches!(diffs[2], XmlDifference::Text { ref path, .. } if path == "root/x[0]/text()[0]"));
        assert!(matches!(diffs[3], XmlDifference::ElementName { ref actual, .. } if actual == "w"));
        assert!(matches!(
            diffs[4],
            XmlDifference::ChildCount {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn namespace_prefixes_do_not_matter_but_namespaces_do() {
        let a = dom(r#"<a:doc xmlns:a="urn:x"><a:p/></a:doc>"#);
        let b = dom(r#"<doc xmlns="urn:x"><p/></doc>"#);
        assert!(diff(&a, &b).is_empty());

        let c = dom(r#"<doc xmlns="urn:y"><p/></doc>"#);
        assert_eq!(diff(&a, &c).len(), 1);
    }

    #[test]
    fn comments_are_not_compared_and_cdata_is_text() {
        let a = dom("<r><!-- note --><t>a &lt; b</t></r>");
        let b = dom("<r><t><![CDATA[a < b]]></t></r>");
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn processing_instructions_are_not_compared_and_do_not_split_text() {
        let a = dom("<r><?render mode=\"fast\"?><t>ab</t></r>");
        let b = dom("<r><t>a<!-- split -->b<?x?></t></r>");
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn element_versus_text_is_a_node_kind_difference() {
        let a = dom("<r><a/></r>");
        let b = dom("<r>a</r>");
        let diffs = diff(&a, &b);
        assert_eq!(diffs.len(), 1);
        assert!(matches!(diffs[0], XmlDifference::NodeKind { .. }));
    }

    #[test]
    fn malformed_input_names_the_file() {
        let err = parse("<r><a></r>", Path::new("bad.xml"), true).unwrap_err();
        assert!(matches!(err, Error::XmlParse { ref path, .. } if path == Path::new("bad.xml")));
    }

    #[test]
    fn canonical_form_sorts_attributes() {
        let out = canonical_xml(r#"<r b="2" a="1"><c>t</c></r>"#, true).unwrap();
        assert_eq!(out, "<r a=\"1\" b=\"2\">\n  <c>\n    t\n  </c>\n</r>\n");
    }
}
