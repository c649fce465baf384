//! Static checks run on every stylesheet before it reaches an engine.
//!
//! Stylesheets are untrusted. Anything that would let one call out of the XSLT/XPath function
//! library is rejected up front:
//! - extension elements (`extension-element-prefixes`) and embedded script/component elements
//! - XPath function calls whose prefix is bound to a namespace other than the standard function,
//!   schema-type, or stylesheet-defined (`xsl:function`) namespaces

use crate::error::TransformError;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

pub(crate) const XSLT_NS: &str = "http://www.w3.org/1999/XSL/Transform";

const ALLOWED_FUNCTION_NS: &[&str] = &[
    XSLT_NS,
    "http://www.w3.org/2005/xpath-functions",
    "http://www.w3.org/2005/xpath-functions/math",
    "http://www.w3.org/2005/xpath-functions/map",
    "http://www.w3.org/2005/xpath-functions/array",
    "http://www.w3.org/2001/XMLSchema",
];

const SCRIPT_NS: &[&str] = &[
    "urn:schemas-microsoft-com:xslt",
    "http://xml.apache.org/xalan",
    "http://xml.apache.org/xslt",
    "http://xml.apache.org/xalan/java",
    "http://saxon.sf.net/",
];

/// XSLT attributes that hold XPath expressions or patterns.
const EXPRESSION_ATTRS: &[&str] = &[
    "select", "test", "match", "use", "count", "from", "value", "group-by", "group-adjacent",
    "group-starting-with", "group-ending-with", "regex", "xpath", "context-item", "initial-value",
];

fn re_function_call() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| {
        Regex::new(r"([A-Za-z_][\w.\-]*):([A-Za-z_][\w.\-]*)\s*\(")
            .expect("function-call regex must compile")
    })
}

fn re_string_literal() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| {
        Regex::new(r#""[^"]*"|'[^']*'"#).expect("string-literal regex must compile")
    })
}

/// Expression parts of an attribute value template (`a{expr}b{{literal}}`).
fn avt_expressions(value: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = value;
    while let Some(open) = rest.find('{') {
        if rest[open + 1..].starts_with('{') {
            rest = &rest[open + 2..];
            continue;
        }
        let Some(close) = rest[open + 1..].find('}') else {
            break;
        };
        out.push(&rest[open + 1..open + 1 + close]);
        rest = &rest[open + 1 + close + 1..];
    }
    out
}

fn denied(stylesheet: &Path, what: String) -> TransformError {
    TransformError::ExtensionDenied {
        stylesheet: stylesheet.to_path_buf(),
        what,
    }
}

fn check_expression(
    node: roxmltree::Node<'_, '_>,
    expr: &str,
    user_functions: &BTreeSet<String>,
    stylesheet: &Path,
) -> Result<(), TransformError> {
    let expr = re_string_literal().replace_all(expr, "''");
    for caps in re_function_call().captures_iter(&expr) {
        let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let local = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let Some(ns) = node.lookup_namespace_uri(Some(prefix)) else {
            return Err(TransformError::Compile {
                stylesheet: stylesheet.to_path_buf(),
                message: format!("undeclared namespace prefix `{prefix}` in `{prefix}:{local}()`"),
            });
        };
        if ALLOWED_FUNCTION_NS.contains(&ns) || user_functions.contains(&format!("{{{ns}}}{local}"))
        {
            continue;
        }
        return Err(denied(
            stylesheet,
            format!("external function `{prefix}:{local}()` ({ns})"),
        ));
    }
    Ok(())
}

/// Expanded names of `xsl:function` declarations.
fn user_functions(doc: &roxmltree::Document<'_>) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for n in doc
        .descendants()
        .filter(|n| n.has_tag_name((XSLT_NS, "function")))
    {
        let Some((prefix, local)) = n.attribute("name").and_then(|v| v.split_once(':')) else {
            continue;
        };
        if let Some(ns) = n.lookup_namespace_uri(Some(prefix)) {
            out.insert(format!("{{{ns}}}{local}"));
        }
    }
    out
}

pub(crate) fn check(doc: &roxmltree::Document<'_>, stylesheet: &Path) -> Result<(), TransformError> {
    let functions = user_functions(doc);

    for n in doc.descendants().filter(|n| n.is_element()) {
        let ns = n.tag_name().namespace();
        let in_xslt = ns == Some(XSLT_NS);

        if let Some(ns) = ns.filter(|ns| SCRIPT_NS.contains(ns)) {
            return Err(denied(
                stylesheet,
                format!("script element <{}> ({ns})", n.tag_name().name()),
            ));
        }
        if in_xslt && n.tag_name().name() == "script" {
            return Err(denied(stylesheet, "xsl:script element".to_string()));
        }
        // Dynamic XPath cannot be scanned ahead of time.
        if in_xslt && n.tag_name().name() == "evaluate" {
            return Err(denied(stylesheet, "xsl:evaluate element".to_string()));
        }

        for a in n.attributes() {
            let is_ext_prefixes = a.name() == "extension-element-prefixes"
                && (if in_xslt {
                    a.namespace().is_none()
                } else {
                    a.namespace() == Some(XSLT_NS)
                });
            if is_ext_prefixes && !a.value().trim().is_empty() {
                return Err(denied(
                    stylesheet,
                    format!("extension elements (prefixes: {})", a.value().trim()),
                ));
            }

            if in_xslt && a.namespace().is_none() && EXPRESSION_ATTRS.contains(&a.name()) {
                check_expression(n, a.value(), &functions, stylesheet)?;
            } else if !in_xslt || matches!(a.name(), "name" | "namespace" | "href") {
                for expr in avt_expressions(a.value()) {
                    check_expression(n, expr, &functions, stylesheet)?;
                }
            }
        }
    }
    Ok(())
}
