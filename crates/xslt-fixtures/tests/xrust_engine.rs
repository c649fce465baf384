#![cfg(feature = "xrust")]

use std::fs;
use std::path::Path;
use xslt_fixtures::compare::{self, ContentKind};
use xslt_fixtures::{Error, Harness, HarnessConfig, TransformError, TransformRunner, XrustEngine};

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, text).expect("write");
}

#[test]
fn literal_result_stylesheet_produces_expected_xml() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = HarnessConfig::default().rooted_at(tmp.path());
    let sheet = config.stylesheet_root.join("greet.xsl");
    let input = config.fixture_root.join("greet/input1.xml");
    write(
        &sheet,
        r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:template match="/"><greeting><xsl:value-of select="/person/name"/></greeting></xsl:template>
</xsl:stylesheet>"#,
    );
    write(&input, "<person><name>Ada</name></person>");

    let runner = TransformRunner::new(XrustEngine, config.layout());
    let out = runner.run(&input, &sheet).expect("transform");
    assert_eq!(out, config.scratch_root.join("greet/input1.xml"));

    let produced = fs::read(&out).expect("read output");
    let diffs = compare::compare_as(
        ContentKind::Xml,
        Path::new("expected.xml"),
        b"<greeting>Ada</greeting>",
        &out,
        &produced,
    )
    .expect("compare");
    assert!(diffs.is_empty(), "{diffs:?}");
}

#[test]
fn host_function_call_never_reaches_the_engine() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = HarnessConfig::default().rooted_at(tmp.path());
    let sheet = config.stylesheet_root.join("exec.xsl");
    let input = config.fixture_root.join("exec/input1.xml");
    write(
        &sheet,
        r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform"
    xmlns:rt="http://xml.apache.org/xalan/java/java.lang.Runtime">
  <xsl:template match="/"><xsl:value-of select="rt:exec(rt:getRuntime(), 'id')"/></xsl:template>
</xsl:stylesheet>"#,
    );
    write(&input, "<a/>");

    let runner = TransformRunner::new(XrustEngine, config.layout());
    let err = runner.run(&input, &sheet).unwrap_err();
    assert!(
        matches!(err, Error::Transform(TransformError::ExtensionDenied { .. })),
        "{err}"
    );
    assert!(!config.scratch_root.join("exec/input1.xml").exists());
}

#[test]
fn text_method_output_is_written_unescaped() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = HarnessConfig::default().rooted_at(tmp.path());
    let sheet = config.stylesheet_root.join("raw.xsl");
    let input = config.fixture_root.join("raw/input1.xml");
    write(
        &sheet,
        r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:output method="text"/>
  <xsl:template match="/"><xsl:text>{"a":1} &lt; 2 &amp; 3</xsl:text></xsl:template>
</xsl:stylesheet>"#,
    );
    write(&input, "<a/>");

    let runner = TransformRunner::new(XrustEngine, config.layout());
    let out = runner.run(&input, &sheet).expect("transform");
    assert_eq!(fs::read_to_string(&out).expect("read"), r#"{"a":1} < 2 & 3"#);
}

#[test]
fn text_method_stylesheet_emits_strict_json() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = HarnessConfig::default().rooted_at(tmp.path());
    let sheet = config.stylesheet_root.join("convert.xsl");
    let input = config.fixture_root.join("convert/input1.xml");
    let expected = config.fixture_root.join("convert/output1.json");
    write(
        &sheet,
        r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:output method="text"/>
  <xsl:template match="/list">
    <xsl:text>[</xsl:text>
    <xsl:for-each select="item">
      <xsl:text>{"name":"</xsl:text><xsl:value-of select="."/><xsl:text>"}</xsl:text>
      <xsl:if test="following-sibling::item"><xsl:text>,</xsl:text></xsl:if>
    </xsl:for-each>
    <xsl:text>]</xsl:text>
  </xsl:template>
</xsl:stylesheet>"#,
    );
    write(&input, "<list><item>a</item><item>b &amp; c</item></list>");
    write(&expected, r#"[ {"name": "a"}, {"name": "b & c"} ]"#);

    let runner = TransformRunner::new(XrustEngine, config.layout());
    let out = runner.run(&input, &sheet).expect("transform");
    let diffs = compare::compare(&expected, &out).expect("compare");
    assert!(diffs.is_empty(), "{diffs:?}");
}

#[test]
fn sample_corpus_passes() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let scratch = tempfile::tempdir().expect("tempdir");
    let mut config = HarnessConfig::from_file(&root.join("xslt-fixtures.yaml"))
        .expect("config")
        .rooted_at(&root);
    config.scratch_root = scratch.path().to_path_buf();

    let report = Harness::new(config, XrustEngine).run_all().expect("run");
    assert!(report.is_success(), "{report}");
    assert_eq!(report.cases, 2);
    assert_eq!(report.passed, 2);
    assert!(scratch.path().join("convert/input1.xml").is_file());
}
