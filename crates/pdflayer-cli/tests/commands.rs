mod common;

use common::{cmd, pdf_bytes, write};
use predicates::prelude::*;

const RED_RECT: &[u8] = b"1 0 0 rg 100 100 200 50 re f";
const MANIFEST: &str =
    r#"{"pages":[{"texts":[{"xNorm":0.1,"yNormTop":0.2,"text":"Hi","fontSize":12}]}]}"#;

fn stdout_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

#[test]
fn extract_prints_items_and_page_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "doc.pdf", &pdf_bytes(&[RED_RECT], None));

    let output = cmd().arg("extract").arg(&path).output().unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output.stdout);
    assert_eq!(json["pageDimensions"]["width"], 612.0);
    assert_eq!(json["pageDimensions"]["height"], 792.0);
    assert_eq!(json["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["items"][0]["type"], "vector");
    assert!(json.get("strategy").is_none());
}

#[test]
fn extract_with_warnings_reports_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "doc.pdf", &pdf_bytes(&[b""], Some(MANIFEST)));

    let output = cmd()
        .args(["extract", "--warnings"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output.stdout);
    assert_eq!(json["strategy"], "manifest");
    assert_eq!(json["warnings"], serde_json::json!([]));
    assert_eq!(json["items"][0]["type"], "text");
    assert_eq!(json["items"][1]["type"], "textSpan");
}

#[test]
fn extract_font_family_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "doc.pdf",
        &pdf_bytes(&[b"BT /F1 12 Tf 72 700 Td (Hello) Tj ET"], None),
    );

    let output = cmd()
        .args(["extract", "--font-family", "Inter"])
        .arg(&path)
        .output()
        .unwrap();
    let json = stdout_json(&output.stdout);
    assert_eq!(json["items"][0]["text"], "Hello");
    assert_eq!(json["items"][0]["fontFamily"], "Inter");
}

#[test]
fn extract_pretty_output_is_indented() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "doc.pdf", &pdf_bytes(&[RED_RECT], None));
    cmd()
        .args(["extract", "--pretty"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"items\""));
}

#[test]
fn extract_missing_file() {
    cmd()
        .args(["extract", "/nonexistent/doc.pdf"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: file not found: /nonexistent/doc.pdf"));
}

#[test]
fn extract_rejects_non_pdf_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "doc.txt", &pdf_bytes(&[RED_RECT], None));
    cmd()
        .arg("extract")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Invalid file type. Only PDF files are allowed.",
        ));
}

#[test]
fn extract_unparseable_pdf_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "broken.pdf", b"%PDF-1.7\nnot really");
    cmd()
        .arg("extract")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error: "))
        .stdout(predicate::str::is_empty());
}

#[test]
fn manifest_prints_source_and_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "doc.pdf", &pdf_bytes(&[b""], Some(MANIFEST)));

    let output = cmd().arg("manifest").arg(&path).output().unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output.stdout);
    assert_eq!(json["source"], "EmbeddedFiles name tree");
    assert_eq!(json["fileName"], "manifest.json");
    assert_eq!(json["manifest"]["pages"][0]["texts"][0]["text"], "Hi");
}

#[test]
fn manifest_absent_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "doc.pdf", &pdf_bytes(&[RED_RECT], None));
    cmd()
        .arg("manifest")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: no embedded manifest found"));
}

#[test]
fn pages_lists_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "doc.pdf", &pdf_bytes(&[b"", b""], None));
    cmd()
        .arg("pages")
        .arg(&path)
        .assert()
        .success()
        .stdout("0\t612\t792\n1\t612\t792\n");
}
