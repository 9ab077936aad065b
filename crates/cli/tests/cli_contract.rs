use assert_cmd::cargo::cargo_bin_cmd;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

fn write_sample_pdf(dir: &Path, name: &str, page_count: usize) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();

    for _ in 0..page_count {
        let content = b"0 0 1 rg 0 0 10 10 re f".to_vec();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "MediaBox" => vec![0.into(), 0.into(), 600.into(), 800.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).expect("sample pdf should be written");
    path
}

fn write_script(dir: &Path, script: &str) -> PathBuf {
    let path = dir.join("script.json");
    fs::write(&path, script).expect("script should be written");
    path
}

fn page_operations(doc: &Document, page_number: u32) -> Vec<Operation> {
    let page_id = doc.get_pages()[&page_number];
    let content = doc.get_page_content(page_id).expect("page content should be readable");
    Content::decode(&content).expect("page content should decode").operations
}

fn operands(operation: &Operation) -> Vec<f32> {
    operation
        .operands
        .iter()
        .map(|operand| operand.as_float().expect("operand should be numeric"))
        .collect()
}

fn find<'a>(operations: &'a [Operation], operator: &str) -> Vec<&'a Operation> {
    operations.iter().filter(|operation| operation.operator == operator).collect()
}

#[test]
fn version_prints_package_version() {
    let output = cargo_bin_cmd!("inkstamp-cli")
        .arg("version")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    insta::assert_snapshot!(String::from_utf8_lossy(&output).trim(), @"0.1.0");
}

#[test]
fn info_emits_stable_json_contract() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path(), "small.pdf", 2);

    let output = cargo_bin_cmd!("inkstamp-cli")
        .arg("info")
        .arg(&pdf)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: Value = serde_json::from_slice(&output).expect("stdout should contain valid json");
    let first = &value["first_page_size_pt"];
    let summary =
        format!("pages={} first={}x{}", value["page_count"], first["width"], first["height"]);

    insta::assert_snapshot!(summary, @"pages=2 first=600.0x800.0");
}

#[test]
fn info_fails_for_missing_file() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("inkstamp-cli")
        .arg("info")
        .arg(temp.path().join("missing.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn info_fails_for_invalid_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let path = temp.path().join("invalid.pdf");
    fs::write(&path, b"this is not a pdf").expect("fixture should be written");

    cargo_bin_cmd!("inkstamp-cli")
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open PDF"));
}

#[test]
fn info_fails_for_encrypted_marker_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let path = temp.path().join("encrypted.pdf");
    fs::write(&path, b"%PDF-1.5\ntrailer << /Encrypt 5 0 R >>\n%%EOF")
        .expect("fixture should be written");

    cargo_bin_cmd!("inkstamp-cli")
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("encrypted PDFs are not supported"));
}

#[test]
fn annotate_bakes_gestures_into_output() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path(), "contract.pdf", 2);
    let output = temp.path().join("out").join("signed.pdf");
    let script = write_script(
        temp.path(),
        r##"{
            "origin": [10, 20],
            "steps": [
                { "color": "#ff0000" },
                { "tool": "highlight" },
                { "down": [60, 70] },
                { "move": [100, 90] },
                { "up": [160, 110] },
                { "tool": "comment" },
                { "down": [110, 70] },
                { "comment": "Review" },
                { "page": 2 },
                { "tool": "signature" },
                { "down": [30, 40] },
                { "sign": [[[10, 10], [80, 40], [150, 20]]] }
            ]
        }"##,
    );

    cargo_bin_cmd!("inkstamp-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--script")
        .arg(&script)
        .arg("--output")
        .arg(&output)
        .arg("--config-dir")
        .arg(temp.path().join("config"))
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("1\tHighlight\t#ff0000\t"))
        .stdout(predicate::str::contains("1\tComment\t#ff0000\tReview"))
        .stdout(predicate::str::contains("2\tSignature"))
        .stdout(predicate::str::contains("signed.pdf"));

    let doc = Document::load(&output).expect("annotated pdf should parse");
    assert_eq!(doc.get_pages().len(), 2);

    let first = page_operations(&doc, 1);
    let rects: Vec<_> = find(&first, "re").into_iter().map(operands).collect();
    assert!(
        rects.contains(&vec![50.0, 710.0, 100.0, 40.0]),
        "highlight should be flipped into export space: {rects:?}"
    );
    let texts: Vec<_> = find(&first, "Tj")
        .into_iter()
        .map(|op| op.operands[0].as_str().expect("text operand should be a string").to_vec())
        .collect();
    assert_eq!(texts, vec![b"Review".to_vec()]);
    let anchors: Vec<_> = find(&first, "Td").into_iter().map(operands).collect();
    assert_eq!(anchors, vec![vec![100.0, 750.0]]);

    let second = page_operations(&doc, 2);
    let placements: Vec<_> = find(&second, "cm").into_iter().map(operands).collect();
    assert_eq!(placements, vec![vec![200.0, 0.0, 0.0, 100.0, 20.0, 680.0]]);
    assert_eq!(find(&second, "Do").len(), 1);
}

#[test]
fn annotate_defaults_output_name_from_config() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path(), "letter.pdf", 1);
    let config_dir = temp.path().join("config");
    fs::create_dir_all(&config_dir).expect("config dir should be created");
    fs::write(
        config_dir.join("config.json"),
        r#"{ "version": 1, "config": { "output_file_name": "letter-annotated.pdf" } }"#,
    )
    .expect("config should be written");
    let script = write_script(
        temp.path(),
        r#"{ "steps": [ { "tool": "highlight" }, { "down": [5, 5] }, { "up": [5, 5] } ] }"#,
    );

    cargo_bin_cmd!("inkstamp-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--script")
        .arg(&script)
        .arg("--config-dir")
        .arg(&config_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("letter-annotated.pdf"));

    let exported = temp.path().join("letter-annotated.pdf");
    let doc = Document::load(&exported).expect("exported pdf should parse");
    let operations = page_operations(&doc, 1);
    assert_eq!(find(&operations, "re").len(), 1, "only the original rectangle should remain");
}

#[test]
fn annotate_rejects_non_pdf_upload() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let source = write_sample_pdf(temp.path(), "sample.pdf", 1);
    let renamed = temp.path().join("sample.txt");
    fs::rename(&source, &renamed).expect("rename should succeed");
    let script = write_script(temp.path(), r#"{ "steps": [] }"#);

    cargo_bin_cmd!("inkstamp-cli")
        .arg("annotate")
        .arg(&renamed)
        .arg("--script")
        .arg(&script)
        .arg("--config-dir")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a PDF document"));
}
