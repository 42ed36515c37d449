use assert_cmd::cargo::cargo_bin_cmd;
use image::{Rgba, RgbaImage};
use pdf_engine::{blank_document, OpenSource, PageSize, PdfEngine};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

fn write_pdf(dir: &Path, name: &str, pages: &[PageSize]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, blank_document(pages).expect("blank document should build"))
        .expect("fixture should be written");
    path
}

fn letter_pdf(dir: &Path) -> PathBuf {
    write_pdf(dir, "letter.pdf", &[PageSize { width_pt: 612.0, height_pt: 792.0 }])
}

fn write_png(dir: &Path) -> PathBuf {
    let path = dir.join("stamp.png");
    RgbaImage::from_pixel(20, 10, Rgba([0, 90, 200, 255]))
        .save(&path)
        .expect("png fixture should be written");
    path
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should contain valid json")
}

fn stamped_annotation_count(path: &Path) -> usize {
    let mut engine = pdf_engine::default_engine();
    let handle = engine.open(OpenSource::from(path)).expect("stamped PDF should open");
    engine.annotation_count(handle, 0).expect("annotation count should succeed")
}

#[test]
fn info_emits_stable_json_contract() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(
        temp.path(),
        "two.pdf",
        &[
            PageSize { width_pt: 612.0, height_pt: 792.0 },
            PageSize { width_pt: 300.0, height_pt: 200.0 },
        ],
    );

    let output = cargo_bin_cmd!("stampkit").arg("info").arg(&pdf).assert().success().get_output().clone();
    let value = stdout_json(&output);

    assert_eq!(value["page_count"], 2);
    assert_eq!(value["page_sizes_pt"][1]["width"], 300.0);
    assert_eq!(value["page_sizes_pt"][1]["height"], 200.0);
    assert_eq!(value["annotation_counts"], serde_json::json!([0, 0]));
}

#[test]
fn blank_writes_requested_pages() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let output_path = temp.path().join("nested").join("blank.pdf");

    cargo_bin_cmd!("stampkit")
        .arg("blank")
        .arg(&output_path)
        .args(["--pages", "3", "--width", "300", "--height", "400"])
        .assert()
        .success()
        .stdout(predicate::str::contains("blank.pdf"));

    let mut engine = pdf_engine::default_engine();
    let handle = engine.open(OpenSource::from(output_path.as_path())).expect("blank PDF should open");
    assert_eq!(engine.page_count(handle).expect("count should succeed"), 3);
    assert_eq!(
        engine.page_size(handle, 2).expect("size should succeed"),
        PageSize { width_pt: 300.0, height_pt: 400.0 }
    );
}

#[test]
fn blank_rejects_zero_pages() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("stampkit")
        .arg("blank")
        .arg(temp.path().join("none.pdf"))
        .args(["--pages", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--pages must be >= 1"));
}

#[test]
fn stamp_without_script_commits_centered_sticker() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = letter_pdf(temp.path());
    let png = write_png(temp.path());
    let output_path = temp.path().join("out.pdf");

    let output = cargo_bin_cmd!("stampkit")
        .env("STAMPKIT_CONFIG_DIR", temp.path().join("config"))
        .arg("stamp")
        .arg(&pdf)
        .arg("--image")
        .arg(&png)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success()
        .get_output()
        .clone();

    let value = stdout_json(&output);
    let annotations = value["annotations"].as_array().expect("annotations array");
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0]["rotation"], 0.0);

    // the sticker starts centered on the page, so its content is centered too
    let bounds = &annotations[0]["bounds"];
    let center_x = bounds["origin"]["x"].as_f64().expect("x")
        + bounds["size"]["width"].as_f64().expect("width") / 2.0;
    let center_y = bounds["origin"]["y"].as_f64().expect("y")
        + bounds["size"]["height"].as_f64().expect("height") / 2.0;
    assert!((center_x - 306.0).abs() < 0.01, "{center_x}");
    assert!((center_y - 396.0).abs() < 0.01, "{center_y}");

    assert_eq!(stamped_annotation_count(&output_path), 1);
}

#[test]
fn stamp_replays_gesture_script() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = letter_pdf(temp.path());
    let png = write_png(temp.path());
    let script = temp.path().join("script.json");
    fs::write(
        &script,
        r#"[
            { "type": "rotation", "phase": "began", "rotation": 0.0 },
            { "type": "rotation", "phase": "changed", "rotation": 0.5 },
            { "type": "rotation", "phase": "ended", "rotation": 0.5 },
            { "type": "tap", "location": { "x": 1.0, "y": 1.0 } }
        ]"#,
    )
    .expect("script should be written");

    let output = cargo_bin_cmd!("stampkit")
        .env("STAMPKIT_CONFIG_DIR", temp.path().join("config"))
        .arg("stamp")
        .arg(&pdf)
        .arg("--image")
        .arg(&png)
        .arg("--script")
        .arg(&script)
        .assert()
        .success()
        .get_output()
        .clone();

    let value = stdout_json(&output);
    assert_eq!(value["annotations"][0]["rotation"], 0.5);
    assert!(value["output"].as_str().expect("output path").ends_with("letter-stamped.pdf"));
    assert_eq!(stamped_annotation_count(&temp.path().join("letter-stamped.pdf")), 1);
}

#[test]
fn stamp_rejects_invalid_script() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = letter_pdf(temp.path());
    let png = write_png(temp.path());
    let script = temp.path().join("bad.json");
    fs::write(&script, r#"[{ "type": "wiggle" }]"#).expect("script should be written");

    cargo_bin_cmd!("stampkit")
        .env("STAMPKIT_CONFIG_DIR", temp.path().join("config"))
        .arg("stamp")
        .arg(&pdf)
        .arg("--image")
        .arg(&png)
        .arg("--script")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid gesture script"));
}

#[test]
fn stamp_fails_for_page_out_of_range() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = letter_pdf(temp.path());
    let png = write_png(temp.path());

    cargo_bin_cmd!("stampkit")
        .env("STAMPKIT_CONFIG_DIR", temp.path().join("config"))
        .arg("stamp")
        .arg(&pdf)
        .arg("--image")
        .arg(&png)
        .args(["--page", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn stamp_fails_for_undecodable_image() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = letter_pdf(temp.path());
    let not_an_image = temp.path().join("stamp.png");
    fs::write(&not_an_image, b"definitely not a png").expect("fixture should be written");

    cargo_bin_cmd!("stampkit")
        .env("STAMPKIT_CONFIG_DIR", temp.path().join("config"))
        .arg("stamp")
        .arg(&pdf)
        .arg("--image")
        .arg(&not_an_image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to decode image"));
}

#[test]
fn config_init_writes_defaults() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let config_dir = temp.path().join("config");

    cargo_bin_cmd!("stampkit")
        .env("STAMPKIT_CONFIG_DIR", &config_dir)
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pinch_to_scale\": false"));

    assert!(config_dir.join("editor-config.json").exists());
}

#[test]
fn config_reports_newer_schema() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    fs::write(temp.path().join("editor-config.json"), r#"{ "version": 99, "config": {} }"#)
        .expect("config should be written");

    cargo_bin_cmd!("stampkit")
        .env("STAMPKIT_CONFIG_DIR", temp.path())
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("newer than supported"));
}

#[test]
fn stamp_rejects_invalid_config() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = letter_pdf(temp.path());
    let png = write_png(temp.path());
    let config_dir = temp.path().join("config");
    fs::create_dir_all(&config_dir).expect("config dir should be created");
    fs::write(
        config_dir.join("editor-config.json"),
        r#"{ "version": 1, "config": { "min_visible_fraction": -1.0 } }"#,
    )
    .expect("config should be written");

    cargo_bin_cmd!("stampkit")
        .env("STAMPKIT_CONFIG_DIR", &config_dir)
        .arg("stamp")
        .arg(&pdf)
        .arg("--image")
        .arg(&png)
        .assert()
        .failure()
        .stderr(predicate::str::contains("min_visible_fraction must be a finite number >= 0"));
}

#[test]
fn version_prints_package_version() {
    cargo_bin_cmd!("stampkit")
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn info_fails_for_missing_file() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("stampkit")
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

    cargo_bin_cmd!("stampkit")
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open PDF"));
}

#[test]
fn info_fails_for_encrypted_marker_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let path = temp.path().join("encrypted-marker.pdf");
    fs::write(&path, b"%PDF-1.5\ntrailer << /Encrypt 1 0 R >>\n%%EOF\n")
        .expect("fixture should be written");

    cargo_bin_cmd!("stampkit")
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("encrypted PDFs are not supported"));
}
