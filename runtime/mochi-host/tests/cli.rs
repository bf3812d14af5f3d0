use std::fs;
use std::process::Command;

use serde_json::{Value as JsonValue, json};

const BUNDLE: &str = r#"
class Source {
  async playlistDetails(id) {
    console.info("details for", id);
    return {
      synopsis: `about ${id}`,
      altTitles: [],
      altPosters: [],
      altBanners: [],
      genres: ["drama"],
      yearReleased: 2023,
      previews: [],
    };
  }
}
"#;

fn mochi_host() -> Command {
    Command::new(env!("CARGO_BIN_EXE_mochi-host"))
}

#[test]
fn invokes_a_script_module() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bundle.js"), BUNDLE).unwrap();
    let manifest = dir.path().join("manifest.json");
    fs::write(
        &manifest,
        json!({
            "id": "demo",
            "name": "Demo",
            "version": "1.0.0",
            "backend": "script",
            "file": "bundle.js",
        })
        .to_string(),
    )
    .unwrap();

    let output = mochi_host()
        .arg("invoke")
        .arg(&manifest)
        .arg("playlist_details")
        .args(["--arg", r#""frieren""#])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let value: JsonValue = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["synopsis"], "about frieren");
    assert_eq!(value["yearReleased"], 2023);
}

#[test]
fn rejects_non_json_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("manifest.json");
    fs::write(
        &manifest,
        r#"{"id":"demo","name":"Demo","version":"1","backend":"script","file":"missing.js"}"#,
    )
    .unwrap();
    let output = mochi_host()
        .arg("invoke")
        .arg(&manifest)
        .arg("search")
        .args(["--arg", "{not json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not JSON"));
}

#[test]
fn inspects_an_empty_wasm_module() {
    let dir = tempfile::tempdir().unwrap();
    let module = dir.path().join("empty.wasm");
    fs::write(&module, b"\0asm\x01\0\0\0").unwrap();
    let output = mochi_host().arg("inspect").arg(&module).arg("--json").output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary: JsonValue = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary, json!({"imports": [], "exports": []}));
}
