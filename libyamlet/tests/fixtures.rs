//! Test harness for the yamlet decoder against fixture files.
//!
//! This test harness reads all .yaml files from the test/yaml/ directory,
//! decodes them, and compares the result against the expected tree in the
//! matching test/json/ file. It also reads .nay files from test/nay/
//! (expected to fail in strict mode) and verifies they produce the expected
//! error messages from the corresponding .error files.
//!
//! Fixtures named `lenient-*` rely on lenient recovery and are skipped by
//! the strict pass.

use std::fs;
use std::path::{Path, PathBuf};

use libyamlet::{decode, decode_with_options, try_encode, DecodeOptions, Scalar, Value};

/// Root test directory.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
}

/// Get all files matching `*.ext` in a subdirectory of test/.
fn get_files_in_subdir(subdir: &str, ext: &str) -> Vec<PathBuf> {
    let pattern = test_root().join(subdir).join(format!("*.{}", ext));
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .collect();
    files.sort();
    files
}

fn stem(path: &Path) -> String {
    path.file_stem().unwrap().to_string_lossy().to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

/// Read the expected JSON tree for a .yaml fixture.
fn read_expected_json(yaml_path: &Path) -> Option<serde_json::Value> {
    let json_path = test_root()
        .join("json")
        .join(format!("{}.json", stem(yaml_path)));
    let text = fs::read_to_string(json_path).ok()?;
    Some(serde_json::from_str(&text).unwrap())
}

/// Read the expected error message for a .nay file.
fn read_expected_error(nay_path: &Path) -> Option<String> {
    let error_path = test_root()
        .join("nay")
        .join(format!("{}.error", stem(nay_path)));
    fs::read_to_string(error_path).ok()
}

/// Convert a decoded tree to JSON for comparison.
fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Scalar(Scalar::Null) => serde_json::Value::Null,
        Value::Scalar(Scalar::Bool(b)) => serde_json::Value::Bool(*b),
        Value::Scalar(Scalar::Integer(n)) => serde_json::Value::from(*n),
        Value::Scalar(Scalar::Float(f)) => serde_json::Value::from(*f),
        Value::Scalar(Scalar::String(s)) => serde_json::Value::String(s.clone()),
        Value::Sequence(seq) => serde_json::Value::Array(seq.iter().map(to_json).collect()),
        Value::Mapping(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), to_json(v))).collect(),
        ),
    }
}

#[test]
fn test_yaml_fixtures() {
    let files = get_yaml_files();
    assert!(!files.is_empty(), "no .yaml fixtures found");

    let mut failures = Vec::new();
    for path in &files {
        let source = fs::read_to_string(path).unwrap();
        let Some(expected) = read_expected_json(path) else {
            failures.push(format!("{}: missing expected .json", file_name(path)));
            continue;
        };
        match decode(&source) {
            Ok(value) => {
                let actual = to_json(&value);
                if actual != expected {
                    failures.push(format!(
                        "{}:\n  expected: {}\n  actual:   {}",
                        file_name(path),
                        expected,
                        actual
                    ));
                }
            }
            Err(e) => failures.push(format!("{}: {}", file_name(path), e)),
        }
    }

    assert!(failures.is_empty(), "fixture failures:\n{}", failures.join("\n"));
}

#[test]
fn test_yaml_fixtures_strict() {
    for path in get_yaml_files() {
        if stem(&path).starts_with("lenient-") {
            continue;
        }
        let source = fs::read_to_string(&path).unwrap();
        let options = DecodeOptions::strict().with_filename(file_name(&path));
        let strict = decode_with_options(&source, &options)
            .unwrap_or_else(|e| panic!("{}: {}", file_name(&path), e));
        assert_eq!(strict, decode(&source).unwrap(), "{}", file_name(&path));
    }
}

#[test]
fn test_yaml_fixtures_reencode() {
    for path in get_yaml_files() {
        let source = fs::read_to_string(&path).unwrap();
        let first = decode(&source).unwrap();
        let text = try_encode(&first).unwrap_or_else(|e| panic!("{}: {}", file_name(&path), e));
        let second = decode_with_options(&text, &DecodeOptions::strict())
            .unwrap_or_else(|e| panic!("{} re-encoded: {}\n{}", file_name(&path), e, text));
        assert_eq!(second, first, "{} re-encoded as:\n{}", file_name(&path), text);
    }
}

#[test]
fn test_nay_fixtures() {
    let files = get_nay_files();
    assert!(!files.is_empty(), "no .nay fixtures found");

    for path in &files {
        let source = fs::read_to_string(path).unwrap();
        let expected = read_expected_error(path)
            .unwrap_or_else(|| panic!("{}: missing .error file", file_name(path)));

        let options = DecodeOptions::strict().with_filename(file_name(path));
        match decode_with_options(&source, &options) {
            Ok(value) => panic!(
                "{}: expected error {:?}, decoded {:?}",
                file_name(path),
                expected.trim(),
                value
            ),
            Err(e) => assert_eq!(e.to_string(), expected.trim(), "{}", file_name(path)),
        }

        // Lenient mode recovers from the same input.
        assert!(decode(&source).is_ok(), "{}", file_name(path));
    }
}

/// Get all .yaml test files from the test/yaml/ directory.
fn get_yaml_files() -> Vec<PathBuf> {
    get_files_in_subdir("yaml", "yaml")
}

/// Get all .nay test files from the test/nay/ directory.
fn get_nay_files() -> Vec<PathBuf> {
    get_files_in_subdir("nay", "nay")
}
