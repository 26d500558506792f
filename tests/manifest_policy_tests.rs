#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Manifest policy tests for the duel session client.
//!
//! These tests verify that `Cargo.toml` and the fuzz manifest conform to
//! project policy. If any test fails, the manifest has drifted from the
//! agreed-upon standards.
//!
//! All checks are synchronous filesystem reads with no async runtime needed.

use std::path::PathBuf;

use toml::{Table, Value};

/// Returns the project root directory (where Cargo.toml lives).
fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Reads and parses a TOML file relative to the project root.
fn read_manifest(relative_path: &str) -> Table {
    let path = project_root().join(relative_path);
    let contents = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read '{}': {e}", path.display()));
    contents
        .parse::<Table>()
        .unwrap_or_else(|e| panic!("'{}' is not valid TOML: {e}", path.display()))
}

fn table<'a>(root: &'a Table, key: &str) -> &'a Table {
    root.get(key)
        .and_then(Value::as_table)
        .unwrap_or_else(|| panic!("missing [{key}] table"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Module: panic_policy
// ─────────────────────────────────────────────────────────────────────────────

mod panic_policy {
    use super::*;

    const REQUIRED_DENY_LINTS: &[&str] = &[
        "unwrap_used",
        "expect_used",
        "panic",
        "todo",
        "unimplemented",
        "indexing_slicing",
    ];

    #[test]
    fn cargo_toml_denies_all_panic_prone_lints() {
        let manifest = read_manifest("Cargo.toml");
        let clippy = table(table(&manifest, "lints"), "clippy");

        for lint in REQUIRED_DENY_LINTS {
            assert_eq!(
                clippy.get(*lint).and_then(Value::as_str),
                Some("deny"),
                "Cargo.toml must set `{lint} = \"deny\"` in [lints.clippy] to \
                 enforce the panic-free policy in library code."
            );
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Module: feature_policy
// ─────────────────────────────────────────────────────────────────────────────

mod feature_policy {
    use super::*;

    fn feature(manifest: &Table, name: &str) -> Vec<String> {
        table(manifest, "features")
            .get(name)
            .and_then(Value::as_array)
            .unwrap_or_else(|| panic!("feature `{name}` is not declared"))
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn websocket_transport_is_the_default() {
        let manifest = read_manifest("Cargo.toml");
        assert_eq!(feature(&manifest, "default"), ["transport-websocket"]);
    }

    #[test]
    fn websocket_transport_implies_tokio_runtime() {
        let manifest = read_manifest("Cargo.toml");
        let websocket = feature(&manifest, "transport-websocket");
        assert!(websocket.iter().any(|f| f == "tokio-runtime"));
        assert!(websocket.iter().any(|f| f == "dep:tokio-tungstenite"));
    }

    #[test]
    fn core_tokio_dependency_stays_runtime_free() {
        // The sans-IO core only needs channels; the runtime comes from the
        // `tokio-runtime` feature.
        let manifest = read_manifest("Cargo.toml");
        let tokio = table(table(&manifest, "dependencies"), "tokio");
        let features: Vec<_> = tokio
            .get("features")
            .and_then(Value::as_array)
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(features.contains(&"sync"));
        assert!(!features.contains(&"rt"), "tokio/rt belongs behind tokio-runtime");
        assert!(!features.contains(&"full"));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Module: package_policy
// ─────────────────────────────────────────────────────────────────────────────

mod package_policy {
    use super::*;

    #[test]
    fn package_declares_msrv() {
        let manifest = read_manifest("Cargo.toml");
        let version = table(&manifest, "package")
            .get("rust-version")
            .and_then(Value::as_str)
            .expect("Cargo.toml must declare a rust-version");
        assert_eq!(version.split('.').count(), 3, "rust-version must be fully qualified");
    }

    #[test]
    fn demos_point_at_existing_files() {
        let manifest = read_manifest("Cargo.toml");
        let demos = manifest
            .get("example")
            .and_then(Value::as_array)
            .expect("Cargo.toml must register the demos as [[example]] targets");
        for demo in demos {
            let path = demo.get("path").and_then(Value::as_str).unwrap();
            assert!(
                project_root().join(path).is_file(),
                "demo target points at missing file '{path}'"
            );
        }
    }

    #[test]
    fn fuzz_crate_depends_on_this_package() {
        let root = read_manifest("Cargo.toml");
        let name = table(&root, "package")
            .get("name")
            .and_then(Value::as_str)
            .unwrap();

        let fuzz = read_manifest("fuzz/Cargo.toml");
        let deps = table(&fuzz, "dependencies");
        assert!(deps.contains_key(name), "fuzz crate must depend on `{name}`");

        for target in fuzz.get("bin").and_then(Value::as_array).unwrap() {
            let path = target.get("path").and_then(Value::as_str).unwrap();
            assert!(
                project_root().join("fuzz").join(path).is_file(),
                "fuzz target points at missing file '{path}'"
            );
        }
    }
}
