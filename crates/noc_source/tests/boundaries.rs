use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(p) = stack.pop() {
        let entries = match fs::read_dir(&p) {
            Ok(e) => e,
            Err(_) => continue,
        };
        for ent in entries.flatten() {
            let path = ent.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

#[test]
fn noc_core_stays_free_of_io() {
    // Guardrail: network and filesystem access belong to this crate, never to the engine.
    let core_src = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../noc_core/src");
    let files = collect_rs_files(&core_src);
    assert!(!files.is_empty());

    for f in files {
        let text = fs::read_to_string(&f).unwrap_or_default();
        for forbidden in ["ureq::", "std::net", "std::fs", "std::thread"] {
            assert!(
                !text.contains(forbidden),
                "forbidden `{forbidden}` found in {}",
                f.display()
            );
        }
    }
}

#[test]
fn source_crate_does_not_reimplement_aggregation() {
    // Guardrail: snapshots are only ever produced by noc_core's metrics engine.
    let src_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");
    for f in collect_rs_files(&src_root) {
        let text = fs::read_to_string(&f).unwrap_or_default();
        assert!(
            !text.contains("MetricsSnapshot {"),
            "snapshot constructed outside noc_core in {}",
            f.display()
        );
    }
}
