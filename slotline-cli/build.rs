use std::path::Path;
use std::process::Command;

/// Stamped into `--version` as `SLOTLINE_BUILD_SHA`.
///
/// Source tarballs have no `.git`; packagers can set `SLOTLINE_BUILD_SHA`
/// themselves and it is passed through untouched.
fn main() {
    println!("cargo:rerun-if-env-changed=SLOTLINE_BUILD_SHA");
    if let Ok(sha) = std::env::var("SLOTLINE_BUILD_SHA") {
        println!("cargo:rustc-env=SLOTLINE_BUILD_SHA={sha}");
        return;
    }

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let repo_root = Path::new(&manifest_dir).join("..");
    let git_dir = repo_root.join(".git");
    if git_dir.exists() {
        println!("cargo:rerun-if-changed={}", git_dir.join("HEAD").display());
        println!("cargo:rerun-if-changed={}", git_dir.join("index").display());
    }

    let git = |args: &[&str]| {
        Command::new("git")
            .arg("-C")
            .arg(&repo_root)
            .args(args)
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
    };

    let stamp = match git(&["rev-parse", "--short", "HEAD"]).filter(|s| !s.is_empty()) {
        Some(sha) => {
            // Tracked files with uncommitted edits.
            let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
                .is_some_and(|out| !out.is_empty());
            if dirty { format!("{sha}-dirty") } else { sha }
        }
        None => "unknown".to_string(),
    };

    println!("cargo:rustc-env=SLOTLINE_BUILD_SHA={stamp}");
}
