use std::process::Command;

/// Exposes `SMSLINE_GIT_SHA` to the crate for `/health`.
///
/// A value already set in the build environment wins (release builds from a
/// source tarball have no `.git`).
fn main() {
    println!("cargo:rerun-if-env-changed=SMSLINE_GIT_SHA");
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/refs/");

    let sha = std::env::var("SMSLINE_GIT_SHA")
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(describe_head)
        .unwrap_or_else(|| "unknown".into());
    println!("cargo:rustc-env=SMSLINE_GIT_SHA={sha}");
}

fn describe_head() -> Option<String> {
    let out = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}
