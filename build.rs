use cargo_lock::Lockfile;
use serde::Serialize;
use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

#[derive(Serialize)]
struct DepInfo {
    name: String,
    version: String,
    checksum: Option<String>,
    source: Option<String>,
}

fn main() {
    // Git hash of the checkout, "unknown" outside a repository
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=QIBLA_SHADOW_GIT_HASH={}", git_hash);
    println!("cargo:rerun-if-changed=.git/HEAD");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let lock_path = Path::new(&manifest_dir).join("Cargo.lock");
    println!("cargo:rerun-if-changed=Cargo.lock");

    // Third-party packages only, sorted by name; empty if there is no lock file yet
    let own_name = env::var("CARGO_PKG_NAME").unwrap_or_default();
    let mut deps: Vec<DepInfo> = match Lockfile::load(&lock_path) {
        Ok(lockfile) => lockfile
            .packages
            .into_iter()
            .filter(|pkg| pkg.name.as_str() != own_name)
            .map(|pkg| DepInfo {
                name: pkg.name.as_str().to_string(),
                version: pkg.version.to_string(),
                checksum: pkg.checksum.map(|c| c.to_string()),
                source: pkg.source.map(|s| s.to_string()),
            })
            .collect(),
        Err(e) => {
            println!("cargo:warning=could not read {}: {}", lock_path.display(), e);
            Vec::new()
        }
    };
    deps.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.version.cmp(&b.version)));

    let json_info = serde_json::to_string(&deps).expect("Failed to serialize deps");
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let dest_path = Path::new(&out_dir).join("locked_deps.json");
    fs::write(&dest_path, json_info).expect("Failed to write dependency info");
    println!("cargo:rustc-env=QIBLA_SHADOW_DEPS_PATH={}", dest_path.display());
}
