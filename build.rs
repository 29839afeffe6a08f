//! Build script for mealplan
//!
//! Increments build number on each recompilation and embeds build metadata.

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    // Only rerun when sources or the embedded rule snapshot change
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=data/rules");

    // Kept in OUT_DIR so the package root stays clean; a clean build restarts the count
    let out_dir = env::var_os("OUT_DIR").map(PathBuf::from).unwrap_or_default();
    let build_number_path = out_dir.join("build_number.txt");

    let current_build: u64 = if build_number_path.exists() {
        fs::read_to_string(&build_number_path)
            .unwrap_or_else(|_| "0".to_string())
            .trim()
            .parse()
            .unwrap_or(0)
    } else {
        0
    };

    let new_build = current_build + 1;

    fs::write(&build_number_path, new_build.to_string())
        .expect("Failed to write build number file");

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=MEALPLAN_BUILD_NUMBER={}", new_build);
    println!("cargo:rustc-env=MEALPLAN_BUILD_TIMESTAMP={}", timestamp);
}
