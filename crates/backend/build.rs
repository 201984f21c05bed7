use std::env;
use std::fs;
use std::path::Path;

// `load_config` looks for config.toml next to the executable, so the
// workspace-root copy has to travel into target/<profile> on every build.
fn main() {
    println!("cargo:rerun-if-changed=../../config.toml");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let profile = env::var("PROFILE").expect("PROFILE not set");

    // OUT_DIR sits a few levels below target/<profile>; walk back up to it
    let binary_dir = Path::new(&out_dir)
        .ancestors()
        .find(|p| p.ends_with(&profile))
        .expect("target profile directory not found");

    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("workspace root not found");

    let source = workspace_root.join("config.toml");
    if source.exists() {
        let dest = binary_dir.join("config.toml");
        if let Err(e) = fs::copy(&source, &dest) {
            panic!("Failed to copy config.toml to {:?}: {}", dest, e);
        }
    } else {
        println!(
            "cargo:warning=config.toml not found at workspace root, embedded defaults will be used"
        );
    }
}
