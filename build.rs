use anyhow::*;
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Rerun if the shaders or the demo scene change.
    println!("cargo:rerun-if-changed=assets/");

    // Binaries default to the crate's asset directory so the demo runs from any working directory.
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_dir = manifest_dir.join("assets");
    println!(
        "cargo:rustc-env=SHADE_NGIN_ASSETS={}",
        assets_dir.display()
    );

    Ok(())
}
