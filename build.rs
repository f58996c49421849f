use std::{env, path::PathBuf};

use anyhow::Result;
use fs_extra::dir::{CopyOptions, copy};

/// Copy `assets/` next to the build output and point the default asset root at it.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if !assets.is_dir() {
        return Ok(());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let options = CopyOptions {
        overwrite: true,
        ..CopyOptions::new()
    };
    copy(&assets, &out_dir, &options)?;
    println!(
        "cargo:rustc-env=MATCAP_FLOW_ASSET_DIR={}",
        out_dir.join("assets").display()
    );

    Ok(())
}
