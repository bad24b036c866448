use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

// Put `memory.x` where the linker can find it and rebuild only when it
// changes.
fn memory(out: &Path) -> Result<()> {
    File::create(out.join("memory.x"))
        .and_then(|mut f| f.write_all(include_bytes!("memory.x")))
        .context("Saving memory.x")?;

    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-changed=memory.x");

    Ok(())
}

fn main() -> Result<()> {
    let out = PathBuf::from(env::var_os("OUT_DIR").context("Could not get OUT_DIR")?);
    memory(&out)
}
