//! Kernel source resolution and loading.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Resolves logical kernel names to WGSL source text.
///
/// A logical name like `"vector_add"` maps to `<root>/vector_add.wgsl`; a
/// name that already ends in `.wgsl` is used as-is.
#[derive(Debug, Clone)]
pub struct KernelLibrary {
    root: PathBuf,
}

impl KernelLibrary {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Library over the kernel sources bundled with this crate.
    pub fn bundled() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("kernels"))
    }

    /// Read the source unit for `name` verbatim.
    pub fn load(&self, name: &str) -> Result<String> {
        let file = if name.ends_with(".wgsl") {
            self.root.join(name)
        } else {
            self.root.join(format!("{name}.wgsl"))
        };
        if !file.is_file() {
            return Err(Error::SourceNotFound(file));
        }
        Ok(fs::read_to_string(&file)?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
