use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::source::KernelLibrary;

/// Harness configuration shared by acquisition, dispatch, and the runner.
#[derive(Debug, Clone)]
pub struct Config {
    /// Trials per repeated run.
    pub repeat: u32,
    /// Directory kernel source units are resolved against. `None` means the
    /// sources bundled with the crate.
    pub kernel_dir: Option<PathBuf>,
    /// Explicit workgroup size for dispatch, overriding the per-domain
    /// defaults. Must match the `@workgroup_size` the kernel declares.
    pub workgroup_override: Option<(u32, u32, u32)>,
    /// Print adapter name/backend/driver after acquisition.
    pub print_device_info: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repeat: 10,
            kernel_dir: None,
            workgroup_override: None,
            print_device_info: false,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.repeat == 0 {
            return Err(Error::config("repeat must be > 0"));
        }
        if let Some((x, y, z)) = self.workgroup_override {
            if x == 0 || y == 0 || z == 0 {
                return Err(Error::config("workgroup dimensions must be > 0"));
            }
        }
        Ok(())
    }

    /// Kernel library resolving against `kernel_dir`, or the bundled sources.
    pub fn kernel_library(&self) -> KernelLibrary {
        match &self.kernel_dir {
            Some(dir) => KernelLibrary::new(dir.clone()),
            None => KernelLibrary::bundled(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn repeat(mut self, n: u32) -> Self {
        self.config.repeat = n;
        self
    }

    pub fn kernel_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.kernel_dir = Some(dir.into());
        self
    }

    pub fn workgroup_override(mut self, x: u32, y: u32, z: u32) -> Self {
        self.config.workgroup_override = Some((x, y, z));
        self
    }

    pub fn print_device_info(mut self, print: bool) -> Self {
        self.config.print_device_info = print;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.repeat, 10);
    }

    #[test]
    fn test_zero_repeat_rejected() {
        let result = Config::builder().repeat(0).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_workgroup_dimension_rejected() {
        let result = Config::builder().workgroup_override(64, 0, 1).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_sets_fields() {
        let config = Config::builder()
            .repeat(3)
            .workgroup_override(8, 8, 1)
            .print_device_info(true)
            .build()
            .unwrap();
        assert_eq!(config.repeat, 3);
        assert_eq!(config.workgroup_override, Some((8, 8, 1)));
        assert!(config.print_device_info);
    }
}
