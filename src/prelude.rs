//! Convenience re-exports for harness users.

pub use crate::config::{Config, ConfigBuilder};
pub use crate::device::{DeviceClass, DeviceContext};
pub use crate::error::{Error, Result};
pub use crate::memory::{Access, DeviceBuffer, DeviceImage};
pub use crate::pipeline::{Dispatch, LaunchConfig, WorkDomain};
pub use crate::program::{Kernel, Program};
pub use crate::runner::{measure_exec_time, RunSummary, Runner, DEFAULT_REPEAT};
pub use crate::source::KernelLibrary;
pub use crate::timing::ExecTime;
