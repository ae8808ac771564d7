//! TEMPO - Timed Execution of Massively Parallel Operations
//!
//! A minimal harness for dispatching compute-kernel workloads onto CPU or
//! GPU devices through wgpu, measuring host-observed and device-reported
//! execution time, and summarizing the results.
//!
//! # Quick Start
//!
//! ```no_run
//! use tempo::prelude::*;
//! use tempo::workloads::VectorAdd;
//!
//! let config = Config::default();
//! let mut workload = VectorAdd::new(DeviceClass::Gpu, &config).unwrap();
//!
//! let summary = Runner::with_repeat(config.repeat)
//!     .run(|| workload.trial())
//!     .unwrap();
//!
//! println!("vector add: {summary}");
//! println!("first 10: {}", workload.preview(10));
//! ```
//!
//! # Structure
//!
//! - **Device Acquisition**: pick a `cpu` or `gpu` adapter, create an
//!   execution context and a profiling-enabled queue
//! - **Kernel Source Loader**: resolve logical kernel names to WGSL text
//! - **Program Builder**: compile source at runtime, surface the build log
//!   on failure
//! - **Execution Pipeline**: allocate memory objects, bind positional
//!   arguments, dispatch over a 1-D or 2-D domain, block until done, read
//!   results back
//! - **Timing Extractor**: host wall clock around submit-and-wait plus
//!   device start/end timestamps, both in fractional milliseconds
//! - **Repeated-Trial Runner**: sequence N trials and aggregate the records

#![warn(missing_debug_implementations)]

pub mod config;
pub mod device;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod prelude;
pub mod program;
pub mod runner;
pub mod source;
pub mod timing;
pub mod track;
pub mod workloads;

pub use config::{Config, ConfigBuilder};
pub use device::{DeviceClass, DeviceContext};
pub use error::{Error, Result};
pub use pipeline::{Dispatch, LaunchConfig, WorkDomain};
pub use runner::{measure_exec_time, RunSummary, Runner};
pub use timing::ExecTime;
