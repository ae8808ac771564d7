//! The per-trial execution pipeline: argument binding, N-dimensional
//! dispatch, blocking wait, and timing capture.
//!
//! One trial has exactly one suspension point, the blocking wait after the
//! dispatch is submitted. The host clock brackets submit-and-wait only;
//! allocation, build, and readback stay outside the bracket so the record
//! reflects dispatch-plus-sync latency, not harness overhead.

use std::time::Instant;

use crate::device::DeviceContext;
use crate::error::{Error, Result};
use crate::memory::{DeviceBuffer, DeviceImage};
use crate::program::Kernel;
use crate::timing::{ExecTime, GpuTimer};

/// Workgroup size assumed for 1-D dispatch when no override is given.
/// Matches the `@workgroup_size` of the bundled 1-D kernels.
pub const DEFAULT_WORKGROUP_1D: (u32, u32, u32) = (64, 1, 1);

/// Workgroup size assumed for 2-D dispatch when no override is given.
/// Matches the `@workgroup_size` of the bundled 2-D kernels.
pub const DEFAULT_WORKGROUP_2D: (u32, u32, u32) = (16, 16, 1);

/// The global work domain of a dispatch, in threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkDomain {
    /// Linear domain, e.g. element count for vector ops.
    D1(u32),
    /// Planar domain (width, height), e.g. image ops.
    D2(u32, u32),
}

impl WorkDomain {
    fn global(self) -> (u32, u32) {
        match self {
            WorkDomain::D1(x) => (x, 1),
            WorkDomain::D2(x, y) => (x, y),
        }
    }

    fn default_workgroup(self) -> (u32, u32, u32) {
        match self {
            WorkDomain::D1(_) => DEFAULT_WORKGROUP_1D,
            WorkDomain::D2(_, _) => DEFAULT_WORKGROUP_2D,
        }
    }
}

/// Size of one dispatch: global domain plus an optional explicit workgroup
/// size. The workgroup override must match what the kernel declares; `None`
/// uses the per-domain default.
#[derive(Debug, Clone, Copy)]
pub struct LaunchConfig {
    pub domain: WorkDomain,
    pub workgroup: Option<(u32, u32, u32)>,
}

impl LaunchConfig {
    pub fn new(domain: WorkDomain) -> Self {
        Self {
            domain,
            workgroup: None,
        }
    }

    pub fn with_workgroup(mut self, workgroup: Option<(u32, u32, u32)>) -> Self {
        self.workgroup = workgroup;
        self
    }

    fn validate(&self) -> Result<()> {
        let (gx, gy) = self.domain.global();
        if gx == 0 || gy == 0 {
            return Err(Error::execution("empty work domain"));
        }
        if let Some((x, y, z)) = self.workgroup {
            if x == 0 || y == 0 || z == 0 {
                return Err(Error::execution("workgroup dimensions must be > 0"));
            }
        }
        Ok(())
    }

    /// Workgroup counts covering the global domain.
    fn workgroup_counts(&self) -> (u32, u32) {
        let (gx, gy) = self.domain.global();
        let (wx, wy, _) = self.workgroup.unwrap_or_else(|| self.domain.default_workgroup());
        (gx.div_ceil(wx), gy.div_ceil(wy))
    }
}

/// One pending dispatch: a kernel plus its positional arguments.
///
/// Arguments bind in the order they are added, matching the positional
/// binding indices the kernel declares.
pub struct Dispatch<'a> {
    context: &'a DeviceContext,
    kernel: &'a Kernel,
    entries: Vec<wgpu::BindGroupEntry<'a>>,
}

impl<'a> Dispatch<'a> {
    pub fn new(context: &'a DeviceContext, kernel: &'a Kernel) -> Self {
        Self {
            context,
            kernel,
            entries: Vec::new(),
        }
    }

    /// Bind a buffer at the next positional argument slot.
    pub fn arg_buffer(mut self, buffer: &'a DeviceBuffer) -> Self {
        let binding = self.entries.len() as u32;
        self.entries.push(wgpu::BindGroupEntry {
            binding,
            resource: buffer.binding(),
        });
        self
    }

    /// Bind an image at the next positional argument slot.
    pub fn arg_image(mut self, image: &'a DeviceImage) -> Self {
        let binding = self.entries.len() as u32;
        self.entries.push(wgpu::BindGroupEntry {
            binding,
            resource: image.binding(),
        });
        self
    }

    /// Enqueue the dispatch and block until it and all prior queued work
    /// complete, returning both latency figures.
    ///
    /// Argument count or type mismatches surface as
    /// [`Error::InvalidArgument`] before anything is enqueued.
    pub fn launch(self, config: &LaunchConfig) -> Result<ExecTime> {
        config.validate()?;

        let device = self.context.device();

        // Bind arguments against the kernel's layout; a mismatch is caught
        // here, not at submit time.
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tempo-args"),
            layout: &self.kernel.pipeline().get_bind_group_layout(0),
            entries: &self.entries,
        });
        if let Some(err) = self.context.pop_error_scope() {
            return Err(Error::invalid_argument(format!(
                "binding {} argument(s) to '{}': {err}",
                self.entries.len(),
                self.kernel.entry_point(),
            )));
        }

        let timer = GpuTimer::new(self.context)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tempo-dispatch"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(self.kernel.entry_point()),
                timestamp_writes: Some(timer.pass_writes()),
            });
            pass.set_pipeline(self.kernel.pipeline());
            pass.set_bind_group(0, &bind_group, &[]);
            let (cx, cy) = config.workgroup_counts();
            pass.dispatch_workgroups(cx, cy, 1);
        }
        timer.encode_resolve(&mut encoder);
        let commands = encoder.finish();
        if let Some(err) = self.context.pop_error_scope() {
            return Err(Error::execution(err.to_string()));
        }

        // Host bracket: submit through wait, nothing else.
        let host_start = Instant::now();
        self.context.queue().submit(Some(commands));
        device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| Error::execution(e.to_string()))?;
        let host_ms = host_start.elapsed().as_secs_f64() * 1e3;

        let device_ms = timer.device_ms(self.context)?;

        Ok(ExecTime { host_ms, device_ms })
    }
}

impl std::fmt::Debug for Dispatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("entry_point", &self.kernel.entry_point())
            .field("args", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroup_counts_cover_domain() {
        let config = LaunchConfig::new(WorkDomain::D1(1_000_000));
        assert_eq!(config.workgroup_counts(), (15_625, 1));

        let config = LaunchConfig::new(WorkDomain::D2(100, 70));
        assert_eq!(config.workgroup_counts(), (7, 5));

        let config = LaunchConfig::new(WorkDomain::D1(100)).with_workgroup(Some((32, 1, 1)));
        assert_eq!(config.workgroup_counts(), (4, 1));
    }

    #[test]
    fn test_empty_domain_rejected() {
        assert!(LaunchConfig::new(WorkDomain::D1(0)).validate().is_err());
        assert!(LaunchConfig::new(WorkDomain::D2(10, 0)).validate().is_err());
        assert!(LaunchConfig::new(WorkDomain::D1(1))
            .with_workgroup(Some((0, 1, 1)))
            .validate()
            .is_err());
    }
}
