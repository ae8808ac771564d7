//! Runtime kernel compilation and entry-point extraction.

use crate::device::DeviceContext;
use crate::error::{Error, Result};
use crate::track::{ResourceGuard, ResourceKind};

/// A kernel source unit compiled against one device context.
///
/// Invalid until [`Program::build`] succeeds; a build failure carries the
/// compiler's full diagnostic log and is terminal for the trial.
pub struct Program {
    module: wgpu::ShaderModule,
    _guard: ResourceGuard,
}

impl Program {
    /// Compile `source` synchronously. On failure the validation log is
    /// returned verbatim as the error payload.
    pub fn build(context: &DeviceContext, source: &str) -> Result<Self> {
        context
            .device()
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let module = context
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("tempo-program"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        if let Some(err) = context.pop_error_scope() {
            return Err(Error::build_failed(err.to_string()));
        }
        Ok(Self {
            module,
            _guard: context.ledger().track(ResourceKind::Program),
        })
    }

    /// Extract the named entry point as an invocable kernel.
    ///
    /// The program already compiled, so a failure here means the entry point
    /// is absent or is not a compute entry point.
    pub fn kernel(&self, context: &DeviceContext, entry_point: &str) -> Result<Kernel> {
        context
            .device()
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline =
            context
                .device()
                .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(entry_point),
                    layout: None,
                    module: &self.module,
                    entry_point: Some(entry_point),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    cache: None,
                });
        if context.pop_error_scope().is_some() {
            return Err(Error::KernelNotFound(entry_point.to_string()));
        }
        Ok(Kernel {
            pipeline,
            entry_point: entry_point.to_string(),
            _guard: context.ledger().track(ResourceKind::Kernel),
        })
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program").finish_non_exhaustive()
    }
}

/// A named, invocable entry point of a compiled program.
pub struct Kernel {
    pipeline: wgpu::ComputePipeline,
    entry_point: String,
    _guard: ResourceGuard,
}

impl Kernel {
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub(crate) fn pipeline(&self) -> &wgpu::ComputePipeline {
        &self.pipeline
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("entry_point", &self.entry_point)
            .finish_non_exhaustive()
    }
}
