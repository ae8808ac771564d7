//! Execution-time records and device timestamp extraction.

use std::fmt;

use crate::device::DeviceContext;
use crate::error::{Error, Result};
use crate::memory;
use crate::track::{ResourceGuard, ResourceKind};

const NS_PER_MS: f64 = 1e6;

/// Latency figures for one trial, both in fractional milliseconds.
///
/// The two numbers are measured independently: `host_ms` brackets the
/// enqueue-and-wait step with a monotonic host clock, `device_ms` is the
/// difference of the device's own start/end timestamps for the dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecTime {
    /// Host-observed wall time including queue-wait and driver overhead.
    pub host_ms: f64,
    /// Device-internal execution time, excluding enqueue/wait overhead.
    pub device_ms: f64,
}

impl fmt::Display for ExecTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host {:.3} ms, device {:.3} ms",
            self.host_ms, self.device_ms
        )
    }
}

/// Start/end timestamp capture for one dispatch.
///
/// Owns the query set and its resolve/staging buffers; lives only as long as
/// the dispatch that created it and is released once the timing is read.
pub(crate) struct GpuTimer {
    query_set: wgpu::QuerySet,
    resolve: wgpu::Buffer,
    staging: wgpu::Buffer,
    _guard: ResourceGuard,
}

impl GpuTimer {
    const QUERY_COUNT: u32 = 2;
    const BUFFER_SIZE: u64 = (Self::QUERY_COUNT as u64) * 8;

    pub(crate) fn new(context: &DeviceContext) -> Result<Self> {
        context
            .device()
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let query_set = context.device().create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("tempo-timestamps"),
            ty: wgpu::QueryType::Timestamp,
            count: Self::QUERY_COUNT,
        });
        let resolve = context.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("tempo-timestamp-resolve"),
            size: Self::BUFFER_SIZE,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging = context.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("tempo-timestamp-staging"),
            size: Self::BUFFER_SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        if let Some(err) = context.pop_error_scope() {
            return Err(Error::execution(format!(
                "timestamp query setup failed: {err}"
            )));
        }
        Ok(Self {
            query_set,
            resolve,
            staging,
            _guard: context.ledger().track(ResourceKind::DispatchTimer),
        })
    }

    /// Timestamp writes for the compute pass: index 0 at pass start, 1 at end.
    pub(crate) fn pass_writes(&self) -> wgpu::ComputePassTimestampWrites<'_> {
        wgpu::ComputePassTimestampWrites {
            query_set: &self.query_set,
            beginning_of_pass_write_index: Some(0),
            end_of_pass_write_index: Some(1),
        }
    }

    /// Record resolution of both timestamps into the staging buffer.
    pub(crate) fn encode_resolve(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.resolve_query_set(&self.query_set, 0..Self::QUERY_COUNT, &self.resolve, 0);
        encoder.copy_buffer_to_buffer(&self.resolve, 0, &self.staging, 0, Self::BUFFER_SIZE);
    }

    /// Read both timestamps and convert their difference to fractional
    /// milliseconds. Must only be called after the dispatch completed.
    pub(crate) fn device_ms(&self, context: &DeviceContext) -> Result<f64> {
        let data = memory::map_and_copy(context, &self.staging)
            .map_err(|e| Error::execution(format!("timestamp readback: {e}")))?;
        if data.len() < Self::BUFFER_SIZE as usize {
            return Err(Error::execution("truncated timestamp readback"));
        }
        let stamp = |bytes: &[u8]| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(bytes);
            u64::from_le_bytes(raw)
        };
        let start = stamp(&data[..8]);
        let end = stamp(&data[8..16]);
        let ticks = end.saturating_sub(start);
        Ok(ticks as f64 * f64::from(context.timestamp_period()) / NS_PER_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_time_display_has_both_figures() {
        let time = ExecTime {
            host_ms: 1.2345,
            device_ms: 0.5,
        };
        let text = time.to_string();
        assert!(text.contains("host 1.234 ms"));
        assert!(text.contains("device 0.500 ms"));
    }
}
