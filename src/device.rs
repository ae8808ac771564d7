//! Device acquisition: adapter selection, context and profiling queue setup.

use std::fmt;
use std::str::FromStr;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::track::{ResourceKind, ResourceLedger};

/// Requested class of compute device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Cpu,
    Gpu,
}

impl DeviceClass {
    /// The string tag this class is selected by.
    pub fn tag(self) -> &'static str {
        match self {
            DeviceClass::Cpu => "cpu",
            DeviceClass::Gpu => "gpu",
        }
    }

    fn matches(self, device_type: wgpu::DeviceType) -> bool {
        match self {
            DeviceClass::Cpu => matches!(device_type, wgpu::DeviceType::Cpu),
            DeviceClass::Gpu => matches!(
                device_type,
                wgpu::DeviceType::DiscreteGpu
                    | wgpu::DeviceType::IntegratedGpu
                    | wgpu::DeviceType::VirtualGpu
            ),
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DeviceClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cpu" => Ok(DeviceClass::Cpu),
            "gpu" => Ok(DeviceClass::Gpu),
            other => Err(Error::config(format!(
                "unknown device class '{other}' (expected 'cpu' or 'gpu')"
            ))),
        }
    }
}

/// An acquired device: execution context, profiling-enabled queue, and the
/// resource ledger scoped to them.
///
/// All device objects created through this context release on drop; the
/// context itself must outlive them, which field order below guarantees for
/// objects owned by the context. Dropping the context releases the queue,
/// then the device.
pub struct DeviceContext {
    ledger: ResourceLedger,
    queue: wgpu::Queue,
    device: wgpu::Device,
    adapter_info: wgpu::AdapterInfo,
    timestamp_period: f32,
}

impl DeviceContext {
    /// Acquire the first enumerated adapter matching `class` with default
    /// configuration.
    pub fn acquire(class: DeviceClass) -> Result<Self> {
        Self::acquire_with(class, &Config::default())
    }

    /// Acquire the first enumerated adapter matching `class`.
    ///
    /// Adapters are enumerated in the stable order wgpu reports them; the
    /// first one whose device type matches the class and which supports
    /// timestamp queries wins. Profiling must be available because the
    /// timing extractor depends on device timestamps.
    pub fn acquire_with(class: DeviceClass, config: &Config) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = instance
            .enumerate_adapters(wgpu::Backends::all())
            .into_iter()
            .find(|a| {
                class.matches(a.get_info().device_type)
                    && a.features().contains(wgpu::Features::TIMESTAMP_QUERY)
            })
            .ok_or_else(|| Error::device_not_found(class.tag()))?;

        let adapter_info = adapter.get_info();

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("tempo-device"),
            required_features: wgpu::Features::TIMESTAMP_QUERY,
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::default(),
        }))
        .map_err(|e| Error::device_not_found(format!("{}: {e}", class.tag())))?;

        let timestamp_period = queue.get_timestamp_period();

        let context = Self {
            ledger: ResourceLedger::new(),
            queue,
            device,
            adapter_info,
            timestamp_period,
        };

        if config.print_device_info {
            println!("{}", context.describe());
        }

        Ok(context)
    }

    /// One-line adapter description: name, type, backend, driver.
    pub fn describe(&self) -> String {
        format!(
            "device: {} ({:?}, {} backend, driver: {})",
            self.adapter_info.name,
            self.adapter_info.device_type,
            self.adapter_info.backend,
            self.adapter_info.driver,
        )
    }

    /// Report outstanding device objects as a [`Error::Release`].
    ///
    /// The audit never masks a primary error: callers invoke it after the
    /// trial outcome is already decided.
    pub fn audit(&self) -> Result<()> {
        if self.ledger.is_balanced() {
            Ok(())
        } else {
            Err(Error::release(format!(
                "outstanding device objects: {}",
                self.ledger.report()
            )))
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Nanoseconds per device timestamp tick.
    pub fn timestamp_period(&self) -> f32 {
        self.timestamp_period
    }

    /// Drain captured validation/out-of-memory errors after a sequence of
    /// resource creations. Returns the first captured error, if any.
    pub(crate) fn pop_error_scope(&self) -> Option<wgpu::Error> {
        pollster::block_on(self.device.pop_error_scope())
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        // Entering teardown of the queue and device; every dependent object
        // must already appear in the release sequence by this point.
        self.ledger.mark(ResourceKind::Context);
    }
}

impl fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceContext")
            .field("adapter", &self.adapter_info.name)
            .field("device_type", &self.adapter_info.device_type)
            .field("timestamp_period", &self.timestamp_period)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_class_tags_round_trip() {
        assert_eq!("cpu".parse::<DeviceClass>().unwrap(), DeviceClass::Cpu);
        assert_eq!("gpu".parse::<DeviceClass>().unwrap(), DeviceClass::Gpu);
        assert_eq!(DeviceClass::Cpu.to_string(), "cpu");
        assert_eq!(DeviceClass::Gpu.to_string(), "gpu");
    }

    #[test]
    fn test_unknown_tag_rejected_before_acquisition() {
        assert!(matches!(
            "tpu".parse::<DeviceClass>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_acquire_returns_complete_context_or_not_found() {
        // Whatever the host offers, acquisition must never hand back a
        // partially initialized context.
        for class in [DeviceClass::Cpu, DeviceClass::Gpu] {
            match DeviceContext::acquire(class) {
                Ok(context) => {
                    assert!(context.timestamp_period() > 0.0);
                    assert!(!context.describe().is_empty());
                    assert!(context.audit().is_ok());
                }
                Err(Error::DeviceNotFound(tag)) => {
                    assert!(tag.starts_with(class.tag()));
                }
                Err(other) => panic!("unexpected acquisition error: {other:?}"),
            }
        }
    }
}
