//! Repeated-trial execution and summary reporting.

use std::fmt;

use crate::device::DeviceClass;
use crate::error::Result;
use crate::timing::ExecTime;

/// Default number of trials per run.
pub const DEFAULT_REPEAT: u32 = 10;

/// All timing records of one repeated run.
///
/// Aggregation choice: the summary states the final trial's host and device
/// times and the mean of each over all trials. A failing trial aborts the
/// run and surfaces its error; no partial summaries.
#[derive(Debug, Clone)]
pub struct RunSummary {
    trials: Vec<ExecTime>,
}

impl RunSummary {
    pub fn trials(&self) -> &[ExecTime] {
        &self.trials
    }

    /// The final trial's record.
    pub fn last(&self) -> ExecTime {
        // Runner rejects repeat == 0, so trials is never empty.
        self.trials[self.trials.len() - 1]
    }

    pub fn mean_host_ms(&self) -> f64 {
        self.trials.iter().map(|t| t.host_ms).sum::<f64>() / self.trials.len() as f64
    }

    pub fn mean_device_ms(&self) -> f64 {
        self.trials.iter().map(|t| t.device_ms).sum::<f64>() / self.trials.len() as f64
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} trial(s): last {}; mean host {:.3} ms, mean device {:.3} ms",
            self.trials.len(),
            self.last(),
            self.mean_host_ms(),
            self.mean_device_ms(),
        )
    }
}

/// Invokes a workload repeatedly and aggregates its timing records.
///
/// The workload closure owns whatever it reuses across trials (context,
/// compiled program, kernel); the runner only sequences trials and
/// fail-fast propagates the first error.
#[derive(Debug, Clone, Copy)]
pub struct Runner {
    repeat: u32,
}

impl Runner {
    pub fn new() -> Self {
        Self {
            repeat: DEFAULT_REPEAT,
        }
    }

    /// Runner for `repeat` trials. A repeat of 0 is clamped to 1 so a run
    /// always produces at least one record; [`crate::Config::validate`]
    /// rejects 0 before it reaches a runner built from configuration.
    pub fn with_repeat(repeat: u32) -> Self {
        Self {
            repeat: repeat.max(1),
        }
    }

    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    /// Run `trial` `repeat` times, collecting every record.
    pub fn run<F>(&self, mut trial: F) -> Result<RunSummary>
    where
        F: FnMut() -> Result<ExecTime>,
    {
        let mut trials = Vec::with_capacity(self.repeat as usize);
        for _ in 0..self.repeat {
            trials.push(trial()?);
        }
        Ok(RunSummary { trials })
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

/// Repeatedly invoke a device-class-tagged workload and render the summary.
///
/// This is the seam each example scenario implements: a function from a
/// device-class tag to an execution time record.
pub fn measure_exec_time<F>(mut exec: F, class: DeviceClass, repeat: u32) -> Result<String>
where
    F: FnMut(DeviceClass) -> Result<ExecTime>,
{
    let summary = Runner::with_repeat(repeat).run(|| exec(class))?;
    Ok(format!("[{class}] {summary}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn record(host_ms: f64, device_ms: f64) -> ExecTime {
        ExecTime { host_ms, device_ms }
    }

    #[test]
    fn test_runner_collects_every_trial() {
        let mut calls = 0;
        let summary = Runner::with_repeat(4)
            .run(|| {
                calls += 1;
                Ok(record(calls as f64, 0.5))
            })
            .unwrap();

        assert_eq!(calls, 4);
        assert_eq!(summary.trials().len(), 4);
        assert_eq!(summary.last().host_ms, 4.0);
        assert_eq!(summary.mean_host_ms(), 2.5);
        assert_eq!(summary.mean_device_ms(), 0.5);
    }

    #[test]
    fn test_zero_repeat_clamps_to_one_trial() {
        let mut calls = 0;
        let summary = Runner::with_repeat(0)
            .run(|| {
                calls += 1;
                Ok(record(1.0, 1.0))
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(summary.trials().len(), 1);
    }

    #[test]
    fn test_failing_trial_aborts_run() {
        let mut calls = 0;
        let result = Runner::with_repeat(10).run(|| {
            calls += 1;
            if calls == 3 {
                Err(Error::execution("injected"))
            } else {
                Ok(record(1.0, 1.0))
            }
        });

        assert!(matches!(result, Err(Error::Execution(_))));
        assert_eq!(calls, 3, "run must stop at the first failure");
    }

    #[test]
    fn test_summary_reports_final_trial_times() {
        let summary = Runner::with_repeat(2)
            .run({
                let mut n = 0;
                move || {
                    n += 1;
                    Ok(record(n as f64 * 1.5, n as f64))
                }
            })
            .unwrap();

        let text = summary.to_string();
        assert!(text.contains("2 trial(s)"));
        assert!(text.contains("host 3.000 ms"));
        assert!(text.contains("device 2.000 ms"));
    }

    #[test]
    fn test_measure_exec_time_passes_class_through() {
        let text = measure_exec_time(
            |class| {
                assert_eq!(class, DeviceClass::Cpu);
                Ok(record(1.0, 0.5))
            },
            DeviceClass::Cpu,
            3,
        )
        .unwrap();
        assert!(text.starts_with("[cpu]"));
        assert!(text.contains("ms"));
    }
}
