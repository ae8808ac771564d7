//! 1-D scenario: elementwise addition of two integer vectors.

use crate::config::Config;
use crate::device::{DeviceClass, DeviceContext};
use crate::error::Result;
use crate::memory::{Access, DeviceBuffer};
use crate::pipeline::{Dispatch, LaunchConfig, WorkDomain};
use crate::program::{Kernel, Program};
use crate::timing::ExecTime;

/// Element count of the example vectors.
pub const VECTOR_LEN: usize = 1_000_000;

const SOURCE: &str = "vector_add";
const ENTRY_POINT: &str = "vector_add";

/// Vector-addition workload over `VECTOR_LEN` `i32` elements.
///
/// Inputs are `a[i] = i` and `b[i] = 10 * i`, so the expected output is
/// `c[i] = 11 * i`. The device context, compiled program, and kernel are
/// acquired once and reused across trials; device buffers are created and
/// released per trial.
#[derive(Debug)]
pub struct VectorAdd {
    // Declaration order matters: the kernel and program must release
    // before the context's queue and device.
    kernel: Kernel,
    _program: Program,
    launch: LaunchConfig,
    output: Vec<i32>,
    context: DeviceContext,
}

impl VectorAdd {
    pub fn new(class: DeviceClass, config: &Config) -> Result<Self> {
        let context = DeviceContext::acquire_with(class, config)?;
        let source = config.kernel_library().load(SOURCE)?;
        let program = Program::build(&context, &source)?;
        let kernel = program.kernel(&context, ENTRY_POINT)?;
        let launch = LaunchConfig::new(WorkDomain::D1(VECTOR_LEN as u32))
            .with_workgroup(config.workgroup_override);
        Ok(Self {
            context,
            _program: program,
            kernel,
            launch,
            output: Vec::new(),
        })
    }

    /// Run one trial: allocate, bind, dispatch, wait, read back.
    pub fn trial(&mut self) -> Result<ExecTime> {
        let a: Vec<i32> = (0..VECTOR_LEN as i32).collect();
        let b: Vec<i32> = (0..VECTOR_LEN as i32).map(|i| 10 * i).collect();

        let a_buf = DeviceBuffer::with_data(&self.context, Access::ReadOnly, &to_bytes(&a))?;
        let b_buf = DeviceBuffer::with_data(&self.context, Access::ReadOnly, &to_bytes(&b))?;
        let c_buf = DeviceBuffer::uninit(
            &self.context,
            Access::WriteOnly,
            (VECTOR_LEN * std::mem::size_of::<i32>()) as u64,
        )?;

        let time = Dispatch::new(&self.context, &self.kernel)
            .arg_buffer(&a_buf)
            .arg_buffer(&b_buf)
            .arg_buffer(&c_buf)
            .launch(&self.launch)?;

        self.output = from_bytes(&c_buf.read_back(&self.context)?);
        Ok(time)
    }

    /// Output of the most recent trial.
    pub fn output(&self) -> &[i32] {
        &self.output
    }

    /// The `{c[0], c[1], ...}` preview of the first `n` output elements.
    pub fn preview(&self, n: usize) -> String {
        let shown: Vec<String> = self
            .output
            .iter()
            .take(n)
            .map(|v| v.to_string())
            .collect();
        format!("{{{}}}", shown.join(", "))
    }

    pub fn context(&self) -> &DeviceContext {
        &self.context
    }
}

fn to_bytes(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn from_bytes(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
