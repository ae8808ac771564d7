//! 2-D scenario: RGBA8 color-to-grayscale conversion.

use crate::config::Config;
use crate::device::{DeviceClass, DeviceContext};
use crate::error::{Error, Result};
use crate::memory::{Access, DeviceImage};
use crate::pipeline::{Dispatch, LaunchConfig, WorkDomain};
use crate::program::{Kernel, Program};
use crate::timing::ExecTime;

const SOURCE: &str = "color_to_gray";
const ENTRY_POINT: &str = "color_to_gray";

/// Tightly packed RGBA8 pixel data with its dimensions.
///
/// Decoding from and encoding to image files is the caller's business; the
/// harness only moves raw pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if pixels.len() != expected {
            return Err(Error::invalid_argument(format!(
                "{} pixel bytes for a {width}x{height} RGBA8 image, expected {expected}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

/// Grayscale-conversion workload over one externally supplied image.
///
/// Produces a same-sized RGBA8 image with Rec.601 luma in the color
/// channels and the source alpha passed through.
#[derive(Debug)]
pub struct ColorToGray {
    // Declaration order matters: the kernel and program must release
    // before the context's queue and device.
    kernel: Kernel,
    _program: Program,
    launch: LaunchConfig,
    input: ImageData,
    output: Option<ImageData>,
    context: DeviceContext,
}

impl ColorToGray {
    pub fn new(class: DeviceClass, config: &Config, input: ImageData) -> Result<Self> {
        let context = DeviceContext::acquire_with(class, config)?;
        let source = config.kernel_library().load(SOURCE)?;
        let program = Program::build(&context, &source)?;
        let kernel = program.kernel(&context, ENTRY_POINT)?;
        let launch = LaunchConfig::new(WorkDomain::D2(input.width, input.height))
            .with_workgroup(config.workgroup_override);
        Ok(Self {
            context,
            _program: program,
            kernel,
            launch,
            input,
            output: None,
        })
    }

    /// Run one trial: upload, dispatch over width x height, read back.
    pub fn trial(&mut self) -> Result<ExecTime> {
        let src = DeviceImage::with_pixels(
            &self.context,
            Access::ReadOnly,
            self.input.width,
            self.input.height,
            &self.input.pixels,
        )?;
        let dst = DeviceImage::uninit(
            &self.context,
            Access::WriteOnly,
            self.input.width,
            self.input.height,
        )?;

        let time = Dispatch::new(&self.context, &self.kernel)
            .arg_image(&src)
            .arg_image(&dst)
            .launch(&self.launch)?;

        self.output = Some(ImageData {
            width: self.input.width,
            height: self.input.height,
            pixels: dst.read_back(&self.context)?,
        });
        Ok(time)
    }

    /// Converted image from the most recent trial.
    pub fn output(&self) -> Option<&ImageData> {
        self.output.as_ref()
    }

    pub fn context(&self) -> &DeviceContext {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_data_size_checked() {
        assert!(ImageData::new(2, 2, vec![0u8; 16]).is_ok());
        assert!(matches!(
            ImageData::new(2, 2, vec![0u8; 15]),
            Err(Error::InvalidArgument(_))
        ));
    }
}
