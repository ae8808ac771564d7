//! Device memory objects: linear buffers and 2-D RGBA8 images.
//!
//! Access mode is fixed at creation and selects the usage flags; optional
//! host data is uploaded as part of creation. Readback is synchronous and
//! deliberately outside the timed dispatch bracket.

use wgpu::util::DeviceExt;

use crate::device::DeviceContext;
use crate::error::{Error, Result};
use crate::track::{ResourceGuard, ResourceKind};

const BYTES_PER_PIXEL: u32 = 4;

/// Access mode of a device memory object, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Kernel input; host may initialize, never reads back.
    ReadOnly,
    /// Kernel output; host reads back, never initializes.
    WriteOnly,
    /// Kernel input and output.
    ReadWrite,
}

impl Access {
    fn buffer_usages(self) -> wgpu::BufferUsages {
        match self {
            Access::ReadOnly => wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            Access::WriteOnly => wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            Access::ReadWrite => {
                wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC
            }
        }
    }

    fn readable(self) -> bool {
        !matches!(self, Access::ReadOnly)
    }
}

/// Run `create` under out-of-memory and validation error scopes, mapping any
/// captured error to [`Error::Allocation`].
fn guarded_create<T>(context: &DeviceContext, create: impl FnOnce() -> T) -> Result<T> {
    context
        .device()
        .push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    context
        .device()
        .push_error_scope(wgpu::ErrorFilter::Validation);
    let object = create();
    let validation = context.pop_error_scope();
    let oom = context.pop_error_scope();
    if let Some(err) = oom.or(validation) {
        return Err(Error::allocation(err.to_string()));
    }
    Ok(object)
}

/// A linear storage buffer in device-visible memory.
pub struct DeviceBuffer {
    buffer: wgpu::Buffer,
    size: u64,
    access: Access,
    _guard: ResourceGuard,
}

impl DeviceBuffer {
    /// Allocate a buffer initialized with `data`.
    pub fn with_data(context: &DeviceContext, access: Access, data: &[u8]) -> Result<Self> {
        let buffer = guarded_create(context, || {
            context
                .device()
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("tempo-buffer"),
                    contents: data,
                    usage: access.buffer_usages(),
                })
        })?;
        Ok(Self {
            buffer,
            size: data.len() as u64,
            access,
            _guard: context.ledger().track(ResourceKind::Buffer),
        })
    }

    /// Allocate an uninitialized buffer of `size` bytes.
    pub fn uninit(context: &DeviceContext, access: Access, size: u64) -> Result<Self> {
        let buffer = guarded_create(context, || {
            context.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some("tempo-buffer"),
                size,
                usage: access.buffer_usages(),
                mapped_at_creation: false,
            })
        })?;
        Ok(Self {
            buffer,
            size,
            access,
            _guard: context.ledger().track(ResourceKind::Buffer),
        })
    }

    /// Copy the buffer contents back to host memory, blocking until done.
    pub fn read_back(&self, context: &DeviceContext) -> Result<Vec<u8>> {
        if !self.access.readable() {
            return Err(Error::readback("buffer is read-only from the host side"));
        }

        let staging = context.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("tempo-staging"),
            size: self.size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tempo-readback"),
            });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging, 0, self.size);
        context.queue().submit(Some(encoder.finish()));

        let data = map_and_copy(context, &staging)?;
        Ok(data)
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub(crate) fn binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

impl std::fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("size", &self.size)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

/// A 2-D, 4-channel, 8-bit-per-channel image in device memory.
///
/// Read-only images bind as sampled textures; write-only images bind as
/// write-only storage textures, matching the bundled kernels.
pub struct DeviceImage {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    access: Access,
    _guard: ResourceGuard,
}

impl DeviceImage {
    /// Allocate an image initialized with tightly packed RGBA8 `pixels`.
    pub fn with_pixels(
        context: &DeviceContext,
        access: Access,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Self> {
        if access == Access::WriteOnly {
            return Err(Error::invalid_argument(
                "write-only image cannot be host-initialized",
            ));
        }
        let expected = (width as usize) * (height as usize) * BYTES_PER_PIXEL as usize;
        if pixels.len() != expected {
            return Err(Error::invalid_argument(format!(
                "image data is {} bytes, expected {expected} for {width}x{height} RGBA8",
                pixels.len()
            )));
        }
        let image = Self::uninit(context, access, width, height)?;
        context.queue().write_texture(
            image.copy_target(),
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * BYTES_PER_PIXEL),
                rows_per_image: Some(height),
            },
            image.extent(),
        );
        Ok(image)
    }

    /// Allocate an uninitialized image.
    pub fn uninit(
        context: &DeviceContext,
        access: Access,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let usage = match access {
            Access::ReadOnly => {
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST
            }
            Access::WriteOnly => {
                wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC
            }
            Access::ReadWrite => {
                wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::STORAGE_BINDING
                    | wgpu::TextureUsages::COPY_DST
                    | wgpu::TextureUsages::COPY_SRC
            }
        };
        let texture = guarded_create(context, || {
            context.device().create_texture(&wgpu::TextureDescriptor {
                label: Some("tempo-image"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage,
                view_formats: &[],
            })
        })?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self {
            texture,
            view,
            width,
            height,
            access,
            _guard: context.ledger().track(ResourceKind::Image),
        })
    }

    /// Copy the image back to tightly packed RGBA8 host memory, blocking
    /// until done.
    pub fn read_back(&self, context: &DeviceContext) -> Result<Vec<u8>> {
        if !self.access.readable() {
            return Err(Error::readback("image is read-only from the host side"));
        }

        // Buffer copies require 256-byte row alignment; pad, then strip.
        let unpadded = self.width * BYTES_PER_PIXEL;
        let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let staging = context.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("tempo-image-staging"),
            size: u64::from(padded) * u64::from(self.height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tempo-image-readback"),
            });
        encoder.copy_texture_to_buffer(
            self.copy_target(),
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(self.height),
                },
            },
            self.extent(),
        );
        context.queue().submit(Some(encoder.finish()));

        let padded_data = map_and_copy(context, &staging)?;
        let mut pixels = Vec::with_capacity((unpadded as usize) * self.height as usize);
        for row in padded_data.chunks_exact(padded as usize) {
            pixels.extend_from_slice(&row[..unpadded as usize]);
        }
        Ok(pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub(crate) fn binding(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::TextureView(&self.view)
    }

    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }

    fn copy_target(&self) -> wgpu::TexelCopyTextureInfo<'_> {
        wgpu::TexelCopyTextureInfo {
            texture: &self.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        }
    }
}

impl std::fmt::Debug for DeviceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

/// Map `staging` for reading, block until the map completes, and copy the
/// contents out.
pub(crate) fn map_and_copy(context: &DeviceContext, staging: &wgpu::Buffer) -> Result<Vec<u8>> {
    let slice = staging.slice(..);
    let (tx, rx) = crossbeam_channel::bounded(1);
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    context
        .device()
        .poll(wgpu::PollType::Wait)
        .map_err(|e| Error::readback(e.to_string()))?;
    rx.recv()
        .map_err(|_| Error::readback("map callback dropped"))?
        .map_err(|e| Error::readback(e.to_string()))?;

    let data = slice.get_mapped_range().to_vec();
    staging.unmap();
    Ok(data)
}
