use bytemuck::Pod;
use std::sync::mpsc;
use swarm_assets::AtlasImage;
use wgpu::util::DeviceExt;

/// A labelled GPU buffer of fixed size.
#[derive(Debug)]
pub struct GpuBuffer {
    buffer: wgpu::Buffer,
}

impl GpuBuffer {
    /// Allocate `size` bytes. wgpu zero-fills new buffers.
    pub fn zeroed(
        device: &wgpu::Device,
        label: &'static str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        });
        Self { buffer }
    }

    pub fn with_contents(
        device: &wgpu::Device,
        label: &'static str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        });
        Self { buffer }
    }

    /// Queue a write of `data` at byte `offset`. Empty writes are skipped.
    pub fn write<T: Pod>(&self, queue: &wgpu::Queue, offset: u64, data: &[T]) {
        if data.is_empty() {
            return;
        }
        queue.write_buffer(&self.buffer, offset, bytemuck::cast_slice(data));
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn as_entire_binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    pub fn destroy(&self) {
        self.buffer.destroy();
    }
}

/// The sprite atlas on the GPU: a 2D array texture with a full mip chain.
#[derive(Debug)]
pub struct AtlasTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl AtlasTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Upload every level of every layer of `atlas`.
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, atlas: &AtlasImage) -> Self {
        let layers = atlas.layer_count();
        let mip_levels = atlas.mip_level_count();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sprite_atlas"),
            size: wgpu::Extent3d {
                width: atlas.width(),
                height: atlas.height(),
                depth_or_array_layers: layers,
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for layer in 0..layers {
            for level in 0..mip_levels {
                let Some(image) = atlas.level(layer, level) else {
                    continue;
                };
                let (width, height) = image.dimensions();
                queue.write_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture: &texture,
                        mip_level: level,
                        origin: wgpu::Origin3d {
                            x: 0,
                            y: 0,
                            z: layer,
                        },
                        aspect: wgpu::TextureAspect::All,
                    },
                    image.as_raw(),
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(4 * width),
                        rows_per_image: Some(height),
                    },
                    wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                );
            }
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("sprite_atlas_view"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            array_layer_count: Some(layers),
            mip_level_count: Some(mip_levels),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite_atlas_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        tracing::debug!(layers, mip_levels, "atlas uploaded");
        Self {
            texture,
            view,
            sampler,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn layer_count(&self) -> u32 {
        self.texture.depth_or_array_layers()
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

/// Copy `size` bytes from the start of `source` and block until they reach the host.
///
/// `source` needs `COPY_SRC` usage and `size` must be a multiple of 4.
/// Returns `None` if the mapping fails.
pub fn read_buffer_blocking(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: &wgpu::Buffer,
    size: u64,
) -> Option<Vec<u8>> {
    if size == 0 {
        return Some(Vec::new());
    }
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("diagnostic_readback"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("diagnostic_readback_encoder"),
    });
    encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::Maintain::Wait);

    match rx.recv() {
        Ok(Ok(())) => {
            let bytes = slice.get_mapped_range().to_vec();
            staging.unmap();
            Some(bytes)
        }
        Ok(Err(e)) => {
            tracing::warn!("diagnostic readback failed: {e}");
            None
        }
        Err(_) => None,
    }
}
