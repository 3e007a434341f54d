use crate::error::EngineError;

/// Where frames go.
pub enum RenderTarget {
    /// A window or canvas surface. `width`/`height` are its current physical size.
    Window {
        target: wgpu::SurfaceTarget<'static>,
        width: u32,
        height: u32,
    },
    /// An offscreen colour texture, for tests and headless runs.
    Offscreen { width: u32, height: u32 },
}

impl RenderTarget {
    pub fn size(&self) -> (u32, u32) {
        match self {
            Self::Window { width, height, .. } | Self::Offscreen { width, height } => {
                (*width, *height)
            }
        }
    }
}

pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

enum Output {
    Surface {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Offscreen {
        texture: wgpu::Texture,
    },
}

/// A frame's colour attachment. Surface frames are shown by [`Frame::present`].
pub(crate) struct Frame {
    pub view: wgpu::TextureView,
    surface_texture: Option<wgpu::SurfaceTexture>,
}

impl Frame {
    pub fn present(self) {
        if let Some(texture) = self.surface_texture {
            texture.present();
        }
    }
}

/// Device, queue and output target.
pub(crate) struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub info: wgpu::AdapterInfo,
    output: Output,
}

impl GpuContext {
    pub fn new(target: RenderTarget, vsync: bool) -> Result<Self, EngineError> {
        let (width, height) = target.size();
        let (width, height) = (width.max(1), height.max(1));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = match target {
            RenderTarget::Window { target, .. } => Some(
                instance
                    .create_surface(target)
                    .map_err(|e| EngineError::UnsupportedBackend(format!("surface: {e}")))?,
            ),
            RenderTarget::Offscreen { .. } => None,
        };

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface.as_ref(),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| EngineError::UnsupportedBackend("no compatible adapter".into()))?;

        let required = wgpu::DownlevelFlags::COMPUTE_SHADERS
            | wgpu::DownlevelFlags::INDIRECT_EXECUTION
            | wgpu::DownlevelFlags::VERTEX_STORAGE;
        let downlevel = adapter.get_downlevel_capabilities();
        if !downlevel.flags.contains(required) {
            return Err(EngineError::UnsupportedBackend(format!(
                "adapter {} lacks compute, indirect draw or vertex storage",
                adapter.get_info().name
            )));
        }

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("swarm_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let output = match surface {
            Some(surface) => {
                let caps = surface.get_capabilities(&adapter);
                let Some(&fallback) = caps.formats.first() else {
                    return Err(EngineError::UnsupportedBackend(
                        "surface reports no formats".into(),
                    ));
                };
                let format = caps
                    .formats
                    .iter()
                    .find(|f| f.is_srgb())
                    .copied()
                    .unwrap_or(fallback);
                let config = wgpu::SurfaceConfiguration {
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    format,
                    width,
                    height,
                    present_mode: if vsync {
                        wgpu::PresentMode::AutoVsync
                    } else {
                        wgpu::PresentMode::AutoNoVsync
                    },
                    alpha_mode: caps
                        .alpha_modes
                        .first()
                        .copied()
                        .unwrap_or(wgpu::CompositeAlphaMode::Auto),
                    view_formats: vec![],
                    desired_maximum_frame_latency: 2,
                };
                surface.configure(&device, &config);
                Output::Surface { surface, config }
            }
            None => Output::Offscreen {
                texture: offscreen_texture(&device, width, height),
            },
        };

        let info = adapter.get_info();
        tracing::info!("GPU initialized with {} backend ({})", info.backend.to_str(), info.name);

        Ok(Self {
            device,
            queue,
            info,
            output,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        match &self.output {
            Output::Surface { config, .. } => config.format,
            Output::Offscreen { .. } => OFFSCREEN_FORMAT,
        }
    }

    /// Callers filter out zero sizes.
    pub fn resize(&mut self, width: u32, height: u32) {
        match &mut self.output {
            Output::Surface { surface, config } => {
                config.width = width;
                config.height = height;
                surface.configure(&self.device, config);
            }
            Output::Offscreen { texture } => {
                texture.destroy();
                *texture = offscreen_texture(&self.device, width, height);
            }
        }
    }

    /// The next colour attachment, or `None` if this frame must be skipped.
    pub fn acquire_frame(&self) -> Option<Frame> {
        match &self.output {
            Output::Surface { surface, config } => {
                let texture = match surface.get_current_texture() {
                    Ok(t) => t,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        tracing::warn!("surface lost or outdated, reconfiguring");
                        surface.configure(&self.device, config);
                        return None;
                    }
                    Err(e) => {
                        tracing::error!("surface error: {e}");
                        return None;
                    }
                };
                let view = texture.texture.create_view(&Default::default());
                Some(Frame {
                    view,
                    surface_texture: Some(texture),
                })
            }
            Output::Offscreen { texture } => Some(Frame {
                view: texture.create_view(&Default::default()),
                surface_texture: None,
            }),
        }
    }

    pub fn destroy(&self) {
        if let Output::Offscreen { texture } = &self.output {
            texture.destroy();
        }
    }
}

fn offscreen_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen_target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OFFSCREEN_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}
