use crate::resources::GpuBuffer;
use crate::shaders;
use swarm_common::WORKGROUP_SIZE;

/// Buffers read or written by the simulation pass.
pub struct SimulationBindings<'a> {
    pub uniforms: &'a GpuBuffer,
    pub positions: &'a GpuBuffer,
    pub velocities: &'a GpuBuffer,
    pub draw_args: &'a GpuBuffer,
    pub visible: &'a GpuBuffer,
    pub statuses: &'a GpuBuffer,
    pub pick: &'a GpuBuffer,
}

/// Compute stage: one invocation per entity slot.
#[derive(Debug)]
pub struct SimulationStage {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    workgroups: u32,
}

pub(crate) fn storage_entry(
    binding: u32,
    read_only: bool,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl SimulationStage {
    pub fn new(device: &wgpu::Device, bindings: &SimulationBindings<'_>, capacity: u32) -> Self {
        let compute = wgpu::ShaderStages::COMPUTE;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("simulation_bind_group_layout"),
            entries: &[
                uniform_entry(0, compute),
                storage_entry(1, false, compute),
                storage_entry(2, true, compute),
                storage_entry(3, false, compute),
                storage_entry(4, false, compute),
                storage_entry(5, true, compute),
                storage_entry(6, false, compute),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("simulation_bind_group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: bindings.uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: bindings.positions.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: bindings.velocities.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: bindings.draw_args.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: bindings.visible.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: bindings.statuses.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: bindings.pick.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("simulation_pipeline_layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("simulation_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SIMULATION_SHADER.into()),
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("simulation_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("simulate"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            bind_group,
            workgroups: workgroup_count(capacity),
        }
    }

    pub fn workgroups(&self) -> u32 {
        self.workgroups
    }

    /// Record the dispatch. Must precede the presentation pass in the same encoder.
    pub fn record(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("simulation_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.dispatch_workgroups(self.workgroups, 1, 1);
    }
}

/// Workgroups needed to cover `capacity` slots.
pub fn workgroup_count(capacity: u32) -> u32 {
    capacity.div_ceil(WORKGROUP_SIZE)
}
