use crate::camera::Camera2D;
use crate::config::EngineConfig;
use crate::context::{GpuContext, RenderTarget};
use crate::error::EngineError;
use crate::picking::{PickProtocol, PickReadback};
use crate::presentation::{PresentationBindings, PresentationStage};
use crate::resources::{AtlasTexture, GpuBuffer, read_buffer_blocking};
use crate::simulation::{SimulationBindings, SimulationStage};
use crate::uniforms::{FrameInputs, frame_uniforms};
use glam::Vec2;
use std::time::Instant;
use swarm_assets::AtlasImage;
use swarm_common::{DrawIndirectArgs, EntityBatch, EntityId, FrameUniforms, PICK_SENTINEL};
use swarm_kernel::SlotArena;

/// Called once per completed pick cycle with the selected entity, or `None`.
pub type SelectionCallback = Box<dyn FnMut(Option<EntityId>)>;

const VEC4_STRIDE: u64 = 16;
const WORD_STRIDE: u64 = 4;

/// Per-entity storage plus the per-frame buffers, all sized for `capacity` slots.
struct EngineBuffers {
    positions: GpuBuffer,
    velocities: GpuBuffer,
    statuses: GpuBuffer,
    types: GpuBuffer,
    visible: GpuBuffer,
    draw_args: GpuBuffer,
    uniforms: GpuBuffer,
    pick: GpuBuffer,
}

impl EngineBuffers {
    fn allocate(device: &wgpu::Device, capacity: u32) -> Self {
        use wgpu::BufferUsages as U;
        let slots = capacity as u64;
        Self {
            positions: GpuBuffer::zeroed(
                device,
                "positions",
                slots * VEC4_STRIDE,
                U::STORAGE | U::COPY_DST | U::COPY_SRC,
            ),
            velocities: GpuBuffer::zeroed(
                device,
                "velocities",
                slots * VEC4_STRIDE,
                U::STORAGE | U::COPY_DST,
            ),
            statuses: GpuBuffer::zeroed(
                device,
                "statuses",
                slots * WORD_STRIDE,
                U::STORAGE | U::COPY_DST,
            ),
            types: GpuBuffer::zeroed(
                device,
                "types",
                slots * WORD_STRIDE,
                U::STORAGE | U::COPY_DST,
            ),
            visible: GpuBuffer::zeroed(
                device,
                "visible_indices",
                slots * WORD_STRIDE,
                U::STORAGE | U::COPY_SRC,
            ),
            draw_args: GpuBuffer::with_contents(
                device,
                "draw_indirect_args",
                bytemuck::bytes_of(&DrawIndirectArgs::quads(0)),
                U::STORAGE | U::INDIRECT | U::COPY_DST | U::COPY_SRC,
            ),
            uniforms: GpuBuffer::with_contents(
                device,
                "frame_uniforms",
                bytemuck::bytes_of(&FrameUniforms::default()),
                U::UNIFORM | U::COPY_DST,
            ),
            pick: GpuBuffer::with_contents(
                device,
                "pick_result",
                bytemuck::bytes_of(&PICK_SENTINEL),
                U::STORAGE | U::COPY_DST | U::COPY_SRC,
            ),
        }
    }

    fn destroy(&self) {
        for buffer in [
            &self.positions,
            &self.velocities,
            &self.statuses,
            &self.types,
            &self.visible,
            &self.draw_args,
            &self.uniforms,
            &self.pick,
        ] {
            buffer.destroy();
        }
    }
}

struct GpuState {
    context: GpuContext,
    buffers: EngineBuffers,
    atlas: AtlasTexture,
    simulation: SimulationStage,
    presentation: PresentationStage,
    readback: PickReadback,
}

impl GpuState {
    fn new(
        target: RenderTarget,
        config: &EngineConfig,
        atlas: &AtlasImage,
    ) -> Result<Self, EngineError> {
        let context = GpuContext::new(target, config.vsync)?;
        let limits = context.device.limits();
        atlas.check_limits(limits.max_texture_array_layers, limits.max_texture_dimension_2d)?;
        let capacity = config.effective_capacity();
        let buffers = EngineBuffers::allocate(&context.device, capacity);
        let atlas = AtlasTexture::upload(&context.device, &context.queue, atlas);

        let simulation = SimulationStage::new(
            &context.device,
            &SimulationBindings {
                uniforms: &buffers.uniforms,
                positions: &buffers.positions,
                velocities: &buffers.velocities,
                draw_args: &buffers.draw_args,
                visible: &buffers.visible,
                statuses: &buffers.statuses,
                pick: &buffers.pick,
            },
            capacity,
        );
        let presentation = PresentationStage::new(
            &context.device,
            context.format(),
            &PresentationBindings {
                uniforms: &buffers.uniforms,
                positions: &buffers.positions,
                visible: &buffers.visible,
                types: &buffers.types,
                atlas: &atlas,
            },
            config.clear_color(),
        );
        let readback = PickReadback::new(&context.device);

        Ok(Self {
            context,
            buffers,
            atlas,
            simulation,
            presentation,
            readback,
        })
    }

    fn destroy(&self) {
        self.buffers.destroy();
        self.atlas.destroy();
        self.readback.destroy();
        self.context.destroy();
    }
}

/// The particle engine.
///
/// Host-side state (camera, pointer, slot cursor, pick protocol) lives here and
/// is usable before `init`; GPU state exists only between `init` and `destroy`.
pub struct Engine {
    config: EngineConfig,
    camera: Camera2D,
    viewport: (u32, u32),
    pointer_ndc: Vec2,
    arena: SlotArena,
    picking: PickProtocol,
    last_frame: Option<Instant>,
    last_selection: Option<EntityId>,
    on_selected: Option<SelectionCallback>,
    gpu: Option<GpuState>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let arena = SlotArena::new(config.effective_capacity());
        Self {
            config,
            camera: Camera2D::default(),
            viewport: (1, 1),
            pointer_ndc: Vec2::ZERO,
            arena,
            picking: PickProtocol::default(),
            last_frame: None,
            last_selection: None,
            on_selected: None,
            gpu: None,
        }
    }

    /// Acquire a device, allocate all buffers, upload the atlas and build both pipelines.
    ///
    /// Re-initializing releases the previous GPU state first and starts from an empty arena.
    pub fn init(&mut self, target: RenderTarget) -> Result<(), EngineError> {
        self.destroy();
        let (width, height) = target.size();
        let atlas = AtlasImage::load(&self.config.atlas)?;
        let gpu = GpuState::new(target, &self.config, &atlas)?;

        self.viewport = (width.max(1), height.max(1));
        self.camera.update_aspect(width, height);
        self.arena = SlotArena::new(self.config.effective_capacity());
        self.last_frame = None;
        tracing::info!(
            capacity = self.arena.capacity(),
            workgroups = gpu.simulation.workgroups(),
            atlas_layers = gpu.atlas.layer_count(),
            "engine initialized"
        );
        self.gpu = Some(gpu);
        Ok(())
    }

    /// Release every GPU resource. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        let Some(gpu) = self.gpu.take() else {
            return;
        };
        gpu.destroy();
        self.picking = PickProtocol::default();
        self.arena = SlotArena::new(self.config.effective_capacity());
        tracing::info!("engine resources released");
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }

    /// Zero-sized viewports are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            tracing::debug!(width, height, "ignoring zero-sized resize");
            return;
        }
        if (width, height) == self.viewport {
            return;
        }
        self.viewport = (width, height);
        self.camera.update_aspect(width, height);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.context.resize(width, height);
        }
    }

    /// Copy as much of `batch` as fits into the next free slots.
    ///
    /// Returns the number of entities accepted. Before `init` nothing is accepted.
    pub fn ingest_entities(&mut self, batch: &EntityBatch) -> usize {
        let Some(gpu) = self.gpu.as_ref() else {
            tracing::warn!("ingest before init ignored");
            return 0;
        };
        if !batch.is_consistent() {
            tracing::warn!(
                len = batch.len(),
                "batch arrays differ in length, extra elements ignored"
            );
        }
        let range = self.arena.reserve(batch.len());
        if range.is_empty() {
            return 0;
        }

        let n = range.count as usize;
        let queue = &gpu.context.queue;
        let buffers = &gpu.buffers;
        let vec4_offset = range.byte_offset(VEC4_STRIDE);
        let word_offset = range.byte_offset(WORD_STRIDE);
        buffers.positions.write(queue, vec4_offset, &batch.positions[..n]);
        buffers.velocities.write(queue, vec4_offset, &batch.velocities[..n]);
        buffers.statuses.write(queue, word_offset, &batch.statuses[..n]);
        buffers.types.write(queue, word_offset, &batch.types[..n]);
        tracing::debug!(start = range.start, count = range.count, "entities ingested");
        n
    }

    pub fn on_entity_selected(&mut self, callback: impl FnMut(Option<EntityId>) + 'static) {
        self.on_selected = Some(Box::new(callback));
    }

    /// Pan by an NDC-scaled delta.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.camera.pan(dx, dy);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.camera.zoom_in(factor);
    }

    pub fn look_at(&mut self, position: Vec2) {
        self.camera.look_at(position);
    }

    pub fn set_pointer(&mut self, ndc: Vec2) {
        self.pointer_ndc = ndc;
    }

    /// Move the pointer to `ndc` and request a pick there.
    pub fn click(&mut self, ndc: Vec2) {
        self.pointer_ndc = ndc;
        self.picking.register_click();
    }

    /// Run one frame: simulate, present, and advance any pending pick.
    ///
    /// Does nothing before `init`. A frame whose target cannot be acquired is
    /// skipped without touching pick state.
    pub fn render(&mut self) {
        if self.gpu.is_none() {
            return;
        }
        self.poll_selection(false);
        let delta_time = self.next_delta_time();

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let Some(frame) = gpu.context.acquire_frame() else {
            return;
        };
        let _span = tracing::info_span!("frame").entered();

        let plan = self.picking.plan_frame();
        let uniforms = frame_uniforms(
            &self.camera,
            &FrameInputs {
                viewport: self.viewport,
                pointer_ndc: self.pointer_ndc,
                delta_time,
                pick_radius_ndc: self.config.pick_radius_ndc,
                click: plan.click_flag,
            },
        );

        let queue = &gpu.context.queue;
        if plan.reset_result {
            gpu.buffers.pick.write(queue, 0, &[PICK_SENTINEL]);
        }
        gpu.buffers.uniforms.write(queue, 0, &[uniforms]);
        gpu.buffers
            .draw_args
            .write(queue, DrawIndirectArgs::INSTANCE_COUNT_OFFSET, &[0u32]);

        let mut encoder = gpu
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        gpu.simulation.record(&mut encoder);
        if plan.schedule_readback {
            gpu.readback.record_copy(&mut encoder, &gpu.buffers.pick);
        }
        gpu.presentation
            .record(&mut encoder, &frame.view, &gpu.buffers.draw_args);
        queue.submit(std::iter::once(encoder.finish()));

        if plan.schedule_readback {
            gpu.readback.begin_map();
            tracing::debug!("pick readback scheduled");
        }
        frame.present();
        let _ = gpu.context.device.poll(wgpu::Maintain::Poll);
    }

    /// Block until the GPU is idle and deliver any pick result it produced.
    pub fn wait_idle(&mut self) {
        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };
        let _ = gpu.context.device.poll(wgpu::Maintain::Wait);
        self.poll_selection(true);
    }

    /// Deliver a finished pick readback, if there is one.
    fn poll_selection(&mut self, wait: bool) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if !gpu.readback.is_pending() {
            return;
        }
        let maintain = if wait {
            wgpu::Maintain::Wait
        } else {
            wgpu::Maintain::Poll
        };
        let _ = gpu.context.device.poll(maintain);
        let Some(outcome) = gpu.readback.try_finish() else {
            return;
        };
        let raw = match outcome {
            Ok(word) => Some(word),
            Err(e) => {
                tracing::warn!("pick readback failed: {e}");
                None
            }
        };
        let selection = self.picking.complete(raw);
        self.last_selection = selection;
        match selection {
            Some(id) => tracing::info!("selected entity {id}"),
            None => tracing::debug!("pick found nothing"),
        }
        if let Some(callback) = self.on_selected.as_mut() {
            callback(selection);
        }
    }

    fn next_delta_time(&mut self) -> f32 {
        if let Some(fixed) = self.config.fixed_delta_time {
            return fixed;
        }
        let now = Instant::now();
        let elapsed = self
            .last_frame
            .map_or(0.0, |previous| (now - previous).as_secs_f32());
        self.last_frame = Some(now);
        elapsed.min(self.config.max_delta_time)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Slots filled so far.
    pub fn live_count(&self) -> u32 {
        self.arena.next_free()
    }

    pub fn capacity(&self) -> u32 {
        self.arena.capacity()
    }

    pub fn last_selection(&self) -> Option<EntityId> {
        self.last_selection
    }

    pub fn clear_selection(&mut self) {
        self.last_selection = None;
    }

    pub fn pick_in_flight(&self) -> bool {
        self.picking.in_flight()
    }

    pub fn adapter_info(&self) -> Option<&wgpu::AdapterInfo> {
        self.gpu.as_ref().map(|gpu| &gpu.context.info)
    }

    /// Instance count written by the last simulation pass. Blocks on the GPU.
    pub fn read_instance_count(&self) -> Option<u32> {
        let gpu = self.gpu.as_ref()?;
        let bytes = read_buffer_blocking(
            &gpu.context.device,
            &gpu.context.queue,
            gpu.buffers.draw_args.buffer(),
            DrawIndirectArgs::SIZE,
        )?;
        let args: DrawIndirectArgs = bytemuck::pod_read_unaligned(&bytes);
        Some(args.instance_count)
    }

    /// Visible entity indices from the last simulation pass, in GPU append order.
    /// Blocks on the GPU.
    pub fn read_visible_indices(&self) -> Option<Vec<u32>> {
        let count = self.read_instance_count()?;
        let gpu = self.gpu.as_ref()?;
        let bytes = read_buffer_blocking(
            &gpu.context.device,
            &gpu.context.queue,
            gpu.buffers.visible.buffer(),
            count as u64 * WORD_STRIDE,
        )?;
        Some(bytes.chunks_exact(4).map(bytemuck::pod_read_unaligned).collect())
    }

    /// Current positions of the first `count` slots. Blocks on the GPU.
    pub fn read_positions(&self, count: u32) -> Option<Vec<[f32; 4]>> {
        let gpu = self.gpu.as_ref()?;
        let count = count.min(self.arena.capacity());
        let bytes = read_buffer_blocking(
            &gpu.context.device,
            &gpu.context.queue,
            gpu.buffers.positions.buffer(),
            count as u64 * VEC4_STRIDE,
        )?;
        Some(bytes.chunks_exact(16).map(bytemuck::pod_read_unaligned).collect())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_assets::{AtlasError, AtlasSource};

    fn small_config() -> EngineConfig {
        EngineConfig {
            capacity: 16,
            fixed_delta_time: Some(0.5),
            ..Default::default()
        }
    }

    #[test]
    fn calls_before_init_are_noops() {
        let mut engine = Engine::new(small_config());
        assert!(!engine.is_initialized());
        engine.render();
        engine.wait_idle();
        let mut batch = EntityBatch::new();
        batch.push(Vec2::ZERO, Vec2::ZERO, 1, 0);
        assert_eq!(engine.ingest_entities(&batch), 0);
        assert_eq!(engine.live_count(), 0);
        assert_eq!(engine.read_instance_count(), None);
        engine.destroy();
        engine.destroy();
    }

    #[test]
    fn init_with_missing_atlas_file_is_atlas_load_failed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.png");
        let mut engine = Engine::new(EngineConfig {
            atlas: AtlasSource::files([&missing]),
            ..small_config()
        });
        let err = engine
            .init(RenderTarget::Offscreen {
                width: 64,
                height: 64,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::AtlasLoadFailed(AtlasError::Io { ref path, .. }) if *path == missing
        ));
        assert!(!engine.is_initialized());
        assert_eq!(engine.config().capacity, 16);
    }

    #[test]
    fn resize_updates_aspect_and_ignores_zero() {
        let mut engine = Engine::new(small_config());
        engine.resize(200, 100);
        assert_eq!(engine.camera().aspect(), 2.0);
        assert_eq!(engine.viewport(), (200, 100));
        engine.resize(0, 100);
        assert_eq!(engine.camera().aspect(), 2.0);
        assert_eq!(engine.viewport(), (200, 100));
    }

    #[test]
    fn capacity_comes_from_config() {
        let engine = Engine::new(small_config());
        assert_eq!(engine.capacity(), 16);
        assert_eq!(Engine::new(EngineConfig::default()).capacity(), 1_000_000);
    }

    #[test]
    fn fixed_delta_time_overrides_clock() {
        let mut engine = Engine::new(small_config());
        assert_eq!(engine.next_delta_time(), 0.5);
        assert_eq!(engine.next_delta_time(), 0.5);
    }

    #[test]
    fn wall_clock_delta_is_clamped() {
        let mut engine = Engine::new(EngineConfig {
            max_delta_time: 0.1,
            ..Default::default()
        });
        assert_eq!(engine.next_delta_time(), 0.0);
        engine.last_frame = Instant::now().checked_sub(std::time::Duration::from_secs(5));
        let dt = engine.next_delta_time();
        assert!(dt <= 0.1, "dt {dt}");
    }

    #[test]
    fn click_is_pending_until_a_frame_runs() {
        let mut engine = Engine::new(small_config());
        engine.click(Vec2::new(0.2, 0.3));
        assert!(engine.picking.click_pending());
        assert!(!engine.pick_in_flight());
        assert_eq!(engine.pointer_ndc, Vec2::new(0.2, 0.3));
    }

    #[test]
    fn camera_controls_route_to_camera() {
        let mut engine = Engine::new(small_config());
        engine.zoom(2.0);
        engine.pan(1.0, 0.0);
        assert_eq!(engine.camera().zoom(), 2.0);
        assert_eq!(engine.camera().position(), Vec2::new(-0.5, 0.0));
        engine.look_at(Vec2::new(3.0, 4.0));
        assert_eq!(engine.camera().position(), Vec2::new(3.0, 4.0));
    }
}
