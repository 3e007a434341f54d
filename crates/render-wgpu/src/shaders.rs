/// Compute pass: integrate motion, build the visible index list and resolve picks.
///
/// Bindings:
/// 0 frame uniforms, 1 positions (rw), 2 velocities, 3 indirect draw args (rw),
/// 4 visible indices (rw), 5 statuses, 6 pick result (rw).
pub const SIMULATION_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    delta_time: f32,
    viewport_width: f32,
    viewport_height: f32,
    _pad: f32,
    pointer_world: vec2<f32>,
    pick_radius: f32,
    click: f32,
};

struct DrawArgs {
    vertex_count: u32,
    instance_count: atomic<u32>,
    first_vertex: u32,
    first_instance: u32,
};

const SPRITE_HALF_PX: f32 = 8.0;
const STATUS_INACTIVE: u32 = 0u;

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(0) @binding(1) var<storage, read_write> positions: array<vec4<f32>>;
@group(0) @binding(2) var<storage, read> velocities: array<vec4<f32>>;
@group(0) @binding(3) var<storage, read_write> draw_args: DrawArgs;
@group(0) @binding(4) var<storage, read_write> visible: array<u32>;
@group(0) @binding(5) var<storage, read> statuses: array<u32>;
@group(0) @binding(6) var<storage, read_write> pick: atomic<u32>;

@compute @workgroup_size(64)
fn simulate(@builtin(global_invocation_id) gid: vec3<u32>) {
    let i = gid.x;
    if (i >= arrayLength(&statuses)) {
        return;
    }
    if (statuses[i] == STATUS_INACTIVE) {
        return;
    }

    let v = velocities[i];
    var p = positions[i];
    p = vec4<f32>(p.xy + v.xy * uniforms.delta_time, p.z, p.w);
    positions[i] = p;

    let clip = uniforms.view_proj * vec4<f32>(p.xy, 0.0, 1.0);
    let ndc = clip.xy / clip.w;
    let half_extent = vec2<f32>(
        2.0 * SPRITE_HALF_PX / max(uniforms.viewport_width, 1.0),
        2.0 * SPRITE_HALF_PX / max(uniforms.viewport_height, 1.0),
    );
    if (all(abs(ndc) <= vec2<f32>(1.0) + half_extent)) {
        let slot = atomicAdd(&draw_args.instance_count, 1u);
        visible[slot] = i;
    }

    if (uniforms.click > 0.5) {
        let d = p.xy - uniforms.pointer_world;
        if (dot(d, d) <= uniforms.pick_radius * uniforms.pick_radius) {
            atomicMin(&pick, i);
        }
    }
}
"#;

/// Render pass: one screen-aligned quad per visible entity, textured from the atlas.
///
/// Bindings:
/// 0 frame uniforms, 1 positions, 2 visible indices, 3 types,
/// 4 atlas texture array, 5 atlas sampler.
pub const PRESENTATION_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    delta_time: f32,
    viewport_width: f32,
    viewport_height: f32,
    _pad: f32,
    pointer_world: vec2<f32>,
    pick_radius: f32,
    click: f32,
};

const SPRITE_HALF_PX: f32 = 8.0;

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(0) @binding(1) var<storage, read> positions: array<vec4<f32>>;
@group(0) @binding(2) var<storage, read> visible: array<u32>;
@group(0) @binding(3) var<storage, read> types: array<u32>;
@group(0) @binding(4) var atlas: texture_2d_array<f32>;
@group(0) @binding(5) var atlas_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) @interpolate(flat) layer: u32,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @builtin(instance_index) instance_index: u32,
) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let entity = visible[instance_index];
    let corner = corners[vertex_index % 6u];

    let center = uniforms.view_proj * vec4<f32>(positions[entity].xy, 0.0, 1.0);
    let half_extent = vec2<f32>(
        2.0 * SPRITE_HALF_PX / max(uniforms.viewport_width, 1.0),
        2.0 * SPRITE_HALF_PX / max(uniforms.viewport_height, 1.0),
    );

    var out: VertexOutput;
    out.clip_position = vec4<f32>(center.xy + corner * half_extent * center.w, center.z, center.w);
    out.uv = vec2<f32>(corner.x * 0.5 + 0.5, 0.5 - corner.y * 0.5);
    // Unknown types fall back to the last layer.
    out.layer = min(types[entity], textureNumLayers(atlas) - 1u);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(atlas, atlas_sampler, in.uv, in.layer);
    if (color.a < 0.01) {
        discard;
    }
    return color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_common::{FrameUniforms, SPRITE_HALF_PX, STATUS_INACTIVE, WORKGROUP_SIZE};

    #[test]
    fn sprite_size_matches_host_constant() {
        let decl = format!("const SPRITE_HALF_PX: f32 = {SPRITE_HALF_PX:.1};");
        assert!(SIMULATION_SHADER.contains(&decl));
        assert!(PRESENTATION_SHADER.contains(&decl));
    }

    #[test]
    fn workgroup_size_matches_host_constant() {
        let decl = format!("@workgroup_size({WORKGROUP_SIZE})");
        assert!(SIMULATION_SHADER.contains(&decl));
        assert_eq!(STATUS_INACTIVE, 0);
    }

    #[test]
    fn uniform_struct_has_eight_scalar_fields_after_matrix() {
        // mat4 (64 bytes) followed by eight 4-byte scalars.
        assert_eq!(FrameUniforms::SIZE, 64 + 8 * 4);
        for shader in [SIMULATION_SHADER, PRESENTATION_SHADER] {
            assert!(shader.contains("pointer_world: vec2<f32>"));
            assert!(shader.contains("click: f32"));
        }
    }

    #[test]
    fn entry_points_present() {
        assert!(SIMULATION_SHADER.contains("fn simulate("));
        assert!(PRESENTATION_SHADER.contains("fn vs_main("));
        assert!(PRESENTATION_SHADER.contains("fn fs_main("));
    }
}
