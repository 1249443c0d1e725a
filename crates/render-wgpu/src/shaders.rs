/// Uniform block shared by every pipeline.
const UNIFORMS: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    camera_right: vec4<f32>,
    camera_up: vec4<f32>,
    ambient: vec4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
    smoke_color: vec4<f32>,
    // xyz: world placement of the simulated cloud
    smoke_offset: vec4<f32>,
    ground_tint: vec4<f32>,
    // x: smoke size, y: ground repeat
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

fn shade(normal: vec3<f32>, albedo: vec3<f32>) -> vec3<f32> {
    let diffuse = max(dot(normalize(normal), uniforms.light_dir.xyz), 0.0);
    return albedo * (uniforms.ambient.rgb + uniforms.light_color.rgb * diffuse);
}
"#;

/// Lit instanced boxes standing in for loaded models.
const MODEL_BODY: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_model(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * model * vec4<f32>(vertex.position, 1.0);
    out.world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.color = instance.color;
    return out;
}

@fragment
fn fs_model(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(shade(in.world_normal, in.color.rgb), in.color.a);
}
"#;

/// Ground plane with a procedural tile pattern standing in for the texture.
const GROUND_BODY: &str = r#"
struct GroundVertex {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct GroundOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_ground(vertex: GroundVertex) -> GroundOutput {
    var out: GroundOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex.position, 1.0);
    out.uv = vertex.uv * uniforms.params.y;
    return out;
}

fn hash(p: vec2<f32>) -> f32 {
    return fract(sin(dot(p, vec2<f32>(127.1, 311.7))) * 43758.5453);
}

@fragment
fn fs_ground(in: GroundOutput) -> @location(0) vec4<f32> {
    let cell = floor(in.uv);
    let grain = hash(cell) * 0.15 + hash(floor(in.uv * 8.0)) * 0.1;
    let albedo = uniforms.ground_tint.rgb * (0.85 + grain);
    return vec4<f32>(shade(vec3<f32>(0.0, 1.0, 0.0), albedo), 1.0);
}
"#;

/// Smoke particles as camera-facing quads, six vertices per instance.
const SMOKE_BODY: &str = r#"
struct SmokeOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) corner: vec2<f32>,
};

@vertex
fn vs_smoke(@builtin(vertex_index) index: u32, @location(0) center: vec3<f32>) -> SmokeOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
    );
    let corner = corners[index];
    let half = uniforms.params.x * 0.5;
    let world = center + uniforms.smoke_offset.xyz
        + uniforms.camera_right.xyz * corner.x * half
        + uniforms.camera_up.xyz * corner.y * half;
    var out: SmokeOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(world, 1.0);
    out.corner = corner;
    return out;
}

@fragment
fn fs_smoke(in: SmokeOutput) -> @location(0) vec4<f32> {
    let falloff = clamp(1.0 - length(in.corner), 0.0, 1.0);
    return vec4<f32>(uniforms.smoke_color.rgb, uniforms.smoke_color.a * falloff);
}
"#;

pub fn model_shader() -> String {
    format!("{UNIFORMS}{MODEL_BODY}")
}

pub fn ground_shader() -> String {
    format!("{UNIFORMS}{GROUND_BODY}")
}

pub fn smoke_shader() -> String {
    format!("{UNIFORMS}{SMOKE_BODY}")
}
