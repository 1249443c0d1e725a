use crate::camera::WalkCamera;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use walkscene_assets::{Scene, SceneConfig};
use walkscene_kernel::particles::MAX_PARTICLES;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    camera_right: [f32; 4],
    camera_up: [f32; 4],
    ambient: [f32; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
    smoke_color: [f32; 4],
    smoke_offset: [f32; 4],
    ground_tint: [f32; 4],
    params: [f32; 4],
}

const _: () = assert!(std::mem::size_of::<Uniforms>() == 208);

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GroundVertex {
    position: [f32; 3],
    uv: [f32; 2],
}

/// Per-node proxy colours, cycled in node order.
const NODE_COLORS: [[f32; 4]; 4] = [
    [0.42, 0.45, 0.40, 1.0],
    [0.75, 0.30, 0.25, 1.0],
    [0.30, 0.45, 0.70, 1.0],
    [0.70, 0.65, 0.35, 1.0],
];

/// Appearance derived from the scene configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneStyle {
    pub ambient: [f32; 3],
    /// Unit vector pointing towards the directional light.
    pub light_dir: Vec3,
    pub light_color: [f32; 3],
    pub smoke_color: [f32; 4],
    /// Added to simulated particle positions when drawing.
    pub smoke_offset: Vec3,
    pub smoke_size: f32,
    pub smoke_additive: bool,
    pub ground_size: f32,
    pub ground_repeat: f32,
    pub ground_tint: [f32; 3],
}

impl SceneStyle {
    pub fn from_config(config: &SceneConfig) -> Self {
        let scaled = |c: walkscene_common::Color, k: f32| [c.r * k, c.g * k, c.b * k];
        let light = &config.lighting;
        let smoke = &config.smoke;
        Self {
            ambient: scaled(light.ambient.color, light.ambient.intensity),
            light_dir: light.directional_position.try_normalize().unwrap_or(Vec3::Y),
            light_color: scaled(light.directional.color, light.directional.intensity),
            smoke_color: [smoke.color.r, smoke.color.g, smoke.color.b, smoke.opacity],
            smoke_offset: smoke.offset,
            smoke_size: smoke.size,
            smoke_additive: smoke.additive,
            ground_size: config.ground.size,
            ground_repeat: config.ground.repeat,
            ground_tint: config.ground.tint.to_array(),
        }
    }
}

/// Generate unit cube vertices and indices.
fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        Vertex { position: [-p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [-p,  p,  p], normal: [0.0, 0.0, 1.0] },
        // -Z face
        Vertex { position: [ p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 0.0, -1.0] },
        // +X face
        Vertex { position: [ p, -p,  p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [1.0, 0.0, 0.0] },
        // -X face
        Vertex { position: [-p, -p, -p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [-1.0, 0.0, 0.0] },
        // +Y face
        Vertex { position: [-p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 1.0, 0.0] },
        // -Y face
        Vertex { position: [-p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [0.0, -1.0, 0.0] },
    ];
    #[rustfmt::skip]
    let indices: Vec<u16> = vec![
        0,1,2, 2,3,0,       // +Z
        4,5,6, 6,7,4,       // -Z
        8,9,10, 10,11,8,    // +X
        12,13,14, 14,15,12, // -X
        16,17,18, 18,19,16, // +Y
        20,21,22, 22,23,20, // -Y
    ];
    (vertices, indices)
}

/// Two triangles covering a `size` x `size` square at y = 0, uv in [0, 1].
fn ground_mesh(size: f32) -> Vec<GroundVertex> {
    let h = size * 0.5;
    let v = |x: f32, z: f32, u: f32, w: f32| GroundVertex {
        position: [x, 0.0, z],
        uv: [u, w],
    };
    vec![
        v(-h, h, 0.0, 0.0),
        v(h, h, 1.0, 0.0),
        v(h, -h, 1.0, 1.0),
        v(-h, h, 0.0, 0.0),
        v(h, -h, 1.0, 1.0),
        v(-h, -h, 0.0, 1.0),
    ]
}

/// One proxy box per loaded node, fitted to the model's bounds.
fn model_instances(scene: &Scene) -> Vec<InstanceData> {
    scene
        .nodes()
        .iter()
        .enumerate()
        .filter_map(|(i, node)| {
            let info = node.model()?;
            let t = &node.transform;
            let local = Mat4::from_translation(info.center()) * Mat4::from_scale(info.size());
            let model =
                Mat4::from_scale_rotation_translation(t.scale, t.rotation, t.position) * local;
            let cols = model.to_cols_array_2d();
            Some(InstanceData {
                model_0: cols[0],
                model_1: cols[1],
                model_2: cols[2],
                model_3: cols[3],
                color: NODE_COLORS[i % NODE_COLORS.len()],
            })
        })
        .collect()
}

fn depth_state(write: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: wgpu::TextureFormat::Depth32Float,
        depth_write_enabled: write,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: Default::default(),
        bias: Default::default(),
    }
}

fn smoke_blend(additive: bool) -> wgpu::BlendState {
    if additive {
        wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        }
    } else {
        wgpu::BlendState::ALPHA_BLENDING
    }
}

/// wgpu-based scene renderer.
pub struct WgpuRenderer {
    model_pipeline: wgpu::RenderPipeline,
    ground_pipeline: wgpu::RenderPipeline,
    smoke_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    cube_vertex_buffer: wgpu::Buffer,
    cube_index_buffer: wgpu::Buffer,
    cube_index_count: u32,
    ground_vertex_buffer: wgpu::Buffer,
    ground_vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    smoke_buffer: wgpu::Buffer,
    smoke_capacity: u32,
    smoke_count: u32,
    depth_texture: wgpu::TextureView,
    style: SceneStyle,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        style: SceneStyle,
        smoke_capacity: usize,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_buffer"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // Model proxy pipeline
        let model_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("model_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::model_shader().into()),
        });

        let model_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("model_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &model_shader,
                entry_point: Some("vs_model"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &model_shader,
                entry_point: Some("fs_model"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Ground pipeline
        let ground_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ground_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::ground_shader().into()),
        });

        let ground_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ground_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &ground_shader,
                entry_point: Some("vs_ground"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GroundVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x2,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &ground_shader,
                entry_point: Some("fs_ground"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Smoke pipeline: depth-tested, but never writes depth
        let smoke_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("smoke_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::smoke_shader().into()),
        });

        let smoke_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("smoke_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &smoke_shader,
                entry_point: Some("vs_smoke"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &smoke_shader,
                entry_point: Some("fs_smoke"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(smoke_blend(style.smoke_additive)),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(false)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Cube mesh
        let (cube_verts, cube_indices) = cube_mesh();
        let cube_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_vertex_buffer"),
            contents: bytemuck::cast_slice(&cube_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_index_buffer"),
            contents: bytemuck::cast_slice(&cube_indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let cube_index_count = cube_indices.len() as u32;

        // Ground mesh
        let ground_verts = ground_mesh(style.ground_size);
        let ground_vertex_count = ground_verts.len() as u32;
        let ground_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ground_vertex_buffer"),
            contents: bytemuck::cast_slice(&ground_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Instance buffer (pre-allocated)
        let max_instances = 256u32;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (max_instances as u64) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Smoke buffer, sized once for the fixed pool
        let smoke_capacity = u32::try_from(smoke_capacity.clamp(1, MAX_PARTICLES)).unwrap_or(1);
        let smoke_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("smoke_buffer"),
            size: (smoke_capacity as u64) * std::mem::size_of::<[f32; 3]>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            model_pipeline,
            ground_pipeline,
            smoke_pipeline,
            uniform_buffer,
            uniform_bind_group,
            cube_vertex_buffer,
            cube_index_buffer,
            cube_index_count,
            ground_vertex_buffer,
            ground_vertex_count,
            instance_buffer,
            max_instances,
            smoke_buffer,
            smoke_capacity,
            smoke_count: 0,
            depth_texture,
            style,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn style(&self) -> &SceneStyle {
        &self.style
    }

    /// Copy the smoke positions into the point buffer. The caller clears the
    /// field's dirty flag afterwards.
    pub fn upload_smoke(&mut self, queue: &wgpu::Queue, positions: &[Vec3]) {
        let count = positions.len().min(self.smoke_capacity as usize);
        if count < positions.len() {
            tracing::warn!(
                capacity = self.smoke_capacity,
                len = positions.len(),
                "smoke pool larger than its buffer; extra particles are not drawn"
            );
        }
        let packed: Vec<[f32; 3]> = positions[..count].iter().map(|p| p.to_array()).collect();
        if !packed.is_empty() {
            queue.write_buffer(&self.smoke_buffer, 0, bytemuck::cast_slice(&packed));
        }
        self.smoke_count = count as u32;
    }

    fn uniforms(&self, camera: &WalkCamera) -> Uniforms {
        let s = &self.style;
        let right = camera.right();
        let up = camera.up();
        Uniforms {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_right: [right.x, right.y, right.z, 0.0],
            camera_up: [up.x, up.y, up.z, 0.0],
            ambient: [s.ambient[0], s.ambient[1], s.ambient[2], 1.0],
            light_dir: [s.light_dir.x, s.light_dir.y, s.light_dir.z, 0.0],
            light_color: [s.light_color[0], s.light_color[1], s.light_color[2], 1.0],
            smoke_color: s.smoke_color,
            smoke_offset: [s.smoke_offset.x, s.smoke_offset.y, s.smoke_offset.z, 0.0],
            ground_tint: [s.ground_tint[0], s.ground_tint[1], s.ground_tint[2], 1.0],
            params: [s.smoke_size, s.ground_repeat, 0.0, 0.0],
        }
    }

    /// Render one frame: ground, loaded model proxies, then smoke.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &WalkCamera,
        scene: &Scene,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms(camera)),
        );

        let mut instances = model_instances(scene);
        instances.truncate(self.max_instances as usize);
        if !instances.is_empty() {
            queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&instances),
            );
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.55,
                            g: 0.65,
                            b: 0.78,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            pass.set_pipeline(&self.ground_pipeline);
            pass.set_vertex_buffer(0, self.ground_vertex_buffer.slice(..));
            pass.draw(0..self.ground_vertex_count, 0..1);

            if !instances.is_empty() {
                pass.set_pipeline(&self.model_pipeline);
                pass.set_vertex_buffer(0, self.cube_vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(
                    self.cube_index_buffer.slice(..),
                    wgpu::IndexFormat::Uint16,
                );
                pass.draw_indexed(0..self.cube_index_count, 0, 0..instances.len() as u32);
            }

            // Transparent smoke last so it blends over the opaque geometry
            if self.smoke_count > 0 {
                pass.set_pipeline(&self.smoke_pipeline);
                pass.set_vertex_buffer(0, self.smoke_buffer.slice(..));
                pass.draw(0..6, 0..self.smoke_count);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}
