use wgpu::*;
use wgpu::util::DeviceExt;

use crate::controller::{LightingUniform, CameraUniform, NodeUniform};
use crate::controller::session::Viewport;
use crate::model::{Camera, NodeId, Scene};
use crate::view::mesh::{Mesh, MeshBuffer, Vertex, linear_color};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

// Shared graphics setup used by native and web
pub struct CameraResources {
    pub camera_buffer: wgpu::Buffer,
    pub lighting_buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub camera_bind_group: wgpu::BindGroup,
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

fn uniform_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub fn create_camera_resources(device: &wgpu::Device) -> CameraResources {
    let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let lighting_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lighting_buffer"),
        size: std::mem::size_of::<LightingUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("camera_bind_group_layout"),
        entries: &[
            uniform_entry(0, ShaderStages::VERTEX),
            uniform_entry(1, ShaderStages::FRAGMENT),
        ],
    });

    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("camera_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
        ],
    });

    CameraResources { camera_buffer, lighting_buffer, bind_group_layout, camera_bind_group }
}

pub fn create_node_layout(device: &wgpu::Device) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("node_bind_group_layout"),
        entries: &[uniform_entry(0, ShaderStages::VERTEX)],
    })
}

pub fn create_scene_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    camera_layout: &wgpu::BindGroupLayout,
    node_layout: &wgpu::BindGroupLayout,
) -> RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pipeline_layout"),
        bind_group_layouts: &[camera_layout, node_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("scene_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[
                    wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
                    wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
                    wgpu::VertexAttribute { offset: 24, shader_location: 2, format: wgpu::VertexFormat::Float32x4 },
                ],
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState { format, blend: Some(wgpu::BlendState::REPLACE), write_mask: wgpu::ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

///////////////////////////////////////////////////////////////////////////////

/// GPU copy of one scene object: static mesh plus a per-frame model matrix
struct GpuObject {
    node: NodeId,
    mesh: MeshBuffer,
    node_buffer: Buffer,
    bind_group: BindGroup,
}

/// GPU resources mirroring a `Scene`
struct GpuScene {
    objects: Vec<GpuObject>,
}

impl GpuScene {
    fn upload(device: &Device, layout: &BindGroupLayout, scene: &Scene) -> Self {
        let objects = scene
            .objects
            .iter()
            .map(|obj| {
                let mesh = Mesh::for_shape(&obj.shape, obj.color).upload(device);
                let node_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("node_uniform"),
                    contents: bytemuck::bytes_of(&NodeUniform::from_world(scene.graph.world_matrix(obj.node))),
                    usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                });
                let bind_group = device.create_bind_group(&BindGroupDescriptor {
                    label: Some("node_bind_group"),
                    layout,
                    entries: &[BindGroupEntry { binding: 0, resource: node_buffer.as_entire_binding() }],
                });
                GpuObject { node: obj.node, mesh, node_buffer, bind_group }
            })
            .collect();
        Self { objects }
    }

    fn matches(&self, scene: &Scene) -> bool {
        self.objects.len() == scene.objects.len()
    }
}

/// egui output for one frame, already tessellated
pub struct EguiFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// Consolidated render state to avoid parameter explosion
pub struct RenderState {
    // wgpu resources
    pub format: TextureFormat,
    pub alpha_mode: CompositeAlphaMode,
    pub width: u32,
    pub height: u32,

    pipeline: RenderPipeline,
    camera: CameraResources,
    node_layout: BindGroupLayout,
    depth_view: TextureView,

    // One GPU mirror per viewport, built on first draw
    menu_scene: Option<GpuScene>,
    game_scene: Option<GpuScene>,

    // UI
    pub egui_renderer: egui_wgpu::Renderer,
}

impl RenderState {
    pub fn new(device: &Device, format: TextureFormat, alpha_mode: CompositeAlphaMode, width: u32, height: u32) -> Self {
        let camera = create_camera_resources(device);
        let node_layout = create_node_layout(device);
        let pipeline = create_scene_pipeline(device, format, &camera.bind_group_layout, &node_layout);
        let (_, depth_view) = create_depth_texture(device, width, height);
        let egui_renderer = egui_wgpu::Renderer::new(device, format, egui_wgpu::RendererOptions::default());

        Self {
            format,
            alpha_mode,
            width,
            height,
            pipeline,
            camera,
            node_layout,
            depth_view,
            menu_scene: None,
            game_scene: None,
            egui_renderer,
        }
    }

    fn surface_config(&self) -> SurfaceConfiguration {
        SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: self.format,
            width: self.width.max(1),
            height: self.height.max(1),
            present_mode: PresentMode::Fifo,
            alpha_mode: self.alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }

    /// Reconfigure the surface and depth buffer for a new viewport size
    pub fn resize(&mut self, device: &Device, surface: &Surface, width: u32, height: u32) {
        if width == 0 || height == 0 || (width == self.width && height == self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        surface.configure(device, &self.surface_config());
        self.depth_view = create_depth_texture(device, width, height).1;
        tracing::debug!(width, height, "surface reconfigured");
    }

    pub fn draw_frame(
        &mut self,
        device: &Device,
        queue: &Queue,
        surface: &Surface,
        viewport: Viewport,
        scene: &Scene,
        camera: &Camera,
        egui_frame: Option<EguiFrame>,
    ) {
        let frame = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                surface.configure(device, &self.surface_config());
                return;
            }
            Err(e) => {
                tracing::warn!("skipping frame: {e:?}");
                return;
            }
        };

        // Uniforms for this frame
        queue.write_buffer(&self.camera.camera_buffer, 0, bytemuck::bytes_of(&CameraUniform {
            view_proj: camera.view_proj().to_cols_array_2d(),
        }));
        queue.write_buffer(&self.camera.lighting_buffer, 0, bytemuck::bytes_of(&LightingUniform::from(&scene.lighting)));

        let slot = match viewport {
            Viewport::Menu => &mut self.menu_scene,
            Viewport::Game => &mut self.game_scene,
        };
        if !slot.as_ref().is_some_and(|g| g.matches(scene)) {
            tracing::debug!(?viewport, objects = scene.objects.len(), "uploading scene");
            *slot = Some(GpuScene::upload(device, &self.node_layout, scene));
        }
        let Some(gpu_scene) = slot.as_ref() else {
            return;
        };
        for obj in &gpu_scene.objects {
            let uniform = NodeUniform::from_world(scene.graph.world_matrix(obj.node));
            queue.write_buffer(&obj.node_buffer, 0, bytemuck::bytes_of(&uniform));
        }

        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        let [r, g, b, _] = linear_color(scene.background);
        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color { r: r as f64, g: g as f64, b: b as f64, a: 1.0 }),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.pipeline);
            rp.set_bind_group(0, &self.camera.camera_bind_group, &[]);

            for obj in &gpu_scene.objects {
                if obj.mesh.index_count == 0 {
                    continue;
                }
                rp.set_bind_group(1, &obj.bind_group, &[]);
                rp.set_vertex_buffer(0, obj.mesh.vertex_buffer.slice(..));
                rp.set_index_buffer(obj.mesh.index_buffer.slice(..), IndexFormat::Uint32);
                rp.draw_indexed(0..obj.mesh.index_count, 0, 0..1);
            }
        }

        if let Some(ui) = egui_frame {
            self.draw_egui(device, queue, &mut encoder, &view, ui);
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }

    fn draw_egui(&mut self, device: &Device, queue: &Queue, encoder: &mut CommandEncoder, view: &TextureView, ui: EguiFrame) {
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.width, self.height],
            pixels_per_point: ui.pixels_per_point,
        };

        // Upload egui textures
        for (id, image_delta) in &ui.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        self.egui_renderer
            .update_buffers(device, queue, encoder, &ui.primitives, &screen_descriptor);

        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut egui_pass.forget_lifetime(), &ui.primitives, &screen_descriptor);
        }

        for id in &ui.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
