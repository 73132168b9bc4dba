//! # GPU Renderer
//!
//! Uploads a [`View`] to wgpu and draws it.
//!
//! ```text
//! group 0: scene uniform (mvp, palette row) + palette texture (256 × 256 RGBA)
//! group 1: face-group normal (one bind group per face)
//! vertex:  Uint8x4 (x, y, z, color)
//! ```
//!
//! Resource creation runs inside a validation error scope so a broken
//! shader or descriptor surfaces as [`RenderError::Gpu`] instead of a
//! panic on the device's error callback.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::error::{RenderError, RenderResult};
use crate::palette::{PaletteImage, MAX_PALETTES, PALETTE_COLORS};
use crate::view::{Face, FaceVertex, View};

/// Depth attachment format expected by the pipeline.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const SHADER_SOURCE: &str = include_str!("shaders/view.wgsl");

/// Scene uniform layout, mirrored by `Scene` in the shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct SceneUniform {
    mvp: [[f32; 4]; 4],
    palette: [u32; 4],
}

/// GPU state of one face group.
struct GpuFace {
    normal_bind_group: wgpu::BindGroup,
    vertex_buffer: Option<wgpu::Buffer>,
    capacity: u64,
    vertex_count: u32,
    visible: bool,
}

/// Draws the face buffers of a [`View`].
pub struct ViewRenderer {
    pipeline: wgpu::RenderPipeline,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    palette_texture: wgpu::Texture,
    palette_row: u32,
    faces: Vec<GpuFace>,
}

impl ViewRenderer {
    /// Builds the pipeline for `color_format` targets with a
    /// [`DEPTH_FORMAT`] depth attachment.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Gpu`] if any resource fails validation.
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> RenderResult<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let renderer = Self::create(device, color_format);
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            tracing::error!("View renderer setup failed: {}", err);
            return Err(RenderError::Gpu(err.to_string()));
        }
        tracing::info!("View renderer ready ({:?})", color_format);
        Ok(renderer)
    }

    fn create(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("View Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("View Scene"),
            size: std::mem::size_of::<SceneUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let palette_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("View Palettes"),
            size: palette_extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let palette_view = palette_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("View Scene Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let face_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("View Face Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("View Scene Bind Group"),
            layout: &scene_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: scene_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&palette_view),
                },
            ],
        });

        let faces = Face::ALL
            .iter()
            .map(|face| {
                let n = face.normal();
                let normal = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("View Face Normal"),
                    contents: bytemuck::cast_slice(&[n.x, n.y, n.z, 0.0f32]),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                let normal_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("View Face Bind Group"),
                    layout: &face_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: normal.as_entire_binding(),
                    }],
                });
                GpuFace {
                    normal_bind_group,
                    vertex_buffer: None,
                    capacity: 0,
                    vertex_count: 0,
                    visible: false,
                }
            })
            .collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("View Pipeline Layout"),
            bind_group_layouts: &[&scene_layout, &face_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("View Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<FaceVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Uint8x4,
                        offset: 0,
                        shader_location: 0,
                    }],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Face groups are culled on the CPU.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            pipeline,
            scene_buffer,
            scene_bind_group,
            palette_texture,
            palette_row: 0,
            faces,
        }
    }

    /// Selects which palette row the fragment shader reads.
    pub fn set_palette_row(&mut self, row: u32) {
        self.palette_row = row.min(MAX_PALETTES as u32 - 1);
    }

    /// Uploads the palette image.
    pub fn upload_palettes(&self, queue: &wgpu::Queue, image: &PaletteImage) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.palette_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.to_rgba8(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(PALETTE_COLORS as u32 * 4),
                rows_per_image: Some(MAX_PALETTES as u32),
            },
            palette_extent(),
        );
    }

    /// Uploads the scene uniform and every non-empty, non-culled face
    /// buffer of `view`. Vertex buffers grow as needed and are reused.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, view: &View) {
        let scene = SceneUniform {
            mvp: view.mvp().cols,
            palette: [self.palette_row, 0, 0, 0],
        };
        queue.write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&scene));

        for (gpu, buffer) in self.faces.iter_mut().zip(view.faces()) {
            let vertices = buffer.vertices();
            gpu.visible = !view.is_culled(buffer.face()) && !vertices.is_empty();
            if !gpu.visible {
                continue;
            }

            let bytes: &[u8] = bytemuck::cast_slice(vertices);
            let needed = bytes.len() as u64;
            if gpu.vertex_buffer.is_none() || gpu.capacity < needed {
                let capacity = needed.next_power_of_two();
                gpu.vertex_buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("View Face Vertices"),
                    size: capacity,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }));
                gpu.capacity = capacity;
            }
            if let Some(vb) = &gpu.vertex_buffer {
                queue.write_buffer(vb, 0, bytes);
            }
            gpu.vertex_count = vertices.len() as u32;
        }
    }

    /// Records one draw per visible face group.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.scene_bind_group, &[]);
        for face in self.faces.iter().filter(|f| f.visible) {
            let Some(vb) = &face.vertex_buffer else {
                continue;
            };
            let bytes = u64::from(face.vertex_count) * std::mem::size_of::<FaceVertex>() as u64;
            pass.set_bind_group(1, &face.normal_bind_group, &[]);
            pass.set_vertex_buffer(0, vb.slice(..bytes));
            pass.draw(0..face.vertex_count, 0..1);
        }
    }

    /// Number of draw calls the next `draw` will record.
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.faces.iter().filter(|f| f.visible).count()
    }
}

fn palette_extent() -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: PALETTE_COLORS as u32,
        height: MAX_PALETTES as u32,
        depth_or_array_layers: 1,
    }
}
