use std::sync::Arc;

use glam::Mat4;
use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::config::ViewportConfig;
use crate::display::DisplaySurface;
use crate::error::{Result, ViewerError};
use crate::model::{ModelNode, TextureData, Vertex};
use crate::render_loop::FrameScheduler;
use crate::scene::SceneRig;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const PREFERRED_SAMPLES: u32 = 4;
const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

/// Per-frame uniform data for GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GlobalsUniform {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    ambient: [f32; 4],
    light_color: [f32; 4],
    light_dir: [f32; 4],
}

impl GlobalsUniform {
    fn from_rig(rig: &SceneRig) -> Self {
        let model = rig
            .model()
            .map(|m| m.transform.matrix())
            .unwrap_or(Mat4::IDENTITY);
        let lights = rig.lights();
        let ambient = lights.ambient.color * lights.ambient.intensity;
        let light = lights.directional.color * lights.directional.intensity;

        Self {
            view_proj: rig.camera().view_projection().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            ambient: ambient.extend(1.0).to_array(),
            light_color: light.extend(1.0).to_array(),
            light_dir: lights.directional.direction().extend(0.0).to_array(),
        }
    }
}

/// Material uniform data for GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
    base_color: [f32; 4],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    material_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    index_count: u32,
}

/// Buffers and textures of the uploaded model
struct GpuModel {
    meshes: Vec<GpuMesh>,
    textures: Vec<wgpu::Texture>,
}

impl GpuModel {
    fn destroy(self) {
        for mesh in &self.meshes {
            mesh.vertex_buffer.destroy();
            mesh.index_buffer.destroy();
            mesh.material_buffer.destroy();
        }
        for texture in &self.textures {
            texture.destroy();
        }
    }
}

/// Everything that exists only between acquire and release
struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    pipeline: wgpu::RenderPipeline,
    material_layout: wgpu::BindGroupLayout,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    fallback_texture: wgpu::Texture,
    depth_texture: wgpu::Texture,
    msaa_texture: Option<wgpu::Texture>,
    model: Option<GpuModel>,
}

/// wgpu-backed display surface drawing into a winit window
pub struct WgpuSurface {
    window: Arc<Window>,
    state: Option<GpuState>,
}

impl WgpuSurface {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            state: None,
        }
    }

    async fn create_state(window: Arc<Window>, viewport: &ViewportConfig) -> Result<GpuState> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| ViewerError::Surface(format!("no suitable adapter: {:?}", e)))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Viewer Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| ViewerError::Surface(format!("failed to create device: {:?}", e)))?;

        let max_dimension = device.limits().max_texture_dimension_2d;
        if viewport.width.max(viewport.height) > max_dimension {
            return Err(ViewerError::Surface(format!(
                "viewport {}x{} exceeds the device limit of {} pixels",
                viewport.width, viewport.height, max_dimension
            )));
        }

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| ViewerError::Surface("surface reports no formats".to_string()))?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: viewport.width,
            height: viewport.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let sample_count = if adapter
            .get_texture_format_features(format)
            .flags
            .sample_count_supported(PREFERRED_SAMPLES)
        {
            PREFERRED_SAMPLES
        } else {
            1
        };

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
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
        let material_layout = Self::create_material_layout(&device);

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals Buffer"),
            size: std::mem::size_of::<GlobalsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let pipeline = Self::create_pipeline(
            &device,
            &[&globals_layout, &material_layout],
            format,
            sample_count,
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Base Color Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let fallback_texture = Self::create_texture(&device, &queue, &TextureData::white(1, 1))
            .ok_or_else(|| ViewerError::Surface("could not create fallback texture".to_string()))?;

        let depth_texture = Self::create_attachment(
            &device,
            viewport,
            DEPTH_FORMAT,
            sample_count,
            "Depth Texture",
        );
        let msaa_texture = (sample_count > 1).then(|| {
            Self::create_attachment(&device, viewport, format, sample_count, "MSAA Color Texture")
        });

        info!(
            "Display surface acquired: {}x{} {:?}, {}x MSAA",
            viewport.width, viewport.height, format, sample_count
        );

        Ok(GpuState {
            surface,
            device,
            queue,
            surface_config,
            sample_count,
            pipeline,
            material_layout,
            globals_buffer,
            globals_bind_group,
            sampler,
            fallback_texture,
            depth_texture,
            msaa_texture,
            model: None,
        })
    }

    fn create_material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
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
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layouts: &[&wgpu::BindGroupLayout],
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Model Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/model.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Model Pipeline Layout"),
            bind_group_layouts: layouts,
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Model Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
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
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    fn create_attachment(
        device: &wgpu::Device,
        viewport: &ViewportConfig,
        format: wgpu::TextureFormat,
        sample_count: u32,
        label: &str,
    ) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: viewport.width,
                height: viewport.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    /// Uploads an RGBA8 image; `None` when it exceeds the device texture limit
    fn create_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &TextureData,
    ) -> Option<wgpu::Texture> {
        let max_dimension = device.limits().max_texture_dimension_2d;
        if !data.fits_within(max_dimension) {
            warn!(
                "Texture {}x{} exceeds the {} pixel limit, using plain base colour",
                data.width, data.height, max_dimension
            );
            return None;
        }

        let size = wgpu::Extent3d {
            width: data.width.max(1),
            height: data.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Base Color Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let expected = TextureData::expected_len(size.width, size.height);
        if data.data.len() == expected {
            queue.write_texture(
                texture.as_image_copy(),
                &data.data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * size.width),
                    rows_per_image: Some(size.height),
                },
                size,
            );
        } else {
            warn!(
                "Texture data is {} bytes, expected {}; leaving it blank",
                data.data.len(),
                expected
            );
        }

        Some(texture)
    }

    fn upload(state: &GpuState, model: &ModelNode) -> GpuModel {
        let textures: Vec<Option<wgpu::Texture>> = model
            .textures
            .iter()
            .map(|t| Self::create_texture(&state.device, &state.queue, t))
            .collect();

        let meshes = model
            .meshes
            .iter()
            .filter(|mesh| !mesh.indices.is_empty() && !mesh.vertices.is_empty())
            .map(|mesh| {
                let material = model.material(mesh.material);
                let texture = material
                    .texture
                    .and_then(|i| textures.get(i))
                    .and_then(Option::as_ref)
                    .unwrap_or(&state.fallback_texture);
                let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

                let vertex_buffer =
                    state
                        .device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("Vertex Buffer"),
                            contents: bytemuck::cast_slice(&mesh.vertices),
                            usage: wgpu::BufferUsages::VERTEX,
                        });
                let index_buffer =
                    state
                        .device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("Index Buffer"),
                            contents: bytemuck::cast_slice(&mesh.indices),
                            usage: wgpu::BufferUsages::INDEX,
                        });
                let material_buffer =
                    state
                        .device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("Material Buffer"),
                            contents: bytemuck::bytes_of(&MaterialUniform {
                                base_color: material.base_color,
                            }),
                            usage: wgpu::BufferUsages::UNIFORM,
                        });

                let bind_group = state.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Material Bind Group"),
                    layout: &state.material_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: material_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&texture_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&state.sampler),
                        },
                    ],
                });

                GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    material_buffer,
                    bind_group,
                    index_count: mesh.indices.len() as u32,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            "Uploaded {} meshes and {} textures",
            meshes.len(),
            textures.iter().flatten().count()
        );

        GpuModel {
            meshes,
            textures: textures.into_iter().flatten().collect(),
        }
    }

    fn render(state: &mut GpuState, rig: &SceneRig) -> Result<()> {
        let frame = match state.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                state.surface.configure(&state.device, &state.surface_config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                debug!("Surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        state.queue.write_buffer(
            &state.globals_buffer,
            0,
            bytemuck::bytes_of(&GlobalsUniform::from_rig(rig)),
        );

        let frame_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let msaa_view = state
            .msaa_texture
            .as_ref()
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()));
        let depth_view = state
            .depth_texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (color_view, resolve_target) = match &msaa_view {
            Some(view) => (view, Some(&frame_view)),
            None => (&frame_view, None),
        };

        let [r, g, b, a] = rig.clear_color();
        let mut encoder = state
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Viewer Render Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Viewer Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(model) = &state.model {
                pass.set_pipeline(&state.pipeline);
                pass.set_bind_group(0, &state.globals_bind_group, &[]);
                for mesh in &model.meshes {
                    pass.set_bind_group(1, &mesh.bind_group, &[]);
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }

        state.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

impl DisplaySurface for WgpuSurface {
    fn acquire(&mut self, viewport: &ViewportConfig) -> Result<()> {
        if self.state.is_some() {
            return Ok(());
        }
        let state = pollster::block_on(Self::create_state(self.window.clone(), viewport))?;
        self.state = Some(state);
        Ok(())
    }

    fn upload_model(&mut self, model: &ModelNode) -> Result<()> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| ViewerError::Surface("upload before acquire".to_string()))?;

        if let Some(previous) = state.model.take() {
            previous.destroy();
        }
        state.model = Some(Self::upload(state, model));
        Ok(())
    }

    fn draw(&mut self, rig: &SceneRig) -> Result<()> {
        match self.state.as_mut() {
            Some(state) => Self::render(state, rig),
            None => Err(ViewerError::Surface("draw before acquire".to_string())),
        }
    }

    fn release(&mut self) {
        let Some(mut state) = self.state.take() else {
            return;
        };

        if let Some(model) = state.model.take() {
            model.destroy();
        }
        state.globals_buffer.destroy();
        state.fallback_texture.destroy();
        state.depth_texture.destroy();
        if let Some(msaa) = &state.msaa_texture {
            msaa.destroy();
        }
        debug!(
            "Releasing {}x{} surface ({}x MSAA)",
            state.surface_config.width, state.surface_config.height, state.sample_count
        );
        drop(state);
        info!("Display surface released");
    }

    fn is_acquired(&self) -> bool {
        self.state.is_some()
    }
}

impl Drop for WgpuSurface {
    fn drop(&mut self) {
        self.release();
    }
}

/// Frame scheduling through winit redraw requests
#[derive(Clone)]
pub struct WindowScheduler {
    window: Arc<Window>,
}

impl WindowScheduler {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl FrameScheduler for WindowScheduler {
    fn request_frame(&self) {
        self.window.request_redraw();
    }
}
