//! Rendering system with wgpu pipelines and shader management.
//!
//! Scene passes draw into a persistent trail texture: a translucent black
//! fade first (motion trails instead of a hard clear), then instanced
//! circles and the orb gradient. A second pass blits the trail to the
//! surface and draws the transport HUD on top, outside the trail feedback.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::galaxy::CircleInstance;
use crate::params::RenderConfig;

/// Trail accumulation target format (independent of the surface format)
const TRAIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Viewport size shared by the circle instances pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ViewUniforms {
    pub viewport: [f32; 2],
    pub _padding: [f32; 2],
}

/// Fullscreen fade color (black at the configured trail alpha)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FadeUniforms {
    pub color: [f32; 4],
}

/// Orb gradient parameters; alphas arrive pre-modulated by the pulse level
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct OrbUniforms {
    pub viewport: [f32; 2],
    pub center: [f32; 2],
    pub radius: f32,
    pub core_alpha: f32,
    pub mid_alpha: f32,
    pub _padding: f32,
}

/// Progress bar layout and fill fraction
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct HudUniforms {
    pub viewport: [f32; 2],
    pub bar_pos: [f32; 2],
    pub bar_size: [f32; 2],
    pub progress: f32,
    pub _padding: f32,
}

/// Rendering system managing wgpu device, pipelines, and buffers
pub struct RenderSystem {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,

    trail_view: wgpu::TextureView,

    fade_pipeline: wgpu::RenderPipeline,
    fade_bind_group: wgpu::BindGroup,

    circle_pipeline: wgpu::RenderPipeline,
    view_uniform_buffer: wgpu::Buffer,
    view_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    instance_count: u32,
    overlay_start: u32,

    orb_pipeline: wgpu::RenderPipeline,
    orb_uniform_buffer: wgpu::Buffer,
    orb_bind_group: wgpu::BindGroup,

    blit_pipeline: wgpu::RenderPipeline,
    blit_bind_group_layout: wgpu::BindGroupLayout,
    blit_sampler: wgpu::Sampler,
    blit_bind_group: wgpu::BindGroup,

    hud_pipeline: wgpu::RenderPipeline,
    hud_uniform_buffer: wgpu::Buffer,
    hud_bind_group: wgpu::BindGroup,
}

impl RenderSystem {
    /// Create new rendering system
    pub async fn new(
        window: std::sync::Arc<winit::window::Window>,
        render_config: &RenderConfig,
        instance_capacity: usize,
    ) -> Result<Self, String> {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance
            .create_surface(window)
            .map_err(|e| format!("Failed to create surface: {}", e))?;

        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or("Failed to find suitable GPU adapter")?;

        // Request device
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| format!("Failed to request device: {}", e))?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let trail_view = create_trail_texture(&device, surface_config.width, surface_config.height);

        // Load shaders
        let fade_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fade Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("fade.wgsl").into()),
        });
        let circles_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Circles Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("circles.wgsl").into()),
        });
        let orb_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Orb Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("orb.wgsl").into()),
        });
        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("blit.wgsl").into()),
        });
        let hud_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Hud Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("hud.wgsl").into()),
        });

        // Uniform buffers and bind groups
        let viewport = [surface_config.width as f32, surface_config.height as f32];

        // Fade color is written once; trails keep the same alpha for the
        // lifetime of the app
        let (_fade_uniform_buffer, fade_layout, fade_bind_group) = create_uniform(
            &device,
            "Fade",
            &[FadeUniforms {
                color: [0.0, 0.0, 0.0, render_config.fade_alpha],
            }],
        );

        let (view_uniform_buffer, view_layout, view_bind_group) = create_uniform(
            &device,
            "View",
            &[ViewUniforms {
                viewport,
                _padding: [0.0; 2],
            }],
        );

        let (orb_uniform_buffer, orb_layout, orb_bind_group) = create_uniform(
            &device,
            "Orb",
            &[OrbUniforms {
                viewport,
                center: [viewport[0] / 2.0, viewport[1] / 2.0],
                radius: 1.0,
                core_alpha: 0.0,
                mid_alpha: 0.0,
                _padding: 0.0,
            }],
        );

        let (hud_uniform_buffer, hud_layout, hud_bind_group) = create_uniform(
            &device,
            "Hud",
            &[HudUniforms {
                viewport,
                bar_pos: [0.0; 2],
                bar_size: [0.0; 2],
                progress: 0.0,
                _padding: 0.0,
            }],
        );

        // Instance buffer (grown on demand)
        let instance_capacity = instance_capacity.max(1);
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Circle Instance Buffer"),
            size: (instance_capacity * std::mem::size_of::<CircleInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Scene pipelines (render into the trail texture)
        let fade_pipeline = create_pipeline(
            &device,
            "Fade Pipeline",
            &fade_shader,
            &[&fade_layout],
            &[],
            TRAIL_FORMAT,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );

        let circle_pipeline = create_pipeline(
            &device,
            "Circle Pipeline",
            &circles_shader,
            &[&view_layout],
            &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<CircleInstance>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[
                    wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x2,
                    },
                    wgpu::VertexAttribute {
                        offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                        shader_location: 1,
                        format: wgpu::VertexFormat::Float32,
                    },
                    wgpu::VertexAttribute {
                        offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                        shader_location: 2,
                        format: wgpu::VertexFormat::Float32,
                    },
                    wgpu::VertexAttribute {
                        offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                        shader_location: 3,
                        format: wgpu::VertexFormat::Float32x4,
                    },
                ],
            }],
            TRAIL_FORMAT,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );

        let orb_pipeline = create_pipeline(
            &device,
            "Orb Pipeline",
            &orb_shader,
            &[&orb_layout],
            &[],
            TRAIL_FORMAT,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );

        // Present pipelines (render to the surface)
        let blit_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Blit Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let blit_bind_group = create_blit_bind_group(
            &device,
            &blit_bind_group_layout,
            &trail_view,
            &blit_sampler,
        );

        let blit_pipeline = create_pipeline(
            &device,
            "Blit Pipeline",
            &blit_shader,
            &[&blit_bind_group_layout],
            &[],
            surface_format,
            None,
        );

        let hud_pipeline = create_pipeline(
            &device,
            "Hud Pipeline",
            &hud_shader,
            &[&hud_layout],
            &[],
            surface_format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            trail_view,
            fade_pipeline,
            fade_bind_group,
            circle_pipeline,
            view_uniform_buffer,
            view_bind_group,
            instance_buffer,
            instance_capacity,
            instance_count: 0,
            overlay_start: 0,
            orb_pipeline,
            orb_uniform_buffer,
            orb_bind_group,
            blit_pipeline,
            blit_bind_group_layout,
            blit_sampler,
            blit_bind_group,
            hud_pipeline,
            hud_uniform_buffer,
            hud_bind_group,
        })
    }

    /// Handle a window resize: reconfigure the surface and start a fresh
    /// trail texture at the new dimensions.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);

        self.trail_view = create_trail_texture(&self.device, width, height);
        self.blit_bind_group = create_blit_bind_group(
            &self.device,
            &self.blit_bind_group_layout,
            &self.trail_view,
            &self.blit_sampler,
        );

        self.queue.write_buffer(
            &self.view_uniform_buffer,
            0,
            bytemuck::cast_slice(&[ViewUniforms {
                viewport: [width as f32, height as f32],
                _padding: [0.0; 2],
            }]),
        );
    }

    /// Upload this frame's circle instances. Instances before
    /// `overlay_start` draw below the orb body, the rest above it.
    pub fn update_instances(&mut self, instances: &[CircleInstance], overlay_start: usize) {
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Circle Instance Buffer"),
                size: (self.instance_capacity * std::mem::size_of::<CircleInstance>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
        }

        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
        self.instance_count = instances.len() as u32;
        self.overlay_start = (overlay_start.min(instances.len())) as u32;
    }

    /// Update orb gradient uniforms
    pub fn update_orb(&self, uniforms: &OrbUniforms) {
        self.queue.write_buffer(
            &self.orb_uniform_buffer,
            0,
            bytemuck::cast_slice(&[*uniforms]),
        );
    }

    /// Update progress bar uniforms
    pub fn update_hud(&self, uniforms: &HudUniforms) {
        self.queue.write_buffer(
            &self.hud_uniform_buffer,
            0,
            bytemuck::cast_slice(&[*uniforms]),
        );
    }

    /// Render a frame
    pub fn render(&self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            // Scene pass: fade over last frame's contents, then entities
            let mut scene_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.trail_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            scene_pass.set_pipeline(&self.fade_pipeline);
            scene_pass.set_bind_group(0, &self.fade_bind_group, &[]);
            scene_pass.draw(0..3, 0..1); // Fullscreen triangle

            scene_pass.set_pipeline(&self.circle_pipeline);
            scene_pass.set_bind_group(0, &self.view_bind_group, &[]);
            scene_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
            if self.overlay_start > 0 {
                scene_pass.draw(0..6, 0..self.overlay_start);
            }

            scene_pass.set_pipeline(&self.orb_pipeline);
            scene_pass.set_bind_group(0, &self.orb_bind_group, &[]);
            scene_pass.draw(0..6, 0..1);

            // Instances flagged as overlay (the halo ring) go above the orb
            if self.overlay_start < self.instance_count {
                scene_pass.set_pipeline(&self.circle_pipeline);
                scene_pass.set_bind_group(0, &self.view_bind_group, &[]);
                scene_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
                scene_pass.draw(0..6, self.overlay_start..self.instance_count);
            }
        }

        {
            // Present pass: trail texture to the surface, HUD on top
            let mut present_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Present Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            present_pass.set_pipeline(&self.blit_pipeline);
            present_pass.set_bind_group(0, &self.blit_bind_group, &[]);
            present_pass.draw(0..3, 0..1);

            present_pass.set_pipeline(&self.hud_pipeline);
            present_pass.set_bind_group(0, &self.hud_bind_group, &[]);
            present_pass.draw(0..12, 0..1); // Track quad + fill quad
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Create the persistent trail texture (zero-initialized)
fn create_trail_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Trail Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TRAIL_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Create a uniform buffer plus its single-entry bind group layout and group
fn create_uniform<T: Pod>(
    device: &wgpu::Device,
    label: &str,
    contents: &[T],
) -> (wgpu::Buffer, wgpu::BindGroupLayout, wgpu::BindGroup) {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} Uniform Buffer", label)),
        contents: bytemuck::cast_slice(contents),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{} Bind Group Layout", label)),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{} Bind Group", label)),
        layout: &layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });

    (buffer, layout, bind_group)
}

fn create_blit_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    trail_view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Blit Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(trail_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

/// Create a render pipeline drawing triangles with the standard settings
fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    vertex_buffers: &[wgpu::VertexBufferLayout],
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{} Layout", label)),
        bind_group_layouts,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: vertex_buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
