//! Voxel raymarch pass

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::render::frame::Extent;
use crate::render::quad::FullscreenQuad;
use crate::render::target::HDR_FORMAT;
use crate::voxel::VoxelTexture;

/// Raymarch uniforms, matching `RaymarchUniforms` in raymarch.wgsl
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct RaymarchUniforms {
    pub inv_view_proj: [[f32; 4]; 4],
    /// xyz = camera position, w = grid side
    pub camera_pos: [f32; 4],
    /// xyz = direction towards the sun, w = exposure
    pub sun_dir: [f32; 4],
    pub resolution: [f32; 2],
    /// Non-zero when drawing straight to the screen, so the shader tone maps
    pub tonemap: u32,
    pub _pad: u32,
}

impl RaymarchUniforms {
    pub fn new(
        inv_view_proj: Mat4,
        camera_pos: Vec3,
        world_size: u32,
        sun_dir: Vec3,
        exposure: f32,
        resolution: Extent,
        tonemap: bool,
    ) -> Self {
        Self {
            inv_view_proj: inv_view_proj.to_cols_array_2d(),
            camera_pos: camera_pos.extend(world_size as f32).to_array(),
            sun_dir: sun_dir.extend(exposure).to_array(),
            resolution: [resolution.width as f32, resolution.height as f32],
            tonemap: tonemap as u32,
            _pad: 0,
        }
    }
}

/// Full-screen raymarch against the voxel 3D texture. Holds one pipeline per
/// output format: HDR for the scene target, surface format for drawing
/// straight to the screen.
pub struct RaymarchPipeline {
    hdr_pipeline: wgpu::RenderPipeline,
    screen_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
}

impl RaymarchPipeline {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("raymarch_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/raymarch.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("raymarch_uniforms"),
            size: std::mem::size_of::<RaymarchUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Uniforms, voxel texture, nearest sampler
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("raymarch_bind_group_layout"),
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
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D3,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("raymarch_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let create = |label: &str, format: wgpu::TextureFormat| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[FullscreenQuad::layout()],
                    compilation_options: Default::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        };

        Self {
            hdr_pipeline: create("raymarch_hdr_pipeline", HDR_FORMAT),
            screen_pipeline: create("raymarch_screen_pipeline", surface_format),
            bind_group_layout,
            uniform_buffer,
        }
    }

    pub fn update_uniforms(&self, queue: &wgpu::Queue, uniforms: &RaymarchUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Bind group for the voxel texture handed to this frame
    pub fn create_bind_group(&self, device: &wgpu::Device, voxels: &VoxelTexture) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("raymarch_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(voxels.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(voxels.sampler()),
                },
            ],
        })
    }

    /// Raymarch into `target`. `to_screen` selects the surface-format
    /// pipeline.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        to_screen: bool,
        viewport: Extent,
        bind_group: &wgpu::BindGroup,
        quad: &FullscreenQuad,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("raymarch_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(if to_screen { &self.screen_pipeline } else { &self.hdr_pipeline });
        pass.set_viewport(0.0, 0.0, viewport.width as f32, viewport.height as f32, 0.0, 1.0);
        pass.set_bind_group(0, bind_group, &[]);
        quad.draw(&mut pass);
    }
}
