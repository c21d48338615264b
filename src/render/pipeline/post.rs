//! Bloom post-process: bright-pass, separable blur, composite and blit
//!
//! All five post passes share one shader and select their behaviour with a
//! `mode` uniform. Every pass owns its uniform buffer so writes for one
//! pass never clobber another pass recorded in the same encoder.

use bytemuck::{Pod, Zeroable};

use crate::render::frame::{Extent, PassKind};
use crate::render::quad::FullscreenQuad;
use crate::render::target::{RenderTarget, TargetDesc, HDR_FORMAT};

const POST_PASSES: usize = 5;

/// Post uniforms, matching `PostParams` in post.wgsl
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PostParams {
    pub mode: u32,
    pub threshold: f32,
    pub intensity: f32,
    pub exposure: f32,
    /// Texel size of the primary input
    pub texel_size: [f32; 2],
    pub _pad: [f32; 2],
}

impl PostParams {
    pub fn new(mode: u32, threshold: f32, intensity: f32, exposure: f32, input: Extent) -> Self {
        Self {
            mode,
            threshold,
            intensity,
            exposure,
            texel_size: input.texel_size(),
            _pad: [0.0; 2],
        }
    }
}

/// Fullscreen post-process pipeline
pub struct PostPipeline {
    /// Writes the HDR bloom targets
    hdr_pipeline: wgpu::RenderPipeline,
    /// Writes the surface
    screen_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    params_buffers: [wgpu::Buffer; POST_PASSES],
    /// Bound to the second input slot by passes with a single input
    placeholder: RenderTarget,
}

impl PostPipeline {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/post.wgsl").into()),
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        // Params, primary input, secondary input, sampler
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post_bind_group_layout"),
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
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("post_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("post_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let params_buffers = std::array::from_fn(|_| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("post_params"),
                size: std::mem::size_of::<PostParams>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
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

        let placeholder = RenderTarget::new(
            device,
            &TargetDesc {
                label: "post_placeholder",
                extent: Extent::new(1, 1),
                format: HDR_FORMAT,
            },
        );

        Self {
            hdr_pipeline: create("post_hdr_pipeline", HDR_FORMAT),
            screen_pipeline: create("post_screen_pipeline", surface_format),
            bind_group_layout,
            sampler,
            params_buffers,
            placeholder,
        }
    }

    fn params_buffer(&self, kind: PassKind) -> Option<&wgpu::Buffer> {
        kind.post_mode().and_then(|mode| self.params_buffers.get(mode as usize))
    }

    /// Write the params of one pass. Ignored for the raymarch.
    pub fn update_params(&self, queue: &wgpu::Queue, kind: PassKind, params: &PostParams) {
        if let Some(buffer) = self.params_buffer(kind) {
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(params));
        }
    }

    /// Bind group for one pass. Passes with a single input get the
    /// placeholder in the second slot. `None` for the raymarch.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        kind: PassKind,
        primary: &wgpu::TextureView,
        secondary: Option<&wgpu::TextureView>,
    ) -> Option<wgpu::BindGroup> {
        let buffer = self.params_buffer(kind)?;
        Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(kind.label()),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(primary),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(
                        secondary.unwrap_or_else(|| self.placeholder.view()),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }))
    }

    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        kind: PassKind,
        target: &wgpu::TextureView,
        to_screen: bool,
        viewport: Extent,
        bind_group: &wgpu::BindGroup,
        quad: &FullscreenQuad,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(kind.label()),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_layout() {
        assert_eq!(std::mem::size_of::<PostParams>(), 32);
    }

    #[test]
    fn test_every_post_pass_has_a_buffer_slot() {
        for kind in [
            PassKind::BrightPass,
            PassKind::BlurHorizontal,
            PassKind::BlurVertical,
            PassKind::Composite,
            PassKind::Blit,
        ] {
            let mode = kind.post_mode().unwrap();
            assert!((mode as usize) < POST_PASSES, "{kind:?}");
        }
    }

    #[test]
    fn test_texel_size_from_input() {
        let params = PostParams::new(1, 0.8, 0.6, 1.0, Extent::new(200, 100));
        assert_eq!(params.texel_size, [0.005, 0.01]);
    }
}
