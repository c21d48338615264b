//! Frame orchestration: raymarch, bloom and present

use crate::core::camera::Camera;
use crate::scene::RenderSettings;
use crate::voxel::VoxelTexture;

use super::frame::{FramePlan, PassKind, PipelineConfig, TargetId};
use super::pipeline::{PostParams, PostPipeline, RaymarchPipeline, RaymarchUniforms};
use super::quad::FullscreenQuad;
use super::target::{GpuTargetAllocator, RenderTarget, TargetCache};

/// Draws a voxel grid through the configured pass chain.
///
/// Each call plans the frame, resizes offscreen targets if the window
/// changed, then records every pass into the caller's encoder. Bind groups
/// are built per frame from the targets the plan routes, so a pass always
/// samples what the pass before it wrote this frame.
pub struct VoxelRenderer {
    settings: RenderSettings,
    raymarch: RaymarchPipeline,
    post: PostPipeline,
    quad: FullscreenQuad,
    targets: TargetCache<RenderTarget>,
}

impl VoxelRenderer {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, settings: RenderSettings) -> Self {
        log::info!(
            "Renderer: bloom {}, half resolution {}",
            settings.bloom,
            settings.half_resolution
        );
        Self {
            settings,
            raymarch: RaymarchPipeline::new(device, surface_format),
            post: PostPipeline::new(device, surface_format),
            quad: FullscreenQuad::new(device),
            targets: TargetCache::new(),
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Replace the settings. Target sizes follow on the next frame.
    pub fn set_settings(&mut self, settings: RenderSettings) {
        self.settings = settings;
    }

    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::new(self.settings.bloom, self.settings.half_resolution)
    }

    pub fn targets(&self) -> &TargetCache<RenderTarget> {
        &self.targets
    }

    /// Record one frame drawing `voxels` seen from `camera` into
    /// `output_view`, a `width` x `height` surface image.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
        camera: Camera,
        width: u32,
        height: u32,
        voxels: &VoxelTexture,
    ) {
        let plan = FramePlan::build(self.config(), width, height);
        debug_assert_eq!(plan.validate(), Ok(()));

        self.targets.prepare(&mut GpuTargetAllocator { device }, &plan);

        for pass in &plan.passes {
            let Some(target) = self.view_of(pass.output, output_view) else {
                log::error!("{} has no {:?} target", pass.kind.label(), pass.output);
                return;
            };
            let to_screen = pass.output == TargetId::Screen;

            if pass.kind == PassKind::Raymarch {
                let uniforms = RaymarchUniforms::new(
                    camera.view_projection_inverse(plan.screen.aspect()),
                    camera.position,
                    voxels.size(),
                    self.settings.sun_dir(),
                    self.settings.exposure,
                    pass.viewport,
                    to_screen,
                );
                self.raymarch.update_uniforms(queue, &uniforms);
                let bind_group = self.raymarch.create_bind_group(device, voxels);
                self.raymarch.render(encoder, target, to_screen, pass.viewport, &bind_group, &self.quad);
                continue;
            }

            let Some(mode) = pass.kind.post_mode() else { continue };
            let inputs: Option<Vec<_>> = pass
                .inputs
                .iter()
                .map(|&id| self.targets.get(id).map(|t| (t.view(), t.extent())))
                .collect();
            let Some(&[(primary, primary_extent), ..]) = inputs.as_deref() else {
                log::error!("{} is missing an input target", pass.kind.label());
                return;
            };
            let secondary = inputs.as_deref().and_then(|i| i.get(1)).map(|(view, _)| *view);

            let params = PostParams::new(
                mode,
                self.settings.bloom_threshold,
                self.settings.bloom_intensity,
                self.settings.exposure,
                primary_extent,
            );
            self.post.update_params(queue, pass.kind, &params);

            let Some(bind_group) = self.post.create_bind_group(device, pass.kind, primary, secondary) else {
                continue;
            };
            self.post.render(encoder, pass.kind, target, to_screen, pass.viewport, &bind_group, &self.quad);
        }
    }

    fn view_of<'a>(&'a self, id: TargetId, screen: &'a wgpu::TextureView) -> Option<&'a wgpu::TextureView> {
        match id {
            TargetId::Screen => Some(screen),
            _ => self.targets.get(id).map(RenderTarget::view),
        }
    }
}
