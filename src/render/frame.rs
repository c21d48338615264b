//! Per-frame pass plan
//!
//! The plan is computed from the pipeline switches and the window size
//! before any GPU work happens. It names every pass, the targets it reads
//! and writes, and the viewport it draws at, so pass ordering and target
//! routing can be checked without a device.

use thiserror::Error;

/// Which optional stages run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    pub bloom: bool,
    pub half_resolution: bool,
}

impl PipelineConfig {
    pub fn new(bloom: bool, half_resolution: bool) -> Self {
        Self { bloom, half_resolution }
    }

    /// Whether the raymarch draws into an offscreen target
    pub fn needs_scene_target(&self) -> bool {
        self.bloom || self.half_resolution
    }
}

/// Size of a target in pixels, never zero
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Half size, rounded down, at least one pixel
    pub fn half(self) -> Self {
        Self::new(self.width / 2, self.height / 2)
    }

    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Size of one texel in UV units
    pub fn texel_size(self) -> [f32; 2] {
        [1.0 / self.width as f32, 1.0 / self.height as f32]
    }
}

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Number of bloom ping-pong targets
pub const BLOOM_TARGETS: usize = 2;

/// A render target a pass can read or write
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetId {
    /// The swapchain image handed to the renderer
    Screen,
    /// HDR raymarch output
    Scene,
    /// Bloom ping-pong target, index `0..BLOOM_TARGETS`
    Bloom(usize),
}

/// Kind of draw
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    Raymarch,
    BrightPass,
    BlurHorizontal,
    BlurVertical,
    Composite,
    /// Upscale the scene target to the screen without bloom
    Blit,
}

impl PassKind {
    /// Value of the post shader's `mode` uniform. `None` for the raymarch,
    /// which has its own shader.
    pub fn post_mode(self) -> Option<u32> {
        match self {
            PassKind::Raymarch => None,
            PassKind::BrightPass => Some(0),
            PassKind::BlurHorizontal => Some(1),
            PassKind::BlurVertical => Some(2),
            PassKind::Composite => Some(3),
            PassKind::Blit => Some(4),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PassKind::Raymarch => "raymarch_pass",
            PassKind::BrightPass => "bright_pass",
            PassKind::BlurHorizontal => "blur_h_pass",
            PassKind::BlurVertical => "blur_v_pass",
            PassKind::Composite => "composite_pass",
            PassKind::Blit => "blit_pass",
        }
    }
}

/// One full-screen draw
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassDesc {
    pub kind: PassKind,
    /// Textures bound as shader inputs, in binding order
    pub inputs: Vec<TargetId>,
    pub output: TargetId,
    /// Viewport, equal to the output target's size
    pub viewport: Extent,
}

/// Problems [`FramePlan::validate`] can find
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("pass {index} ({kind:?}) reads and writes {target:?}")]
    ReadWriteAlias { index: usize, kind: PassKind, target: TargetId },

    #[error("pass {index} ({kind:?}) reads {target:?} before any pass wrote it this frame")]
    UnwrittenInput { index: usize, kind: PassKind, target: TargetId },

    #[error("pass {index} ({kind:?}) reads the screen")]
    ScreenInput { index: usize, kind: PassKind },

    #[error("pass {index} ({kind:?}) draws at {viewport} into a {target} target")]
    ViewportMismatch { index: usize, kind: PassKind, viewport: Extent, target: Extent },

    #[error("pass {index} ({kind:?}) writes {target:?}, which this frame does not allocate")]
    MissingTarget { index: usize, kind: PassKind, target: TargetId },

    #[error("frame does not end with a draw to the screen")]
    NoScreenOutput,
}

/// The ordered passes of one frame plus the target sizes they need
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePlan {
    pub config: PipelineConfig,
    pub screen: Extent,
    /// Raymarch target size, `None` when raymarching straight to the screen
    pub scene: Option<Extent>,
    /// Size of both bloom targets, `None` without bloom
    pub bloom: Option<Extent>,
    pub passes: Vec<PassDesc>,
}

impl FramePlan {
    /// Plan a frame for a `width` x `height` window
    pub fn build(config: PipelineConfig, width: u32, height: u32) -> Self {
        let screen = Extent::new(width, height);

        let scene = config.needs_scene_target().then(|| {
            if config.half_resolution { screen.half() } else { screen }
        });
        let bloom = scene.filter(|_| config.bloom).map(Extent::half);

        let mut passes = Vec::with_capacity(5);
        match (scene, bloom) {
            (Some(scene), Some(bloom)) => {
                passes.push(PassDesc {
                    kind: PassKind::Raymarch,
                    inputs: vec![],
                    output: TargetId::Scene,
                    viewport: scene,
                });
                passes.push(PassDesc {
                    kind: PassKind::BrightPass,
                    inputs: vec![TargetId::Scene],
                    output: TargetId::Bloom(0),
                    viewport: bloom,
                });
                passes.push(PassDesc {
                    kind: PassKind::BlurHorizontal,
                    inputs: vec![TargetId::Bloom(0)],
                    output: TargetId::Bloom(1),
                    viewport: bloom,
                });
                passes.push(PassDesc {
                    kind: PassKind::BlurVertical,
                    inputs: vec![TargetId::Bloom(1)],
                    output: TargetId::Bloom(0),
                    viewport: bloom,
                });
                passes.push(PassDesc {
                    kind: PassKind::Composite,
                    inputs: vec![TargetId::Scene, TargetId::Bloom(0)],
                    output: TargetId::Screen,
                    viewport: screen,
                });
            }
            (Some(scene), None) => {
                passes.push(PassDesc {
                    kind: PassKind::Raymarch,
                    inputs: vec![],
                    output: TargetId::Scene,
                    viewport: scene,
                });
                passes.push(PassDesc {
                    kind: PassKind::Blit,
                    inputs: vec![TargetId::Scene],
                    output: TargetId::Screen,
                    viewport: screen,
                });
            }
            _ => {
                passes.push(PassDesc {
                    kind: PassKind::Raymarch,
                    inputs: vec![],
                    output: TargetId::Screen,
                    viewport: screen,
                });
            }
        }

        Self {
            config,
            screen,
            scene,
            bloom,
            passes,
        }
    }

    /// Size of a target this frame, `None` if the frame doesn't use it
    pub fn extent_of(&self, target: TargetId) -> Option<Extent> {
        match target {
            TargetId::Screen => Some(self.screen),
            TargetId::Scene => self.scene,
            TargetId::Bloom(i) if i < BLOOM_TARGETS => self.bloom,
            TargetId::Bloom(_) => None,
        }
    }

    /// Index of the pass that last wrote `target` before pass `index`
    pub fn writer_before(&self, index: usize, target: TargetId) -> Option<usize> {
        self.passes[..index.min(self.passes.len())]
            .iter()
            .rposition(|p| p.output == target)
    }

    /// Check the routing rules every frame must obey: inputs were written
    /// earlier in the same frame, no pass reads its own output, viewports
    /// match their targets and the last pass draws to the screen.
    pub fn validate(&self) -> Result<(), PlanError> {
        for (index, pass) in self.passes.iter().enumerate() {
            let kind = pass.kind;

            let Some(target_extent) = self.extent_of(pass.output) else {
                return Err(PlanError::MissingTarget { index, kind, target: pass.output });
            };
            if target_extent != pass.viewport {
                return Err(PlanError::ViewportMismatch {
                    index,
                    kind,
                    viewport: pass.viewport,
                    target: target_extent,
                });
            }

            for &input in &pass.inputs {
                if input == TargetId::Screen {
                    return Err(PlanError::ScreenInput { index, kind });
                }
                if input == pass.output {
                    return Err(PlanError::ReadWriteAlias { index, kind, target: input });
                }
                if self.writer_before(index, input).is_none() {
                    return Err(PlanError::UnwrittenInput { index, kind, target: input });
                }
            }
        }

        match self.passes.last() {
            Some(last) if last.output == TargetId::Screen => Ok(()),
            _ => Err(PlanError::NoScreenOutput),
        }
    }
}
