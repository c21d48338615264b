//! Rendering system and GPU interfaces

pub mod context;
pub mod frame;
pub mod target;
pub mod quad;
pub mod pipeline;
pub mod renderer;

pub use frame::{Extent, FramePlan, PassDesc, PassKind, PipelineConfig, TargetId};
pub use renderer::VoxelRenderer;
pub use target::{RenderTarget, TargetAllocator, TargetCache, TargetSlot};
