//! Offscreen render targets and their lazy size cache

use super::frame::{Extent, FramePlan, TargetId, BLOOM_TARGETS};

/// Format of every offscreen target: the raymarch writes HDR colour and the
/// bloom chain keeps it unclamped until composite.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// What to allocate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetDesc {
    pub label: &'static str,
    pub extent: Extent,
    pub format: wgpu::TextureFormat,
}

/// Creates render targets. The renderer uses the wgpu implementation; tests
/// substitute one that only counts.
pub trait TargetAllocator {
    type Target;

    fn allocate(&mut self, desc: &TargetDesc) -> Self::Target;
}

/// A single lazily sized target. The backing allocation is replaced only
/// when the requested extent differs from the current one, and the old one
/// is dropped before the new one is created.
pub struct TargetSlot<T> {
    label: &'static str,
    format: wgpu::TextureFormat,
    current: Option<(Extent, T)>,
}

impl<T> TargetSlot<T> {
    pub fn new(label: &'static str, format: wgpu::TextureFormat) -> Self {
        Self {
            label,
            format,
            current: None,
        }
    }

    /// Make sure the slot holds a target of `extent`. Returns true if it had
    /// to allocate.
    pub fn ensure<A>(&mut self, allocator: &mut A, extent: Extent) -> bool
    where
        A: TargetAllocator<Target = T>,
    {
        if matches!(&self.current, Some((current, _)) if *current == extent) {
            return false;
        }

        // Release before allocating so two generations never coexist
        self.current = None;
        let target = allocator.allocate(&TargetDesc {
            label: self.label,
            extent,
            format: self.format,
        });
        log::info!("{} reallocated to {}", self.label, extent);
        self.current = Some((extent, target));
        true
    }

    /// Drop the backing target, if any
    pub fn release(&mut self) {
        if self.current.take().is_some() {
            log::debug!("{} released", self.label);
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.current.as_ref().map(|(_, target)| target)
    }

    pub fn extent(&self) -> Option<Extent> {
        self.current.as_ref().map(|(extent, _)| *extent)
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

/// The scene target plus the bloom ping-pong pair
pub struct TargetCache<T> {
    scene: TargetSlot<T>,
    bloom: [TargetSlot<T>; BLOOM_TARGETS],
}

impl<T> TargetCache<T> {
    pub fn new() -> Self {
        Self {
            scene: TargetSlot::new("scene_target", HDR_FORMAT),
            bloom: [
                TargetSlot::new("bloom_target_a", HDR_FORMAT),
                TargetSlot::new("bloom_target_b", HDR_FORMAT),
            ],
        }
    }

    /// Bring every slot in line with the plan: size the ones it uses, free
    /// the ones it doesn't. Returns how many targets were (re)allocated.
    pub fn prepare<A>(&mut self, allocator: &mut A, plan: &FramePlan) -> usize
    where
        A: TargetAllocator<Target = T>,
    {
        let mut allocated = 0;

        match plan.scene {
            Some(extent) => allocated += self.scene.ensure(allocator, extent) as usize,
            None => self.scene.release(),
        }
        for slot in &mut self.bloom {
            match plan.bloom {
                Some(extent) => allocated += slot.ensure(allocator, extent) as usize,
                None => slot.release(),
            }
        }

        allocated
    }

    /// Target for an offscreen id. `None` for the screen and for slots the
    /// current configuration doesn't allocate.
    pub fn get(&self, id: TargetId) -> Option<&T> {
        self.slot(id).and_then(TargetSlot::get)
    }

    pub fn extent(&self, id: TargetId) -> Option<Extent> {
        self.slot(id).and_then(TargetSlot::extent)
    }

    /// Number of targets currently allocated
    pub fn live(&self) -> usize {
        std::iter::once(&self.scene)
            .chain(self.bloom.iter())
            .filter(|slot| slot.get().is_some())
            .count()
    }

    fn slot(&self, id: TargetId) -> Option<&TargetSlot<T>> {
        match id {
            TargetId::Screen => None,
            TargetId::Scene => Some(&self.scene),
            TargetId::Bloom(i) => self.bloom.get(i),
        }
    }
}

impl<T> Default for TargetCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// An offscreen colour target
pub struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    extent: Extent,
}

impl RenderTarget {
    pub fn new(device: &wgpu::Device, desc: &TargetDesc) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.extent.width,
                height: desc.extent.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            extent: desc.extent,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}

/// Allocates [`RenderTarget`]s on a device
pub struct GpuTargetAllocator<'a> {
    pub device: &'a wgpu::Device,
}

impl TargetAllocator for GpuTargetAllocator<'_> {
    type Target = RenderTarget;

    fn allocate(&mut self, desc: &TargetDesc) -> RenderTarget {
        RenderTarget::new(self.device, desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::frame::PipelineConfig;

    /// Hands out sequential ids and records every request
    #[derive(Default)]
    struct Recording {
        requests: Vec<TargetDesc>,
    }

    impl TargetAllocator for Recording {
        type Target = usize;

        fn allocate(&mut self, desc: &TargetDesc) -> usize {
            self.requests.push(*desc);
            self.requests.len()
        }
    }

    #[test]
    fn test_slot_reallocates_only_on_change() {
        let mut alloc = Recording::default();
        let mut slot = TargetSlot::new("scene_target", HDR_FORMAT);

        assert!(slot.ensure(&mut alloc, Extent::new(400, 300)));
        assert!(!slot.ensure(&mut alloc, Extent::new(400, 300)));
        assert_eq!(slot.get(), Some(&1));

        assert!(slot.ensure(&mut alloc, Extent::new(800, 600)));
        assert_eq!(slot.get(), Some(&2));
        assert_eq!(slot.extent(), Some(Extent::new(800, 600)));
        assert_eq!(alloc.requests.len(), 2);
        assert_eq!(alloc.requests[1].label, "scene_target");
    }

    #[test]
    fn test_cache_follows_plan() {
        let mut alloc = Recording::default();
        let mut cache = TargetCache::new();

        let bloom = FramePlan::build(PipelineConfig::new(true, true), 800, 600);
        assert_eq!(cache.prepare(&mut alloc, &bloom), 3);
        assert_eq!(cache.live(), 3);
        assert_eq!(cache.extent(TargetId::Scene), Some(Extent::new(400, 300)));
        assert_eq!(cache.extent(TargetId::Bloom(1)), Some(Extent::new(200, 150)));
        assert_eq!(cache.prepare(&mut alloc, &bloom), 0);

        let blit = FramePlan::build(PipelineConfig::new(false, true), 800, 600);
        assert_eq!(cache.prepare(&mut alloc, &blit), 0);
        assert_eq!(cache.live(), 1);
        assert!(cache.get(TargetId::Bloom(0)).is_none());

        let direct = FramePlan::build(PipelineConfig::new(false, false), 800, 600);
        cache.prepare(&mut alloc, &direct);
        assert_eq!(cache.live(), 0);
        assert!(cache.get(TargetId::Screen).is_none());
    }

    #[test]
    fn test_all_targets_hdr() {
        let mut alloc = Recording::default();
        let mut cache = TargetCache::new();
        cache.prepare(&mut alloc, &FramePlan::build(PipelineConfig::new(true, false), 64, 64));
        assert!(alloc.requests.iter().all(|d| d.format == HDR_FORMAT));
    }
}
