//! Frame plan and render-target cache, exercised without a GPU

use std::cell::Cell;
use std::rc::Rc;

use voxglow::render::frame::{Extent, FramePlan, PassKind, PipelineConfig, TargetId};
use voxglow::render::target::{TargetAllocator, TargetCache, TargetDesc, TargetSlot, HDR_FORMAT};

/// Allocation handle that tracks how many handles are alive
struct Handle {
    id: usize,
    extent: Extent,
    live: Rc<Cell<usize>>,
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

#[derive(Default)]
struct CountingAllocator {
    live: Rc<Cell<usize>>,
    total: usize,
}

impl TargetAllocator for CountingAllocator {
    type Target = Handle;

    fn allocate(&mut self, desc: &TargetDesc) -> Handle {
        self.total += 1;
        self.live.set(self.live.get() + 1);
        Handle {
            id: self.total,
            extent: desc.extent,
            live: self.live.clone(),
        }
    }
}

#[test]
fn test_resize_reallocates_and_releases() {
    let mut alloc = CountingAllocator::default();
    let mut slot = TargetSlot::new("scene_target", HDR_FORMAT);

    slot.ensure(&mut alloc, Extent::new(400, 300));
    assert_eq!(alloc.live.get(), 1);

    slot.ensure(&mut alloc, Extent::new(800, 600));
    assert_eq!(alloc.total, 2);
    assert_eq!(alloc.live.get(), 1, "first allocation leaked");
    let handle = slot.get().unwrap();
    assert_eq!(handle.id, 2);
    assert_eq!(handle.extent, Extent::new(800, 600));

    slot.release();
    assert_eq!(alloc.live.get(), 0);
}

#[test]
fn test_window_resize_through_cache() {
    let mut alloc = CountingAllocator::default();
    let mut cache = TargetCache::new();
    let config = PipelineConfig::new(true, true);

    // Window 800x600 gives a 400x300 scene target
    cache.prepare(&mut alloc, &FramePlan::build(config, 800, 600));
    assert_eq!(cache.extent(TargetId::Scene), Some(Extent::new(400, 300)));
    assert_eq!(alloc.live.get(), 3);

    // Same size: nothing happens
    assert_eq!(cache.prepare(&mut alloc, &FramePlan::build(config, 800, 600)), 0);
    assert_eq!(alloc.total, 3);

    // Window 1600x1200 gives an 800x600 scene target
    assert_eq!(cache.prepare(&mut alloc, &FramePlan::build(config, 1600, 1200)), 3);
    assert_eq!(cache.get(TargetId::Scene).unwrap().extent, Extent::new(800, 600));
    assert_eq!(cache.get(TargetId::Bloom(0)).unwrap().extent, Extent::new(400, 300));
    assert_eq!(alloc.total, 6);
    assert_eq!(alloc.live.get(), 3);

    drop(cache);
    assert_eq!(alloc.live.get(), 0);
}

#[test]
fn test_composite_reads_this_frames_targets() {
    let plan = FramePlan::build(PipelineConfig::new(true, true), 1280, 720);
    plan.validate().unwrap();

    let composite = plan
        .passes
        .iter()
        .position(|p| p.kind == PassKind::Composite)
        .unwrap();
    let inputs = &plan.passes[composite].inputs;
    assert_eq!(inputs, &vec![TargetId::Scene, TargetId::Bloom(0)]);

    // Scene comes from the raymarch, bloom from the vertical blur, both
    // earlier in the same frame
    let scene_writer = plan.writer_before(composite, TargetId::Scene).unwrap();
    let bloom_writer = plan.writer_before(composite, TargetId::Bloom(0)).unwrap();
    assert_eq!(plan.passes[scene_writer].kind, PassKind::Raymarch);
    assert_eq!(plan.passes[bloom_writer].kind, PassKind::BlurVertical);
    assert_eq!(bloom_writer, composite - 1);

    // The bright-pass also wrote Bloom(0), but the blur overwrote it
    let bright = plan.passes.iter().position(|p| p.kind == PassKind::BrightPass).unwrap();
    assert!(bright < bloom_writer);
}

#[test]
fn test_bound_handles_follow_resize() {
    let mut alloc = CountingAllocator::default();
    let mut cache = TargetCache::new();
    let config = PipelineConfig::new(true, true);

    cache.prepare(&mut alloc, &FramePlan::build(config, 800, 600));
    let first_frame_scene = cache.get(TargetId::Scene).unwrap().id;

    cache.prepare(&mut alloc, &FramePlan::build(config, 1024, 768));
    let plan = FramePlan::build(config, 1024, 768);
    let composite = plan.passes.last().unwrap();

    // Resolving the composite inputs after the resize yields the new handles
    for &input in &composite.inputs {
        let handle = cache.get(input).unwrap();
        assert_ne!(handle.id, first_frame_scene);
        assert_eq!(Some(handle.extent), plan.extent_of(input));
    }
}

#[test]
fn test_all_three_configurations() {
    let mut alloc = CountingAllocator::default();
    let mut cache = TargetCache::new();

    let cases = [
        (PipelineConfig::new(true, true), 5, 3),
        (PipelineConfig::new(false, true), 2, 1),
        (PipelineConfig::new(false, false), 1, 0),
    ];
    for (config, passes, targets) in cases {
        let plan = FramePlan::build(config, 640, 480);
        plan.validate().unwrap();
        assert_eq!(plan.passes.len(), passes, "{config:?}");
        assert_eq!(plan.passes.last().unwrap().output, TargetId::Screen);

        cache.prepare(&mut alloc, &plan);
        assert_eq!(cache.live(), targets, "{config:?}");
        assert_eq!(alloc.live.get(), targets);
    }
}

#[test]
fn test_tiny_window_never_allocates_zero_size() {
    let mut alloc = CountingAllocator::default();
    let mut cache = TargetCache::new();
    cache.prepare(&mut alloc, &FramePlan::build(PipelineConfig::new(true, true), 1, 1));
    assert_eq!(cache.extent(TargetId::Bloom(1)), Some(Extent::new(1, 1)));
}
