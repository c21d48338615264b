//! GPU mirror of the voxel grid

use super::grid::VoxelGrid;

/// Single-channel 3D texture holding one block byte per texel, plus the
/// nearest/clamp sampler the raymarch shader reads it with
pub struct VoxelTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    size: u32,
}

impl VoxelTexture {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Grid side in texels
    pub fn size(&self) -> u32 {
        self.size
    }
}

impl Drop for VoxelTexture {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}

impl<const SIZE: usize> VoxelGrid<SIZE> {
    /// Replace the GPU mirror with a fresh `SIZE³` R8 texture holding the
    /// whole grid. Any previous texture is released first; there is no
    /// partial-region path.
    pub fn upload_to_gpu(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        drop(self.texture.take());

        let size = wgpu::Extent3d {
            width: SIZE as u32,
            height: SIZE as u32,
            depth_or_array_layers: SIZE as u32,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("voxel_grid"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            self.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(SIZE as u32),
                rows_per_image: Some(SIZE as u32),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("voxel_grid_view"),
            dimension: Some(wgpu::TextureViewDimension::D3),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("voxel_grid_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        log::info!(
            "Voxel grid uploaded: {}³ texels ({} KiB)",
            SIZE,
            Self::VOLUME / 1024
        );

        self.texture = Some(VoxelTexture {
            texture,
            view,
            sampler,
            size: SIZE as u32,
        });
    }
}
