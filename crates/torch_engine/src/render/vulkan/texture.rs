//! Texture pool
//!
//! Device-local textures uploaded through a staging buffer, each with its own
//! set-1 descriptor set over a shared anisotropic sampler. Ids are stable and
//! append-only; id 0 is reserved for the default white texture so untextured
//! materials always resolve to a valid binding.

use ash::{vk, Device};

use crate::assets::ImageData;
use crate::render::vulkan::{
    Buffer, CommandPool, DescriptorPool, DescriptorSetWriter, Image, VulkanContext, VulkanError,
    VulkanResult,
};

/// Texture id every untextured material maps to
pub const DEFAULT_TEXTURE_ID: usize = 0;

/// Maximum number of textures the sampler descriptor pool can hold
pub const MAX_TEXTURES: u32 = 64;

/// A GPU texture and the descriptor set that binds it
pub struct Texture {
    image: Image,
    descriptor_set: vk::DescriptorSet,
}

impl Texture {
    /// Image view handle
    pub fn view(&self) -> vk::ImageView {
        self.image.view()
    }

    /// Descriptor set binding this texture
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.descriptor_set
    }
}

/// Pool of loaded textures indexed by stable integer id
pub struct TexturePool {
    device: Device,
    textures: Vec<Texture>,
    descriptor_pool: DescriptorPool,
    sampler: vk::Sampler,
    sampler_layout: vk::DescriptorSetLayout,
}

impl TexturePool {
    /// Create the pool, its shared sampler, and the default white texture at
    /// id 0
    pub fn new(
        context: &VulkanContext,
        command_pool: &CommandPool,
        sampler_layout: vk::DescriptorSetLayout,
    ) -> VulkanResult<Self> {
        let device = context.raw_device();

        let sampler = create_sampler(&device)?;
        let descriptor_pool = DescriptorPool::for_samplers(device.clone(), MAX_TEXTURES)?;

        let mut pool = Self {
            device,
            textures: Vec::new(),
            descriptor_pool,
            sampler,
            sampler_layout,
        };

        // Id 0: 1x1 white fallback for materials without a texture
        let default_id = pool.create_texture(
            context,
            command_pool,
            &ImageData::solid_color(1, 1, [255, 255, 255, 255]),
        )?;
        debug_assert_eq!(default_id, DEFAULT_TEXTURE_ID);

        Ok(pool)
    }

    /// Upload `image_data` and return the new texture's id
    ///
    /// The pixel data is staged through a host-visible buffer and copied into
    /// a device-local image via UNDEFINED → TRANSFER_DST → SHADER_READ_ONLY
    /// transitions.
    pub fn create_texture(
        &mut self,
        context: &VulkanContext,
        command_pool: &CommandPool,
        image_data: &ImageData,
    ) -> VulkanResult<usize> {
        let device = context.raw_device();
        let physical_device = context.physical_device().device;
        let queue = context.graphics_queue();

        let extent = vk::Extent2D {
            width: image_data.width,
            height: image_data.height,
        };

        let staging = Buffer::new(
            device.clone(),
            context.instance(),
            physical_device,
            image_data.byte_size(),
            vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        staging.write_data(&image_data.data)?;

        let image = Image::new(
            device.clone(),
            context.instance(),
            physical_device,
            extent,
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageTiling::OPTIMAL,
            vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::ImageAspectFlags::COLOR,
        )?;

        command_pool.transition_image_layout(
            queue,
            image.handle(),
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        )?;
        command_pool.copy_buffer_to_image(queue, staging.handle(), image.handle(), extent)?;
        command_pool.transition_image_layout(
            queue,
            image.handle(),
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )?;

        let descriptor_set = self.create_descriptor(image.view())?;

        self.textures.push(Texture {
            image,
            descriptor_set,
        });

        let id = self.textures.len() - 1;
        log::debug!(
            "created texture {} ({}x{})",
            id,
            image_data.width,
            image_data.height
        );
        Ok(id)
    }

    /// Allocate and write the set-1 descriptor for a texture view
    fn create_descriptor(&self, view: vk::ImageView) -> VulkanResult<vk::DescriptorSet> {
        if self.textures.len() as u32 >= MAX_TEXTURES {
            return Err(VulkanError::InitializationFailed(format!(
                "texture limit of {} reached",
                MAX_TEXTURES
            )));
        }

        let sets = self.descriptor_pool.allocate(&[self.sampler_layout])?;
        let set = sets[0];

        DescriptorSetWriter::new()
            .write_combined_image_sampler(set, 0, view, self.sampler)
            .update(&self.device);

        Ok(set)
    }

    /// Descriptor set for `texture_id`, falling back to the default texture
    /// for unknown ids
    pub fn descriptor_set(&self, texture_id: usize) -> vk::DescriptorSet {
        self.textures
            .get(texture_id)
            .unwrap_or(&self.textures[DEFAULT_TEXTURE_ID])
            .descriptor_set()
    }

    /// Number of textures in the pool
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Whether the pool is empty (never true after construction)
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl Drop for TexturePool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
        }
        // textures and descriptor pool drop afterwards via their own Drops
    }
}

/// Shared sampler: linear filtering, repeat addressing, 16x anisotropy
fn create_sampler(device: &Device) -> VulkanResult<vk::Sampler> {
    let create_info = vk::SamplerCreateInfo::builder()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::REPEAT)
        .address_mode_v(vk::SamplerAddressMode::REPEAT)
        .address_mode_w(vk::SamplerAddressMode::REPEAT)
        .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
        .unnormalized_coordinates(false)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .mip_lod_bias(0.0)
        .min_lod(0.0)
        .max_lod(0.0)
        .anisotropy_enable(true)
        .max_anisotropy(16.0);

    unsafe {
        device
            .create_sampler(&create_info, None)
            .map_err(VulkanError::Api)
    }
}
