//! Per-swap-image uniform resources
//!
//! One [`FrameUniforms`] per swapchain image, holding that image's
//! view-projection buffer, lighting buffer, and the set-0 descriptor set
//! binding both. Grouping them in one struct keeps a slot's resources from
//! drifting out of sync the way parallel arrays can.

use ash::vk;

use crate::render::lighting::{LightingUbo, ViewProjectionUbo};
use crate::render::vulkan::{
    DescriptorSetWriter, UniformBuffer, VulkanContext, VulkanResult,
};

/// Uniform buffers and descriptor set for one swapchain image
pub struct FrameUniforms {
    view_projection: UniformBuffer<ViewProjectionUbo>,
    lighting: UniformBuffer<LightingUbo>,
    descriptor_set: vk::DescriptorSet,
}

impl FrameUniforms {
    /// Allocate both uniform buffers and write the descriptor set binding
    /// them at bindings 0 and 1
    pub fn new(context: &VulkanContext, descriptor_set: vk::DescriptorSet) -> VulkanResult<Self> {
        let device = context.raw_device();
        let physical_device = context.physical_device().device;

        let view_projection = UniformBuffer::new(
            device.clone(),
            context.instance(),
            physical_device,
        )?;
        let lighting = UniformBuffer::new(device.clone(), context.instance(), physical_device)?;

        DescriptorSetWriter::new()
            .write_uniform_buffer(
                descriptor_set,
                0,
                view_projection.handle(),
                view_projection.size(),
            )
            .write_uniform_buffer(descriptor_set, 1, lighting.handle(), lighting.size())
            .update(&device);

        Ok(Self {
            view_projection,
            lighting,
            descriptor_set,
        })
    }

    /// Copy the current camera and lighting state into this image's buffers
    ///
    /// Must only run after the owning frame slot's fence wait, when the GPU
    /// can no longer be reading these regions.
    pub fn write(
        &self,
        view_projection: &ViewProjectionUbo,
        lighting: &LightingUbo,
    ) -> VulkanResult<()> {
        self.view_projection.update(view_projection)?;
        self.lighting.update(lighting)?;
        Ok(())
    }

    /// Set-0 descriptor set for this image
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.descriptor_set
    }
}
