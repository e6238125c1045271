//! Descriptor set layouts, pools, and set updates

use ash::{vk, Device};

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Builder for descriptor set layouts
pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    /// Start an empty layout
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a uniform buffer binding
    pub fn add_uniform_buffer(mut self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    /// Add a combined image sampler binding
    pub fn add_combined_image_sampler(
        mut self,
        binding: u32,
        stage_flags: vk::ShaderStageFlags,
    ) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    /// Create the layout on the device
    pub fn build(self, device: &Device) -> VulkanResult<DescriptorSetLayout> {
        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&self.bindings);

        let layout = unsafe {
            device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(DescriptorSetLayout {
            device: device.clone(),
            layout,
        })
    }
}

impl Default for DescriptorSetLayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptor set layout wrapper with RAII cleanup
pub struct DescriptorSetLayout {
    device: Device,
    layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    /// Layout handle
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    /// Per-frame uniform layout: view-projection in the vertex stage at
    /// binding 0, lighting in the fragment stage at binding 1
    pub fn per_frame(device: &Device) -> VulkanResult<Self> {
        DescriptorSetLayoutBuilder::new()
            .add_uniform_buffer(0, vk::ShaderStageFlags::VERTEX)
            .add_uniform_buffer(1, vk::ShaderStageFlags::FRAGMENT)
            .build(device)
    }

    /// Texture sampler layout: one combined image sampler in the fragment
    /// stage; separate from the per-frame layout so per-texture sets can be
    /// swapped independently
    pub fn sampler(device: &Device) -> VulkanResult<Self> {
        DescriptorSetLayoutBuilder::new()
            .add_combined_image_sampler(0, vk::ShaderStageFlags::FRAGMENT)
            .build(device)
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Descriptor pool wrapper with RAII cleanup
///
/// Sets allocated from the pool are released with it; they are never freed
/// individually.
pub struct DescriptorPool {
    device: Device,
    pool: vk::DescriptorPool,
}

impl DescriptorPool {
    /// Create a pool holding `max_sets` sets of uniform buffer descriptors
    pub fn for_uniform_buffers(
        device: Device,
        max_sets: u32,
        descriptors_per_set: u32,
    ) -> VulkanResult<Self> {
        let pool_sizes = [vk::DescriptorPoolSize::builder()
            .ty(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(max_sets * descriptors_per_set)
            .build()];

        Self::new(device, max_sets, &pool_sizes)
    }

    /// Create a pool holding `max_sets` single-sampler sets
    pub fn for_samplers(device: Device, max_sets: u32) -> VulkanResult<Self> {
        let pool_sizes = [vk::DescriptorPoolSize::builder()
            .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(max_sets)
            .build()];

        Self::new(device, max_sets, &pool_sizes)
    }

    fn new(
        device: Device,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> VulkanResult<Self> {
        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes);

        let pool = unsafe {
            device
                .create_descriptor_pool(&pool_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, pool })
    }

    /// Allocate one descriptor set per entry in `layouts`
    pub fn allocate(
        &self,
        layouts: &[vk::DescriptorSetLayout],
    ) -> VulkanResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);

        unsafe {
            self.device
                .allocate_descriptor_sets(&alloc_info)
                .map_err(VulkanError::Api)
        }
    }

    /// Pool handle
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

/// Batched descriptor set updates
pub struct DescriptorSetWriter {
    buffer_writes: Vec<(vk::DescriptorSet, u32, vk::DescriptorBufferInfo)>,
    image_writes: Vec<(vk::DescriptorSet, u32, vk::DescriptorImageInfo)>,
}

impl DescriptorSetWriter {
    /// Start an empty batch
    pub fn new() -> Self {
        Self {
            buffer_writes: Vec::new(),
            image_writes: Vec::new(),
        }
    }

    /// Bind a whole uniform buffer at `binding`
    pub fn write_uniform_buffer(
        mut self,
        set: vk::DescriptorSet,
        binding: u32,
        buffer: vk::Buffer,
        range: vk::DeviceSize,
    ) -> Self {
        let info = vk::DescriptorBufferInfo::builder()
            .buffer(buffer)
            .offset(0)
            .range(range)
            .build();
        self.buffer_writes.push((set, binding, info));
        self
    }

    /// Bind a sampled image at `binding`
    pub fn write_combined_image_sampler(
        mut self,
        set: vk::DescriptorSet,
        binding: u32,
        image_view: vk::ImageView,
        sampler: vk::Sampler,
    ) -> Self {
        let info = vk::DescriptorImageInfo::builder()
            .image_view(image_view)
            .sampler(sampler)
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .build();
        self.image_writes.push((set, binding, info));
        self
    }

    /// Flush the batch to the device
    pub fn update(self, device: &Device) {
        let mut writes = Vec::with_capacity(self.buffer_writes.len() + self.image_writes.len());

        for (set, binding, info) in &self.buffer_writes {
            writes.push(
                vk::WriteDescriptorSet::builder()
                    .dst_set(*set)
                    .dst_binding(*binding)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(std::slice::from_ref(info))
                    .build(),
            );
        }
        for (set, binding, info) in &self.image_writes {
            writes.push(
                vk::WriteDescriptorSet::builder()
                    .dst_set(*set)
                    .dst_binding(*binding)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .image_info(std::slice::from_ref(info))
                    .build(),
            );
        }

        unsafe {
            device.update_descriptor_sets(&writes, &[]);
        }
    }
}

impl Default for DescriptorSetWriter {
    fn default() -> Self {
        Self::new()
    }
}
