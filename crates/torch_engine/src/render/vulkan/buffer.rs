//! Buffer management
//!
//! Every buffer bundles its handle and backing memory in one owning type, so
//! the pair can never drift apart or leak on an early-return path.

use ash::{vk, Device, Instance};
use bytemuck::Pod;
use std::mem;

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Buffer with its device memory, released together on drop
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer and allocate memory satisfying `properties`
    pub fn new(
        device: Device,
        instance: &Instance,
        physical_device: vk::PhysicalDevice,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            device
                .create_buffer(&buffer_info, None)
                .map_err(VulkanError::Api)?
        };

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let memory_type_index = find_memory_type(
            instance,
            physical_device,
            requirements.memory_type_bits,
            properties,
        );

        let memory_type_index = match memory_type_index {
            Ok(index) => index,
            Err(e) => {
                // The buffer handle has no owner yet on this path
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        let memory = unsafe {
            match device.allocate_memory(&alloc_info, None) {
                Ok(memory) => memory,
                Err(e) => {
                    device.destroy_buffer(buffer, None);
                    return Err(VulkanError::Api(e));
                }
            }
        };

        unsafe {
            if let Err(e) = device.bind_buffer_memory(buffer, memory, 0) {
                device.destroy_buffer(buffer, None);
                device.free_memory(memory, None);
                return Err(VulkanError::Api(e));
            }
        }

        Ok(Self {
            device,
            buffer,
            memory,
            size,
        })
    }

    /// Map the whole buffer for host writes
    pub fn map_memory(&self) -> VulkanResult<*mut std::ffi::c_void> {
        unsafe {
            self.device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())
                .map_err(VulkanError::Api)
        }
    }

    /// Unmap the buffer
    pub fn unmap_memory(&self) {
        unsafe {
            self.device.unmap_memory(self.memory);
        }
    }

    /// Copy `data` into the buffer through a map/copy/unmap cycle
    ///
    /// Only valid for host-visible memory; coherent memory needs no explicit
    /// flush.
    pub fn write_data<T: Pod>(&self, data: &[T]) -> VulkanResult<()> {
        let mapped = self.map_memory()?;

        let bytes: &[u8] = bytemuck::cast_slice(data);
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped as *mut u8, bytes.len());
        }

        self.unmap_memory();
        Ok(())
    }

    /// Buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Buffer size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Vertex buffer filled at creation
pub struct VertexBuffer {
    buffer: Buffer,
}

impl VertexBuffer {
    /// Create a vertex buffer holding `vertices`
    pub fn new<T: Pod>(
        device: Device,
        instance: &Instance,
        physical_device: vk::PhysicalDevice,
        vertices: &[T],
    ) -> VulkanResult<Self> {
        let size = (vertices.len() * mem::size_of::<T>()) as vk::DeviceSize;

        let buffer = Buffer::new(
            device,
            instance,
            physical_device,
            size,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        buffer.write_data(vertices)?;

        Ok(Self { buffer })
    }

    /// Buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }
}

/// Index buffer filled at creation
pub struct IndexBuffer {
    buffer: Buffer,
    index_count: u32,
}

impl IndexBuffer {
    /// Create an index buffer holding `indices`
    pub fn new(
        device: Device,
        instance: &Instance,
        physical_device: vk::PhysicalDevice,
        indices: &[u32],
    ) -> VulkanResult<Self> {
        let size = (indices.len() * mem::size_of::<u32>()) as vk::DeviceSize;

        let buffer = Buffer::new(
            device,
            instance,
            physical_device,
            size,
            vk::BufferUsageFlags::INDEX_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        buffer.write_data(indices)?;

        Ok(Self {
            buffer,
            index_count: indices.len() as u32,
        })
    }

    /// Buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Number of indices
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// Host-visible uniform buffer for a single `T`
pub struct UniformBuffer<T: Pod> {
    buffer: Buffer,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Pod> UniformBuffer<T> {
    /// Create an uninitialized uniform buffer sized for `T`
    pub fn new(
        device: Device,
        instance: &Instance,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<Self> {
        let size = mem::size_of::<T>() as vk::DeviceSize;

        let buffer = Buffer::new(
            device,
            instance,
            physical_device,
            size,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;

        Ok(Self {
            buffer,
            _phantom: std::marker::PhantomData,
        })
    }

    /// Overwrite the buffer contents
    pub fn update(&self, data: &T) -> VulkanResult<()> {
        self.buffer.write_data(std::slice::from_ref(data))
    }

    /// Buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Size of the uniform block in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.buffer.size()
    }
}

/// A mesh resident on the GPU: vertex and index buffers plus the texture it
/// samples
pub struct Mesh {
    vertex_buffer: VertexBuffer,
    index_buffer: IndexBuffer,
    texture_id: usize,
}

impl Mesh {
    /// Bundle uploaded buffers into a mesh
    pub fn new(vertex_buffer: VertexBuffer, index_buffer: IndexBuffer, texture_id: usize) -> Self {
        Self {
            vertex_buffer,
            index_buffer,
            texture_id,
        }
    }

    /// Vertex buffer handle
    pub fn vertex_buffer(&self) -> vk::Buffer {
        self.vertex_buffer.handle()
    }

    /// Index buffer handle
    pub fn index_buffer(&self) -> vk::Buffer {
        self.index_buffer.handle()
    }

    /// Number of indices to draw
    pub fn index_count(&self) -> u32 {
        self.index_buffer.index_count()
    }

    /// Texture pool id this mesh samples from
    pub fn texture_id(&self) -> usize {
        self.texture_id
    }
}

/// Find a memory type satisfying both the resource's type mask and the
/// requested property flags
pub fn find_memory_type(
    instance: &Instance,
    physical_device: vk::PhysicalDevice,
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
) -> VulkanResult<u32> {
    let mem_properties =
        unsafe { instance.get_physical_device_memory_properties(physical_device) };

    for i in 0..mem_properties.memory_type_count {
        if (type_filter & (1 << i)) != 0
            && mem_properties.memory_types[i as usize]
                .property_flags
                .contains(properties)
        {
            return Ok(i);
        }
    }

    Err(VulkanError::NoSuitableMemoryType)
}
