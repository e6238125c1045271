//! Vulkan backend
//!
//! RAII wrappers over the raw API: every GPU object is owned by exactly one
//! type whose `Drop` releases it, so teardown order falls out of struct field
//! order instead of hand-maintained destroy lists.

pub mod buffer;
pub mod commands;
pub mod context;
pub mod descriptors;
pub mod frame;
pub mod framebuffer;
pub mod image;
pub mod pipeline;
pub mod render_pass;
pub mod swapchain;
pub mod sync;
pub mod texture;

pub use buffer::{Buffer, IndexBuffer, Mesh, UniformBuffer, VertexBuffer};
pub use commands::CommandPool;
pub use context::{LogicalDevice, PhysicalDeviceInfo, VulkanContext, VulkanError, VulkanInstance, VulkanResult};
pub use descriptors::{DescriptorPool, DescriptorSetLayout, DescriptorSetLayoutBuilder, DescriptorSetWriter};
pub use frame::FrameUniforms;
pub use framebuffer::Framebuffer;
pub use image::{DepthBuffer, Image};
pub use pipeline::{GraphicsPipeline, ShaderModule};
pub use render_pass::RenderPass;
pub use swapchain::Swapchain;
pub use sync::{Fence, FrameSync, Semaphore};
pub use texture::TexturePool;
