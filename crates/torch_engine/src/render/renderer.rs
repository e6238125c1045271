//! The renderer
//!
//! Owns every GPU resource and drives the per-frame sequence: wait on the
//! frame slot's fence, acquire a swapchain image, write that image's uniform
//! buffers, re-record its command buffer, submit, present, advance the slot.
//! Field declaration order doubles as the reverse-dependency teardown order
//! once `Drop` has waited for the device to go idle.

use ash::vk;
use std::path::{Path, PathBuf};

use crate::assets::{model_loader, AssetError, ImageData};
use crate::config::RendererConfig;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::camera::Camera;
use crate::render::lighting::{SceneLighting, ViewProjectionUbo};
use crate::render::model::{Model, ModelSpawn};
use crate::render::vulkan::pipeline::ModelPushConstant;
use crate::render::vulkan::texture::DEFAULT_TEXTURE_ID;
use crate::render::vulkan::{
    image, CommandPool, DepthBuffer, DescriptorPool, DescriptorSetLayout, FrameSync,
    FrameUniforms, Framebuffer, GraphicsPipeline, IndexBuffer, Mesh, RenderPass, Swapchain,
    TexturePool, VertexBuffer, VulkanContext, VulkanError,
};
use crate::render::window::{Window, WindowError};
use thiserror::Error;

/// Number of frames the CPU may record ahead of the GPU
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Field of view of the fixed perspective projection, in degrees
const FOV_DEGREES: f32 = 45.0;
/// Near clipping plane
const NEAR_PLANE: f32 = 0.1;
/// Far clipping plane
const FAR_PLANE: f32 = 1000.0;

/// Background clear color
const CLEAR_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

/// Renderer errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Vulkan backend failure
    #[error(transparent)]
    Vulkan(#[from] VulkanError),

    /// Asset loading failure
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Window system failure
    #[error(transparent)]
    Window(#[from] WindowError),
}

/// Result type for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;

/// The renderer: GPU state owner and frame scheduler
///
/// Fields are declared in teardown order. Models (which own GPU buffers),
/// sync objects, the command pool, framebuffers, pipeline state, and
/// resources all drop before the context that created them.
pub struct Renderer {
    models: Vec<Model>,
    frame_sync: Vec<FrameSync>,
    command_buffers: Vec<vk::CommandBuffer>,
    command_pool: CommandPool,
    framebuffers: Vec<Framebuffer>,
    pipeline: GraphicsPipeline,
    frame_layout: DescriptorSetLayout,
    sampler_layout: DescriptorSetLayout,
    render_pass: RenderPass,
    depth_buffer: DepthBuffer,
    textures: TexturePool,
    frame_uniforms: Vec<FrameUniforms>,
    uniform_pool: DescriptorPool,
    swapchain: Swapchain,
    context: VulkanContext,

    view_projection: ViewProjectionUbo,
    lighting: SceneLighting,
    texture_dir: PathBuf,
    current_frame: usize,
}

impl Renderer {
    /// Initialize the full rendering stack for `window`
    pub fn new(window: &mut Window, config: &RendererConfig) -> RenderResult<Self> {
        log::info!("initializing renderer");

        let context = VulkanContext::new(window, &config.app_name.0)?;

        let (fb_width, fb_height) = window.framebuffer_size();
        let swapchain = Swapchain::new(
            &context,
            vk::Extent2D {
                width: fb_width,
                height: fb_height,
            },
        )?;

        let device = context.raw_device();
        let depth_format =
            image::choose_depth_format(context.instance(), context.physical_device().device)?;

        let render_pass = RenderPass::new(
            device.clone(),
            swapchain.format().format,
            depth_format,
        )?;

        let frame_layout = DescriptorSetLayout::per_frame(&device)?;
        let sampler_layout = DescriptorSetLayout::sampler(&device)?;

        let pipeline = GraphicsPipeline::new(
            device.clone(),
            render_pass.handle(),
            swapchain.extent(),
            [frame_layout.handle(), sampler_layout.handle()],
            Path::new(&config.shaders.vertex_spv),
            Path::new(&config.shaders.fragment_spv),
        )?;

        let depth_buffer = DepthBuffer::new(
            device.clone(),
            context.instance(),
            context.physical_device().device,
            swapchain.extent(),
            depth_format,
        )?;

        let framebuffers: Result<Vec<_>, _> = swapchain
            .image_views()
            .iter()
            .map(|&view| {
                Framebuffer::new(
                    device.clone(),
                    render_pass.handle(),
                    &[view, depth_buffer.view()],
                    swapchain.extent(),
                )
            })
            .collect();
        let framebuffers = framebuffers?;

        let command_pool = CommandPool::new(
            device.clone(),
            context.physical_device().graphics_family,
        )?;
        let command_buffers =
            command_pool.allocate_command_buffers(swapchain.image_count() as u32)?;

        // Two uniform blocks per swapchain image
        let image_count = swapchain.image_count() as u32;
        let uniform_pool = DescriptorPool::for_uniform_buffers(device.clone(), image_count, 2)?;
        let frame_set_layouts = vec![frame_layout.handle(); swapchain.image_count()];
        let frame_sets = uniform_pool.allocate(&frame_set_layouts)?;

        let frame_uniforms: Result<Vec<_>, _> = frame_sets
            .into_iter()
            .map(|set| FrameUniforms::new(&context, set))
            .collect();
        let frame_uniforms = frame_uniforms?;

        let textures = TexturePool::new(&context, &command_pool, sampler_layout.handle())?;

        let frame_sync: Result<Vec<_>, _> = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| FrameSync::new(device.clone()))
            .collect();
        let frame_sync = frame_sync?;

        log::info!(
            "renderer ready: {} swapchain images, {} frames in flight",
            swapchain.image_count(),
            MAX_FRAMES_IN_FLIGHT
        );

        Ok(Self {
            models: Vec::new(),
            frame_sync,
            command_buffers,
            command_pool,
            framebuffers,
            pipeline,
            frame_layout,
            sampler_layout,
            render_pass,
            depth_buffer,
            textures,
            frame_uniforms,
            uniform_pool,
            swapchain,
            context,
            view_projection: ViewProjectionUbo::identity(),
            lighting: SceneLighting::default(),
            texture_dir: PathBuf::from(&config.texture_dir.0),
            current_frame: 0,
        })
    }

    /// Load a model file, upload its meshes and textures, and add it to the
    /// scene
    ///
    /// Returns the model's id in the flat scene list.
    pub fn load_model<P: AsRef<Path>>(
        &mut self,
        path: P,
        spawn: ModelSpawn,
    ) -> RenderResult<usize> {
        let loaded = model_loader::load_obj(path.as_ref())?;

        let texture_dir = self.texture_dir.clone();
        let material_ids = resolve_material_ids(&loaded.material_textures, |name| {
            let image_data = ImageData::from_file(texture_dir.join(name))?;
            let id = self
                .textures
                .create_texture(&self.context, &self.command_pool, &image_data)?;
            Ok(id)
        })?;

        let device = self.context.raw_device();
        let mut meshes = Vec::with_capacity(loaded.meshes.len());
        for mesh_data in &loaded.meshes {
            let vertex_buffer = VertexBuffer::new(
                device.clone(),
                self.context.instance(),
                self.context.physical_device().device,
                &mesh_data.vertices,
            )?;
            let index_buffer = IndexBuffer::new(
                device.clone(),
                self.context.instance(),
                self.context.physical_device().device,
                &mesh_data.indices,
            )?;

            let texture_id = mesh_data
                .material_id
                .and_then(|m| material_ids.get(m).copied())
                .unwrap_or(DEFAULT_TEXTURE_ID);

            meshes.push(Mesh::new(vertex_buffer, index_buffer, texture_id));
        }

        self.models.push(Model::new(meshes, spawn));
        let id = self.models.len() - 1;
        log::info!(
            "model {} loaded: {} meshes",
            id,
            self.models[id].mesh_count()
        );
        Ok(id)
    }

    /// Access a model by id
    pub fn model(&self, id: usize) -> &Model {
        &self.models[id]
    }

    /// Mutable access to a model by id
    pub fn model_mut(&mut self, id: usize) -> &mut Model {
        &mut self.models[id]
    }

    /// Iterate mutably over every model, e.g. for per-frame key control
    pub fn models_mut(&mut self) -> impl Iterator<Item = &mut Model> {
        self.models.iter_mut()
    }

    /// Number of models in the scene
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Position the spotlight at `source` model, pointing where it faces
    pub fn set_lighting(&mut self, source: usize) {
        let model = &self.models[source];
        let position = model.position();
        let direction = model.facing();

        // Swizzle into the shader's coordinate convention
        let shader_position = Vec3::new(position.z, position.x, position.y);
        self.lighting.set_spotlight(shader_position, direction);
    }

    /// Rebuild the view and projection matrices from the camera
    pub fn update_view(&mut self, camera: &Camera) {
        let extent = self.swapchain.extent();
        let aspect = extent.width as f32 / extent.height as f32;

        let mut projection =
            Mat4::perspective(FOV_DEGREES.to_radians(), aspect, NEAR_PLANE, FAR_PLANE);
        // Vulkan clip space is Y-down
        projection[(1, 1)] *= -1.0;

        let view = Mat4::look_at(
            camera.position(),
            camera.position() + camera.front(),
            camera.up(),
        );

        self.view_projection = ViewProjectionUbo {
            projection: projection.into(),
            view: view.into(),
        };
    }

    /// Render and present one frame
    pub fn draw_frame(&mut self) -> RenderResult<()> {
        let sync = &self.frame_sync[self.current_frame];

        // Sole CPU-side backpressure: the slot's previous submission must
        // fully complete before its resources are reused.
        sync.in_flight.wait(u64::MAX)?;
        sync.in_flight.reset()?;

        let (image_index, _suboptimal) = unsafe {
            self.swapchain
                .loader()
                .acquire_next_image(
                    self.swapchain.handle(),
                    u64::MAX,
                    sync.image_available.handle(),
                    vk::Fence::null(),
                )
                .map_err(VulkanError::Api)?
        };

        self.frame_uniforms[image_index as usize]
            .write(&self.view_projection, &self.lighting.to_ubo())?;

        self.record_commands(image_index)?;

        let device = &self.context.device().device;
        let wait_semaphores = [sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [self.command_buffers[image_index as usize]];
        let signal_semaphores = [sync.render_finished.handle()];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            device
                .queue_submit(
                    self.context.graphics_queue(),
                    &[submit_info.build()],
                    sync.in_flight.handle(),
                )
                .map_err(VulkanError::Api)?;
        }

        let swapchains = [self.swapchain.handle()];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            self.swapchain
                .loader()
                .queue_present(self.context.present_queue(), &present_info)
                .map_err(VulkanError::Api)?;
        }

        self.current_frame = next_frame_slot(self.current_frame);
        Ok(())
    }

    /// Re-record the command buffer for a swapchain image
    ///
    /// Safe to call only after the frame fence wait guarantees the GPU is
    /// done with this buffer.
    fn record_commands(&self, image_index: u32) -> RenderResult<()> {
        let device = &self.context.device().device;
        let command_buffer = self.command_buffers[image_index as usize];
        let extent = self.swapchain.extent();

        let begin_info = vk::CommandBufferBeginInfo::builder();
        unsafe {
            device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::Api)?;
        }

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: CLEAR_COLOR,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];

        let render_pass_begin = vk::RenderPassBeginInfo::builder()
            .render_pass(self.render_pass.handle())
            .framebuffer(self.framebuffers[image_index as usize].handle())
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&clear_values);

        unsafe {
            device.cmd_begin_render_pass(
                command_buffer,
                &render_pass_begin,
                vk::SubpassContents::INLINE,
            );
            device.cmd_bind_pipeline(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline.handle(),
            );

            for model in &self.models {
                let push = ModelPushConstant {
                    model: model.transform().into(),
                };
                device.cmd_push_constants(
                    command_buffer,
                    self.pipeline.layout(),
                    vk::ShaderStageFlags::VERTEX,
                    0,
                    bytemuck::bytes_of(&push),
                );

                for mesh in model.meshes() {
                    device.cmd_bind_vertex_buffers(
                        command_buffer,
                        0,
                        &[mesh.vertex_buffer()],
                        &[0],
                    );
                    device.cmd_bind_index_buffer(
                        command_buffer,
                        mesh.index_buffer(),
                        0,
                        vk::IndexType::UINT32,
                    );

                    let descriptor_sets = [
                        self.frame_uniforms[image_index as usize].descriptor_set(),
                        self.textures.descriptor_set(mesh.texture_id()),
                    ];
                    device.cmd_bind_descriptor_sets(
                        command_buffer,
                        vk::PipelineBindPoint::GRAPHICS,
                        self.pipeline.layout(),
                        0,
                        &descriptor_sets,
                        &[],
                    );

                    device.cmd_draw_indexed(command_buffer, mesh.index_count(), 1, 0, 0, 0);
                }
            }

            device.cmd_end_render_pass(command_buffer);
            device
                .end_command_buffer(command_buffer)
                .map_err(VulkanError::Api)?;
        }

        Ok(())
    }

    /// Block until the GPU is idle
    pub fn wait_idle(&self) -> RenderResult<()> {
        self.context.wait_idle()?;
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // No member may be destroyed while in-flight GPU work references it
        if let Err(e) = self.context.wait_idle() {
            log::error!("device wait failed during renderer teardown: {:?}", e);
        }
        // Fields drop in declaration order: models and sync objects first,
        // the context (device, instance) last.
    }
}

/// Advance a frame slot index round-robin
fn next_frame_slot(current: usize) -> usize {
    (current + 1) % MAX_FRAMES_IN_FLIGHT
}

/// Map per-material texture filenames to texture pool ids
///
/// Empty names mean "no texture" and resolve to the reserved default id;
/// every other name goes through `create`.
fn resolve_material_ids<F>(names: &[String], mut create: F) -> RenderResult<Vec<usize>>
where
    F: FnMut(&str) -> RenderResult<usize>,
{
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        if name.is_empty() {
            ids.push(DEFAULT_TEXTURE_ID);
        } else {
            ids.push(create(name)?);
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_slots_cycle_round_robin() {
        let mut slot = 0;
        let mut visited = Vec::new();
        for _ in 0..6 {
            visited.push(slot);
            slot = next_frame_slot(slot);
        }
        assert_eq!(visited, vec![0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn slot_reuse_distance_equals_in_flight_count() {
        // A slot comes around again only after every other slot has been
        // used, so its fence has had a full cycle to signal.
        let mut slot = 0;
        let first = slot;
        let mut distance = 0;
        loop {
            slot = next_frame_slot(slot);
            distance += 1;
            if slot == first {
                break;
            }
        }
        assert_eq!(distance, MAX_FRAMES_IN_FLIGHT);
    }

    #[test]
    fn empty_material_names_map_to_default_texture() {
        let names = vec![String::new(), "hull.png".to_string(), String::new()];
        let ids = resolve_material_ids(&names, |name| {
            assert_eq!(name, "hull.png");
            Ok(7)
        })
        .expect("mapping succeeds");
        assert_eq!(ids, vec![DEFAULT_TEXTURE_ID, 7, DEFAULT_TEXTURE_ID]);
    }

    #[test]
    fn material_mapping_propagates_creation_errors() {
        let names = vec!["missing.png".to_string()];
        let result = resolve_material_ids(&names, |_| {
            Err(RenderError::Asset(crate::assets::AssetError::LoadFailed(
                "missing.png".to_string(),
            )))
        });
        assert!(result.is_err());
    }
}
