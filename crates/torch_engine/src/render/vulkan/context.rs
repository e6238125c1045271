//! Vulkan context: instance, physical device selection, logical device
//!
//! The context owns the process-wide device state every other backend type
//! borrows. Construction order is instance → surface → physical device →
//! logical device; `Drop` releases them in reverse.

use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device, Entry, Instance};
use std::collections::HashSet;
use std::ffi::{CStr, CString};
use thiserror::Error;

use crate::render::window::Window;

/// Whether validation layers are requested for this build
const ENABLE_VALIDATION: bool = cfg!(debug_assertions);

/// Vulkan backend errors
#[derive(Error, Debug)]
pub enum VulkanError {
    /// Raw Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Initialization-time failure with context
    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    /// No device memory type satisfies the requested properties
    #[error("no suitable memory type found")]
    NoSuitableMemoryType,

    /// No candidate format satisfies the requested features
    #[error("no supported format in candidate list")]
    NoSupportedFormat,
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    debug_utils: Option<DebugUtils>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl VulkanInstance {
    /// Create the Vulkan instance with the window system's required
    /// extensions, enabling validation layers when requested
    pub fn new(window: &Window, app_name: &str) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }.map_err(|e| {
            VulkanError::InitializationFailed(format!("failed to load Vulkan: {:?}", e))
        })?;

        let app_name_cstr = CString::new(app_name)
            .map_err(|_| VulkanError::InitializationFailed("invalid app name".to_string()))?;
        let engine_name_cstr = CString::new("torch_engine").expect("static name");
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name_cstr)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let required_extensions = window.required_instance_extensions().map_err(|e| {
            VulkanError::InitializationFailed(format!("required extensions unavailable: {}", e))
        })?;
        Self::check_instance_extension_support(&entry, &required_extensions)?;

        let cstr_extensions: Vec<CString> = required_extensions
            .iter()
            .map(|ext| CString::new(ext.as_str()).expect("extension name"))
            .collect();
        let mut extensions: Vec<*const i8> =
            cstr_extensions.iter().map(|ext| ext.as_ptr()).collect();
        if ENABLE_VALIDATION {
            extensions.push(DebugUtils::name().as_ptr());
        }

        let layer_names = if ENABLE_VALIDATION {
            let layers = vec![CString::new("VK_LAYER_KHRONOS_validation").expect("layer name")];
            Self::check_layer_support(&entry, &layers)?;
            layers
        } else {
            Vec::new()
        };
        let layer_names_ptrs: Vec<*const i8> =
            layer_names.iter().map(|name| name.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_names_ptrs);

        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_err(|e| match e {
                    vk::Result::ERROR_LAYER_NOT_PRESENT => VulkanError::InitializationFailed(
                        "requested validation layers are not present".to_string(),
                    ),
                    other => VulkanError::Api(other),
                })?
        };

        let (debug_utils, debug_messenger) = if ENABLE_VALIDATION {
            let debug_utils = DebugUtils::new(&entry, &instance);
            let messenger = Self::create_debug_messenger(&debug_utils)?;
            (Some(debug_utils), Some(messenger))
        } else {
            (None, None)
        };

        Ok(Self {
            entry,
            instance,
            debug_utils,
            debug_messenger,
        })
    }

    fn check_instance_extension_support(entry: &Entry, required: &[String]) -> VulkanResult<()> {
        let available = entry
            .enumerate_instance_extension_properties(None)
            .map_err(VulkanError::Api)?;

        for name in required {
            let found = available.iter().any(|ext| {
                let ext_name = unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) };
                ext_name.to_string_lossy() == *name
            });
            if !found {
                return Err(VulkanError::InitializationFailed(format!(
                    "required instance extension {} not supported",
                    name
                )));
            }
        }
        Ok(())
    }

    fn check_layer_support(entry: &Entry, requested: &[CString]) -> VulkanResult<()> {
        let available = entry
            .enumerate_instance_layer_properties()
            .map_err(VulkanError::Api)?;

        for layer in requested {
            let found = available.iter().any(|props| {
                let layer_name = unsafe { CStr::from_ptr(props.layer_name.as_ptr()) };
                layer_name == layer.as_c_str()
            });
            if !found {
                return Err(VulkanError::InitializationFailed(format!(
                    "validation layer {:?} not available",
                    layer
                )));
            }
        }
        Ok(())
    }

    fn create_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe {
            debug_utils
                .create_debug_utils_messenger(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let (Some(debug_utils), Some(messenger)) =
                (&self.debug_utils, &self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(*messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Validation layer messages routed into the log facade
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::error!("[vulkan] {:?} {}", message_type, message);
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        log::warn!("[vulkan] {:?} {}", message_type, message);
    } else {
        log::debug!("[vulkan] {:?} {}", message_type, message);
    }

    vk::FALSE
}

/// Selected physical device and its queue family indices
pub struct PhysicalDeviceInfo {
    /// Physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Index of the graphics queue family
    pub graphics_family: u32,
    /// Index of the presentation queue family
    pub present_family: u32,
}

impl PhysicalDeviceInfo {
    /// Select the first physical device suitable for rendering to `surface`
    ///
    /// Suitable means: graphics and presentation queue families exist, the
    /// swapchain extension is supported, the surface reports at least one
    /// format and one present mode, and anisotropic filtering is available.
    /// Devices are not ranked; the first match wins.
    pub fn select(
        instance: &Instance,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> VulkanResult<Self> {
        let devices = unsafe {
            instance
                .enumerate_physical_devices()
                .map_err(VulkanError::Api)?
        };

        if devices.is_empty() {
            return Err(VulkanError::InitializationFailed(
                "no Vulkan-capable devices found".to_string(),
            ));
        }

        for device in devices {
            match Self::evaluate(instance, device, surface, surface_loader) {
                Ok(info) => {
                    log::info!("selected GPU: {}", unsafe {
                        CStr::from_ptr(info.properties.device_name.as_ptr()).to_string_lossy()
                    });
                    return Ok(info);
                }
                Err(e) => log::debug!("skipping device: {}", e),
            }
        }

        Err(VulkanError::InitializationFailed(
            "no suitable GPU found".to_string(),
        ))
    }

    fn evaluate(
        instance: &Instance,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> VulkanResult<Self> {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let features = unsafe { instance.get_physical_device_features(device) };
        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(device) };

        let mut graphics_family = None;
        let mut present_family = None;

        for (index, family) in queue_families.iter().enumerate() {
            let index = index as u32;

            if family.queue_count > 0
                && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                && graphics_family.is_none()
            {
                graphics_family = Some(index);
            }

            let present_support = unsafe {
                surface_loader
                    .get_physical_device_surface_support(device, index, surface)
                    .map_err(VulkanError::Api)?
            };
            if family.queue_count > 0 && present_support && present_family.is_none() {
                present_family = Some(index);
            }

            if graphics_family.is_some() && present_family.is_some() {
                break;
            }
        }

        let graphics_family = graphics_family.ok_or_else(|| {
            VulkanError::InitializationFailed("no graphics queue family".to_string())
        })?;
        let present_family = present_family.ok_or_else(|| {
            VulkanError::InitializationFailed("no presentation queue family".to_string())
        })?;

        // Swapchain extension must be present
        let extensions = unsafe {
            instance
                .enumerate_device_extension_properties(device)
                .map_err(VulkanError::Api)?
        };
        let has_swapchain = extensions.iter().any(|ext| {
            let name = unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) };
            name == SwapchainLoader::name()
        });
        if !has_swapchain {
            return Err(VulkanError::InitializationFailed(
                "swapchain extension not supported".to_string(),
            ));
        }

        // Surface must expose at least one format and one present mode
        let formats = unsafe {
            surface_loader
                .get_physical_device_surface_formats(device, surface)
                .map_err(VulkanError::Api)?
        };
        let present_modes = unsafe {
            surface_loader
                .get_physical_device_surface_present_modes(device, surface)
                .map_err(VulkanError::Api)?
        };
        if formats.is_empty() || present_modes.is_empty() {
            return Err(VulkanError::InitializationFailed(
                "surface reports no formats or present modes".to_string(),
            ));
        }

        if features.sampler_anisotropy != vk::TRUE {
            return Err(VulkanError::InitializationFailed(
                "anisotropic filtering not supported".to_string(),
            ));
        }

        Ok(Self {
            device,
            properties,
            graphics_family,
            present_family,
        })
    }
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Logical device handle
    pub device: Device,
    /// Graphics queue
    pub graphics_queue: vk::Queue,
    /// Presentation queue
    pub present_queue: vk::Queue,
    /// Swapchain extension loader
    pub swapchain_loader: SwapchainLoader,
}

impl LogicalDevice {
    /// Create the logical device with one queue per unique family and
    /// anisotropic filtering enabled
    pub fn new(instance: &Instance, physical: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let unique_families: HashSet<u32> =
            [physical.graphics_family, physical.present_family]
                .iter()
                .copied()
                .collect();

        let queue_priorities = [1.0f32];
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
                    .build()
            })
            .collect();

        let required_extensions = [SwapchainLoader::name().as_ptr()];
        let device_features = vk::PhysicalDeviceFeatures::builder()
            .sampler_anisotropy(true)
            .build();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&required_extensions)
            .enabled_features(&device_features);

        let device = unsafe {
            instance
                .create_device(physical.device, &create_info, None)
                .map_err(VulkanError::Api)?
        };

        let graphics_queue = unsafe { device.get_device_queue(physical.graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(physical.present_family, 0) };
        let swapchain_loader = SwapchainLoader::new(instance, &device);

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            swapchain_loader,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

/// Owner of the core Vulkan objects
///
/// Field order is the teardown order: surface is destroyed in `drop`, then
/// the logical device and instance drop in declaration order.
pub struct VulkanContext {
    surface: vk::SurfaceKHR,
    surface_loader: Surface,
    physical_device: PhysicalDeviceInfo,
    device: LogicalDevice,
    instance: VulkanInstance,
}

impl VulkanContext {
    /// Build the full context for rendering into `window`
    pub fn new(window: &mut Window, app_name: &str) -> VulkanResult<Self> {
        let instance = VulkanInstance::new(window, app_name)?;

        let surface_loader = Surface::new(&instance.entry, &instance.instance);
        let surface = window
            .create_vulkan_surface(instance.instance.handle())
            .map_err(|e| {
                VulkanError::InitializationFailed(format!("surface creation: {}", e))
            })?;

        let physical_device =
            PhysicalDeviceInfo::select(&instance.instance, surface, &surface_loader)?;
        let device = LogicalDevice::new(&instance.instance, &physical_device)?;

        Ok(Self {
            surface,
            surface_loader,
            physical_device,
            device,
            instance,
        })
    }

    /// Raw instance reference
    pub fn instance(&self) -> &Instance {
        &self.instance.instance
    }

    /// Surface handle
    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Surface extension loader
    pub fn surface_loader(&self) -> &Surface {
        &self.surface_loader
    }

    /// Selected physical device info
    pub fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// Logical device wrapper
    pub fn device(&self) -> &LogicalDevice {
        &self.device
    }

    /// Cloned raw device handle for RAII wrappers
    pub fn raw_device(&self) -> Device {
        self.device.device.clone()
    }

    /// Swapchain extension loader
    pub fn swapchain_loader(&self) -> &SwapchainLoader {
        &self.device.swapchain_loader
    }

    /// Graphics queue
    pub fn graphics_queue(&self) -> vk::Queue {
        self.device.graphics_queue
    }

    /// Presentation queue
    pub fn present_queue(&self) -> vk::Queue {
        self.device.present_queue
    }

    /// Block until the device is idle
    pub fn wait_idle(&self) -> VulkanResult<()> {
        unsafe {
            self.device
                .device
                .device_wait_idle()
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device.device_wait_idle();
            self.surface_loader.destroy_surface(self.surface, None);
        }
        // device and instance fields drop next, in that order
    }
}
