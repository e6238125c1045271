//! Window management using GLFW
//!
//! Fixed-size window configured for Vulkan (no client API) with the cursor
//! captured. Keeps a key-state array indexed by key code and mouse deltas
//! with consumed-and-reset semantics: reading an axis zeroes it.

use thiserror::Error;

/// Size of the key-state array; covers every GLFW key code
pub const KEY_STATE_SIZE: usize = 1024;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("GLFW initialization failed")]
    InitializationFailed,

    #[error("window creation failed")]
    CreationFailed,

    #[error("GLFW error: {0}")]
    GlfwError(String),
}

pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window wrapper owning the input state the engine consumes
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,

    keys: [bool; KEY_STATE_SIZE],
    x_change: f32,
    y_change: f32,
    last_cursor: Option<(f64, f64)>,
}

impl Window {
    /// Create a fixed-size window with the cursor captured for mouse look
    pub fn new(width: u32, height: u32, title: &str) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|_| WindowError::InitializationFailed)?;

        // Vulkan renders into the window; no client API context wanted.
        // Resizing is unsupported, the swapchain extent is fixed at creation.
        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(false));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_cursor_mode(glfw::CursorMode::Disabled);

        Ok(Self {
            glfw,
            window,
            events,
            keys: [false; KEY_STATE_SIZE],
            x_change: 0.0,
            y_change: 0.0,
            last_cursor: None,
        })
    }

    /// Whether the user has requested the window to close
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Pump GLFW events and fold them into the key/mouse state
    pub fn process_events(&mut self) {
        self.glfw.poll_events();

        for (_, event) in glfw::flush_messages(&self.events) {
            match event {
                glfw::WindowEvent::Key(key, _, action, _) => {
                    if key == glfw::Key::Escape && action == glfw::Action::Press {
                        self.window.set_should_close(true);
                    }

                    let index = key as usize;
                    if index < KEY_STATE_SIZE {
                        match action {
                            glfw::Action::Press => self.keys[index] = true,
                            glfw::Action::Release => self.keys[index] = false,
                            glfw::Action::Repeat => {}
                        }
                    }
                }
                glfw::WindowEvent::CursorPos(x, y) => {
                    if let Some((last_x, last_y)) = self.last_cursor {
                        self.x_change += (x - last_x) as f32;
                        // Screen Y grows downward; invert so moving the mouse
                        // up pitches the camera up.
                        self.y_change += (last_y - y) as f32;
                    }
                    self.last_cursor = Some((x, y));
                }
                _ => {}
            }
        }
    }

    /// Current pressed state per key code
    pub fn keys(&self) -> &[bool; KEY_STATE_SIZE] {
        &self.keys
    }

    /// Accumulated horizontal mouse delta; reading resets it
    pub fn x_change(&mut self) -> f32 {
        std::mem::take(&mut self.x_change)
    }

    /// Accumulated vertical mouse delta; reading resets it
    pub fn y_change(&mut self) -> f32 {
        std::mem::take(&mut self.y_change)
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width as u32, height as u32)
    }

    /// Seconds since GLFW was initialized
    pub fn time(&self) -> f64 {
        self.glfw.get_time()
    }

    /// Instance extensions the window system requires
    pub fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::GlfwError("no Vulkan instance extensions".to_string()))
    }

    /// Create a Vulkan surface bound to this window
    pub fn create_vulkan_surface(
        &mut self,
        instance: ash::vk::Instance,
    ) -> WindowResult<ash::vk::SurfaceKHR> {
        let mut surface = ash::vk::SurfaceKHR::null();
        let result = self
            .window
            .create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == ash::vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::GlfwError(format!(
                "surface creation failed: {:?}",
                result
            )))
        }
    }
}
