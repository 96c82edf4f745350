//! Surface renderer component
//!
//! Creates the native surface an entity's content is drawn into, binds it to
//! the entity and keeps the surface material's opacity in sync with the
//! entity's effective opacity.

use crate::ecs::{Component, ComponentContext};
use crate::input::FrameInput;
use crate::native::{NativeBackend, NativeHandle, StereoMode};

/// Draws a texture surface on its entity's geometry
#[derive(Debug, Clone)]
pub struct SurfaceRendererComponent {
    surface: Option<NativeHandle>,
    stereo_mode: StereoMode,
    stereo_dirty: bool,
    opacity: f32,
}

impl Default for SurfaceRendererComponent {
    fn default() -> Self {
        Self {
            surface: None,
            stereo_mode: StereoMode::Normal,
            stereo_dirty: false,
            opacity: 1.0,
        }
    }
}

impl SurfaceRendererComponent {
    /// Create a renderer with a mono surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set the stereo layout before attaching
    pub fn with_stereo_mode(mut self, mode: StereoMode) -> Self {
        self.stereo_mode = mode;
        self
    }

    /// Change the stereo layout; applied on the next update pass
    pub fn set_stereo_mode(&mut self, mode: StereoMode) {
        if self.stereo_mode != mode {
            self.stereo_mode = mode;
            self.stereo_dirty = true;
        }
    }

    /// Current stereo layout
    pub fn stereo_mode(&self) -> StereoMode {
        self.stereo_mode
    }

    /// Last effective opacity received
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Native surface, present while attached
    pub fn native_surface(&self) -> Option<NativeHandle> {
        self.surface
    }
}

impl Component for SurfaceRendererComponent {
    fn on_attach(&mut self, ctx: &mut ComponentContext<'_>) {
        let Some(entity) = ctx.native_handle() else {
            return;
        };
        let opacity = ctx.scene().effective_opacity(ctx.entity()).unwrap_or(1.0);

        let backend = ctx.backend_mut();
        let surface = backend.create_surface();
        backend.bind_surface(entity, Some(surface));
        backend.set_surface_stereo_mode(surface, self.stereo_mode);
        backend.set_surface_opacity(surface, opacity);

        self.surface = Some(surface);
        self.opacity = opacity;
        self.stereo_dirty = false;
    }

    fn on_detach(&mut self, ctx: &mut ComponentContext<'_>) {
        let Some(surface) = self.surface.take() else {
            return;
        };
        let entity = ctx.native_handle();
        let backend = ctx.backend_mut();
        if let Some(entity) = entity {
            backend.bind_surface(entity, None);
        }
        backend.release(surface);
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>, _frame: &FrameInput) {
        if !self.stereo_dirty {
            return;
        }
        if let Some(surface) = self.surface {
            ctx.backend_mut().set_surface_stereo_mode(surface, self.stereo_mode);
        }
        self.stereo_dirty = false;
    }

    fn opacity_changed(&mut self, opacity: f32, backend: &mut dyn NativeBackend) {
        self.opacity = opacity;
        if let Some(surface) = self.surface {
            backend.set_surface_opacity(surface, opacity);
        }
    }
}
