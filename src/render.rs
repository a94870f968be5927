//! Render arbitration: the direct-render grant and frame hand-off
//!
//! The arbiter owns the render backend. It holds at most one direct-render
//! grant; a new grant revokes the previous one before it is installed, so
//! two surfaces never hold it at once. Surfaces that die are queued for
//! renderer-side cleanup until [`RenderArbiter::cleanup_graphics_resources`]
//! runs.

use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::SessionError;
use crate::surface::{BufferId, SurfaceId};

/// Graphics API family of a render context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsApi {
    #[default]
    OpenGl,
    OpenGlEs,
    Vulkan,
}

/// A client-provided context asking for direct rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext {
    pub id: u64,
    pub api: GraphicsApi,
    pub version: (u32, u32),
}

impl RenderContext {
    pub fn new(id: u64, api: GraphicsApi, version: (u32, u32)) -> Self {
        Self { id, api, version }
    }
}

/// Hardware path discovered by the backend at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareIntegration {
    pub name: String,
    pub api: GraphicsApi,
    pub min_version: (u32, u32),
}

impl HardwareIntegration {
    pub fn is_compatible(&self, context: &RenderContext) -> bool {
        context.api == self.api && context.version >= self.min_version
    }
}

/// One surface buffer placed in a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayer {
    pub surface: SurfaceId,
    pub buffer: BufferId,
}

/// Content of one composed frame
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameSnapshot {
    pub sequence: u64,
    /// Set when a surface bypasses composition for this frame
    pub direct: Option<SurfaceId>,
    pub layers: Vec<FrameLayer>,
}

impl FrameSnapshot {
    pub fn surfaces(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.layers.iter().map(|l| l.surface)
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Rendering backend the session core drives
pub trait RenderBackend: Send {
    fn name(&self) -> &str;

    /// Discovers the hardware path; failure leaves direct rendering unavailable
    fn initialize_hardware_integration(&mut self) -> Result<HardwareIntegration, SessionError>;

    /// Backend-specific veto on top of the API/version check
    fn is_context_compatible(&self, _context: &RenderContext) -> bool {
        true
    }

    fn grant_direct_render(
        &mut self,
        surface: SurfaceId,
        context: &RenderContext,
    ) -> Result<(), SessionError>;

    fn revoke_direct_render(&mut self, surface: SurfaceId);

    fn present(&mut self, frame: &FrameSnapshot) -> Result<(), SessionError>;

    /// Frees textures and other renderer-side state held for a dead surface
    fn release_surface_resources(&mut self, surface: SurfaceId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirectRenderGrant {
    surface: SurfaceId,
    context: RenderContext,
}

/// Arbitrates exclusive direct rendering and forwards frames to the backend
pub struct RenderArbiter {
    backend: Box<dyn RenderBackend>,
    hardware: Option<HardwareIntegration>,
    grant: Option<DirectRenderGrant>,
    pending_cleanup: Vec<SurfaceId>,
}

impl std::fmt::Debug for RenderArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderArbiter")
            .field("backend", &self.backend.name())
            .field("hardware", &self.hardware)
            .field("grant", &self.grant)
            .field("pending_cleanup", &self.pending_cleanup)
            .finish()
    }
}

impl RenderArbiter {
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        Self {
            backend,
            hardware: None,
            grant: None,
            pending_cleanup: Vec::new(),
        }
    }

    /// Runs backend hardware discovery; `false` when unavailable
    pub fn initialize_hardware_integration(&mut self) -> bool {
        match self.backend.initialize_hardware_integration() {
            Ok(hardware) => {
                info!(
                    "🖥️ Hardware integration '{}' ({:?} {}.{})",
                    hardware.name, hardware.api, hardware.min_version.0, hardware.min_version.1
                );
                self.hardware = Some(hardware);
                true
            }
            Err(e) => {
                warn!("⚠️ Hardware integration unavailable: {}", e);
                self.hardware = None;
                false
            }
        }
    }

    pub fn hardware_integration(&self) -> Option<&HardwareIntegration> {
        self.hardware.as_ref()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn direct_render_surface(&self) -> Option<SurfaceId> {
        self.grant.map(|g| g.surface)
    }

    pub fn direct_render_context(&self) -> Option<RenderContext> {
        self.grant.map(|g| g.context)
    }

    /// Requests the grant for `surface`, or clears it with `None`
    ///
    /// The caller has already checked that `surface` is alive. On `false`
    /// the previous grant is untouched.
    pub fn set_direct_render_surface(
        &mut self,
        surface: Option<SurfaceId>,
        context: RenderContext,
    ) -> bool {
        let Some(surface) = surface else {
            self.revoke();
            return true;
        };

        let compatible = self
            .hardware
            .as_ref()
            .map(|hw| hw.is_compatible(&context))
            .unwrap_or(false)
            && self.backend.is_context_compatible(&context);
        if !compatible {
            debug!("🚫 Direct render for {} refused: incompatible context", surface);
            return false;
        }

        let previous = self.grant;
        self.revoke();

        match self.backend.grant_direct_render(surface, &context) {
            Ok(()) => {
                info!("🎮 Direct render granted to {}", surface);
                self.grant = Some(DirectRenderGrant { surface, context });
                true
            }
            Err(e) => {
                warn!("⚠️ Backend refused direct render for {}: {}", surface, e);
                if let Some(old) = previous {
                    if self.backend.grant_direct_render(old.surface, &old.context).is_ok() {
                        self.grant = Some(old);
                    }
                }
                false
            }
        }
    }

    fn revoke(&mut self) {
        if let Some(old) = self.grant.take() {
            self.backend.revoke_direct_render(old.surface);
            debug!("Direct render revoked from {}", old.surface);
        }
    }

    /// Drops the grant if `surface` held it and queues its resources for cleanup
    pub fn surface_destroyed(&mut self, surface: SurfaceId) -> bool {
        let held_grant = self.direct_render_surface() == Some(surface);
        if held_grant {
            self.revoke();
        }
        self.pending_cleanup.push(surface);
        held_grant
    }

    pub fn pending_cleanup_count(&self) -> usize {
        self.pending_cleanup.len()
    }

    /// Releases renderer resources of destroyed surfaces; returns how many
    pub fn cleanup_graphics_resources(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_cleanup);
        for surface in &pending {
            self.backend.release_surface_resources(*surface);
        }
        if !pending.is_empty() {
            debug!("🧹 Released graphics resources of {} surface(s)", pending.len());
        }
        pending.len()
    }

    pub fn present(&mut self, frame: &FrameSnapshot) -> Result<(), SessionError> {
        self.backend.present(frame)
    }
}

/// Calls observed by [`HeadlessBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Granted(SurfaceId),
    Revoked(SurfaceId),
    Presented { sequence: u64, layers: usize },
    Released(SurfaceId),
}

/// Shared view of a headless backend's call log
pub type BackendLog = Arc<Mutex<Vec<BackendCall>>>;

/// Backend without a GPU; presentation is immediate
#[derive(Debug)]
pub struct HeadlessBackend {
    api: GraphicsApi,
    hardware: bool,
    log: BackendLog,
}

impl HeadlessBackend {
    pub fn new(api: GraphicsApi, hardware: bool) -> Self {
        Self {
            api,
            hardware,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn log(&self) -> BackendLog {
        Arc::clone(&self.log)
    }
}

impl RenderBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn initialize_hardware_integration(&mut self) -> Result<HardwareIntegration, SessionError> {
        if !self.hardware {
            return Err(SessionError::CapabilityUnavailable("hardware integration"));
        }
        Ok(HardwareIntegration {
            name: "headless".to_string(),
            api: self.api,
            min_version: (2, 0),
        })
    }

    fn grant_direct_render(
        &mut self,
        surface: SurfaceId,
        _context: &RenderContext,
    ) -> Result<(), SessionError> {
        self.log.lock().push(BackendCall::Granted(surface));
        Ok(())
    }

    fn revoke_direct_render(&mut self, surface: SurfaceId) {
        self.log.lock().push(BackendCall::Revoked(surface));
    }

    fn present(&mut self, frame: &FrameSnapshot) -> Result<(), SessionError> {
        self.log.lock().push(BackendCall::Presented {
            sequence: frame.sequence,
            layers: frame.layers.len(),
        });
        Ok(())
    }

    fn release_surface_resources(&mut self, surface: SurfaceId) {
        self.log.lock().push(BackendCall::Released(surface));
    }
}
