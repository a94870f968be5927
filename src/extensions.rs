//! Optional protocol extensions: window manager, sub-surfaces, touch
//!
//! Each extension becomes available once its global has been registered
//! with the transport. Registration failures leave the extension off.

use bitflags::bitflags;
use log::{info, warn};

use crate::transport::Transport;

pub const WINDOW_MANAGER_GLOBAL: &str = "wl_windowmanager_ext";
pub const SUB_SURFACE_GLOBAL: &str = "wl_subcompositor";
pub const TOUCH_EXTENSION_GLOBAL: &str = "wl_touch_extension";
pub const SEAT_GLOBAL: &str = "wl_seat";

bitflags! {
    /// Behaviour switches for the touch extension
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TouchExtensionFlags: u32 {
        /// Clients synthesize mouse events from touch input
        const MOUSE_FROM_TOUCH = 0x01;
    }
}

#[derive(Debug, Default)]
pub struct Extensions {
    window_manager: bool,
    sub_surface: bool,
    touch: bool,
    touch_flags: TouchExtensionFlags,
    client_full_screen_hint: bool,
}

fn register(transport: &mut dyn Transport, global: &str, version: u32) -> bool {
    match transport.register_global(global, version) {
        Ok(()) => {
            info!("🧩 Extension {} available", global);
            true
        }
        Err(e) => {
            warn!("⚠️ Extension {} unavailable: {}", global, e);
            false
        }
    }
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize_window_manager(&mut self, transport: &mut dyn Transport) -> bool {
        if !self.window_manager {
            self.window_manager = register(transport, WINDOW_MANAGER_GLOBAL, 1);
        }
        self.window_manager
    }

    pub fn enable_sub_surface(&mut self, transport: &mut dyn Transport) -> bool {
        if !self.sub_surface {
            self.sub_surface = register(transport, SUB_SURFACE_GLOBAL, 1);
        }
        self.sub_surface
    }

    pub fn enable_touch(&mut self, transport: &mut dyn Transport) -> bool {
        if !self.touch {
            self.touch = register(transport, TOUCH_EXTENSION_GLOBAL, 1);
        }
        self.touch
    }

    pub fn has_window_manager(&self) -> bool {
        self.window_manager
    }

    pub fn has_sub_surface(&self) -> bool {
        self.sub_surface
    }

    pub fn has_touch(&self) -> bool {
        self.touch
    }

    pub fn touch_flags(&self) -> TouchExtensionFlags {
        self.touch_flags
    }

    /// Returns true if the flags changed
    pub fn configure_touch(&mut self, flags: TouchExtensionFlags) -> bool {
        let changed = self.touch_flags != flags;
        self.touch_flags = flags;
        changed
    }

    pub fn client_full_screen_hint(&self) -> bool {
        self.client_full_screen_hint
    }

    /// Returns true if the hint changed
    pub fn set_client_full_screen_hint(&mut self, value: bool) -> bool {
        let changed = self.client_full_screen_hint != value;
        self.client_full_screen_hint = value;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingTransport;

    #[test]
    fn test_failed_registration_leaves_extension_off() {
        let mut transport = RecordingTransport::new().with_unavailable_global(WINDOW_MANAGER_GLOBAL);
        let mut ext = Extensions::new();
        assert!(!ext.initialize_window_manager(&mut transport));
        assert!(!ext.has_window_manager());
        assert!(ext.enable_sub_surface(&mut transport));
    }

    #[test]
    fn test_enable_is_idempotent() {
        let mut transport = RecordingTransport::new();
        let log = transport.log();
        let mut ext = Extensions::new();
        ext.enable_touch(&mut transport);
        ext.enable_touch(&mut transport);
        assert_eq!(log.globals(), vec![TOUCH_EXTENSION_GLOBAL.to_string()]);
    }

    #[test]
    fn test_touch_flags_and_hint() {
        let mut ext = Extensions::new();
        assert!(ext.configure_touch(TouchExtensionFlags::MOUSE_FROM_TOUCH));
        assert!(!ext.configure_touch(TouchExtensionFlags::MOUSE_FROM_TOUCH));
        assert!(ext.set_client_full_screen_hint(true));
        assert!(ext.client_full_screen_hint());
    }
}
