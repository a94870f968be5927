//! Boundary to the protocol/transport layer
//!
//! The transport feeds connections, disconnections and requests into the
//! compositor; the compositor answers through [`Transport`] with events
//! addressed to specific clients.

use log::debug;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::client::ClientId;
use crate::error::SessionError;
use crate::extensions::TouchExtensionFlags;
use crate::geometry::{Point, Rect};
use crate::input::InputEvent;
use crate::output::ScreenOrientation;
use crate::selection::MimeData;
use crate::surface::{BufferId, CallbackId, SurfaceId};

/// Protocol-level events the core sends to clients
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    FocusEnter {
        seat: String,
        surface: SurfaceId,
    },
    FocusLeave {
        seat: String,
        surface: SurfaceId,
    },
    Input {
        seat: String,
        surface: SurfaceId,
        event: InputEvent,
    },
    FrameDone {
        surface: SurfaceId,
        callback: CallbackId,
        time_ms: u32,
    },
    BufferReleased {
        surface: SurfaceId,
        buffer: BufferId,
    },
    DragEnter {
        seat: String,
        surface: SurfaceId,
        position: Point,
        mime_types: Vec<String>,
    },
    DragLeave {
        seat: String,
        surface: SurfaceId,
    },
    DragMotion {
        seat: String,
        surface: SurfaceId,
        position: Point,
        delta: (f64, f64),
    },
    DropPerformed {
        seat: String,
        surface: SurfaceId,
        mime_type: Option<String>,
        payload: MimeData,
    },
    /// Sent to the drag source once its drag is over
    DragFinished {
        seat: String,
        dropped: bool,
    },
    SelectionOffer {
        mime_types: Vec<String>,
    },
    SelectionCleared,
    OutputChanged {
        geometry: Rect,
        refresh_rate: i32,
        orientation: ScreenOrientation,
    },
    FullScreenHint {
        enabled: bool,
    },
    TouchExtensionConfigured {
        flags: TouchExtensionFlags,
    },
}

/// Protocol engine the compositor core plugs into
pub trait Transport: Send {
    /// Advertises a protocol global; failure means the capability is unavailable
    fn register_global(&mut self, name: &str, version: u32) -> Result<(), SessionError>;

    /// Queues an event for one client
    fn send(&mut self, client: ClientId, event: ClientEvent);

    /// Closes the connection of a client the compositor destroyed
    fn disconnect(&mut self, _client: ClientId) {}
}

/// Shared record of everything a [`RecordingTransport`] saw
#[derive(Debug, Clone, Default)]
pub struct TransportLog {
    events: Arc<Mutex<Vec<(ClientId, ClientEvent)>>>,
    globals: Arc<Mutex<Vec<String>>>,
    disconnected: Arc<Mutex<Vec<ClientId>>>,
}

impl TransportLog {
    pub fn events(&self) -> Vec<(ClientId, ClientEvent)> {
        self.events.lock().clone()
    }

    /// Drains and returns the recorded events
    pub fn take_events(&self) -> Vec<(ClientId, ClientEvent)> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn events_for(&self, client: ClientId) -> Vec<ClientEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(c, _)| *c == client)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn globals(&self) -> Vec<String> {
        self.globals.lock().clone()
    }

    pub fn disconnected(&self) -> Vec<ClientId> {
        self.disconnected.lock().clone()
    }
}

/// In-process transport that records instead of writing to sockets
#[derive(Debug, Default)]
pub struct RecordingTransport {
    log: TransportLog,
    unavailable: HashSet<String>,
    event_limit: Option<usize>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `register_global` fail for `name`
    pub fn with_unavailable_global(mut self, name: &str) -> Self {
        self.unavailable.insert(name.to_string());
        self
    }

    /// Keeps only the newest `limit` events, for long-running sessions
    pub fn with_event_limit(mut self, limit: usize) -> Self {
        self.event_limit = Some(limit);
        self
    }

    pub fn log(&self) -> TransportLog {
        self.log.clone()
    }
}

impl Transport for RecordingTransport {
    fn register_global(&mut self, name: &str, version: u32) -> Result<(), SessionError> {
        if self.unavailable.contains(name) {
            return Err(SessionError::transport(format!("global {} unavailable", name)));
        }
        debug!("🌐 Global {} v{} registered", name, version);
        self.log.globals.lock().push(name.to_string());
        Ok(())
    }

    fn send(&mut self, client: ClientId, event: ClientEvent) {
        let mut events = self.log.events.lock();
        events.push((client, event));
        if let Some(limit) = self.event_limit {
            if events.len() > limit {
                let excess = events.len() - limit;
                events.drain(..excess);
            }
        }
    }

    fn disconnect(&mut self, client: ClientId) {
        self.log.disconnected.lock().push(client);
    }
}
