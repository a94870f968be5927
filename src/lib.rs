//! # wlsession
//!
//! Session core of a display-server compositor: the part that sits between
//! a protocol transport and a render backend and keeps track of who is
//! connected, what they have on screen, and who gets input.
//!
//! ## Architecture
//!
//! - `compositor`: The session core owning every other component
//! - `client`: Client registry and surface ownership
//! - `surface`: Per-surface buffer, commit and frame-callback state
//! - `input`: Input devices, focus routing and cursors
//! - `drag`: Drag-and-drop state machine
//! - `selection`: Clipboard selection and retention
//! - `output`: Output geometry, refresh rate and orientation
//! - `render`: Direct-render arbitration and render backends
//! - `transport`: Event sink towards clients
//! - `extensions`: Optional protocol extensions
//! - `runtime`: Async driver and cross-task handle
//! - `config`: Configuration parsing and management
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wlsession::render::{GraphicsApi, HeadlessBackend};
//! use wlsession::transport::RecordingTransport;
//! use wlsession::{runtime, Compositor, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let compositor = Compositor::new(
//!         SessionConfig::default(),
//!         None,
//!         Box::new(RecordingTransport::new()),
//!         Box::new(HeadlessBackend::new(GraphicsApi::OpenGl, true)),
//!     );
//!     let (handle, rx) = runtime::channel();
//!     let session = tokio::spawn(runtime::run(compositor, rx, None));
//!     handle.shutdown().ok();
//!     session.await.ok();
//! }
//! ```

pub mod client;
pub mod compositor;
pub mod config;
pub mod desktop;
pub mod drag;
pub mod error;
pub mod extensions;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod output;
pub mod render;
pub mod runtime;
pub mod selection;
pub mod surface;
pub mod transport;

// Re-export main types for easy access
pub use client::{ClientConnection, ClientId};
pub use compositor::{Compositor, CompositorObserver, InitReport};
pub use config::SessionConfig;
pub use error::{DragError, Result, SessionError};
pub use surface::SurfaceId;

/// Version information for wlsession
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
