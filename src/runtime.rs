//! Async session driver
//!
//! The compositor core is single-threaded. [`run`] owns it on one task and
//! applies [`SessionCommand`]s from other tasks in arrival order, between
//! frames paced by the output refresh rate.

use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Interval, MissedTickBehavior};

use crate::client::{ClientConnection, ClientId};
use crate::compositor::Compositor;
use crate::error::{Result, SessionError};
use crate::input::InputEvent;

type Job = Box<dyn FnOnce(&mut Compositor) + Send>;

/// Work handed to the session task
pub enum SessionCommand {
    RegisterClient {
        connection: ClientConnection,
        reply: oneshot::Sender<ClientId>,
    },
    ClientDisconnected(ClientId),
    Input {
        seat: String,
        event: InputEvent,
    },
    /// Arbitrary work run against the compositor on the session task
    Exec(Job),
    Shutdown,
}

impl std::fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegisterClient { connection, .. } => f
                .debug_struct("RegisterClient")
                .field("connection", connection)
                .finish(),
            Self::ClientDisconnected(client) => f.debug_tuple("ClientDisconnected").field(client).finish(),
            Self::Input { seat, event } => f
                .debug_struct("Input")
                .field("seat", seat)
                .field("event", event)
                .finish(),
            Self::Exec(_) => f.write_str("Exec"),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Cloneable sender side of a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionCommand>,
}

/// Creates a handle and the receiver to pass to [`run`]
pub fn channel() -> (SessionHandle, mpsc::UnboundedReceiver<SessionCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SessionHandle { tx }, rx)
}

impl SessionHandle {
    fn submit(&self, command: SessionCommand) -> Result<()> {
        self.tx.send(command).map_err(|_| SessionError::SessionStopped)
    }

    pub async fn register_client(&self, connection: ClientConnection) -> Result<ClientId> {
        let (reply, rx) = oneshot::channel();
        self.submit(SessionCommand::RegisterClient { connection, reply })?;
        rx.await.map_err(|_| SessionError::SessionStopped)
    }

    pub fn client_disconnected(&self, client: ClientId) -> Result<()> {
        self.submit(SessionCommand::ClientDisconnected(client))
    }

    pub fn send_input_event(&self, seat: impl Into<String>, event: InputEvent) -> Result<()> {
        self.submit(SessionCommand::Input {
            seat: seat.into(),
            event,
        })
    }

    /// Runs `f` on the session task and returns its result
    pub async fn with<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Compositor) -> R + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.submit(SessionCommand::Exec(Box::new(move |compositor| {
            let _ = reply.send(f(compositor));
        })))?;
        rx.await.map_err(|_| SessionError::SessionStopped)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.submit(SessionCommand::Shutdown)
    }
}

fn dispatch(compositor: &mut Compositor, command: SessionCommand) {
    match command {
        SessionCommand::RegisterClient { connection, reply } => {
            let client = compositor.register_client(connection);
            // Receiver may have given up; the client stays registered
            let _ = reply.send(client);
        }
        SessionCommand::ClientDisconnected(client) => compositor.client_disconnected(client),
        SessionCommand::Input { seat, event } => {
            compositor.send_input_event(&seat, event);
        }
        SessionCommand::Exec(job) => job(compositor),
        SessionCommand::Shutdown => {}
    }
}

fn frame_ticker(compositor: &Compositor) -> Option<Interval> {
    compositor.output().refresh_interval().map(|period| {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    })
}

async fn next_frame(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Drives the session until shutdown and hands the compositor back
///
/// Each frame tick presents, retires frame callbacks on success and
/// releases graphics resources of surfaces destroyed since the last tick.
/// Stops on [`SessionCommand::Shutdown`], when every handle is dropped, or
/// after `max_frames` frames. A non-positive refresh rate stops frame
/// pacing until the rate changes.
pub async fn run(
    mut compositor: Compositor,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    max_frames: Option<u64>,
) -> Compositor {
    info!("🎬 Starting session event loop");

    let mut refresh_rate = compositor.output_refresh_rate();
    let mut ticker = frame_ticker(&compositor);
    let mut frames: u64 = 0;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(SessionCommand::Shutdown) => {
                    info!("📨 Shutdown requested");
                    break;
                }
                Some(command) => dispatch(&mut compositor, command),
                None => {
                    debug!("All session handles dropped");
                    break;
                }
            },
            _ = next_frame(&mut ticker) => {
                match compositor.present_frame() {
                    Ok(frame) => {
                        debug!("🎨 Presented frame {} ({} layers)", frame.sequence, frame.layers.len());
                        compositor.frame_finished(None);
                    }
                    // Callbacks stay queued until a frame actually reaches the screen
                    Err(e) => warn!("⚠️ Frame presentation failed: {}", e),
                }
                compositor.cleanup_graphics_resources();

                frames += 1;
                if max_frames.map_or(false, |max| frames >= max) {
                    info!("🏁 Reached frame limit ({})", frames);
                    break;
                }
            }
        }

        if compositor.output_refresh_rate() != refresh_rate {
            refresh_rate = compositor.output_refresh_rate();
            ticker = frame_ticker(&compositor);
        }
    }

    info!("🛑 Session event loop finished after {} frames", frames);
    compositor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::render::{GraphicsApi, HeadlessBackend};
    use crate::transport::RecordingTransport;

    fn compositor(refresh_rate: i32) -> Compositor {
        let mut config = SessionConfig::default();
        config.output.refresh_rate = refresh_rate;
        Compositor::new(
            config,
            None,
            Box::new(RecordingTransport::new()),
            Box::new(HeadlessBackend::new(GraphicsApi::OpenGl, true)),
        )
    }

    #[tokio::test]
    async fn test_commands_apply_in_order() {
        let (handle, rx) = channel();
        let session = tokio::spawn(run(compositor(0), rx, None));

        let client = handle.register_client(ClientConnection::default()).await.unwrap();
        let surface = handle
            .with(move |c| c.create_surface(client))
            .await
            .unwrap();
        assert!(surface.is_some());

        handle.client_disconnected(client).unwrap();
        let count = handle.with(|c| c.client_count()).await.unwrap();
        assert_eq!(count, 0);

        handle.shutdown().unwrap();
        let compositor = session.await.unwrap();
        assert_eq!(compositor.surface_count(), 0);
    }

    #[tokio::test]
    async fn test_frame_limit_stops_loop() {
        let (_handle, rx) = channel();
        let compositor = run(compositor(1000), rx, Some(3)).await;
        assert_eq!(compositor.frame_sequence(), 3);
    }

    #[tokio::test]
    async fn test_handle_after_stop_errors() {
        let (handle, rx) = channel();
        drop(rx);
        assert_eq!(handle.shutdown(), Err(SessionError::SessionStopped));
    }
}
