//! Per-client surfaces: buffer attachment, ordered commits and frame callbacks
//!
//! A surface double-buffers its state. `attach` and frame callback requests
//! land in the pending state; `commit` applies them atomically and stamps
//! them with a serial. Frame callbacks are only released once the commit
//! that carried them has been composed into a presented frame, which is the
//! back-pressure clients rely on to avoid queuing buffers without bound.

use log::{debug, trace};
use std::fmt;

use crate::client::ClientId;

/// Identifier of a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Transport-assigned identifier of a client buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// Transport-assigned identifier of a frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(pub u64);

/// A client buffer as far as the session core cares about it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buffer {
    pub id: BufferId,
    pub width: i32,
    pub height: i32,
}

impl Buffer {
    pub fn new(id: u64, width: i32, height: i32) -> Self {
        Self {
            id: BufferId(id),
            width,
            height,
        }
    }
}

#[derive(Debug, Default)]
struct PendingState {
    /// `Some(None)` is an explicit null attach, which unmaps on commit
    buffer: Option<Option<Buffer>>,
    frame_callbacks: Vec<CallbackId>,
}

/// Result of applying the pending state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub serial: u64,
    /// Buffer superseded by this commit, to be handed back to the client
    pub released: Option<BufferId>,
    /// Mapped state changed with this commit
    pub mapped_changed: bool,
}

/// A drawable surface owned by exactly one client
#[derive(Debug)]
pub struct Surface {
    id: SurfaceId,
    client: ClientId,
    pending: PendingState,
    current: Option<Buffer>,
    commit_serial: u64,
    presented_serial: u64,
    waiting_callbacks: Vec<(u64, CallbackId)>,
}

impl Surface {
    pub(crate) fn new(id: SurfaceId, client: ClientId) -> Self {
        Self {
            id,
            client,
            pending: PendingState::default(),
            current: None,
            commit_serial: 0,
            presented_serial: 0,
            waiting_callbacks: Vec::new(),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Owning client
    pub fn client(&self) -> ClientId {
        self.client
    }

    /// A surface is mapped once a committed state carries a buffer
    pub fn is_mapped(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_buffer(&self) -> Option<Buffer> {
        self.current
    }

    pub fn commit_serial(&self) -> u64 {
        self.commit_serial
    }

    pub fn presented_serial(&self) -> u64 {
        self.presented_serial
    }

    /// Committed content that has not made it into a frame yet
    pub fn has_unpresented_commit(&self) -> bool {
        self.commit_serial > self.presented_serial
    }

    pub fn pending_callback_count(&self) -> usize {
        self.waiting_callbacks.len() + self.pending.frame_callbacks.len()
    }

    /// Attaches a buffer (or `None` to unmap) to the pending state
    pub fn attach(&mut self, buffer: Option<Buffer>) {
        trace!("Surface {} attach {:?}", self.id, buffer.map(|b| b.id));
        self.pending.buffer = Some(buffer);
    }

    /// Queues a frame callback on the pending state
    pub fn request_frame_callback(&mut self, callback: CallbackId) {
        self.pending.frame_callbacks.push(callback);
    }

    /// Applies the pending state
    pub fn commit(&mut self) -> CommitOutcome {
        self.commit_serial += 1;
        let serial = self.commit_serial;
        let was_mapped = self.is_mapped();
        let mut released = None;

        if let Some(buffer) = self.pending.buffer.take() {
            if let Some(old) = self.current {
                if buffer.map(|b| b.id) != Some(old.id) {
                    released = Some(old.id);
                }
            }
            self.current = buffer;
        }

        for callback in self.pending.frame_callbacks.drain(..) {
            self.waiting_callbacks.push((serial, callback));
        }

        debug!(
            "📥 Surface {} commit #{} (mapped: {})",
            self.id,
            serial,
            self.is_mapped()
        );

        CommitOutcome {
            serial,
            released,
            mapped_changed: was_mapped != self.is_mapped(),
        }
    }

    /// Records that the latest committed state was composed into a frame
    pub(crate) fn mark_presented(&mut self) {
        self.presented_serial = self.commit_serial;
    }

    /// Removes and returns callbacks whose commit has been presented
    pub(crate) fn take_finished_callbacks(&mut self) -> Vec<CallbackId> {
        let presented = self.presented_serial;
        let mut finished = Vec::new();
        self.waiting_callbacks.retain(|(serial, callback)| {
            if *serial <= presented {
                finished.push(*callback);
                false
            } else {
                true
            }
        });
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> Surface {
        Surface::new(SurfaceId::from_raw(1), ClientId::from_raw(1))
    }

    #[test]
    fn test_commit_maps_and_unmaps() {
        let mut s = surface();
        assert!(!s.is_mapped());

        s.attach(Some(Buffer::new(1, 64, 64)));
        let outcome = s.commit();
        assert!(s.is_mapped());
        assert!(outcome.mapped_changed);

        s.attach(None);
        let outcome = s.commit();
        assert!(!s.is_mapped());
        assert!(outcome.mapped_changed);
        assert_eq!(outcome.released, Some(BufferId(1)));
    }

    #[test]
    fn test_newer_buffer_releases_older() {
        let mut s = surface();
        s.attach(Some(Buffer::new(1, 64, 64)));
        s.commit();
        s.attach(Some(Buffer::new(2, 64, 64)));
        let outcome = s.commit();
        assert_eq!(outcome.released, Some(BufferId(1)));
        assert_eq!(s.current_buffer().map(|b| b.id), Some(BufferId(2)));
        assert!(!outcome.mapped_changed);
    }

    #[test]
    fn test_commit_without_attach_keeps_buffer() {
        let mut s = surface();
        s.attach(Some(Buffer::new(7, 10, 10)));
        s.commit();
        let outcome = s.commit();
        assert_eq!(outcome.released, None);
        assert_eq!(s.current_buffer().map(|b| b.id), Some(BufferId(7)));
    }

    #[test]
    fn test_callbacks_wait_for_presentation() {
        let mut s = surface();
        s.attach(Some(Buffer::new(1, 10, 10)));
        s.request_frame_callback(CallbackId(100));
        s.commit();

        assert!(s.take_finished_callbacks().is_empty());

        s.mark_presented();
        assert_eq!(s.take_finished_callbacks(), vec![CallbackId(100)]);
        assert!(s.take_finished_callbacks().is_empty());
    }

    #[test]
    fn test_later_commit_callbacks_not_released_early() {
        let mut s = surface();
        s.attach(Some(Buffer::new(1, 10, 10)));
        s.request_frame_callback(CallbackId(1));
        s.commit();
        s.mark_presented();

        s.attach(Some(Buffer::new(2, 10, 10)));
        s.request_frame_callback(CallbackId(2));
        s.commit();

        assert_eq!(s.take_finished_callbacks(), vec![CallbackId(1)]);
        assert!(s.has_unpresented_commit());
        assert_eq!(s.pending_callback_count(), 1);
    }
}
