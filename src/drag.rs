//! Drag-and-drop sessions
//!
//! One controller lives on each input device. The lifecycle is
//! `Idle -> Active -> {Dropped | Cancelled} -> Idle`: the terminal state is
//! reported by [`DragController::end`] and kept as the last outcome, while
//! the controller itself is immediately ready for the next drag.

use log::{debug, info, warn};

use crate::client::ClientId;
use crate::error::DragError;
use crate::geometry::Point;
use crate::selection::MimeData;
use crate::surface::SurfaceId;

/// Drag and drop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    /// No drag operation in progress
    Idle,
    /// Drag started, moving
    Active,
    /// Ended after a drop request
    Dropped,
    /// Ended without a drop, or the origin went away
    Cancelled,
}

/// How a drag session ended
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    Dropped {
        origin_client: ClientId,
        target: Option<SurfaceId>,
        mime_type: Option<String>,
        /// Payload handed to the drop target
        payload: MimeData,
    },
    Cancelled {
        origin_client: ClientId,
    },
}

impl DragOutcome {
    pub fn state(&self) -> DragState {
        match self {
            DragOutcome::Dropped { .. } => DragState::Dropped,
            DragOutcome::Cancelled { .. } => DragState::Cancelled,
        }
    }
}

/// Hover change produced by a drag motion
#[derive(Debug, Clone, PartialEq)]
pub struct DragMotion {
    pub left: Option<SurfaceId>,
    pub entered: Option<SurfaceId>,
    pub target: Option<SurfaceId>,
    pub global: Point,
    pub local: Point,
    /// Local movement since the previous motion over the same target
    pub delta: (f64, f64),
}

#[derive(Debug)]
struct DragSession {
    origin: SurfaceId,
    origin_client: ClientId,
    payload: MimeData,
    target: Option<SurfaceId>,
    accepted_mime_type: Option<String>,
    global: Point,
    local: Point,
    drop_requested: bool,
}

/// Drag controller for one input device
#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
    last_outcome: Option<DragState>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        if self.session.is_some() {
            DragState::Active
        } else {
            DragState::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Terminal state of the most recent session, if any has ended
    pub fn last_outcome(&self) -> Option<DragState> {
        self.last_outcome
    }

    pub fn origin(&self) -> Option<SurfaceId> {
        self.session.as_ref().map(|s| s.origin)
    }

    pub fn target(&self) -> Option<SurfaceId> {
        self.session.as_ref().and_then(|s| s.target)
    }

    pub fn payload(&self) -> Option<&MimeData> {
        self.session.as_ref().map(|s| &s.payload)
    }

    pub fn position(&self) -> Option<Point> {
        self.session.as_ref().map(|s| s.global)
    }

    /// Starts a drag from `origin`
    pub fn start(
        &mut self,
        origin: SurfaceId,
        origin_client: ClientId,
        payload: MimeData,
        position: Point,
    ) -> Result<(), DragError> {
        if self.session.is_some() {
            warn!("🚫 Drag start from {} rejected: already dragging", origin);
            return Err(DragError::AlreadyDragging);
        }

        info!(
            "🖱️ Drag started from {} with types {:?}",
            origin,
            payload.mime_types()
        );
        self.session = Some(DragSession {
            origin,
            origin_client,
            payload,
            target: None,
            accepted_mime_type: None,
            global: position,
            local: Point::default(),
            drop_requested: false,
        });
        Ok(())
    }

    /// Moves the drag; `None` when no drag is active
    pub fn update(
        &mut self,
        global: Point,
        local: Point,
        target: Option<SurfaceId>,
    ) -> Option<DragMotion> {
        let session = self.session.as_mut()?;

        let previous = session.target;
        let (left, entered, delta) = if previous == target {
            (None, None, local.delta_from(session.local))
        } else {
            // A new target invalidates whatever the previous one accepted
            session.accepted_mime_type = None;
            (previous, target, (0.0, 0.0))
        };

        session.target = target;
        session.global = global;
        session.local = local;

        Some(DragMotion {
            left,
            entered,
            target,
            global,
            local,
            delta,
        })
    }

    /// Records the MIME type the current target is willing to take
    pub fn accept(&mut self, mime_type: Option<String>) -> Result<(), DragError> {
        let session = self.session.as_mut().ok_or(DragError::NotDragging)?;
        debug!("🎯 Drag target accepts {:?}", mime_type);
        session.accepted_mime_type = mime_type;
        Ok(())
    }

    /// Marks that a drop was requested; applied when the drag ends
    pub fn request_drop(&mut self) -> Result<(), DragError> {
        let session = self.session.as_mut().ok_or(DragError::NotDragging)?;
        session.drop_requested = true;
        Ok(())
    }

    /// Ends the drag; `None` when nothing was active
    pub fn end(&mut self) -> Option<DragOutcome> {
        let session = self.session.take()?;

        let outcome = if session.drop_requested {
            info!("📦 Drop on {:?}", session.target);
            DragOutcome::Dropped {
                origin_client: session.origin_client,
                target: session.target,
                mime_type: session.accepted_mime_type,
                payload: session.payload,
            }
        } else {
            info!("🚫 Drag from {} cancelled", session.origin);
            DragOutcome::Cancelled {
                origin_client: session.origin_client,
            }
        };

        self.last_outcome = Some(outcome.state());
        Some(outcome)
    }

    /// Drops references to a destroyed surface
    ///
    /// Losing the origin cancels the drag; losing the hover target only
    /// clears it. Returns the outcome when the drag was cancelled.
    pub fn surface_destroyed(&mut self, surface: SurfaceId) -> Option<DragOutcome> {
        let session = self.session.as_mut()?;

        if session.origin == surface {
            session.drop_requested = false;
            return self.end();
        }
        if session.target == Some(surface) {
            session.target = None;
            session.accepted_mime_type = None;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> MimeData {
        let mut data = MimeData::new();
        data.insert("text/plain", b"drag me".to_vec());
        data
    }

    fn ids() -> (SurfaceId, SurfaceId, ClientId) {
        (
            SurfaceId::from_raw(1),
            SurfaceId::from_raw(2),
            ClientId::from_raw(1),
        )
    }

    #[test]
    fn test_second_start_rejected() {
        let (origin, _, client) = ids();
        let mut drag = DragController::new();
        drag.start(origin, client, payload(), Point::default()).unwrap();
        assert_eq!(
            drag.start(origin, client, payload(), Point::default()),
            Err(DragError::AlreadyDragging)
        );
        assert_eq!(drag.state(), DragState::Active);
    }

    #[test]
    fn test_end_without_drop_cancels() {
        let (origin, _, client) = ids();
        let mut drag = DragController::new();
        drag.start(origin, client, payload(), Point::default()).unwrap();

        let outcome = drag.end().unwrap();
        assert_eq!(outcome.state(), DragState::Cancelled);
        assert_eq!(drag.last_outcome(), Some(DragState::Cancelled));
        assert_eq!(drag.state(), DragState::Idle);
        assert!(drag.end().is_none());
    }

    #[test]
    fn test_drop_delivers_payload() {
        let (origin, target, client) = ids();
        let mut drag = DragController::new();
        drag.start(origin, client, payload(), Point::default()).unwrap();
        drag.update(Point::new(5.0, 5.0), Point::new(1.0, 1.0), Some(target));
        drag.accept(Some("text/plain".into())).unwrap();
        drag.request_drop().unwrap();

        match drag.end().unwrap() {
            DragOutcome::Dropped {
                target: t,
                mime_type,
                payload,
                ..
            } => {
                assert_eq!(t, Some(target));
                assert_eq!(mime_type.as_deref(), Some("text/plain"));
                assert_eq!(payload.data("text/plain"), Some(&b"drag me"[..]));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn test_motion_reports_enter_leave_and_delta() {
        let (origin, target, client) = ids();
        let mut drag = DragController::new();
        drag.start(origin, client, payload(), Point::default()).unwrap();

        let m = drag
            .update(Point::new(10.0, 10.0), Point::new(2.0, 3.0), Some(target))
            .unwrap();
        assert_eq!(m.entered, Some(target));
        assert_eq!(m.left, None);

        let m = drag
            .update(Point::new(12.0, 11.0), Point::new(4.0, 4.0), Some(target))
            .unwrap();
        assert_eq!(m.entered, None);
        assert_eq!(m.delta, (2.0, 1.0));

        let m = drag
            .update(Point::new(50.0, 50.0), Point::new(0.0, 0.0), None)
            .unwrap();
        assert_eq!(m.left, Some(target));
        assert_eq!(drag.target(), None);
    }

    #[test]
    fn test_update_when_idle_is_ignored() {
        let mut drag = DragController::new();
        assert!(drag.update(Point::default(), Point::default(), None).is_none());
        assert_eq!(drag.request_drop(), Err(DragError::NotDragging));
    }

    #[test]
    fn test_origin_destroyed_cancels_even_after_drop_request() {
        let (origin, target, client) = ids();
        let mut drag = DragController::new();
        drag.start(origin, client, payload(), Point::default()).unwrap();
        drag.update(Point::default(), Point::default(), Some(target));
        drag.request_drop().unwrap();

        assert!(drag.surface_destroyed(target).is_none());
        assert_eq!(drag.target(), None);

        let outcome = drag.surface_destroyed(origin).unwrap();
        assert_eq!(outcome.state(), DragState::Cancelled);
        assert!(!drag.is_active());
    }
}
