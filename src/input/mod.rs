//! Input devices and focus routing
//!
//! Each logical seat is an [`InputDevice`] that tracks pointer and touch
//! coordinates, a single focused surface and its own drag controller.
//! Events are routed to the focused surface only; without focus they are
//! dropped on the spot, never queued for a later focus.

use log::{debug, info, trace};
use std::collections::HashMap;

use crate::drag::{DragController, DragOutcome};
use crate::geometry::Point;
use crate::surface::SurfaceId;

/// Represents different types of input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer moved to an absolute position
    PointerMotion { position: Point, time: u32 },
    /// Mouse button press/release
    PointerButton {
        button: MouseButton,
        pressed: bool,
        time: u32,
    },
    /// Scroll wheel/trackpad scrolling
    Axis {
        horizontal: f64,
        vertical: f64,
        time: u32,
    },
    /// Keyboard key press/release
    Key {
        keycode: u32,
        pressed: bool,
        time: u32,
    },
    TouchDown { id: i32, position: Point, time: u32 },
    TouchMotion { id: i32, position: Point, time: u32 },
    TouchUp { id: i32, time: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u32),
}

/// An event on its way to a specific surface
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedEvent {
    pub surface: SurfaceId,
    pub event: InputEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Unfocused,
    FocusedOn(SurfaceId),
}

/// Focus transition produced by [`InputDevice::set_focus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusChange {
    pub previous: Option<SurfaceId>,
    pub current: Option<SurfaceId>,
}

/// Cursor image supplied by a client surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorImage {
    pub surface: SurfaceId,
    pub hotspot_x: i32,
    pub hotspot_y: i32,
}

/// References a device dropped when a surface was destroyed
#[derive(Debug, Default)]
pub struct DeviceInvalidation {
    pub focus_cleared: bool,
    pub cursor_cleared: bool,
    pub drag_outcome: Option<DragOutcome>,
}

/// Pointer, keyboard and touch state of one seat
#[derive(Debug)]
pub struct InputDevice {
    seat: String,
    focus: Option<SurfaceId>,
    pointer: Point,
    touch_points: HashMap<i32, Point>,
    drag: DragController,
    cursor: Option<CursorImage>,
    dropped_events: u64,
}

impl InputDevice {
    pub fn new(seat: impl Into<String>) -> Self {
        Self {
            seat: seat.into(),
            focus: None,
            pointer: Point::default(),
            touch_points: HashMap::new(),
            drag: DragController::new(),
            cursor: None,
            dropped_events: 0,
        }
    }

    pub fn seat(&self) -> &str {
        &self.seat
    }

    pub fn focus_state(&self) -> FocusState {
        match self.focus {
            Some(surface) => FocusState::FocusedOn(surface),
            None => FocusState::Unfocused,
        }
    }

    pub fn focused_surface(&self) -> Option<SurfaceId> {
        self.focus
    }

    /// Moves focus; `None` when it already pointed there
    pub fn set_focus(&mut self, surface: Option<SurfaceId>) -> Option<FocusChange> {
        if self.focus == surface {
            return None;
        }
        let change = FocusChange {
            previous: self.focus,
            current: surface,
        };
        debug!("🎯 Seat {} focus {:?} -> {:?}", self.seat, change.previous, surface);
        self.focus = surface;
        Some(change)
    }

    pub fn pointer_position(&self) -> Point {
        self.pointer
    }

    pub fn touch_point(&self, id: i32) -> Option<Point> {
        self.touch_points.get(&id).copied()
    }

    pub fn active_touch_count(&self) -> usize {
        self.touch_points.len()
    }

    /// Events dropped for lack of focus
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    /// Updates device state from `event` and addresses it to the focus
    pub fn route(&mut self, event: InputEvent) -> Option<RoutedEvent> {
        match &event {
            InputEvent::PointerMotion { position, .. } => self.pointer = *position,
            InputEvent::TouchDown { id, position, .. }
            | InputEvent::TouchMotion { id, position, .. } => {
                self.touch_points.insert(*id, *position);
            }
            InputEvent::TouchUp { id, .. } => {
                self.touch_points.remove(id);
            }
            InputEvent::PointerButton { .. } | InputEvent::Axis { .. } | InputEvent::Key { .. } => {}
        }

        match self.focus {
            Some(surface) => Some(RoutedEvent { surface, event }),
            None => {
                self.dropped_events += 1;
                trace!("Seat {} dropped {:?}: no focus", self.seat, event);
                None
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn drag_mut(&mut self) -> &mut DragController {
        &mut self.drag
    }

    pub fn cursor(&self) -> Option<CursorImage> {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: Option<CursorImage>) {
        self.cursor = cursor;
    }

    /// Drops every reference this device holds to `surface`
    pub fn surface_destroyed(&mut self, surface: SurfaceId) -> DeviceInvalidation {
        let mut invalidation = DeviceInvalidation::default();

        if self.focus == Some(surface) {
            self.focus = None;
            invalidation.focus_cleared = true;
        }
        if self.cursor.map(|c| c.surface) == Some(surface) {
            self.cursor = None;
            invalidation.cursor_cleared = true;
        }
        invalidation.drag_outcome = self.drag.surface_destroyed(surface);
        invalidation
    }
}

/// The set of seats known to the compositor
#[derive(Debug, Default)]
pub struct InputDevices {
    devices: Vec<InputDevice>,
    default_seat: Option<String>,
}

impl InputDevices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a device for `seat`, returning the existing one if present
    pub fn create(&mut self, seat: &str) -> &mut InputDevice {
        let index = match self.devices.iter().position(|d| d.seat == seat) {
            Some(index) => index,
            None => {
                info!("⌨️ Input device created for seat {}", seat);
                self.devices.push(InputDevice::new(seat));
                self.devices.len() - 1
            }
        };
        &mut self.devices[index]
    }

    pub fn set_default_seat(&mut self, seat: &str) {
        self.default_seat = Some(seat.to_string());
    }

    pub fn get(&self, seat: &str) -> Option<&InputDevice> {
        self.devices.iter().find(|d| d.seat == seat)
    }

    pub fn get_mut(&mut self, seat: &str) -> Option<&mut InputDevice> {
        self.devices.iter_mut().find(|d| d.seat == seat)
    }

    pub fn default_device(&self) -> Option<&InputDevice> {
        self.get(self.default_seat.as_deref()?)
    }

    pub fn default_device_mut(&mut self) -> Option<&mut InputDevice> {
        let seat = self.default_seat.clone()?;
        self.get_mut(&seat)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputDevice> {
        self.devices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut InputDevice> {
        self.devices.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
