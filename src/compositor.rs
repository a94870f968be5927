//! Core compositor session
//!
//! [`Compositor`] owns the client registry, input devices, selection store,
//! output state, render arbiter and extension state directly, and is the
//! only place that mutates them. Every operation runs on the caller's
//! thread to completion; callers on other execution contexts go through
//! [`crate::runtime`] to hand work over.
//!
//! Destroying a surface or client drops every reference held elsewhere
//! (focus, cursor, drag origin and target, direct-render grant) before the
//! call returns.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::time::Instant;

use crate::client::{ClientConnection, ClientId, ClientRegistry};
use crate::config::SessionConfig;
use crate::desktop::{HostUrlOpener, HostWindow, UrlHandler};
use crate::drag::{DragOutcome, DragState};
use crate::error::{DragError, Result};
use crate::extensions::{Extensions, TouchExtensionFlags, SEAT_GLOBAL};
use crate::geometry::{Point, Rect};
use crate::input::{CursorImage, InputDevice, InputDevices, InputEvent};
use crate::output::{OutputState, ScreenOrientation};
use crate::render::{FrameLayer, FrameSnapshot, RenderArbiter, RenderBackend, RenderContext};
use crate::selection::{MimeData, SelectionChange, SelectionDisposition, SelectionStore};
use crate::surface::{Buffer, CallbackId, CommitOutcome, Surface, SurfaceId};
use crate::transport::{ClientEvent, Transport};

/// Hooks for code that mirrors compositor state, e.g. a scene graph
pub trait CompositorObserver: Send {
    /// Called once per surface while it is still reachable
    fn surface_about_to_be_destroyed(&mut self, _surface: &Surface) {}

    /// Called on every selection change while retention is enabled
    fn retained_selection_received(&mut self, _payload: &MimeData) {}
}

struct NoopObserver;

impl CompositorObserver for NoopObserver {}

/// Which startup steps succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitReport {
    pub hardware_integration: bool,
    pub window_manager: bool,
    pub default_input_device: bool,
}

/// Main compositor struct that owns all session state
pub struct Compositor {
    config: SessionConfig,
    window: Option<HostWindow>,

    transport: Box<dyn Transport>,
    url_handler: Box<dyn UrlHandler>,
    observer: Box<dyn CompositorObserver>,

    // Session state
    clients: ClientRegistry,
    devices: InputDevices,
    selection: SelectionStore,
    output: OutputState,
    render: RenderArbiter,
    extensions: Extensions,

    init: InitReport,
    closing: HashSet<ClientId>,
    frame_sequence: u64,
    started: Instant,
}

impl Compositor {
    /// Creates the session core and runs the startup sequence
    ///
    /// `config.general.socket_name` is expected to be resolved already (see
    /// [`SessionConfig::with_socket_override`]). Startup steps that fail
    /// leave their capability unavailable; construction itself never fails.
    pub fn new(
        config: SessionConfig,
        window: Option<HostWindow>,
        transport: Box<dyn Transport>,
        backend: Box<dyn RenderBackend>,
    ) -> Self {
        info!("🏗️ Initializing compositor session...");

        let output = OutputState::new(
            config.output.geometry(),
            config.output.refresh_rate,
            config.output.orientation,
        );
        let selection = SelectionStore::new(
            config.selection.retain,
            config.selection.keep_unretained_on_disconnect,
        );

        let mut compositor = Self {
            window,
            transport,
            url_handler: Box::new(HostUrlOpener::default()),
            observer: Box::new(NoopObserver),
            clients: ClientRegistry::new(),
            devices: InputDevices::new(),
            selection,
            output,
            render: RenderArbiter::new(backend),
            extensions: Extensions::new(),
            init: InitReport::default(),
            closing: HashSet::new(),
            frame_sequence: 0,
            started: Instant::now(),
            config,
        };

        compositor.init.hardware_integration = compositor.initialize_hardware_integration();
        compositor.init.window_manager = compositor.initialize_window_manager_protocol();
        compositor.init.default_input_device = compositor.initialize_default_input_device();
        compositor.apply_extension_config();

        info!(
            "✅ Session ready on socket {:?} (hardware: {}, wm: {}, input: {})",
            compositor.socket_name(),
            compositor.init.hardware_integration,
            compositor.init.window_manager,
            compositor.init.default_input_device
        );
        compositor
    }

    fn initialize_hardware_integration(&mut self) -> bool {
        debug!("🖥️ Initializing hardware integration...");
        self.render.initialize_hardware_integration()
    }

    fn initialize_window_manager_protocol(&mut self) -> bool {
        if !self.config.extensions.window_manager {
            warn!("🚫 Window manager extension disabled by configuration");
            return false;
        }
        debug!("🪟 Initializing window manager protocol...");
        self.extensions
            .initialize_window_manager(self.transport.as_mut())
    }

    fn initialize_default_input_device(&mut self) -> bool {
        debug!("⌨️ Initializing default input device...");
        if let Err(e) = self.transport.register_global(SEAT_GLOBAL, 7) {
            warn!("⚠️ Default input device unavailable: {}", e);
            return false;
        }
        let seat = self.config.input.default_seat.clone();
        self.devices.create(&seat);
        self.devices.set_default_seat(&seat);
        true
    }

    fn apply_extension_config(&mut self) {
        if self.config.extensions.sub_surface {
            self.enable_sub_surface_extension();
        }
        if self.config.extensions.touch {
            self.enable_touch_extension();
        }
        if self.config.extensions.mouse_from_touch {
            self.extensions
                .configure_touch(TouchExtensionFlags::MOUSE_FROM_TOUCH);
        }
        self.extensions
            .set_client_full_screen_hint(self.config.extensions.client_full_screen_hint);
    }

    // =========================================================================
    // Host integration
    // =========================================================================

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn init_report(&self) -> InitReport {
        self.init
    }

    /// Listening socket name; `None` when unset or empty
    pub fn socket_name(&self) -> Option<&str> {
        self.config
            .general
            .socket_name
            .as_deref()
            .filter(|n| !n.is_empty())
    }

    pub fn window(&self) -> Option<&HostWindow> {
        self.window.as_ref()
    }

    pub fn set_observer(&mut self, observer: Box<dyn CompositorObserver>) {
        self.observer = observer;
    }

    pub fn set_url_handler(&mut self, handler: Box<dyn UrlHandler>) {
        self.url_handler = handler;
    }

    /// Forwards a client's request to open a URL
    pub fn open_url(&mut self, client: ClientId, url: &str) {
        if !self.clients.contains(client) {
            debug!("Ignoring open_url from stale {}", client);
            return;
        }
        if let Err(e) = self.url_handler.open_url(client, url) {
            warn!("⚠️ Failed to open {} for {}: {:#}", url, client, e);
        }
    }

    fn send_to(&mut self, client: ClientId, event: ClientEvent) {
        if self.clients.contains(client) && !self.closing.contains(&client) {
            self.transport.send(client, event);
        }
    }

    fn send_to_owner(&mut self, surface: SurfaceId, event: ClientEvent) {
        if let Some(owner) = self.clients.owner_of(surface) {
            self.send_to(owner, event);
        }
    }

    fn broadcast(&mut self, event: ClientEvent) {
        for client in self.clients.client_ids() {
            self.send_to(client, event.clone());
        }
    }

    // =========================================================================
    // Clients
    // =========================================================================

    pub fn register_client(&mut self, connection: ClientConnection) -> ClientId {
        self.clients.register_client(connection)
    }

    pub fn has_client(&self, client: ClientId) -> bool {
        self.clients.contains(client)
    }

    pub fn client_count(&self) -> usize {
        self.clients.client_count()
    }

    /// Snapshot of the surfaces owned by `client`
    pub fn surfaces_for_client(&self, client: ClientId) -> Vec<SurfaceId> {
        self.clients.surfaces_of(client)
    }

    /// Evicts a client and closes its connection
    pub fn destroy_client(&mut self, client: ClientId) {
        if self.teardown_client(client) {
            self.transport.disconnect(client);
        }
    }

    /// Evicts the client owning `surface`
    pub fn destroy_client_for_surface(&mut self, surface: SurfaceId) {
        match self.clients.owner_of(surface) {
            Some(owner) => self.destroy_client(owner),
            None => debug!("Ignoring destroy_client_for_surface for stale {}", surface),
        }
    }

    /// The transport saw the connection go away
    pub fn client_disconnected(&mut self, client: ClientId) {
        self.teardown_client(client);
    }

    fn teardown_client(&mut self, client: ClientId) -> bool {
        if !self.clients.contains(client) {
            debug!("Teardown of {} skipped: already gone", client);
            return false;
        }

        self.closing.insert(client);
        for surface in self.clients.surfaces_of(client) {
            self.teardown_surface(surface);
        }

        let disposition = self.selection.client_destroyed(client);
        self.clients.remove_client(client);
        self.closing.remove(&client);

        if disposition == SelectionDisposition::Cleared {
            self.offer_selection_to_focused();
        }
        true
    }

    // =========================================================================
    // Surfaces
    // =========================================================================

    /// Allocates a surface for `client`; `None` if the client is gone
    pub fn create_surface(&mut self, client: ClientId) -> Option<SurfaceId> {
        self.clients.create_surface(client)
    }

    pub fn surface(&self, surface: SurfaceId) -> Option<&Surface> {
        self.clients.surface(surface)
    }

    pub fn surface_count(&self) -> usize {
        self.clients.surface_count()
    }

    pub fn destroy_surface(&mut self, surface: SurfaceId) {
        self.teardown_surface(surface);
    }

    fn teardown_surface(&mut self, id: SurfaceId) {
        let Some(surface) = self.clients.surface(id) else {
            debug!("Teardown of {} skipped: already gone", id);
            return;
        };
        self.observer.surface_about_to_be_destroyed(surface);

        let mut ended_drags = Vec::new();
        for device in self.devices.iter_mut() {
            let hovered = device.drag().target().filter(|t| *t != id);
            let invalidation = device.surface_destroyed(id);
            if invalidation.focus_cleared {
                debug!("Seat {} lost focus on {}", device.seat(), id);
            }
            if let Some(outcome) = invalidation.drag_outcome {
                ended_drags.push((device.seat().to_string(), outcome, hovered));
            }
        }
        for (seat, outcome, hovered) in ended_drags {
            self.deliver_drag_outcome(&seat, outcome, hovered);
        }

        self.render.surface_destroyed(id);
        self.clients.remove_surface(id);
    }

    pub fn attach_buffer(&mut self, surface: SurfaceId, buffer: Option<Buffer>) {
        match self.clients.surface_mut(surface) {
            Some(s) => s.attach(buffer),
            None => debug!("Ignoring attach on stale {}", surface),
        }
    }

    pub fn request_frame_callback(&mut self, surface: SurfaceId, callback: CallbackId) {
        match self.clients.surface_mut(surface) {
            Some(s) => s.request_frame_callback(callback),
            None => debug!("Ignoring frame callback on stale {}", surface),
        }
    }

    /// Applies a surface's pending state; `None` for a stale surface
    pub fn commit_surface(&mut self, surface: SurfaceId) -> Option<CommitOutcome> {
        let outcome = self.clients.surface_mut(surface)?.commit();
        if let Some(buffer) = outcome.released {
            self.send_to_owner(surface, ClientEvent::BufferReleased { surface, buffer });
        }
        Some(outcome)
    }

    fn build_frame(&mut self) -> FrameSnapshot {
        self.frame_sequence += 1;
        let direct = self.render.direct_render_surface();

        let mut layers: Vec<FrameLayer> = self
            .clients
            .surfaces()
            .filter(|s| direct.map_or(true, |d| d == s.id()))
            .filter_map(|s| {
                s.current_buffer().map(|b| FrameLayer {
                    surface: s.id(),
                    buffer: b.id,
                })
            })
            .collect();
        layers.sort_by_key(|l| l.surface);

        FrameSnapshot {
            sequence: self.frame_sequence,
            direct,
            layers,
        }
    }

    fn mark_presented(&mut self, frame: &FrameSnapshot) {
        for layer in &frame.layers {
            if let Some(surface) = self.clients.surface_mut(layer.surface) {
                surface.mark_presented();
            }
        }
    }

    /// Builds the next frame and marks its surfaces presented
    ///
    /// For hosts that present the snapshot themselves. With a direct-render
    /// grant in place only the granted surface is in the frame.
    pub fn compose_frame(&mut self) -> FrameSnapshot {
        let frame = self.build_frame();
        self.mark_presented(&frame);
        frame
    }

    /// Sequence number of the last composed frame
    pub fn frame_sequence(&self) -> u64 {
        self.frame_sequence
    }

    /// Composes a frame and hands it to the backend
    ///
    /// Surfaces count as presented only once the backend accepted the frame.
    pub fn present_frame(&mut self) -> Result<FrameSnapshot> {
        let frame = self.build_frame();
        self.render.present(&frame)?;
        self.mark_presented(&frame);
        Ok(frame)
    }

    /// Signals that presented content has been retired
    ///
    /// `None` signals every surface. Only frame callbacks whose commit made
    /// it into a presented frame are released.
    pub fn frame_finished(&mut self, surface: Option<SurfaceId>) {
        let time_ms = self.started.elapsed().as_millis() as u32;

        let finished: Vec<(SurfaceId, Vec<CallbackId>)> = match surface {
            Some(id) => match self.clients.surface_mut(id) {
                Some(s) => vec![(id, s.take_finished_callbacks())],
                None => {
                    debug!("Ignoring frame_finished for stale {}", id);
                    return;
                }
            },
            None => self
                .clients
                .surfaces_mut()
                .map(|s| (s.id(), s.take_finished_callbacks()))
                .collect(),
        };

        for (surface, callbacks) in finished {
            for callback in callbacks {
                self.send_to_owner(
                    surface,
                    ClientEvent::FrameDone {
                        surface,
                        callback,
                        time_ms,
                    },
                );
            }
        }
    }

    // =========================================================================
    // Input devices and focus
    // =========================================================================

    pub fn default_input_device(&self) -> Option<&InputDevice> {
        self.devices.default_device()
    }

    pub fn input_device(&self, seat: &str) -> Option<&InputDevice> {
        self.devices.get(seat)
    }

    pub fn input_devices(&self) -> impl Iterator<Item = &InputDevice> {
        self.devices.iter()
    }

    /// Adds a seat; returns false if it already existed
    pub fn create_input_device(&mut self, seat: &str) -> bool {
        if self.devices.get(seat).is_some() {
            return false;
        }
        self.devices.create(seat);
        true
    }

    fn default_seat(&self) -> Option<String> {
        self.devices.default_device().map(|d| d.seat().to_string())
    }

    pub fn focused_surface(&self, seat: &str) -> Option<SurfaceId> {
        self.devices.get(seat).and_then(|d| d.focused_surface())
    }

    /// Moves focus of `seat`; false for an unknown seat or stale surface
    pub fn set_focus(&mut self, seat: &str, surface: Option<SurfaceId>) -> bool {
        if let Some(s) = surface {
            if !self.clients.contains_surface(s) {
                debug!("Ignoring focus on stale {}", s);
                return false;
            }
        }
        let Some(device) = self.devices.get_mut(seat) else {
            debug!("Ignoring focus on unknown seat {}", seat);
            return false;
        };
        let Some(change) = device.set_focus(surface) else {
            return true;
        };

        let previous_owner = change.previous.and_then(|s| self.clients.owner_of(s));
        let current_owner = change.current.and_then(|s| self.clients.owner_of(s));

        if let Some(previous) = change.previous {
            self.send_to_owner(
                previous,
                ClientEvent::FocusLeave {
                    seat: seat.to_string(),
                    surface: previous,
                },
            );
        }
        if let Some(current) = change.current {
            self.send_to_owner(
                current,
                ClientEvent::FocusEnter {
                    seat: seat.to_string(),
                    surface: current,
                },
            );
        }

        // A client gaining focus learns about the current selection
        if let Some(owner) = current_owner.filter(|o| Some(*o) != previous_owner) {
            let offer = self.selection_offer_event();
            self.send_to(owner, offer);
        }
        true
    }

    /// Routes an event through `seat`; true if it reached a surface
    pub fn send_input_event(&mut self, seat: &str, event: InputEvent) -> bool {
        let Some(device) = self.devices.get_mut(seat) else {
            return false;
        };
        let Some(routed) = device.route(event) else {
            return false;
        };
        self.send_to_owner(
            routed.surface,
            ClientEvent::Input {
                seat: seat.to_string(),
                surface: routed.surface,
                event: routed.event,
            },
        );
        true
    }

    /// Whether the default device has an active drag
    pub fn is_dragging(&self) -> bool {
        self.devices
            .default_device()
            .map(|d| d.is_dragging())
            .unwrap_or(false)
    }

    /// Sets the cursor image of the default device; `None` hides it
    pub fn set_cursor_surface(&mut self, surface: Option<SurfaceId>, hotspot_x: i32, hotspot_y: i32) {
        let cursor = match surface {
            Some(s) if self.clients.contains_surface(s) => Some(CursorImage {
                surface: s,
                hotspot_x,
                hotspot_y,
            }),
            Some(s) => {
                debug!("Ignoring cursor on stale {}", s);
                return;
            }
            None => None,
        };
        if let Some(device) = self.devices.default_device_mut() {
            device.set_cursor(cursor);
        }
    }

    // =========================================================================
    // Drag and drop
    // =========================================================================

    /// Starts a drag on `seat` from `origin`
    pub fn start_drag(
        &mut self,
        seat: &str,
        origin: SurfaceId,
        payload: MimeData,
    ) -> std::result::Result<(), DragError> {
        let owner = self
            .clients
            .owner_of(origin)
            .ok_or(DragError::OriginGone(origin))?;
        let device = self
            .devices
            .get_mut(seat)
            .ok_or_else(|| DragError::UnknownDevice(seat.to_string()))?;
        let position = device.pointer_position();
        device.drag_mut().start(origin, owner, payload, position)
    }

    pub fn accept_drag(
        &mut self,
        seat: &str,
        mime_type: Option<String>,
    ) -> std::result::Result<(), DragError> {
        self.devices
            .get_mut(seat)
            .ok_or_else(|| DragError::UnknownDevice(seat.to_string()))?
            .drag_mut()
            .accept(mime_type)
    }

    pub fn request_drop(&mut self, seat: &str) -> std::result::Result<(), DragError> {
        self.devices
            .get_mut(seat)
            .ok_or_else(|| DragError::UnknownDevice(seat.to_string()))?
            .drag_mut()
            .request_drop()
    }

    /// Moves the drag of the default device
    pub fn send_drag_move_event(&mut self, global: Point, local: Point, target: Option<SurfaceId>) {
        if let Some(seat) = self.default_seat() {
            self.send_drag_move_event_on(&seat, global, local, target);
        }
    }

    pub fn send_drag_move_event_on(
        &mut self,
        seat: &str,
        global: Point,
        local: Point,
        target: Option<SurfaceId>,
    ) {
        // A dead target is as good as hovering nothing
        let target = target.filter(|s| self.clients.contains_surface(*s));

        let Some(device) = self.devices.get_mut(seat) else {
            return;
        };
        let mime_types = device
            .drag()
            .payload()
            .map(|p| p.mime_types())
            .unwrap_or_default();
        let Some(motion) = device.drag_mut().update(global, local, target) else {
            debug!("Ignoring drag motion on {}: not dragging", seat);
            return;
        };

        if let Some(left) = motion.left {
            self.send_to_owner(
                left,
                ClientEvent::DragLeave {
                    seat: seat.to_string(),
                    surface: left,
                },
            );
        }
        if let Some(entered) = motion.entered {
            self.send_to_owner(
                entered,
                ClientEvent::DragEnter {
                    seat: seat.to_string(),
                    surface: entered,
                    position: local,
                    mime_types,
                },
            );
        }
        if let Some(target) = motion.target {
            self.send_to_owner(
                target,
                ClientEvent::DragMotion {
                    seat: seat.to_string(),
                    surface: target,
                    position: local,
                    delta: motion.delta,
                },
            );
        }
    }

    /// Ends the drag of the default device, returning its terminal state
    pub fn send_drag_end_event(&mut self) -> Option<DragState> {
        let seat = self.default_seat()?;
        self.send_drag_end_event_on(&seat)
    }

    pub fn send_drag_end_event_on(&mut self, seat: &str) -> Option<DragState> {
        let device = self.devices.get_mut(seat)?;
        let hovered = device.drag().target();
        let outcome = device.drag_mut().end()?;
        let state = outcome.state();
        self.deliver_drag_outcome(seat, outcome, hovered);
        Some(state)
    }

    fn deliver_drag_outcome(&mut self, seat: &str, outcome: DragOutcome, hovered: Option<SurfaceId>) {
        match outcome {
            DragOutcome::Dropped {
                origin_client,
                target,
                mime_type,
                payload,
            } => {
                if let Some(target) = target {
                    self.send_to_owner(
                        target,
                        ClientEvent::DropPerformed {
                            seat: seat.to_string(),
                            surface: target,
                            mime_type,
                            payload,
                        },
                    );
                }
                self.send_to(
                    origin_client,
                    ClientEvent::DragFinished {
                        seat: seat.to_string(),
                        dropped: true,
                    },
                );
            }
            DragOutcome::Cancelled { origin_client } => {
                if let Some(hovered) = hovered {
                    self.send_to_owner(
                        hovered,
                        ClientEvent::DragLeave {
                            seat: seat.to_string(),
                            surface: hovered,
                        },
                    );
                }
                self.send_to(
                    origin_client,
                    ClientEvent::DragFinished {
                        seat: seat.to_string(),
                        dropped: false,
                    },
                );
            }
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// A client set the clipboard selection
    pub fn set_selection(&mut self, client: ClientId, payload: MimeData) {
        if !self.clients.contains(client) {
            debug!("Ignoring selection from stale {}", client);
            return;
        }
        let change = self.selection.set_selection(client, payload);
        self.selection_changed(change);
    }

    /// A client withdrew its selection
    pub fn clear_selection(&mut self, client: ClientId) {
        if self.selection.clear_selection(client) {
            self.offer_selection_to_focused();
        }
    }

    /// Replaces the selection on behalf of the compositor
    pub fn override_selection(&mut self, payload: MimeData) {
        let change = self.selection.override_selection(payload);
        self.selection_changed(change);
    }

    pub fn current_selection(&self) -> Option<&MimeData> {
        self.selection.current_selection()
    }

    pub fn receive_selection(&self, mime_type: &str) -> Option<Vec<u8>> {
        self.selection.receive(mime_type)
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn set_retained_selection_enabled(&mut self, enabled: bool) {
        self.selection.set_retained_selection_enabled(enabled);
    }

    pub fn retained_selection_enabled(&self) -> bool {
        self.selection.is_retained_selection_enabled()
    }

    fn selection_changed(&mut self, change: SelectionChange) {
        if change.notify_watch {
            if let Some(payload) = self.selection.current_selection() {
                self.observer.retained_selection_received(payload);
            }
        }
        self.offer_selection_to_focused();
    }

    fn selection_offer_event(&self) -> ClientEvent {
        match self.selection.current_selection() {
            Some(payload) => ClientEvent::SelectionOffer {
                mime_types: payload.mime_types(),
            },
            None => ClientEvent::SelectionCleared,
        }
    }

    fn offer_selection_to_focused(&mut self) {
        let mut focused: Vec<ClientId> = self
            .devices
            .iter()
            .filter_map(|d| d.focused_surface())
            .filter_map(|s| self.clients.owner_of(s))
            .collect();
        focused.sort();
        focused.dedup();

        let offer = self.selection_offer_event();
        for client in focused {
            self.send_to(client, offer.clone());
        }
    }

    // =========================================================================
    // Output
    // =========================================================================

    pub fn output(&self) -> &OutputState {
        &self.output
    }

    pub fn output_geometry(&self) -> Rect {
        self.output.geometry()
    }

    pub fn output_refresh_rate(&self) -> i32 {
        self.output.refresh_rate()
    }

    pub fn screen_orientation(&self) -> ScreenOrientation {
        self.output.orientation()
    }

    pub fn set_output_geometry(&mut self, geometry: Rect) {
        if self.output.set_geometry(geometry) {
            self.output_changed();
        }
    }

    pub fn set_output_refresh_rate(&mut self, hz: i32) {
        if self.output.set_refresh_rate(hz) {
            self.output_changed();
        }
    }

    /// Set the screen orientation based on accelerometer data or similar
    pub fn set_screen_orientation(&mut self, orientation: ScreenOrientation) {
        if self.output.set_orientation(orientation) {
            self.output_changed();
        }
    }

    fn output_changed(&mut self) {
        debug!("📺 Output now {:?}", self.output);
        self.broadcast(ClientEvent::OutputChanged {
            geometry: self.output.geometry(),
            refresh_rate: self.output.refresh_rate(),
            orientation: self.output.orientation(),
        });
    }

    // =========================================================================
    // Direct rendering
    // =========================================================================

    /// Requests exclusive direct rendering for `surface`; `None` clears it
    pub fn set_direct_render_surface(
        &mut self,
        surface: Option<SurfaceId>,
        context: RenderContext,
    ) -> bool {
        if let Some(s) = surface {
            if !self.clients.contains_surface(s) {
                debug!("Ignoring direct render request for stale {}", s);
                return false;
            }
        }
        self.render.set_direct_render_surface(surface, context)
    }

    pub fn direct_render_surface(&self) -> Option<SurfaceId> {
        self.render.direct_render_surface()
    }

    pub fn render_arbiter(&self) -> &RenderArbiter {
        &self.render
    }

    pub fn cleanup_graphics_resources(&mut self) {
        self.render.cleanup_graphics_resources();
    }

    // =========================================================================
    // Extensions
    // =========================================================================

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Tells clients whether they should go full screen on their own
    pub fn set_client_full_screen_hint(&mut self, value: bool) {
        if self.extensions.set_client_full_screen_hint(value) && self.extensions.has_window_manager() {
            self.broadcast(ClientEvent::FullScreenHint { enabled: value });
        }
    }

    pub fn client_full_screen_hint(&self) -> bool {
        self.extensions.client_full_screen_hint()
    }

    pub fn enable_sub_surface_extension(&mut self) -> bool {
        self.extensions.enable_sub_surface(self.transport.as_mut())
    }

    pub fn enable_touch_extension(&mut self) -> bool {
        self.extensions.enable_touch(self.transport.as_mut())
    }

    pub fn configure_touch_extension(&mut self, flags: TouchExtensionFlags) {
        if self.extensions.configure_touch(flags) && self.extensions.has_touch() {
            self.broadcast(ClientEvent::TouchExtensionConfigured { flags });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{GraphicsApi, HeadlessBackend};
    use crate::transport::{RecordingTransport, TransportLog};

    fn compositor() -> (Compositor, TransportLog) {
        let transport = RecordingTransport::new();
        let log = transport.log();
        let compositor = Compositor::new(
            SessionConfig::default(),
            None,
            Box::new(transport),
            Box::new(HeadlessBackend::new(GraphicsApi::OpenGl, true)),
        );
        (compositor, log)
    }

    #[test]
    fn test_startup_sequence() {
        let (compositor, log) = compositor();
        let report = compositor.init_report();
        assert!(report.hardware_integration);
        assert!(report.window_manager);
        assert!(report.default_input_device);
        assert_eq!(compositor.default_input_device().map(|d| d.seat()), Some("seat0"));
        assert!(log.globals().contains(&SEAT_GLOBAL.to_string()));
    }

    #[test]
    fn test_commit_releases_superseded_buffer() {
        let (mut compositor, log) = compositor();
        let client = compositor.register_client(ClientConnection::default());
        let surface = compositor.create_surface(client).unwrap();

        compositor.attach_buffer(surface, Some(Buffer::new(1, 10, 10)));
        compositor.commit_surface(surface);
        compositor.attach_buffer(surface, Some(Buffer::new(2, 10, 10)));
        compositor.commit_surface(surface);

        assert!(log.events_for(client).contains(&ClientEvent::BufferReleased {
            surface,
            buffer: crate::surface::BufferId(1),
        }));
    }

    #[test]
    fn test_stale_operations_are_noops() {
        let (mut compositor, _) = compositor();
        let client = compositor.register_client(ClientConnection::default());
        let surface = compositor.create_surface(client).unwrap();
        compositor.destroy_client(client);

        compositor.destroy_client(client);
        compositor.destroy_surface(surface);
        compositor.destroy_client_for_surface(surface);
        compositor.attach_buffer(surface, None);
        assert!(compositor.commit_surface(surface).is_none());
        compositor.frame_finished(Some(surface));
        assert!(!compositor.set_focus("seat0", Some(surface)));
        assert!(compositor.create_surface(client).is_none());
    }

    #[test]
    fn test_full_screen_hint_broadcast() {
        let (mut compositor, log) = compositor();
        let client = compositor.register_client(ClientConnection::default());
        compositor.set_client_full_screen_hint(true);
        compositor.set_client_full_screen_hint(true);

        let hints: Vec<_> = log
            .events_for(client)
            .into_iter()
            .filter(|e| matches!(e, ClientEvent::FullScreenHint { .. }))
            .collect();
        assert_eq!(hints, vec![ClientEvent::FullScreenHint { enabled: true }]);
    }
}
