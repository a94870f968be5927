//! Client registry
//!
//! Owns every connected client together with the surfaces it created.
//! Surfaces live in a single id-keyed table; clients hold the ids of the
//! surfaces they own and each surface records its owner by id. Ids are
//! never reused, so a removed entry can not be confused with a later one.

use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Instant;

use crate::surface::{Surface, SurfaceId};

/// Identifier of a connected client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// Opaque description of the transport connection behind a client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConnection {
    /// Peer process id, when the transport can tell
    pub pid: Option<u32>,
    /// Peer user id, when the transport can tell
    pub uid: Option<u32>,
    /// Free-form label used in logs
    pub label: String,
}

impl ClientConnection {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// A connected client and the ids of the surfaces it owns
#[derive(Debug)]
pub struct Client {
    id: ClientId,
    connection: ClientConnection,
    surfaces: HashSet<SurfaceId>,
    connected_at: Instant,
}

impl Client {
    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn connection(&self) -> &ClientConnection {
        &self.connection
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }
}

/// Table of clients and the surfaces they own
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<ClientId, Client>,
    surfaces: HashMap<SurfaceId, Surface>,
    next_client_id: u64,
    next_surface_id: u64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
            surfaces: HashMap::new(),
            next_client_id: 1,
            next_surface_id: 1,
        }
    }

    /// Registers a new client connection
    pub fn register_client(&mut self, connection: ClientConnection) -> ClientId {
        let id = ClientId::from_raw(self.next_client_id);
        self.next_client_id += 1;

        info!("🔌 Client {} connected ({})", id, connection.label);
        self.clients.insert(
            id,
            Client {
                id,
                connection,
                surfaces: HashSet::new(),
                connected_at: Instant::now(),
            },
        );
        id
    }

    pub fn contains(&self, client: ClientId) -> bool {
        self.clients.contains_key(&client)
    }

    pub fn client(&self, client: ClientId) -> Option<&Client> {
        self.clients.get(&client)
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        self.clients.keys().copied().collect()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Allocates a surface owned by `client`; `None` if the client is gone
    pub fn create_surface(&mut self, client: ClientId) -> Option<SurfaceId> {
        let owner = self.clients.get_mut(&client)?;
        let id = SurfaceId::from_raw(self.next_surface_id);
        self.next_surface_id += 1;

        owner.surfaces.insert(id);
        self.surfaces.insert(id, Surface::new(id, client));
        debug!("🧩 Surface {} created for {}", id, client);
        Some(id)
    }

    pub fn surface(&self, surface: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&surface)
    }

    pub fn surface_mut(&mut self, surface: SurfaceId) -> Option<&mut Surface> {
        self.surfaces.get_mut(&surface)
    }

    pub fn contains_surface(&self, surface: SurfaceId) -> bool {
        self.surfaces.contains_key(&surface)
    }

    /// Snapshot of the surfaces owned by `client`, in no particular order
    pub fn surfaces_of(&self, client: ClientId) -> Vec<SurfaceId> {
        self.clients
            .get(&client)
            .map(|c| c.surfaces.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every live surface
    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.values()
    }

    pub fn surfaces_mut(&mut self) -> impl Iterator<Item = &mut Surface> {
        self.surfaces.values_mut()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn owner_of(&self, surface: SurfaceId) -> Option<ClientId> {
        self.surfaces.get(&surface).map(|s| s.client())
    }

    /// Drops a surface from the table and from its owner's set
    pub fn remove_surface(&mut self, surface: SurfaceId) -> Option<Surface> {
        let removed = self.surfaces.remove(&surface)?;
        if let Some(owner) = self.clients.get_mut(&removed.client()) {
            owner.surfaces.remove(&surface);
        }
        debug!("🧹 Surface {} removed", surface);
        Some(removed)
    }

    /// Drops a client entry; its surfaces must have been removed first
    pub fn remove_client(&mut self, client: ClientId) -> Option<Client> {
        let removed = self.clients.remove(&client)?;
        // Anything still listed is reclaimed here so no surface outlives its owner
        for surface in &removed.surfaces {
            self.surfaces.remove(surface);
        }
        info!("👋 Client {} removed", client);
        Some(removed)
    }
}
