//! Clipboard selection store
//!
//! The store owns the current selection payload outright, so a paste can be
//! served long after the client that copied has gone. Clients replace the
//! selection through protocol requests; the compositor itself can seed it
//! with [`SelectionStore::override_selection`].
//!
//! # Retention
//!
//! With retention enabled every selection change is reported to the
//! compositor's observer, and a selection whose owner disconnects is kept
//! and re-owned by the compositor. With retention disabled the outcome on
//! disconnect depends on `keep_unretained_on_disconnect`.

use log::{debug, info};

use crate::client::ClientId;

/// Common MIME types for clipboard
pub mod mime_types {
    pub const TEXT_PLAIN: &str = "text/plain";
    pub const TEXT_PLAIN_UTF8: &str = "text/plain;charset=utf-8";
    pub const TEXT_HTML: &str = "text/html";
    pub const TEXT_URI_LIST: &str = "text/uri-list";
    pub const IMAGE_PNG: &str = "image/png";
}

/// MIME type to payload mapping, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeData {
    entries: Vec<(String, Vec<u8>)>,
}

impl MimeData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain text payload offered as both `text/plain` variants
    pub fn from_text(text: &str) -> Self {
        let mut data = Self::new();
        data.insert(mime_types::TEXT_PLAIN_UTF8, text.as_bytes().to_vec());
        data.insert(mime_types::TEXT_PLAIN, text.as_bytes().to_vec());
        data
    }

    /// Sets data for a MIME type, replacing any previous payload for it
    pub fn insert(&mut self, mime_type: impl Into<String>, data: Vec<u8>) {
        let mime_type = mime_type.into();
        match self.entries.iter_mut().find(|(m, _)| *m == mime_type) {
            Some(entry) => entry.1 = data,
            None => self.entries.push((mime_type, data)),
        }
    }

    pub fn data(&self, mime_type: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(m, _)| m == mime_type)
            .map(|(_, d)| d.as_slice())
    }

    pub fn offers(&self, mime_type: &str) -> bool {
        self.entries.iter().any(|(m, _)| m == mime_type)
    }

    pub fn mime_types(&self) -> Vec<String> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    /// UTF-8 text, preferring the charset-qualified type
    pub fn text(&self) -> Option<String> {
        self.data(mime_types::TEXT_PLAIN_UTF8)
            .or_else(|| self.data(mime_types::TEXT_PLAIN))
            .map(|d| String::from_utf8_lossy(d).into_owned())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|(_, d)| d.len()).sum()
    }
}

/// Who currently stands behind the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOwner {
    Client(ClientId),
    Compositor,
}

/// Reported back to the compositor after a selection change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
    pub serial: u64,
    /// The retention watch is armed and the observer must be told
    pub notify_watch: bool,
}

/// What happened to the selection when a client went away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionDisposition {
    /// The client did not own the selection
    Unaffected,
    /// Kept, now owned by the compositor
    Demoted,
    /// Dropped along with its owner
    Cleared,
}

#[derive(Debug)]
struct Selection {
    payload: MimeData,
    owner: SelectionOwner,
}

/// Holds the current selection payload
#[derive(Debug)]
pub struct SelectionStore {
    current: Option<Selection>,
    retain: bool,
    keep_unretained_on_disconnect: bool,
    serial: u64,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new(false, true)
    }
}

impl SelectionStore {
    pub fn new(retain: bool, keep_unretained_on_disconnect: bool) -> Self {
        Self {
            current: None,
            retain,
            keep_unretained_on_disconnect,
            serial: 0,
        }
    }

    /// Replaces the selection on behalf of a client
    pub fn set_selection(&mut self, client: ClientId, payload: MimeData) -> SelectionChange {
        info!(
            "📋 Selection set by {} with types {:?}",
            client,
            payload.mime_types()
        );
        self.replace(payload, SelectionOwner::Client(client))
    }

    /// Replaces the selection unconditionally on behalf of the compositor
    pub fn override_selection(&mut self, payload: MimeData) -> SelectionChange {
        info!("📋 Selection overridden with types {:?}", payload.mime_types());
        self.replace(payload, SelectionOwner::Compositor)
    }

    fn replace(&mut self, payload: MimeData, owner: SelectionOwner) -> SelectionChange {
        self.serial += 1;
        self.current = Some(Selection { payload, owner });
        SelectionChange {
            serial: self.serial,
            notify_watch: self.retain,
        }
    }

    /// Clears the selection if `client` still owns it
    pub fn clear_selection(&mut self, client: ClientId) -> bool {
        if self.owner() == Some(SelectionOwner::Client(client)) {
            self.current = None;
            self.serial += 1;
            info!("📋 Cleared selection owned by {}", client);
            true
        } else {
            false
        }
    }

    pub fn set_retained_selection_enabled(&mut self, enabled: bool) {
        debug!("📋 Retained selection {}", if enabled { "enabled" } else { "disabled" });
        self.retain = enabled;
    }

    pub fn is_retained_selection_enabled(&self) -> bool {
        self.retain
    }

    pub fn current_selection(&self) -> Option<&MimeData> {
        self.current.as_ref().map(|s| &s.payload)
    }

    pub fn owner(&self) -> Option<SelectionOwner> {
        self.current.as_ref().map(|s| s.owner)
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Payload of the current selection for one MIME type
    pub fn receive(&self, mime_type: &str) -> Option<Vec<u8>> {
        self.current_selection()?.data(mime_type).map(<[u8]>::to_vec)
    }

    /// Applies the disconnect policy for `client`
    pub fn client_destroyed(&mut self, client: ClientId) -> SelectionDisposition {
        let Some(selection) = self.current.as_mut() else {
            return SelectionDisposition::Unaffected;
        };
        if selection.owner != SelectionOwner::Client(client) {
            return SelectionDisposition::Unaffected;
        }

        if self.retain || self.keep_unretained_on_disconnect {
            selection.owner = SelectionOwner::Compositor;
            info!("📋 Selection from {} retained by compositor", client);
            SelectionDisposition::Demoted
        } else {
            self.current = None;
            self.serial += 1;
            info!("📋 Selection from {} dropped with its owner", client);
            SelectionDisposition::Cleared
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(raw: u64) -> ClientId {
        ClientId::from_raw(raw)
    }

    #[test]
    fn test_multiple_mime_types() {
        let mut data = MimeData::new();
        data.insert("text/plain", b"Hello".to_vec());
        data.insert("text/html", b"<b>Hello</b>".to_vec());
        data.insert("text/plain", b"Hello again".to_vec());

        assert_eq!(data.len(), 2);
        assert_eq!(data.data("text/plain"), Some(&b"Hello again"[..]));
        assert_eq!(data.mime_types(), vec!["text/plain", "text/html"]);
        assert!(!data.offers("image/png"));
    }

    #[test]
    fn test_text_prefers_utf8_variant() {
        let data = MimeData::from_text("héllo");
        assert_eq!(data.text().as_deref(), Some("héllo"));
        assert!(data.offers(mime_types::TEXT_PLAIN));
    }

    #[test]
    fn test_set_and_receive() {
        let mut store = SelectionStore::default();
        store.set_selection(client(1), MimeData::from_text("copy"));
        assert_eq!(store.receive(mime_types::TEXT_PLAIN), Some(b"copy".to_vec()));
        assert_eq!(store.owner(), Some(SelectionOwner::Client(client(1))));
    }

    #[test]
    fn test_watch_follows_retention_flag() {
        let mut store = SelectionStore::default();
        assert!(!store.set_selection(client(1), MimeData::from_text("a")).notify_watch);

        store.set_retained_selection_enabled(true);
        assert!(store.set_selection(client(1), MimeData::from_text("b")).notify_watch);
        assert!(store.override_selection(MimeData::from_text("c")).notify_watch);
    }

    #[test]
    fn test_retained_selection_survives_owner() {
        let mut store = SelectionStore::new(true, false);
        store.set_selection(client(1), MimeData::from_text("keep"));

        assert_eq!(store.client_destroyed(client(1)), SelectionDisposition::Demoted);
        assert_eq!(store.owner(), Some(SelectionOwner::Compositor));
        assert_eq!(store.current_selection().and_then(|d| d.text()).as_deref(), Some("keep"));
    }

    #[test]
    fn test_unretained_selection_policy() {
        let mut keep = SelectionStore::new(false, true);
        keep.set_selection(client(1), MimeData::from_text("x"));
        assert_eq!(keep.client_destroyed(client(1)), SelectionDisposition::Demoted);
        assert!(keep.current_selection().is_some());

        let mut drop = SelectionStore::new(false, false);
        drop.set_selection(client(1), MimeData::from_text("x"));
        assert_eq!(drop.client_destroyed(client(1)), SelectionDisposition::Cleared);
        assert!(drop.current_selection().is_none());
    }

    #[test]
    fn test_disconnect_of_non_owner_is_ignored() {
        let mut store = SelectionStore::new(false, false);
        store.set_selection(client(1), MimeData::from_text("mine"));
        assert_eq!(store.client_destroyed(client(2)), SelectionDisposition::Unaffected);
        assert!(store.current_selection().is_some());
    }

    #[test]
    fn test_disabling_retention_keeps_retained_payload() {
        let mut store = SelectionStore::new(true, false);
        store.set_selection(client(1), MimeData::from_text("held"));
        store.client_destroyed(client(1));
        store.set_retained_selection_enabled(false);
        assert!(store.current_selection().is_some());
    }

    #[test]
    fn test_clear_only_by_owner() {
        let mut store = SelectionStore::default();
        store.set_selection(client(1), MimeData::from_text("x"));
        assert!(!store.clear_selection(client(2)));
        assert!(store.clear_selection(client(1)));
        assert!(store.current_selection().is_none());
    }
}
