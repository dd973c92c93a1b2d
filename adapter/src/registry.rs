//! Connection registry and watch table.
//!
//! Maps registration ids to the connection they were created for, the
//! listener task reading that connection, and the set of entry ids the
//! connection wants change notifications for. A watch set only ever exists
//! inside its registration, so removing a registration removes its watches.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;
use wog_types::{Connection, EntryId, RegistrationId};

use crate::AdapterError;

/// One live client connection bound to an adapter.
pub struct Registration {
    connection: Arc<dyn Connection>,
    watched: HashSet<EntryId>,
    listener: Option<JoinHandle<()>>,
}

impl Registration {
    fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            watched: HashSet::new(),
            listener: None,
        }
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn watched(&self) -> &HashSet<EntryId> {
        &self.watched
    }

    /// Stop the listener task, if one is attached.
    pub fn detach(mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

/// Registry of live connections, keyed by registration id.
#[derive(Default)]
pub struct ConnectionRegistry {
    registrations: HashMap<RegistrationId, Registration>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection with an empty watch set.
    ///
    /// Returns `false` (and leaves the existing registration untouched) if
    /// the id is already in use.
    pub fn insert(&mut self, id: RegistrationId, connection: Arc<dyn Connection>) -> bool {
        if self.registrations.contains_key(&id) {
            return false;
        }
        self.registrations.insert(id, Registration::new(connection));
        true
    }

    /// Attach the listener task of a registration.
    ///
    /// When the registration is already gone the listener is aborted
    /// instead, so listeners never outlive their registration.
    pub fn attach_listener(&mut self, id: &RegistrationId, listener: JoinHandle<()>) -> bool {
        match self.registrations.get_mut(id) {
            Some(registration) => {
                if let Some(previous) = registration.listener.replace(listener) {
                    previous.abort();
                }
                true
            }
            None => {
                listener.abort();
                false
            }
        }
    }

    /// Remove a registration together with its watch set.
    pub fn remove(&mut self, id: &RegistrationId) -> Option<Registration> {
        self.registrations.remove(id)
    }

    /// Remove every registration.
    pub fn drain(&mut self) -> Vec<(RegistrationId, Registration)> {
        self.registrations.drain().collect()
    }

    pub fn contains(&self, id: &RegistrationId) -> bool {
        self.registrations.contains_key(id)
    }

    pub fn get(&self, id: &RegistrationId) -> Option<&Registration> {
        self.registrations.get(id)
    }

    /// Add `entry` to the watch set of `id`. Returns `false` if it was
    /// already watched.
    pub fn watch(&mut self, id: &RegistrationId, entry: EntryId) -> Result<bool, AdapterError> {
        let registration = self
            .registrations
            .get_mut(id)
            .ok_or_else(|| AdapterError::UnknownRegistration(id.clone()))?;
        Ok(registration.watched.insert(entry))
    }

    /// Remove `entry` from the watch set of `id`. Returns `false` if it was
    /// not watched.
    pub fn unwatch(&mut self, id: &RegistrationId, entry: &str) -> Result<bool, AdapterError> {
        let registration = self
            .registrations
            .get_mut(id)
            .ok_or_else(|| AdapterError::UnknownRegistration(id.clone()))?;
        Ok(registration.watched.remove(entry))
    }

    /// Registrations whose watch set contains `entry`, ordered by id.
    pub fn watchers(&self, entry: &str) -> Vec<(RegistrationId, Arc<dyn Connection>)> {
        let mut watchers: Vec<_> = self
            .registrations
            .iter()
            .filter(|(_, registration)| registration.watched.contains(entry))
            .map(|(id, registration)| (id.clone(), registration.connection.clone()))
            .collect();
        watchers.sort_by(|a, b| a.0.cmp(&b.0));
        watchers
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
