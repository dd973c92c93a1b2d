//! Adapter lifecycle host.
//!
//! `AdapterHost` wraps one concrete [`Adapter`] and owns everything that
//! must behave identically across adapters: the catalog snapshot, the
//! connection registry with its watch sets, inbound message dispatch, and
//! the `Uninitialized → Initialized → Disposed` lifecycle.
//!
//! Locks are only held for in-memory bookkeeping, never across adapter I/O.

use arc_swap::ArcSwap;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wog_types::{Connection, Entry, EntryId, EntryStats, Frame, Page, RegistrationId, Supports};
use wog_utils::{AdapterStats, IdGenerator, StatsSnapshot};

use crate::adapter::Destination;
use crate::protocol::{self, ErrorReply};
use crate::socket::{watchable, Socket, SocketContext};
use crate::{
    Adapter, AdapterError, AdapterOptions, Catalog, ChangeNotifier, ConnectionRegistry,
    EntryChanged,
};

/// Capacity of the broadcast channel carrying [`EntryChanged`] events.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle of an adapter instance. `Disposed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Initialized,
    Disposed,
}

/// Runtime around one adapter instance.
pub struct AdapterHost<A: Adapter> {
    adapter: A,
    ids: Arc<dyn IdGenerator>,
    state: Mutex<LifecycleState>,
    catalog: ArcSwap<Catalog>,
    generation: AtomicU64,
    registry: Arc<RwLock<ConnectionRegistry>>,
    changes: broadcast::Sender<EntryChanged>,
    pump: Mutex<Option<JoinHandle<()>>>,
    stats: AdapterStats,
}

impl<A: Adapter> AdapterHost<A> {
    pub fn new(adapter: A, ids: Arc<dyn IdGenerator>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            adapter,
            ids,
            state: Mutex::new(LifecycleState::Uninitialized),
            catalog: ArcSwap::from_pointee(Catalog::empty()),
            generation: AtomicU64::new(0),
            registry: Arc::new(RwLock::new(ConnectionRegistry::new())),
            changes,
            pump: Mutex::new(None),
            stats: AdapterStats::new(),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn name(&self) -> &str {
        self.adapter.name()
    }

    pub fn supports(&self) -> Supports {
        self.adapter.supports()
    }

    pub fn state(&self) -> LifecycleState {
        *self.lock_state()
    }

    /// Whether discovery completed and the catalog is populated.
    pub fn is_ready(&self) -> bool {
        self.state() == LifecycleState::Initialized
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn lock_state(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Discover entries and populate the catalog.
    ///
    /// Allowed once, from `Uninitialized`. When discovery fails the catalog
    /// stays empty and the host returns to `Uninitialized`.
    pub async fn init(self: &Arc<Self>, options: AdapterOptions) -> Result<(), AdapterError> {
        {
            let mut state = self.lock_state();
            match *state {
                LifecycleState::Uninitialized => *state = LifecycleState::Initializing,
                LifecycleState::Disposed => return Err(AdapterError::Disposed),
                LifecycleState::Initializing | LifecycleState::Initialized => {
                    return Err(AdapterError::AlreadyInitialized)
                }
            }
        }

        match self.populate(&options).await {
            Ok(catalog) => {
                let (groups, entries) = (catalog.groups().len(), catalog.len());
                let published = {
                    let mut state = self.lock_state();
                    if *state == LifecycleState::Initializing {
                        self.generation.store(catalog.generation(), Ordering::Relaxed);
                        self.catalog.store(catalog);
                        *state = LifecycleState::Initialized;
                        true
                    } else {
                        false
                    }
                };
                if !published {
                    // Disposed while discovery was running.
                    self.stop_pump();
                    self.adapter.dispose().await;
                    return Err(AdapterError::Disposed);
                }
                info!(adapter = %self.name(), groups, entries, "adapter initialized");
                Ok(())
            }
            Err(e) => {
                self.stop_pump();
                let mut state = self.lock_state();
                if *state == LifecycleState::Initializing {
                    *state = LifecycleState::Uninitialized;
                }
                warn!(adapter = %self.name(), error = %e, "adapter initialization failed");
                Err(e)
            }
        }
    }

    /// Run discovery, build the catalog and start change detection.
    async fn populate(self: &Arc<Self>, options: &AdapterOptions) -> Result<Arc<Catalog>, AdapterError> {
        let name = self.name().to_string();
        let discovered = self
            .adapter
            .discover(options)
            .await
            .map_err(|e| AdapterError::initialization(&name, e))?;

        // Committed in `init` once the catalog is published.
        let generation = self.generation.load(Ordering::Relaxed) + 1;
        let catalog = Catalog::build(discovered, self.ids.as_ref(), generation)
            .map_err(|e| AdapterError::initialization(&name, e))?;
        let catalog = Arc::new(catalog);

        if self.supports().watching {
            let notifier = self.start_pump();
            self.adapter
                .watch(catalog.clone(), notifier)
                .await
                .map_err(|e| AdapterError::initialization(&name, e))?;
        }
        Ok(catalog)
    }

    /// Spawn the task that turns adapter change reports into fan-out.
    fn start_pump(self: &Arc<Self>) -> ChangeNotifier {
        let (notifier, rx) = ChangeNotifier::channel();
        let host = Arc::downgrade(self);
        let handle = tokio::spawn(pump_changes(host, rx));
        let previous = self
            .pump
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        notifier
    }

    fn stop_pump(&self) {
        let handle = self.pump.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    /// Tear down the catalog, every registration and watch set, and the
    /// adapter's background work. Idempotent.
    pub async fn dispose(&self) {
        {
            let mut state = self.lock_state();
            if *state == LifecycleState::Disposed {
                return;
            }
            *state = LifecycleState::Disposed;
        }

        self.catalog.store(Arc::new(Catalog::empty()));
        self.stop_pump();

        let drained = self.registry.write().await.drain();
        let count = drained.len();
        for (_, registration) in drained {
            registration.detach();
        }

        self.adapter.dispose().await;
        info!(adapter = %self.name(), registrations = count, "adapter disposed");
    }

    // ── Catalog queries ────────────────────────────────────────────────

    /// Current catalog snapshot.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.load_full()
    }

    pub fn groups(&self) -> Vec<String> {
        self.catalog.load().groups().to_vec()
    }

    pub fn entries(&self, group: &str) -> Vec<Entry> {
        self.catalog.load().entries(group).cloned().collect()
    }

    pub fn entry(&self, id: &str) -> Option<Entry> {
        self.catalog.load().entry(id).cloned()
    }

    /// Fresh stats for an entry; `Ok(None)` when the id is unknown.
    pub async fn entry_stats(&self, id: &str) -> Result<Option<EntryStats>, AdapterError> {
        let Some(entry) = self.entry(id) else {
            return Ok(None);
        };
        self.adapter.entry_stats(&entry).await.map(Some)
    }

    /// Stream one page of an entry, or everything for [`Page::All`].
    pub async fn stream(
        &self,
        id: &str,
        page: Page,
        destination: Destination<'_>,
    ) -> Result<(), AdapterError> {
        let entry = self
            .entry(id)
            .ok_or_else(|| AdapterError::NotFound(EntryId::new(id)))?;
        self.adapter.stream(&entry, page, destination).await
    }

    // ── Registrations ──────────────────────────────────────────────────

    /// Register a connection and start listening to its frames.
    ///
    /// After dispose the returned id is never registered and the socket is
    /// dropped.
    pub async fn register_socket(self: &Arc<Self>, socket: Socket) -> RegistrationId {
        let Socket { connection, frames } = socket;
        let mut registry = self.registry.write().await;

        let mut id = RegistrationId::new(self.ids.generate());
        if self.state() == LifecycleState::Disposed {
            debug!(registration = %id, "ignoring registration on disposed adapter");
            return id;
        }
        let mut attempt = 0u32;
        while !registry.insert(id.clone(), connection.clone()) {
            attempt += 1;
            id = RegistrationId::new(format!("{}-{attempt}", self.ids.generate()));
        }

        let listener = tokio::spawn(listen(self.clone(), id.clone(), connection.clone(), frames));
        registry.attach_listener(&id, listener);
        self.stats.record_registration();
        debug!(registration = %id, connection = %connection.describe(), "socket registered");
        id
    }

    /// Remove a registration and its watch set. Unknown ids are a no-op.
    pub async fn unregister_socket(&self, id: &RegistrationId) -> bool {
        let removed = self.registry.write().await.remove(id);
        match removed {
            Some(registration) => {
                registration.detach();
                debug!(registration = %id, "socket unregistered");
                true
            }
            None => false,
        }
    }

    /// Removal path used by the listener itself on transport close; the
    /// listener is finishing on its own and must not abort itself.
    async fn release(&self, id: &RegistrationId) {
        if self.registry.write().await.remove(id).is_some() {
            debug!(registration = %id, "socket closed");
        }
    }

    pub async fn is_registered(&self, id: &RegistrationId) -> bool {
        self.registry.read().await.contains(id)
    }

    pub async fn registration_count(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Watch `entry` on behalf of registration `id`.
    ///
    /// Fails for unknown registrations, unknown entries, and adapters that
    /// do not support watching. Returns `false` if already watched.
    pub async fn watch_entry(&self, id: &RegistrationId, entry: &str) -> Result<bool, AdapterError> {
        let entry = watchable(self.supports(), &self.catalog.load(), entry)?;
        self.registry.write().await.watch(id, entry)
    }

    pub async fn unwatch_entry(&self, id: &RegistrationId, entry: &str) -> Result<bool, AdapterError> {
        if !self.supports().watching {
            return Err(AdapterError::Unsupported("watching"));
        }
        self.registry.write().await.unwatch(id, entry)
    }

    /// Registrations currently watching `entry`.
    pub async fn watchers(&self, entry: &str) -> Vec<RegistrationId> {
        self.registry
            .read()
            .await
            .watchers(entry)
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }

    // ── Change fan-out ─────────────────────────────────────────────────

    /// Serving-layer view of fanned-out changes.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<EntryChanged> {
        self.changes.subscribe()
    }

    /// Send a change notification to every registration watching `entry`.
    ///
    /// Returns the number of registrations the notification was delivered
    /// to. Unknown entries notify nobody.
    pub async fn notify_entry_changed(&self, entry: &str) -> usize {
        let Some(found) = self.entry(entry) else {
            debug!(entry, "change for unknown entry ignored");
            return 0;
        };
        // Held through the sends so an unregister cannot complete while a
        // notification to that registration is still in flight.
        let registry = self.registry.read().await;
        let watchers = registry.watchers(entry);
        if watchers.is_empty() {
            return 0;
        }

        let payload = self.adapter.change_notification(&found).to_string();
        let mut delivered = 0;
        for (id, connection) in watchers {
            match connection.send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => debug!(registration = %id, error = %e, "change notification not delivered"),
            }
        }
        drop(registry);

        self.stats.add_notifications(delivered as u64);
        let _ = self.changes.send(EntryChanged {
            entry_id: found.id,
            delivered,
        });
        delivered
    }

    // ── Dispatch ───────────────────────────────────────────────────────

    /// Handle one inbound frame from a registration.
    ///
    /// Every failure ends in an `{ "error": ... }` reply on the same
    /// connection; nothing here removes the registration.
    pub async fn dispatch(&self, id: &RegistrationId, connection: &Arc<dyn Connection>, frame: Frame) {
        self.stats.record_message();

        let message = match protocol::decode(&frame) {
            Ok(message) => message,
            Err(e) => {
                debug!(registration = %id, error = %e, "undecodable control message");
                self.reply_error(id, connection, ErrorReply::from(e));
                return;
            }
        };

        let socket = SocketContext::new(
            id.clone(),
            connection.clone(),
            self.catalog(),
            self.supports(),
            self.registry.clone(),
        );
        let handled = AssertUnwindSafe(self.adapter.handle_socket_message(&socket, &message))
            .catch_unwind()
            .await;

        match handled {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                debug!(registration = %id, kind = message.kind(), "unknown operation");
                self.reply_error(id, connection, ErrorReply::invalid_operation(message.kind()));
            }
            Ok(Err(e)) => {
                debug!(registration = %id, kind = message.kind(), error = %e, "operation failed");
                self.reply_error(id, connection, ErrorReply::new(e.to_string()));
            }
            Err(_) => {
                warn!(registration = %id, kind = message.kind(), "adapter panicked while handling message");
                self.reply_error(
                    id,
                    connection,
                    ErrorReply::new(format!("Internal error in operation \"{}\"!", message.kind())),
                );
            }
        }
    }

    fn reply_error(&self, id: &RegistrationId, connection: &Arc<dyn Connection>, reply: ErrorReply) {
        self.stats.record_protocol_error();
        if let Err(e) = connection.send(reply.to_json()) {
            debug!(registration = %id, error = %e, "error reply not delivered");
        }
    }
}

/// Listener task of one registration: frames are handled strictly in
/// arrival order until the transport closes.
async fn listen<A: Adapter>(
    host: Arc<AdapterHost<A>>,
    id: RegistrationId,
    connection: Arc<dyn Connection>,
    mut frames: mpsc::Receiver<Frame>,
) {
    while let Some(frame) = frames.recv().await {
        if frame == Frame::Close {
            break;
        }
        host.dispatch(&id, &connection, frame).await;
    }
    host.release(&id).await;
}

/// Forward adapter change reports to the host's fan-out until the host is
/// gone or every notifier was dropped.
async fn pump_changes<A: Adapter>(host: Weak<AdapterHost<A>>, mut rx: mpsc::UnboundedReceiver<EntryId>) {
    while let Some(entry) = rx.recv().await {
        let Some(host) = host.upgrade() else {
            break;
        };
        host.notify_entry_changed(entry.as_str()).await;
    }
}
