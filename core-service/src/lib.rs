//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (folder access, the
//! sync folder preference) into the shared Rust core. Desktop apps typically
//! enable the `desktop-shims` feature (which depends on `bridge-desktop`);
//! mobile hosts pass their own bridge handles into [`CoreDependencies`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{
    preferences::PreferenceStore,
    storage::{FolderAccess, FolderRef},
};
#[cfg(feature = "desktop-shims")]
use core_library::db::{create_pool, DatabaseConfig};
use core_library::store::ProgressStore;
use core_runtime::events::{CoreEvent, EventBus, Receiver};
use core_sync::{SyncConfig, SyncCoordinator};
use sqlx::SqlitePool;
use tracing::info;

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub folder_access: Arc<dyn FolderAccess>,
    pub preferences: Arc<dyn PreferenceStore>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        folder_access: Arc<dyn FolderAccess>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            folder_access,
            preferences,
        }
    }
}

/// Primary façade exposed to host applications.
///
/// Owns the progress store, the event bus, and the sync coordinator. The
/// service is cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct CoreService {
    deps: Arc<CoreDependencies>,
    store: Arc<ProgressStore>,
    events: EventBus,
    coordinator: Arc<SyncCoordinator>,
}

impl CoreService {
    /// Create a new service from the provided dependencies and an already
    /// bootstrapped database pool. Sync does not run until
    /// [`CoreService::start_sync`] is called.
    pub async fn new(
        deps: CoreDependencies,
        pool: SqlitePool,
        sync_config: SyncConfig,
    ) -> Result<Self> {
        let deps = Arc::new(deps);
        let store = Arc::new(ProgressStore::new(pool).await?);
        let events = EventBus::default();

        let coordinator = Arc::new(SyncCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&deps.preferences),
            Arc::clone(&deps.folder_access),
            events.clone(),
            sync_config,
        ));

        info!("Core service initialized");
        Ok(Self {
            deps,
            store,
            events,
            coordinator,
        })
    }

    /// Launch the sync pipelines. Idempotent.
    pub fn start_sync(&self) {
        self.coordinator.start();
    }

    /// Stop the sync pipelines. Idempotent.
    pub fn shutdown_sync(&self) {
        self.coordinator.shutdown();
    }

    /// Whether the sync pipelines have been launched.
    pub fn is_sync_started(&self) -> bool {
        self.coordinator.is_started()
    }

    /// Point synchronization at a shared folder, or disable it with `None`.
    pub async fn set_sync_folder(&self, folder: Option<FolderRef>) -> Result<()> {
        self.deps.preferences.set_sync_folder(folder).await?;
        Ok(())
    }

    /// The local progress store.
    pub fn library(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.store)
    }

    /// Subscribe to core events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Creates the SQLite pool, persists the sync folder preference in the same
/// database, and accesses shared folders through `tokio::fs`.
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(
    db_config: DatabaseConfig,
    sync_config: SyncConfig,
) -> Result<CoreService> {
    let pool = create_pool(db_config).await?;
    let preferences = Arc::new(bridge_desktop::SqlitePreferenceStore::new(pool.clone()).await?);
    let folder_access = Arc::new(bridge_desktop::TokioFolderAccess::new());

    let deps = CoreDependencies::new(folder_access, preferences);
    CoreService::new(deps, pool, sync_config).await
}
