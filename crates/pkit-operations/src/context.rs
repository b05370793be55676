use std::sync::Arc;

use pkit_catalog::{Catalog, FsCatalog};
use pkit_config::config::Config;
use pkit_core::{error::PkitError, PkitResult};
use pkit_events::{EventSinkHandle, OperationId, PkitEvent, Status};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

pub type SharedCatalog = Arc<Mutex<Box<dyn Catalog>>>;

/// Exclusive access to the catalog, held for the whole of an operation.
pub type CatalogGuard = OwnedMutexGuard<Box<dyn Catalog>>;

/// Everything an operation needs: configuration, where to send events and the catalog.
///
/// The catalog is only reachable through an exclusive guard, so at most one
/// transaction is ever open against it.
#[derive(Clone)]
pub struct PkitContext {
    config: Arc<Config>,
    events: EventSinkHandle,
    catalog: SharedCatalog,
}

impl PkitContext {
    pub fn new(config: Config, events: EventSinkHandle, catalog: Box<dyn Catalog>) -> Self {
        Self {
            config: Arc::new(config),
            events,
            catalog: Arc::new(Mutex::new(catalog)),
        }
    }

    /// Opens the file-backed catalog described by `config`.
    pub fn open(config: Config, events: EventSinkHandle) -> PkitResult<Self> {
        let catalog = FsCatalog::open(&config)
            .map_err(|err| PkitError::InitializationFailed(err.to_string()))?;
        debug!("catalog session opened");
        Ok(Self::new(config, events, Box::new(catalog)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &EventSinkHandle {
        &self.events
    }

    pub fn emit(&self, event: PkitEvent) {
        self.events.emit(event);
    }

    pub fn status(&self, op_id: OperationId, status: Status) {
        self.events.emit(PkitEvent::Status {
            op_id,
            status,
        });
    }

    /// Waits for exclusive access to the catalog.
    pub async fn catalog(&self) -> CatalogGuard {
        self.catalog.clone().lock_owned().await
    }
}
