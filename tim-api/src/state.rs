use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tim_catalog::{Catalog, CloudPricingCalculator, PricingEngine};
use tim_configurator::ConfigurationPricingEngine;
use tim_core::checkout::CheckoutGateway;
use tim_core::storage::{session_key, KeyValueStore};
use tim_order::{CheckoutOrchestrator, InternetControl, OrderLedger};
use tim_shared::models::events::{CheckoutStartedEvent, ConfigurationPricedEvent};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;

pub type SessionEngine = Arc<Mutex<ConfigurationPricingEngine>>;

/// A live session engine and when a request last reached it
pub struct SessionSlot {
    pub engine: SessionEngine,
    pub last_seen: Instant,
}

impl SessionSlot {
    fn new(engine: ConfigurationPricingEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            last_seen: Instant::now(),
        }
    }

    fn touch(&mut self) -> SessionEngine {
        self.last_seen = Instant::now();
        self.engine.clone()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn KeyValueStore>,
    pub sessions: Arc<Mutex<HashMap<Uuid, SessionSlot>>>,
    pub checkout: Arc<CheckoutOrchestrator>,
    pub orders: Arc<Mutex<OrderLedger>>,
    pub savings: Arc<CloudPricingCalculator>,
    pub internet: Arc<InternetControl>,
    pub priced_tx: broadcast::Sender<ConfigurationPricedEvent>,
    pub checkout_tx: broadcast::Sender<CheckoutStartedEvent>,
}

impl AppState {
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn KeyValueStore>,
        gateway: Arc<dyn CheckoutGateway>,
        internet: Arc<InternetControl>,
    ) -> Self {
        let (priced_tx, _) = broadcast::channel(100);
        let (checkout_tx, _) = broadcast::channel(100);
        Self {
            checkout: Arc::new(CheckoutOrchestrator::new(gateway, PricingEngine::new(catalog.clone()))),
            catalog,
            store,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            orders: Arc::new(Mutex::new(OrderLedger::new())),
            savings: Arc::new(CloudPricingCalculator::default()),
            internet,
            priced_tx,
            checkout_tx,
        }
    }

    /// Engine for `session_id`. A session not live in this process is
    /// restored from its persisted configuration, so evicted sessions can be
    /// resumed.
    pub async fn open_session(&self, session_id: Uuid) -> Result<SessionEngine, AppError> {
        if let Some(engine) = self.session(session_id).await {
            return Ok(engine);
        }

        let catalog = self.catalog.clone();
        let store = self.store.clone();
        let engine = tokio::task::spawn_blocking(move || {
            ConfigurationPricingEngine::open(catalog, store, session_key(session_id))
        })
        .await
        .map_err(|e| AppError::InternalServerError(format!("Session restore failed: {}", e)))?;

        let mut sessions = self.sessions.lock().await;
        Ok(sessions
            .entry(session_id)
            .or_insert_with(|| SessionSlot::new(engine))
            .touch())
    }

    pub async fn session(&self, session_id: Uuid) -> Option<SessionEngine> {
        self.sessions
            .lock()
            .await
            .get_mut(&session_id)
            .map(SessionSlot::touch)
    }

    /// Drop sessions idle for at least `max_idle`. Their configurations stay
    /// in the store. Returns how many were dropped.
    pub async fn evict_idle_sessions(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, slot| slot.last_seen.elapsed() < max_idle);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} idle session(s), {} live", evicted, sessions.len());
        }
        evicted
    }

    /// Sweep idle sessions every `interval` until the handle is aborted
    pub fn spawn_session_sweeper(&self, interval: Duration, max_idle: Duration) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                state.evict_idle_sessions(max_idle).await;
            }
        })
    }
}

/// Run `f` against a session engine off the async workers; engine edits
/// write through to a synchronous store
pub async fn with_engine<F, T>(engine: SessionEngine, f: F) -> Result<T, AppError>
where
    F: FnOnce(&mut ConfigurationPricingEngine) -> T + Send + 'static,
    T: Send + 'static,
{
    let mut guard = engine.lock_owned().await;
    tokio::task::spawn_blocking(move || f(&mut guard))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Session task failed: {}", e)))
}
