use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tim_api::{app, worker, AppState};
use tim_catalog::Catalog;
use tim_core::checkout::CheckoutGateway;
use tim_core::network::ManualSwitch;
use tim_core::storage::KeyValueStore;
use tim_order::{InternetControl, MockCheckoutGateway};
use tim_store::app_config::Config;
use tim_store::{FileStore, FunctionsCheckoutGateway, MemoryStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tim_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting TIM API on port {}", config.server.port);

    // Catalog
    let catalog = match &config.catalog.path {
        Some(path) => Catalog::load(path).with_context(|| format!("Failed to load catalog from {}", path))?,
        None => Catalog::standard(),
    };
    tracing::info!("Catalog loaded with {} products", catalog.products().len());
    let catalog = Arc::new(catalog);

    // Configuration storage
    let store: Arc<dyn KeyValueStore> = match &config.storage.path {
        Some(path) => Arc::new(FileStore::open(path).with_context(|| format!("Failed to open store at {}", path))?),
        None => {
            tracing::warn!("No storage path configured, configurations will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    // Checkout backend
    let gateway: Arc<dyn CheckoutGateway> = match (&config.checkout.functions_url, config.checkout.mock) {
        (Some(url), false) => Arc::new(
            FunctionsCheckoutGateway::new(
                url,
                config.checkout.anon_key.clone(),
                Duration::from_secs(config.checkout.timeout_seconds),
            )
            .context("Failed to build checkout client")?,
        ),
        _ => {
            tracing::info!("Using mock checkout");
            Arc::new(MockCheckoutGateway::new())
        }
    };

    // Internet switch monitor
    let internet = Arc::new(InternetControl::new(Arc::new(ManualSwitch::new(false, true))));
    internet
        .clone()
        .spawn_monitor(Duration::from_millis(config.internet.poll_interval_ms.max(1)));

    let app_state = AppState::new(catalog, store, gateway, internet.clone());
    app_state.spawn_session_sweeper(
        Duration::from_secs(config.sessions.sweep_interval_seconds.max(1)),
        Duration::from_secs(config.sessions.idle_timeout_seconds),
    );

    tokio::spawn(worker::start_event_logger(
        app_state.priced_tx.subscribe(),
        app_state.checkout_tx.subscribe(),
        internet.subscribe(),
    ));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
