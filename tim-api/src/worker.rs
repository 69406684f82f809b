use tim_shared::models::events::{CheckoutStartedEvent, ConfigurationPricedEvent, InternetStatusChangedEvent};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

/// Drain the in-process event channels into the log until all senders drop
pub async fn start_event_logger(
    mut priced: broadcast::Receiver<ConfigurationPricedEvent>,
    mut checkouts: broadcast::Receiver<CheckoutStartedEvent>,
    mut internet: broadcast::Receiver<InternetStatusChangedEvent>,
) {
    info!("Event logger started");

    loop {
        tokio::select! {
            event = priced.recv() => match event {
                Ok(e) => debug!(
                    session_id = %e.session_id,
                    product_id = ?e.product_id,
                    total_price = e.total_price,
                    "configuration priced"
                ),
                Err(RecvError::Lagged(n)) => warn!("Event logger skipped {} pricing events", n),
                Err(RecvError::Closed) => break,
            },
            event = checkouts.recv() => match event {
                Ok(e) => info!(
                    session_id = %e.session_id,
                    order_id = %e.order_id,
                    amount_cents = e.amount_cents,
                    "checkout started"
                ),
                Err(RecvError::Lagged(n)) => warn!("Event logger skipped {} checkout events", n),
                Err(RecvError::Closed) => break,
            },
            event = internet.recv() => match event {
                Ok(e) => info!(
                    allow_internet = e.allow_internet,
                    is_connected = e.is_connected,
                    "internet status changed"
                ),
                Err(RecvError::Lagged(n)) => warn!("Event logger skipped {} internet events", n),
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!("Event logger stopped");
}
