use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tim_core::network::{InternetStatus, SwitchProbe};
use tim_core::CoreResult;
use tim_shared::models::events::InternetStatusChangedEvent;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Internet kill-switch service.
///
/// The physical switch wins whenever it moves; between moves the software
/// override (`toggle`, `force_on`, `force_off`) decides. Every change holds
/// the status write lock from reading the old state until the new rules are
/// applied, so the firewall and the reported status never disagree.
pub struct InternetControl {
    probe: Arc<dyn SwitchProbe>,
    status: RwLock<InternetStatus>,
    events: broadcast::Sender<InternetStatusChangedEvent>,
}

impl InternetControl {
    pub fn new(probe: Arc<dyn SwitchProbe>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            probe,
            status: RwLock::new(InternetStatus::offline()),
            events,
        }
    }

    pub async fn status(&self) -> InternetStatus {
        self.status.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InternetStatusChangedEvent> {
        self.events.subscribe()
    }

    /// Read the switch once; apply its position if it moved since the last
    /// poll. Returns whether anything changed.
    pub async fn poll(&self) -> CoreResult<bool> {
        let position = self.probe.read_switch().await?;
        let mut status = self.status.write().await;
        if position == status.switch_state {
            return Ok(false);
        }

        debug!("Internet switch moved to {}", position);
        self.apply(&mut status, position, Some(position)).await?;
        Ok(true)
    }

    pub async fn toggle(&self) -> CoreResult<InternetStatus> {
        let mut status = self.status.write().await;
        let allow = !status.allow_internet;
        self.apply(&mut status, allow, None).await
    }

    pub async fn force_on(&self) -> CoreResult<InternetStatus> {
        let mut status = self.status.write().await;
        self.apply(&mut status, true, None).await
    }

    pub async fn force_off(&self) -> CoreResult<InternetStatus> {
        let mut status = self.status.write().await;
        self.apply(&mut status, false, None).await
    }

    /// Poll the probe every `interval` until the returned handle is aborted
    pub fn spawn_monitor(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = self.poll().await {
                    error!("Switch monitoring error: {}", e);
                }
            }
        })
    }

    async fn apply(
        &self,
        status: &mut InternetStatus,
        allow_internet: bool,
        switch_state: Option<bool>,
    ) -> CoreResult<InternetStatus> {
        self.probe.apply_rules(allow_internet).await?;
        let is_connected = allow_internet && self.probe.test_connectivity().await;

        if let Some(position) = switch_state {
            status.switch_state = position;
        }
        status.allow_internet = allow_internet;
        status.is_connected = is_connected;
        status.last_state_change = Utc::now();
        let snapshot = status.clone();

        info!(
            "Internet access {} (connected: {})",
            if allow_internet { "allowed" } else { "blocked" },
            is_connected
        );

        // No subscribers is fine
        let _ = self.events.send(InternetStatusChangedEvent {
            allow_internet,
            is_connected,
            timestamp: snapshot.last_state_change.timestamp(),
        });

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tim_core::network::ManualSwitch;

    fn control(position: bool) -> (InternetControl, Arc<ManualSwitch>) {
        let switch = Arc::new(ManualSwitch::new(position, true));
        (InternetControl::new(switch.clone()), switch)
    }

    #[tokio::test]
    async fn test_poll_follows_switch() {
        let (control, switch) = control(false);
        assert!(!control.poll().await.unwrap());

        switch.flip(true);
        assert!(control.poll().await.unwrap());
        let status = control.status().await;
        assert!(status.switch_state && status.allow_internet && status.is_connected);
        assert!(switch.rules_open());

        // No movement, no change
        assert!(!control.poll().await.unwrap());
    }

    #[tokio::test]
    async fn test_override_holds_until_switch_moves() {
        let (control, switch) = control(false);

        control.force_on().await.unwrap();
        assert!(!control.poll().await.unwrap());
        assert!(control.status().await.allow_internet);

        switch.flip(true);
        control.poll().await.unwrap();
        switch.flip(false);
        control.poll().await.unwrap();
        assert!(!control.status().await.allow_internet);
    }

    #[tokio::test]
    async fn test_toggle_and_unreachable_network() {
        let (control, switch) = control(false);
        switch.set_reachable(false);

        let status = control.toggle().await.unwrap();
        assert!(status.allow_internet);
        assert!(!status.is_connected);

        let status = control.toggle().await.unwrap();
        assert!(!status.allow_internet);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_are_serialized() {
        let (control, switch) = control(false);
        let control = Arc::new(control);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let control = control.clone();
                tokio::spawn(async move { control.toggle().await.unwrap() })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().allow_internet);
        }

        // Each toggle saw the previous one's result
        assert_eq!(results.iter().filter(|allowed| **allowed).count(), 4);
        let status = control.status().await;
        assert!(!status.allow_internet);
        assert_eq!(switch.rules_open(), status.allow_internet);
    }

    #[tokio::test]
    async fn test_poll_and_override_agree_with_rules() {
        let (control, switch) = control(false);
        let control = Arc::new(control);

        switch.flip(true);
        let poller = {
            let control = control.clone();
            tokio::spawn(async move { control.poll().await.unwrap() })
        };
        let forced = control.force_off().await.unwrap();
        poller.await.unwrap();

        let status = control.status().await;
        assert_eq!(switch.rules_open(), status.allow_internet);
        assert!(status.last_state_change >= forced.last_state_change);
    }

    #[tokio::test]
    async fn test_changes_are_broadcast() {
        let (control, _) = control(false);
        let mut rx = control.subscribe();

        control.force_on().await.unwrap();
        let event = rx.recv().await.unwrap();
        assert!(event.allow_internet);
    }
}
