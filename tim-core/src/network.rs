use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::CoreResult;

/// Internet access state of the box
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InternetStatus {
    pub is_connected: bool,
    /// Physical switch position
    pub switch_state: bool,
    /// Software override
    pub allow_internet: bool,
    pub last_state_change: DateTime<Utc>,
}

impl InternetStatus {
    pub fn offline() -> Self {
        Self {
            is_connected: false,
            switch_state: false,
            allow_internet: false,
            last_state_change: Utc::now(),
        }
    }
}

impl Default for InternetStatus {
    fn default() -> Self {
        Self::offline()
    }
}

/// Polled hardware boundary for the internet kill switch.
///
/// A real implementation reads a GPIO pin and drives the firewall; tests and
/// development builds use [`ManualSwitch`].
#[async_trait]
pub trait SwitchProbe: Send + Sync {
    /// Current position of the physical switch
    async fn read_switch(&self) -> CoreResult<bool>;

    /// Whether the outside world is reachable right now
    async fn test_connectivity(&self) -> bool;

    /// Open or close outbound traffic
    async fn apply_rules(&self, allow_internet: bool) -> CoreResult<()>;
}

/// In-memory switch that can be flipped from code
#[derive(Debug, Default)]
pub struct ManualSwitch {
    position: AtomicBool,
    reachable: AtomicBool,
    rules_open: AtomicBool,
}

impl ManualSwitch {
    pub fn new(position: bool, reachable: bool) -> Self {
        Self {
            position: AtomicBool::new(position),
            reachable: AtomicBool::new(reachable),
            rules_open: AtomicBool::new(false),
        }
    }

    pub fn flip(&self, position: bool) {
        self.position.store(position, Ordering::SeqCst);
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn rules_open(&self) -> bool {
        self.rules_open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SwitchProbe for ManualSwitch {
    async fn read_switch(&self) -> CoreResult<bool> {
        Ok(self.position.load(Ordering::SeqCst))
    }

    async fn test_connectivity(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    async fn apply_rules(&self, allow_internet: bool) -> CoreResult<()> {
        tracing::info!("Internet access {}", if allow_internet { "enabled" } else { "disabled" });
        self.rules_open.store(allow_internet, Ordering::SeqCst);
        Ok(())
    }
}
