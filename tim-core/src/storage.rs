use crate::CoreResult;
use uuid::Uuid;

/// Storage key of the single persisted configuration
pub const CONFIGURATION_KEY: &str = "tim-configuration";

/// Per-session variant of [`CONFIGURATION_KEY`]
pub fn session_key(session_id: Uuid) -> String {
    format!("{}:{}", CONFIGURATION_KEY, session_id)
}

/// Local key-value storage (string keys, string values).
///
/// Calls are synchronous: a configuration edit is a single
/// recompute-then-write with no suspension point.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> CoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> CoreResult<()>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> CoreResult<()>;
}
