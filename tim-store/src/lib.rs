pub mod app_config;
pub mod memory_store;
pub mod file_store;
pub mod checkout_client;

pub use memory_store::MemoryStore;
pub use file_store::FileStore;
pub use checkout_client::FunctionsCheckoutGateway;
