pub mod pii;
pub mod currency;
pub mod models;

pub use currency::Currency;
pub use pii::Masked;
