pub mod events;
pub mod pii;

pub use events::{CacheInvalidation, CacheScope};
pub use pii::Masked;
