pub mod api;
pub mod payload;
pub mod predicate;

pub use payload::ChainhookPayload;
pub use predicate::{Network, Predicate};
