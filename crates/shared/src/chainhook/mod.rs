pub mod client;
pub mod error;

pub use client::ChainhookClient;
pub use error::ChainhookError;
