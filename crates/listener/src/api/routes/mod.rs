pub mod analytics;
pub mod chainhook;
