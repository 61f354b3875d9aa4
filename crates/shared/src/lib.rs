pub mod chainhook;
pub mod models;
pub mod security;
pub mod utils;
