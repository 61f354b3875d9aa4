pub mod aggregator;
pub mod api;
pub mod cli;
pub mod observer;
pub mod predicates;

pub use aggregator::{Aggregator, AmountExtractor, NoAmounts};
pub use api::server::start_server;
pub use cli::Cli;
pub use observer::ChainhookObserver;
