pub mod config;
pub mod error;
pub mod exchange;
pub mod notify;
pub mod store;
pub mod types;
pub mod window;

pub use config::Config;
pub use error::{Error, Result};
pub use exchange::MarketData;
pub use notify::Notifier;
pub use store::TradeStore;
pub use types::*;
pub use window::ActiveWindow;
