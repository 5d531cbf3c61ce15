pub mod binance;
pub mod lifecycle;
pub mod retry;
pub mod scanner;
pub mod scheduler;
pub mod store;

pub use binance::BinanceMarketData;
pub use lifecycle::Supervisor;
pub use retry::{Backoff, RetryPolicy};
pub use scanner::{ScanOutcome, ScanTrigger, Scanner, ScannerConfig};
pub use scheduler::ScanScheduler;
pub use store::SqliteTradeStore;
