pub mod rules;
pub mod watcher;

pub use rules::evaluate_exit;
pub use watcher::{PollReport, TradeMonitor, DEFAULT_POLL_INTERVAL};
