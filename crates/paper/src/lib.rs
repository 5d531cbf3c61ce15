//! In-memory stand-ins for the bot's collaborators.
//!
//! Nothing here talks to the network or disk: prices and candles are
//! scripted, trades live in a `Vec`, and notifications are recorded for
//! inspection. Used to exercise the scanner and monitor without Binance,
//! SQLite or Telegram.

mod market;
mod notifier;
mod store;

pub use market::PaperMarket;
pub use notifier::{RecordedClose, RecordingNotifier};
pub use store::MemoryTradeStore;
