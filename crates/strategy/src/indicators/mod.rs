pub mod atr;
pub mod ema;
pub mod frame;
pub mod rsi;
pub mod volume;

pub use atr::{atr, true_range};
pub use ema::ema;
pub use frame::{IndicatorFrame, IndicatorRow};
pub use rsi::rsi;
pub use volume::volume_sma;
