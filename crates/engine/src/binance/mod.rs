mod rest;

pub use rest::{parse_klines, symbol_for, BinanceMarketData};
