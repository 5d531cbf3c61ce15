use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// One OHLCV candle as returned by the market data source.
/// Series are always ordered by `open_time` ascending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Direction of a hypothetical trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LONG" => Ok(Direction::Long),
            "SHORT" => Ok(Direction::Short),
            other => Err(Error::Other(format!("unknown direction '{other}'"))),
        }
    }
}

/// Entry signal produced by a detector from the last closed candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub pair: String,
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// 0–100.
    pub confidence: u8,
    pub reason: String,
}

/// Lifecycle state of a recorded trade. `Tp` and `Sl` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Open,
    Tp,
    Sl,
}

impl TradeStatus {
    pub fn is_closed(self) -> bool {
        self != TradeStatus::Open
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeStatus::Open => write!(f, "OPEN"),
            TradeStatus::Tp => write!(f, "TP"),
            TradeStatus::Sl => write!(f, "SL"),
        }
    }
}

impl FromStr for TradeStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(TradeStatus::Open),
            "TP" => Ok(TradeStatus::Tp),
            "SL" => Ok(TradeStatus::Sl),
            other => Err(Error::Other(format!("unknown trade status '{other}'"))),
        }
    }
}

/// How an open trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exit {
    TakeProfit,
    StopLoss,
}

impl From<Exit> for TradeStatus {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::TakeProfit => TradeStatus::Tp,
            Exit::StopLoss => TradeStatus::Sl,
        }
    }
}

/// A hypothetical trade as recorded in the trade store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub pair: String,
    pub direction: Direction,
    pub entry: f64,
    pub sl: f64,
    pub tp: f64,
    pub status: TradeStatus,
    /// Realized PnL in quote units per unit of base; 0 while open.
    pub pnl: f64,
    pub created_at: DateTime<Utc>,
    /// `None` while the trade is open.
    pub closed_at: Option<DateTime<Utc>>,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        !self.status.is_closed()
    }
}
