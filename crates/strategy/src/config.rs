use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Tunable parameters of the breakout strategy.
///
/// Example `config/strategy.toml` (every key optional):
/// ```toml
/// ema_fast = 20
/// ema_slow = 50
/// rsi_long = 53.0
/// rsi_short = 47.0
/// atr_break_k = 0.12
/// sl_mult = 1.3
/// tp_mult = 1.8
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyParams {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_len: usize,
    /// LONG requires RSI at or above this.
    pub rsi_long: f64,
    /// SHORT requires RSI at or below this.
    pub rsi_short: f64,
    pub atr_len: usize,
    /// Fraction of ATR added beyond the previous candle's high/low.
    pub atr_break_k: f64,
    /// Trailing window of the volume average.
    pub vol_sma: usize,
    /// Volume must exceed `vol_mult` × its average.
    pub vol_mult: f64,
    pub sl_mult: f64,
    pub tp_mult: f64,
    pub confidence: u8,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            ema_fast: 20,
            ema_slow: 50,
            rsi_len: 14,
            rsi_long: 53.0,
            rsi_short: 47.0,
            atr_len: 14,
            atr_break_k: 0.12,
            vol_sma: 20,
            vol_mult: 1.0,
            sl_mult: 1.3,
            tp_mult: 1.8,
            confidence: 75,
        }
    }
}

impl StrategyParams {
    /// Load from a TOML file and validate.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let params: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("invalid strategy config: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if [self.ema_fast, self.ema_slow, self.rsi_len, self.atr_len, self.vol_sma].contains(&0) {
            return Err(Error::Config("indicator lengths must be >= 1".into()));
        }
        if self.ema_fast >= self.ema_slow {
            return Err(Error::Config(format!(
                "ema_fast ({}) must be less than ema_slow ({})",
                self.ema_fast, self.ema_slow
            )));
        }
        if self.rsi_short > self.rsi_long {
            return Err(Error::Config(format!(
                "rsi_short ({}) must not exceed rsi_long ({})",
                self.rsi_short, self.rsi_long
            )));
        }
        if !(self.sl_mult > 0.0 && self.tp_mult > 0.0) {
            return Err(Error::Config("sl_mult and tp_mult must be positive".into()));
        }
        if self.atr_break_k < 0.0 || self.vol_mult < 0.0 {
            return Err(Error::Config("atr_break_k and vol_mult must not be negative".into()));
        }
        if self.confidence > 100 {
            return Err(Error::Config("confidence must be within 0..=100".into()));
        }
        Ok(())
    }
}
