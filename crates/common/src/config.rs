use std::time::Duration;

use crate::ActiveWindow;

/// Pairs scanned when `PAIRS` is not set.
pub const DEFAULT_PAIRS: &[&str] = &["YALA/USDT", "RUNE/USDT", "BTC/USDT", "ETH/USDT", "SOL/USDT"];

/// All configuration loaded from environment variables at startup.
/// Malformed values cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram (both optional; notifications are logged only when missing)
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
    /// Empty means every user may issue commands.
    pub telegram_allowed_user_ids: Vec<i64>,

    // Database
    pub data_dir: String,
    pub database_url: String,

    // Market
    pub pairs: Vec<String>,
    pub timeframe: String,
    pub max_bars: usize,

    // Cadence
    pub scan_interval: Duration,
    pub monitor_poll_interval: Duration,
    pub active_window: ActiveWindow,

    // Strategy config file path
    pub strategy_config_path: Option<String>,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let data_dir = optional_env("DATA_DIR").unwrap_or_else(|| "data".to_string());
        let database_url = optional_env("DATABASE_URL")
            .unwrap_or_else(|| format!("sqlite://{data_dir}/trades.db"));

        let pairs = match optional_env("PAIRS") {
            Some(raw) => parse_list(&raw),
            None => DEFAULT_PAIRS.iter().map(|p| p.to_string()).collect(),
        };
        if pairs.is_empty() {
            panic!("PAIRS must list at least one trading pair");
        }

        let telegram_allowed_user_ids = optional_env("TELEGRAM_ALLOWED_USER_IDS")
            .map(|raw| {
                parse_list(&raw)
                    .iter()
                    .map(|s| {
                        s.parse::<i64>().unwrap_or_else(|_| {
                            panic!("TELEGRAM_ALLOWED_USER_IDS contains non-numeric ID: '{s}'")
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let active_window = ActiveWindow::parse(
            &optional_env("ACTIVE_START").unwrap_or_else(|| "07:00".to_string()),
            &optional_env("ACTIVE_END").unwrap_or_else(|| "23:00".to_string()),
            parsed_env("ACTIVE_UTC_OFFSET_MINUTES", 330),
        )
        .unwrap_or_else(|e| panic!("Invalid active window: {e}"));

        Config {
            telegram_token: optional_env("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: optional_env("TELEGRAM_CHAT_ID").map(|v| {
                v.parse()
                    .unwrap_or_else(|_| panic!("TELEGRAM_CHAT_ID must be numeric, got: '{v}'"))
            }),
            telegram_allowed_user_ids,
            data_dir,
            database_url,
            pairs,
            timeframe: optional_env("TIMEFRAME").unwrap_or_else(|| "15m".to_string()),
            max_bars: parsed_env("MAX_BARS", 400),
            scan_interval: interval_secs(
                "SCAN_INTERVAL_MINUTES",
                parsed_env("SCAN_INTERVAL_MINUTES", 60),
                60,
            ),
            monitor_poll_interval: interval_secs(
                "MONITOR_POLL_SECONDS",
                parsed_env("MONITOR_POLL_SECONDS", 30),
                1,
            ),
            active_window,
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH"),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match optional_env(key) {
        Some(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("Environment variable '{key}' has invalid value: '{v}'")),
        None => default,
    }
}

/// `value × secs_per_unit` seconds. Zero would turn a polling loop into a
/// busy loop, so it is refused like any other malformed value.
fn interval_secs(key: &str, value: u64, secs_per_unit: u64) -> Duration {
    if value == 0 {
        panic!("Environment variable '{key}' must be at least 1");
    }
    let secs = value
        .checked_mul(secs_per_unit)
        .unwrap_or_else(|| panic!("Environment variable '{key}' is too large: {value}"));
    Duration::from_secs(secs)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_parsing_trims_and_skips_blanks() {
        assert_eq!(
            parse_list(" BTC/USDT, ,ETH/USDT ,"),
            vec!["BTC/USDT".to_string(), "ETH/USDT".to_string()]
        );
    }

    #[test]
    fn intervals_scale_to_seconds() {
        assert_eq!(interval_secs("SCAN_INTERVAL_MINUTES", 60, 60), Duration::from_secs(3600));
        assert_eq!(interval_secs("MONITOR_POLL_SECONDS", 30, 1), Duration::from_secs(30));
    }

    #[test]
    #[should_panic(expected = "must be at least 1")]
    fn zero_interval_is_rejected() {
        interval_secs("MONITOR_POLL_SECONDS", 0, 1);
    }

    #[test]
    #[should_panic(expected = "too large")]
    fn overflowing_interval_is_rejected() {
        interval_secs("SCAN_INTERVAL_MINUTES", u64::MAX, 60);
    }
}
