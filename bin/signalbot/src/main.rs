use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::{Config, MarketData, Notifier, TradeStore};
use engine::{
    BinanceMarketData, ScanScheduler, Scanner, ScannerConfig, SqliteTradeStore, Supervisor,
};
use monitor::TradeMonitor;
use strategy::{BreakoutDetector, SignalDetector, StrategyParams};
use telegram_ctrl::{start_bot, BotDeps, TelegramNotifier};

const RESTART_DELAY: Duration = Duration::from_secs(5);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(
        pairs = ?cfg.pairs,
        timeframe = %cfg.timeframe,
        window = %cfg.active_window,
        "SignalBot starting"
    );

    // ── Database ──────────────────────────────────────────────────────────────
    std::fs::create_dir_all(&cfg.data_dir)
        .unwrap_or_else(|e| panic!("Failed to create data dir '{}': {e}", cfg.data_dir));
    let store = Arc::new(
        SqliteTradeStore::connect(&cfg.database_url)
            .await
            .unwrap_or_else(|e| panic!("Failed to open trade store: {e}")),
    );

    // ── Market data ───────────────────────────────────────────────────────────
    let market: Arc<dyn MarketData> = Arc::new(
        BinanceMarketData::new().unwrap_or_else(|e| panic!("Failed to build market client: {e}")),
    );

    // ── Strategy ──────────────────────────────────────────────────────────────
    let params = match &cfg.strategy_config_path {
        Some(path) => StrategyParams::load(path)
            .unwrap_or_else(|e| panic!("Failed to load strategy config '{path}': {e}")),
        None => StrategyParams::default(),
    };
    let breakout = BreakoutDetector::new(params)
        .unwrap_or_else(|e| panic!("Invalid strategy parameters: {e}"));
    info!(detector = breakout.name(), params = ?breakout.params(), "Signal detector ready");
    let detector: Arc<dyn SignalDetector> = Arc::new(breakout);

    // ── Notifications ─────────────────────────────────────────────────────────
    let telegram = TelegramNotifier::new(cfg.telegram_token.clone(), cfg.telegram_chat_id);
    if !telegram.is_configured() {
        warn!("TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID missing; messages will only be logged");
    }
    let notifier: Arc<dyn Notifier> = Arc::new(telegram);
    let trade_store: Arc<dyn TradeStore> = store.clone();

    // ── Scanner + monitor ─────────────────────────────────────────────────────
    let scanner = Arc::new(Scanner::new(
        ScannerConfig {
            pairs: cfg.pairs.clone(),
            timeframe: cfg.timeframe.clone(),
            max_bars: cfg.max_bars,
        },
        cfg.active_window,
        market.clone(),
        detector,
        notifier.clone(),
        trade_store.clone(),
    ));
    let scheduler = Arc::new(ScanScheduler::new(scanner.clone(), cfg.scan_interval));
    let monitor = Arc::new(TradeMonitor::new(
        trade_store.clone(),
        market,
        notifier,
        cfg.monitor_poll_interval,
    ));

    // ── Spawn supervised loops ────────────────────────────────────────────────
    let mut supervisor = Supervisor::new(RESTART_DELAY);

    supervisor.spawn("trade-monitor", move |shutdown| {
        let monitor = monitor.clone();
        async move { monitor.run(shutdown).await }
    });

    supervisor.spawn("scan-scheduler", move |shutdown| {
        let scheduler = scheduler.clone();
        async move { scheduler.run(shutdown).await }
    });

    match cfg.telegram_token.clone() {
        Some(token) => {
            let deps = BotDeps {
                scanner,
                store: trade_store,
                allowed_user_ids: Arc::new(cfg.telegram_allowed_user_ids.clone()),
            };
            supervisor.spawn("telegram", move |shutdown| {
                start_bot(token.clone(), deps.clone(), shutdown)
            });
        }
        None => info!("TELEGRAM_BOT_TOKEN missing; Telegram commands disabled"),
    }

    // Keep main alive
    info!("All subsystems started. Waiting for shutdown signal.");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; shutting down");
    }
    info!("Shutdown signal received.");

    supervisor.shutdown(SHUTDOWN_GRACE).await;
    store.close().await;
    info!("SignalBot stopped.");
}
