use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{Direction, Trade, TradeStatus, TradeStore};
use monitor::{PollReport, TradeMonitor};
use paper::{MemoryTradeStore, PaperMarket, RecordingNotifier};
use tokio::sync::watch;

struct Harness {
    store: Arc<MemoryTradeStore>,
    market: Arc<PaperMarket>,
    notifier: Arc<RecordingNotifier>,
    monitor: TradeMonitor,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryTradeStore::new());
    let market = Arc::new(PaperMarket::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let monitor = TradeMonitor::new(
        store.clone(),
        market.clone(),
        notifier.clone(),
        Duration::from_millis(10),
    );
    Harness {
        store,
        market,
        notifier,
        monitor,
    }
}

fn open_trade(pair: &str, direction: Direction, entry: f64, sl: f64, tp: f64) -> Trade {
    Trade {
        id: 0,
        pair: pair.into(),
        direction,
        entry,
        sl,
        tp,
        status: TradeStatus::Open,
        pnl: 0.0,
        created_at: Utc::now(),
        closed_at: None,
    }
}

#[tokio::test]
async fn long_trade_closes_at_take_profit() {
    let h = harness();
    let id = h
        .store
        .seed(open_trade("BTC/USDT", Direction::Long, 100.0, 95.0, 110.0))
        .await;
    h.market.set_price("BTC/USDT", 110.0).await;

    let report = h.monitor.poll_once().await;

    assert_eq!(report.closed, 1);
    let trade = h.store.get(id).await.unwrap();
    assert_eq!(trade.status, TradeStatus::Tp);
    assert_eq!(trade.pnl, 10.0);
    assert!(trade.closed_at.is_some());

    let closes = h.notifier.closes().await;
    assert_eq!(closes.len(), 1);
    assert_eq!(closes[0].status, TradeStatus::Tp);
    assert_eq!(closes[0].pnl, 10.0);
}

#[tokio::test]
async fn long_trade_closes_at_stop_loss() {
    let h = harness();
    let id = h
        .store
        .seed(open_trade("BTC/USDT", Direction::Long, 100.0, 95.0, 110.0))
        .await;
    h.market.set_price("BTC/USDT", 95.0).await;

    h.monitor.poll_once().await;

    let trade = h.store.get(id).await.unwrap();
    assert_eq!(trade.status, TradeStatus::Sl);
    assert_eq!(trade.pnl, -5.0);
}

#[tokio::test]
async fn trade_between_levels_stays_open() {
    let h = harness();
    let id = h
        .store
        .seed(open_trade("BTC/USDT", Direction::Long, 100.0, 95.0, 110.0))
        .await;
    h.market.set_price("BTC/USDT", 102.0).await;

    let report = h.monitor.poll_once().await;

    assert_eq!(
        report,
        PollReport {
            checked: 1,
            closed: 0,
            skipped: 0,
            failed: 0
        }
    );
    assert_eq!(h.store.get(id).await.unwrap().status, TradeStatus::Open);
    assert!(h.notifier.closes().await.is_empty());
}

#[tokio::test]
async fn short_trade_closes_at_take_profit() {
    let h = harness();
    let id = h
        .store
        .seed(open_trade("ETH/USDT", Direction::Short, 2000.0, 2100.0, 1800.0))
        .await;
    h.market.set_price("ETH/USDT", 1799.0).await;

    h.monitor.poll_once().await;

    let trade = h.store.get(id).await.unwrap();
    assert_eq!(trade.status, TradeStatus::Tp);
    assert_eq!(trade.pnl, 200.0);
}

#[tokio::test]
async fn missing_price_skips_trade_without_error() {
    let h = harness();
    let id = h
        .store
        .seed(open_trade("YALA/USDT", Direction::Long, 1.0, 0.9, 1.2))
        .await;

    let report = h.monitor.poll_once().await;

    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(h.store.get(id).await.unwrap().status, TradeStatus::Open);
}

#[tokio::test]
async fn closed_trade_is_never_revisited() {
    let h = harness();
    let id = h
        .store
        .seed(open_trade("BTC/USDT", Direction::Long, 100.0, 95.0, 110.0))
        .await;
    h.market.set_price("BTC/USDT", 111.0).await;
    h.monitor.poll_once().await;

    // Price collapses afterwards: the TP close must stand.
    h.market.set_price("BTC/USDT", 50.0).await;
    let report = h.monitor.poll_once().await;

    assert_eq!(report, PollReport::default());
    let trade = h.store.get(id).await.unwrap();
    assert_eq!(trade.status, TradeStatus::Tp);
    assert_eq!(trade.pnl, 10.0);
    assert_eq!(h.notifier.closes().await.len(), 1);
}

#[tokio::test]
async fn second_close_of_the_same_trade_is_a_no_op() {
    let h = harness();
    let id = h
        .store
        .seed(open_trade("BTC/USDT", Direction::Long, 100.0, 95.0, 110.0))
        .await;
    // Two overlapping passes racing on the same trade: only the first close lands.
    assert!(h
        .store
        .close_by_id(id, common::Exit::TakeProfit, 10.0)
        .await
        .unwrap());
    assert!(!h
        .store
        .close_by_id(id, common::Exit::StopLoss, -5.0)
        .await
        .unwrap());
    assert_eq!(h.store.get(id).await.unwrap().status, TradeStatus::Tp);
}

#[tokio::test]
async fn notification_failure_does_not_roll_back_close() {
    let h = harness();
    let id = h
        .store
        .seed(open_trade("SOL/USDT", Direction::Long, 100.0, 95.0, 110.0))
        .await;
    h.market.set_price("SOL/USDT", 90.0).await;
    h.notifier.fail_sends(true);

    let report = h.monitor.poll_once().await;

    assert_eq!(report.closed, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(h.store.get(id).await.unwrap().status, TradeStatus::Sl);
}

#[tokio::test]
async fn one_failing_trade_does_not_block_the_others() {
    let h = harness();
    let bad = h
        .store
        .seed(open_trade("BTC/USDT", Direction::Long, 100.0, 95.0, 110.0))
        .await;
    let good = h
        .store
        .seed(open_trade("ETH/USDT", Direction::Long, 100.0, 95.0, 110.0))
        .await;
    h.store.fail_close_for(bad).await;
    h.market.set_price("BTC/USDT", 120.0).await;
    h.market.set_price("ETH/USDT", 120.0).await;

    let report = h.monitor.poll_once().await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.closed, 1);
    assert_eq!(h.store.get(bad).await.unwrap().status, TradeStatus::Open);
    assert_eq!(h.store.get(good).await.unwrap().status, TradeStatus::Tp);
}

#[tokio::test]
async fn listing_failure_ends_the_pass_quietly() {
    let h = harness();
    h.store
        .seed(open_trade("BTC/USDT", Direction::Long, 100.0, 95.0, 110.0))
        .await;
    h.store.fail_listing(true);

    assert_eq!(h.monitor.poll_once().await, PollReport::default());
}

#[tokio::test]
async fn run_loop_closes_trades_and_stops_on_shutdown() {
    let h = harness();
    let id = h
        .store
        .seed(open_trade("BTC/USDT", Direction::Long, 100.0, 95.0, 110.0))
        .await;
    h.market.set_price("BTC/USDT", 100.0).await;

    let monitor = Arc::new(h.monitor);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn({
        let monitor = monitor.clone();
        async move { monitor.run(shutdown_rx).await }
    });

    tokio::time::sleep(Duration::from_millis(30)).await;
    h.market.set_price("BTC/USDT", 94.0).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("monitor did not stop")
        .unwrap();

    assert_eq!(h.store.get(id).await.unwrap().status, TradeStatus::Sl);
}
