use std::sync::Arc;

use teloxide::{dispatching::UpdateHandler, prelude::*, utils::command::BotCommands};
use tokio::sync::watch;
use tracing::{error, info, warn};

use common::{Trade, TradeStore};
use engine::{ScanOutcome, ScanTrigger, Scanner};

use crate::notifier::round6;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies injected into every handler via `dptree`.
#[derive(Clone)]
pub struct BotDeps {
    pub scanner: Arc<Scanner>,
    pub store: Arc<dyn TradeStore>,
    /// Empty means every user is allowed.
    pub allowed_user_ids: Arc<Vec<i64>>,
}

/// Telegram bot commands exposed to the operator.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "SignalBot commands:")]
pub enum Command {
    #[command(description = "Show help")]
    Start,
    #[command(description = "Check the bot is alive (no trade is placed)")]
    TestSignal,
    #[command(description = "Same as /testsignal")]
    Ping,
    #[command(description = "Today's trades and net PnL (UTC)")]
    Pnl,
    #[command(description = "Scan now; add `override` to ignore the active window")]
    ForceScan(String),
}

/// Parse the `/forcescan` argument. `None` for anything unrecognised.
pub fn forcescan_trigger(arg: &str) -> Option<ScanTrigger> {
    match arg.trim() {
        "" => Some(ScanTrigger::Manual),
        a if a.eq_ignore_ascii_case("override") => Some(ScanTrigger::Override),
        _ => None,
    }
}

/// Run the long-polling bot until `shutdown` flips to `true`.
pub async fn start_bot(token: String, deps: BotDeps, mut shutdown: watch::Receiver<bool>) {
    let bot = Bot::new(token);

    match bot.delete_webhook().await {
        Ok(_) => info!("Webhook deleted (polling enabled)"),
        Err(e) => warn!(error = %e, "Could not delete webhook"),
    }

    let mut dispatcher = Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![Arc::new(deps)])
        .build();

    let token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        while !*shutdown.borrow() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }
        match token.shutdown() {
            Ok(done) => done.await,
            Err(e) => warn!(error = ?e, "Dispatcher was not running at shutdown"),
        }
    });

    info!("Telegram bot starting (long-polling)");
    dispatcher.dispatch().await;
    info!("Telegram bot stopped");
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(handle_start))
        .branch(case![Command::TestSignal].endpoint(handle_liveness))
        .branch(case![Command::Ping].endpoint(handle_liveness))
        .branch(case![Command::Pnl].endpoint(handle_pnl))
        .branch(case![Command::ForceScan(arg)].endpoint(handle_forcescan));

    Update::filter_message()
        .filter_map(|msg: Message| msg.from().map(|u| u.id))
        .filter_async(auth_filter)
        .branch(command_handler)
}

/// Silently drop messages from users not in the allowed list.
async fn auth_filter(user_id: UserId, deps: Arc<BotDeps>) -> bool {
    let uid = user_id.0 as i64;
    let allowed = deps.allowed_user_ids.is_empty() || deps.allowed_user_ids.contains(&uid);
    if !allowed {
        warn!(user_id = uid, "Unauthorized Telegram access attempt");
    }
    allowed
}

async fn handle_start(bot: Bot, msg: Message) -> HandlerResult {
    let text = format!("🤖 SignalBot online.\n\n{}", Command::descriptions());
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_liveness(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "✅ Test OK. Bot running. (no real trade placed)")
        .await?;
    Ok(())
}

async fn handle_pnl(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let text = match deps.store.list_today().await {
        Ok(trades) => format_pnl_report(&trades),
        Err(e) => {
            error!(error = %e, "Failed to load today's trades");
            format!("Error fetching PnL: {e}")
        }
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_forcescan(
    bot: Bot,
    msg: Message,
    arg: String,
    deps: Arc<BotDeps>,
) -> HandlerResult {
    let Some(trigger) = forcescan_trigger(&arg) else {
        bot.send_message(msg.chat.id, "Usage: /forcescan or /forcescan override")
            .await?;
        return Ok(());
    };

    info!(?trigger, "Force scan requested");
    let outcome = deps.scanner.scan(trigger).await;
    let text = match outcome {
        ScanOutcome::Completed { signals } => {
            format!("🔎 Force scan complete. Signals sent: {signals}")
        }
        ScanOutcome::Skipped => format!(
            "⏸️ Outside active window ({}). Scan skipped.",
            deps.scanner.window()
        ),
        ScanOutcome::Busy => "⏳ A scan is already running. Try again shortly.".to_string(),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// `/pnl` reply: one line per trade created today (UTC), then the net.
pub fn format_pnl_report(trades: &[Trade]) -> String {
    if trades.is_empty() {
        return "📊 No trades today.".to_string();
    }

    let mut lines = vec!["📊 Today's trades (UTC):".to_string()];
    let mut net = 0.0;
    for t in trades {
        net += t.pnl;
        lines.push(format!(
            "{} | {} | {} | PnL: {}",
            t.pair,
            t.direction,
            t.status,
            round6(t.pnl)
        ));
    }
    lines.push(format!("\n💰 Net PnL: {}", round6(net)));
    lines.join("\n")
}
