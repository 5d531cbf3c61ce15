use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::{info, warn};

use common::{Error, Notifier, Result, Signal, Trade, TradeStatus};

/// Sends signal and exit cards to a single Telegram chat.
///
/// Without a token or chat id every send is logged and reported as
/// delivered, so the rest of the bot runs unchanged.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Option<Bot>,
    chat_id: Option<ChatId>,
}

impl TelegramNotifier {
    pub fn new(token: Option<String>, chat_id: Option<i64>) -> Self {
        Self {
            bot: token.map(Bot::new),
            chat_id: chat_id.map(ChatId),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.bot.is_some() && self.chat_id.is_some()
    }

    async fn send(&self, text: String) -> Result<()> {
        let (Some(bot), Some(chat_id)) = (&self.bot, self.chat_id) else {
            info!(message = %text, "Telegram not configured (missing token/chat id)");
            return Ok(());
        };

        bot.send_message(chat_id, text).await.map_err(|e| {
            warn!(chat_id = ?chat_id, error = %e, "Telegram send failed");
            Error::Notify(e.to_string())
        })?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_signal(&self, signal: &Signal) -> Result<()> {
        self.send(format_signal(signal)).await
    }

    async fn send_close(&self, trade: &Trade, status: TradeStatus, pnl: f64) -> Result<()> {
        self.send(format_close(trade, status, pnl)).await
    }
}

pub fn format_signal(signal: &Signal) -> String {
    format!(
        "📈 Signal — {}\n\
         📍DIRECTION: {}\n\
         🚀Entry: {}\n\
         🎯Target: {}\n\
         ⛔Stop Loss: {}\n\
         🤖Confidence: {}%\n\
         ®️Reason: {}",
        signal.pair,
        signal.direction,
        signal.entry,
        signal.take_profit,
        signal.stop_loss,
        signal.confidence,
        signal.reason
    )
}

pub fn format_close(trade: &Trade, status: TradeStatus, pnl: f64) -> String {
    format!(
        "❇️ Exit — {} ({status})\n\
         Direction: {}\n\
         Entry: {}\n\
         TP: {}\n\
         SL: {}\n\
         🅿️PnL: {}",
        trade.pair,
        trade.direction,
        trade.entry,
        trade.tp,
        trade.sl,
        round6(pnl)
    )
}

/// PnL is shown to 6 decimal places.
pub(crate) fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}
