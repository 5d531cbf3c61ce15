use common::{Direction, Exit, Trade};

/// Decide whether `trade` exits at `price`, returning the exit kind and the
/// realized PnL per unit.
///
/// PnL is measured at the TP/SL level, not at `price`. Take-profit is
/// checked first: a single price sample cannot tell which level was touched
/// first within the bar, so TP wins the (normally impossible) tie.
/// Trades that are no longer OPEN never exit again.
pub fn evaluate_exit(trade: &Trade, price: f64) -> Option<(Exit, f64)> {
    if !trade.is_open() || !price.is_finite() {
        return None;
    }
    match trade.direction {
        Direction::Long => {
            if price >= trade.tp {
                Some((Exit::TakeProfit, trade.tp - trade.entry))
            } else if price <= trade.sl {
                Some((Exit::StopLoss, trade.sl - trade.entry))
            } else {
                None
            }
        }
        Direction::Short => {
            if price <= trade.tp {
                Some((Exit::TakeProfit, trade.entry - trade.tp))
            } else if price >= trade.sl {
                Some((Exit::StopLoss, trade.entry - trade.sl))
            } else {
                None
            }
        }
    }
}
