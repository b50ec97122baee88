//! Aggregate statistics over a user's journal.

use serde::Serialize;

use super::trade::Trade;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalSummary {
    pub total_trades: usize,
    pub open_trades: usize,
    pub closed_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    /// Fraction of closed trades that were profitable.
    pub win_rate: f64,
    pub total_pnl: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    /// Infinite when there are wins but no losses; serializes as `null` then.
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub best_trade: Option<f64>,
    pub worst_trade: Option<f64>,
}

impl JournalSummary {
    pub fn compute(trades: &[Trade]) -> Self {
        let mut open_trades = 0usize;
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut best_trade: Option<f64> = None;
        let mut worst_trade: Option<f64> = None;

        for trade in trades {
            if !trade.is_closed() {
                open_trades += 1;
                continue;
            }
            let pnl = trade.pnl;
            if pnl > 0.0 {
                trades_won += 1;
                gross_profit += pnl;
            } else if pnl < 0.0 {
                trades_lost += 1;
                gross_loss += pnl.abs();
            } else {
                trades_breakeven += 1;
            }
            best_trade = Some(best_trade.map_or(pnl, |b| b.max(pnl)));
            worst_trade = Some(worst_trade.map_or(pnl, |w| w.min(pnl)));
        }

        let closed_trades = trades_won + trades_lost + trades_breakeven;
        let win_rate = if closed_trades > 0 {
            trades_won as f64 / closed_trades as f64
        } else {
            0.0
        };

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            gross_profit / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            gross_loss / trades_lost as f64
        } else {
            0.0
        };

        Self {
            total_trades: trades.len(),
            open_trades,
            closed_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            total_pnl: gross_profit - gross_loss,
            gross_profit,
            gross_loss,
            profit_factor,
            avg_win,
            avg_loss,
            best_trade,
            worst_trade,
        }
    }
}
