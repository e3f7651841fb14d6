//! Summary statistics and the buy-and-hold baseline.

use crate::domain::engine::{commission_for, EngineConfig, EquityPoint};
use crate::domain::position::TradeRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub final_equity: f64,
    /// Percent return relative to initial capital.
    pub total_return_pct: f64,
    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub loss_rate: f64,
    pub avg_win: f64,
    /// Average loss magnitude, reported as a positive number.
    pub avg_loss: f64,
    pub total_commission: f64,
}

impl Summary {
    pub fn compute(
        trades: &[TradeRecord],
        equity_curve: &[EquityPoint],
        initial_capital: f64,
    ) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return_pct = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut total_win_pnl = 0.0_f64;
        let mut total_loss_pnl = 0.0_f64;
        let mut total_commission = 0.0_f64;

        for trade in trades {
            total_commission += trade.commission;
            if trade.pnl > 0.0 {
                wins += 1;
                total_win_pnl += trade.pnl;
            } else if trade.pnl < 0.0 {
                losses += 1;
                total_loss_pnl += trade.pnl.abs();
            }
        }

        let trade_count = trades.len();
        let win_rate = if trade_count > 0 {
            wins as f64 / trade_count as f64
        } else {
            0.0
        };
        let loss_rate = if trade_count > 0 {
            losses as f64 / trade_count as f64
        } else {
            0.0
        };
        let avg_win = if wins > 0 {
            total_win_pnl / wins as f64
        } else {
            0.0
        };
        let avg_loss = if losses > 0 {
            total_loss_pnl / losses as f64
        } else {
            0.0
        };

        Summary {
            final_equity,
            total_return_pct,
            trade_count,
            wins,
            losses,
            win_rate,
            loss_rate,
            avg_win,
            avg_loss,
            total_commission,
        }
    }
}

/// Buy-and-hold over the same series: all-in at the first close, one
/// commission at entry, marked at the last close.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyHoldComparison {
    pub shares: i64,
    pub final_value: f64,
    pub total_return_pct: f64,
    /// Strategy return percent minus buy-and-hold return percent.
    pub outperformance_pct: f64,
}

pub fn buy_and_hold(
    closes: &[f64],
    config: &EngineConfig,
    strategy_return_pct: f64,
) -> Option<BuyHoldComparison> {
    let first = *closes.first()?;
    let last = *closes.last()?;
    if first <= 0.0 {
        return None;
    }

    let shares = (config.initial_capital / first).floor() as i64;
    let commission = if shares > 0 {
        commission_for(shares, config)
    } else {
        0.0
    };
    let leftover = config.initial_capital - shares as f64 * first - commission;
    let final_value = shares as f64 * last + leftover;
    let total_return_pct = if config.initial_capital > 0.0 {
        (final_value - config.initial_capital) / config.initial_capital * 100.0
    } else {
        0.0
    };

    Some(BuyHoldComparison {
        shares,
        final_value,
        total_return_pct,
        outperformance_pct: strategy_return_pct - total_return_pct,
    })
}
