//! Event-driven portfolio simulator.
//!
//! Replays a signal series bar by bar against closing prices, managing a
//! single long/flat position with per-share commission, tax on realized
//! gains, optional partial scale-out, and a hard stop-loss that is
//! checked every bar and overrides the signal for that bar.

use chrono::NaiveDate;

use crate::domain::metrics::Summary;
use crate::domain::position::{PositionState, Side, TradeKind, TradeRecord};
use crate::domain::signal::Signal;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub initial_capital: f64,
    pub commission_per_share: f64,
    pub min_commission: f64,
    /// Applied to positive realized profit only.
    pub tax_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            initial_capital: 10_000.0,
            commission_per_share: 0.01,
            min_commission: 7.0,
            tax_rate: 0.25,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StrategyParams {
    /// Fractional drop from the entry price that forces liquidation.
    pub stop_loss_pct: f64,
    /// Fraction of the position sold on a scale-out signal.
    pub scale_out_pct: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            stop_loss_pct: 0.10,
            scale_out_pct: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub summary: Summary,
}

/// Commission for a fill of `shares` units.
pub fn commission_for(shares: i64, config: &EngineConfig) -> f64 {
    (shares as f64 * config.commission_per_share).max(config.min_commission)
}

/// Largest whole-share quantity whose cost including commission fits in
/// `cash`. The naive floor(cash / price) can overspend once commission is
/// added, so reduce from there until the full cost fits.
pub fn max_affordable_shares(cash: f64, price: f64, config: &EngineConfig) -> i64 {
    if price <= 0.0 {
        return 0;
    }
    let mut qty = (cash / price).floor() as i64;
    while qty > 0 && qty as f64 * price + commission_for(qty, config) > cash {
        qty -= 1;
    }
    qty.max(0)
}

/// Replay `signals` against `closes`, producing the trade ledger, the
/// per-bar equity curve, and summary statistics.
///
/// All three inputs are index-aligned. Equity is recorded for every bar;
/// on bars with a fill it reflects the post-trade state.
pub fn run_backtest(
    dates: &[NaiveDate],
    closes: &[f64],
    signals: &[Signal],
    params: &StrategyParams,
    config: &EngineConfig,
) -> BacktestResult {
    let n = closes.len().min(dates.len());
    let mut state = PositionState::new(config.initial_capital);
    let mut trades: Vec<TradeRecord> = Vec::new();
    let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(n);

    for i in 0..n {
        let price = closes[i];
        let date = dates[i];
        equity_curve.push(EquityPoint {
            date,
            equity: state.equity(price),
        });

        match signals.get(i).copied().unwrap_or(Signal::Hold) {
            Signal::Hold => {}
            Signal::ScaleOut => {
                if state.is_long() && state.shares > 0 {
                    let qty = ((state.shares as f64 * params.scale_out_pct).floor() as i64)
                        .max(1)
                        .min(state.shares);
                    sell_shares(&mut state, &mut trades, date, price, qty, TradeKind::ScaleOut, config);
                    equity_curve[i].equity = state.equity(price);
                }
            }
            Signal::Buy => {
                if !state.is_long() {
                    if state.is_short() {
                        cover_short(&mut state, &mut trades, date, price, config);
                    }
                    open_long(&mut state, &mut trades, date, price, config);
                    equity_curve[i].equity = state.equity(price);
                }
            }
            Signal::Sell => {
                if state.is_long() && state.shares > 0 {
                    let qty = state.shares;
                    sell_shares(&mut state, &mut trades, date, price, qty, TradeKind::CloseLong, config);
                    equity_curve[i].equity = state.equity(price);
                }
            }
        }

        // Stop-loss safety net: checked every bar whatever the signal
        // said, after the signal has been applied.
        if state.is_long()
            && state.shares > 0
            && price <= state.entry_price * (1.0 - params.stop_loss_pct)
        {
            let qty = state.shares;
            sell_shares(&mut state, &mut trades, date, price, qty, TradeKind::StopLoss, config);
            equity_curve[i].equity = state.equity(price);
        }
    }

    let summary = Summary::compute(&trades, &equity_curve, config.initial_capital);

    BacktestResult {
        trades,
        equity_curve,
        summary,
    }
}

fn open_long(
    state: &mut PositionState,
    trades: &mut Vec<TradeRecord>,
    date: NaiveDate,
    price: f64,
    config: &EngineConfig,
) {
    let qty = max_affordable_shares(state.cash, price, config);
    if qty <= 0 {
        // Not enough cash for a single share: a legitimate skip.
        return;
    }
    let commission = commission_for(qty, config);
    state.cash -= qty as f64 * price + commission;
    state.shares = qty;
    state.entry_price = price;
    state.side = Side::Long;
    trades.push(TradeRecord {
        date,
        kind: TradeKind::OpenLong,
        price,
        share_delta: qty,
        commission,
        pnl: -commission,
    });
}

/// Sell `qty` shares of a long position at `price`. Realized profit is
/// taxed only when positive; the tax comes out of the proceeds.
fn sell_shares(
    state: &mut PositionState,
    trades: &mut Vec<TradeRecord>,
    date: NaiveDate,
    price: f64,
    qty: i64,
    kind: TradeKind,
    config: &EngineConfig,
) {
    let commission = commission_for(qty, config);
    let profit = qty as f64 * (price - state.entry_price);
    let tax = if profit > 0.0 {
        profit * config.tax_rate
    } else {
        0.0
    };
    state.cash += qty as f64 * price - commission - tax;
    state.shares -= qty;
    if state.shares == 0 {
        state.side = Side::Flat;
        state.entry_price = 0.0;
    }
    trades.push(TradeRecord {
        date,
        kind,
        price,
        share_delta: -qty,
        commission,
        pnl: profit - commission - tax,
    });
}

/// Buy back a short position before going long. The current rule set
/// never opens shorts, so this settles the price difference only.
fn cover_short(
    state: &mut PositionState,
    trades: &mut Vec<TradeRecord>,
    date: NaiveDate,
    price: f64,
    config: &EngineConfig,
) {
    let qty = state.shares;
    let commission = commission_for(qty, config);
    let profit = qty as f64 * (state.entry_price - price);
    let tax = if profit > 0.0 {
        profit * config.tax_rate
    } else {
        0.0
    };
    state.cash += profit - commission - tax;
    state.shares = 0;
    state.side = Side::Flat;
    state.entry_price = 0.0;
    trades.push(TradeRecord {
        date,
        kind: TradeKind::CoverShort,
        price,
        share_delta: qty,
        commission,
        pnl: profit - commission - tax,
    });
}
