//! Position state and the trade ledger.

use chrono::NaiveDate;
use std::fmt;

/// Direction of the single simulated position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Flat,
    Long,
    Short,
}

/// Mutable account state owned by exactly one backtest run. Reset at the
/// start of the run, discarded when it completes; only the ledger and the
/// equity curve survive.
#[derive(Debug, Clone)]
pub struct PositionState {
    pub side: Side,
    /// Shares held, as a count; the direction lives in `side`.
    pub shares: i64,
    /// Fill price of the most recent opening trade.
    pub entry_price: f64,
    pub cash: f64,
}

impl PositionState {
    pub fn new(initial_capital: f64) -> Self {
        PositionState {
            side: Side::Flat,
            shares: 0,
            entry_price: 0.0,
            cash: initial_capital,
        }
    }

    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    /// Mark-to-market account value: cash plus position value.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.market_value(price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    OpenLong,
    CloseLong,
    ScaleOut,
    CoverShort,
    StopLoss,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TradeKind::OpenLong => "open-long",
            TradeKind::CloseLong => "close-long",
            TradeKind::ScaleOut => "scale-out",
            TradeKind::CoverShort => "cover-short",
            TradeKind::StopLoss => "stop-loss-exit",
        };
        f.pad(name)
    }
}

/// One executed fill. Immutable once appended to the ledger.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub kind: TradeKind,
    pub price: f64,
    /// Positive for shares bought, negative for shares sold.
    pub share_delta: i64,
    pub commission: f64,
    /// Realized profit and loss, net of commission and tax.
    pub pnl: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_flat_with_full_cash() {
        let state = PositionState::new(10_000.0);
        assert_eq!(state.side, Side::Flat);
        assert_eq!(state.shares, 0);
        assert!((state.cash - 10_000.0).abs() < f64::EPSILON);
        assert!((state.equity(123.0) - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equity_marks_position_to_market() {
        let state = PositionState {
            side: Side::Long,
            shares: 100,
            entry_price: 50.0,
            cash: 5_000.0,
        };
        assert!((state.equity(55.0) - 10_500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trade_kind_display() {
        assert_eq!(TradeKind::OpenLong.to_string(), "open-long");
        assert_eq!(TradeKind::StopLoss.to_string(), "stop-loss-exit");
        assert_eq!(TradeKind::ScaleOut.to_string(), "scale-out");
    }
}
