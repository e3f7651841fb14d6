//! Band-interaction signal rules.
//!
//! A per-bar state machine over close prices and band levels. Three
//! regimes: breakout above the upper band, breakdown below the lower
//! band, and mean-reversion crosses of the inside-band trade levels.
//! A cooldown after each executed trade overrides every other rule.

use crate::domain::bands::BandSeries;

/// Trade action for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Exit the position.
    Sell,
    Hold,
    /// Enter a long position.
    Buy,
    /// Partial exit. Understood by the engine but never produced by the
    /// current rule set.
    ScaleOut,
}

#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Fraction of the band width that offsets the inside-band trade levels.
    pub inside_margin_ratio: f64,
    /// Bars that must elapse after a trade before another may fire.
    pub min_days_between_trades: usize,
    /// Band movement below this magnitude does not count as a change.
    pub band_change_epsilon: f64,
    pub reassess_on_band_change: bool,
}

impl Default for SignalConfig {
    fn default() -> Self {
        SignalConfig {
            inside_margin_ratio: 0.10,
            min_days_between_trades: 2,
            band_change_epsilon: 1e-6,
            reassess_on_band_change: true,
        }
    }
}

/// Band width floor when deriving inside-band trade levels.
const MIN_BAND_WIDTH: f64 = 1e-9;

/// Values the per-bar decision looks at.
struct BarView {
    price: f64,
    prev_price: f64,
    upper: f64,
    lower: f64,
    prev_upper: Option<f64>,
    prev_lower: Option<f64>,
}

/// Generate one signal per bar. `signals[0]` is always `Hold`.
///
/// Runtime state (position flag, cooldown index, previous bands) is local
/// to this call; concurrent runs over the same inputs cannot interfere.
pub fn generate_signals(closes: &[f64], bands: &BandSeries, config: &SignalConfig) -> Vec<Signal> {
    let n = closes.len();
    let mut signals = vec![Signal::Hold; n];
    let mut in_position = false;
    let mut last_trade: Option<usize> = None;
    let mut prev_upper: Option<f64> = None;
    let mut prev_lower: Option<f64> = None;

    for i in 1..n {
        let upper = bands.upper.get(i).copied().flatten();
        let lower = bands.lower.get(i).copied().flatten();

        let cooling =
            last_trade.is_some_and(|j| i - j < config.min_days_between_trades);

        if let (Some(up), Some(lo)) = (upper, lower) {
            if !cooling {
                let view = BarView {
                    price: closes[i],
                    prev_price: closes[i - 1],
                    upper: up,
                    lower: lo,
                    prev_upper,
                    prev_lower,
                };
                let signal = decide(&view, in_position, config);
                match signal {
                    Signal::Buy => {
                        in_position = true;
                        last_trade = Some(i);
                    }
                    Signal::Sell => {
                        in_position = false;
                        last_trade = Some(i);
                    }
                    Signal::Hold | Signal::ScaleOut => {}
                }
                signals[i] = signal;
            }
        }

        prev_upper = upper;
        prev_lower = lower;
    }

    signals
}

fn decide(view: &BarView, in_position: bool, config: &SignalConfig) -> Signal {
    let width = (view.upper - view.lower).max(MIN_BAND_WIDTH);
    let buy_level = view.lower + config.inside_margin_ratio * width;
    let sell_level = view.upper - config.inside_margin_ratio * width;

    // A band step invalidates cross detection against the old levels, so
    // re-evaluate the position against the new band outright.
    if config.reassess_on_band_change {
        if let (Some(prev_up), Some(prev_lo)) = (view.prev_upper, view.prev_lower) {
            let changed = (view.upper - prev_up).abs() > config.band_change_epsilon
                || (view.lower - prev_lo).abs() > config.band_change_epsilon;
            if changed {
                if in_position && view.price < view.lower {
                    return Signal::Sell;
                }
                if !in_position && view.price > view.upper {
                    return Signal::Buy;
                }
            }
        }
    }

    if view.price > view.upper {
        // Breakout: enter only on the upward cross itself.
        if !in_position
            && view
                .prev_upper
                .is_some_and(|prev_up| view.prev_price <= prev_up)
        {
            return Signal::Buy;
        }
        return Signal::Hold;
    }

    if view.price < view.lower {
        // Breakdown: exit only on the downward cross itself.
        if in_position
            && view
                .prev_lower
                .is_some_and(|prev_lo| view.prev_price >= prev_lo)
        {
            return Signal::Sell;
        }
        return Signal::Hold;
    }

    // Inside the band: mean-reversion crosses of the trade levels.
    if !in_position && view.prev_price < buy_level && view.price >= buy_level {
        return Signal::Buy;
    }
    if in_position && view.prev_price > sell_level && view.price <= sell_level {
        return Signal::Sell;
    }

    Signal::Hold
}
