//! Volatility-adaptive baseline and band indicator.
//!
//! The baseline is horizontal by default: it moves only on a large,
//! sustained, confirmed shift in the traded price range, so the strategy
//! trades against a stable reference instead of a twitchy moving average.
//! Upper/lower bands sit at baseline × (1 ± multiplier × ATR-percent).

use crate::domain::ohlcv::OhlcvBar;

/// Fractional deviation from the baseline required before a shift is considered.
const SHIFT_DEVIATION: f64 = 0.25;

/// Minimum bars between baseline shifts.
const SHIFT_SPACING_BARS: usize = 30;

/// (max - min) / mean ceiling for the confirmation window to count as stable.
const STABILITY_RATIO: f64 = 0.15;

#[derive(Debug, Clone)]
pub struct BandConfig {
    pub serenity_window: usize,
    pub atr_window: usize,
    pub band_multiplier: f64,
    pub stability_confirmation_bars: usize,
    /// Overrides the close at the start index as the first baseline.
    pub initial_baseline: Option<f64>,
}

impl Default for BandConfig {
    fn default() -> Self {
        BandConfig {
            serenity_window: 20,
            atr_window: 14,
            band_multiplier: 2.0,
            stability_confirmation_bars: 10,
            initial_baseline: None,
        }
    }
}

/// Indicator output, index-aligned with the input bars.
///
/// A slot is `None` until enough history exists for the value to be
/// defined. Band consumers must check for that explicitly; no slot ever
/// holds a NaN placeholder.
#[derive(Debug, Clone)]
pub struct BandSeries {
    pub base: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
    /// ATR as a fraction of the close, kept for diagnostics and band width.
    pub atr_pct: Vec<Option<f64>>,
}

impl BandSeries {
    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// True when base, upper, and lower are all defined at `index`.
    pub fn defined_at(&self, index: usize) -> bool {
        self.base.get(index).is_some_and(|v| v.is_some())
            && self.upper.get(index).is_some_and(|v| v.is_some())
            && self.lower.get(index).is_some_and(|v| v.is_some())
    }
}

/// ATR over a trailing simple moving average of true range.
///
/// Bar 0's true range is high − low; later bars use the full
/// three-way true range. Undefined for `i < window - 1`.
pub fn calc_atr(bars: &[OhlcvBar], window: usize) -> Vec<Option<f64>> {
    let n = bars.len();
    let mut atr = vec![None; n];
    if window == 0 || n == 0 {
        return atr;
    }

    let mut tr = Vec::with_capacity(n);
    for (i, bar) in bars.iter().enumerate() {
        let value = if i == 0 {
            bar.high - bar.low
        } else {
            bar.true_range(bars[i - 1].close)
        };
        tr.push(value);
    }

    for i in (window - 1)..n {
        let sum: f64 = tr[i + 1 - window..=i].iter().sum();
        atr[i] = Some(sum / window as f64);
    }
    atr
}

/// ATR divided by the close at the same index.
pub fn calc_atr_pct(bars: &[OhlcvBar], window: usize) -> Vec<Option<f64>> {
    calc_atr(bars, window)
        .into_iter()
        .zip(bars)
        .map(|(atr, bar)| atr.map(|a| a / bar.close))
        .collect()
}

/// Compute the full band series for a bar slice.
///
/// Returns all-undefined slots when the series is too short for the
/// start index — callers treat that as "insufficient data", not an error.
pub fn calculate_bands(bars: &[OhlcvBar], config: &BandConfig) -> BandSeries {
    let n = bars.len();
    let atr_pct = calc_atr_pct(bars, config.atr_window);
    let mut base = vec![None; n];
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];

    let start = config.serenity_window.max(config.atr_window);
    let first_atr_pct = atr_pct.get(start).copied().flatten();
    let (Some(start_bar), Some(start_atr_pct)) = (bars.get(start), first_atr_pct) else {
        return BandSeries {
            base,
            upper,
            lower,
            atr_pct,
        };
    };

    let mut baseline = config.initial_baseline.unwrap_or(start_bar.close);
    let mut half_width = config.band_multiplier * start_atr_pct;
    let mut band_upper = baseline * (1.0 + half_width);
    let mut band_lower = baseline * (1.0 - half_width);
    let mut last_shift = start;

    for i in start..n {
        let close = bars[i].close;
        let deviated = (close - baseline).abs() / baseline > SHIFT_DEVIATION;
        if deviated && i - last_shift >= SHIFT_SPACING_BARS {
            if let Some(mean) = stable_window_mean(bars, i, config.stability_confirmation_bars) {
                baseline = mean;
                if let Some(pct) = atr_pct[i] {
                    half_width = config.band_multiplier * pct;
                }
                band_upper = baseline * (1.0 + half_width);
                band_lower = baseline * (1.0 - half_width);
                last_shift = i;
            }
        }

        base[i] = Some(baseline);
        upper[i] = Some(band_upper);
        lower[i] = Some(band_lower);
    }

    BandSeries {
        base,
        upper,
        lower,
        atr_pct,
    }
}

/// Mean of the trailing confirmation window ending at `index`, but only
/// when the window's closes have settled: (max - min) / mean below the
/// stability ratio. `None` when the window is unavailable or still noisy.
fn stable_window_mean(bars: &[OhlcvBar], index: usize, window: usize) -> Option<f64> {
    if window == 0 || index + 1 < window {
        return None;
    }
    let closes = &bars[index + 1 - window..=index];
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for bar in closes {
        min = min.min(bar.close);
        max = max.max(bar.close);
        sum += bar.close;
    }
    let mean = sum / window as f64;
    if mean > 0.0 && (max - min) / mean < STABILITY_RATIO {
        Some(mean)
    } else {
        None
    }
}
