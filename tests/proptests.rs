//! Property tests for the indicator and engine invariants.

use chrono::NaiveDate;
use mtrbands::domain::bands::{calculate_bands, BandConfig};
use mtrbands::domain::engine::{
    commission_for, max_affordable_shares, run_backtest, EngineConfig, StrategyParams,
};
use mtrbands::domain::ohlcv::OhlcvBar;
use mtrbands::domain::signal::Signal;
use proptest::prelude::*;

fn flat_bar(day: i64, close: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: "MTR".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1000,
    }
}

fn flat_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .copied()
        .enumerate()
        .map(|(i, close)| flat_bar(i as i64, close))
        .collect()
}

fn signal_from(code: u8) -> Signal {
    match code % 4 {
        0 => Signal::Hold,
        1 => Signal::Buy,
        2 => Signal::Sell,
        _ => Signal::ScaleOut,
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn bands_keep_lower_base_upper_ordering(
        closes in prop::collection::vec(1.0f64..500.0, 1..200)
    ) {
        let bars = flat_bars(&closes);
        let series = calculate_bands(&bars, &BandConfig::default());
        for i in 0..series.len() {
            if series.defined_at(i) {
                let base = series.base[i].unwrap();
                prop_assert!(series.lower[i].unwrap() <= base);
                prop_assert!(base <= series.upper[i].unwrap());
            }
        }
    }

    #[test]
    fn baseline_never_moves_under_bounded_drift(
        closes in prop::collection::vec(45.0f64..55.0, 30..150)
    ) {
        // Any close stays within 25% of any possible initial baseline,
        // so the deviation gate can never open.
        let bars = flat_bars(&closes);
        let series = calculate_bands(&bars, &BandConfig::default());
        let defined: Vec<f64> = series.base.iter().copied().flatten().collect();
        if let Some(&first) = defined.first() {
            prop_assert!(defined.iter().all(|&b| (b - first).abs() < 1e-12));
        }
    }

    #[test]
    fn sizing_is_affordable_and_maximal(
        cash in 0.0f64..100_000.0,
        price in 0.5f64..1_000.0
    ) {
        let config = EngineConfig::default();
        let qty = max_affordable_shares(cash, price, &config);
        prop_assert!(qty >= 0);
        if qty > 0 {
            prop_assert!(qty as f64 * price + commission_for(qty, &config) <= cash);
        }
        // One more share must not have fit (or was beyond the naive floor).
        let next = qty + 1;
        if next <= (cash / price).floor() as i64 {
            prop_assert!(next as f64 * price + commission_for(next, &config) > cash);
        }
    }

    #[test]
    fn equity_curve_is_finite_and_ledger_consistent(
        closes in prop::collection::vec(1.0f64..100.0, 1..60),
        codes in prop::collection::vec(0u8..4, 1..60)
    ) {
        let n = closes.len().min(codes.len());
        let closes = &closes[..n];
        let signals: Vec<Signal> = codes[..n].iter().map(|&c| signal_from(c)).collect();
        let dates: Vec<NaiveDate> = (0..n)
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64))
            .collect();

        let config = EngineConfig::default();
        let result = run_backtest(&dates, closes, &signals, &StrategyParams::default(), &config);

        prop_assert_eq!(result.equity_curve.len(), n);

        // Replay the ledger: cash + position value must match the curve.
        let mut cash = config.initial_capital;
        let mut shares = 0i64;
        let mut entry_price = 0.0;
        let mut trades = result.trades.iter().peekable();
        for (i, point) in result.equity_curve.iter().enumerate() {
            while let Some(trade) = trades.peek() {
                if trade.date != point.date {
                    break;
                }
                if trade.share_delta > 0 {
                    cash -= trade.share_delta as f64 * trade.price + trade.commission;
                    entry_price = trade.price;
                } else {
                    let qty = (-trade.share_delta) as f64;
                    let profit = qty * (trade.price - entry_price);
                    let tax = if profit > 0.0 { profit * config.tax_rate } else { 0.0 };
                    cash += qty * trade.price - trade.commission - tax;
                }
                shares += trade.share_delta;
                trades.next();
            }
            prop_assert!(point.equity.is_finite());
            prop_assert!((point.equity - (cash + shares as f64 * closes[i])).abs() < 1e-6);
        }

        // The replayed position never goes short.
        prop_assert!(shares >= 0);
    }
}
