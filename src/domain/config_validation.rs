//! Configuration validation.
//!
//! Every field is checked before any pipeline stage runs, so a bad value
//! fails the run up front rather than mid-backtest.

use crate::domain::error::MtrBandsError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), MtrBandsError> {
    validate_symbol(config)?;
    validate_dates(config)?;
    validate_capital_and_costs(config)?;
    validate_band_settings(config)?;
    validate_signal_settings(config)?;
    validate_strategy_settings(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> MtrBandsError {
    MtrBandsError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), MtrBandsError> {
    match config.get_string("backtest", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(MtrBandsError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), MtrBandsError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;
    if start >= end {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, MtrBandsError> {
    let value = config
        .get_string("backtest", key)
        .ok_or_else(|| MtrBandsError::ConfigMissing {
            section: "backtest".to_string(),
            key: key.to_string(),
        })?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .map_err(|_| invalid("backtest", key, "invalid date format (expected YYYY-MM-DD)"))
}

fn validate_capital_and_costs(config: &dyn ConfigPort) -> Result<(), MtrBandsError> {
    if config.get_double("backtest", "initial_capital", 10_000.0) <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    if config.get_double("backtest", "commission_per_share", 0.01) < 0.0 {
        return Err(invalid(
            "backtest",
            "commission_per_share",
            "commission_per_share must be non-negative",
        ));
    }
    if config.get_double("backtest", "min_commission", 7.0) < 0.0 {
        return Err(invalid(
            "backtest",
            "min_commission",
            "min_commission must be non-negative",
        ));
    }
    let tax_rate = config.get_double("backtest", "tax_rate", 0.25);
    if !(0.0..1.0).contains(&tax_rate) {
        return Err(invalid(
            "backtest",
            "tax_rate",
            "tax_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_band_settings(config: &dyn ConfigPort) -> Result<(), MtrBandsError> {
    if config.get_int("bands", "serenity_window", 20) < 1 {
        return Err(invalid(
            "bands",
            "serenity_window",
            "serenity_window must be at least 1",
        ));
    }
    if config.get_int("bands", "atr_window", 14) < 1 {
        return Err(invalid(
            "bands",
            "atr_window",
            "atr_window must be at least 1",
        ));
    }
    if config.get_int("bands", "stability_confirmation_bars", 10) < 1 {
        return Err(invalid(
            "bands",
            "stability_confirmation_bars",
            "stability_confirmation_bars must be at least 1",
        ));
    }
    if config.get_double("bands", "band_multiplier", 2.0) <= 0.0 {
        return Err(invalid(
            "bands",
            "band_multiplier",
            "band_multiplier must be positive",
        ));
    }
    if let Some(value) = config.get_string("bands", "initial_baseline") {
        match value.parse::<f64>() {
            Ok(v) if v > 0.0 => {}
            _ => {
                return Err(invalid(
                    "bands",
                    "initial_baseline",
                    "initial_baseline must be a positive number",
                ));
            }
        }
    }
    Ok(())
}

fn validate_signal_settings(config: &dyn ConfigPort) -> Result<(), MtrBandsError> {
    let margin = config.get_double("signals", "inside_margin_ratio", 0.10);
    if !(0.0..0.5).contains(&margin) {
        return Err(invalid(
            "signals",
            "inside_margin_ratio",
            "inside_margin_ratio must be in [0, 0.5)",
        ));
    }
    if config.get_int("signals", "min_days_between_trades", 2) < 0 {
        return Err(invalid(
            "signals",
            "min_days_between_trades",
            "min_days_between_trades must be non-negative",
        ));
    }
    if config.get_double("signals", "band_change_epsilon", 1e-6) <= 0.0 {
        return Err(invalid(
            "signals",
            "band_change_epsilon",
            "band_change_epsilon must be positive",
        ));
    }
    Ok(())
}

fn validate_strategy_settings(config: &dyn ConfigPort) -> Result<(), MtrBandsError> {
    let stop_loss = config.get_double("strategy", "stop_loss_pct", 0.10);
    if !(stop_loss > 0.0 && stop_loss <= 1.0) {
        return Err(invalid(
            "strategy",
            "stop_loss_pct",
            "stop_loss_pct must be in (0, 1]",
        ));
    }
    let scale_out = config.get_double("strategy", "scale_out_pct", 0.5);
    if !(scale_out > 0.0 && scale_out <= 1.0) {
        return Err(invalid(
            "strategy",
            "scale_out_pct",
            "scale_out_pct must be in (0, 1]",
        ));
    }
    Ok(())
}
