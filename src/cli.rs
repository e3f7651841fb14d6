//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::bands::BandConfig;
use crate::domain::config_validation::validate_config;
use crate::domain::engine::{EngineConfig, StrategyParams};
use crate::domain::error::MtrBandsError;
use crate::domain::session::{BacktestSession, SessionConfig};
use crate::domain::signal::SignalConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "mtrbands", about = "MTR-bands strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            dry_run,
        } => run_backtest(&config, symbol.as_deref(), dry_run),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    }
}

fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// Build the pipeline configuration from the config port, falling back
/// to the documented defaults for any missing key.
pub fn build_session_config(adapter: &dyn ConfigPort) -> SessionConfig {
    let initial_baseline = adapter
        .get_string("bands", "initial_baseline")
        .and_then(|s| s.parse::<f64>().ok());

    SessionConfig {
        bands: BandConfig {
            serenity_window: adapter.get_int("bands", "serenity_window", 20) as usize,
            atr_window: adapter.get_int("bands", "atr_window", 14) as usize,
            band_multiplier: adapter.get_double("bands", "band_multiplier", 2.0),
            stability_confirmation_bars: adapter
                .get_int("bands", "stability_confirmation_bars", 10)
                as usize,
            initial_baseline,
        },
        signals: SignalConfig {
            inside_margin_ratio: adapter.get_double("signals", "inside_margin_ratio", 0.10),
            min_days_between_trades: adapter.get_int("signals", "min_days_between_trades", 2)
                as usize,
            band_change_epsilon: adapter.get_double("signals", "band_change_epsilon", 1e-6),
            reassess_on_band_change: adapter.get_bool("signals", "reassess_on_band_change", true),
        },
        strategy: StrategyParams {
            stop_loss_pct: adapter.get_double("strategy", "stop_loss_pct", 0.10),
            scale_out_pct: adapter.get_double("strategy", "scale_out_pct", 0.5),
        },
        engine: EngineConfig {
            initial_capital: adapter.get_double("backtest", "initial_capital", 10_000.0),
            commission_per_share: adapter.get_double("backtest", "commission_per_share", 0.01),
            min_commission: adapter.get_double("backtest", "min_commission", 7.0),
            tax_rate: adapter.get_double("backtest", "tax_rate", 0.25),
        },
    }
}

fn data_adapter(adapter: &dyn ConfigPort) -> Result<CsvAdapter, MtrBandsError> {
    let csv_dir = adapter
        .get_string("data", "csv_dir")
        .ok_or_else(|| MtrBandsError::ConfigMissing {
            section: "data".into(),
            key: "csv_dir".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(csv_dir)))
}

fn backtest_dates(adapter: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), MtrBandsError> {
    let parse = |key: &str| -> Result<NaiveDate, MtrBandsError> {
        let value =
            adapter
                .get_string("backtest", key)
                .ok_or_else(|| MtrBandsError::ConfigMissing {
                    section: "backtest".into(),
                    key: key.into(),
                })?;
        NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| MtrBandsError::ConfigInvalid {
            section: "backtest".into(),
            key: key.into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        })
    };
    Ok((parse("start_date")?, parse("end_date")?))
}

fn resolve_symbol(symbol_override: Option<&str>, adapter: &dyn ConfigPort) -> Option<String> {
    symbol_override
        .map(|s| s.to_uppercase())
        .or_else(|| adapter.get_string("backtest", "symbol"))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
}

fn run_backtest(config_path: &PathBuf, symbol_override: Option<&str>, dry_run: bool) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if dry_run {
        eprintln!("Dry run complete: configuration is valid");
        return ExitCode::SUCCESS;
    }

    let Some(symbol) = resolve_symbol(symbol_override, &adapter) else {
        eprintln!("error: symbol is required (use --symbol or set in config)");
        return ExitCode::from(2);
    };

    let (start_date, end_date) = match backtest_dates(&adapter) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = match data_adapter(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let session_config = build_session_config(&adapter);
    let mut session = BacktestSession::new(session_config);

    eprintln!("Running backtest: {} {} to {}", symbol, start_date, end_date);

    match session.load_data(&data_port, &symbol, start_date, end_date) {
        Ok(count) => eprintln!("  Loaded {} bars", count),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }
    if let Err(e) = session.compute_bands() {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = session.generate_signals() {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = session.run_backtest() {
        eprintln!("error: {e}");
        return (&e).into();
    }

    print_results(&session);
    ExitCode::SUCCESS
}

fn print_results(session: &BacktestSession) {
    let Some(result) = session.result() else {
        return;
    };
    let summary = &result.summary;

    eprintln!("\n=== Results ===");
    eprintln!("Final Equity:     {:.2}", summary.final_equity);
    eprintln!("Total Return:     {:.2}%", summary.total_return_pct);
    eprintln!("Trades:           {}", summary.trade_count);
    eprintln!(
        "Win Rate:         {:.1}% ({} won / {} lost)",
        summary.win_rate * 100.0,
        summary.wins,
        summary.losses,
    );
    eprintln!("Avg Win:          {:.2}", summary.avg_win);
    eprintln!("Avg Loss:         {:.2}", summary.avg_loss);
    eprintln!("Commission Paid:  {:.2}", summary.total_commission);

    match session.comparison() {
        Ok(cmp) => {
            eprintln!("\n=== Buy & Hold ===");
            eprintln!("Final Value:      {:.2}", cmp.final_value);
            eprintln!("Total Return:     {:.2}%", cmp.total_return_pct);
            eprintln!("Outperformance:   {:+.2}%", cmp.outperformance_pct);
        }
        Err(e) => eprintln!("warning: no buy-and-hold baseline ({e})"),
    }

    if !result.trades.is_empty() {
        eprintln!("\n=== Trades ===");
        for trade in &result.trades {
            eprintln!(
                "  {}  {:<14} {:>6} @ {:<10.2} commission {:>7.2}  pnl {:>10.2}",
                trade.date, trade.kind, trade.share_delta, trade.price, trade.commission,
                trade.pnl,
            );
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match validate_config(&adapter) {
        Ok(()) => {
            eprintln!("Configuration is valid");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_list_symbols(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let data_port = match data_adapter(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match data_port.list_symbols() {
        Ok(symbols) => {
            if symbols.is_empty() {
                eprintln!("No symbols found");
            } else {
                for symbol in &symbols {
                    println!("{}", symbol);
                }
                eprintln!("{} symbols found", symbols.len());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_info(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let Some(symbol) = resolve_symbol(symbol_override, &adapter) else {
        eprintln!("error: symbol is required (use --symbol or set in config)");
        return ExitCode::from(2);
    };

    let data_port = match data_adapter(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match data_port.get_data_range(&symbol) {
        Ok(Some((min_date, max_date, count))) => {
            println!("{}: {} bars, {} to {}", symbol, count, min_date, max_date);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", symbol);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
