//! Per-run orchestration of the indicator → signal → backtest pipeline.
//!
//! One [`BacktestSession`] per logical run. Stages must execute in order:
//! load data, compute bands, generate signals, run the backtest. Calling
//! a stage before its prerequisite exists is a usage error reported as
//! [`MtrBandsError::StageNotReady`], never a silent no-op. Outputs of
//! stages that already succeeded stay inspectable after a later failure.

use chrono::NaiveDate;

use crate::domain::bands::{calculate_bands, BandConfig, BandSeries};
use crate::domain::engine::{run_backtest, BacktestResult, EngineConfig, StrategyParams};
use crate::domain::error::MtrBandsError;
use crate::domain::metrics::{buy_and_hold, BuyHoldComparison};
use crate::domain::ohlcv::{self, OhlcvBar};
use crate::domain::signal::{generate_signals, Signal, SignalConfig};
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub bands: BandConfig,
    pub signals: SignalConfig,
    pub strategy: StrategyParams,
    pub engine: EngineConfig,
}

pub struct BacktestSession {
    config: SessionConfig,
    bars: Option<Vec<OhlcvBar>>,
    bands: Option<BandSeries>,
    signals: Option<Vec<Signal>>,
    result: Option<BacktestResult>,
}

impl BacktestSession {
    pub fn new(config: SessionConfig) -> Self {
        BacktestSession {
            config,
            bars: None,
            bands: None,
            signals: None,
            result: None,
        }
    }

    /// Fetch bars through the data port and stage them for the pipeline.
    pub fn load_data(
        &mut self,
        port: &dyn DataPort,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<usize, MtrBandsError> {
        let bars = port.fetch_ohlcv(symbol, start_date, end_date)?;
        if bars.is_empty() {
            return Err(MtrBandsError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(self.load_bars(bars))
    }

    /// Stage already-fetched bars. Any downstream stage output from a
    /// previous pass is discarded.
    pub fn load_bars(&mut self, bars: Vec<OhlcvBar>) -> usize {
        let count = bars.len();
        self.bars = Some(bars);
        self.bands = None;
        self.signals = None;
        self.result = None;
        count
    }

    pub fn compute_bands(&mut self) -> Result<&BandSeries, MtrBandsError> {
        let bars = self.bars.as_deref().ok_or(MtrBandsError::StageNotReady {
            stage: "compute_bands",
            requires: "load_data",
        })?;
        let series = calculate_bands(bars, &self.config.bands);
        self.signals = None;
        self.result = None;
        Ok(self.bands.insert(series))
    }

    pub fn generate_signals(&mut self) -> Result<&[Signal], MtrBandsError> {
        let bars = self.bars.as_deref().ok_or(MtrBandsError::StageNotReady {
            stage: "generate_signals",
            requires: "load_data",
        })?;
        let bands = self.bands.as_ref().ok_or(MtrBandsError::StageNotReady {
            stage: "generate_signals",
            requires: "compute_bands",
        })?;
        let closes = ohlcv::closes(bars);
        let signals = generate_signals(&closes, bands, &self.config.signals);
        self.result = None;
        Ok(self.signals.insert(signals))
    }

    pub fn run_backtest(&mut self) -> Result<&BacktestResult, MtrBandsError> {
        let bars = self.bars.as_deref().ok_or(MtrBandsError::StageNotReady {
            stage: "run_backtest",
            requires: "load_data",
        })?;
        let signals = self.signals.as_deref().ok_or(MtrBandsError::StageNotReady {
            stage: "run_backtest",
            requires: "generate_signals",
        })?;
        let dates = ohlcv::dates(bars);
        let closes = ohlcv::closes(bars);
        let result = run_backtest(
            &dates,
            &closes,
            signals,
            &self.config.strategy,
            &self.config.engine,
        );
        Ok(self.result.insert(result))
    }

    /// Buy-and-hold baseline over the loaded series versus the strategy.
    pub fn comparison(&self) -> Result<BuyHoldComparison, MtrBandsError> {
        let bars = self.bars.as_deref().ok_or(MtrBandsError::StageNotReady {
            stage: "comparison",
            requires: "load_data",
        })?;
        let result = self.result.as_ref().ok_or(MtrBandsError::StageNotReady {
            stage: "comparison",
            requires: "run_backtest",
        })?;
        let closes = ohlcv::closes(bars);
        buy_and_hold(
            &closes,
            &self.config.engine,
            result.summary.total_return_pct,
        )
        .ok_or(MtrBandsError::NoData {
            symbol: bars
                .first()
                .map(|b| b.symbol.clone())
                .unwrap_or_default(),
        })
    }

    pub fn bars(&self) -> Option<&[OhlcvBar]> {
        self.bars.as_deref()
    }

    pub fn bands(&self) -> Option<&BandSeries> {
        self.bands.as_ref()
    }

    pub fn signals(&self) -> Option<&[Signal]> {
        self.signals.as_deref()
    }

    pub fn result(&self) -> Option<&BacktestResult> {
        self.result.as_ref()
    }
}
