//! Market data access port trait.
//!
//! Implementations must return bars with dates ascending and unique.
//! Non-trading days are simply absent rows, never placeholder bars.

use crate::domain::error::MtrBandsError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, MtrBandsError>;

    fn list_symbols(&self) -> Result<Vec<String>, MtrBandsError>;

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MtrBandsError>;
}
