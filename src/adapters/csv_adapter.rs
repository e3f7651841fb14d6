//! CSV file data adapter.
//!
//! One `<SYMBOL>.csv` file per symbol in a base directory, with a header
//! row and columns date,open,high,low,close,volume.

use crate::domain::error::MtrBandsError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<OhlcvBar>, MtrBandsError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| MtrBandsError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| MtrBandsError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = field(&record, 0, row, "date")?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                MtrBandsError::DataSource {
                    reason: format!("row {}: invalid date: {}", row + 1, e),
                }
            })?;

            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                date,
                open: parse_field(&record, 1, row, "open")?,
                high: parse_field(&record, 2, row, "high")?,
                low: parse_field(&record, 3, row, "low")?,
                close: parse_field(&record, 4, row, "close")?,
                volume: parse_field(&record, 5, row, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn field(
    record: &csv::StringRecord,
    index: usize,
    row: usize,
    name: &str,
) -> Result<String, MtrBandsError> {
    record
        .get(index)
        .map(str::to_string)
        .ok_or_else(|| MtrBandsError::DataSource {
            reason: format!("row {}: missing {} column", row + 1, name),
        })
}

fn parse_field<T: FromStr>(
    record: &csv::StringRecord,
    index: usize,
    row: usize,
    name: &str,
) -> Result<T, MtrBandsError>
where
    T::Err: std::fmt::Display,
{
    field(record, index, row, name)?
        .trim()
        .parse()
        .map_err(|e| MtrBandsError::DataSource {
            reason: format!("row {}: invalid {} value: {}", row + 1, name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, MtrBandsError> {
        let bars = self.read_all(symbol)?;
        Ok(bars
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, MtrBandsError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| MtrBandsError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MtrBandsError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(stem) = name_str.strip_suffix(".csv") {
                symbols.push(stem.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MtrBandsError> {
        let bars = self.read_all(symbol)?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
            _ => Ok(None),
        }
    }
}
