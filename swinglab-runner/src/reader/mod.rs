//! Kline readers — how price history enters the system.
//!
//! The core consumes an already-merged, ascending stream; paging and
//! merging are a reader's concern.

mod csv_reader;

pub use csv_reader::{
    binance_decoder, decoder_by_name, metatrader_decoder, read_klines_from_path, CsvKlineReader,
    KlineDecoder,
};

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use swinglab_core::domain::{Asset, Kline};

use crate::error::StudyError;

/// Incremental candle reader. `read` returns `None` at end of stream;
/// bars arrive in ascending start time.
pub trait KlineReader {
    fn read(&mut self) -> Result<Option<Kline>, StudyError>;

    fn read_all(&mut self) -> Result<Vec<Kline>, StudyError> {
        let mut klines = Vec::new();
        while let Some(kline) = self.read()? {
            klines.push(kline);
        }
        Ok(klines)
    }
}

/// Bar period keys a multi-timeframe price store recognizes, in seconds.
pub const RECOGNIZED_PERIODS: [u32; 7] = [1, 60, 900, 1800, 3600, 14400, 86400];

/// Database-backed, multi-timeframe reader contract. Implementations
/// live outside this crate; the optimizer only needs the shape.
pub trait PriceDataReader {
    /// All bars for `asset` in `[start, end)`, keyed by period seconds.
    /// Only [`RECOGNIZED_PERIODS`] keys may appear.
    fn read_all(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        asset: &Asset,
    ) -> Result<BTreeMap<u32, Vec<Kline>>, StudyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_periods_are_sorted_and_distinct() {
        let mut sorted = RECOGNIZED_PERIODS;
        sorted.sort_unstable();
        assert_eq!(sorted, RECOGNIZED_PERIODS);
        assert_eq!(sorted.len(), 7);
    }
}
