//! CSV kline reader with pluggable row decoders.
//!
//! Two recognized schemas:
//! - Binance: open-time (ms epoch), O, H, L, C, V, close-time, ...
//! - MetaTrader: date, time, O, H, L, C, V
//!
//! The decoder is a configuration selector (`samples[].decoder`).

use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use swinglab_core::domain::Kline;

use super::KlineReader;
use crate::error::StudyError;

/// Maps one CSV record to a kline.
pub type KlineDecoder = fn(&csv::StringRecord) -> Result<Kline, StudyError>;

/// Reader over any byte source. Headerless input; extra trailing
/// columns (Binance dumps carry several) are ignored.
pub struct CsvKlineReader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    decoder: KlineDecoder,
}

impl<R: Read> CsvKlineReader<R> {
    pub fn new(reader: R, decoder: KlineDecoder) -> Self {
        let csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        Self {
            records: csv.into_records(),
            decoder,
        }
    }
}

impl<R: Read> KlineReader for CsvKlineReader<R> {
    fn read(&mut self) -> Result<Option<Kline>, StudyError> {
        match self.records.next() {
            None => Ok(None),
            Some(record) => {
                let record = record?;
                Ok(Some((self.decoder)(&record)?))
            }
        }
    }
}

/// Look up a decoder by its configuration name.
pub fn decoder_by_name(name: &str) -> Option<KlineDecoder> {
    match name {
        "binance" => Some(binance_decoder),
        "metatrader" => Some(metatrader_decoder),
        _ => None,
    }
}

/// Read a whole price file with the given decoder.
pub fn read_klines_from_path(path: &Path, decoder: KlineDecoder) -> Result<Vec<Kline>, StudyError> {
    let file = std::fs::File::open(path)?;
    CsvKlineReader::new(file, decoder).read_all()
}

fn malformed(field: &str, value: &str) -> StudyError {
    StudyError::Io(io::Error::new(
        io::ErrorKind::InvalidData,
        format!("bad {field} value '{value}'"),
    ))
}

fn field<'a>(record: &'a csv::StringRecord, idx: usize, name: &str) -> Result<&'a str, StudyError> {
    record
        .get(idx)
        .ok_or_else(|| malformed(name, "<missing>"))
        .map(str::trim)
}

fn decimal_field(record: &csv::StringRecord, idx: usize, name: &str) -> Result<Decimal, StudyError> {
    let raw = field(record, idx, name)?;
    Decimal::from_str(raw).map_err(|_| malformed(name, raw))
}

/// Binance schema: open-time in epoch milliseconds, then O, H, L, C, V.
pub fn binance_decoder(record: &csv::StringRecord) -> Result<Kline, StudyError> {
    let raw = field(record, 0, "open-time")?;
    let millis: i64 = raw.parse().map_err(|_| malformed("open-time", raw))?;
    let start = Utc
        .timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| malformed("open-time", raw))?;

    Ok(Kline {
        start,
        open: decimal_field(record, 1, "open")?,
        high: decimal_field(record, 2, "high")?,
        low: decimal_field(record, 3, "low")?,
        close: decimal_field(record, 4, "close")?,
        volume: decimal_field(record, 5, "volume")?,
    })
}

/// MetaTrader schema: `YYYY.MM.DD`, `HH:MM`, then O, H, L, C, V.
pub fn metatrader_decoder(record: &csv::StringRecord) -> Result<Kline, StudyError> {
    let date = field(record, 0, "date")?;
    let time = field(record, 1, "time")?;
    let stamp = format!("{date} {time}");
    let start = NaiveDateTime::parse_from_str(&stamp, "%Y.%m.%d %H:%M")
        .map_err(|_| malformed("date/time", &stamp))?
        .and_utc();

    Ok(Kline {
        start,
        open: decimal_field(record, 2, "open")?,
        high: decimal_field(record, 3, "high")?,
        low: decimal_field(record, 4, "low")?,
        close: decimal_field(record, 5, "close")?,
        volume: decimal_field(record, 6, "volume")?,
    })
}
