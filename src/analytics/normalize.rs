use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::types::{Column, RawTable, Schema, TradeRecord};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// How much of the source needed coercing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    /// Numeric cells that failed to parse and were zero-filled.
    pub zero_filled_cells: usize,
    /// Non-empty open times that failed to parse.
    pub unparsable_times: usize,
}

/// The trade log after coercion, with the schema it was read under.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub schema: Schema,
    pub records: Vec<TradeRecord>,
    pub quality: DataQuality,
}

/// Parse a timestamp cell. Offsets are converted to UTC; naive values are
/// taken as-is. Returns `None` rather than guessing a default.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a numeric cell, accepting plain and scientific notation.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn cell<'a>(row: &'a [String], index: Option<usize>) -> Option<&'a str> {
    index.and_then(|i| row.get(i)).map(String::as_str)
}

fn text_cell(row: &[String], index: Option<usize>) -> Option<String> {
    cell(row, index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Coerce every recognized column of `table` into typed values.
///
/// Rows are never dropped. Numeric failures fill with zero. When the table
/// has no `Running` column, the running balance is taken from `Balance`.
pub fn normalize(table: &RawTable) -> NormalizedTable {
    let schema = Schema::of(table);

    let open_time_idx = table.index_of(Column::OpenTime);
    let symbol_idx = table.index_of(Column::Symbol);
    let pair_idx = table.index_of(Column::Pair);
    let type_idx = table.index_of(Column::Type);
    let strategy_idx = table.index_of(Column::Strategy);
    let pnl_idx = table.index_of(Column::PnL);
    let running_idx = table.index_of(Column::Running);
    let balance_idx = table.index_of(Column::Balance);
    let reason_idx = table.index_of(Column::Reason);

    let mut zero_filled_cells = 0;
    let mut unparsable_times = 0;

    let mut numeric = |row: &[String], index: Option<usize>| -> Option<Decimal> {
        index?;
        match cell(row, index).and_then(parse_decimal) {
            Some(value) => Some(value),
            None => {
                zero_filled_cells += 1;
                Some(Decimal::ZERO)
            }
        }
    };

    let mut records = Vec::with_capacity(table.len());
    for (position, row) in table.rows.iter().enumerate() {
        let row = row.as_slice();
        let mut record = TradeRecord::new(position);

        if open_time_idx.is_some() {
            let raw = cell(row, open_time_idx).unwrap_or_default();
            record.open_time = parse_timestamp(raw);
            if record.open_time.is_none() && !raw.trim().is_empty() {
                unparsable_times += 1;
            }
        }

        record.pair = text_cell(row, pair_idx);
        record.symbol = text_cell(row, symbol_idx).or_else(|| record.pair.clone());
        record.trade_type = text_cell(row, type_idx);
        // Strategy labels are matched verbatim, so keep the cell untrimmed.
        record.strategy = cell(row, strategy_idx).map(str::to_string);
        record.reason = text_cell(row, reason_idx);

        record.pnl = numeric(row, pnl_idx).unwrap_or(Decimal::ZERO);
        record.balance = numeric(row, balance_idx);
        record.running = match numeric(row, running_idx) {
            Some(running) => running,
            None => record.balance.unwrap_or(Decimal::ZERO),
        };

        records.push(record);
    }

    if zero_filled_cells > 0 || unparsable_times > 0 {
        debug!(
            "Normalized {} rows: {} numeric cells zero-filled, {} unparsable open times",
            records.len(),
            zero_filled_cells,
            unparsable_times
        );
    }

    NormalizedTable {
        schema,
        records,
        quality: DataQuality {
            zero_filled_cells,
            unparsable_times,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use rust_decimal_macros::dec;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 8)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();

        assert_eq!(parse_timestamp("2024-03-08 14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-08 14:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-08T14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-08T14:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-08T16:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("03/08/2024 14:30"), Some(expected));

        let midnight = parse_timestamp("2024-03-08").unwrap();
        assert_eq!(midnight.hour(), 0);
    }

    #[test]
    fn test_parse_timestamp_rejects_noise() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("FRIDAY_CLOSE"), None);
        assert_eq!(parse_timestamp("2024-13-45"), None);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("10.5"), Some(dec!(10.5)));
        assert_eq!(parse_decimal(" -3 "), Some(dec!(-3)));
        assert_eq!(parse_decimal("1e2"), Some(dec!(100)));
        assert_eq!(parse_decimal("FRIDAY_CLOSE"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn test_non_numeric_pnl_is_zero_filled_not_dropped() {
        let raw = table(
            &["Open Time", "PnL", "Running"],
            &[
                &["2024-03-07 10:00:00", "10", "10"],
                &["2024-03-08 10:00:00", "FRIDAY_CLOSE", "10"],
                &["2024-03-11 10:00:00", "-5", "5"],
            ],
        );

        let normalized = normalize(&raw);
        assert_eq!(normalized.records.len(), 3);
        assert_eq!(normalized.records[1].pnl, Decimal::ZERO);
        assert_eq!(normalized.records[1].running, dec!(10));
        assert_eq!(normalized.quality.zero_filled_cells, 1);
    }

    #[test]
    fn test_unparsable_time_is_sentinel() {
        let raw = table(
            &["Open Time", "PnL"],
            &[&["yesterday", "1"], &["", "2"], &["2024-01-01", "3"]],
        );

        let normalized = normalize(&raw);
        assert_eq!(normalized.records[0].open_time, None);
        assert_eq!(normalized.records[1].open_time, None);
        assert!(normalized.records[2].open_time.is_some());
        assert_eq!(normalized.quality.unparsable_times, 1);
    }

    #[test]
    fn test_missing_columns_are_left_alone() {
        let raw = table(&["PnL"], &[&["4"], &["x"]]);

        let normalized = normalize(&raw);
        assert!(!normalized.schema.has(Column::Running));
        assert_eq!(normalized.records[0].running, Decimal::ZERO);
        assert_eq!(normalized.records[0].balance, None);
        assert_eq!(normalized.records[1].strategy, None);
        // Only the PnL cell counts as coerced; absent columns are not.
        assert_eq!(normalized.quality.zero_filled_cells, 1);
    }

    #[test]
    fn test_running_falls_back_to_balance() {
        let raw = table(&["PnL", "Balance"], &[&["5", "1005"], &["-2", "oops"]]);

        let normalized = normalize(&raw);
        assert_eq!(normalized.records[0].running, dec!(1005));
        assert_eq!(normalized.records[0].balance, Some(dec!(1005)));
        assert_eq!(normalized.records[1].running, Decimal::ZERO);
    }

    #[test]
    fn test_short_rows_do_not_panic() {
        let raw = table(&["Symbol", "PnL", "Running"], &[&["BTCUSDT"]]);

        let normalized = normalize(&raw);
        assert_eq!(normalized.records[0].symbol.as_deref(), Some("BTCUSDT"));
        assert_eq!(normalized.records[0].pnl, Decimal::ZERO);
        assert_eq!(normalized.quality.zero_filled_cells, 2);
    }

    #[test]
    fn test_strategy_kept_verbatim() {
        let raw = table(&["Strategy", "PnL"], &[&[" Darwin_2.0", "1"]]);

        let normalized = normalize(&raw);
        assert_eq!(normalized.records[0].strategy.as_deref(), Some(" Darwin_2.0"));
    }

    #[test]
    fn test_symbol_falls_back_to_pair() {
        let raw = table(
            &["Symbol", "Pair", "PnL"],
            &[&["ETHUSDT", "ETH/USDT", "1"], &["", "BTC/USDT", "2"]],
        );

        let normalized = normalize(&raw);
        assert_eq!(normalized.records[0].symbol.as_deref(), Some("ETHUSDT"));
        assert_eq!(normalized.records[1].symbol.as_deref(), Some("BTC/USDT"));
        assert_eq!(normalized.records[1].pair.as_deref(), Some("BTC/USDT"));
    }

    #[test]
    fn test_pair_only_table_fills_symbol() {
        let raw = table(&["Pair", "PnL", "Running"], &[&["BTCUSDT", "1", "1"]]);

        let normalized = normalize(&raw);
        assert_eq!(normalized.records[0].symbol.as_deref(), Some("BTCUSDT"));
    }
}
