use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Column;

/// Format used whenever an open time is rendered back to text.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The trade log exactly as it came off the wire: a header row and the
/// textual cells of every data row, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Position of the first header matching `column`, if present.
    pub fn index_of(&self, column: Column) -> Option<usize> {
        self.headers.iter().position(|h| h == column.as_str())
    }
}

/// One normalized row of the trade log.
///
/// `pnl` and `running` are always numeric; text that does not parse is
/// coerced to zero. An open time that does not parse stays `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Zero-based position in the source table.
    pub row: usize,
    pub open_time: Option<NaiveDateTime>,
    pub symbol: Option<String>,
    pub pair: Option<String>,
    pub trade_type: Option<String>,
    pub strategy: Option<String>,
    pub pnl: Decimal,
    pub running: Decimal,
    pub balance: Option<Decimal>,
    pub reason: Option<String>,
}

impl TradeRecord {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            open_time: None,
            symbol: None,
            pair: None,
            trade_type: None,
            strategy: None,
            pnl: Decimal::ZERO,
            running: Decimal::ZERO,
            balance: None,
            reason: None,
        }
    }

    /// A pass-through row (skip day, pause) carries zero PnL.
    pub fn is_closed(&self) -> bool {
        !self.pnl.is_zero()
    }

    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    pub fn is_loss(&self) -> bool {
        self.pnl < Decimal::ZERO
    }

    /// Display text for one column of this row.
    pub fn display_value(&self, column: Column) -> String {
        match column {
            Column::OpenTime => self
                .open_time
                .map(|t| t.format(TIME_FORMAT).to_string())
                .unwrap_or_else(|| "-".to_string()),
            Column::Symbol => self.symbol.clone().unwrap_or_default(),
            Column::Pair => self.pair.clone().unwrap_or_default(),
            Column::Type => self.trade_type.clone().unwrap_or_default(),
            Column::Strategy => self.strategy.clone().unwrap_or_default(),
            Column::PnL => format!("{:.2}", self.pnl),
            Column::Running => format!("{:.2}", self.running),
            Column::Balance => self
                .balance
                .map(|b| format!("{:.2}", b))
                .unwrap_or_default(),
            Column::Reason => self.reason.clone().unwrap_or_default(),
        }
    }
}
