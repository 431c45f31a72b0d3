use crate::types::{Column, TradeRecord};

use super::NormalizedTable;

/// Rows attributed to the strategy, and the closed trades among them.
#[derive(Debug, Clone, Default)]
pub struct TradeSelection<'a> {
    pub strategy_rows: Vec<&'a TradeRecord>,
    pub closed: Vec<&'a TradeRecord>,
    /// False when the table has no `Strategy` column and every row passed.
    pub filtered_by_strategy: bool,
}

/// Select the rows whose `Strategy` equals `strategy` exactly, then the
/// closed trades (non-zero PnL) among them.
///
/// Without a `Strategy` column every row is kept. A `None` label also keeps
/// every row.
pub fn select_trades<'a>(table: &'a NormalizedTable, strategy: Option<&str>) -> TradeSelection<'a> {
    let filtered_by_strategy = strategy.is_some() && table.schema.has(Column::Strategy);

    let strategy_rows: Vec<&TradeRecord> = match strategy {
        Some(label) if filtered_by_strategy => table
            .records
            .iter()
            .filter(|r| r.strategy.as_deref() == Some(label))
            .collect(),
        _ => table.records.iter().collect(),
    };

    let closed = strategy_rows
        .iter()
        .copied()
        .filter(|r| r.is_closed())
        .collect();

    TradeSelection {
        strategy_rows,
        closed,
        filtered_by_strategy,
    }
}
