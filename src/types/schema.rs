use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Column, RawTable};

/// The recognized columns actually present in a source table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: BTreeSet<Column>,
}

impl Schema {
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let columns = headers
            .iter()
            .filter_map(|h| Column::from_header(h.as_ref()))
            .collect();
        Self { columns }
    }

    pub fn of(table: &RawTable) -> Self {
        Self::from_headers(&table.headers)
    }

    pub fn has(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Whether normalized records carry a value for `column`. `Symbol` is
    /// filled from `Pair` when the log only has the latter.
    pub fn provides(&self, column: Column) -> bool {
        match column {
            Column::Symbol => self.has(Column::Symbol) || self.has(Column::Pair),
            other => self.has(other),
        }
    }

    /// Which derived views the schema can support, given the columns the
    /// caller would like to show in the recent-events table.
    pub fn capabilities(&self, display_columns: &[Column]) -> Capabilities {
        Capabilities {
            strategy_filter: self.has(Column::Strategy),
            pnl_stats: self.has(Column::PnL),
            net_profit: self.has(Column::Running) || self.has(Column::Balance),
            equity_curve: self.has(Column::OpenTime)
                && (self.has(Column::Running) || self.has(Column::Balance)),
            recent_columns: display_columns
                .iter()
                .copied()
                .filter(|c| self.provides(*c))
                .collect(),
        }
    }
}

/// Derived views available for a given schema. A `false` flag means the
/// view is skipped, never that the refresh failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// `Strategy` present; otherwise every row counts as the strategy's.
    pub strategy_filter: bool,
    pub pnl_stats: bool,
    pub net_profit: bool,
    pub equity_curve: bool,
    pub recent_columns: Vec<Column>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_ignores_unknown_headers() {
        let schema = Schema::from_headers(&["Open Time", "PnL", "Notes", "pnl"]);
        assert!(schema.has(Column::OpenTime));
        assert!(schema.has(Column::PnL));
        assert!(!schema.has(Column::Running));
        assert_eq!(schema, Schema::from_headers(&["PnL", "Open Time"]));
    }

    #[test]
    fn test_capabilities_without_strategy_or_time() {
        let schema = Schema::from_headers(&["PnL", "Running", "Reason"]);
        let caps = schema.capabilities(&[Column::Symbol, Column::PnL, Column::Reason]);

        assert!(!caps.strategy_filter);
        assert!(caps.pnl_stats);
        assert!(caps.net_profit);
        assert!(!caps.equity_curve);
        assert_eq!(caps.recent_columns, vec![Column::PnL, Column::Reason]);
    }

    #[test]
    fn test_balance_enables_equity_views() {
        let schema = Schema::from_headers(&["Open Time", "PnL", "Balance"]);
        let caps = schema.capabilities(&[]);
        assert!(caps.net_profit);
        assert!(caps.equity_curve);
        assert!(caps.recent_columns.is_empty());
    }

    #[test]
    fn test_pair_provides_symbol() {
        let schema = Schema::from_headers(&["Pair", "PnL", "Running"]);
        assert!(!schema.has(Column::Symbol));
        assert!(schema.provides(Column::Symbol));

        let caps = schema.capabilities(&[Column::Symbol, Column::Type, Column::PnL, Column::Reason]);
        assert_eq!(caps.recent_columns, vec![Column::Symbol, Column::PnL]);
    }
}
