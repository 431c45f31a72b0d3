use serde::{Deserialize, Serialize};
use std::fmt;

/// A column of the trade log the monitor knows how to interpret.
///
/// Header matching is exact and case-sensitive; anything else in the source
/// table is carried along untouched and never displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "Open Time")]
    OpenTime,
    Symbol,
    Pair,
    Type,
    Strategy,
    PnL,
    Running,
    Balance,
    Reason,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::OpenTime => "Open Time",
            Column::Symbol => "Symbol",
            Column::Pair => "Pair",
            Column::Type => "Type",
            Column::Strategy => "Strategy",
            Column::PnL => "PnL",
            Column::Running => "Running",
            Column::Balance => "Balance",
            Column::Reason => "Reason",
        }
    }

    pub fn from_header(header: &str) -> Option<Self> {
        match header {
            "Open Time" => Some(Column::OpenTime),
            "Symbol" => Some(Column::Symbol),
            "Pair" => Some(Column::Pair),
            "Type" => Some(Column::Type),
            "Strategy" => Some(Column::Strategy),
            "PnL" => Some(Column::PnL),
            "Running" => Some(Column::Running),
            "Balance" => Some(Column::Balance),
            "Reason" => Some(Column::Reason),
            _ => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_matching_is_case_sensitive() {
        assert_eq!(Column::from_header("PnL"), Some(Column::PnL));
        assert_eq!(Column::from_header("pnl"), None);
        assert_eq!(Column::from_header("Open Time"), Some(Column::OpenTime));
        assert_eq!(Column::from_header("open time"), None);
    }

    #[test]
    fn test_every_column_round_trips_through_its_header() {
        let columns = [
            Column::OpenTime,
            Column::Symbol,
            Column::Pair,
            Column::Type,
            Column::Strategy,
            Column::PnL,
            Column::Running,
            Column::Balance,
            Column::Reason,
        ];
        for column in columns {
            assert_eq!(Column::from_header(column.as_str()), Some(column));
        }
    }

    #[test]
    fn test_serde_uses_header_names() {
        let json = serde_json::to_string(&Column::OpenTime).unwrap();
        assert_eq!(json, "\"Open Time\"");
        let parsed: Column = serde_json::from_str("\"PnL\"").unwrap();
        assert_eq!(parsed, Column::PnL);
    }
}
