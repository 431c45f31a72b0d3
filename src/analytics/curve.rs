use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Column, TradeRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub time: NaiveDateTime,
    pub running: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawdownStats {
    pub max_drawdown: Decimal,
    /// Relative to the running peak; zero while the peak is not positive.
    pub max_drawdown_pct: Decimal,
    pub current_drawdown: Decimal,
}

/// Newest-first window over the tail of the trade log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentEvents {
    pub columns: Vec<Column>,
    pub rows: Vec<RecentRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentRow {
    pub row: usize,
    pub values: Vec<String>,
}

/// `(open_time, running)` for every record with a parseable open time, in
/// source order. The order is deliberately left alone: an out-of-order log
/// should show up as a crooked curve.
pub fn equity_curve(records: &[TradeRecord]) -> Vec<EquityPoint> {
    records
        .iter()
        .filter_map(|r| {
            r.open_time.map(|time| EquityPoint {
                time,
                running: r.running,
            })
        })
        .collect()
}

/// The last `count` records of the unfiltered log, newest first, projected
/// onto `columns`.
pub fn recent_events(records: &[TradeRecord], count: usize, columns: &[Column]) -> RecentEvents {
    let rows = records
        .iter()
        .rev()
        .take(count)
        .map(|r| RecentRow {
            row: r.row,
            values: columns.iter().map(|c| r.display_value(*c)).collect(),
        })
        .collect();

    RecentEvents {
        columns: columns.to_vec(),
        rows,
    }
}

pub fn calculate_drawdown(points: &[EquityPoint]) -> DrawdownStats {
    let Some(first) = points.first() else {
        return DrawdownStats::default();
    };

    let mut peak = first.running;
    let mut stats = DrawdownStats::default();

    for point in points {
        if point.running > peak {
            peak = point.running;
        }

        let drawdown = peak.saturating_sub(point.running);
        if drawdown > stats.max_drawdown {
            stats.max_drawdown = drawdown;
            if peak > Decimal::ZERO {
                stats.max_drawdown_pct = drawdown
                    .checked_div(peak)
                    .and_then(|ratio| ratio.checked_mul(dec!(100)))
                    .unwrap_or(Decimal::MAX);
            }
        }
        stats.current_drawdown = drawdown;
    }

    stats
}
