use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Capabilities, Column, TradeRecord};

use super::{
    calculate_drawdown, calculate_trade_stats, calculate_win_loss_streaks, equity_curve,
    pnl_histogram, recent_events, select_trades, DataQuality, DrawdownStats, EquityPoint,
    HistogramBucket, NormalizedTable, RecentEvents, TradeStats, WinLossStreaks,
};

/// What to compute a snapshot for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Strategy label to attribute trades to; `None` keeps every row.
    pub strategy: Option<String>,
    pub recent_rows: usize,
    pub display_columns: Vec<Column>,
    pub histogram_bins: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            strategy: Some("Darwin_2.0".to_string()),
            recent_rows: 8,
            display_columns: vec![Column::Symbol, Column::Type, Column::PnL, Column::Reason],
            histogram_bins: 20,
        }
    }
}

/// Everything the monitor shows for one refresh. Built from scratch every
/// cycle and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub row_count: usize,
    pub strategy: Option<String>,
    /// False when every row was attributed to the strategy (no label, or
    /// no `Strategy` column).
    pub strategy_applied: bool,
    /// Rows attributed to the strategy, closed or not.
    pub strategy_rows: usize,
    pub capabilities: Capabilities,
    pub data_quality: DataQuality,
    /// `running` of the last row of the full log.
    pub net_profit: Option<Decimal>,
    pub stats: TradeStats,
    pub streaks: WinLossStreaks,
    pub drawdown: DrawdownStats,
    pub equity_curve: Vec<EquityPoint>,
    pub pnl_histogram: Vec<HistogramBucket>,
    pub recent_events: RecentEvents,
}

impl AggregateSnapshot {
    pub fn total_trades(&self) -> u64 {
        self.stats.total_trades
    }

    pub fn win_rate(&self) -> Decimal {
        self.stats.win_rate
    }

    pub fn profit_factor(&self) -> Decimal {
        self.stats.profit_factor
    }

    /// Pretty print the snapshot to the console
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("                    TRADE MONITOR");
        println!("{}", "=".repeat(60));
        match &self.strategy {
            Some(label) if self.strategy_applied => {
                println!("Strategy:           {} ({} of {} rows)", label, self.strategy_rows, self.row_count)
            }
            _ => println!("Strategy:           (all {} rows)", self.row_count),
        }
        if self.data_quality.zero_filled_cells > 0 || self.data_quality.unparsable_times > 0 {
            println!("Data Quality:       {} cells zero-filled, {} bad timestamps",
                     self.data_quality.zero_filled_cells, self.data_quality.unparsable_times);
        }
        println!("{}", "-".repeat(60));
        match self.net_profit {
            Some(net) => println!("  Net Profit:         ${:.2}", net),
            None => println!("  Net Profit:         n/a (no Running/Balance column)"),
        }
        if self.capabilities.pnl_stats {
            self.print_trade_stats();
        } else {
            println!("  Win Rate:           n/a (no PnL column)");
            println!("  Profit Factor:      n/a (no PnL column)");
            println!("  Total Trades:       n/a (no PnL column)");
        }

        if !self.recent_events.columns.is_empty() && !self.recent_events.rows.is_empty() {
            println!("{}", "-".repeat(60));
            println!("RECENT ACTIVITY");
            let header: Vec<&str> = self.recent_events.columns.iter().map(|c| c.as_str()).collect();
            println!("  {}", header.join(" | "));
            for row in &self.recent_events.rows {
                println!("  {}", row.values.join(" | "));
            }
        }
        println!("{}", "=".repeat(60));
    }

    fn print_trade_stats(&self) {
        println!("  Win Rate:           {:.1}%", self.win_rate());
        if self.stats.profit_factor_undefined() {
            println!("  Profit Factor:      n/a (no losing trades)");
        } else {
            println!("  Profit Factor:      {:.2}", self.profit_factor());
        }
        println!("  Total Trades:       {}", self.total_trades());
        println!("{}", "-".repeat(60));
        println!("TRADES");
        println!("  Winning Trades:     {}", self.stats.winning_trades);
        println!("  Losing Trades:      {}", self.stats.losing_trades);
        println!("  Average Win:        ${:.2}", self.stats.avg_win);
        println!("  Average Loss:       ${:.2}", self.stats.avg_loss);
        println!("  Largest Win:        ${:.2}", self.stats.largest_win);
        println!("  Largest Loss:       ${:.2}", self.stats.largest_loss);
        println!("  Expectancy:         ${:.2}", self.stats.expectancy);
        println!("  Max Drawdown:       ${:.2} ({:.2}%)", self.drawdown.max_drawdown, self.drawdown.max_drawdown_pct);
        println!("  Streak:             {} (best {}, worst {})",
                 self.streaks.current_streak, self.streaks.max_win_streak, self.streaks.max_loss_streak);
    }
}

/// Reduce a normalized trade log to a snapshot. Pure: the same table and
/// options always give the same result.
pub fn compute_snapshot(table: &NormalizedTable, options: &SnapshotOptions) -> AggregateSnapshot {
    let capabilities = table.schema.capabilities(&options.display_columns);
    let selection = select_trades(table, options.strategy.as_deref());

    // Without a PnL column every row would read as an open trade.
    let closed: &[&TradeRecord] = if capabilities.pnl_stats {
        &selection.closed
    } else {
        &[]
    };

    let stats = calculate_trade_stats(closed);
    let streaks = calculate_win_loss_streaks(closed);

    let net_profit = if capabilities.net_profit {
        table.records.last().map(|r| r.running)
    } else {
        None
    };

    let equity_curve = if capabilities.equity_curve {
        equity_curve(&table.records)
    } else {
        Vec::new()
    };
    let drawdown = calculate_drawdown(&equity_curve);

    let pnl_histogram = pnl_histogram(closed, options.histogram_bins);
    let recent_events = recent_events(
        &table.records,
        options.recent_rows,
        &capabilities.recent_columns,
    );

    AggregateSnapshot {
        row_count: table.records.len(),
        strategy: options.strategy.clone(),
        strategy_applied: selection.filtered_by_strategy,
        strategy_rows: selection.strategy_rows.len(),
        capabilities,
        data_quality: table.quality,
        net_profit,
        stats,
        streaks,
        drawdown,
        equity_curve,
        pnl_histogram,
        recent_events,
    }
}
