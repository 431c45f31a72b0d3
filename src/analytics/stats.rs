use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::TradeRecord;

/// Headline statistics over the closed trades of the selected strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    /// Percentage in [0, 100]; zero when there are no closed trades.
    pub win_rate: Decimal,
    pub gross_profit: Decimal,
    /// Absolute value of the summed losing PnL.
    pub gross_loss: Decimal,
    /// `gross_profit / gross_loss`; zero when `gross_loss` is zero.
    pub profit_factor: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    pub expectancy: Decimal,
}

impl TradeStats {
    /// Zero-loss profit factor is reported as 0, which would otherwise read
    /// as break-even. True when that sentinel is standing in for "no losses".
    pub fn profit_factor_undefined(&self) -> bool {
        self.gross_loss.is_zero() && self.winning_trades > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinLossStreaks {
    /// Positive for consecutive wins, negative for consecutive losses.
    pub current_streak: i32,
    pub max_win_streak: u32,
    pub max_loss_streak: u32,
}

/// Sum that pins at `Decimal::MAX`/`MIN` instead of overflowing.
fn saturating_sum<I: IntoIterator<Item = Decimal>>(values: I) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, value| acc.saturating_add(value))
}

pub fn calculate_trade_stats(closed: &[&TradeRecord]) -> TradeStats {
    if closed.is_empty() {
        return TradeStats::default();
    }

    let wins: Vec<Decimal> = closed.iter().filter(|t| t.is_win()).map(|t| t.pnl).collect();
    let losses: Vec<Decimal> = closed.iter().filter(|t| t.is_loss()).map(|t| t.pnl).collect();

    let total_trades = closed.len() as u64;
    let winning_trades = wins.len() as u64;
    let losing_trades = losses.len() as u64;

    let win_rate = Decimal::from(winning_trades) / Decimal::from(total_trades) * dec!(100);

    let gross_profit = saturating_sum(wins.iter().copied());
    let net_loss = saturating_sum(losses.iter().copied());
    let gross_loss = net_loss.abs();

    let profit_factor = if gross_loss > Decimal::ZERO {
        gross_profit.checked_div(gross_loss).unwrap_or(Decimal::MAX)
    } else {
        Decimal::ZERO
    };

    let avg_win = if wins.is_empty() {
        Decimal::ZERO
    } else {
        gross_profit / Decimal::from(winning_trades)
    };

    let avg_loss = if losses.is_empty() {
        Decimal::ZERO
    } else {
        net_loss / Decimal::from(losing_trades)
    };

    let largest_win = wins.iter().copied().max().unwrap_or(Decimal::ZERO);
    let largest_loss = losses.iter().copied().min().unwrap_or(Decimal::ZERO);

    let expectancy = saturating_sum(closed.iter().map(|t| t.pnl)) / Decimal::from(total_trades);

    TradeStats {
        total_trades,
        winning_trades,
        losing_trades,
        win_rate,
        gross_profit,
        gross_loss,
        profit_factor,
        avg_win,
        avg_loss,
        largest_win,
        largest_loss,
        expectancy,
    }
}

pub fn calculate_win_loss_streaks(closed: &[&TradeRecord]) -> WinLossStreaks {
    let mut current_streak = 0i32;
    let mut max_win_streak = 0u32;
    let mut max_loss_streak = 0u32;

    for trade in closed {
        if trade.is_win() {
            current_streak = if current_streak >= 0 { current_streak + 1 } else { 1 };
            max_win_streak = max_win_streak.max(current_streak as u32);
        } else if trade.is_loss() {
            current_streak = if current_streak <= 0 { current_streak - 1 } else { -1 };
            max_loss_streak = max_loss_streak.max(current_streak.unsigned_abs());
        }
    }

    WinLossStreaks {
        current_streak,
        max_win_streak,
        max_loss_streak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trades(pnls: &[Decimal]) -> Vec<TradeRecord> {
        pnls.iter()
            .enumerate()
            .map(|(i, pnl)| {
                let mut record = TradeRecord::new(i);
                record.pnl = *pnl;
                record
            })
            .collect()
    }

    #[test]
    fn test_empty_closed_set() {
        let stats = calculate_trade_stats(&[]);
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.win_rate, Decimal::ZERO);
        assert_eq!(stats.profit_factor, Decimal::ZERO);
        assert!(!stats.profit_factor_undefined());
    }

    #[test]
    fn test_one_win_one_loss() {
        let records = trades(&[dec!(10), dec!(-5)]);
        let closed: Vec<&TradeRecord> = records.iter().collect();

        let stats = calculate_trade_stats(&closed);
        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.winning_trades, 1);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.win_rate, dec!(50));
        assert_eq!(stats.gross_profit, dec!(10));
        assert_eq!(stats.gross_loss, dec!(5));
        assert_eq!(stats.profit_factor, dec!(2));
        assert_eq!(stats.expectancy, dec!(2.5));
        assert_eq!(stats.largest_win, dec!(10));
        assert_eq!(stats.largest_loss, dec!(-5));
    }

    #[test]
    fn test_no_losses_reports_zero_profit_factor() {
        let records = trades(&[dec!(3), dec!(4)]);
        let closed: Vec<&TradeRecord> = records.iter().collect();

        let stats = calculate_trade_stats(&closed);
        assert_eq!(stats.win_rate, dec!(100));
        assert_eq!(stats.gross_loss, Decimal::ZERO);
        assert_eq!(stats.profit_factor, Decimal::ZERO);
        assert!(stats.profit_factor_undefined());
    }

    #[test]
    fn test_win_rate_stays_in_range() {
        let records = trades(&[dec!(-1), dec!(-2), dec!(-3), dec!(0.5)]);
        let closed: Vec<&TradeRecord> = records.iter().collect();

        let stats = calculate_trade_stats(&closed);
        assert!(stats.win_rate >= Decimal::ZERO && stats.win_rate <= dec!(100));
        assert_eq!(stats.win_rate, dec!(25));
        assert_eq!(stats.avg_loss, dec!(-2));
    }

    #[test]
    fn test_extreme_values_saturate() {
        let records = trades(&[Decimal::MAX, Decimal::MAX, Decimal::MIN, Decimal::MIN]);
        let closed: Vec<&TradeRecord> = records.iter().collect();

        let stats = calculate_trade_stats(&closed);
        assert_eq!(stats.gross_profit, Decimal::MAX);
        assert_eq!(stats.gross_loss, Decimal::MAX);
        assert_eq!(stats.profit_factor, Decimal::ONE);
        assert_eq!(stats.win_rate, dec!(50));
    }

    #[test]
    fn test_tiny_loss_profit_factor_pins_at_max() {
        let tiny = Decimal::from_str_exact("0.0000000000000000000000000001").unwrap();
        let records = trades(&[Decimal::MAX, -tiny]);
        let closed: Vec<&TradeRecord> = records.iter().collect();

        let stats = calculate_trade_stats(&closed);
        assert_eq!(stats.profit_factor, Decimal::MAX);
    }

    #[test]
    fn test_streaks() {
        let records = trades(&[dec!(1), dec!(2), dec!(-1), dec!(3), dec!(4), dec!(5), dec!(-2), dec!(-3)]);
        let closed: Vec<&TradeRecord> = records.iter().collect();

        let streaks = calculate_win_loss_streaks(&closed);
        assert_eq!(streaks.max_win_streak, 3);
        assert_eq!(streaks.max_loss_streak, 2);
        assert_eq!(streaks.current_streak, -2);
    }
}
