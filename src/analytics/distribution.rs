use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::TradeRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub range_start: Decimal,
    pub range_end: Decimal,
    pub count: u64,
    pub label: String,
}

impl HistogramBucket {
    fn new(range_start: Decimal, range_end: Decimal) -> Self {
        Self {
            range_start,
            range_end,
            count: 0,
            label: format!("{:.2} to {:.2}", range_start, range_end),
        }
    }
}

/// Equal-width PnL histogram spanning the observed min..max.
///
/// The last bucket is closed on the right so the maximum lands in it. When
/// every trade has the same PnL, or the range is too narrow to split at
/// `Decimal` precision, a single bucket holds them all.
pub fn pnl_histogram(closed: &[&TradeRecord], bins: usize) -> Vec<HistogramBucket> {
    if closed.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = closed.iter().map(|t| t.pnl).min().unwrap_or(Decimal::ZERO);
    let max = closed.iter().map(|t| t.pnl).max().unwrap_or(Decimal::ZERO);
    let count = Decimal::from(bins);

    // A range wider than Decimal::MAX is split on pre-scaled bounds instead.
    let width = match max.checked_sub(min) {
        Some(range) => range.checked_div(count).unwrap_or(Decimal::ZERO),
        None => max / count - min / count,
    };

    if width.is_zero() {
        let mut bucket = HistogramBucket::new(min, max);
        bucket.count = closed.len() as u64;
        return vec![bucket];
    }

    let boundary = |i: usize| {
        width
            .checked_mul(Decimal::from(i))
            .and_then(|offset| min.checked_add(offset))
            .unwrap_or_else(|| {
                let t = Decimal::from(i) / count;
                (min * (Decimal::ONE - t)).saturating_add(max * t)
            })
            .min(max)
    };

    let mut buckets: Vec<HistogramBucket> = (0..bins)
        .map(|i| {
            let end = if i + 1 == bins { max } else { boundary(i + 1) };
            HistogramBucket::new(boundary(i), end)
        })
        .collect();

    for trade in closed {
        let position = match trade.pnl.checked_sub(min) {
            Some(offset) => offset.checked_div(width),
            None => (trade.pnl / count - min / count)
                .checked_div(width)
                .and_then(|scaled| scaled.checked_mul(count)),
        };
        let index = position
            .and_then(|p| p.floor().to_usize())
            .unwrap_or(bins - 1)
            .min(bins - 1);
        buckets[index].count += 1;
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trades(pnls: &[Decimal]) -> Vec<TradeRecord> {
        pnls.iter()
            .enumerate()
            .map(|(i, pnl)| {
                let mut r = TradeRecord::new(i);
                r.pnl = *pnl;
                r
            })
            .collect()
    }

    #[test]
    fn test_twenty_buckets_cover_every_trade() {
        let records = trades(&[dec!(-10), dec!(-4), dec!(0.5), dec!(3), dec!(7), dec!(10)]);
        let closed: Vec<&TradeRecord> = records.iter().collect();

        let histogram = pnl_histogram(&closed, 20);
        assert_eq!(histogram.len(), 20);
        assert_eq!(histogram.iter().map(|b| b.count).sum::<u64>(), 6);
        assert_eq!(histogram[0].range_start, dec!(-10));
        assert_eq!(histogram[19].range_end, dec!(10));
        assert_eq!(histogram[0].count, 1);
        assert_eq!(histogram[19].count, 1);
    }

    #[test]
    fn test_identical_values_use_one_bucket() {
        let records = trades(&[dec!(2), dec!(2), dec!(2)]);
        let closed: Vec<&TradeRecord> = records.iter().collect();

        let histogram = pnl_histogram(&closed, 20);
        assert_eq!(histogram.len(), 1);
        assert_eq!(histogram[0].count, 3);
        assert_eq!(histogram[0].label, "2.00 to 2.00");
    }

    #[test]
    fn test_range_below_decimal_precision_uses_one_bucket() {
        let records = trades(&[
            Decimal::from_str_exact("0.0000000000000000000000000001").unwrap(),
            Decimal::from_str_exact("0.0000000000000000000000000002").unwrap(),
        ]);
        let closed: Vec<&TradeRecord> = records.iter().collect();

        let histogram = pnl_histogram(&closed, 20);
        assert_eq!(histogram.len(), 1);
        assert_eq!(histogram[0].count, 2);
    }

    #[test]
    fn test_range_wider_than_decimal_max() {
        let records = trades(&[Decimal::MAX, Decimal::MIN, Decimal::ZERO]);
        let closed: Vec<&TradeRecord> = records.iter().collect();

        let histogram = pnl_histogram(&closed, 20);
        assert_eq!(histogram.len(), 20);
        assert_eq!(histogram.iter().map(|b| b.count).sum::<u64>(), 3);
        assert_eq!(histogram[0].range_start, Decimal::MIN);
        assert_eq!(histogram[19].range_end, Decimal::MAX);
        assert_eq!(histogram[0].count, 1);
        assert_eq!(histogram[19].count, 1);
        assert!(histogram[9].range_end < histogram[10].range_end);
    }

    #[test]
    fn test_empty_input() {
        assert!(pnl_histogram(&[], 20).is_empty());
    }
}
