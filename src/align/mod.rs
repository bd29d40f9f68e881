//! Month-keyed inner join of the labor and market series.

use crate::domain::{AlignedFrame, AlignedRow, MarketBar, MonthKey, SeriesFrame};

/// Join two sorted frames on month equality, keeping months present in both.
///
/// Both inputs are ascending without duplicates, so a single merge pass is
/// enough and the output is ascending as well.
pub fn inner_join<A: Clone, B: Clone>(
    left: &SeriesFrame<A>,
    right: &SeriesFrame<B>,
) -> Vec<(MonthKey, A, B)> {
    let l = left.observations();
    let r = right.observations();
    let mut out = Vec::with_capacity(l.len().min(r.len()));

    let (mut i, mut j) = (0, 0);
    while i < l.len() && j < r.len() {
        match l[i].month.cmp(&r[j].month) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push((l[i].month, l[i].value.clone(), r[j].value.clone()));
                i += 1;
                j += 1;
            }
        }
    }

    out
}

/// Align payroll levels with market bars; unmatched months are dropped.
pub fn align(labor: &SeriesFrame<f64>, market: &SeriesFrame<MarketBar>) -> AlignedFrame {
    let rows = inner_join(labor, market)
        .into_iter()
        .map(|(month, payroll, market)| AlignedRow {
            month,
            payroll,
            market,
        })
        .collect();
    let frame = AlignedFrame::from_rows(rows);
    tracing::info!(
        labor = labor.len(),
        market = market.len(),
        aligned = frame.len(),
        "series aligned"
    );
    frame
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::domain::MonthlyObservation;

    fn month(y: i32, m: u32) -> MonthKey {
        MonthKey::new(y, m).unwrap()
    }

    fn bar(close: f64) -> MarketBar {
        MarketBar {
            open: close - 10.0,
            high: close + 20.0,
            low: close - 20.0,
            close,
            volume: 1_000,
        }
    }

    fn labor(months: &[(i32, u32)]) -> SeriesFrame<f64> {
        SeriesFrame::new(
            "labor",
            months
                .iter()
                .enumerate()
                .map(|(i, &(y, m))| MonthlyObservation::new(month(y, m), 150_000.0 + i as f64))
                .collect(),
        )
    }

    fn market(months: &[(i32, u32)]) -> SeriesFrame<MarketBar> {
        SeriesFrame::new(
            "market",
            months
                .iter()
                .enumerate()
                .map(|(i, &(y, m))| MonthlyObservation::new(month(y, m), bar(4_000.0 + i as f64)))
                .collect(),
        )
    }

    #[test]
    fn keeps_exactly_the_month_intersection() {
        let a = labor(&[(2024, 1), (2024, 2), (2024, 3), (2024, 5)]);
        let b = market(&[(2023, 12), (2024, 2), (2024, 3), (2024, 4), (2024, 5)]);
        let frame = align(&a, &b);

        let got: BTreeSet<MonthKey> = frame.rows().iter().map(|r| r.month).collect();
        let la: BTreeSet<MonthKey> = a.months().collect();
        let lb: BTreeSet<MonthKey> = b.months().collect();
        let expected: BTreeSet<MonthKey> = la.intersection(&lb).copied().collect();

        assert_eq!(got, expected);
        assert!(frame.len() <= a.len().min(b.len()));
        assert!(frame.rows().windows(2).all(|w| w[0].month < w[1].month));
    }

    #[test]
    fn forwards_market_fields_and_payroll() {
        let a = labor(&[(2024, 1), (2024, 2)]);
        let b = market(&[(2024, 2)]);
        let frame = align(&a, &b);
        assert_eq!(frame.len(), 1);
        let row = frame.rows()[0];
        assert_eq!(row.month, month(2024, 2));
        assert_eq!(row.payroll, 150_001.0);
        assert_eq!(row.market, bar(4_000.0));
    }

    #[test]
    fn join_is_symmetric_up_to_column_order() {
        let a = labor(&[(2020, 1), (2020, 3), (2020, 4), (2021, 1)]);
        let b = market(&[(2020, 2), (2020, 3), (2021, 1), (2021, 2)]);

        let ab = inner_join(&a, &b);
        let ba: Vec<(MonthKey, f64, MarketBar)> = inner_join(&b, &a)
            .into_iter()
            .map(|(m, mb, v)| (m, v, mb))
            .collect();
        assert_eq!(ab, ba);
    }

    #[test]
    fn disjoint_or_empty_inputs_give_empty_frame() {
        let a = labor(&[(2024, 1), (2024, 2)]);
        let b = market(&[(2019, 1)]);
        assert!(align(&a, &b).is_empty());
        assert!(align(&a, &SeriesFrame::empty("market")).is_empty());
        assert!(align(&SeriesFrame::empty("labor"), &b).is_empty());
    }

    #[test]
    fn decade_with_missing_final_market_month_has_119_rows() {
        let mut lab = Vec::new();
        let mut mkt = Vec::new();
        for y in 2015..=2024 {
            for m in 1..=12 {
                lab.push((y, m));
                if !(y == 2024 && m == 12) {
                    mkt.push((y, m));
                }
            }
        }
        let frame = align(&labor(&lab), &market(&mkt));
        assert_eq!(frame.len(), 119);
        assert_eq!(frame.last().map(|r| r.month), Some(month(2024, 11)));
    }
}
