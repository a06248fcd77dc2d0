// Filtering, group-by aggregation, and ranking over the normalized rows.
//
// Everything here is a pure function: filters return a new view and never
// touch the base slice, and group-bys sum only over rows actually present
// in their input (no zero-filled buckets for absent combinations).
// Accumulation goes through `BTreeMap` so aggregate output is always
// ascending by the primary grouping key, independent of input row order.
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

use crate::types::{
    AcquisitionRow, AcquisitionsSummary, AnnualRow, AnnualSummary, DistributionRow,
    DistributionSummary, FilterSelection, MedicineYearTotal, MonthlyUiTotal, ServiceTotal,
    YearTotal,
};

/// Rows whose year falls inside the inclusive `[min, max]` range.
pub fn filter_by_year_range(rows: &[AcquisitionRow], range: (i32, i32)) -> Vec<AcquisitionRow> {
    rows.iter()
        .filter(|r| r.year >= range.0 && r.year <= range.1)
        .cloned()
        .collect()
}

/// Rows whose medicine is in the multi-select set.
pub fn filter_by_medicines(
    rows: &[AcquisitionRow],
    selected: &HashSet<String>,
) -> Vec<AcquisitionRow> {
    rows.iter()
        .filter(|r| selected.contains(&r.medicine))
        .cloned()
        .collect()
}

/// Apply a full [`FilterSelection`]: year range first, then the medicine
/// multi-select (an empty set means no medicine filter).
pub fn apply_filter(rows: &[AcquisitionRow], filter: &FilterSelection) -> Vec<AcquisitionRow> {
    let view = match filter.range {
        Some(range) => filter_by_year_range(rows, range),
        None => rows.to_vec(),
    };
    if filter.selected.is_empty() {
        view
    } else {
        filter_by_medicines(&view, &filter.selected)
    }
}

/// Min and max year present, for building the range selector.
pub fn year_bounds(rows: &[AcquisitionRow]) -> Option<(i32, i32)> {
    let min = rows.iter().map(|r| r.year).min()?;
    let max = rows.iter().map(|r| r.year).max()?;
    Some((min, max))
}

/// Distinct medicine names, sorted, for building the multi-select widget.
pub fn distinct_medicines(rows: &[AcquisitionRow]) -> Vec<String> {
    let mut names: Vec<String> = rows
        .iter()
        .map(|r| r.medicine.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    names.sort();
    names
}

/// Total acquired quantity per year, ascending by year.
pub fn annual_totals(rows: &[AcquisitionRow]) -> Vec<YearTotal> {
    let mut map: BTreeMap<i32, f64> = BTreeMap::new();
    for r in rows {
        *map.entry(r.year).or_insert(0.0) += r.quantity;
    }
    map.into_iter()
        .map(|(year, quantity)| YearTotal { year, quantity })
        .collect()
}

/// Quantity per (year, medicine), ascending by year then medicine. Feeds
/// the stacked-bar and per-medicine line charts.
pub fn annual_totals_by_medicine(rows: &[AcquisitionRow]) -> Vec<MedicineYearTotal> {
    let mut map: BTreeMap<(i32, String), f64> = BTreeMap::new();
    for r in rows {
        *map.entry((r.year, r.medicine.clone())).or_insert(0.0) += r.quantity;
    }
    map.into_iter()
        .map(|((year, medicine), quantity)| MedicineYearTotal {
            year,
            medicine,
            quantity,
        })
        .collect()
}

/// Monthly sums of every UI column, chronological.
pub fn monthly_ui_totals(rows: &[DistributionRow]) -> Vec<MonthlyUiTotal> {
    let mut map: BTreeMap<NaiveDate, [i64; 5]> = BTreeMap::new();
    for r in rows {
        let acc = map.entry(r.period).or_insert([0; 5]);
        acc[0] += r.ui_250;
        acc[1] += r.ui_500;
        acc[2] += r.ui_1000;
        acc[3] += r.ui_1500;
        acc[4] += r.total;
    }
    map.into_iter()
        .map(|(period, [ui_250, ui_500, ui_1000, ui_1500, total])| MonthlyUiTotal {
            period,
            ui_250,
            ui_500,
            ui_1000,
            ui_1500,
            total,
        })
        .collect()
}

/// Accumulated Total Geral per health service, ascending by service name.
/// This name order is also the tie order [`top_services`] preserves.
pub fn service_totals(rows: &[DistributionRow]) -> Vec<ServiceTotal> {
    let mut map: BTreeMap<String, i64> = BTreeMap::new();
    for r in rows {
        *map.entry(r.service.clone()).or_insert(0) += r.total;
    }
    map.into_iter()
        .map(|(service, total)| ServiceTotal { service, total })
        .collect()
}

/// The `n` services with the largest accumulated volume, descending.
/// Stable sort keeps ties in the post-group-by order; fewer than `n`
/// services just returns them all.
pub fn top_services(rows: &[DistributionRow], n: usize) -> Vec<ServiceTotal> {
    let mut totals = service_totals(rows);
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    totals.truncate(n);
    totals
}

/// Bounds of the distribution periods, for the page header metrics.
pub fn period_bounds(rows: &[DistributionRow]) -> Option<(NaiveDate, NaiveDate)> {
    let min = rows.iter().map(|r| r.period).min()?;
    let max = rows.iter().map(|r| r.period).max()?;
    Some((min, max))
}

pub fn acquisitions_summary(
    rows: &[AcquisitionRow],
    range: (i32, i32),
) -> AcquisitionsSummary {
    let medicines: HashSet<&str> = rows.iter().map(|r| r.medicine.as_str()).collect();
    let years: HashSet<i32> = rows.iter().map(|r| r.year).collect();
    AcquisitionsSummary {
        year_from: range.0,
        year_to: range.1,
        distinct_medicines: medicines.len(),
        distinct_years: years.len(),
        total_quantity: rows.iter().map(|r| r.quantity).sum(),
    }
}

pub fn distribution_summary(rows: &[DistributionRow]) -> Option<DistributionSummary> {
    let (period_from, period_to) = period_bounds(rows)?;
    let services: HashSet<&str> = rows.iter().map(|r| r.service.as_str()).collect();
    Some(DistributionSummary {
        period_from,
        period_to,
        distinct_services: services.len(),
        total_volume_ui: rows.iter().map(|r| r.total).sum(),
        records: rows.len(),
    })
}

pub fn annual_summary(rows: &[AnnualRow]) -> Option<AnnualSummary> {
    let year_from = rows.iter().map(|r| r.year).min()?;
    let year_to = rows.iter().map(|r| r.year).max()?;
    Some(AnnualSummary {
        year_from,
        year_to,
        total_quantity: rows.iter().map(|r| r.quantity).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acq(medicine: &str, year: i32, quantity: f64) -> AcquisitionRow {
        AcquisitionRow {
            medicine: medicine.into(),
            year,
            quantity,
        }
    }

    fn dist(service: &str, period: NaiveDate, total: i64) -> DistributionRow {
        DistributionRow {
            period,
            service: service.into(),
            ui_250: 0,
            ui_500: 0,
            ui_1000: 0,
            ui_1500: 0,
            total,
        }
    }

    fn month(year: i32, month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, 1).unwrap()
    }

    #[test]
    fn year_range_filter_is_inclusive_and_pure() {
        let base = vec![
            acq("X", 2019, 1.0),
            acq("X", 2020, 2.0),
            acq("X", 2021, 3.0),
            acq("X", 2022, 4.0),
        ];
        let snapshot = base.clone();
        let view = filter_by_year_range(&base, (2020, 2021));
        assert_eq!(view.iter().map(|r| r.year).collect::<Vec<_>>(), vec![2020, 2021]);
        assert_eq!(base, snapshot);
    }

    #[test]
    fn medicine_filter_respects_selection() {
        let base = vec![acq("A", 2020, 1.0), acq("B", 2020, 2.0)];
        let selected: HashSet<String> = ["B".to_string()].into();
        let view = filter_by_medicines(&base, &selected);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].medicine, "B");
    }

    #[test]
    fn empty_selection_means_no_medicine_filter() {
        let base = vec![acq("A", 2020, 1.0), acq("B", 2021, 2.0)];
        let filter = FilterSelection {
            range: Some((2020, 2021)),
            selected: HashSet::new(),
        };
        assert_eq!(apply_filter(&base, &filter).len(), 2);
    }

    #[test]
    fn annual_totals_are_order_independent() {
        let a = vec![acq("X", 2020, 5.0), acq("X", 2021, 7.0), acq("Y", 2020, 3.0)];
        let mut b = a.clone();
        b.reverse();
        let expected = vec![
            YearTotal { year: 2020, quantity: 8.0 },
            YearTotal { year: 2021, quantity: 7.0 },
        ];
        assert_eq!(annual_totals(&a), expected);
        assert_eq!(annual_totals(&b), expected);
    }

    #[test]
    fn totals_by_medicine_sort_by_year_then_name() {
        let rows = vec![
            acq("B", 2021, 1.0),
            acq("A", 2021, 2.0),
            acq("A", 2020, 3.0),
        ];
        let totals = annual_totals_by_medicine(&rows);
        let keys: Vec<(i32, &str)> = totals
            .iter()
            .map(|t| (t.year, t.medicine.as_str()))
            .collect();
        assert_eq!(keys, vec![(2020, "A"), (2021, "A"), (2021, "B")]);
    }

    #[test]
    fn no_zero_filled_buckets_for_absent_combinations() {
        let rows = vec![acq("A", 2020, 1.0), acq("B", 2022, 2.0)];
        let totals = annual_totals(&rows);
        assert_eq!(totals.len(), 2); // no 2021 bucket
    }

    #[test]
    fn monthly_ui_totals_sum_and_sort_chronologically() {
        let mut r1 = dist("A", month(2019, 2), 30);
        r1.ui_250 = 10;
        let mut r2 = dist("B", month(2019, 1), 5);
        r2.ui_500 = 5;
        let mut r3 = dist("C", month(2019, 2), 70);
        r3.ui_250 = 20;
        let monthly = monthly_ui_totals(&[r1, r2, r3]);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].period, month(2019, 1));
        assert_eq!(monthly[0].ui_500, 5);
        assert_eq!(monthly[1].period, month(2019, 2));
        assert_eq!(monthly[1].ui_250, 30);
        assert_eq!(monthly[1].total, 100);
    }

    #[test]
    fn top_n_ranks_descending_and_truncates() {
        let rows = vec![
            dist("A", month(2020, 1), 50),
            dist("B", month(2020, 1), 30),
            dist("C", month(2020, 1), 80),
            dist("D", month(2020, 1), 10),
        ];
        let top = top_services(&rows, 2);
        assert_eq!(
            top,
            vec![
                ServiceTotal { service: "C".into(), total: 80 },
                ServiceTotal { service: "A".into(), total: 50 },
            ]
        );
    }

    #[test]
    fn top_n_breaks_ties_in_group_by_order() {
        let rows = vec![
            dist("Beta", month(2020, 1), 40),
            dist("Alfa", month(2020, 1), 40),
        ];
        let top = top_services(&rows, 2);
        assert_eq!(top[0].service, "Alfa");
        assert_eq!(top[1].service, "Beta");
    }

    #[test]
    fn top_n_returns_everything_when_short() {
        let rows = vec![dist("A", month(2020, 1), 1)];
        assert_eq!(top_services(&rows, 15).len(), 1);
    }

    #[test]
    fn bounds_and_distincts_feed_the_selectors() {
        let rows = vec![acq("B", 2021, 1.0), acq("A", 2019, 2.0), acq("A", 2020, 3.0)];
        assert_eq!(year_bounds(&rows), Some((2019, 2021)));
        assert_eq!(distinct_medicines(&rows), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(year_bounds(&[]), None);
    }

    #[test]
    fn summaries_count_the_post_cleaning_state() {
        let rows = vec![
            dist("A", month(2019, 1), 100),
            dist("B", month(2020, 6), 200),
        ];
        let s = distribution_summary(&rows).unwrap();
        assert_eq!(s.period_from, month(2019, 1));
        assert_eq!(s.period_to, month(2020, 6));
        assert_eq!(s.distinct_services, 2);
        assert_eq!(s.total_volume_ui, 300);
        assert_eq!(s.records, 2);
        assert!(distribution_summary(&[]).is_none());
    }
}
