//! Derived metrics: rates, descriptive statistics, yearly pivot and wave
//! intensity comparison.

use std::collections::{BTreeMap, BTreeSet};

use super::stats::COUNT_COLUMNS;
use super::table::{Cell, Table};
use crate::data::DailyTotal;

/// Round half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percent change from `from` to `to`; `None` when `from` is zero
pub fn percent_change(from: i64, to: i64) -> Option<f64> {
    (from != 0).then(|| round2((to - from) as f64 / from as f64 * 100.0))
}

/// Mean fatality and recovery rate (in percent) per country
#[derive(Debug, Clone, PartialEq)]
pub struct Rates {
    pub fatality: f64,
    pub recovery: f64,
}

/// Average the daily fatality and recovery rates of each country.
/// Days without confirmed cases are ignored.
pub fn rates(totals: &[DailyTotal]) -> BTreeMap<String, Rates> {
    let mut sums: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
    for t in totals.iter().filter(|t| t.confirmed > 0) {
        let entry = sums.entry(t.country.as_str()).or_default();
        entry.0 += t.deaths as f64 / t.confirmed as f64 * 100.0;
        entry.1 += t.recovered as f64 / t.confirmed as f64 * 100.0;
        entry.2 += 1;
    }

    sums.into_iter()
        .map(|(country, (fatality, recovery, n))| {
            (
                country.to_string(),
                Rates {
                    fatality: fatality / n as f64,
                    recovery: recovery / n as f64,
                },
            )
        })
        .collect()
}

pub fn rates_table(title: &str, rates: &BTreeMap<String, Rates>) -> Table {
    let mut table = Table::new(title, ["country", "fatality_rate (%)", "recovery_rate (%)"]);
    for (country, r) in rates {
        table.push(vec![
            country.as_str().into(),
            round2(r.fatality).into(),
            round2(r.recovery).into(),
        ]);
    }
    table
}

/// Summary of one numeric series
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1 denominator)
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = (count > 0).then(|| sorted.iter().sum::<f64>() / count as f64);
        let std = mean.filter(|_| count > 1).map(|m| {
            let var = sorted.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        });

        Summary {
            count,
            mean,
            std,
            min: sorted.first().copied(),
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }
}

/// Quantile of sorted values with linear interpolation between neighbours
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Descriptive statistics of confirmed, death and recovery counts
pub fn describe(totals: &[DailyTotal]) -> [Summary; 3] {
    let series = |f: fn(&DailyTotal) -> i64| -> Vec<f64> {
        totals.iter().map(|t| f(t) as f64).collect()
    };
    [
        Summary::of(&series(|t| t.confirmed)),
        Summary::of(&series(|t| t.deaths)),
        Summary::of(&series(|t| t.recovered)),
    ]
}

pub fn describe_table(title: &str, summaries: &[Summary; 3]) -> Table {
    let mut table = Table::new(title, ["Statistic"].into_iter().chain(COUNT_COLUMNS));

    let rows: [(&str, fn(&Summary) -> Option<f64>); 8] = [
        ("count", |s| Some(s.count as f64)),
        ("mean", |s| s.mean),
        ("std", |s| s.std),
        ("min", |s| s.min),
        ("25%", |s| s.q25),
        ("50%", |s| s.median),
        ("75%", |s| s.q75),
        ("max", |s| s.max),
    ];
    for (label, pick) in rows {
        let mut row = vec![Cell::from(label)];
        row.extend(summaries.iter().map(|s| Cell::float_or_empty(pick(s).map(round2))));
        table.push(row);
    }
    table
}

/// Max confirmed cases per country and year.
/// Years are those present in the data; absent combinations are empty cells.
pub fn pivot_table(title: &str, totals: &[DailyTotal]) -> Table {
    let years: BTreeSet<i32> = totals.iter().map(DailyTotal::year).collect();
    let mut max: BTreeMap<&str, BTreeMap<i32, i64>> = BTreeMap::new();
    for t in totals {
        let cell = max.entry(t.country.as_str()).or_default().entry(t.year()).or_insert(t.confirmed);
        *cell = (*cell).max(t.confirmed);
    }

    let mut table = Table::new(
        title,
        std::iter::once("country".to_string()).chain(years.iter().map(|y| y.to_string())),
    );
    for (country, by_year) in &max {
        let mut row = vec![Cell::from(*country)];
        row.extend(
            years
                .iter()
                .map(|y| by_year.get(y).map_or(Cell::Empty, |v| Cell::Int(*v))),
        );
        table.push(row);
    }
    table
}

/// Compare the peak confirmed cases of each year.
///
/// One column per year (0 when a country has no data that year), then the
/// percent change between consecutive years and, for three or more years,
/// between the first and last year.
pub fn wave_intensity_table(title: &str, totals: &[DailyTotal], years: &[i32]) -> Table {
    let mut peaks: BTreeMap<&str, BTreeMap<i32, i64>> = BTreeMap::new();
    for t in totals {
        let peak = peaks.entry(t.country.as_str()).or_default().entry(t.year()).or_insert(0);
        *peak = (*peak).max(t.confirmed);
    }

    let mut pairs: Vec<(i32, i32)> = years.windows(2).map(|w| (w[0], w[1])).collect();
    if years.len() > 2 {
        pairs.push((years[0], years[years.len() - 1]));
    }

    let columns = std::iter::once("country".to_string())
        .chain(years.iter().map(|y| y.to_string()))
        .chain(pairs.iter().map(|(a, b)| format!("{a}→{b} (%)")));
    let mut table = Table::new(title, columns);

    for (country, by_year) in &peaks {
        let peak = |year: i32| by_year.get(&year).copied().unwrap_or(0);
        let mut row = vec![Cell::from(*country)];
        row.extend(years.iter().map(|&y| Cell::Int(peak(y))));
        row.extend(
            pairs
                .iter()
                .map(|&(a, b)| Cell::float_or_empty(percent_change(peak(a), peak(b)))),
        );
        table.push(row);
    }
    table
}
