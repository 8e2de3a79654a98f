//! Data behind each chart, independent of any drawing backend.

use std::collections::{BTreeMap, BTreeSet};

use crate::data::DailyTotal;

/// Names of the correlated counts, in matrix order
pub const COUNT_LABELS: [&str; 3] = ["confirmed", "deaths", "recovered"];

/// Pearson correlation between confirmed, deaths and recovered.
///
/// A pair involving a constant series has no correlation (`None`).
pub fn correlation_matrix(totals: &[DailyTotal]) -> [[Option<f64>; 3]; 3] {
    let columns: [Vec<f64>; 3] = [
        totals.iter().map(|t| t.confirmed as f64).collect(),
        totals.iter().map(|t| t.deaths as f64).collect(),
        totals.iter().map(|t| t.recovered as f64).collect(),
    ];

    let mut matrix = [[None; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = pearson(&columns[i], &columns[j]);
        }
    }
    matrix
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 || n != ys.len() {
        return None;
    }
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x * var_y).sqrt())
}

/// Largest confirmed count per country, largest first
pub fn country_totals(totals: &[DailyTotal]) -> Vec<(String, i64)> {
    let mut peaks: BTreeMap<&str, i64> = BTreeMap::new();
    for t in totals {
        let peak = peaks.entry(t.country.as_str()).or_insert(t.confirmed);
        *peak = (*peak).max(t.confirmed);
    }
    let mut ranked: Vec<(String, i64)> = peaks
        .into_iter()
        .map(|(country, confirmed)| (country.to_string(), confirmed))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Monthly confirmed peaks per country on a shared month axis
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trend {
    /// `YYYY-MM` keys in ascending order
    pub months: Vec<String>,
    /// Per country: (index into `months`, max confirmed that month)
    pub series: Vec<(String, Vec<(usize, i64)>)>,
}

impl Trend {
    pub fn max_value(&self) -> i64 {
        self.series
            .iter()
            .flat_map(|(_, points)| points.iter().map(|&(_, v)| v))
            .max()
            .unwrap_or(0)
    }
}

pub fn monthly_trend(totals: &[DailyTotal]) -> Trend {
    let months: Vec<String> = totals
        .iter()
        .map(DailyTotal::month_key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut peaks: BTreeMap<&str, BTreeMap<usize, i64>> = BTreeMap::new();
    for t in totals {
        let key = t.month_key();
        let Ok(idx) = months.binary_search(&key) else {
            continue;
        };
        let peak = peaks
            .entry(t.country.as_str())
            .or_default()
            .entry(idx)
            .or_insert(t.confirmed);
        *peak = (*peak).max(t.confirmed);
    }

    Trend {
        months,
        series: peaks
            .into_iter()
            .map(|(country, points)| (country.to_string(), points.into_iter().collect()))
            .collect(),
    }
}

/// Confirmed counts grouped by calendar month (1-12), months without data omitted
pub fn month_distribution(totals: &[DailyTotal]) -> BTreeMap<u32, Vec<i64>> {
    let mut groups: BTreeMap<u32, Vec<i64>> = BTreeMap::new();
    for t in totals {
        groups.entry(t.month()).or_default().push(t.confirmed);
    }
    groups
}

/// (country, max confirmed, max deaths), countries in alphabetical order
pub fn deaths_vs_cases(totals: &[DailyTotal]) -> Vec<(String, i64, i64)> {
    let mut peaks: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
    for t in totals {
        let peak = peaks
            .entry(t.country.as_str())
            .or_insert((t.confirmed, t.deaths));
        peak.0 = peak.0.max(t.confirmed);
        peak.1 = peak.1.max(t.deaths);
    }
    peaks
        .into_iter()
        .map(|(country, (confirmed, deaths))| (country.to_string(), confirmed, deaths))
        .collect()
}
