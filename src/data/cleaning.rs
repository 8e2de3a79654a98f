//! Missing-value handling applied before rows are persisted.

use super::models::{CleanReport, Observation, RawObservation, UNKNOWN_PROVINCE};

/// Impute every missing value and sort rows by country then date.
///
/// Provinces default to `"Unknown"`, counts and coordinates to zero. The sort
/// is stable, so rows of the same country and date keep their input order.
pub fn clean(raw: Vec<RawObservation>) -> (Vec<Observation>, CleanReport) {
    let mut report = CleanReport {
        rows: raw.len(),
        ..CleanReport::default()
    };

    let mut rows: Vec<Observation> = raw
        .into_iter()
        .map(|row| Observation {
            province: impute(
                row.province,
                UNKNOWN_PROVINCE.to_string(),
                &mut report.provinces_imputed,
            ),
            confirmed: impute(row.confirmed, 0, &mut report.counts_imputed),
            deaths: impute(row.deaths, 0, &mut report.counts_imputed),
            recovered: impute(row.recovered, 0, &mut report.counts_imputed),
            latitude: impute(row.latitude, 0.0, &mut report.coordinates_imputed),
            longitude: impute(row.longitude, 0.0, &mut report.coordinates_imputed),
            country: row.country,
            date: row.date,
        })
        .collect();

    rows.sort_by(|a, b| a.country.cmp(&b.country).then(a.date.cmp(&b.date)));

    log::info!(
        "Cleaned {} rows ({} values imputed)",
        report.rows,
        report.total_imputed()
    );
    (rows, report)
}

fn impute<T>(value: Option<T>, default: T, imputed: &mut usize) -> T {
    value.unwrap_or_else(|| {
        *imputed += 1;
        default
    })
}
