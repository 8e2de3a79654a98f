//! Per-country case statistics by country, month, year and date range.
//!
//! Counts in the reports are cumulative, so "the total" of a period is the
//! largest daily total seen in it.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::table::Table;
use crate::data::DailyTotal;
use crate::error::{CovidError, Result};

/// Cumulative counts for one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub confirmed: i64,
    pub deaths: i64,
    pub recovered: i64,
}

impl Counts {
    fn of(total: &DailyTotal) -> Self {
        Counts {
            confirmed: total.confirmed,
            deaths: total.deaths,
            recovered: total.recovered,
        }
    }

    fn max(self, other: Counts) -> Self {
        Counts {
            confirmed: self.confirmed.max(other.confirmed),
            deaths: self.deaths.max(other.deaths),
            recovered: self.recovered.max(other.recovered),
        }
    }
}

impl std::ops::Sub for Counts {
    type Output = Counts;

    fn sub(self, rhs: Counts) -> Counts {
        Counts {
            confirmed: self.confirmed - rhs.confirmed,
            deaths: self.deaths - rhs.deaths,
            recovered: self.recovered - rhs.recovered,
        }
    }
}

/// Column names shared with the database schema
pub const COUNT_COLUMNS: [&str; 3] = ["confirmed_cases", "deaths_cases", "recovered_cases"];

/// Max of each count per group key, keys in ascending order
fn max_by_key<K: Ord>(totals: &[DailyTotal], key: impl Fn(&DailyTotal) -> K) -> BTreeMap<K, Counts> {
    let mut groups: BTreeMap<K, Counts> = BTreeMap::new();
    for total in totals {
        let counts = Counts::of(total);
        groups
            .entry(key(total))
            .and_modify(|c| *c = c.max(counts))
            .or_insert(counts);
    }
    groups
}

/// Final cumulative counts per country
pub fn by_country(totals: &[DailyTotal]) -> BTreeMap<String, Counts> {
    max_by_key(totals, |t| t.country.clone())
}

/// Cumulative counts per (country, `YYYY-MM`)
pub fn by_month(totals: &[DailyTotal]) -> BTreeMap<(String, String), Counts> {
    max_by_key(totals, |t| (t.country.clone(), t.month_key()))
}

/// Cumulative counts per (country, year)
pub fn by_year(totals: &[DailyTotal]) -> BTreeMap<(String, i32), Counts> {
    max_by_key(totals, |t| (t.country.clone(), t.year()))
}

/// Change of the counts between two report dates, per country.
///
/// Only countries reported on both dates appear in the result.
pub fn by_date_range(
    totals: &[DailyTotal],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BTreeMap<String, Counts>> {
    if end <= start {
        return Err(CovidError::InvalidDateRange { start, end });
    }

    let on = |date: NaiveDate| -> BTreeMap<&str, Counts> {
        totals
            .iter()
            .filter(|t| t.date == date)
            .map(|t| (t.country.as_str(), Counts::of(t)))
            .collect()
    };
    let at_start = on(start);
    let at_end = on(end);

    Ok(at_end
        .into_iter()
        .filter_map(|(country, end_counts)| {
            at_start
                .get(country)
                .map(|start_counts| (country.to_string(), end_counts - *start_counts))
        })
        .collect())
}

/// Parse a `YYYY-MM-DD` date typed by the user
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| CovidError::InvalidDate(text.trim().to_string()))
}

pub fn country_table(title: &str, stats: &BTreeMap<String, Counts>) -> Table {
    let mut table = Table::new(title, ["country"].into_iter().chain(COUNT_COLUMNS));
    for (country, c) in stats {
        table.push(vec![
            country.as_str().into(),
            c.confirmed.into(),
            c.deaths.into(),
            c.recovered.into(),
        ]);
    }
    table
}

pub fn month_table(title: &str, stats: &BTreeMap<(String, String), Counts>) -> Table {
    let mut table = Table::new(title, ["country", "month_year"].into_iter().chain(COUNT_COLUMNS));
    for ((country, month), c) in stats {
        table.push(vec![
            country.as_str().into(),
            month.as_str().into(),
            c.confirmed.into(),
            c.deaths.into(),
            c.recovered.into(),
        ]);
    }
    table
}

pub fn year_table(title: &str, stats: &BTreeMap<(String, i32), Counts>) -> Table {
    let mut table = Table::new(title, ["country", "year"].into_iter().chain(COUNT_COLUMNS));
    for ((country, year), c) in stats {
        table.push(vec![
            country.as_str().into(),
            (*year).into(),
            c.confirmed.into(),
            c.deaths.into(),
            c.recovered.into(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(country: &str, date: (i32, u32, u32), counts: (i64, i64, i64)) -> DailyTotal {
        DailyTotal {
            country: country.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            confirmed: counts.0,
            deaths: counts.1,
            recovered: counts.2,
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    fn sample() -> Vec<DailyTotal> {
        vec![
            total("Italy", (2021, 1, 1), (100, 10, 50)),
            total("Italy", (2021, 1, 31), (150, 12, 80)),
            total("Italy", (2021, 2, 1), (160, 13, 70)),
            total("Italy", (2022, 1, 1), (400, 20, 300)),
            total("Egypt", (2021, 1, 1), (10, 1, 5)),
            total("Egypt", (2021, 2, 1), (30, 2, 9)),
        ]
    }

    #[test]
    fn test_by_country_takes_max_per_count() {
        let stats = by_country(&sample());
        assert_eq!(stats.len(), 2);
        assert_eq!(
            stats["Italy"],
            Counts { confirmed: 400, deaths: 20, recovered: 300 }
        );
        assert_eq!(stats["Egypt"], Counts { confirmed: 30, deaths: 2, recovered: 9 });
        // Countries in alphabetical order
        assert_eq!(stats.keys().next().map(String::as_str), Some("Egypt"));
    }

    #[test]
    fn test_by_month() {
        let stats = by_month(&sample());
        let jan = &stats[&("Italy".to_string(), "2021-01".to_string())];
        assert_eq!(jan.confirmed, 150);
        assert_eq!(jan.recovered, 80);
        let feb = &stats[&("Italy".to_string(), "2021-02".to_string())];
        assert_eq!(feb.recovered, 70);
        assert_eq!(stats.len(), 5);
    }

    #[test]
    fn test_by_year() {
        let stats = by_year(&sample());
        assert_eq!(stats[&("Italy".to_string(), 2021)].confirmed, 160);
        assert_eq!(stats[&("Italy".to_string(), 2022)].confirmed, 400);
        assert_eq!(stats[&("Egypt".to_string(), 2021)].deaths, 2);
    }

    #[test]
    fn test_by_date_range_is_end_minus_start() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2021, 2, 1).unwrap();
        let stats = by_date_range(&sample(), start, end).unwrap();

        assert_eq!(stats["Italy"], Counts { confirmed: 60, deaths: 3, recovered: 20 });
        assert_eq!(stats["Egypt"], Counts { confirmed: 20, deaths: 1, recovered: 4 });
    }

    #[test]
    fn test_by_date_range_skips_countries_missing_a_date() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 31).unwrap();
        let end = NaiveDate::from_ymd_opt(2021, 2, 1).unwrap();
        let stats = by_date_range(&sample(), start, end).unwrap();
        assert_eq!(stats.len(), 1);
        assert!(stats.contains_key("Italy"));
    }

    #[test]
    fn test_by_date_range_rejects_inverted_range() {
        let day = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert!(matches!(
            by_date_range(&sample(), day, day),
            Err(CovidError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(" 2021-03-04 ").unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()
        );
        assert!(matches!(parse_date("04/03/2021"), Err(CovidError::InvalidDate(_))));
    }

    #[test]
    fn test_tables_have_expected_columns() {
        let totals = sample();
        let table = country_table("Stats by Country", &by_country(&totals));
        assert_eq!(
            table.columns,
            vec!["country", "confirmed_cases", "deaths_cases", "recovered_cases"]
        );
        assert_eq!(table.len(), 2);

        let table = month_table("Monthly", &by_month(&totals));
        assert_eq!(table.columns[1], "month_year");

        let table = year_table("Yearly", &by_year(&totals));
        assert_eq!(table.columns[1], "year");
        assert_eq!(table.len(), 3);
    }
}
