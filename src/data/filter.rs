//! Year / month / country predicates over observations.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rusqlite::types::Value;

use super::models::{DailyTotal, Observation};
use crate::error::{CovidError, Result};

/// Row predicate; unset fields match everything and set fields intersect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub country: Option<String>,
}

impl Filter {
    /// Build a filter from form text. Blank fields stay unset.
    pub fn parse(year: &str, month: &str, country: &str) -> Result<Self> {
        let year = match year.trim() {
            "" => None,
            text => Some(text.parse::<i32>().map_err(|_| CovidError::InvalidFilter {
                field: "year",
                value: text.to_string(),
            })?),
        };

        let month = match month.trim() {
            "" => None,
            text => match text.parse::<u32>() {
                Ok(m) if (1..=12).contains(&m) => Some(m),
                _ => {
                    return Err(CovidError::InvalidFilter {
                        field: "month",
                        value: text.to_string(),
                    })
                }
            },
        };

        let country = match country.trim() {
            "" => None,
            text => Some(text.to_string()),
        };

        Ok(Filter {
            year,
            month,
            country,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.country.is_none()
    }

    pub fn matches(&self, row: &Observation) -> bool {
        self.year.map_or(true, |y| row.year() == y)
            && self.month.map_or(true, |m| row.month() == m)
            && self.country.as_ref().map_or(true, |c| &row.country == c)
    }

    /// Rows passing the filter, in input order
    pub fn apply(&self, rows: &[Observation]) -> Vec<Observation> {
        rows.iter().filter(|r| self.matches(r)).cloned().collect()
    }

    /// SQL condition equivalent to [`Filter::matches`] over `covid_data`.
    ///
    /// Dates are stored as ISO-8601 text, so year and month are compared
    /// through `strftime`.
    pub fn sql_condition(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(year) = self.year {
            clauses.push("CAST(strftime('%Y', date) AS INTEGER) = ?");
            params.push(Value::Integer(year as i64));
        }
        if let Some(month) = self.month {
            clauses.push("CAST(strftime('%m', date) AS INTEGER) = ?");
            params.push(Value::Integer(month as i64));
        }
        if let Some(country) = &self.country {
            clauses.push("country = ?");
            params.push(Value::Text(country.clone()));
        }

        if clauses.is_empty() {
            ("1 = 1".to_string(), params)
        } else {
            (clauses.join(" AND "), params)
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no filter");
        }
        let mut parts = Vec::new();
        if let Some(year) = self.year {
            parts.push(format!("year={year}"));
        }
        if let Some(month) = self.month {
            parts.push(format!("month={month}"));
        }
        if let Some(country) = &self.country {
            parts.push(format!("country={country}"));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Group rows by (country, date): counts are summed, coordinates averaged.
/// Groups come out ordered by country then date.
pub fn daily_totals(rows: &[Observation]) -> Vec<DailyTotal> {
    let mut groups: BTreeMap<(&str, NaiveDate), (DailyTotal, usize)> = BTreeMap::new();

    for row in rows {
        let (total, n) = groups
            .entry((row.country.as_str(), row.date))
            .or_insert_with(|| {
                (
                    DailyTotal {
                        country: row.country.clone(),
                        date: row.date,
                        confirmed: 0,
                        deaths: 0,
                        recovered: 0,
                        latitude: 0.0,
                        longitude: 0.0,
                    },
                    0,
                )
            });
        total.confirmed += row.confirmed;
        total.deaths += row.deaths;
        total.recovered += row.recovered;
        total.latitude += row.latitude;
        total.longitude += row.longitude;
        *n += 1;
    }

    groups
        .into_values()
        .map(|(mut total, n)| {
            total.latitude /= n as f64;
            total.longitude /= n as f64;
            total
        })
        .collect()
}
