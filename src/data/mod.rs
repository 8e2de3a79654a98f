//! Data layer: CSV loading, cleaning, filtering and the SQLite store.
//!
//! ```text
//!  MM-DD-YYYY.csv ──loader──▶ RawObservation ──cleaning──▶ Observation
//!                                                             │
//!                                   covid_data ◀──storage─────┤
//!                                                             ▼
//!                                         filter ──▶ DailyTotal (per country/date)
//! ```

pub mod cleaning;
pub mod filter;
pub mod loader;
mod models;
mod storage;

pub use filter::{daily_totals, Filter};
pub use models::{DailyTotal, Observation, RawObservation};
pub use storage::Storage;
