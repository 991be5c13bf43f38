//! Macrodb – macroeconomic time series over HTTP.
//!
//! Every value is a [`datatype::Datapoint`]: one number per series name,
//! frequency and date. Series can be queried two ways:
//! * the conventional API, `api/series?name=CPI_rog&freq=m&start_date=2015-01-01`;
//! * custom paths, `ru/series/CPI/m/rog/2015/2017/csv`, where the segments
//!   after the frequency may come in any order.
//!
//! ## Modules
//! * [`token`] – Splitting custom paths and classifying their tokens.
//! * [`decompose`] – Assembling a [`datatype::QueryFilter`] from a custom path.
//! * [`validate`] – Checking filters against a [`store::NameCatalog`] and the calendar.
//! * [`pivot`] – Spreading rows over a fixed set of columns and encoding them as CSV.
//! * [`persist`] / [`database`] – SQLite storage behind the [`store`] traits.
//! * [`interface`] – Request handling independent of HTTP.
//! * [`server`] – The axum router.
//!
//! ## Quick Start
//! ```
//! use macrodb::decompose::CustomPath;
//! use chrono::NaiveDate;
//! let today = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
//! let path = CustomPath::parse("ru", "CPI", "m", "rog/2015/2017/csv", today).unwrap();
//! assert_eq!(path.filter.name(), Some("CPI_rog"));
//! assert_eq!(path.filter.start_date, NaiveDate::from_ymd_opt(2015, 1, 1));
//! assert_eq!(path.filter.end_date, NaiveDate::from_ymd_opt(2017, 12, 31));
//! ```

pub mod config;
pub mod database;
pub mod datatype;
pub mod decompose;
pub mod error;
pub mod interface;
pub mod persist;
pub mod pivot;
pub mod server;
pub mod store;
pub mod token;
pub mod validate;

pub use error::{Error, QueryError, Result};
