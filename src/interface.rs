//! Request handling independent of HTTP.
//!
//! [`QueryInterface`] turns loosely typed request parameters into validated
//! filters, reads the store and renders the result. Every operation is a
//! synchronous call against the shared [`Database`]; the server runs them on
//! blocking threads.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::database::Database;
use crate::datatype::{Datapoint, Frequency, IncomingDatapoint, QueryFilter, parse_optional_date, today};
use crate::decompose::{CustomPath, Finalizer};
use crate::error::{Error, QueryError, Result};
use crate::persist::Criteria;
use crate::pivot::{pivot, render_csv, render_json};
use crate::store::{NameCatalog, RowStore};
use crate::validate::validate;

const FORMATS: [&str; 2] = ["csv", "json"];

/// Query string of the single series endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesParams {
    pub name: Option<String>,
    pub freq: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub format: Option<String>,
}

/// Query string of the frame endpoint; `names` is comma separated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameParams {
    pub freq: Option<String>,
    pub names: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Encoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Csv(String),
    Json(String),
}

impl Rendered {
    pub fn body(&self) -> &str {
        match self {
            Rendered::Csv(body) | Rendered::Json(body) => body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesInfo {
    pub name: String,
    pub freq: Frequency,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

fn required<'a>(value: &'a Option<String>, parameter: &'static str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(Error::MissingParameter(parameter))
}

fn frequency(value: &Option<String>) -> Result<Frequency> {
    Ok(required(value, "freq")?.parse::<Frequency>()?)
}

fn single_column(filter: &QueryFilter) -> Vec<String> {
    filter.names.iter().take(1).cloned().collect()
}

pub struct QueryInterface {
    db: Arc<Database>,
}

impl QueryInterface {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Validated single series filter from query parameters.
    pub fn series_filter(&self, params: &SeriesParams) -> Result<QueryFilter> {
        let name = required(&params.name, "name")?;
        let freq = frequency(&params.freq)?;
        let filter = QueryFilter::single(name, freq).between(
            parse_optional_date(params.start_date.as_deref())?,
            parse_optional_date(params.end_date.as_deref())?,
        );
        validate(filter, &*self.db)
    }

    pub fn datapoints(&self, params: &SeriesParams) -> Result<Vec<Datapoint>> {
        let filter = self.series_filter(params)?;
        self.select(&filter)
    }

    /// One series as a one-column table, or as JSON when `format=json`.
    pub fn series(&self, params: &SeriesParams) -> Result<Rendered> {
        let format = params.format.as_deref().unwrap_or("csv");
        if !FORMATS.contains(&format) {
            return Err(Error::UnsupportedFormat {
                value: format.to_string(),
                allowed: FORMATS.iter().map(|f| f.to_string()).collect(),
            });
        }
        let filter = self.series_filter(params)?;
        let datapoints = self.select(&filter)?;
        match format {
            "json" => Ok(Rendered::Json(render_json(&datapoints)?)),
            _ => Ok(Rendered::Csv(render_csv(&pivot(&datapoints, &single_column(&filter)))?)),
        }
    }

    /// Several series side by side. Without `names` every series at the frequency is included.
    pub fn frame(&self, params: &FrameParams) -> Result<String> {
        let freq = frequency(&params.freq)?;
        let names: Vec<String> = params
            .names
            .as_deref()
            .map(|names| names.split(',').map(str::trim).filter(|n| !n.is_empty()).map(String::from).collect())
            .unwrap_or_default();
        let filter = QueryFilter { names, frequency: freq, start_date: None, end_date: None }.between(
            parse_optional_date(params.start_date.as_deref())?,
            parse_optional_date(params.end_date.as_deref())?,
        );
        let filter = validate(filter, &*self.db)?;
        let columns = if filter.names.is_empty() {
            self.db.names(freq)?.into_iter().collect()
        } else {
            filter.names.clone()
        };
        let datapoints = self.select(&filter)?;
        render_csv(&pivot(&datapoints, &columns))
    }

    /// Answers `{domain}/series/{varname}/{freq}/{inner_path}`.
    pub fn custom(&self, domain: &str, varname: &str, freq: &str, inner_path: &str) -> Result<Rendered> {
        let path = CustomPath::parse(domain, varname, freq, inner_path, today())?;
        debug!(?path, "decomposed custom path");
        let filter = validate(path.filter, &*self.db)?;
        let datapoints = self.select(&filter)?;
        match path.finalizer.unwrap_or_default() {
            Finalizer::Json => Ok(Rendered::Json(render_json(&datapoints)?)),
            Finalizer::Csv => Ok(Rendered::Csv(render_csv(&pivot(&datapoints, &single_column(&filter)))?)),
        }
    }

    pub fn frequencies(&self) -> Result<Vec<Frequency>> {
        Ok(self.db.frequencies()?.into_iter().collect())
    }

    /// Names at `freq`, or all names when no frequency is given.
    pub fn names(&self, freq: Option<&str>) -> Result<Vec<String>> {
        let names = match freq {
            Some(freq) => self.db.names(freq.parse::<Frequency>()?)?,
            None => self.db.all_names()?,
        };
        Ok(names.into_iter().collect())
    }

    /// First and last date of one series.
    pub fn info(&self, params: &SeriesParams) -> Result<SeriesInfo> {
        let name = required(&params.name, "name")?;
        let freq = frequency(&params.freq)?;
        let (start_date, end_date) = self
            .db
            .date_range(name, freq)?
            .ok_or_else(|| Error::NotFound(format!("no datapoints for <{name}> at <{freq}> frequency")))?;
        Ok(SeriesInfo { name: name.to_string(), freq, start_date, end_date })
    }

    /// Checks every incoming datapoint, then writes them all in one transaction.
    pub fn upload(&self, incoming: Vec<IncomingDatapoint>) -> Result<usize> {
        let datapoints = incoming
            .into_iter()
            .map(Datapoint::try_from)
            .collect::<std::result::Result<Vec<_>, QueryError>>()?;
        let count = self.db.upsert(&datapoints)?;
        info!(count, "datapoints upserted");
        Ok(count)
    }

    /// Removes matching datapoints; at least one criterion is required.
    pub fn delete(&self, params: &SeriesParams) -> Result<usize> {
        let criteria = Criteria {
            name: params.name.clone().filter(|n| !n.is_empty()),
            freq: params.freq.as_deref().map(str::parse::<Frequency>).transpose()?,
            start_date: parse_optional_date(params.start_date.as_deref())?,
            end_date: parse_optional_date(params.end_date.as_deref())?,
        };
        if criteria.is_unbounded() {
            return Err(Error::MissingParameter("name, freq, start_date or end_date"));
        }
        let count = self.db.delete(&criteria)?;
        info!(count, ?criteria, "datapoints deleted");
        Ok(count)
    }

    fn select(&self, filter: &QueryFilter) -> Result<Vec<Datapoint>> {
        let started = Instant::now();
        let datapoints = self.db.select(filter)?;
        debug!(rows = datapoints.len(), ms = started.elapsed().as_secs_f64() * 1000.0, "selected");
        Ok(datapoints)
    }
}
