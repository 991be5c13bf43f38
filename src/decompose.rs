//! Decomposition of custom series paths.
//!
//! ```text
//! {domain}/series/{varname}/{freq}[/{unit-or-rate}][/{start}][/{end}][/{finalizer}]
//! ```
//!
//! For example `oil/series/BRENT/m/eop/2015/2017/csv` or
//! `ru/series/EXPORT_GOODS/m/bln_rub`. Everything after `{freq}` is the
//! inner path; its segments may come in any order and are told apart by the
//! vocabulary they belong to. `{domain}` is carried along but not interpreted.

use chrono::NaiveDate;
use serde::Serialize;

use crate::datatype::{Frequency, QueryFilter, today, year_end, year_start};
use crate::error::QueryError;
use crate::token::{Vocabulary, extract_one, extract_years, residual, tokenize};

pub const FINALIZERS: Vocabulary = Vocabulary { field: "finalizer", words: &["csv", "json"] };
pub const RATES: Vocabulary = Vocabulary { field: "rate", words: &["rog", "yoy", "base"] };
pub const AGGREGATORS: Vocabulary = Vocabulary { field: "aggregator", words: &["eop", "avg"] };

/// Output encoding selected by the finalizer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Finalizer {
    #[default]
    Csv,
    Json,
}

impl Finalizer {
    fn from_token(token: &str) -> Self {
        match token {
            "json" => Finalizer::Json,
            _ => Finalizer::Csv,
        }
    }
}

/// Every piece recognised in a custom path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomPath {
    pub domain: String,
    pub varname: String,
    pub unit: Option<String>,
    pub rate: Option<String>,
    pub aggregator: Option<String>,
    pub finalizer: Option<Finalizer>,
    pub filter: QueryFilter,
}

impl CustomPath {
    /// Reads `inner_path` apart, bounding an open end year by `today`.
    pub fn parse(
        domain: &str,
        varname: &str,
        freq: &str,
        inner_path: &str,
        today: NaiveDate,
    ) -> Result<Self, QueryError> {
        let frequency: Frequency = freq.parse()?;
        let tokens = tokenize(inner_path);
        let ((start_year, end_year), tokens) = extract_years(&tokens)?;
        // finalizer, rate, aggregator: each scan only sees what the previous one left
        let (finalizer, tokens) = extract_one(&tokens, &FINALIZERS)?;
        let (rate, tokens) = extract_one(&tokens, &RATES)?;
        let (aggregator, tokens) = extract_one(&tokens, &AGGREGATORS)?;
        if let (Some(rate), Some(aggregator)) = (&rate, &aggregator) {
            return Err(QueryError::ConflictingRateAndAggregation {
                rate: rate.clone(),
                aggregator: aggregator.clone(),
            });
        }
        let unit = residual(&tokens)?.or_else(|| rate.clone());
        let name = match &unit {
            Some(unit) => format!("{varname}_{unit}"),
            None => varname.to_string(),
        };
        let start_date = start_year.as_deref().map(year_start).transpose()?;
        let end_date = match end_year.as_deref() {
            Some(year) => year_end(year)?,
            None => today,
        };
        Ok(CustomPath {
            domain: domain.to_string(),
            varname: varname.to_string(),
            unit,
            rate,
            aggregator,
            finalizer: finalizer.as_deref().map(Finalizer::from_token),
            filter: QueryFilter::single(name, frequency).between(start_date, Some(end_date)),
        })
    }
}

/// Turns a custom path into the filter it denotes, with an open end bounded by the current date.
pub fn decompose(
    domain: &str,
    varname: &str,
    freq: &str,
    inner_path: &str,
) -> Result<QueryFilter, QueryError> {
    CustomPath::parse(domain, varname, freq, inner_path, today()).map(|path| path.filter)
}
