// used for persistence
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

// used for the calendar dates every value is keyed on
use chrono::{NaiveDate, Utc};

use serde::{Deserialize, Serialize};

// used when parsing a frequency code
use std::str::FromStr;
// used to print out readable forms of a data type
use std::fmt;

use crate::error::QueryError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ------------- Frequency --------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "a")]
    Annual,
    #[serde(rename = "q")]
    Quarterly,
    #[serde(rename = "m")]
    Monthly,
    #[serde(rename = "w")]
    Weekly,
    #[serde(rename = "d")]
    Daily,
}

impl Frequency {
    pub const ALL: [Frequency; 5] = [
        Frequency::Annual,
        Frequency::Quarterly,
        Frequency::Monthly,
        Frequency::Weekly,
        Frequency::Daily,
    ];
    pub fn code(&self) -> &'static str {
        match self {
            Frequency::Annual => "a",
            Frequency::Quarterly => "q",
            Frequency::Monthly => "m",
            Frequency::Weekly => "w",
            Frequency::Daily => "d",
        }
    }
    pub fn codes() -> Vec<String> {
        Self::ALL.iter().map(|f| f.code().to_string()).collect()
    }
}

impl FromStr for Frequency {
    type Err = QueryError;
    // case-sensitive: "M" is not monthly
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|f| f.code() == s)
            .copied()
            .ok_or_else(|| QueryError::InvalidFrequency {
                value: s.to_string(),
                allowed: Self::codes(),
            })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_str()?;
        code.parse()
            .map_err(|e: QueryError| FromSqlError::Other(Box::new(e)))
    }
}

// ------------- Datapoint --------------
/// One value of a named series at a given frequency and date.
/// The store keeps at most one per (frequency, name, date).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Datapoint {
    pub name: String,
    pub freq: Frequency,
    pub date: NaiveDate,
    pub value: f64,
}

/// Datapoint as uploaded by clients, before its fields are checked.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingDatapoint {
    pub name: String,
    pub freq: String,
    pub date: String,
    pub value: f64,
}

impl TryFrom<IncomingDatapoint> for Datapoint {
    type Error = QueryError;
    fn try_from(incoming: IncomingDatapoint) -> Result<Self, Self::Error> {
        Ok(Datapoint {
            freq: incoming.freq.parse()?,
            date: parse_date(&incoming.date)?,
            name: incoming.name,
            value: incoming.value,
        })
    }
}

// ------------- QueryFilter --------------
/// Which series to read and over which dates. The date order is checked
/// by validation, not on construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFilter {
    pub names: Vec<String>,
    pub frequency: Frequency,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl QueryFilter {
    pub fn single(name: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            names: vec![name.into()],
            frequency,
            start_date: None,
            end_date: None,
        }
    }
    pub fn between(mut self, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }
    /// The first requested name, which is the whole request for single series queries.
    pub fn name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }
}

// ------------- Dates --------------
pub fn parse_date(value: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| QueryError::InvalidDateFormat {
        value: value.to_string(),
    })
}

pub fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, QueryError> {
    value.map(parse_date).transpose()
}

fn year_of(token: &str) -> Result<i32, QueryError> {
    token.parse().map_err(|_| QueryError::InvalidDateFormat {
        value: token.to_string(),
    })
}

pub fn year_start(token: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::from_ymd_opt(year_of(token)?, 1, 1).ok_or_else(|| QueryError::InvalidDateFormat {
        value: token.to_string(),
    })
}

pub fn year_end(token: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::from_ymd_opt(year_of(token)?, 12, 31).ok_or_else(|| QueryError::InvalidDateFormat {
        value: token.to_string(),
    })
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
