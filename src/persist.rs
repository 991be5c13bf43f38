// used for persistence
use rusqlite::{Connection, ToSql, params};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::debug;

use crate::datatype::{Datapoint, Frequency, QueryFilter};
use crate::error::Result;

/// Where datapoints live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    InMemory,
    File(String),
}

impl PersistenceMode {
    /// `:memory:` (or nothing) means in-memory, anything else is a file path.
    pub fn from_setting(database: &str) -> Self {
        match database.trim() {
            "" | ":memory:" => PersistenceMode::InMemory,
            path => PersistenceMode::File(path.to_string()),
        }
    }
}

/// Rows to remove; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub name: Option<String>,
    pub freq: Option<Frequency>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Criteria {
    pub fn is_unbounded(&self) -> bool {
        self.name.is_none() && self.freq.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }
}

// where clause assembled alongside its bound values
struct Conditions<'a> {
    clauses: Vec<String>,
    values: Vec<&'a dyn ToSql>,
}

impl<'a> Conditions<'a> {
    fn new() -> Self {
        Self { clauses: Vec::new(), values: Vec::new() }
    }
    fn push(&mut self, clause: &str, value: &'a dyn ToSql) {
        self.clauses.push(clause.to_string());
        self.values.push(value);
    }
    fn any_of(&mut self, column: &str, values: &'a [String]) {
        if values.is_empty() {
            return;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.clauses.push(format!("{column} in ({placeholders})"));
        self.values.extend(values.iter().map(|v| v as &dyn ToSql));
    }
    fn dates(&mut self, start_date: &'a Option<NaiveDate>, end_date: &'a Option<NaiveDate>) {
        if let Some(start_date) = start_date {
            self.push("date >= ?", start_date);
        }
        if let Some(end_date) = end_date {
            self.push("date <= ?", end_date);
        }
    }
    fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" where {}", self.clauses.join(" and "))
        }
    }
}

pub struct Persistor {
    connection: Connection,
}

impl Persistor {
    pub fn new(mode: &PersistenceMode) -> Result<Self> {
        let connection = match mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        connection.execute_batch(
            "
            create table if not exists Datapoint (
                name text not null,
                freq text not null,
                date text not null,
                value real not null,
                constraint unique_Datapoint unique (name, freq, date)
            );
            create index if not exists Datapoint_freq_date on Datapoint (freq, date);
            ",
        )?;
        Ok(Self { connection })
    }
    /// Inserts new datapoints and overwrites the value of existing ones, all or nothing.
    pub fn upsert(&mut self, datapoints: &[Datapoint]) -> Result<usize> {
        let transaction = self.connection.transaction()?;
        {
            let mut add_datapoint = transaction.prepare_cached(
                "
                insert into Datapoint (
                    name,
                    freq,
                    date,
                    value
                ) values (?, ?, ?, ?)
                on conflict (name, freq, date) do update set value = excluded.value
            ",
            )?;
            for datapoint in datapoints {
                add_datapoint.execute(params![
                    &datapoint.name,
                    &datapoint.freq,
                    &datapoint.date,
                    &datapoint.value
                ])?;
            }
        }
        transaction.commit()?;
        Ok(datapoints.len())
    }
    /// Datapoints matching `filter`, ascending by date. An empty name list selects every name.
    pub fn select(&self, filter: &QueryFilter) -> Result<Vec<Datapoint>> {
        let mut conditions = Conditions::new();
        conditions.push("freq = ?", &filter.frequency);
        conditions.any_of("name", &filter.names);
        conditions.dates(&filter.start_date, &filter.end_date);
        let sql = format!(
            "select name, freq, date, value from Datapoint{} order by date, name",
            conditions.sql()
        );
        debug!(%sql, "select datapoints");
        let mut statement = self.connection.prepare_cached(&sql)?;
        let rows = statement.query_map(conditions.values.as_slice(), |row| {
            Ok(Datapoint {
                name: row.get(0)?,
                freq: row.get(1)?,
                date: row.get(2)?,
                value: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
    pub fn delete(&mut self, criteria: &Criteria) -> Result<usize> {
        let mut conditions = Conditions::new();
        if let Some(name) = &criteria.name {
            conditions.push("name = ?", name);
        }
        if let Some(freq) = &criteria.freq {
            conditions.push("freq = ?", freq);
        }
        conditions.dates(&criteria.start_date, &criteria.end_date);
        let sql = format!("delete from Datapoint{}", conditions.sql());
        Ok(self.connection.execute(&sql, conditions.values.as_slice())?)
    }
    pub fn frequencies(&self) -> Result<BTreeSet<Frequency>> {
        let mut statement = self
            .connection
            .prepare_cached("select distinct freq from Datapoint")?;
        let rows = statement.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<BTreeSet<Frequency>>>()?)
    }
    /// Names at `freq`, or at any frequency when none is given.
    pub fn names(&self, freq: Option<Frequency>) -> Result<BTreeSet<String>> {
        let mut statement = self
            .connection
            .prepare_cached("select distinct name from Datapoint where ?1 is null or freq = ?1")?;
        let rows = statement.query_map(params![freq], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<BTreeSet<String>>>()?)
    }
    /// First and last date of a series, if it has any rows.
    pub fn date_range(&self, name: &str, freq: Frequency) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let mut statement = self.connection.prepare_cached(
            "
            select min(date), max(date)
                from Datapoint
                where name = ? and freq = ?
        ",
        )?;
        let (first, last): (Option<NaiveDate>, Option<NaiveDate>) =
            statement.query_row(params![name, freq], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(first.zip(last))
    }
}
