//! Validation of query filters against the catalog and the calendar.
//!
//! Checks run in a fixed order and the first failure is returned; a request
//! naming several unknown series hears about the first one only.

use chrono::NaiveDate;

use crate::datatype::{QueryFilter, today};
use crate::error::{QueryError, Result};
use crate::store::NameCatalog;

pub fn validate<C: NameCatalog + ?Sized>(filter: QueryFilter, catalog: &C) -> Result<QueryFilter> {
    validate_on(filter, catalog, today())
}

/// Same as [`validate`] with an explicit current date.
pub fn validate_on<C: NameCatalog + ?Sized>(
    filter: QueryFilter,
    catalog: &C,
    today: NaiveDate,
) -> Result<QueryFilter> {
    let frequencies = catalog.frequencies()?;
    if !frequencies.contains(&filter.frequency) {
        return Err(QueryError::InvalidFrequency {
            value: filter.frequency.to_string(),
            allowed: frequencies.iter().map(|f| f.to_string()).collect(),
        }
        .into());
    }
    for name in &filter.names {
        let allowed = catalog.names(filter.frequency)?;
        if !allowed.contains(name) {
            return Err(QueryError::InvalidName {
                name: name.clone(),
                frequency: filter.frequency.to_string(),
                allowed: allowed.into_iter().collect(),
            }
            .into());
        }
    }
    if let Some(start_date) = filter.start_date {
        if start_date > today {
            return Err(QueryError::FutureStartDate { start_date, current_date: today }.into());
        }
    }
    if let (Some(start_date), Some(end_date)) = (filter.start_date, filter.end_date) {
        if end_date < start_date {
            return Err(QueryError::EndBeforeStart { start_date, end_date }.into());
        }
    }
    Ok(filter)
}
