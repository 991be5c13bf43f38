//! Token scanning for custom paths.
//!
//! Path segments are positionally loose but each belongs to a small closed
//! vocabulary, so classification is done by membership scans. Every scan is
//! a pure function returning what it found together with the tokens left
//! over, so the order of extraction is visible at the call site.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::QueryError;

lazy_static! {
    static ref YEAR: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

/// A closed set of reserved words, labelled for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary {
    pub field: &'static str,
    pub words: &'static [&'static str],
}

impl Vocabulary {
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(&token)
    }
}

/// Start and end year tokens, in the order they appeared.
pub type YearTokens = (Option<String>, Option<String>);

/// Splits on '/', trims each piece and drops the empty ones.
pub fn tokenize(path: &str) -> Vec<String> {
    path.split('/')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

/// Pulls out the all-digit tokens. The first one seen is the start year and
/// the second the end year; they are never reordered numerically.
pub fn extract_years(tokens: &[String]) -> Result<(YearTokens, Vec<String>), QueryError> {
    let (years, rest): (Vec<String>, Vec<String>) =
        tokens.iter().cloned().partition(|token| YEAR.is_match(token));
    let mut years = years.into_iter();
    match years.len() {
        0..=2 => Ok(((years.next(), years.next()), rest)),
        _ => Err(QueryError::AmbiguousToken {
            field: "year",
            found: years.collect(),
        }),
    }
}

/// Pulls out the single token belonging to `vocabulary`, if any.
/// Two or more matches, repeated words included, are ambiguous.
pub fn extract_one(
    tokens: &[String],
    vocabulary: &Vocabulary,
) -> Result<(Option<String>, Vec<String>), QueryError> {
    let (mut found, rest): (Vec<String>, Vec<String>) =
        tokens.iter().cloned().partition(|token| vocabulary.contains(token));
    match found.len() {
        0 | 1 => Ok((found.pop(), rest)),
        _ => Err(QueryError::AmbiguousToken {
            field: vocabulary.field,
            found,
        }),
    }
}

/// What remains after classification is a literal unit suffix; at most one is allowed.
pub fn residual(tokens: &[String]) -> Result<Option<String>, QueryError> {
    match tokens {
        [] => Ok(None),
        [unit] => Ok(Some(unit.clone())),
        _ => Err(QueryError::AmbiguousToken {
            field: "unit",
            found: tokens.to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUTS: Vocabulary = Vocabulary { field: "finalizer", words: &["csv", "json"] };
    const AGGREGATES: Vocabulary = Vocabulary { field: "aggregator", words: &["eop", "avg"] };

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tokenize_drops_blank_segments() {
        assert_eq!(tokenize("eop/ 2015 //2017/csv/"), tokens(&["eop", "2015", "2017", "csv"]));
        assert!(tokenize("").is_empty());
        assert!(tokenize("/ /").is_empty());
    }

    #[test]
    fn no_years() {
        let ((start, end), rest) = extract_years(&[]).unwrap();
        assert_eq!((start, end), (None, None));
        assert!(rest.is_empty());
    }

    #[test]
    fn one_year_is_a_start() {
        let (years, rest) = extract_years(&tokens(&["eop", "2000", "csv"])).unwrap();
        assert_eq!(years, (Some("2000".into()), None));
        assert_eq!(rest, tokens(&["eop", "csv"]));
    }

    #[test]
    fn two_years_keep_their_order() {
        let (years, _) = extract_years(&tokens(&["2005", "2007"])).unwrap();
        assert_eq!(years, (Some("2005".into()), Some("2007".into())));
        let (years, _) = extract_years(&tokens(&["2010", "avg", "1970"])).unwrap();
        assert_eq!(years, (Some("2010".into()), Some("1970".into())));
    }

    #[test]
    fn three_years_are_ambiguous() {
        let err = extract_years(&tokens(&["2001", "2002", "2003"])).unwrap_err();
        assert_eq!(
            err,
            QueryError::AmbiguousToken { field: "year", found: tokens(&["2001", "2002", "2003"]) }
        );
    }

    #[test]
    fn extract_one_removes_the_match() {
        let (found, rest) = extract_one(&tokens(&["eop", "2000", "csv"]), &OUTPUTS).unwrap();
        assert_eq!(found.as_deref(), Some("csv"));
        assert_eq!(rest, tokens(&["eop", "2000"]));
    }

    #[test]
    fn extract_one_without_match_leaves_tokens() {
        let (found, rest) = extract_one(&tokens(&["bln_rub"]), &OUTPUTS).unwrap();
        assert!(found.is_none());
        assert_eq!(rest, tokens(&["bln_rub"]));
    }

    #[test]
    fn extract_one_rejects_two_matches() {
        let err = extract_one(&tokens(&["eop", "avg"]), &AGGREGATES).unwrap_err();
        assert_eq!(
            err,
            QueryError::AmbiguousToken { field: "aggregator", found: tokens(&["eop", "avg"]) }
        );
        assert!(extract_one(&tokens(&["csv", "csv"]), &OUTPUTS).is_err());
    }

    #[test]
    fn residual_allows_one_unit() {
        assert_eq!(residual(&[]).unwrap(), None);
        assert_eq!(residual(&tokens(&["bln_rub"])).unwrap().as_deref(), Some("bln_rub"));
        assert!(matches!(
            residual(&tokens(&["bln_rub", "tkm"])),
            Err(QueryError::AmbiguousToken { field: "unit", .. })
        ));
    }
}
