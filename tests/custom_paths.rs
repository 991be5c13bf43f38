use std::sync::Arc;

use chrono::NaiveDate;
use macrodb::database::Database;
use macrodb::datatype::{Datapoint, Frequency, today};
use macrodb::decompose::decompose;
use macrodb::interface::{FrameParams, QueryInterface, Rendered, SeriesParams};
use macrodb::persist::PersistenceMode;
use macrodb::{Error, QueryError};

fn setup() -> QueryInterface {
    let db = Database::new(PersistenceMode::InMemory).expect("db");
    let dp = |name: &str, freq: Frequency, date: &str, value: f64| Datapoint {
        name: name.into(),
        freq,
        date: date.parse().unwrap(),
        value,
    };
    db.upsert(&[
        dp("CPI_rog", Frequency::Quarterly, "2016-06-30", 101.2),
        dp("CPI_rog", Frequency::Quarterly, "2016-09-30", 100.7),
        dp("CPI_rog", Frequency::Quarterly, "2016-12-31", 101.3),
        dp("EXPORT_GOODS_bln_usd", Frequency::Quarterly, "2016-06-30", 67.9),
        dp("EXPORT_GOODS_bln_usd", Frequency::Quarterly, "2016-09-30", 70.9),
        dp("EXPORT_GOODS_bln_usd", Frequency::Quarterly, "2016-12-31", 82.6),
        dp("BRENT", Frequency::Daily, "2016-06-01", 48.81),
        dp("BRENT", Frequency::Daily, "2016-06-06", 48.94),
        dp("USDRUR_CB", Frequency::Daily, "2016-06-01", 65.9962),
        dp("USDRUR_CB", Frequency::Daily, "2016-06-04", 66.8529),
        dp("USDRUR_CB", Frequency::Daily, "2016-06-24", 64.3212),
    ])
    .expect("seed");
    QueryInterface::new(Arc::new(db))
}

fn query_error(e: Error) -> QueryError {
    match e {
        Error::Query(q) => q,
        other => panic!("expected a query error, got {other}"),
    }
}

#[test]
fn rate_path_decomposes_to_filter() {
    let filter = decompose("ru", "CPI", "m", "rog/2015/2017/csv").expect("decompose");
    assert_eq!(filter.name(), Some("CPI_rog"));
    assert_eq!(filter.frequency, Frequency::Monthly);
    assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2015, 1, 1));
    assert_eq!(filter.end_date, NaiveDate::from_ymd_opt(2017, 12, 31));
}

#[test]
fn empty_inner_path_ends_today() {
    let filter = decompose("ru", "BRENT", "d", "").expect("decompose");
    assert_eq!(filter.start_date, None);
    assert_eq!(filter.end_date.map(|d| d.to_string()), Some(today().to_string()));
}

#[test]
fn bad_frequency_wins_over_everything() {
    let err = decompose("oil", "BRENT", "z", "eop/rog/2015/2016/2017").unwrap_err();
    assert!(matches!(err, QueryError::InvalidFrequency { .. }));
}

#[test]
fn rate_with_aggregator_is_rejected() {
    let err = decompose("oil", "BRENT", "q", "rog/eop").unwrap_err();
    assert!(matches!(err, QueryError::ConflictingRateAndAggregation { .. }));
}

#[test]
fn custom_csv_for_one_year() {
    let iface = setup();
    let rendered = iface.custom("ru", "USDRUR_CB", "d", "2016").expect("custom");
    let Rendered::Csv(csv) = rendered else { panic!("expected csv") };
    assert!(csv.starts_with(",USDRUR_CB\n"));
    assert!(csv.contains("2016-06-24,64.3212\n"));
    assert!(csv.ends_with('\n'));
}

#[test]
fn custom_json_finalizer() {
    let iface = setup();
    let rendered = iface.custom("ru", "CPI", "q", "json/rog").expect("custom");
    let Rendered::Json(json) = rendered else { panic!("expected json") };
    let rows: Vec<serde_json::Value> = serde_json::from_str(&json).expect("json");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["name"], "CPI_rog");
    assert_eq!(rows[0]["freq"], "q");
    assert_eq!(rows[0]["date"], "2016-06-30");
}

#[test]
fn custom_unknown_name_is_invalid() {
    let iface = setup();
    let err = query_error(iface.custom("ru", "ZZZ", "d", "").unwrap_err());
    match err {
        QueryError::InvalidName { name, frequency, allowed } => {
            assert_eq!(name, "ZZZ");
            assert_eq!(frequency, "d");
            assert_eq!(allowed, vec!["BRENT".to_string(), "USDRUR_CB".to_string()]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn custom_reversed_years_end_before_start() {
    let iface = setup();
    let err = query_error(iface.custom("ru", "CPI", "q", "rog/2016/2015").unwrap_err());
    assert!(matches!(err, QueryError::EndBeforeStart { .. }));
}

#[test]
fn frame_matches_reference_csv() {
    let iface = setup();
    let params = FrameParams {
        freq: Some("q".into()),
        names: Some("CPI_rog,EXPORT_GOODS_bln_usd".into()),
        ..FrameParams::default()
    };
    assert_eq!(
        iface.frame(&params).expect("frame"),
        ",CPI_rog,EXPORT_GOODS_bln_usd\n2016-06-30,101.2,67.9\n2016-09-30,100.7,70.9\n2016-12-31,101.3,82.6\n"
    );
}

#[test]
fn frame_without_names_uses_every_series() {
    let iface = setup();
    let params = FrameParams {
        freq: Some("d".into()),
        start_date: Some("2016-06-01".into()),
        end_date: Some("2016-06-07".into()),
        ..FrameParams::default()
    };
    assert_eq!(
        iface.frame(&params).expect("frame"),
        ",BRENT,USDRUR_CB\n2016-06-01,48.81,65.9962\n2016-06-04,,66.8529\n2016-06-06,48.94,\n"
    );
}

#[test]
fn frame_reports_first_bad_name() {
    let iface = setup();
    let params = FrameParams {
        freq: Some("q".into()),
        names: Some("CPI_rog,AAA,BBB".into()),
        ..FrameParams::default()
    };
    let err = query_error(iface.frame(&params).unwrap_err());
    assert!(matches!(err, QueryError::InvalidName { ref name, .. } if name == "AAA"));
}

#[test]
fn series_parameters_are_checked() {
    let iface = setup();
    let missing = SeriesParams { freq: Some("d".into()), ..SeriesParams::default() };
    assert!(matches!(iface.series(&missing), Err(Error::MissingParameter("name"))));
    let bad_date = SeriesParams {
        name: Some("BRENT".into()),
        freq: Some("d".into()),
        start_date: Some("01.06.2016".into()),
        ..SeriesParams::default()
    };
    assert!(matches!(
        iface.series(&bad_date),
        Err(Error::Query(QueryError::InvalidDateFormat { .. }))
    ));
    let xlsx = SeriesParams {
        name: Some("BRENT".into()),
        freq: Some("d".into()),
        format: Some("xlsx".into()),
        ..SeriesParams::default()
    };
    assert!(matches!(iface.series(&xlsx), Err(Error::UnsupportedFormat { .. })));
    let future = SeriesParams {
        name: Some("BRENT".into()),
        freq: Some("d".into()),
        start_date: Some(today().succ_opt().unwrap().to_string()),
        ..SeriesParams::default()
    };
    assert!(matches!(
        iface.series(&future),
        Err(Error::Query(QueryError::FutureStartDate { .. }))
    ));
}

#[test]
fn info_reports_series_boundaries() {
    let iface = setup();
    let params = SeriesParams { name: Some("BRENT".into()), freq: Some("d".into()), ..SeriesParams::default() };
    let info = iface.info(&params).expect("info");
    assert_eq!(info.start_date.to_string(), "2016-06-01");
    assert_eq!(info.end_date.to_string(), "2016-06-06");
    let unknown = SeriesParams { name: Some("BRENT".into()), freq: Some("a".into()), ..SeriesParams::default() };
    assert!(matches!(iface.info(&unknown), Err(Error::NotFound(_))));
}
