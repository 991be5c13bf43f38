use chrono::{Days, NaiveDate};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use macrodb::datatype::{Datapoint, Frequency};
use macrodb::decompose::CustomPath;
use macrodb::pivot::{pivot, render_csv};

fn daily_rows(names: &[String], days: u64) -> Vec<Datapoint> {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let mut rows = Vec::new();
    for day in 0..days {
        let date = start.checked_add_days(Days::new(day)).unwrap();
        for (i, name) in names.iter().enumerate() {
            // leave holes so the table has missing cells
            if (day as usize + i) % 7 == 0 {
                continue;
            }
            rows.push(Datapoint { name: name.clone(), freq: Frequency::Daily, date, value: day as f64 / 10.0 });
        }
    }
    rows
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let today = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    c.bench_function("decompose", |b| {
        b.iter(|| CustomPath::parse("oil", "BRENT", "m", black_box("eop/2015/2017/csv"), today))
    });
    c.bench_function("decompose with unit", |b| {
        b.iter(|| CustomPath::parse("ru", "EXPORT_GOODS", "m", black_box("csv/bln_rub/2015"), today))
    });
    let names: Vec<String> = (0..5).map(|i| format!("SERIES_{i}")).collect();
    for days in [100, 10_000] {
        let rows = daily_rows(&names, days);
        c.bench_function(&format!("pivot {days} days"), |b| b.iter(|| pivot(black_box(&rows), &names)));
        let table = pivot(&rows, &names);
        c.bench_function(&format!("render {days} days"), |b| b.iter(|| render_csv(black_box(&table))));
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
