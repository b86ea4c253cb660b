use std::hint::black_box;

use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use time_intent::IntentParser;

fn bench_parse(c: &mut Criterion) {
    let parser = IntentParser::new();
    let now = Utc.with_ymd_and_hms(2025, 6, 18, 14, 30, 0).unwrap();

    let mut group = c.benchmark_group("parse");
    for (name, text) in [
        ("relative", "next 2 weeks"),
        ("month_range", "Jun–Sep"),
        ("week_of", "week of May 12"),
        ("date_range", "from June 3 to June 9"),
        ("month_names", "may or june"),
        ("not_understood", "whenever it is warm enough"),
    ] {
        group.bench_function(name, |b| b.iter(|| parser.parse(black_box(text), now)));
    }
    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
