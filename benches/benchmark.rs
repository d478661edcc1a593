use chrono::TimeZone;
use chrono_tz::US::Pacific;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use meetsched::parser::{PatternParser, TemporalNormalizer};

fn bench_pattern_grammar(c: &mut Criterion) {
    c.bench_function("pattern_match_grammar", |b| {
        b.iter(|| PatternParser::match_grammar(black_box("Set a sync call with Sarah tomorrow at 5pm for 45 minutes")))
    });
}

fn bench_normalizer(c: &mut Criterion) {
    let normalizer = TemporalNormalizer::new(Pacific);
    let now = Pacific.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();

    let mut group = c.benchmark_group("normalize");
    for phrase in ["2026-10-20T17:00:00-07:00", "tomorrow at 5pm", "next Tuesday at 9:30am", "5th of March at noon PST"] {
        group.bench_function(phrase, |b| b.iter(|| normalizer.normalize(black_box(phrase), now)));
    }
    group.finish();
}

criterion_group!(benches, bench_pattern_grammar, bench_normalizer);
criterion_main!(benches);
