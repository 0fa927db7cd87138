use criterion::{criterion_group, criterion_main, Criterion};
use geomag::{aggregate, extract::dst::parse_dst_text, Baseline, Duration, Point, PointSeries, Resampler};
use rand::Rng;

fn minute_series(days: i64) -> PointSeries {
    let mut rng = rand::thread_rng();

    (0..Duration::days(days))
        .step_by(Duration::minutes(1) as usize)
        .map(|t| Point::new(t, 20_000.0 + rng.gen_range(-5.0..5.0)))
        .collect()
}

fn resample(c: &mut Criterion) {
    let series = minute_series(30);

    c.bench_function("aggregate (30d, 1h)", |b| {
        b.iter(|| aggregate(&series, Duration::hours(1)));
    });

    c.bench_function("resample (30d)", |b| {
        b.iter(|| Resampler::new().run(&series, 0, Duration::days(30)));
    });
}

fn baseline(c: &mut Criterion) {
    let series = minute_series(7);

    c.bench_function("baseline (7d, 1m buckets)", |b| {
        b.iter(|| {
            Baseline::builder()
                .bucket_size_ms(Duration::minutes(1))
                .build(&series)
        });
    });
}

fn dst(c: &mut Criterion) {
    let mut text = String::from("DST INDEX 2411\n");

    for day in 1..=30 {
        let values = (0..24).map(|h| format!("{:4}", -(h % 7) * 3)).collect::<String>();
        text.push_str(&format!("DST2411*{day:02}RRX020   0{values} -10\n"));
    }

    let now = Duration::weeks(2_900);

    c.bench_function("parse Dst month", |b| {
        b.iter(|| parse_dst_text(&text, now));
    });
}

criterion_group!(benches, resample, baseline, dst);
criterion_main!(benches);
