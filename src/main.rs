use geomag::{
    extract::datamin::DataMinFile, time::start_of_day, Baseline, ChartPayload, Duration,
    GapInjector, Point, PointSeries, Resampler, Value,
};
use std::time::Instant;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// One week of minute data around 20000 nT, with a daily swing,
/// a storm on day 4 and a two hour outage on day 5.
fn synthesize(end: i64) -> PointSeries {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let start = end - Duration::weeks(1);

    (start..end)
        .step_by(Duration::minutes(1) as usize)
        .filter(|&t| !(start + Duration::days(5)..start + Duration::days(5) + Duration::hours(2)).contains(&t))
        .map(|t| {
            let phase = (t - start_of_day(t)) as Value / Duration::days(1) as Value;
            let mut value = 20_000.0 + 25.0 * (phase * std::f64::consts::TAU).sin();

            if (start + Duration::days(4)..start + Duration::days(4) + Duration::hours(6)).contains(&t) {
                value -= 150.0;
            }

            Point::new(t, value + rng.gen_range(-2.0..2.0))
        })
        .collect()
}

fn main() -> geomag::Result<()> {
    env_logger::builder()
        .filter_module("geomag", log::LevelFilter::Trace)
        .parse_default_env()
        .init();

    let start = Instant::now();

    let mut station = None;
    let mut series = PointSeries::default();

    for path in std::env::args().skip(1) {
        let file = DataMinFile::from_path(&path)?;
        log::info!("reading {path:?} ({})", file.station);

        series = series.merge(file.read()?);
        station.get_or_insert(file.station);
    }

    if series.is_empty() {
        log::info!("no DataMin files given, synthesizing one week of minute data");
        series = synthesize(start_of_day(geomag::timestamp()));
    }

    log::info!("loaded {} points in {:?}", series.len(), start.elapsed());

    let Some((first, last)) = series.range() else {
        return Ok(());
    };

    // NOTE: All but the last day serve as reference
    let last_day = start_of_day(last);
    let reference = series.clip(first, last_day - 1);
    let display = series.clip(last_day, last);

    let start = Instant::now();

    let baseline = Baseline::builder()
        .bucket_size_ms(Duration::minutes(1))
        .build(&reference);

    log::info!(
        "built baseline with {} buckets in {:?}",
        baseline.len(),
        start.elapsed()
    );

    let start = Instant::now();

    let resampled = Resampler::new().run(&display, last_day, last);

    #[allow(clippy::cast_precision_loss)]
    let step = resampled.bucket_ms as f64;

    let mut payload = ChartPayload::new("H", &resampled)
        .with_series("baseline", &baseline.series(&resampled.points.timestamps()))
        .with_series("ΔH", &baseline.deviation(&resampled.points))
        .inject_gaps(&GapInjector::new(step));

    if let Some(station) = station {
        payload = payload.station(station);
    }

    log::info!("built chart payload in {:?}", start.elapsed());

    println!("{}", payload.to_json()?);

    Ok(())
}
