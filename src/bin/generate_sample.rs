use std::f64::consts::PI;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde_json::json;

use urbanheat::prediction::artifact::{
    EstimatorArtifact, PipelineArtifact, TreeArtifact,
};
use urbanheat::prediction::{Feature, ModelKind};
use urbanheat::Config;

/// One synthetic day: model inputs in feature order plus the Tmax target.
struct Day {
    date: NaiveDate,
    x: [f64; 6],
    tmax: f64,
}

/// Seeded splitmix64 stream, so every run writes the same files.
struct SampleRng(u64);

impl SampleRng {
    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        ((z ^ (z >> 31)) >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        mean + std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

// ---------------------------------------------------------------------------
// Climate series
// ---------------------------------------------------------------------------

/// Weights of the synthetic Tmax relation, in feature order.
const TMAX_WEIGHTS: [f64; 6] = [1.9, -0.85, -0.06, 0.12, 0.02, 0.0];
const TMAX_INTERCEPT: f64 = 0.4;

fn generate_days(rng: &mut SampleRng) -> Result<Vec<Day>> {
    let first = NaiveDate::from_ymd_opt(2018, 1, 1).context("first day")?;
    let last = NaiveDate::from_ymd_opt(2022, 12, 31).context("last day")?;

    let mut days = Vec::new();
    let mut date = first;
    while date <= last {
        let season = (2.0 * PI * (date.ordinal() as f64 - 110.0) / 365.25).sin();
        let tmed = 18.5 + 7.0 * season + rng.gauss(0.0, 1.4);
        let tmin = tmed - (4.5 + rng.gauss(0.0, 0.9)).max(0.5);
        let prec = if rng.next_f64() < 0.12 {
            (rng.gauss(0.0, 9.0)).abs()
        } else {
            0.0
        };
        let velmedia = (2.4 + rng.gauss(0.0, 1.0)).max(0.0);
        let racha = velmedia * 2.6 + rng.gauss(0.0, 1.5).abs();
        let dir = (rng.next_f64() * 36.0).floor() * 10.0;

        let x = [tmed, tmin, prec, velmedia, racha, dir];
        let tmax = TMAX_WEIGHTS
            .iter()
            .zip(&x)
            .fold(TMAX_INTERCEPT, |acc, (w, v)| acc + w * v)
            + rng.gauss(0.0, 0.6);

        days.push(Day { date, x, tmax });
        date = date.succ_opt().context("date overflow")?;
    }
    Ok(days)
}

/// Decimal-comma cell, one decimal place.
fn comma(v: f64) -> String {
    format!("{v:.1}").replace('.', ",")
}

fn climate_csv(days: &[Day]) -> Result<String> {
    let mut out = String::from(
        "fecha;indicativo;nombre;provincia;altitud;tmed;prec;tmin;tmax;dir;velmedia;racha\n",
    );
    for d in days {
        let [tmed, tmin, prec, velmedia, racha, dir] = d.x;
        writeln!(
            out,
            "{};8416;VALENCIA;VALENCIA;11;{};{};{};{};{};{};{}",
            d.date.format("%Y-%m-%d"),
            comma(tmed),
            comma(prec),
            comma(tmin),
            comma(d.tmax),
            dir as i64,
            comma(velmedia),
            comma(racha),
        )?;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Vegetation layer
// ---------------------------------------------------------------------------

fn vegetation_geojson(rng: &mut SampleRng) -> String {
    let categories = ["Jardín", "Parque urbano", "Zona verde", "Huerta"];
    let (lat0, lon0) = (39.4699, -0.3763);

    let features: Vec<_> = (0..24)
        .map(|i| {
            let lat = lat0 + rng.gauss(0.0, 0.02);
            let lon = lon0 + rng.gauss(0.0, 0.025);
            let size = 0.001 + rng.next_f64() * 0.004;
            let ring = vec![
                [lon, lat],
                [lon + size, lat],
                [lon + size, lat + size * 0.8],
                [lon, lat + size * 0.8],
                [lon, lat],
            ];
            // The source mixes text dates, numeric dates and blanks.
            let created = match i % 3 {
                0 => json!(format!("{}-0{}-15", 1990 + i, 1 + i % 9)),
                1 => json!(19900101 + i as i64 * 10000),
                _ => json!(null),
            };
            json!({
                "type": "Feature",
                "properties": { "elemento": categories[i % categories.len()], "fechacreac": created },
                "geometry": { "type": "Polygon", "coordinates": [ring] },
            })
        })
        .collect();

    json!({ "type": "FeatureCollection", "features": features }).to_string()
}

// ---------------------------------------------------------------------------
// Pipeline artifacts
// ---------------------------------------------------------------------------

fn feature_names() -> Vec<String> {
    Feature::ORDER.iter().map(|f| f.column().to_string()).collect()
}

fn linear_artifact() -> PipelineArtifact {
    PipelineArtifact {
        kind: ModelKind::Linear,
        feature_names: feature_names(),
        scaler: None,
        estimator: EstimatorArtifact::LinearRegression {
            coefficients: TMAX_WEIGHTS.to_vec(),
            intercept: TMAX_INTERCEPT,
        },
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.get(values.len() / 2).copied().unwrap_or(0.0)
}

fn mean_tmax(days: &[&Day]) -> f64 {
    days.iter().map(|d| d.tmax).sum::<f64>() / days.len().max(1) as f64
}

/// A depth-2 tree over a bootstrap sample: the root splits on `tmed`, the
/// children on `tmin` and mean wind, each at the sample median.
fn bootstrap_tree(days: &[Day], rng: &mut SampleRng) -> TreeArtifact {
    let sample: Vec<&Day> = (0..days.len()).map(|_| &days[rng.below(days.len())]).collect();

    let root_t = median(sample.iter().map(|d| d.x[0]).collect());
    let (cold, warm): (Vec<&Day>, Vec<&Day>) = sample.iter().copied().partition(|d| d.x[0] <= root_t);
    let cold_t = median(cold.iter().map(|d| d.x[1]).collect());
    let warm_t = median(warm.iter().map(|d| d.x[3]).collect());

    let leaf = |group: &[&Day], feature: usize, t: f64, low: bool| {
        let part: Vec<&Day> = group
            .iter()
            .copied()
            .filter(|d| (d.x[feature] <= t) == low)
            .collect();
        if part.is_empty() {
            mean_tmax(group)
        } else {
            mean_tmax(&part)
        }
    };

    TreeArtifact {
        children_left: vec![1, 3, 5, -1, -1, -1, -1],
        children_right: vec![2, 4, 6, -1, -1, -1, -1],
        feature: vec![0, 1, 3, -2, -2, -2, -2],
        threshold: vec![root_t, cold_t, warm_t, -2.0, -2.0, -2.0, -2.0],
        value: vec![
            mean_tmax(&sample),
            mean_tmax(&cold),
            mean_tmax(&warm),
            leaf(&cold, 1, cold_t, true),
            leaf(&cold, 1, cold_t, false),
            leaf(&warm, 3, warm_t, true),
            leaf(&warm, 3, warm_t, false),
        ],
    }
}

fn forest_artifact(days: &[Day], rng: &mut SampleRng) -> PipelineArtifact {
    PipelineArtifact {
        kind: ModelKind::RandomForest,
        feature_names: feature_names(),
        scaler: None,
        estimator: EstimatorArtifact::RandomForest {
            trees: (0..10).map(|_| bootstrap_tree(days, rng)).collect(),
            feature_importances: Some(vec![0.81, 0.12, 0.0, 0.07, 0.0, 0.0]),
        },
    }
}

fn write(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env().context("reading configuration")?;
    let mut rng = SampleRng(42);

    let days = generate_days(&mut rng)?;
    write(&config.climate_path, &climate_csv(&days)?)?;
    write(&config.vegetation_path, &vegetation_geojson(&mut rng))?;
    write(
        &config.linear_model_path,
        &serde_json::to_string_pretty(&linear_artifact())?,
    )?;
    write(
        &config.forest_model_path,
        &serde_json::to_string_pretty(&forest_artifact(&days, &mut rng))?,
    )?;

    println!("{} days of climate records", days.len());
    Ok(())
}
