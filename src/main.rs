use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use urbanheat::data::export::serialize_csv;
use urbanheat::data::vegetation::{bounding_box, category_counts, to_geojson};
use urbanheat::prediction::{Explainability, FeatureVector, ModelKind};
use urbanheat::state::DataSelection;
use urbanheat::{Config, Dashboard};

#[derive(Debug, Parser)]
#[command(about = "UrbanHeat Valencia: climate records, vegetation and Tmax forecasts.")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Browse and summarise the climate series.
    Data(DataArgs),
    /// Summarise the vegetation layer.
    Vegetation {
        /// Write the features as GeoJSON for the map layer.
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
    /// Forecast the daily maximum temperature.
    Predict(PredictArgs),
}

#[derive(Debug, Parser)]
struct DataArgs {
    /// Start date (inclusive); defaults to the first day on record.
    #[arg(long)]
    from: Option<NaiveDate>,
    /// End date (inclusive); defaults to the last day on record.
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Drop days colder than this minimum temperature.
    #[arg(long)]
    tmin_floor: Option<f64>,
    /// Drop days hotter than this maximum temperature.
    #[arg(long)]
    tmax_ceiling: Option<f64>,
    /// Write the filtered records as CSV.
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct PredictArgs {
    /// `linear` or `random_forest`.
    #[arg(long, default_value = "linear")]
    model: ModelKind,
    /// Mean temperature (°C).
    #[arg(long, default_value_t = 25.0, allow_negative_numbers = true)]
    tmed: f64,
    /// Minimum temperature (°C).
    #[arg(long, default_value_t = 18.0, allow_negative_numbers = true)]
    tmin: f64,
    /// Precipitation (mm).
    #[arg(long, default_value_t = 0.0)]
    prec: f64,
    /// Mean wind speed (km/h).
    #[arg(long, default_value_t = 1.5)]
    velmedia: f64,
    /// Wind gust (km/h).
    #[arg(long, default_value_t = 4.0)]
    racha: f64,
    /// Wind direction (°).
    #[arg(long, default_value_t = 180.0)]
    dir: f64,
    /// Print the full result as JSON.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    let args = Cli::parse();
    if let Err(err) = run(args) {
        log::error!("{err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<()> {
    let config = Config::from_env().context("reading configuration")?;
    let dashboard = Dashboard::new(&config);

    match args.cmd {
        Command::Data(data_args) => show_data(&dashboard, data_args),
        Command::Vegetation { geojson } => show_vegetation(&dashboard, geojson),
        Command::Predict(predict_args) => show_prediction(&dashboard, predict_args),
    }
}

fn show_data(dashboard: &Dashboard, args: DataArgs) -> Result<()> {
    let dataset = dashboard.data.get_climate_dataset()?;
    let mut selection =
        DataSelection::new(dataset).context("climate dataset has no dated records")?;

    let (first, last) = selection.date_limits;
    selection.set_date_range(args.from.unwrap_or(first), args.to.unwrap_or(last));
    if args.tmin_floor.is_some() || args.tmax_ceiling.is_some() {
        selection.set_temperature_bounds(
            args.tmin_floor.unwrap_or(selection.tmin_floor),
            args.tmax_ceiling.unwrap_or(selection.tmax_ceiling),
        );
    }

    println!(
        "{} of {} days between {} and {} (tmin >= {}, tmax <= {})",
        selection.view().len(),
        dataset.len(),
        selection.start,
        selection.end,
        selection.tmin_floor,
        selection.tmax_ceiling,
    );

    println!("\nfecha       tmed   tmax   tmin   prec  velmedia  racha");
    for r in selection.snapshot() {
        let date = r.date.map(|d| d.to_string()).unwrap_or_default();
        println!(
            "{date:<10} {:>6.1} {:>6.1} {:>6.1} {:>6.1} {:>9.1} {:>6.1}",
            r.tmed, r.tmax, r.tmin, r.precipitation, r.wind_mean, r.wind_gust
        );
    }

    match selection.summary() {
        Some(stats) => {
            println!("\nfield        count     mean      std      min      25%      50%      75%      max");
            for s in &stats.fields {
                println!(
                    "{:<10} {:>7} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
                    s.field.to_string(),
                    s.count,
                    s.mean,
                    s.std,
                    s.min,
                    s.p25,
                    s.median,
                    s.p75,
                    s.max
                );
            }
        }
        None => println!("\nNo records match the selection."),
    }

    if let Some(path) = args.export {
        let bytes = serialize_csv(selection.view())?;
        std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        println!("\nWrote {} records to {}", selection.view().len(), path.display());
    }
    Ok(())
}

fn show_vegetation(dashboard: &Dashboard, geojson: Option<PathBuf>) -> Result<()> {
    let features = dashboard.data.get_vegetation_dataset()?;

    println!("{} vegetation features", features.len());
    for (category, count) in category_counts(features) {
        println!("  {category:<40} {count:>6}");
    }
    if let Some([x0, y0, x1, y1]) = bounding_box(features) {
        println!("extent: lon {x0:.4}..{x1:.4}, lat {y0:.4}..{y1:.4}");
    }

    if let Some(path) = geojson {
        let text = to_geojson(features).context("encoding GeoJSON")?;
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn show_prediction(dashboard: &Dashboard, args: PredictArgs) -> Result<()> {
    let vector = FeatureVector {
        tmed: args.tmed,
        tmin: args.tmin,
        precipitation: args.prec,
        wind_mean: args.velmedia,
        wind_gust: args.racha,
        wind_direction: args.dir,
    };
    let prediction = dashboard.predictions.predict(args.model, &vector)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
        return Ok(());
    }

    println!("Estimated Tmax: {:.1} °C", prediction.value);
    match &prediction.explainability {
        Explainability::Importance { ranking } => {
            println!("\nRandom forest feature importances:");
            for entry in ranking {
                println!("  {:<15} {:.4}", entry.feature, entry.importance);
            }
        }
        Explainability::Coefficients { note } => println!("({note})"),
    }
    Ok(())
}
