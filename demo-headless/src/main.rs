use chrono::NaiveDate;
use clap::Parser;
use precip_forecast_core::core_types::clamp_day_selector;
use precip_forecast_core::forecast::format_day_label;
use precip_forecast_core::render::render_png;
use precip_forecast_core::{
    synthesize, BoundaryLayers, CalendarBounds, DayCard, ForecastSummary, MapContext,
    RenderConfig, ScreenExtent, TrainingPeriod,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Synthetic precipitation forecast over the contiguous US
#[derive(Parser, Debug)]
#[command(name = "precip-forecast")]
#[command(about = "Deterministic synthetic precipitation forecast for the contiguous US", long_about = None)]
struct Args {
    /// First forecast day (YYYY-MM-DD), pulled into 2025
    #[arg(short, long, default_value = "2025-03-01")]
    start: NaiveDate,

    /// Forecast window in days (1-14)
    #[arg(short, long, default_value_t = 5)]
    window: i64,

    /// Training period key (2000-2024 or 2015-2024)
    #[arg(short, long, default_value = "2015-2024")]
    training: TrainingPeriod,

    /// Day of the window to render (1-based)
    #[arg(short, long, default_value_t = 1)]
    day: i64,

    /// TopoJSON boundary file with `nation` and `states` objects
    #[arg(short, long)]
    boundary: PathBuf,

    /// PNG output path for the rendered day
    #[arg(short, long, default_value = "forecast.png")]
    output: PathBuf,

    /// Also write the full forecast as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 960)]
    width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    println!("=== Precipitation Forecast ===\n");

    let extent = ScreenExtent::new(args.width, args.height);
    let ctx = match MapContext::load(&args.boundary, &BoundaryLayers::default(), extent) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("{}", e);
            println!("Map data failed to load from {}", args.boundary.display());
            println!("Forecasts need the land boundary; nothing was run.");
            return ExitCode::FAILURE;
        }
    };

    let bounds = CalendarBounds::default();
    let request = bounds.request(args.start, args.window, args.training);
    if request.start_date != args.start {
        println!(
            "Start date {} is outside {}..={} for a {}-day window, using {}",
            args.start,
            bounds.first(),
            bounds.latest_start(request.window_size),
            request.window_size,
            request.start_date
        );
    }
    println!(
        "Start: {}, Window: {} days, Training: {} (bias {:.2})\n",
        request.start_date,
        request.window_size,
        request.training,
        request.bias()
    );

    let result = synthesize(&request, Some(&ctx));

    let summary = ForecastSummary::from_result(&result);
    for (label, value) in summary.metrics() {
        println!("{:<20} {}", label, value);
    }

    println!("\nDaily outlook:");
    for card in DayCard::all(&result) {
        println!("  {:<16} {}", card.label, card.amount);
    }

    let day_index = clamp_day_selector(args.day, request.window_size);
    if let Some(day) = result.day(day_index) {
        println!(
            "\nRendering Day {} · {}",
            day_index + 1,
            format_day_label(day.date)
        );
    }

    match render_png(&args.output, &result, day_index, Some(&ctx), &RenderConfig::default()) {
        Ok(_) => println!("Map written to {}", args.output.display()),
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    }

    if let Some(path) = &args.json {
        let written = serde_json::to_string_pretty(&result)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => println!("Forecast JSON written to {}", path.display()),
            Err(e) => {
                error!("Failed to write forecast JSON: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    info!("Done: {} days, {} cells", result.len(), result.total_cells());
    ExitCode::SUCCESS
}
