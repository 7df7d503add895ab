//! Command-line front end: forecast one region of a case count CSV

use clap::Parser;
use covid_forecast::{CaseData, ForecastConfig, ForecastReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "covid_forecast")]
#[command(about = "Forecast confirmed COVID-19 cases with ARIMA and Holt-Winters", long_about = None)]
struct Cli {
    /// Case count CSV, one column per region
    #[arg(short, long)]
    input: PathBuf,

    /// Region label, e.g. "US" or "Australia - Victoria"
    #[arg(short, long, default_value = "US")]
    region: String,

    /// JSON configuration overriding the default protocol
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the merged forecast table to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the metrics as JSON instead of text
    #[arg(long)]
    json: bool,

    /// List the available regions and exit
    #[arg(long)]
    list: bool,
}

fn run(cli: Cli) -> covid_forecast::Result<()> {
    let data = CaseData::from_csv(&cli.input)?;

    if cli.list {
        for region in data.regions() {
            println!("{}", region.label());
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => ForecastConfig::from_json_file(path)?,
        None => ForecastConfig::default(),
    };

    let series = data.series(&cli.region)?;
    let report = ForecastReport::build(&series, &config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.metrics())?);
    } else {
        println!("Confirmed Cases Forecasting - {}", report.region);
        println!("End of observed data: {}", report.observed_end);
        println!("{}", report.metrics_text());
    }

    if let Some(path) = &cli.output {
        report.table.write_csv(path)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "covid_forecast=info".into()),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
