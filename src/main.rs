pub mod types;
pub mod error;
pub mod config;
pub mod states;
pub mod listings;
pub mod filter;
pub mod aggregate;
pub mod geometry;
pub mod fetch;
pub mod join;
pub mod interactive;
pub mod plot;
pub mod export;

use aggregate::SearchOutcome;
use clap::{Args, Parser, Subcommand};
use filter::FilterCriteria;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search listings and write an interactive county map (HTML)
    Map(SearchArgs),
    /// Search listings and write a static choropleth (PNG)
    Plot(SearchArgs),
    /// Download and cache the county shapefile
    Fetch {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[derive(Args)]
struct SearchArgs {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,
    /// Bulk JSON file or <state>/<county>.json directory; overrides the config
    #[arg(short, long, value_name = "PATH")]
    listings: Option<PathBuf>,
    /// Maximum price
    #[arg(long, value_parser = filter::parse_threshold)]
    max_price: Option<f64>,
    /// Minimum bedrooms
    #[arg(long, value_parser = filter::parse_threshold)]
    beds: Option<f64>,
    /// Minimum bathrooms
    #[arg(long, value_parser = filter::parse_threshold)]
    baths: Option<f64>,
    /// Minimum square footage
    #[arg(long, value_parser = filter::parse_threshold)]
    sqft: Option<f64>,
    /// Minimum lot size
    #[arg(long, value_parser = filter::parse_threshold)]
    lotsize: Option<f64>,
    /// Also write the matching listings to a CSV file
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,
}

impl SearchArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(self.max_price, self.beds, self.baths, self.sqft, self.lotsize)
    }
}

/// Load inputs, run one search, print the results.
async fn search(args: &SearchArgs) -> anyhow::Result<(config::AppConfig, Vec<geometry::CountyGeometry>, SearchOutcome)> {
    let mut app_config = config::AppConfig::load_or_default(&args.config)?;
    if let Some(listings) = &args.listings {
        app_config.input.listings = listings.clone();
    }

    // 1. Load Data
    let store = listings::load_listings(&app_config.input.listings)?;
    let shapefile = fetch::ensure_shapefile(&app_config).await?;
    let counties = geometry::load_counties(&shapefile, app_config.processing.simplify_tolerance)?;

    // 2. Filter and count
    let criteria = args.criteria();
    if criteria.is_empty() {
        tracing::info!("No thresholds given, every complete listing matches");
    }
    let outcome = aggregate::aggregate(&store, &criteria);

    for m in &outcome.matches {
        println!("{}", m.description);
    }
    for skipped in &outcome.skipped {
        eprintln!("Skipped listing #{} in {}: {}", skipped.index, skipped.county, skipped.error);
    }
    println!(
        "{} matching listings in {} counties ({} skipped)",
        outcome.total_matches(),
        outcome.counts.values().filter(|c| **c > 0).count(),
        outcome.skipped.len()
    );

    if let Some(path) = &args.export {
        export::export_matches(path, &outcome.matches)?;
    }

    Ok((app_config, counties, outcome))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Map(args) => {
            let (app_config, counties, outcome) = search(args).await?;

            // 3. Render
            let joined = join::join_counts(&outcome, &counties);
            let layers = interactive::build_layers(&joined);
            interactive::write_map(&app_config.output.map_html, &layers, "Real Estate Search and Interactive Map")?;
            println!("Map written to {}", app_config.output.map_html.display());
        }
        Commands::Plot(args) => {
            let (app_config, counties, outcome) = search(args).await?;

            let joined = join::join_counts(&outcome, &counties);
            plot::write_plot(&app_config.output.plot_png, &app_config.plot, &joined)?;
            println!("Plot written to {}", app_config.output.plot_png.display());
        }
        Commands::Fetch { config } => {
            let app_config = config::AppConfig::load_or_default(config)?;
            let path = fetch::ensure_shapefile(&app_config).await?;
            println!("Shapefile available at {}", path.display());
        }
    }

    Ok(())
}
