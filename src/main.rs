use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::debug;
use recipe_scraper::{
    AmountFormat, InMemorySelectorStore, NormalizationOptions, RecipeScraper, UnitSystem,
};

#[derive(Parser)]
#[command(name = "recipe-scraper", about = "Scrape a recipe page into structured JSON")]
struct Cli {
    /// Recipe page URL
    url: String,

    /// Scrape this saved HTML file instead of fetching the URL
    #[arg(long)]
    html: Option<PathBuf>,

    /// Multiply ingredient amounts and servings
    #[arg(long)]
    scale: Option<f64>,

    /// Convert ingredient units to metric
    #[arg(long)]
    metric: bool,

    /// Render amounts as decimals rather than fractions
    #[arg(long)]
    decimal: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let normalization = NormalizationOptions {
        unit_system: if cli.metric { UnitSystem::Metric } else { UnitSystem::Imperial },
        amount_format: if cli.decimal { AmountFormat::Decimal } else { AmountFormat::Fraction },
        decimals: cli.decimal.then_some(2),
        ..Default::default()
    };

    let mut builder = RecipeScraper::builder()
        .url(&cli.url)
        .normalization(normalization)
        .store(Arc::new(InMemorySelectorStore::new()));

    if let Some(path) = &cli.html {
        debug!("Reading HTML from {}", path.display());
        builder = builder.html(std::fs::read_to_string(path)?);
    }
    if let Some(factor) = cli.scale {
        builder = builder.scale(factor);
    }

    let report = builder.build().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
