use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use casc_convert::resolver::{CountySource, OfflineCountySource, PostcodeResolver};
use casc_convert::{AddressDecomposer, Config, Gazetteer, Pipeline};

#[derive(Parser)]
#[command(name = "casc_convert")]
#[command(about = "Converts the register of Community Amateur Sports Clubs into schema.org JSON-LD")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the register CSV into a JSON array of SportsOrganization records
    Convert {
        /// Register CSV to read
        #[arg(long, default_value = "registered-casc.csv")]
        input: PathBuf,
        /// Destination for the JSON output
        #[arg(long, default_value = "registered-casc.json")]
        output: PathBuf,
        /// Gazetteer of county codes to names
        #[arg(long, default_value = "postcodes-io/counties.json")]
        counties: PathBuf,
        /// Optional TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Skip postcode lookups entirely
        #[arg(long)]
        offline: bool,
        /// Cap on concurrently processed rows (overrides config)
        #[arg(long)]
        max_in_flight: Option<usize>,
    },
    /// Look a single postcode up and print its county
    Lookup {
        /// Postcode to resolve
        postcode: String,
        /// Optional TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    casc_convert::logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            output,
            counties,
            config,
            offline,
            max_in_flight,
        } => {
            println!("🔄 Running register conversion...");

            let config = Config::load(config.as_deref())?;
            let max_in_flight = max_in_flight.unwrap_or(config.pipeline.max_in_flight);

            let gazetteer = Arc::new(Gazetteer::load(&counties)?);
            let county_source: Arc<dyn CountySource> = if offline {
                info!("Running offline; no postcode lookups will be made");
                println!("📴 Offline mode: skipping postcode lookups");
                Arc::new(OfflineCountySource)
            } else {
                Arc::new(PostcodeResolver::new(&config.resolver))
            };

            let decomposer = AddressDecomposer::new(gazetteer);
            let pipeline = Pipeline::new(decomposer, county_source, max_in_flight);

            match pipeline.run(&input, &output).await {
                Ok(summary) => {
                    println!("\n📊 Conversion results:");
                    println!("   Clubs converted: {}", summary.total_clubs);
                    println!("   With a region: {}", summary.with_region);
                    println!("   Regions from postcode lookups: {}", summary.resolver_hits);
                    println!("   Output file: {}", summary.output_file);
                    println!("✅ Conversion completed successfully");
                }
                Err(e) => {
                    error!("Conversion failed: {}", e);
                    println!("❌ Conversion failed: {e}");
                    return Err(e.into());
                }
            }
        }
        Commands::Lookup { postcode, config } => {
            let config = Config::load(config.as_deref())?;
            let resolver = PostcodeResolver::new(&config.resolver);
            match resolver.admin_county(&postcode).await {
                Some(county) => println!("📍 {postcode} is in {county}"),
                None => println!("⚠️  No county found for {postcode}"),
            }
        }
    }

    Ok(())
}
