use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use iron_catalog::{
    config::{self, AppConfig},
    db::{self, DbPool},
    etl::{
        self,
        category_images::Strategy,
        image_classifier::{ClassifierSettings, ImageClassifier},
    },
    services::{build_http_client, openai::OpenAiClient},
};

#[derive(Parser)]
#[command(name = "catalog-etl", about = "Build and enrich the Iron Catalog tables", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace equipment with a Latin-1 tab-separated inventory listing
    ImportInventory { file: PathBuf },
    /// Parse a text-layout parts catalog into JSON
    ParseCatalog { input: PathBuf, output: PathBuf },
    /// Replace parts with the output of parse-catalog
    SeedParts { input: PathBuf },
    /// Replace power units with the inventory sheet exported as TSV
    ImportPowerUnits { sheet: PathBuf },
    /// Classify item photos into part categories with the vision model
    ClassifyImages(ClassifyArgs),
    /// Assign classified photos to parts by keyword overlap
    MatchImages {
        #[arg(long)]
        classifications: PathBuf,
    },
    /// Spread numbered item photos across categories by size
    AssignImages {
        #[arg(long, default_value_t = etl::image_assign::DEFAULT_TOTAL_IMAGES)]
        total_images: u32,
    },
    /// Decode base64 data URL lines into image files
    DecodeImages {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output_dir: PathBuf,
    },
    /// Copy a representative photo for every category
    CategoryImages(CategoryImagesArgs),
    /// Load missing tables from the JSON exports
    Seed {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ClassifyArgs {
    #[arg(long)]
    images_dir: PathBuf,
    #[arg(long)]
    output: PathBuf,
    #[arg(long, default_value_t = 2)]
    concurrency: usize,
}

#[derive(Args)]
struct CategoryImagesArgs {
    #[arg(long)]
    classifications: Option<PathBuf>,
    #[arg(long)]
    images_dir: PathBuf,
    #[arg(long)]
    output_dir: PathBuf,
    #[arg(long, value_enum, default_value_t = Strategy::Largest)]
    strategy: Strategy,
}

async fn connect(cfg: &AppConfig) -> Result<DbPool> {
    let pool = db::connect(cfg)
        .await
        .context("failed to connect to the database")?;
    if cfg.auto_migrate {
        db::run_migrations(&pool).await?;
    }
    Ok(pool)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    match cli.command {
        Commands::ImportInventory { file } => {
            let pool = connect(&cfg).await?;
            etl::inventory::import_inventory(&pool, &file).await?;
        }
        Commands::ParseCatalog { input, output } => {
            etl::catalog_parser::parse_catalog_file(&input, &output)?;
        }
        Commands::SeedParts { input } => {
            let pool = connect(&cfg).await?;
            etl::parts_seed::seed_parts(&pool, &input).await?;
        }
        Commands::ImportPowerUnits { sheet } => {
            let pool = connect(&cfg).await?;
            etl::power_units::import_power_units(&pool, &sheet).await?;
        }
        Commands::ClassifyImages(args) => {
            let http = build_http_client(cfg.http_timeout())?;
            let client = OpenAiClient::new(
                http,
                cfg.openai_base_url.clone(),
                cfg.openai_api_key.clone(),
                cfg.openai_max_retries,
            );
            anyhow::ensure!(client.is_configured(), "APP__OPENAI_API_KEY is not set");
            let mut settings = ClassifierSettings::new(cfg.openai_model.clone());
            settings.concurrency = args.concurrency.max(1);
            let results = ImageClassifier::new(client, settings)
                .run(&args.images_dir, &args.output)
                .await?;
            info!("Classified {} images", results.len());
        }
        Commands::MatchImages { classifications } => {
            let pool = connect(&cfg).await?;
            etl::image_matcher::match_images(&pool, &classifications).await?;
        }
        Commands::AssignImages { total_images } => {
            let pool = connect(&cfg).await?;
            etl::image_assign::assign_images(&pool, total_images).await?;
        }
        Commands::DecodeImages { input, output_dir } => {
            etl::image_decode::decode_images(&input, &output_dir)?;
        }
        Commands::CategoryImages(args) => {
            etl::category_images::update_category_images(
                args.strategy,
                args.classifications.as_deref(),
                &args.images_dir,
                &args.output_dir,
            )?;
        }
        Commands::Seed { data_dir } => {
            let pool = connect(&cfg).await?;
            let dir = data_dir.unwrap_or_else(|| PathBuf::from(&cfg.seed_data_dir));
            let report = etl::seed::seed_database(&pool, &dir).await?;
            info!(?report, "Seed finished");
        }
    }

    Ok(())
}
