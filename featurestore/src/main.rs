use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use featurestore::config::{Config, redact_db_url};
use featurestore::quality::Strictness;
use featurestore::refresh::FeatureJob;
use featurestore::runs::{ModelRegistry, RunRecord};
use featurestore::{demo, lookup, quality, raw};
use migration::{Migrator, MigratorTrait};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "featurestore", about = "Feature store for the recommendation pipeline")]
struct Cli {
    /// Overrides FS_DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append synthetic interactions (and the demo product catalog) to the raw store
    IngestDemo {
        #[arg(long, default_value_t = 100)]
        interactions: usize,
        /// Seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, action = clap::ArgAction::SetTrue)]
        skip_products: bool,
    },
    /// Report data-quality counts for the raw store without writing anything
    Validate,
    /// Recompute the feature store from the raw store
    Refresh {
        /// Fail on any offending raw row instead of skipping it
        #[arg(long, action = clap::ArgAction::SetTrue)]
        strict: bool,
        /// Only use interactions ingested at or after this RFC 3339 timestamp
        #[arg(long)]
        since: Option<DateTime<Utc>>,
    },
    /// Record one completed training run
    RecordRun {
        /// Defaults to a fresh UUIDv7
        #[arg(long)]
        run_id: Option<String>,
        #[arg(long)]
        n_features: i32,
        #[arg(long)]
        model_type: String,
        #[arg(long)]
        rmse: Option<f64>,
        /// RFC 3339; defaults to now
        #[arg(long)]
        training_date: Option<DateTime<Utc>>,
    },
    /// Inspect recorded training runs
    Runs {
        #[command(subcommand)]
        action: RunsAction,
    },
    /// Inspect registered features
    Features {
        #[command(subcommand)]
        action: FeaturesAction,
    },
}

#[derive(Subcommand)]
enum RunsAction {
    /// List runs, newest first
    List,
}

#[derive(Subcommand)]
enum FeaturesAction {
    /// List registered feature names with their provenance
    List,
    /// Print one feature for some users (all users if none given)
    Get {
        name: String,
        #[arg(long = "user")]
        users: Vec<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries JSON results
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    tracing::info!(database = %redact_db_url(&config.database_url), "connecting to database");

    let db = Database::connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;

    tracing::info!("database initialized");

    match cli.command {
        Commands::IngestDemo {
            interactions,
            seed,
            skip_products,
        } => ingest_demo(&db, interactions, seed, skip_products).await?,
        Commands::Validate => {
            let report = quality::validate(&db, &config.quality_policy()).await?;
            print_json(&report)?;
        }
        Commands::Refresh { strict, since } => {
            if strict {
                config.strictness = Strictness::Strict;
            }
            let job = FeatureJob::new(db, config.quality_policy());
            let report = job.refresh(since).await?;
            print_json(&report)?;
        }
        Commands::RecordRun {
            run_id,
            n_features,
            model_type,
            rmse,
            training_date,
        } => {
            let record = RunRecord {
                run_id: run_id.unwrap_or_else(|| Uuid::now_v7().to_string()),
                training_date: training_date.unwrap_or_else(Utc::now).naive_utc(),
                rmse,
                n_features,
                model_type,
            };
            let model = ModelRegistry::new(db).record_run(record).await?;
            print_json(&model)?;
        }
        Commands::Runs {
            action: RunsAction::List,
        } => {
            let runs = ModelRegistry::new(db).list_runs().await?;
            print_json(&runs)?;
        }
        Commands::Features { action } => match action {
            FeaturesAction::List => {
                let rows = featurestore::metadata::list_feature_metadata(&db).await?;
                print_json(&rows)?;
            }
            FeaturesAction::Get { name, users } => {
                let samples = lookup::get_feature(&db, &name, &users).await?;
                print_json(&samples)?;
            }
        },
    }

    Ok(())
}

async fn ingest_demo(
    db: &DatabaseConnection,
    n: usize,
    seed: Option<u64>,
    skip_products: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let rows = demo::generate_interactions(&mut rng, n, Utc::now());
    let interactions = raw::append_interactions(db, &rows).await?;

    let products = if skip_products {
        0
    } else {
        raw::append_products(db, &demo::product_catalog()).await?
    };

    tracing::info!(interactions, products, "demo data ingested");
    print_json(&serde_json::json!({
        "interactions": interactions,
        "products": products,
    }))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
