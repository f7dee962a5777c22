//! faqrag CLI entry point

use clap::{ArgGroup, Parser};
use faqrag::{
    commands::{
        cmd_create, cmd_import, cmd_query, collect_records, print_create_result,
        print_import_result, print_query_results, print_records,
    },
    config::Config,
    error::Result,
    progress::LogWriterFactory,
    store::WeaviateStore,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "faqrag")]
#[command(version, about = "Crawl FAQ pages into Weaviate and query them by meaning", long_about = None)]
#[command(group(ArgGroup::new("action").args(["create", "import_data", "read"])))]
struct Cli {
    /// Create the FAQ collection
    #[arg(long)]
    create: bool,

    /// Crawl the FAQ site and import question/answer pairs
    #[arg(long)]
    import_data: bool,

    /// Query the collection for the records nearest to QUERY
    #[arg(long, value_name = "QUERY")]
    read: Option<String>,

    /// Path to config file
    #[arg(short, long, env = "FAQRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Collection name
    #[arg(long)]
    collection: Option<String>,

    /// Page the crawl starts from
    #[arg(long)]
    seed_url: Option<String>,

    /// Only follow links containing this URL (defaults to the seed URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Maximum pages to crawl
    #[arg(long)]
    max_pages: Option<u32>,

    /// Maximum number of query results
    #[arg(short, long)]
    limit: Option<usize>,

    /// Crawl and extract only; print the records instead of importing them
    #[arg(long, requires = "import_data")]
    dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

enum Action {
    Create,
    Import,
    Read(String),
}

impl Cli {
    fn action(&self) -> Option<Action> {
        if self.create {
            Some(Action::Create)
        } else if self.import_data {
            Some(Action::Import)
        } else {
            self.read.clone().map(Action::Read)
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        if e.is_config() {
            error!("Check the config file and the WEAVIATE_URL / WEAVIATE_API_KEY variables");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    let Some(action) = cli.action() else {
        println!("No action given. Use --create, --import-data or --read <QUERY> (see --help).");
        return Ok(());
    };

    let config = load_config(&cli)?;

    match action {
        Action::Create => {
            let store = connect_store(&config)?;
            let result = cmd_create(&config, store).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_create_result(&result);
            }
        }

        Action::Import => {
            // Credentials are checked before the crawl touches the network
            let credentials = if cli.dry_run {
                None
            } else {
                Some(config.store_credentials()?)
            };

            let base_url = cli.base_url.as_deref().unwrap_or(&config.seed_url);
            let records = collect_records(&config, &config.seed_url, base_url).await?;

            let Some(credentials) = credentials else {
                return print_records(&records);
            };

            let store = WeaviateStore::connect(&credentials, &config.store)?;
            let result = cmd_import(&config, store, &records).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_import_result(&result);
            }
        }

        Action::Read(query) => {
            let limit = cli.limit.unwrap_or(config.query.default_limit);
            let store = connect_store(&config)?;
            let result = cmd_query(&config, store, &query, limit).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_query_results(&result);
            }
        }
    }

    Ok(())
}

/// Load the config file and apply command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_from(None)?,
    };

    if let Some(collection) = &cli.collection {
        config.collection_name = collection.clone();
    }
    if let Some(seed_url) = &cli.seed_url {
        config.seed_url = seed_url.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawl.max_pages = max_pages;
    }

    config.validate()?;
    info!("Using collection {}", config.collection_name);
    Ok(config)
}

fn connect_store(config: &Config) -> Result<WeaviateStore> {
    let credentials = config.store_credentials()?;
    WeaviateStore::connect(&credentials, &config.store)
}
