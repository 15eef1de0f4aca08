//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use newswire_core::{FetchStageConfig, LoadConfig, ProgressReporter};
use newswire_search::SearchOptions;
use newswire_shared::{
    AppConfig, StagingSection, init_config, load_config, load_config_from, resolve_api_key,
    resolve_db_uri, resolve_storage_token,
};
use newswire_sink::MongoSink;
use newswire_staging::{GcsOptions, GcsStore};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// newswire — harvest search results into object storage, then load them
/// into a document collection.
#[derive(Parser)]
#[command(
    name = "newswire",
    version,
    about = "Two-stage article ingestion: fetch-and-stage to object storage, then load into a document database.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path (defaults to ~/.newswire/newswire.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Harvest the search API and overwrite the staged object.
    FetchAndStage {
        #[command(flatten)]
        args: FetchArgs,
    },

    /// Read the staged object back and bulk-insert it into the collection.
    Load {
        #[command(flatten)]
        args: LoadArgs,
    },

    /// Run both stages in order; load starts only if staging succeeded.
    Run {
        #[command(flatten)]
        fetch: FetchArgs,

        /// Target database name (defaults to config).
        #[arg(long)]
        database: Option<String>,

        /// Target collection name (defaults to config).
        #[arg(long)]
        collection: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flag overrides for the fetch-and-stage stage.
#[derive(clap::Args, Clone)]
pub(crate) struct FetchArgs {
    /// Keyword to harvest; repeat for several (defaults to config).
    #[arg(long = "keyword")]
    keywords: Vec<String>,

    /// Pages to fetch per keyword (defaults to config).
    #[arg(long)]
    pages: Option<u32>,

    /// Window start as YYYYMMDD (defaults to config).
    #[arg(long)]
    begin_date: Option<String>,

    /// Window end as YYYYMMDD (defaults to config).
    #[arg(long)]
    end_date: Option<String>,

    /// Staging bucket (defaults to config).
    #[arg(long)]
    bucket: Option<String>,

    /// Staged object name (defaults to config).
    #[arg(long)]
    object: Option<String>,
}

/// Flag overrides for the load stage.
#[derive(clap::Args, Clone)]
pub(crate) struct LoadArgs {
    /// Staging bucket (defaults to config).
    #[arg(long)]
    bucket: Option<String>,

    /// Staged object name (defaults to config).
    #[arg(long)]
    object: Option<String>,

    /// Target database name (defaults to config).
    #[arg(long)]
    database: Option<String>,

    /// Target collection name (defaults to config).
    #[arg(long)]
    collection: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug,hyper_util=info",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::FetchAndStage { args } => {
            let mut config = resolve_config(cli.config.as_deref())?;
            apply_fetch_overrides(&mut config, &args);
            cmd_fetch_and_stage(&config).await
        }
        Command::Load { args } => {
            let mut config = resolve_config(cli.config.as_deref())?;
            apply_load_overrides(&mut config, &args);
            cmd_load(&config).await
        }
        Command::Run {
            fetch,
            database,
            collection,
        } => {
            let mut config = resolve_config(cli.config.as_deref())?;
            let load = LoadArgs {
                bucket: fetch.bucket.clone(),
                object: fetch.object.clone(),
                database,
                collection,
            };
            apply_fetch_overrides(&mut config, &fetch);
            apply_load_overrides(&mut config, &load);
            cmd_run(&config).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()).await,
        },
    }
}

/// Load the config file, honoring an explicit `--config` path.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Apply fetch-stage flag overrides on top of the loaded config.
fn apply_fetch_overrides(config: &mut AppConfig, args: &FetchArgs) {
    if !args.keywords.is_empty() {
        config.search.keywords = args.keywords.clone();
    }
    if let Some(pages) = args.pages {
        config.search.page_count = pages;
    }
    if let Some(begin) = &args.begin_date {
        config.search.start_date = begin.clone();
    }
    if let Some(end) = &args.end_date {
        config.search.end_date = end.clone();
    }
    if let Some(bucket) = &args.bucket {
        config.staging.bucket = bucket.clone();
    }
    if let Some(object) = &args.object {
        config.staging.object_name = object.clone();
    }
}

/// Apply load-stage flag overrides on top of the loaded config.
fn apply_load_overrides(config: &mut AppConfig, args: &LoadArgs) {
    if let Some(bucket) = &args.bucket {
        config.staging.bucket = bucket.clone();
    }
    if let Some(object) = &args.object {
        config.staging.object_name = object.clone();
    }
    if let Some(database) = &args.database {
        config.load.database = database.clone();
    }
    if let Some(collection) = &args.collection {
        config.load.collection = collection.clone();
    }
}

// ---------------------------------------------------------------------------
// Stage commands
// ---------------------------------------------------------------------------

/// Build the object-store adapter from the staging section. Created fresh
/// per stage invocation; never shared across stages.
fn build_store(staging: &StagingSection) -> Result<GcsStore> {
    let token = resolve_storage_token(staging);
    let store = GcsStore::new(GcsOptions {
        endpoint: staging.endpoint.clone(),
        project_id: staging.project_id.clone(),
        token,
        ..GcsOptions::default()
    })?;
    Ok(store)
}

async fn cmd_fetch_and_stage(config: &AppConfig) -> Result<()> {
    // Validate the destination and credentials before any network work.
    config.staging.validate()?;
    let date_range = config.search.date_range()?;
    let api_key = resolve_api_key(&config.search)?;

    let store = build_store(&config.staging)?;

    let stage_config = FetchStageConfig {
        keywords: config.search.keywords.clone(),
        page_count: config.search.page_count,
        date_range,
        api_key,
        bucket: config.staging.bucket.clone(),
        object_name: config.staging.object_name.clone(),
        search: SearchOptions {
            base_url: config.search.base_url.clone(),
            timeout_secs: config.search.timeout_secs,
            failure_cooldown: Duration::from_secs(config.search.failure_cooldown_secs),
        },
    };

    info!(
        keywords = stage_config.keywords.len(),
        pages = stage_config.page_count,
        bucket = %stage_config.bucket,
        object = %stage_config.object_name,
        "running fetch-and-stage"
    );

    let reporter = CliProgress::new();
    let report = newswire_core::fetch_and_stage(&stage_config, &store, &reporter).await?;

    println!();
    println!("  Fetch-and-stage complete!");
    println!("  Run:      {}", report.run_id);
    println!(
        "  Queries:  {} ({} failed)",
        report.descriptors_total, report.descriptors_failed
    );
    println!("  Records:  {}", report.records_staged);
    println!(
        "  Staged:   gs://{}/{} ({} bytes)",
        stage_config.bucket, stage_config.object_name, report.staged_bytes
    );
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
    println!();

    if !report.failures.is_empty() {
        println!("  Failed queries:");
        for (label, reason) in &report.failures {
            println!("    {label}: {reason}");
        }
        println!();
    }

    Ok(())
}

async fn cmd_load(config: &AppConfig) -> Result<()> {
    config.staging.validate()?;
    config.load.validate()?;
    let uri = resolve_db_uri(&config.load)?;

    let store = build_store(&config.staging)?;
    let sink = MongoSink::new(uri);

    let load_cfg = LoadConfig {
        bucket: config.staging.bucket.clone(),
        object_name: config.staging.object_name.clone(),
        database: config.load.database.clone(),
        collection: config.load.collection.clone(),
    };

    info!(
        database = %load_cfg.database,
        collection = %load_cfg.collection,
        "running load"
    );

    let reporter = CliProgress::new();
    let report = newswire_core::load(&load_cfg, &store, &sink, &reporter).await?;

    println!();
    println!("  Load complete!");
    println!("  Run:       {}", report.run_id);
    println!("  Documents: {}", report.records_loaded);
    println!(
        "  Target:    {}.{}",
        load_cfg.database, load_cfg.collection
    );
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_run(config: &AppConfig) -> Result<()> {
    // The ordering contract: load never starts unless staging succeeded.
    cmd_fetch_and_stage(config).await?;
    cmd_load(config).await
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn descriptor_fetched(
        &self,
        keyword: &str,
        page: u32,
        failed: bool,
        current: usize,
        total: usize,
    ) {
        let status = if failed { "failed" } else { "ok" };
        self.spinner.set_message(format!(
            "Fetching [{current}/{total}] {keyword} page {page} ({status})"
        ));
    }

    fn done(&self, _summary: &str) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
