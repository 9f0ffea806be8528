use anyhow::{Context, Result};
use bkweb::config::{AppConfig, DEFAULT_CONFIG_PATH};
use bkweb::context::AppContext;
use bkweb::db::SqliteCatalog;
use bkweb::logging::{self, LogConfig};
use bkweb::rpc::{RpcClient, RpcServer};
use bkweb::web::WebServer;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "bkweb")]
#[command(about = "Backup catalog reporting front-end", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard and the RPC interface
    Serve(ServerArgs),
    /// List jobs from a running server
    Jobs(JobsArgs),
    /// Weekly report for one backup job
    Report { backupjob_name: String },
    /// Show a client's definition from the director
    Client { id: i64 },
    /// Server status
    Status,
    /// Print the effective configuration
    Config,
}

#[derive(Args, Serialize)]
struct ServerArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    catalog_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    http_bind: Option<SocketAddr>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    rpc_bind: Option<SocketAddr>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    query_timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    init_schema: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    verbose: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    json_logs: Option<bool>,
}

#[derive(Args)]
struct JobsArgs {
    /// any, waiting, running, completed, failed or canceled
    #[arg(long)]
    status: Option<String>,

    #[arg(long)]
    per_page: Option<u32>,

    #[arg(long)]
    page: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.command {
        Commands::Serve(args) => AppConfig::load(&cli.config, Some(args))?,
        _ => AppConfig::load(&cli.config, None::<&ServerArgs>)?,
    };

    logging::init(LogConfig {
        json: config.json_logs,
        verbose: config.verbose,
    });

    let client = RpcClient::new(config.rpc_bind);

    match cli.command {
        Commands::Serve(_) => run_server(config).await.context("Server failed")?,
        Commands::Jobs(args) => print_jobs(&client, args).await?,
        Commands::Report { backupjob_name } => print_report(&client, &backupjob_name).await?,
        Commands::Client { id } => print_client(&client, id).await?,
        Commands::Status => print_status(&client).await?,
        Commands::Config => print!(
            "{}",
            toml::to_string_pretty(&config).context("Failed to serialize config")?
        ),
    }

    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    let clock = config.catalog_clock()?;
    let catalog = SqliteCatalog::open(&config.catalog_path, config.query_timeout())
        .await
        .with_context(|| format!("Failed to open catalog {}", config.catalog_path.display()))?
        .with_clock(clock);
    tracing::debug!(catalog_timezone = %clock, "Catalog clock selected");
    if config.init_schema {
        catalog.init_schema().await.context("Failed to initialize catalog schema")?;
    }

    let (http_bind, rpc_bind) = (config.http_bind, config.rpc_bind);
    let ctx = AppContext::new(config, Arc::new(catalog));

    let rpc = Arc::new(RpcServer::bind(ctx.clone(), rpc_bind).await?);
    let web = WebServer::bind(ctx, http_bind).await?;
    let web_shutdown = web.shutdown_token();

    let rpc_for_signal = rpc.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            rpc_for_signal.shutdown();
            web_shutdown.cancel();
        }
    });

    tokio::try_join!(rpc.start(), web.start())?;
    Ok(())
}

async fn print_jobs(client: &RpcClient, args: JobsArgs) -> Result<()> {
    let params = json!({
        "status": args.status,
        "jobs_per_page": args.per_page,
        "page": args.page,
    });
    let slots: Value = client.call("jobs.list", Some(params)).await?;

    println!(
        "{:>8}  {:<24} {:<5} {:<10} {:>8} {:>10}  {}",
        "JobId", "Name", "Level", "Status", "Files", "Bytes", "Elapsed"
    );
    for job in slots["jobs"].as_array().into_iter().flatten() {
        println!(
            "{:>8}  {:<24} {:<5} {:<10} {:>8} {:>10}  {}",
            job["job_id"].to_string(),
            job["name"].as_str().unwrap_or_default(),
            job["level"].as_str().unwrap_or_default(),
            job["status"]["category"].as_str().unwrap_or_default(),
            job["job_files"].to_string(),
            job["bytes"].as_str().unwrap_or_default(),
            job["elapsed"].as_str().unwrap_or_default(),
        );
    }
    println!(
        "\n{} matching jobs (page {} of {})",
        slots["total_jobs"],
        slots["page"].as_u64().unwrap_or(0) + 1,
        slots["page_count"].as_u64().unwrap_or(1).max(1)
    );
    Ok(())
}

async fn print_report(client: &RpcClient, name: &str) -> Result<()> {
    let slots: Value = client
        .call("report.backup_job", Some(json!({ "backupjob_name": name })))
        .await?;

    println!("{}", slots["backupjob_name"].as_str().unwrap_or(name));
    println!("{}", slots["backupjob_period"].as_str().unwrap_or_default());
    println!(
        "Stored: {}  Files: {}\n",
        slots["backupjob_bytes"].as_str().unwrap_or_default(),
        slots["backupjob_files"]
    );

    for point in slots["graph_stored_files"]["series"]["points"]
        .as_array()
        .into_iter()
        .flatten()
    {
        println!(
            "  {}  {:>8} files",
            point["label"].as_str().unwrap_or_default(),
            point["value"].to_string()
        );
    }

    println!();
    for job in slots["jobs"].as_array().into_iter().flatten() {
        println!(
            "{:>8}  {:<5} {:<10} {:>10}  {}",
            job["job_id"].to_string(),
            job["level"].as_str().unwrap_or_default(),
            job["status"]["category"].as_str().unwrap_or_default(),
            job["bytes"].as_str().unwrap_or_default(),
            job["elapsed"].as_str().unwrap_or_default(),
        );
    }
    Ok(())
}

async fn print_client(client: &RpcClient, id: i64) -> Result<()> {
    let out: Value = client.call("clients.show", Some(json!({ "id": id }))).await?;
    for line in out["output"].as_array().into_iter().flatten() {
        println!("{}", line.as_str().unwrap_or_default());
    }
    Ok(())
}

async fn print_status(client: &RpcClient) -> Result<()> {
    let status: Value = client
        .call_no_params("server.status")
        .await
        .context("Failed to check status of server")?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
