mod login_commands;
mod run_command;

use std::path::PathBuf;

use {
    anyhow::{Context, Result},
    clap::{Parser, Subcommand},
    mxwa_bridge::{SqliteLoginStore, SqliteMessageStore, commands::CommandProcessor},
    mxwa_config::{DisplaynameTemplate, MxwaConfig},
    mxwa_waid::{MessageMetadata, UserLoginMetadata},
    mxwa_whatsapp::{DeviceProps, DeviceStore, WaVersion, WhatsAppConnector, register_commands},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "mxwa", about = "mxwa, the WhatsApp side of a Matrix bridge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding mxwa.toml, instead of the default search path.
    #[arg(long, global = true, env = "MXWA_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the config and print the device properties derived from it.
    CheckConfig,
    /// Create or upgrade every database table.
    Migrate,
    /// Print the chat command help.
    Commands,
    /// Connect every stored login and keep running until interrupted.
    Run,
    /// Inspect or remove persisted logins.
    Logins {
        #[command(subcommand)]
        action: login_commands::LoginAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<MxwaConfig> {
    if let Some(dir) = &cli.config_dir {
        mxwa_config::set_config_dir(dir.clone());
    }
    mxwa_config::discover_and_load()
}

async fn open_pool(config: &MxwaConfig) -> Result<sqlx::SqlitePool> {
    sqlx::SqlitePool::connect(&config.database.url)
        .await
        .with_context(|| format!("failed to open database {}", config.database.url))
}

/// Bring the bridge and device tables up to date.
async fn migrate(pool: &sqlx::SqlitePool) -> Result<()> {
    SqliteLoginStore::<UserLoginMetadata>::init(pool).await?;
    SqliteMessageStore::<MessageMetadata>::init(pool).await?;
    DeviceStore::new(pool.clone()).upgrade().await?;
    Ok(())
}

fn describe_config(config: &MxwaConfig) -> Result<String> {
    let template = DisplaynameTemplate::parse(&config.bridge.displayname_template)
        .context("invalid bridge.displayname_template")?;
    let props = DeviceProps::from_config(config);

    let mut out = String::new();
    out.push_str(&format!("displayname template: {}\n", template.source()));
    out.push_str(&format!("command prefix:       {}\n", config.bridge.command_prefix));
    out.push_str(&format!("device os:            {}\n", props.os));
    out.push_str(&format!(
        "platform:             {}\n",
        props
            .platform_type
            .map_or_else(|| "(unset)".to_string(), |p| format!("{p:?}"))
    ));
    out.push_str(&format!("request full sync:    {}\n", props.require_full_sync));
    match props.history_sync_config {
        Some(limits) => out.push_str(&format!(
            "full sync limits:     {} days, {} MB, {} MB quota\n",
            limits.full_sync_days_limit, limits.full_sync_size_mb_limit, limits.storage_quota_mb
        )),
        None => out.push_str("full sync limits:     (not sent)\n"),
    }
    out.push_str(&format!("session directory:    {}\n", config.whatsapp.session_dir));
    out.push_str(&format!("database:             {}\n", config.database.url));
    out.push_str(&format!(
        "group export:         {}\n",
        config.export.endpoint.as_deref().unwrap_or("(disabled)")
    ));
    out.push_str(&format!("web version:          {}\n", WaVersion::HARDCODED));
    Ok(out)
}

fn command_help() -> String {
    let mut processor = CommandProcessor::<WhatsAppConnector>::new();
    register_commands(&mut processor);
    processor.help_text()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "mxwa starting");

    match &cli.command {
        Commands::CheckConfig => {
            let config = load_config(&cli)?;
            print!("{}", describe_config(&config)?);
            Ok(())
        },
        Commands::Migrate => {
            let config = load_config(&cli)?;
            let pool = open_pool(&config).await?;
            migrate(&pool).await?;
            info!(database = %config.database.url, "database is up to date");
            Ok(())
        },
        Commands::Run => {
            let config = load_config(&cli)?;
            let runtime = run_command::protocol_runtime(&config)?;
            let pool = open_pool(&config).await?;
            let _connector = run_command::start_connector(&config, pool, runtime).await?;
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for shutdown signal")?;
            info!("shutting down");
            Ok(())
        },
        Commands::Commands => {
            print!("{}", command_help());
            Ok(())
        },
        Commands::Logins { action } => {
            let config = load_config(&cli)?;
            let pool = open_pool(&config).await?;
            migrate(&pool).await?;
            login_commands::handle_logins(action, &pool).await
        },
    }
}
