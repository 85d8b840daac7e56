use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "formrelay")]
#[command(about = "Sendbird form webhook relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the relay server (POST /sbwebhook, GET /latest_webhook, GET /latest_email). Requires SENDBIRD_API_TOKEN and AUTOMATION_WEBHOOK_URL (or the matching config keys).
    Serve {
        /// Config file path (default: RELAY_CONFIG_PATH or ~/.formrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 8000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Load the config and check that the required credentials resolve, without starting the server.
    Check {
        /// Config file path (default: RELAY_CONFIG_PATH or ~/.formrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("formrelay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("relay failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Check { config }) => {
            if let Err(e) = run_check(config) {
                log::error!("check failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.server.port = p;
    }
    log::info!(
        "starting relay on {}:{} (config {})",
        config.server.bind,
        config.server.port,
        path.display()
    );
    lib::server::run_server(config).await
}

fn run_check(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let (config, path) = lib::config::load_config(config_path)?;
    let settings = lib::config::resolve_settings(&config)?;
    println!("config: {}", path.display());
    println!("listen: {}:{}", config.server.bind, config.server.port);
    println!("chat api base: {}", settings.api_base);
    println!("automation webhook: {}", settings.webhook_url);
    Ok(())
}
