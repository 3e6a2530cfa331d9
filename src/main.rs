use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use offerfeed::cli::output::print_error;
use offerfeed::cli::{commands, GlobalOptions, OutputMode};

#[derive(Parser)]
#[command(name = "offerfeed", version, about = "Query the offer feed backend from the command line")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<String>,

    /// API base URL (overrides env and config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Credentials file path
    #[arg(long, global = true, env = "OFFERFEED_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a backend path
    Get {
        /// API path, e.g. /posts
        path: String,

        /// Query parameters as key=value
        params: Vec<String>,

        /// Compact output
        #[arg(long)]
        raw: bool,
    },

    /// POST a JSON body to a backend path
    Post {
        /// API path, e.g. /offers
        path: String,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,

        /// Compact output
        #[arg(long)]
        raw: bool,
    },

    /// List feed items with their top offer
    Feed {
        /// Feed path
        #[arg(default_value = "/posts")]
        path: String,

        /// Query parameters as key=value
        params: Vec<String>,

        /// ETH to USD rate for dollar prices
        #[arg(long, env = "OFFERFEED_USD_PER_ETH")]
        usd_per_eth: Option<f64>,
    },

    /// Exchange the stored refresh token for a new access token
    Refresh,

    /// Store access and refresh tokens
    Login {
        #[arg(long, env = "OFFERFEED_ACCESS_TOKEN")]
        access_token: String,

        #[arg(long, env = "OFFERFEED_REFRESH_TOKEN")]
        refresh_token: Option<String>,
    },

    /// Remove stored tokens
    Logout,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Display the resolved configuration
    Show,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("OFFERFEED_LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli).await {
        print_error(&e, json, std::io::stderr().is_terminal());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), offerfeed::ApiError> {
    let opts = GlobalOptions {
        config: cli.config,
        base_url: cli.base_url,
        credentials: cli.credentials,
    };

    match cli.command {
        Commands::Get { path, params, raw } => {
            commands::run_get(&opts, &path, &params, OutputMode::from_flags(cli.json, raw)).await
        }
        Commands::Post { path, body, raw } => {
            commands::run_post(
                &opts,
                &path,
                body.as_deref(),
                OutputMode::from_flags(cli.json, raw),
            )
            .await
        }
        Commands::Feed {
            path,
            params,
            usd_per_eth,
        } => {
            commands::run_feed(
                &opts,
                &path,
                &params,
                usd_per_eth,
                OutputMode::from_flags(cli.json, false),
            )
            .await
        }
        Commands::Refresh => commands::run_refresh(&opts).await,
        Commands::Login {
            access_token,
            refresh_token,
        } => commands::run_login(&opts, &access_token, refresh_token.as_deref()),
        Commands::Logout => commands::run_logout(&opts),
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                commands::run_config_show(&opts, OutputMode::from_flags(cli.json, false))
            }
        },
    }
}
