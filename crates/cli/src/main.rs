mod config_commands;
mod doctor_commands;
mod send_commands;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::config_commands::ConfigAction;

#[derive(Parser)]
#[command(name = "whatsend", about = "Send WhatsApp Web messages from a one-page form")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/whatsend/).
    #[arg(long, global = true, env = "WHATSEND_CONFIG_DIR")]
    config_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the send form (default when no subcommand is provided).
    Serve {
        /// Address to bind to (overrides config value).
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides config value).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Send one message and exit.
    Send {
        /// Exact contact or group name as shown in WhatsApp.
        #[arg(long)]
        to: String,
        /// Message text.
        #[arg(short, long)]
        message: String,
    },
    /// Link a session by scanning the QR code, without sending anything.
    Login,
    /// Delete the saved session.
    Logout,
    /// Check the browser, config, and saved session.
    Doctor,
    /// Inspect the configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "whatsend starting");

    // Apply the directory override before any config is read.
    if let Some(ref dir) = cli.config_dir {
        whatsend_config::set_config_dir(dir.clone());
    }

    match cli.command {
        None => send_commands::handle_serve(None, None).await,
        Some(Commands::Serve { bind, port }) => send_commands::handle_serve(bind, port).await,
        Some(Commands::Send { to, message }) => send_commands::handle_send(to, message).await,
        Some(Commands::Login) => send_commands::handle_login().await,
        Some(Commands::Logout) => send_commands::handle_logout(),
        Some(Commands::Doctor) => doctor_commands::handle_doctor(),
        Some(Commands::Config { action }) => config_commands::handle_config(action),
    }
}
