use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod app;
mod commands;

use commands::auth::{LoginArgs, RegisterArgs};
use commands::dossiers::DossierAction;

#[derive(Parser)]
#[command(name = "grace")]
#[command(about = "GRaCE CLI - insurance dossiers from the command line", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config dir)
    #[arg(long, global = true, env = "GRACE_CONFIG")]
    config: Option<PathBuf>,

    /// Use the in-memory backend regardless of configuration
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Sign in and print the merged user
    Login(LoginArgs),
    /// Create an account and its profile
    Register(RegisterArgs),
    /// Send a password reset email
    ResetPassword {
        email: String,
    },
    /// Manage the dossiers of a signed-in user
    Dossiers {
        #[command(flatten)]
        credentials: LoginArgs,
        #[command(subcommand)]
        action: DossierAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_service = app::config_service(cli.config.clone())?;

    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Show => commands::config::show(&config_service),
            ConfigAction::Path => commands::config::path(&config_service),
        };
    }

    let app = app::App::bootstrap(&config_service, cli.memory)?;
    let result = match cli.command {
        Commands::Config { .. } => Ok(()),
        Commands::Login(args) => commands::auth::login(&app, args).await,
        Commands::Register(args) => commands::auth::register(&app, args).await,
        Commands::ResetPassword { email } => commands::auth::reset_password(&app, &email).await,
        Commands::Dossiers {
            credentials,
            action,
        } => commands::dossiers::run(&app, credentials, action).await,
    };
    app.session.shutdown();
    result
}
