//! sessionctl - session control client

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sessionctl::{
    cache::create_cache,
    client::HttpSessionClient,
    config::Config,
    services::{AllowUserForm, InFlightRegistry, NotificationLevel, SessionDetail},
    theme,
};

/// sessionctl - view and control shared sessions
#[derive(Parser, Debug)]
#[command(name = "sessionctl")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "SESSIONCTL_CONFIG", default_value = "config.yml")]
    config: PathBuf,

    /// Log filter (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show a session
    Show {
        /// Session ID
        id: String,
        /// Render the detail view as HTML instead of JSON
        #[arg(long)]
        html: bool,
    },

    /// Activate a session as the configured user
    Activate {
        /// Session ID
        id: String,
    },

    /// Stop a session
    Kill {
        /// Session ID
        id: String,
    },

    /// Allow a user to access a session
    Allow {
        /// Session ID
        id: String,
        /// Email to allow
        email: String,
    },

    /// Remove a user from a session's allow-list
    Deny {
        /// Session ID
        id: String,
        /// Email to remove
        email: String,
    },

    /// Print the contact block HTML
    Contact,
}

impl Commands {
    fn session_id(&self) -> Option<&str> {
        match self {
            Self::Show { id, .. }
            | Self::Activate { id }
            | Self::Kill { id }
            | Self::Allow { id, .. }
            | Self::Deny { id, .. } => Some(id),
            Self::Contact => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("sessionctl={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(session_id) = cli.command.session_id() else {
        println!("{}", theme::render_contact_icons(None)?);
        return Ok(());
    };

    let config = Config::load_with_env(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::debug!("Using backend {}", config.server.base_url);

    let client = HttpSessionClient::new(&config.server)?;
    let cache = create_cache(Arc::new(client), &config.cache);
    let detail = SessionDetail::new(
        session_id,
        config.auth.email.clone(),
        cache,
        Arc::new(InFlightRegistry::new()),
    );

    let snapshot = detail.load().await;
    if let Some(error) = &snapshot.error {
        anyhow::bail!("Failed to load session {}: {}", session_id, error);
    }

    let result = match &cli.command {
        Commands::Show { html: true, .. } => {
            println!("{}", theme::render_session_detail(&detail.view().await)?);
            Ok(())
        }
        Commands::Show { .. } => {
            match snapshot.session() {
                Some(session) => println!("{}", serde_json::to_string_pretty(session)?),
                None => anyhow::bail!("Session {} not found", session_id),
            }
            Ok(())
        }
        Commands::Activate { .. } => detail.activate().await.map(|_| ()),
        Commands::Kill { .. } => detail.kill().await.map(|_| ()),
        Commands::Allow { email, .. } => detail
            .allow_user(AllowUserForm::new(email.as_str()))
            .await
            .map(|_| ()),
        Commands::Deny { email, .. } => detail.deny_user(email).await.map(|_| ()),
        Commands::Contact => Ok(()),
    };

    for note in detail.take_notifications() {
        match note.level {
            NotificationLevel::Info => tracing::info!("{}", note.message),
            NotificationLevel::Warning => tracing::warn!("{}", note.message),
            NotificationLevel::Error => tracing::error!("{}", note.message),
        }
    }
    result?;

    if let Some(session) = detail.snapshot().await.session() {
        if !matches!(cli.command, Commands::Show { .. }) {
            println!("{}", serde_json::to_string_pretty(session)?);
        }
    }

    Ok(())
}
