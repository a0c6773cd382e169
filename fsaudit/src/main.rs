//! # fsaudit
//!
//! Polling file-change auditor. Every scan interval the configured directory
//! tree is walked and diffed against the previous walk; additions,
//! modifications and removals are published to an in-process broker and
//! logged one line per event on every delivery cycle.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use fsaudit_config::{ConfigLoad, ConfigLoader, apply_guard_rails};
use fsaudit_core::{Auditor, Broker, CancellationToken};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file_loaded = dotenvy::dotenv().is_ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(std::io::stdout().is_terminal()),
        )
        .init();

    if env_file_loaded {
        info!("loaded .env file");
    }

    let ConfigLoad { mut config, source } = ConfigLoader::new()
        .with_path(cli.config.clone())
        .load()
        .context("failed to load configuration")?;
    cli.apply_to(&mut config);

    let warnings =
        apply_guard_rails(&config).context("configuration rejected")?;
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => warn!(hint = %hint, "{}", warning.message),
            None => warn!("{}", warning.message),
        }
    }
    info!(source = ?source, root = %config.root.display(), "configuration loaded");

    let broker = Arc::new(Broker::new().context("failed to create broker")?);
    let mut auditor =
        Auditor::new(config.to_settings(), broker).with_log_handler();

    if cli.once {
        let report = auditor.run_once().await.context("scan failed")?;
        info!(
            files = report.files_seen,
            published = report.published,
            errors = report.errors.len(),
            "single scan finished"
        );
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                signal_token.cancel();
            }
            Err(err) => error!(error = %err, "failed to listen for Ctrl+C"),
        }
    });

    auditor.run(shutdown).await.context("auditor stopped")?;
    Ok(())
}
