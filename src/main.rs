// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! webdevops - static website delivery stack synthesizer
//!
//! Declares a GitHub-sourced build pipeline, website bucket and CDN, and
//! writes them out as a provisioning template.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webdevops::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webdevops=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Init { path, force } => webdevops::cli::init::run(path, force, cli.verbose).await,
        Commands::Synth {
            context,
            format,
            out,
        } => webdevops::cli::synth::run(context, format, out, cli.verbose).await,
        Commands::Validate { context } => {
            webdevops::cli::validate::run(context, cli.verbose).await
        }
        Commands::Graph { context, format } => {
            webdevops::cli::graph::run(context, format, cli.verbose).await
        }
        Commands::Names { context } => webdevops::cli::names::run(context, cli.verbose).await,
    }
}
