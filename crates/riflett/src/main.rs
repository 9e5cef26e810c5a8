// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Riflett - conversational context and intent core.
//!
//! This is the binary entry point. Every subcommand except `doctor` prints
//! JSON to stdout; logs go to stderr.

mod commands;
mod doctor;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use riflett_config::RiflettConfig;
use riflett_core::MemoryKind;

/// Riflett - conversational context and intent core.
#[derive(Parser, Debug)]
#[command(name = "riflett", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify and route one utterance against stored memory.
    Turn {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Restrict retrieval to these kinds (repeatable).
        #[arg(long = "kind", value_parser = parse_kind)]
        kinds: Vec<MemoryKind>,
        #[arg(long)]
        top_k: Option<usize>,
        /// Enables the time-of-day context term.
        #[arg(long)]
        time_zone: Option<String>,
    },
    /// Store or overwrite a memory row.
    Remember {
        /// Row id; `<kind>:<random uuid>` when omitted.
        #[arg(long)]
        id: Option<String>,
        #[arg(long, value_parser = parse_kind)]
        kind: MemoryKind,
        /// Logical timestamp in epoch milliseconds; now when omitted.
        #[arg(long)]
        ts: Option<i64>,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Top-N similarity search over stored memory.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[arg(long = "kind", value_parser = parse_kind)]
        kinds: Vec<MemoryKind>,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Delete a memory row by id.
    Forget { id: String },
    /// Check configuration, storage tiers, and the embedder.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

fn parse_kind(value: &str) -> Result<MemoryKind, String> {
    value
        .parse::<MemoryKind>()
        .map_err(|_| format!("unknown kind `{value}` (expected entry, goal, event, pref, schedule)"))
}

fn load_config(path: Option<&PathBuf>) -> RiflettConfig {
    let loaded = match path {
        Some(path) => riflett_config::load_and_validate_path(path),
        None => riflett_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            riflett_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("riflett={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Commands::Turn {
            text,
            kinds,
            top_k,
            time_zone,
        } => commands::run_turn(&config, &text.join(" "), kinds, top_k, time_zone).await,
        Commands::Remember { id, kind, ts, text } => {
            commands::run_remember(&config, id, kind, ts, text.join(" ")).await
        }
        Commands::Search {
            query,
            kinds,
            top_k,
        } => commands::run_search(&config, &query.join(" "), &kinds, top_k).await,
        Commands::Forget { id } => commands::run_forget(&config, &id).await,
        Commands::Doctor { plain } => doctor::run_doctor(&config, plain).await,
    };

    if let Err(e) = result {
        eprintln!("riflett: {e}");
        std::process::exit(1);
    }
}
