// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `riflett doctor` command implementation.
//!
//! Probes each storage tier and the embedder, then reports which tier the
//! memory store would actually use.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use riflett_config::RiflettConfig;
use riflett_core::{FlatKeyValueStore, HealthStatus, RiflettError};
use riflett_memory::embedding_provider_from_config;
use riflett_storage::{FileKeyValueStore, RowBackend};

use crate::commands::open_store;

const PROBE_KEY: &str = "riflett.doctor.probe";

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, started: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: started.elapsed(),
        }
    }
}

/// Run every check and print a report. Fails when any check fails.
pub async fn run_doctor(config: &RiflettConfig, plain: bool) -> Result<(), RiflettError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_config(config),
        check_database(config).await,
        check_snapshot(&config.storage.snapshot_dir).await,
        check_embedder(config).await,
        check_memory(config).await,
    ];

    println!();
    println!("  riflett doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        match result.status {
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", format_line(result, use_color));
    }

    println!();
    println!(
        "  {} checks, {} warnings, {} failures",
        results.len(),
        warn_count,
        fail_count
    );

    if fail_count > 0 {
        return Err(RiflettError::Internal(format!(
            "{fail_count} doctor check(s) failed"
        )));
    }
    Ok(())
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal().to_string()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        };
        format!("    {symbol} {:<12} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!("    {tag} {:<12} {} ({duration_ms}ms)", result.name, result.message)
    }
}

fn check_config(config: &RiflettConfig) -> CheckResult {
    let started = Instant::now();
    let routing = &config.routing;
    CheckResult::new(
        "config",
        CheckStatus::Pass,
        format!(
            "route_at={} clarify_lower={} secondary={}",
            routing.route_at, routing.clarify_lower, routing.secondary
        ),
        started,
    )
}

async fn check_database(config: &RiflettConfig) -> CheckResult {
    let started = Instant::now();
    if !config.storage.enabled {
        return CheckResult::new("database", CheckStatus::Warn, "SQL tier disabled", started);
    }

    let path = &config.storage.database_path;
    let opened = RowBackend::open(path, config.storage.shape).await;
    match opened {
        Ok(db) => match db.ping().await {
            Ok(()) => CheckResult::new(
                "database",
                CheckStatus::Pass,
                format!("{path} ({} client)", db.shape_name()),
                started,
            ),
            Err(e) => CheckResult::new("database", CheckStatus::Fail, e.to_string(), started),
        },
        Err(e) => CheckResult::new(
            "database",
            CheckStatus::Warn,
            format!("unavailable, flat snapshot will be used: {e}"),
            started,
        ),
    }
}

async fn check_snapshot(dir: &str) -> CheckResult {
    let started = Instant::now();
    let flat = FileKeyValueStore::new(dir);
    let probe = async {
        flat.set(PROBE_KEY, "ok".to_string()).await?;
        let read = flat.get(PROBE_KEY).await?;
        flat.remove(PROBE_KEY).await?;
        Ok::<_, RiflettError>(read)
    };
    match probe.await {
        Ok(Some(value)) if value == "ok" => {
            CheckResult::new("snapshot", CheckStatus::Pass, dir.to_string(), started)
        }
        Ok(_) => CheckResult::new(
            "snapshot",
            CheckStatus::Fail,
            "probe value did not read back",
            started,
        ),
        Err(e) => CheckResult::new("snapshot", CheckStatus::Warn, e.to_string(), started),
    }
}

async fn check_embedder(config: &RiflettConfig) -> CheckResult {
    let started = Instant::now();
    let provider = embedding_provider_from_config(&config.memory);
    let vector = provider.embed("riflett doctor").await;
    let dim = vector.len();
    if provider.has_native() {
        CheckResult::new("embedder", CheckStatus::Pass, format!("native encoder, dim {dim}"), started)
    } else {
        CheckResult::new(
            "embedder",
            CheckStatus::Warn,
            format!("hashing fallback, dim {dim}"),
            started,
        )
    }
}

async fn check_memory(config: &RiflettConfig) -> CheckResult {
    let started = Instant::now();
    let health = open_store(config).health().await;
    let mut summary = format!("{} tier, {} rows", health.tier.as_str(), health.rows);
    if let Some(stored) = health.durable_rows {
        summary.push_str(&format!(" ({stored} stored)"));
    }
    match health.status {
        HealthStatus::Healthy => CheckResult::new("memory", CheckStatus::Pass, summary, started),
        HealthStatus::Degraded(reason) => CheckResult::new(
            "memory",
            CheckStatus::Warn,
            format!("{summary}: {reason}"),
            started,
        ),
        HealthStatus::Unhealthy(reason) => CheckResult::new(
            "memory",
            CheckStatus::Fail,
            format!("{summary}: {reason}"),
            started,
        ),
    }
}
