// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Riflett context and intent core.
//!
//! TOML files are layered with `RIFLETT_*` environment overrides through
//! Figment, rejected on unknown keys, then checked for threshold ranges.
//! Failures come back as miette diagnostics with "did you mean" hints.
//!
//! ```no_run
//! use riflett_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("route at {}", config.routing.route_at);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::RiflettConfig;

/// Load from the file hierarchy plus env overrides, then validate.
pub fn load_and_validate() -> Result<RiflettConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load one explicit file plus env overrides, then validate.
pub fn load_and_validate_path(path: &Path) -> Result<RiflettConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load an inline TOML string, then validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<RiflettConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read every config file Figment may have consulted, for error spans.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![
        std::env::current_dir()
            .map(|d| d.join("riflett.toml"))
            .unwrap_or_else(|_| "riflett.toml".into()),
    ];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("riflett/riflett.toml"));
    }
    candidates.push("/etc/riflett/riflett.toml".into());

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
