// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order, later layers winning: compiled defaults,
//! `/etc/riflett/riflett.toml`, `~/.config/riflett/riflett.toml`,
//! `./riflett.toml`, then `RIFLETT_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RiflettConfig;

/// Section prefixes recognised in `RIFLETT_*` variable names.
const ENV_SECTIONS: &[&str] = &["agent", "storage", "memory", "intent", "routing", "goals"];

/// Load configuration from the XDG hierarchy with env var overrides.
pub fn load_config() -> Result<RiflettConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<RiflettConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RiflettConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file plus env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RiflettConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RiflettConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the full Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RiflettConfig::default()))
        .merge(Toml::file("/etc/riflett/riflett.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("riflett/riflett.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("riflett.toml"))
        .merge(env_provider())
}

/// Map `RIFLETT_MEMORY_LINK_THRESHOLD` to `memory.link_threshold`.
///
/// Only the first underscore after a known section becomes a dot; key
/// names keep their own underscores.
fn env_provider() -> Env {
    Env::prefixed("RIFLETT_").map(|key| {
        let key_str = key.as_str();
        ENV_SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or_else(|| key_str.to_string())
            .into()
    })
}
