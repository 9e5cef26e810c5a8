// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of threshold ranges and capacities.

use crate::diagnostic::ConfigError;
use crate::model::RiflettConfig;

/// Longest accepted goal window (ten years).
pub const MAX_GOAL_WINDOW_DAYS: i64 = 3650;

/// Validate a deserialized configuration.
///
/// Collects every violation instead of stopping at the first.
pub fn validate_config(config: &RiflettConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let unit_range = [
        ("memory.link_threshold", config.memory.link_threshold),
        ("memory.dedupe_threshold", config.memory.dedupe_threshold),
        ("intent.duplicate_threshold", config.intent.duplicate_threshold),
        ("routing.route_at", config.routing.route_at),
        ("routing.clarify_lower", config.routing.clarify_lower),
        ("routing.secondary", config.routing.secondary),
    ];
    for (key, value) in unit_range {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be within [0, 1], got {value}"),
            });
        }
    }

    if config.routing.clarify_lower >= config.routing.route_at {
        errors.push(ConfigError::Validation {
            message: format!(
                "routing.clarify_lower ({}) must be below routing.route_at ({})",
                config.routing.clarify_lower, config.routing.route_at
            ),
        });
    }

    let at_least_one = [
        ("memory.embedding_dim", config.memory.embedding_dim),
        ("memory.snapshot_capacity", config.memory.snapshot_capacity),
        ("memory.candidate_limit", config.memory.candidate_limit),
        ("memory.default_top_k", config.memory.default_top_k),
        ("memory.max_top_k", config.memory.max_top_k),
        ("memory.brief_limit", config.memory.brief_limit),
    ];
    for (key, value) in at_least_one {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be at least 1"),
            });
        }
    }

    if config.memory.default_top_k > config.memory.max_top_k {
        errors.push(ConfigError::Validation {
            message: format!(
                "memory.default_top_k ({}) must not exceed memory.max_top_k ({})",
                config.memory.default_top_k, config.memory.max_top_k
            ),
        });
    }

    if config.storage.enabled && config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty when storage is enabled".to_string(),
        });
    }

    for (name, days) in [
        ("goals.density_window_days", config.goals.density_window_days),
        ("goals.momentum_window_days", config.goals.momentum_window_days),
    ] {
        if !(1..=MAX_GOAL_WINDOW_DAYS).contains(&days) {
            errors.push(ConfigError::Validation {
                message: format!("{name} must be between 1 and {MAX_GOAL_WINDOW_DAYS} days, got {days}"),
            });
        }
    }

    if config.goals.density_target <= 0.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "goals.density_target must be positive, got {}",
                config.goals.density_target
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&RiflettConfig::default()).is_ok());
    }

    #[test]
    fn inverted_routing_thresholds_fail() {
        let mut config = RiflettConfig::default();
        config.routing.clarify_lower = 0.8;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("clarify_lower")));
    }

    #[test]
    fn out_of_range_threshold_fails() {
        let mut config = RiflettConfig::default();
        config.intent.duplicate_threshold = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("intent.duplicate_threshold"));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = RiflettConfig::default();
        config.memory.snapshot_capacity = 0;
        config.memory.default_top_k = 50;
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn goal_windows_are_bounded() {
        let mut config = RiflettConfig::default();
        config.goals.density_window_days = 1_000_000_000_000;
        config.goals.momentum_window_days = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].to_string().contains("goals.density_window_days"));
        assert!(errors[1].to_string().contains("goals.momentum_window_days"));

        config.goals.density_window_days = MAX_GOAL_WINDOW_DAYS;
        config.goals.momentum_window_days = 1;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_allowed_when_storage_disabled() {
        let mut config = RiflettConfig::default();
        config.storage.enabled = false;
        config.storage.database_path = String::new();
        assert!(validate_config(&config).is_ok());
    }
}
