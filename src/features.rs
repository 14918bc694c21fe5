//! Feature flags for controlling optional behaviors.
//!
//! Features can be enabled via:
//! - CLI: `--features warn-on-coercion`
//! - Environment: `GIT_REPLAN_FEATURES=warn-on-coercion`

use std::collections::HashSet;
use std::env;
use std::sync::OnceLock;

use clap::ValueEnum;
use log::warn;
use serde::{Deserialize, Serialize};

pub const FEATURES_ENV: &str = "GIT_REPLAN_FEATURES";

/// Available feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// Log a warning whenever a squash/fixup with nothing to fold into is turned into a pick.
    WarnOnCoercion,
}

impl Feature {
    /// Check if this feature is enabled in the global config.
    pub fn is_enabled(&self) -> bool {
        Features::global().is_enabled(*self)
    }
}

/// Collection of enabled features.
#[derive(Debug, Clone, Default)]
pub struct Features {
    enabled: HashSet<Feature>,
}

static GLOBAL_FEATURES: OnceLock<Features> = OnceLock::new();

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from the `GIT_REPLAN_FEATURES` environment variable.
    pub fn from_env() -> Self {
        match env::var(FEATURES_ENV) {
            Ok(value) => Self::parse_list(&value),
            Err(_) => Self::new(),
        }
    }

    /// Parse a comma-separated list, ignoring (and warning about) unknown names.
    pub fn parse_list(value: &str) -> Self {
        let mut features = Self::new();
        for name in value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if let Ok(feature) = Feature::from_str(name, true) {
                features.enable(feature);
            } else {
                warn!("Unknown feature '{}' in {}", name, FEATURES_ENV);
            }
        }
        features
    }

    pub fn enable(&mut self, feature: Feature) {
        self.enabled.insert(feature);
    }

    pub fn disable(&mut self, feature: Feature) {
        self.enabled.remove(&feature);
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.enabled.contains(&feature)
    }

    /// Merge with CLI overrides.
    pub fn with_overrides(mut self, cli_features: Option<&[Feature]>) -> Self {
        if let Some(features) = cli_features {
            for feature in features {
                self.enable(*feature);
            }
        }
        self
    }

    /// Get the global feature configuration.
    pub fn global() -> &'static Features {
        GLOBAL_FEATURES.get_or_init(Features::from_env)
    }

    /// Initialize the global feature configuration.
    /// Should be called once at startup with CLI overrides.
    pub fn init_global(features: Features) {
        let _ = GLOBAL_FEATURES.set(features);
    }

    pub fn enabled_features(&self) -> impl Iterator<Item = Feature> + '_ {
        self.enabled.iter().copied()
    }
}
