//! Explicit, injectable configuration.
//!
//! Unlike the original Python implementation, which mutates a process-wide
//! config object at import time, configuration here is a plain value loaded
//! once (via the `config` crate, from `config/handover/base.toml` plus
//! environment overrides) and passed into every component's constructor.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::DbType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Environment-configurable settings recognized by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoverConfig {
    /// Current release gate; a parsed release that doesn't match this is
    /// rejected at ingress.
    pub release: u32,
    pub staging_uri: String,
    pub secondary_staging_uri: String,
    pub allowed_database_types: HashSet<DbType>,
    pub allowed_divisions: HashSet<String>,
    /// Stage names C7 accepts for `restart`.
    pub allowed_task_restart: HashSet<String>,
    /// `db_type -> dispatch target URL prefix`.
    pub dispatch_targets: HashMap<DbType, String>,
    /// Global override: dispatch regardless of the per-genome
    /// `compara_species` check.
    pub dispatch_all: bool,
    /// Species that trigger a BLAT-config-update email on new assembly.
    pub blat_species: HashSet<String>,
    /// Compara member species that force GRCh37-style secondary routing,
    /// and that gate the dispatch decision when `dispatch_all` is false.
    pub compara_species: HashSet<String>,
    #[serde(with = "humantime_seconds")]
    pub retry_delay: Duration,
    pub production_email: String,
    pub smtp_host: String,
    pub journal_url: String,
}

impl Default for HandoverConfig {
    fn default() -> Self {
        Self {
            release: 0,
            staging_uri: String::new(),
            secondary_staging_uri: String::new(),
            allowed_database_types: HashSet::new(),
            allowed_divisions: HashSet::new(),
            allowed_task_restart: ["datacheck", "dbcopy", "metadata"]
                .into_iter()
                .map(String::from)
                .collect(),
            dispatch_targets: HashMap::new(),
            dispatch_all: false,
            blat_species: HashSet::new(),
            compara_species: HashSet::new(),
            retry_delay: Duration::from_secs(60),
            production_email: String::new(),
            smtp_host: String::new(),
            journal_url: String::new(),
        }
    }
}

impl HandoverConfig {
    /// Layers `config/handover/base.toml` under environment overrides
    /// prefixed `HANDOVER__` (double underscore as the nested-key
    /// separator, e.g. `HANDOVER__RELEASE=108`), falling back to
    /// [`Default::default`] field values for anything neither source sets.
    /// The `HashSet`-valued settings (`ALLOWED_DATABASE_TYPES`,
    /// `ALLOWED_DIVISIONS`, `ALLOWED_TASK_RESTART`, `BLAT_SPECIES`,
    /// `COMPARA_SPECIES`) accept a comma-separated list in their environment
    /// form, e.g. `HANDOVER__BLAT_SPECIES=homo_sapiens,mus_musculus`.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name("config/handover/base").required(false))
            .add_source(
                Environment::with_prefix("HANDOVER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("allowed_database_types")
                    .with_list_parse_key("allowed_divisions")
                    .with_list_parse_key("allowed_task_restart")
                    .with_list_parse_key("blat_species")
                    .with_list_parse_key("compara_species")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// `true` when a `db_type` has a configured dispatch target, or dispatch
    /// is globally forced.
    pub fn has_dispatch_target(&self, db_type: DbType) -> bool {
        self.dispatch_targets.contains_key(&db_type) || self.dispatch_all
    }

    pub fn dispatch_target(&self, db_type: DbType) -> Option<&str> {
        self.dispatch_targets
            .get(&db_type)
            .or_else(|| self.dispatch_targets.get(&DbType::Core))
            .map(String::as_str)
    }

    /// `true` when the given genome should trigger the dispatch decision.
    pub fn genome_needs_dispatch(&self, genome: &str) -> bool {
        self.dispatch_all || self.compara_species.contains(genome)
    }
}

mod humantime_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_the_three_restartable_stages() {
        let cfg = HandoverConfig::default();
        assert!(cfg.allowed_task_restart.contains("datacheck"));
        assert!(cfg.allowed_task_restart.contains("dbcopy"));
        assert!(cfg.allowed_task_restart.contains("metadata"));
        assert!(!cfg.allowed_task_restart.contains("dispatch"));
    }

    #[test]
    fn has_dispatch_target_true_when_configured_or_forced() {
        let mut cfg = HandoverConfig::default();
        assert!(!cfg.has_dispatch_target(DbType::Core));

        cfg.dispatch_targets
            .insert(DbType::Core, "mysql://dispatch/".into());
        assert!(cfg.has_dispatch_target(DbType::Core));
        assert!(!cfg.has_dispatch_target(DbType::Variation));

        cfg.dispatch_all = true;
        assert!(cfg.has_dispatch_target(DbType::Variation));
    }

    #[test]
    fn dispatch_target_falls_back_to_core() {
        let mut cfg = HandoverConfig::default();
        cfg.dispatch_targets
            .insert(DbType::Core, "mysql://core-dispatch/".into());
        assert_eq!(
            cfg.dispatch_target(DbType::Variation),
            Some("mysql://core-dispatch/")
        );
    }

    // Both halves of this live in one test: `HANDOVER__RELEASE` is process-wide
    // env state, and a separate test setting/clearing it could race this one
    // under cargo's default parallel test execution.
    #[test]
    fn load_falls_back_to_defaults_then_honors_environment_overrides() {
        let defaults = HandoverConfig::load().unwrap();
        assert_eq!(defaults.release, 0);
        assert_eq!(defaults.retry_delay, Duration::from_secs(60));
        assert!(defaults.allowed_task_restart.contains("dbcopy"));

        std::env::set_var("HANDOVER__RELEASE", "108");
        let overridden = HandoverConfig::load();
        std::env::remove_var("HANDOVER__RELEASE");
        assert_eq!(overridden.unwrap().release, 108);
    }

    #[test]
    fn load_splits_comma_separated_environment_lists() {
        std::env::set_var("HANDOVER__BLAT_SPECIES", "homo_sapiens,mus_musculus");
        let cfg = HandoverConfig::load();
        std::env::remove_var("HANDOVER__BLAT_SPECIES");
        let cfg = cfg.unwrap();
        assert!(cfg.blat_species.contains("homo_sapiens"));
        assert!(cfg.blat_species.contains("mus_musculus"));
        assert_eq!(cfg.blat_species.len(), 2);
    }

    #[test]
    fn genome_needs_dispatch_respects_allow_list_and_override() {
        let mut cfg = HandoverConfig::default();
        assert!(!cfg.genome_needs_dispatch("homo_sapiens"));

        cfg.compara_species.insert("homo_sapiens".to_string());
        assert!(cfg.genome_needs_dispatch("homo_sapiens"));
        assert!(!cfg.genome_needs_dispatch("mus_musculus"));

        cfg.dispatch_all = true;
        assert!(cfg.genome_needs_dispatch("mus_musculus"));
    }
}
