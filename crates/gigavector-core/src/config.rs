//! Layered configuration: `gigavector.toml` + environment variables +
//! built-in defaults, grounded on the teacher's `config.rs` figment layering
//! (highest priority last: defaults, then file, then env).

use crate::error::{Error, Result};
use crate::index::HnswParams;
use crate::vacuum::VacuumConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// HNSW construction defaults, mirrored into a serializable shape so they
/// can be overridden from `gigavector.toml` / env.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswSection {
    pub m: usize,
    pub m_max0: usize,
    pub ef_construction: usize,
    pub ef_search: usize,
    pub min_fragmentation_ratio: f64,
}

impl Default for HnswSection {
    fn default() -> Self {
        let p = HnswParams::default();
        Self {
            m: p.m,
            m_max0: p.m_max0,
            ef_construction: p.ef_construction,
            ef_search: p.ef_search,
            min_fragmentation_ratio: p.min_fragmentation_ratio,
        }
    }
}

impl HnswSection {
    #[must_use]
    pub fn to_params(self) -> HnswParams {
        HnswParams {
            m: self.m,
            m_max0: self.m_max0,
            ef_construction: self.ef_construction,
            ef_search: self.ef_search,
            min_fragmentation_ratio: self.min_fragmentation_ratio,
        }
    }
}

/// Vacuum manager defaults, serializable mirror of [`VacuumConfig`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct VacuumSection {
    pub min_deleted_count: usize,
    pub batch_size: usize,
    pub priority: u8,
    pub interval_sec: u64,
    pub min_fragmentation_ratio: f64,
}

impl Default for VacuumSection {
    fn default() -> Self {
        let c = VacuumConfig::default();
        Self {
            min_deleted_count: c.min_deleted_count,
            batch_size: c.batch_size,
            priority: c.priority,
            interval_sec: c.interval_sec,
            min_fragmentation_ratio: c.min_fragmentation_ratio,
        }
    }
}

impl VacuumSection {
    #[must_use]
    pub fn to_config(self) -> VacuumConfig {
        VacuumConfig {
            min_deleted_count: self.min_deleted_count,
            batch_size: self.batch_size,
            priority: self.priority,
            interval_sec: self.interval_sec,
            min_fragmentation_ratio: self.min_fragmentation_ratio,
        }
    }
}

/// Server bind address and TLS material paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Path to a PEM certificate chain. Empty disables TLS.
    pub tls_cert_path: String,
    /// Path to a PEM private key. Empty disables TLS.
    pub tls_key_path: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            tls_cert_path: String::new(),
            tls_key_path: String::new(),
        }
    }
}

impl ServerSection {
    #[must_use]
    pub fn tls_enabled(&self) -> bool {
        !self.tls_cert_path.is_empty() && !self.tls_key_path.is_empty()
    }
}

/// Logging section: level and format, wired into `tracing_subscriber` by
/// `gigavector-server`'s `main.rs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Top-level `GigaVector` configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GigaConfig {
    pub hnsw: HnswSection,
    pub vacuum: VacuumSection,
    pub server: ServerSection,
    pub logging: LoggingSection,
}

impl GigaConfig {
    /// Loads from `gigavector.toml` in the current directory, overridden by
    /// `GIGAVECTOR_*` environment variables, falling back to defaults for
    /// anything unset in either.
    pub fn load() -> Result<Self> {
        Self::load_from_path("gigavector.toml")
    }

    /// As [`Self::load`], but with an explicit config file path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("GIGAVECTOR_").split("_").lowercase(false));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration directly from a TOML string, skipping file and
    /// environment layers. Used by tests and embedders that keep config
    /// in-process.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));
        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration back to TOML, e.g. to write out an
    /// effective config after CLI/env overrides have been applied.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.hnsw.m == 0 {
            return Err(Error::Config("hnsw.m must be nonzero".into()));
        }
        if self.hnsw.ef_search == 0 {
            return Err(Error::Config("hnsw.ef_search must be nonzero".into()));
        }
        if !(0.0..=1.0).contains(&self.vacuum.min_fragmentation_ratio) {
            return Err(Error::Config(
                "vacuum.min_fragmentation_ratio must be in [0, 1]".into(),
            ));
        }
        if self.server.tls_cert_path.is_empty() != self.server.tls_key_path.is_empty() {
            return Err(Error::Config(
                "server.tls_cert_path and tls_key_path must be set together".into(),
            ));
        }
        Ok(())
    }
}
