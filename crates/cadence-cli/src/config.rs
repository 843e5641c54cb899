use cadence_core::config::EvaluationConfig;
use cadence_core::timezone::{detect_host_zone, resolve_zone, Zone};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "cadence.toml";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Zone used when neither the command line nor the calendar names one
    pub default_timezone: String,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timezone: detect_host_zone().name(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("CADENCE_").split("__"))
            .extract()
    }

    /// Resolves the configured default zone, falling back to UTC when the
    /// identifier is not recognized.
    pub fn default_zone(&self) -> Zone {
        match resolve_zone(&self.default_timezone) {
            Ok(zone) => zone,
            Err(e) => {
                tracing::warn!(timezone = %self.default_timezone, error = %e, "falling back to UTC");
                Zone::Utc
            }
        }
    }
}
