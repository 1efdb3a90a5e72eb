//! Controller configuration.
//!
//! Sources are merged in order, later ones overriding earlier:
//! 1. Type defaults
//! 2. The TOML file named by `CONFIG_PATH` (if set)
//! 3. `PODKILLER__<SECTION>__<KEY>` environment variables
mod controller;
mod executor;
mod monitoring;
pub use controller::*;
pub use executor::*;
pub use monitoring::*;

use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_PATH_ENV;
use crate::constants::ENV_PREFIX;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Watch mode, scope and timing of the reconcile loop
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Remediation execution strategy
    #[serde(default)]
    pub executor: ExecutorConfig,
    /// Prometheus endpoint
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

impl Settings {
    /// Loads defaults, the optional `CONFIG_PATH` file and environment
    /// overrides. Does not validate; call [`Settings::validate`] once all
    /// overrides are applied.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        let config: Self = builder.add_source(environment()).build()?.try_deserialize()?;
        Ok(config)
    }

    /// Layers another file over the current values. Environment variables
    /// still take precedence.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn validate(self) -> Result<Self> {
        self.controller.validate()?;
        self.executor.validate()?;
        self.monitoring.validate()?;
        Ok(self)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
