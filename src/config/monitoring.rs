use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    #[serde(default = "default_prometheus_enabled")]
    pub prometheus_enabled: bool,

    #[serde(default = "default_prometheus_port")]
    pub prometheus_port: u16,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            prometheus_enabled: default_prometheus_enabled(),
            prometheus_port: default_prometheus_port(),
        }
    }
}

impl MonitoringConfig {
    /// Port the metrics endpoint should bind, `None` when it is switched off.
    pub fn endpoint_port(&self) -> Option<u16> {
        self.prometheus_enabled.then_some(self.prometheus_port)
    }

    /// # Errors
    /// Returns `Error::InvalidConfig` when the endpoint is switched on without
    /// a usable unprivileged port.
    pub fn validate(&self) -> Result<()> {
        match self.endpoint_port() {
            None => {
                if self.prometheus_port != default_prometheus_port() {
                    warn!(
                        port = self.prometheus_port,
                        "metrics endpoint is off, prometheus_port is ignored"
                    );
                }
                Ok(())
            }
            Some(0) => Err(Error::InvalidConfig(
                "metrics endpoint is on but prometheus_port is unset".into(),
            )),
            Some(port) if port < 1024 => Err(Error::InvalidConfig(format!(
                "metrics endpoint cannot bind port {port}: choose a port of 1024 or above"
            ))),
            Some(_) => Ok(()),
        }
    }
}

fn default_prometheus_enabled() -> bool {
    false
}

fn default_prometheus_port() -> u16 {
    9090
}
