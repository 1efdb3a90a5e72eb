use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

pub(crate) const MAX_EXECUTOR_WORKERS: usize = 64;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ExecutorConfig {
    /// `0` runs remediations inline on the event path; `N` runs them on a
    /// pool of at most `N` concurrent tasks
    #[serde(default)]
    pub workers: usize,
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers > MAX_EXECUTOR_WORKERS {
            return Err(Error::InvalidConfig(format!(
                "executor workers {} exceeds the maximum of {}",
                self.workers, MAX_EXECUTOR_WORKERS
            )));
        }
        Ok(())
    }
}
