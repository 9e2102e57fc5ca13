use serde::Deserialize;

use crate::error::Result;
use crate::error::SchedulingError;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig
{
    /// Ceiling used when the caller does not pass one.
    pub default_max_workload: usize,
    /// Reject bookings for technicians already at `default_max_workload`.
    pub enforce_workload_ceiling_on_schedule: bool,
}

impl Default for EngineConfig
{
    fn default() -> Self
    {
        Self {
            default_max_workload: 5,
            enforce_workload_ceiling_on_schedule: true,
        }
    }
}

impl EngineConfig
{
    pub fn from_toml_str(toml_str: &str) -> Result<Self>
    {
        let config: EngineConfig = toml::from_str(toml_str).map_err(|error| SchedulingError::InvalidConfig(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()>
    {
        if self.default_max_workload == 0 {
            return Err(SchedulingError::InvalidConfig("default_max_workload must be at least 1".to_string()));
        }
        Ok(())
    }
}
