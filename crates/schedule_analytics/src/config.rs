use chrono::FixedOffset;
use chrono::Weekday;
use serde::Deserialize;

use crate::AnalyticsError;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig
{
    /// Hours one technician can be booked on a working day.
    pub business_hours_per_day: f64,
    pub working_days: Vec<Weekday>,
    /// Offset of the timezone used to bucket activity by calendar day.
    pub reference_utc_offset_minutes: i32,
    pub top_users_limit: usize,
    pub most_changed_tickets_limit: usize,
    /// Coverage from which a service type counts as adequately staffed.
    pub adequate_redundancy: usize,
    pub high_redundancy: usize,
}

impl Default for AnalyticsConfig
{
    fn default() -> Self
    {
        Self {
            business_hours_per_day: 8.0,
            working_days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
            reference_utc_offset_minutes: 0,
            top_users_limit: 10,
            most_changed_tickets_limit: 10,
            adequate_redundancy: 3,
            high_redundancy: 5,
        }
    }
}

impl AnalyticsConfig
{
    pub fn from_toml_str(toml_str: &str) -> Result<Self, AnalyticsError>
    {
        let config: AnalyticsConfig = toml::from_str(toml_str).map_err(|error| AnalyticsError::InvalidConfig(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalyticsError>
    {
        if !(self.business_hours_per_day > 0.0 && self.business_hours_per_day <= 24.0) {
            return Err(AnalyticsError::InvalidConfig(format!(
                "business_hours_per_day must be in (0, 24], got {}",
                self.business_hours_per_day
            )));
        }
        if self.top_users_limit == 0 || self.most_changed_tickets_limit == 0 {
            return Err(AnalyticsError::InvalidConfig("result limits must be at least 1".to_string()));
        }
        if self.adequate_redundancy < 2 || self.high_redundancy <= self.adequate_redundancy {
            return Err(AnalyticsError::InvalidConfig(
                "redundancy thresholds must satisfy 2 <= adequate < high".to_string(),
            ));
        }
        self.reference_offset()?;
        Ok(())
    }

    pub fn reference_offset(&self) -> Result<FixedOffset, AnalyticsError>
    {
        FixedOffset::east_opt(self.reference_utc_offset_minutes * 60).ok_or_else(|| {
            AnalyticsError::InvalidConfig(format!(
                "reference_utc_offset_minutes {} is out of range",
                self.reference_utc_offset_minutes
            ))
        })
    }
}
