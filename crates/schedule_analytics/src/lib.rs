//! Reporting over a point-in-time [`StoreSnapshot`].
//!
//! Nothing in here writes to the store. Every statistic is recomputed from
//! the snapshot it is handed, so the numbers are always consistent with one
//! another.

use scheduling_environment::Instant;
use scheduling_environment::store::StoreSnapshot;
use scheduling_environment::ticket::Ticket;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub mod appointments;
pub mod config;
pub mod history;
pub mod skills;

use crate::appointments::AppointmentStatistics;
use crate::config::AnalyticsConfig;
use crate::history::HistoryStatistics;
use crate::skills::SkillCoverageStatistics;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum AnalyticsError
{
    #[error("window start {from} is after its end {to}")]
    InvalidWindow
    {
        from: Instant, to: Instant
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Inclusive reporting window. Open ends are unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TimeWindow
{
    from: Option<Instant>,
    to: Option<Instant>,
}

impl TimeWindow
{
    pub fn all_time() -> Self
    {
        Self::default()
    }

    pub fn between(from: Instant, to: Instant) -> Result<Self, AnalyticsError>
    {
        if from > to {
            return Err(AnalyticsError::InvalidWindow { from, to });
        }
        Ok(Self {
            from: Some(from),
            to: Some(to),
        })
    }

    pub fn from(&self) -> Option<Instant>
    {
        self.from
    }

    pub fn to(&self) -> Option<Instant>
    {
        self.to
    }

    pub fn contains(&self, instant: Instant) -> bool
    {
        self.from.is_none_or(|from| from <= instant) && self.to.is_none_or(|to| instant <= to)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport
{
    pub window: TimeWindow,
    pub appointments: AppointmentStatistics,
    pub history: HistoryStatistics,
    pub skills: SkillCoverageStatistics,
}

pub struct AnalyticsAggregator<'a>
{
    snapshot: &'a StoreSnapshot,
    config: &'a AnalyticsConfig,
}

impl<'a> AnalyticsAggregator<'a>
{
    pub fn new(snapshot: &'a StoreSnapshot, config: &'a AnalyticsConfig) -> Result<Self, AnalyticsError>
    {
        config.validate()?;
        Ok(Self { snapshot, config })
    }

    pub fn appointment_statistics(&self, window: TimeWindow) -> AppointmentStatistics
    {
        appointments::appointment_statistics(self.snapshot, self.config, window)
    }

    pub fn history_statistics(&self, window: TimeWindow) -> Result<HistoryStatistics, AnalyticsError>
    {
        history::history_statistics(self.snapshot, self.config, window)
    }

    pub fn skill_coverage(&self) -> SkillCoverageStatistics
    {
        skills::skill_coverage(self.snapshot, self.config)
    }

    /// Open tickets whose due time has passed, oldest due first.
    pub fn overdue_tickets(&self, now: Instant) -> Vec<Ticket>
    {
        let mut overdue = self
            .snapshot
            .tickets()
            .iter()
            .filter(|ticket| ticket.is_overdue(now))
            .cloned()
            .collect::<Vec<_>>();
        overdue.sort_by_key(|ticket| (ticket.due_at(), ticket.id()));
        overdue
    }

    pub fn report(&self, window: TimeWindow) -> Result<AnalyticsReport, AnalyticsError>
    {
        let report = AnalyticsReport {
            window,
            appointments: self.appointment_statistics(window),
            history: self.history_statistics(window)?,
            skills: self.skill_coverage(),
        };
        debug!(
            total_appointments = report.appointments.total_appointments,
            history_entries = report.history.total_entries,
            "analytics report built"
        );
        Ok(report)
    }
}

/// `numerator / denominator * 100`, or 0 for an empty denominator.
pub(crate) fn percentage(numerator: usize, denominator: usize) -> f64
{
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}
