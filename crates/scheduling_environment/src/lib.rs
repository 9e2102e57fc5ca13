use std::fmt;

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

pub mod appointment;
pub mod store;
pub mod technician;
pub mod ticket;

// Type aliases to keep the identities apart when reading signatures
pub type TechnicianId = u64;
pub type TicketId = u64;
pub type AppointmentId = u64;
pub type ClientId = u64;
pub type ActorId = u64;
pub type HistoryId = u64;

pub type Instant = DateTime<Utc>;

/// Category of work a ticket needs and a technician can be qualified for.
#[derive(Hash, Clone, Copy, Debug, PartialEq, PartialOrd, Ord, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType
{
    Hardware,
    Software,
    Network,
    Security,
    Installation,
    Maintenance,
}

impl ServiceType
{
    pub const ALL: [ServiceType; 6] = [
        ServiceType::Hardware,
        ServiceType::Software,
        ServiceType::Network,
        ServiceType::Security,
        ServiceType::Installation,
        ServiceType::Maintenance,
    ];
}

impl fmt::Display for ServiceType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            ServiceType::Hardware => "HARDWARE",
            ServiceType::Software => "SOFTWARE",
            ServiceType::Network => "NETWORK",
            ServiceType::Security => "SECURITY",
            ServiceType::Installation => "INSTALLATION",
            ServiceType::Maintenance => "MAINTENANCE",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("interval start {start} is not before end {end}")]
pub struct InvalidInterval
{
    pub start: Instant,
    pub end: Instant,
}

/// A half-open booking window `[start, end)` with `start < end`.
///
/// Overlap is tested with an inclusive boundary: two intervals that only
/// touch (`a.end == b.start`) are still reported as overlapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IntervalFields")]
pub struct Interval
{
    start: Instant,
    end: Instant,
}

#[derive(Deserialize)]
struct IntervalFields
{
    start: Instant,
    end: Instant,
}

impl TryFrom<IntervalFields> for Interval
{
    type Error = InvalidInterval;

    fn try_from(fields: IntervalFields) -> Result<Self, Self::Error>
    {
        Interval::new(fields.start, fields.end)
    }
}

impl Interval
{
    pub fn new(start: Instant, end: Instant) -> Result<Self, InvalidInterval>
    {
        if start >= end {
            return Err(InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Instant
    {
        self.start
    }

    pub fn end(&self) -> Instant
    {
        self.end
    }

    pub fn duration(&self) -> TimeDelta
    {
        self.end - self.start
    }

    /// `existing.start <= end && existing.end >= start`
    pub fn overlaps_with(&self, other: &Interval) -> bool
    {
        self.start <= other.end && other.start <= self.end
    }

    /// Returns the part of `self` that lies inside `[from, to]`, if any.
    pub fn clipped_to(&self, from: Instant, to: Instant) -> Option<TimeDelta>
    {
        let start = self.start.max(from);
        let end = self.end.min(to);
        (start < end).then(|| end - start)
    }
}

// Intervals sort by start, then by end
impl PartialOrd for Interval
{
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering>
    {
        Some(self.cmp(other))
    }
}

impl Ord for Interval
{
    fn cmp(&self, other: &Self) -> std::cmp::Ordering
    {
        self.start.cmp(&other.start).then(self.end.cmp(&other.end))
    }
}
