use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use scheduling_environment::ActorId;
use scheduling_environment::TicketId;
use scheduling_environment::store::StoreSnapshot;
use scheduling_environment::ticket::TicketHistory;
use scheduling_environment::ticket::TicketStatus;
use serde::Serialize;

use crate::AnalyticsError;
use crate::TimeWindow;
use crate::config::AnalyticsConfig;
use crate::percentage;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity
{
    pub actor_id: ActorId,
    pub entry_count: usize,
    pub unique_tickets_modified: usize,
    pub most_frequent_action: TicketStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChangeCount
{
    pub date: NaiveDate,
    pub change_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketChangeCount
{
    pub ticket_id: TicketId,
    pub change_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTransitionPattern
{
    pub from_status: TicketStatus,
    pub to_status: TicketStatus,
    pub occurrence_count: usize,
    pub percentage: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetrics
{
    pub resolved_tickets: usize,
    pub average_resolution_hours: f64,
    pub median_resolution_hours: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatistics
{
    pub total_entries: usize,
    pub status_change_distribution: BTreeMap<TicketStatus, usize>,
    pub top_users_by_activity: Vec<UserActivity>,
    pub daily_change_activity: Vec<DailyChangeCount>,
    pub most_changed_tickets: Vec<TicketChangeCount>,
    pub status_transition_patterns: Vec<StatusTransitionPattern>,
    pub resolution_metrics: ResolutionMetrics,
}

/// History entries whose timestamp lies in `window`.
pub(crate) fn history_statistics(snapshot: &StoreSnapshot, config: &AnalyticsConfig, window: TimeWindow) -> Result<HistoryStatistics, AnalyticsError>
{
    let entries = snapshot
        .history()
        .iter()
        .filter(|entry| window.contains(entry.timestamp()))
        .collect::<Vec<_>>();

    let mut status_change_distribution = BTreeMap::new();
    for entry in &entries {
        *status_change_distribution.entry(entry.status()).or_insert(0) += 1;
    }

    let per_ticket = ordered_per_ticket(&entries);
    let full_timelines = ordered_per_ticket(&snapshot.history().iter().collect::<Vec<_>>());

    Ok(HistoryStatistics {
        total_entries: entries.len(),
        status_change_distribution,
        top_users_by_activity: top_users_by_activity(&entries, config.top_users_limit),
        daily_change_activity: daily_change_activity(&entries, config)?,
        most_changed_tickets: most_changed_tickets(&per_ticket, config.most_changed_tickets_limit),
        status_transition_patterns: status_transition_patterns(&per_ticket),
        resolution_metrics: resolution_metrics(&full_timelines, window),
    })
}

/// Each ticket's entries in creation order: timestamp, then id.
fn ordered_per_ticket<'a>(entries: &[&'a TicketHistory]) -> BTreeMap<TicketId, Vec<&'a TicketHistory>>
{
    let mut per_ticket: BTreeMap<TicketId, Vec<&TicketHistory>> = BTreeMap::new();
    for &entry in entries {
        per_ticket.entry(entry.ticket_id()).or_default().push(entry);
    }
    for ticket_entries in per_ticket.values_mut() {
        ticket_entries.sort_by_key(|entry| (entry.timestamp(), entry.id()));
    }
    per_ticket
}

fn top_users_by_activity(entries: &[&TicketHistory], limit: usize) -> Vec<UserActivity>
{
    #[derive(Default)]
    struct Tally
    {
        entry_count: usize,
        tickets: BTreeSet<TicketId>,
        actions: BTreeMap<TicketStatus, usize>,
    }

    let mut tallies: BTreeMap<ActorId, Tally> = BTreeMap::new();
    for entry in entries {
        let tally = tallies.entry(entry.actor()).or_default();
        tally.entry_count += 1;
        tally.tickets.insert(entry.ticket_id());
        *tally.actions.entry(entry.status()).or_insert(0) += 1;
    }

    let mut activity = tallies
        .into_iter()
        .filter_map(|(actor_id, tally)| {
            // Highest count wins, the lower status on ties.
            let most_frequent_action = tally
                .actions
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                .map(|(status, _)| *status)?;
            Some(UserActivity {
                actor_id,
                entry_count: tally.entry_count,
                unique_tickets_modified: tally.tickets.len(),
                most_frequent_action,
            })
        })
        .collect::<Vec<_>>();
    activity.sort_by(|a, b| b.entry_count.cmp(&a.entry_count).then(a.actor_id.cmp(&b.actor_id)));
    activity.truncate(limit);
    activity
}

fn daily_change_activity(entries: &[&TicketHistory], config: &AnalyticsConfig) -> Result<Vec<DailyChangeCount>, AnalyticsError>
{
    let offset = config.reference_offset()?;
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for entry in entries {
        *per_day.entry(entry.timestamp().with_timezone(&offset).date_naive()).or_insert(0) += 1;
    }
    Ok(per_day
        .into_iter()
        .map(|(date, change_count)| DailyChangeCount { date, change_count })
        .collect())
}

fn most_changed_tickets(per_ticket: &BTreeMap<TicketId, Vec<&TicketHistory>>, limit: usize) -> Vec<TicketChangeCount>
{
    let mut counts = per_ticket
        .iter()
        .map(|(ticket_id, entries)| TicketChangeCount {
            ticket_id: *ticket_id,
            change_count: entries.len(),
        })
        .collect::<Vec<_>>();
    counts.sort_by(|a, b| b.change_count.cmp(&a.change_count).then(a.ticket_id.cmp(&b.ticket_id)));
    counts.truncate(limit);
    counts
}

/// Counts each directly consecutive `(from, to)` pair in every ticket's
/// history with one pass per ticket.
fn status_transition_patterns(per_ticket: &BTreeMap<TicketId, Vec<&TicketHistory>>) -> Vec<StatusTransitionPattern>
{
    let mut pairs: BTreeMap<(TicketStatus, TicketStatus), usize> = BTreeMap::new();
    for entries in per_ticket.values() {
        for window in entries.windows(2) {
            *pairs.entry((window[0].status(), window[1].status())).or_insert(0) += 1;
        }
    }

    let total = pairs.values().sum::<usize>();
    let mut patterns = pairs
        .into_iter()
        .map(|((from_status, to_status), occurrence_count)| StatusTransitionPattern {
            from_status,
            to_status,
            occurrence_count,
            percentage: percentage(occurrence_count, total),
        })
        .collect::<Vec<_>>();
    patterns.sort_by(|a, b| {
        b.occurrence_count
            .cmp(&a.occurrence_count)
            .then((a.from_status, a.to_status).cmp(&(b.from_status, b.to_status)))
    });
    patterns
}

/// Time from a ticket's first entry to its first `Closed` entry, over the
/// tickets whose first close falls in `window`.
///
/// `timelines` must hold every entry of each ticket, not only the windowed
/// ones, so a ticket opened before the window is measured from its opening.
fn resolution_metrics(timelines: &BTreeMap<TicketId, Vec<&TicketHistory>>, window: TimeWindow) -> ResolutionMetrics
{
    let mut durations = timelines
        .values()
        .filter_map(|entries| {
            let first = entries.first()?;
            let closed = entries.iter().find(|entry| entry.status().is_terminal())?;
            if !window.contains(closed.timestamp()) {
                return None;
            }
            Some((closed.timestamp() - first.timestamp()).num_seconds() as f64 / 3600.0)
        })
        .collect::<Vec<_>>();

    if durations.is_empty() {
        return ResolutionMetrics::default();
    }
    durations.sort_by(f64::total_cmp);

    let middle = durations.len() / 2;
    let median_resolution_hours = if durations.len() % 2 == 0 {
        (durations[middle - 1] + durations[middle]) / 2.0
    } else {
        durations[middle]
    };

    ResolutionMetrics {
        resolved_tickets: durations.len(),
        average_resolution_hours: durations.iter().sum::<f64>() / durations.len() as f64,
        median_resolution_hours,
    }
}
