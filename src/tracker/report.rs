//! Derives summary rows from time entries. Everything here is a pure function of the [Store]
//! and can be recomputed whenever a filter changes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use tracing::debug;

use super::{
    entities::{IterationId, ProjectId, Ticket, TimeEntry},
    store::Store,
};

pub const UNKNOWN_TICKET: &str = "Unknown";
pub const NO_ITERATION: &str = "No Iteration";
pub const NO_PROJECT: &str = "No Project";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Grouping {
    /// One row per entry, newest first.
    #[default]
    Individual,
    Ticket,
    Iteration,
    Project,
}

/// Conjunction of optional conditions an entry must satisfy to be reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    project: Option<ProjectId>,
    iteration: Option<IterationId>,
    search: String,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

impl ReportFilter {
    pub fn project(&self) -> Option<ProjectId> {
        self.project
    }

    pub fn iteration(&self) -> Option<IterationId> {
        self.iteration
    }

    /// Selects a project, `None` meaning all projects. The iteration filter is cleared when the
    /// iteration doesn't belong to the newly selected project. Returns whether that happened.
    pub fn select_project(&mut self, store: &Store, project: Option<ProjectId>) -> bool {
        self.project = project;
        let Some(iteration) = self.iteration else {
            return false;
        };
        let owned = project.is_some_and(|project| {
            store
                .iteration(iteration)
                .is_some_and(|i| i.project == Some(project))
        });
        if !owned {
            debug!("Clearing iteration filter {iteration}");
            self.iteration = None;
        }
        !owned
    }

    pub fn select_iteration(&mut self, iteration: Option<IterationId>) {
        self.iteration = iteration;
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.trim().to_lowercase();
    }

    /// Limits entries to `from <= logged_at < to`.
    pub fn set_range(&mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) {
        self.from = from;
        self.to = to;
    }

    pub fn matches(&self, store: &Store, entry: &TimeEntry) -> bool {
        let ticket = entry.ticket.and_then(|id| store.ticket(id));

        if let Some(project) = self.project {
            if ticket.and_then(|t| t.project) != Some(project) {
                return false;
            }
        }
        if let Some(iteration) = self.iteration {
            if ticket.and_then(|t| t.iteration) != Some(iteration) {
                return false;
            }
        }
        if self.from.is_some_and(|from| entry.logged_at < from)
            || self.to.is_some_and(|to| entry.logged_at >= to)
        {
            return false;
        }
        self.matches_search(ticket, entry)
    }

    fn matches_search(&self, ticket: Option<&Ticket>, entry: &TimeEntry) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let Some(ticket) = ticket else {
            return false;
        };
        let contains = |value: &str| value.to_lowercase().contains(&self.search);
        contains(&ticket.name)
            || contains(&ticket.key)
            || entry.note.as_deref().is_some_and(contains)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub name: String,
    pub subtitle: String,
    pub hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    /// Sum of hours over every matching entry, independent of grouping.
    pub total_hours: f64,
    pub entry_count: usize,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds the report for entries of `store` matching `filter`.
pub fn build_report(store: &Store, filter: &ReportFilter, grouping: Grouping) -> Report {
    let entries = store
        .entries_newest_first()
        .into_iter()
        .filter(|e| filter.matches(store, e))
        .collect::<Vec<_>>();

    let total_hours = entries.iter().map(|e| e.hours).sum();
    let entry_count = entries.len();

    let rows = match grouping {
        Grouping::Individual => entries
            .iter()
            .map(|entry| {
                let ticket = entry.ticket.and_then(|id| store.ticket(id));
                ReportRow {
                    name: ticket.map_or(UNKNOWN_TICKET.to_string(), |t| t.name.clone()),
                    subtitle: ticket.map(|t| t.key.clone()).unwrap_or_default(),
                    hours: entry.hours,
                }
            })
            .collect(),
        Grouping::Ticket => by_descending_hours(
            group_entries(&entries, |entry| {
                let ticket = entry.ticket.and_then(|id| store.ticket(id));
                Group {
                    key: ticket.map(|t| t.id.to_string()).unwrap_or_default(),
                    name: ticket.map_or(UNKNOWN_TICKET.to_string(), |t| t.name.clone()),
                    subtitle: ticket.map(|t| t.key.clone()).unwrap_or_default(),
                }
            })
            .into_iter()
            .map(|(row, _)| row),
        ),
        Grouping::Iteration => by_descending_hours(
            group_entries(&entries, |entry| {
                let iteration = entry
                    .ticket
                    .and_then(|id| store.ticket(id))
                    .and_then(|t| t.iteration)
                    .and_then(|id| store.iteration(id));
                let name = iteration.map_or(NO_ITERATION.to_string(), |i| i.name.clone());
                Group {
                    key: name.clone(),
                    name,
                    subtitle: iteration
                        .and_then(|i| i.project)
                        .and_then(|id| store.project(id))
                        .map(|p| p.name.clone())
                        .unwrap_or_default(),
                }
            })
            .into_iter()
            .map(|(row, _)| row),
        ),
        Grouping::Project => by_descending_hours(
            group_entries(&entries, |entry| {
                let name = entry
                    .ticket
                    .and_then(|id| store.ticket(id))
                    .and_then(|t| t.project)
                    .and_then(|id| store.project(id))
                    .map_or(NO_PROJECT.to_string(), |p| p.name.clone());
                Group {
                    key: name.clone(),
                    name,
                    subtitle: String::new(),
                }
            })
            .into_iter()
            // Counts entries, not distinct tickets.
            .map(|(row, count)| ReportRow {
                subtitle: format!("{count} tickets"),
                ..row
            }),
        ),
    };

    Report {
        rows,
        total_hours,
        entry_count,
    }
}

struct Group {
    key: String,
    name: String,
    subtitle: String,
}

/// Sums hours per group key. Groups come out in order of first appearance, paired with the
/// number of entries they hold.
fn group_entries(
    entries: &[&TimeEntry],
    group_of: impl Fn(&TimeEntry) -> Group,
) -> Vec<(ReportRow, usize)> {
    let mut indices = HashMap::<String, usize>::new();
    let mut rows = Vec::<(ReportRow, usize)>::new();

    for &entry in entries {
        let Group { key, name, subtitle } = group_of(entry);
        let index = *indices.entry(key).or_insert_with(|| {
            rows.push((
                ReportRow {
                    name,
                    subtitle,
                    hours: 0.,
                },
                0,
            ));
            rows.len() - 1
        });
        let (row, count) = &mut rows[index];
        row.hours += entry.hours;
        *count += 1;
    }
    rows
}

fn by_descending_hours(rows: impl Iterator<Item = ReportRow>) -> Vec<ReportRow> {
    let mut rows = rows.collect::<Vec<_>>();
    // Stable, so ties keep first appearance order.
    rows.sort_by(|a, b| b.hours.total_cmp(&a.hours));
    rows
}

#[cfg(test)]
mod tests {
    use crate::tracker::{
        entities::{NewEntry, TicketChanges},
        store::{
            tests::{log, project, sprint, test_moment, ticket},
            Store,
        },
    };

    use super::{build_report, Grouping, ReportFilter, ReportRow, NO_PROJECT, UNKNOWN_TICKET};

    fn hours(rows: &[ReportRow]) -> Vec<f64> {
        rows.iter().map(|r| r.hours).collect()
    }

    #[test]
    fn test_ticket_grouping_sums_hours() {
        let mut store = Store::new();
        let t = ticket(&mut store, "A-1", None);
        log(&mut store, Some(t), 1., 9);
        log(&mut store, Some(t), 2.5, 10);
        log(&mut store, Some(t), 0.25, 11);

        let report = build_report(&store, &ReportFilter::default(), Grouping::Ticket);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].hours, 3.75);
        assert_eq!(report.rows[0].name, "A-1 name");
        assert_eq!(report.rows[0].subtitle, "A-1");
        assert_eq!(report.total_hours, 3.75);
    }

    #[test]
    fn test_project_filter_switching() {
        let mut store = Store::new();
        let p1 = project(&mut store, "P1");
        let p2 = project(&mut store, "P2");
        let t1 = ticket(&mut store, "T-1", Some(p1));
        let t2 = ticket(&mut store, "T-2", Some(p2));
        log(&mut store, Some(t1), 1., 9);
        log(&mut store, Some(t2), 2., 10);

        let mut filter = ReportFilter::default();
        filter.select_project(&store, Some(p1));
        let report = build_report(&store, &filter, Grouping::Individual);
        assert_eq!(hours(&report.rows), vec![1.]);

        filter.select_project(&store, Some(p2));
        let report = build_report(&store, &filter, Grouping::Individual);
        assert_eq!(hours(&report.rows), vec![2.]);

        filter.select_project(&store, None);
        let report = build_report(&store, &filter, Grouping::Individual);
        assert_eq!(hours(&report.rows), vec![2., 1.]);
    }

    #[test]
    fn test_selecting_other_project_clears_iteration() {
        let mut store = Store::new();
        let p1 = project(&mut store, "P1");
        let p2 = project(&mut store, "P2");
        let sprint_1 = sprint(&mut store, "Sprint 1", Some(p1));

        let mut filter = ReportFilter::default();
        filter.select_project(&store, Some(p1));
        filter.select_iteration(Some(sprint_1));
        assert!(!filter.select_project(&store, Some(p1)));
        assert_eq!(filter.iteration(), Some(sprint_1));

        assert!(filter.select_project(&store, Some(p2)));
        assert_eq!(filter.iteration(), None);
        assert_eq!(filter.project(), Some(p2));
    }

    #[test]
    fn test_iteration_filter() {
        let mut store = Store::new();
        let p = project(&mut store, "P");
        let sprint_1 = sprint(&mut store, "Sprint 1", Some(p));
        let in_sprint = ticket(&mut store, "T-1", Some(p));
        let outside = ticket(&mut store, "T-2", Some(p));
        store
            .update_ticket(
                in_sprint,
                TicketChanges { iteration: Some(Some(sprint_1)), ..Default::default() },
            )
            .unwrap();
        log(&mut store, Some(in_sprint), 1., 9);
        log(&mut store, Some(outside), 2., 10);

        let mut filter = ReportFilter::default();
        filter.select_project(&store, Some(p));
        filter.select_iteration(Some(sprint_1));
        let report = build_report(&store, &filter, Grouping::Iteration);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].name, "Sprint 1");
        assert_eq!(report.rows[0].subtitle, "P");
        assert_eq!(report.total_hours, 1.);
    }

    #[test]
    fn test_search_matches_name_key_and_note() {
        let mut store = Store::new();
        let t = ticket(&mut store, "WEB-7", None);
        log(&mut store, Some(t), 1., 9);
        store
            .log_time(NewEntry {
                ticket: Some(t),
                hours: 2.,
                logged_at: test_moment(10),
                note: Some("Pairing with QA".into()),
            })
            .unwrap();
        store
            .log_time(NewEntry {
                ticket: None,
                hours: 4.,
                logged_at: test_moment(11),
                note: Some("pairing".into()),
            })
            .unwrap();

        let mut filter = ReportFilter::default();

        filter.set_search("web-");
        assert_eq!(build_report(&store, &filter, Grouping::Individual).total_hours, 3.);

        filter.set_search("  NAME ");
        assert_eq!(build_report(&store, &filter, Grouping::Individual).total_hours, 3.);

        // The orphan entry never matches, even though its note does.
        filter.set_search("pairing");
        let report = build_report(&store, &filter, Grouping::Individual);
        assert_eq!(hours(&report.rows), vec![2.]);

        filter.set_search("");
        assert_eq!(build_report(&store, &filter, Grouping::Individual).total_hours, 7.);
    }

    #[test]
    fn test_grouped_rows_sorted_by_hours() {
        let mut store = Store::new();
        let a = ticket(&mut store, "A-1", None);
        let b = ticket(&mut store, "B-1", None);
        let c = ticket(&mut store, "C-1", None);
        log(&mut store, Some(a), 1., 12);
        log(&mut store, Some(b), 5., 11);
        log(&mut store, Some(c), 1., 10);
        log(&mut store, Some(b), 1., 9);

        let report = build_report(&store, &ReportFilter::default(), Grouping::Ticket);

        let names = report.rows.iter().map(|r| r.subtitle.as_str()).collect::<Vec<_>>();
        // A and C tie, A was seen first (newest entry).
        assert_eq!(names, vec!["B-1", "A-1", "C-1"]);
        assert_eq!(hours(&report.rows), vec![6., 1., 1.]);
    }

    #[test]
    fn test_individual_rows_newest_first() {
        let mut store = Store::new();
        let a = ticket(&mut store, "A-1", None);
        log(&mut store, Some(a), 1., 9);
        log(&mut store, None, 3., 15);
        log(&mut store, Some(a), 2., 12);

        let report = build_report(&store, &ReportFilter::default(), Grouping::Individual);

        assert_eq!(hours(&report.rows), vec![3., 2., 1.]);
        assert_eq!(report.rows[0].name, UNKNOWN_TICKET);
        assert_eq!(report.rows[0].subtitle, "");
        assert_eq!(report.entry_count, 3);
    }

    #[test]
    fn test_project_grouping_counts_entries() {
        let mut store = Store::new();
        let p = project(&mut store, "Website");
        let t = ticket(&mut store, "W-1", Some(p));
        let loose = ticket(&mut store, "L-1", None);
        log(&mut store, Some(t), 1., 9);
        log(&mut store, Some(t), 1., 10);
        log(&mut store, Some(loose), 0.5, 11);
        log(&mut store, None, 0.5, 12);

        let report = build_report(&store, &ReportFilter::default(), Grouping::Project);

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].name, "Website");
        assert_eq!(report.rows[0].subtitle, "2 tickets");
        assert_eq!(report.rows[0].hours, 2.);
        assert_eq!(report.rows[1].name, NO_PROJECT);
        assert_eq!(report.rows[1].subtitle, "2 tickets");
        assert_eq!(report.total_hours, 3.);
    }

    #[test]
    fn test_date_range() {
        let mut store = Store::new();
        log(&mut store, None, 1., 9);
        log(&mut store, None, 2., 12);
        log(&mut store, None, 4., 15);

        let mut filter = ReportFilter::default();
        filter.set_range(Some(test_moment(12)), Some(test_moment(15)));

        let report = build_report(&store, &filter, Grouping::Individual);
        assert_eq!(hours(&report.rows), vec![2.]);
    }
}
